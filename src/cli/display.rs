use crate::models::{Listing, ProductDetails, Site};
use console::style;

pub fn print_header() {
    println!();
    println!("{}", style(" === Product Search === ").bold().white().on_blue());
    println!();
}

pub fn print_success(msg: &str) {
    println!("{}", style(msg).green());
}

pub fn print_error(msg: &str) {
    println!("{}", style(msg).red());
}

pub fn print_info(msg: &str) {
    println!("{}", style(msg).cyan());
}

pub fn print_separator() {
    println!("\n{}\n", "=".repeat(80));
}

pub fn print_search_results(results: &[Listing]) {
    println!("\n{}\n", style("Products Found:").green().bold());

    for (i, listing) in results.iter().enumerate() {
        let site = listing.site.map(|s| s.label()).unwrap_or("Unknown");
        println!(
            "{}",
            style(format!(" Product {} ({}) ", i + 1, site)).white().on_blue()
        );
        println!("{} {}", style("Name:").yellow(), listing.name);
        println!("{} {}", style("Price:").yellow(), listing.price);
        for (key, value) in &listing.extra {
            println!("{} {}", style(format!("{}:", key)).yellow(), value);
        }
        println!("{}\n", style("-".repeat(80)).blue());
    }
}

pub fn print_product_details(listing: &Listing, details: &ProductDetails) {
    println!("\n{}", style(" Product Information ").white().on_blue());
    println!("{}", style("-".repeat(80)).blue());
    println!("{} {}", style("Name:").yellow(), listing.name);
    println!("{} {}", style("Price:").yellow(), listing.price);
    for (key, value) in &listing.extra {
        println!("{} {}", style(format!("{}:", key)).yellow(), value);
    }

    if details.is_empty() {
        println!("\n{}", style("No further details available for this product.").cyan());
    }

    if !details.specifications.is_empty() {
        println!("\n{}", style(" Specifications ").white().on_blue());
        for (label, value) in &details.specifications {
            println!("{} {}", style(format!("{}:", label)).green(), value);
        }
    }

    if !details.special_features.is_empty() {
        println!("\n{}", style(" Special Features ").white().on_blue());
        match listing.site {
            Some(Site::Amazon) => print_amazon_features(&details.special_features),
            _ => {
                // Compact single-line bullets.
                for feature in &details.special_features {
                    println!("{} {}", style("•").green(), feature);
                }
            }
        }
    }
    println!();
}

/// Amazon feature bullets often carry a bracketed lead-in
/// ("[Fast Charging] Gets you ..."); those are shown as a highlighted
/// title over their description.
fn print_amazon_features(features: &[String]) {
    println!();
    for feature in sorted_features(features) {
        match feature.split_once(']') {
            Some((title, description)) if feature.starts_with('[') => {
                println!("{}", style(format!("{}]", title.trim_start_matches('['))).yellow());
                println!("{}\n", description.trim());
            }
            _ => println!("{} {}\n", style("•").green(), feature),
        }
    }
}

/// Bracket-titled entries sort ahead of plain ones, lexicographically
/// within each group.
fn sorted_features(features: &[String]) -> Vec<&String> {
    let mut sorted: Vec<&String> = features.iter().collect();
    sorted.sort_by(|a, b| {
        (!a.starts_with('['), a.as_str()).cmp(&(!b.starts_with('['), b.as_str()))
    });
    sorted
}
