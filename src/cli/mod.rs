mod display;

use crate::config::{Config, MAX_RESULTS};
use crate::error::Result;
use crate::models::{Listing, Site};
use crate::search::search_all_sites;
use crate::sites::{ExtractorSource, SiteExtractor};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use tracing::warn;

enum MenuChoice {
    Single(Site),
    AllSites,
    ChangeCount,
}

/// Interactive search loop: pick a site (or all), enter a query, browse
/// the merged results, optionally drill into one product, repeat until
/// the user declines another round.
pub async fn run(source: &dyn ExtractorSource, config: &Config) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut result_count = config.search.default_results;

    loop {
        display::print_header();

        let choice = loop {
            match prompt_menu(&theme, result_count)? {
                MenuChoice::ChangeCount => {
                    result_count = prompt_result_count(&theme, result_count)?;
                    display::print_success(&format!(
                        "Number of products updated to: {}",
                        result_count
                    ));
                }
                other => break other,
            }
        };

        let sites: Vec<Site> = match choice {
            MenuChoice::Single(site) => vec![site],
            MenuChoice::AllSites => Site::all().to_vec(),
            MenuChoice::ChangeCount => unreachable!("handled above"),
        };

        let query: String = Input::with_theme(&theme)
            .with_prompt("Enter a product name to search")
            .interact_text()?;

        if sites.len() > 1 {
            display::print_info("Searching all sites concurrently...");
        } else {
            display::print_info(&format!("Searching {}...", sites[0]));
        }

        let results = search_all_sites(
            source,
            &query,
            result_count,
            &sites,
            config.site_search_timeout(),
        )
        .await?;

        if results.is_empty() {
            display::print_error("No products found!");
            continue;
        }

        display::print_search_results(&results);

        let index = prompt_product_number(&theme, results.len())?;
        show_details(source, &results[index]).await;

        let again = Confirm::with_theme(&theme)
            .with_prompt("Would you like to perform another search?")
            .default(false)
            .interact()?;
        if !again {
            display::print_success("Thank you for using shopscout!");
            return Ok(());
        }
        display::print_separator();
    }
}

async fn show_details(source: &dyn ExtractorSource, listing: &Listing) {
    let Some(site) = listing.site else {
        display::print_error("No extractor available for this product.");
        return;
    };

    let extractor = match source.acquire(site).await {
        Ok(extractor) => extractor,
        Err(e) => {
            display::print_error(&format!("Could not open a page for {}: {}", site, e));
            return;
        }
    };

    let details = extractor.product_details(&listing.url).await;
    if let Err(e) = extractor.close().await {
        warn!("Failed to release {} session: {}", site, e);
    }

    match details {
        Ok(details) => display::print_product_details(listing, &details),
        Err(e) => display::print_error(&format!("Error fetching product details: {}", e)),
    }
}

fn prompt_menu(theme: &ColorfulTheme, result_count: usize) -> Result<MenuChoice> {
    let items = [
        "Amazon".to_string(),
        "eBay".to_string(),
        "All sites".to_string(),
        format!("Change number of products (current: {})", result_count),
    ];

    let selection = Select::with_theme(theme)
        .with_prompt("Choose a site to search")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match selection {
        0 => MenuChoice::Single(Site::Amazon),
        1 => MenuChoice::Single(Site::Ebay),
        2 => MenuChoice::AllSites,
        _ => MenuChoice::ChangeCount,
    })
}

fn prompt_result_count(theme: &ColorfulTheme, current: usize) -> Result<usize> {
    let value = Input::with_theme(theme)
        .with_prompt(format!("Number of products to scrape (1-{})", MAX_RESULTS))
        .default(current)
        .validate_with(|n: &usize| {
            if (1..=MAX_RESULTS).contains(n) {
                Ok(())
            } else {
                Err(format!(
                    "Please enter a number between 1 and {}",
                    MAX_RESULTS
                ))
            }
        })
        .interact_text()?;
    Ok(value)
}

fn prompt_product_number(theme: &ColorfulTheme, count: usize) -> Result<usize> {
    let value = Input::with_theme(theme)
        .with_prompt(format!(
            "Enter the product number (1-{}) to see more details",
            count
        ))
        .validate_with(move |n: &usize| {
            if (1..=count).contains(n) {
                Ok(())
            } else {
                Err(format!(
                    "Invalid product number. Please enter a number between 1 and {}",
                    count
                ))
            }
        })
        .interact_text()?;
    Ok(value - 1)
}
