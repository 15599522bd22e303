use super::{SiteExtractor, CANDIDATE_OVERSCAN};
use crate::browser::PageSession;
use crate::error::Result;
use crate::models::{Listing, ProductDetails, Site};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

const RESULTS_CONTAINER: &str = "div#srp-river-results";
const ITEM_SPECIFICS: &str = "div[data-testid='ux-layout-section-evo__item']";

fn feedback_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([\d,]+)\)").unwrap())
}

fn feedback_percentage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\d.]+)%").unwrap())
}

/// Raw result row payload as returned by the in-page extraction script.
#[derive(Debug, Deserialize)]
struct RawItem {
    name: Option<String>,
    price: Option<String>,
    url: Option<String>,
    seller_record: Option<String>,
    seller_info: Option<String>,
}

pub struct EbayExtractor {
    session: PageSession,
}

impl EbayExtractor {
    pub fn new(session: PageSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SiteExtractor for EbayExtractor {
    fn site(&self) -> Site {
        Site::Ebay
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Listing>> {
        let search_url = format!(
            "{}/sch/i.html?_nkw={}",
            Site::Ebay.base_url(),
            urlencoding::encode(query)
        );
        self.session.navigate(&search_url).await?;

        if let Err(e) = self.session.wait_for_selector(RESULTS_CONTAINER).await {
            warn!("eBay results container never appeared: {}", e);
            return Ok(Vec::new());
        }

        let raw: Vec<RawItem> = self
            .session
            .evaluate(&search_script(limit + CANDIDATE_OVERSCAN))
            .await?;
        Ok(collect_listings(raw, limit))
    }

    async fn product_details(&self, url: &str) -> Result<ProductDetails> {
        self.session.navigate(url).await?;

        // Item specifics and the Features label live in the same DOM
        // region, so one pass yields both fragments.
        if let Err(e) = self.session.wait_for_selector(ITEM_SPECIFICS).await {
            debug!("eBay item specifics never appeared: {}", e);
            return Ok(ProductDetails::default());
        }

        let script = r#"() => {
            const pairs = [];
            const sections = document.querySelectorAll(
                "div[data-testid='ux-layout-section-evo__item'] dl[data-testid='ux-labels-values']"
            );
            for (const section of sections) {
                const labels = section.querySelectorAll('dt span.ux-textspans');
                const values = section.querySelectorAll('dd span.ux-textspans');
                const n = Math.min(labels.length, values.length);
                for (let i = 0; i < n; i++) {
                    pairs.push([labels[i].textContent.trim(), values[i].textContent.trim()]);
                }
            }
            return pairs;
        }"#;

        let pairs: Vec<(String, String)> = self.session.evaluate(script).await?;
        Ok(build_details(pairs))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.session.close().await
    }
}

fn search_script(cap: usize) -> String {
    format!(
        r#"() => {{
            const rows = Array.from(document.querySelectorAll(
                'div#srp-river-results ul.srp-results.srp-list.clearfix > li:not(.srp-river-answer)'
            )).slice(0, {cap});
            return rows.map((row) => {{
                const text = (sel) => {{
                    const el = row.querySelector(sel);
                    return el ? el.textContent.trim() : null;
                }};
                const link = row.querySelector('a.s-item__link');
                return {{
                    name: text("div.s-item__title span[role='heading'][aria-level='3']"),
                    price: text('span.s-item__price'),
                    url: link ? link.getAttribute('href') : null,
                    seller_record: text('span.s-item__etrs-text'),
                    seller_info: text('span.s-item__seller-info-text'),
                }};
            }});
        }}"#
    )
}

fn collect_listings(raw: Vec<RawItem>, limit: usize) -> Vec<Listing> {
    raw.into_iter()
        .filter_map(|item| {
            let name = item.name.filter(|n| !n.trim().is_empty())?;
            let url = item.url.filter(|u| url::Url::parse(u).is_ok())?;

            Some(Listing {
                name,
                price: item.price.unwrap_or_else(|| "N/A".to_string()),
                url,
                site: None,
                extra: seller_attributes(
                    item.seller_record.as_deref(),
                    item.seller_info.as_deref(),
                ),
            })
        })
        .take(limit)
        .collect()
}

/// Split the free-text seller blob ("sellername (1,234) 98.7%") into
/// labeled attributes.
fn seller_attributes(seller_record: Option<&str>, seller_info: Option<&str>) -> Vec<(String, String)> {
    let mut extra = Vec::new();

    if let Some(record) = seller_record.filter(|r| !r.is_empty()) {
        extra.push(("Seller record".to_string(), record.to_string()));
    }

    if let Some(info) = seller_info.filter(|i| !i.is_empty()) {
        let username = info.split_whitespace().next().unwrap_or("Unknown");
        extra.push(("Seller".to_string(), username.to_string()));

        let count = feedback_count_re()
            .captures(info)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "No rating".to_string());
        extra.push(("Feedback count".to_string(), count));

        let percentage = feedback_percentage_re()
            .captures(info)
            .map(|c| format!("{}%", &c[1]))
            .unwrap_or_else(|| "No percentage".to_string());
        extra.push(("Positive feedback".to_string(), percentage));
    }

    extra
}

fn build_details(pairs: Vec<(String, String)>) -> ProductDetails {
    let mut details = ProductDetails::default();

    for (label, value) in pairs {
        if label.eq_ignore_ascii_case("features") {
            details.special_features.extend(
                value
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty()),
            );
        }
        details.specifications.insert(label, value);
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_info_parsing() {
        let extra = seller_attributes(None, Some("techdeals (12,345) 99.1% positive"));
        assert_eq!(
            extra,
            vec![
                ("Seller".to_string(), "techdeals".to_string()),
                ("Feedback count".to_string(), "12,345".to_string()),
                ("Positive feedback".to_string(), "99.1%".to_string()),
            ]
        );
    }

    #[test]
    fn test_seller_info_defaults() {
        let extra = seller_attributes(Some("Top Rated Seller"), Some("someone"));
        assert_eq!(extra[0], ("Seller record".to_string(), "Top Rated Seller".to_string()));
        assert_eq!(extra[1], ("Seller".to_string(), "someone".to_string()));
        assert_eq!(extra[2], ("Feedback count".to_string(), "No rating".to_string()));
        assert_eq!(extra[3], ("Positive feedback".to_string(), "No percentage".to_string()));

        assert!(seller_attributes(None, None).is_empty());
    }

    #[test]
    fn test_missing_url_is_filtered() {
        let items = vec![
            RawItem {
                name: Some("Phone A".to_string()),
                price: Some("$50.00".to_string()),
                url: Some("https://www.ebay.com/itm/1".to_string()),
                seller_record: None,
                seller_info: None,
            },
            RawItem {
                name: Some("Phone B".to_string()),
                price: Some("$60.00".to_string()),
                url: None,
                seller_record: None,
                seller_info: None,
            },
        ];

        let listings = collect_listings(items, 3);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Phone A");
    }

    #[test]
    fn test_features_label_feeds_special_features() {
        let details = build_details(vec![
            ("Brand".to_string(), "Acme".to_string()),
            ("Features".to_string(), "Bluetooth, Waterproof , ".to_string()),
        ]);

        assert_eq!(details.specifications.len(), 2);
        assert_eq!(
            details.special_features,
            vec!["Bluetooth".to_string(), "Waterproof".to_string()]
        );
    }

    #[test]
    fn test_no_specifics_yields_empty_details() {
        let details = build_details(Vec::new());
        assert!(details.is_empty());
    }
}
