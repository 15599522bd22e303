use super::{SiteExtractor, CANDIDATE_OVERSCAN};
use crate::browser::PageSession;
use crate::error::Result;
use crate::models::{Listing, ProductDetails, Site};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

const RESULTS_CONTAINER: &str = ".s-desktop-width-max";
const SPECIFICATIONS_TABLE: &str = "table.a-normal.a-spacing-micro";
const FEATURE_BULLETS: &str = "#feature-bullets";

/// Raw card payload as returned by the in-page extraction script.
#[derive(Debug, Deserialize)]
struct RawCard {
    name: Option<String>,
    price: Option<String>,
    url: Option<String>,
    rating: Option<String>,
    rating_count: Option<String>,
}

pub struct AmazonExtractor {
    session: PageSession,
}

impl AmazonExtractor {
    pub fn new(session: PageSession) -> Self {
        Self { session }
    }

    async fn extract_specifications(&self) -> Result<HashMap<String, String>> {
        self.session.wait_for_selector(SPECIFICATIONS_TABLE).await?;

        let script = r#"() => {
            const rows = Array.from(document.querySelectorAll('tr.a-spacing-small'));
            return rows.map((row) => {
                const label = row.querySelector('td span.a-text-bold');
                const value = row.querySelector('td span.po-break-word');
                return [
                    label ? label.textContent.trim() : null,
                    value ? value.textContent.trim() : null,
                ];
            });
        }"#;

        let rows: Vec<(Option<String>, Option<String>)> = self.session.evaluate(script).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(label, value)| Some((label?, value?)))
            .collect())
    }

    async fn extract_features(&self) -> Result<Vec<String>> {
        self.session.wait_for_selector(FEATURE_BULLETS).await?;

        let script = r#"() => {
            const items = document.querySelectorAll('#feature-bullets ul li span.a-list-item');
            return Array.from(items).map((item) => item.textContent.trim());
        }"#;

        let items: Vec<String> = self.session.evaluate(script).await?;
        Ok(items
            .into_iter()
            .filter(|text| !text.is_empty() && !text.starts_with('›'))
            .collect())
    }
}

#[async_trait]
impl SiteExtractor for AmazonExtractor {
    fn site(&self) -> Site {
        Site::Amazon
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Listing>> {
        let search_url = format!(
            "{}/s?k={}",
            Site::Amazon.base_url(),
            urlencoding::encode(query)
        );
        self.session.navigate(&search_url).await?;

        if let Err(e) = self.session.wait_for_selector(RESULTS_CONTAINER).await {
            warn!("Amazon results container never appeared: {}", e);
            return Ok(Vec::new());
        }

        let raw: Vec<RawCard> = self
            .session
            .evaluate(&search_script(limit + CANDIDATE_OVERSCAN))
            .await?;
        Ok(collect_listings(raw, limit))
    }

    async fn product_details(&self, url: &str) -> Result<ProductDetails> {
        self.session.navigate(url).await?;

        // Specifications and feature bullets live in disjoint page
        // regions, so both fragments are fetched concurrently and either
        // one may come up empty without blocking the other.
        let (specifications, special_features) =
            tokio::join!(self.extract_specifications(), self.extract_features());

        Ok(ProductDetails {
            specifications: specifications.unwrap_or_else(|e| {
                debug!("Amazon specifications unavailable: {}", e);
                HashMap::new()
            }),
            special_features: special_features.unwrap_or_else(|e| {
                debug!("Amazon feature bullets unavailable: {}", e);
                Vec::new()
            }),
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.session.close().await
    }
}

fn search_script(cap: usize) -> String {
    format!(
        r#"() => {{
            const cards = Array.from(
                document.querySelectorAll('div[data-asin]:not([data-asin=""])')
            ).slice(0, {cap});
            return cards.map((card) => {{
                const text = (sel) => {{
                    const el = card.querySelector(sel);
                    return el ? el.textContent.trim() : null;
                }};
                const nameEl =
                    card.querySelector('h2.a-size-medium.a-text-normal, h2.a-size-medium.a-text-normal > span') ||
                    card.querySelector('h2.a-size-base-plus, h2.a-size-base-plus > span');
                const link = card.querySelector("a[href*='/dp/']");
                return {{
                    name: nameEl ? (nameEl.getAttribute('aria-label') || nameEl.textContent).trim() : null,
                    price: text('span.a-price > span.a-offscreen'),
                    url: link ? link.getAttribute('href') : null,
                    rating: text('span.a-icon-alt'),
                    rating_count: text('span.a-size-base'),
                }};
            }});
        }}"#
    )
}

/// Turn raw cards into valid listings: candidates without a usable name
/// or product link are placeholders (ads, separators) and get skipped.
fn collect_listings(raw: Vec<RawCard>, limit: usize) -> Vec<Listing> {
    raw.into_iter()
        .filter_map(|card| {
            let name = card.name.filter(|n| !n.trim().is_empty())?;
            let url = resolve_url(&card.url?)?;

            let mut extra = Vec::new();
            if let Some(rating) = card.rating {
                extra.push(("Rating".to_string(), rating));
            }
            if let Some(count) = card.rating_count {
                extra.push(("Ratings".to_string(), count));
            }

            Some(Listing {
                name,
                price: card.price.unwrap_or_else(|| "N/A".to_string()),
                url,
                site: None,
                extra,
            })
        })
        .take(limit)
        .collect()
}

/// Product links on result pages are usually relative; resolve them
/// against the site base and drop anything that still isn't a valid
/// absolute URL.
fn resolve_url(raw: &str) -> Option<String> {
    let absolute = if raw.starts_with('/') {
        format!("{}{}", Site::Amazon.base_url(), raw)
    } else {
        raw.to_string()
    };
    url::Url::parse(&absolute).ok().map(|_| absolute)
}
