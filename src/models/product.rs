use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// E-commerce sites this tool knows how to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    Amazon,
    Ebay,
}

impl Site {
    pub fn all() -> [Site; 2] {
        [Site::Amazon, Site::Ebay]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Site::Amazon => "Amazon",
            Site::Ebay => "eBay",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Site::Amazon => "https://www.amazon.com",
            Site::Ebay => "https://www.ebay.com",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One search-result summary for a product.
///
/// `site` is None as produced by an extractor; the search orchestrator is
/// the single place provenance gets stamped. `price` is the page's display
/// string, never parsed into a number. `extra` is an ordered bag of
/// site-specific attributes (rating, seller feedback, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub price: String,
    pub url: String,
    pub site: Option<Site>,
    pub extra: Vec<(String, String)>,
}

/// Specifications and special features scraped from one product detail
/// page. Either side may be empty; that is a normal outcome, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDetails {
    pub specifications: HashMap<String, String>,
    pub special_features: Vec<String>,
}

impl ProductDetails {
    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty() && self.special_features.is_empty()
    }
}
