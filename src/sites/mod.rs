use crate::browser::BrowserManager;
use crate::error::Result;
use crate::models::{Listing, ProductDetails, Site};
use async_trait::async_trait;

mod amazon;
mod ebay;

pub use amazon::AmazonExtractor;
pub use ebay::EbayExtractor;

/// Extra result cards inspected beyond the requested limit. Result pages
/// mix ads and separator rows into the product grid; the overscan absorbs
/// them so filtering does not drop the count below the limit.
pub(crate) const CANDIDATE_OVERSCAN: usize = 8;

/// Capability contract shared by all site extractors.
///
/// Listings come back untagged (`site: None`); provenance is stamped by
/// the search orchestrator, never by an extractor.
#[async_trait]
pub trait SiteExtractor: Send {
    fn site(&self) -> Site;

    /// Search the site and return up to `limit` valid listings in page
    /// order. Waits a bounded time for the results container; a container
    /// that never appears yields an empty result, not an error.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Listing>>;

    /// Scrape specifications and special features from a product detail
    /// page. Missing fragments degrade to empty, so a sparse
    /// [`ProductDetails`] is a normal outcome.
    async fn product_details(&self, url: &str) -> Result<ProductDetails>;

    /// Release the underlying page session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for extractors bound to fresh page sessions. Passed explicitly
/// wherever searches run, so there is no ambient global browser state and
/// tests can substitute doubles.
#[async_trait]
pub trait ExtractorSource: Send + Sync {
    async fn acquire(&self, site: Site) -> Result<Box<dyn SiteExtractor>>;
}

/// The production [`ExtractorSource`]: one fresh tab per acquisition.
pub struct LiveSource<'a> {
    manager: &'a BrowserManager,
}

impl<'a> LiveSource<'a> {
    pub fn new(manager: &'a BrowserManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl ExtractorSource for LiveSource<'_> {
    async fn acquire(&self, site: Site) -> Result<Box<dyn SiteExtractor>> {
        let session = self.manager.new_session().await?;
        Ok(match site {
            Site::Amazon => Box::new(AmazonExtractor::new(session)),
            Site::Ebay => Box::new(EbayExtractor::new(session)),
        })
    }
}
