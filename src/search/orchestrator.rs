use crate::config::MAX_RESULTS;
use crate::error::{AppError, Result};
use crate::models::{Listing, Site};
use crate::sites::{ExtractorSource, SiteExtractor};
use futures_util::future::join_all;
use std::time::Duration;
use tracing::warn;

/// Search every requested site concurrently and merge the results.
///
/// Each site gets its own freshly acquired page session and runs as an
/// independent task bounded by `per_site_timeout`; one site failing (or
/// timing out) never cancels or fails the others, it just contributes
/// nothing. Successful listings are stamped with their originating site
/// here, and only here. The merged sequence keeps the order of `sites`
/// regardless of which task finished first, with each site's own page
/// order preserved inside its slice.
///
/// Every acquired session is released exactly once, on success, failure
/// and timeout paths alike. The only fatal outcome is failing to acquire
/// a session for every requested site.
pub async fn search_all_sites(
    source: &dyn ExtractorSource,
    query: &str,
    limit: usize,
    sites: &[Site],
    per_site_timeout: Duration,
) -> Result<Vec<Listing>> {
    if sites.is_empty() {
        return Ok(Vec::new());
    }

    let limit = clamp_limit(limit);

    let mut tasks = Vec::with_capacity(sites.len());
    for &site in sites {
        match source.acquire(site).await {
            Ok(extractor) => {
                let query = query.to_string();
                let handle = tokio::spawn(async move {
                    let outcome = match tokio::time::timeout(
                        per_site_timeout,
                        extractor.search(&query, limit),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(AppError::Timeout(format!("{} search", extractor.site()))),
                    };

                    // The task owns its session; release happens here no
                    // matter how the search ended.
                    if let Err(e) = extractor.close().await {
                        warn!("Failed to release {} session: {}", site, e);
                    }

                    outcome
                });
                tasks.push((site, handle));
            }
            Err(e) => {
                warn!("Could not open a session for {}: {}", site, e);
            }
        }
    }

    if tasks.is_empty() {
        return Err(AppError::ResourceUnavailable(format!(
            "no page session could be acquired for any of {} requested site(s)",
            sites.len()
        )));
    }

    let (order, handles): (Vec<Site>, Vec<_>) = tasks.into_iter().unzip();
    let outcomes = join_all(handles).await;

    let mut merged = Vec::new();
    for (site, joined) in order.into_iter().zip(outcomes) {
        match joined {
            Ok(Ok(listings)) => {
                merged.extend(listings.into_iter().map(|mut listing| {
                    listing.site = Some(site);
                    listing
                }));
            }
            Ok(Err(e)) => warn!("{} search failed: {}", site, e),
            Err(e) => warn!("{} search task aborted: {}", site, e),
        }
    }

    Ok(merged)
}

fn clamp_limit(limit: usize) -> usize {
    if limit == 0 {
        warn!("Result limit 0 raised to 1");
        1
    } else if limit > MAX_RESULTS {
        warn!("Result limit {} capped at {}", limit, MAX_RESULTS);
        MAX_RESULTS
    } else {
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductDetails;
    use crate::sites::SiteExtractor;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PER_SITE_TIMEOUT: Duration = Duration::from_millis(500);

    #[derive(Clone)]
    enum Plan {
        Results {
            names: Vec<String>,
            delay_ms: u64,
        },
        Fail,
        Hang,
        RefuseSession,
    }

    fn results(names: &[&str]) -> Plan {
        Plan::Results {
            names: names.iter().map(|s| s.to_string()).collect(),
            delay_ms: 0,
        }
    }

    fn delayed_results(names: &[&str], delay_ms: u64) -> Plan {
        Plan::Results {
            names: names.iter().map(|s| s.to_string()).collect(),
            delay_ms,
        }
    }

    struct StubExtractor {
        site: Site,
        plan: Plan,
        released: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SiteExtractor for StubExtractor {
        fn site(&self) -> Site {
            self.site
        }

        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<Listing>> {
            match &self.plan {
                Plan::Results { names, delay_ms } => {
                    if *delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    }
                    Ok(names
                        .iter()
                        .take(limit)
                        .map(|name| Listing {
                            name: name.clone(),
                            price: "$1.00".to_string(),
                            url: format!("https://example.com/{}", name),
                            site: None,
                            extra: Vec::new(),
                        })
                        .collect())
                }
                Plan::Fail => Err(AppError::Navigation("injected failure".to_string())),
                Plan::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
                Plan::RefuseSession => unreachable!("refused at acquisition"),
            }
        }

        async fn product_details(&self, _url: &str) -> Result<ProductDetails> {
            Ok(ProductDetails::default())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct StubSource {
        plans: HashMap<Site, Plan>,
        acquired: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl StubSource {
        fn new(plans: Vec<(Site, Plan)>) -> Self {
            Self {
                plans: plans.into_iter().collect(),
                acquired: Arc::new(AtomicUsize::new(0)),
                released: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ExtractorSource for StubSource {
        async fn acquire(&self, site: Site) -> Result<Box<dyn SiteExtractor>> {
            let plan = self.plans.get(&site).cloned().expect("plan for site");
            if matches!(plan, Plan::RefuseSession) {
                return Err(AppError::Browser("no session".to_string()));
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubExtractor {
                site,
                plan,
                released: self.released.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn empty_site_list_returns_empty() {
        let source = StubSource::new(vec![]);
        let merged = search_all_sites(&source, "laptop", 3, &[], PER_SITE_TIMEOUT)
            .await
            .unwrap();
        assert!(merged.is_empty());
        assert_eq!(source.acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listings_are_tagged_by_the_orchestrator() {
        // The stub deliberately returns untagged listings.
        let source = StubSource::new(vec![
            (Site::Amazon, results(&["a1", "a2"])),
            (Site::Ebay, results(&["e1"])),
        ]);

        let merged = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(merged.len(), 3);
        assert!(merged[..2].iter().all(|l| l.site == Some(Site::Amazon)));
        assert_eq!(merged[2].site, Some(Site::Ebay));
    }

    #[tokio::test]
    async fn one_failing_site_does_not_affect_the_other() {
        let source = StubSource::new(vec![
            (Site::Amazon, Plan::Fail),
            (Site::Ebay, results(&["e1", "e2"])),
        ]);

        let merged = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|l| l.site == Some(Site::Ebay)));
        assert_eq!(source.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(source.released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn all_sites_failing_yields_empty_not_error() {
        let source = StubSource::new(vec![(Site::Amazon, Plan::Fail), (Site::Ebay, Plan::Fail)]);

        let merged = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn declared_site_order_beats_completion_order() {
        // Amazon finishes last but was requested first.
        let source = StubSource::new(vec![
            (Site::Amazon, delayed_results(&["a1", "a2"], 200)),
            (Site::Ebay, results(&["e1", "e2"])),
        ]);

        let merged = search_all_sites(
            &source,
            "laptop",
            2,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        let tags: Vec<Option<Site>> = merged.iter().map(|l| l.site).collect();
        assert_eq!(
            tags,
            vec![
                Some(Site::Amazon),
                Some(Site::Amazon),
                Some(Site::Ebay),
                Some(Site::Ebay)
            ]
        );
        assert_eq!(merged[0].name, "a1");
        assert_eq!(merged[1].name, "a2");
    }

    #[tokio::test]
    async fn sessions_are_released_when_a_search_times_out() {
        let source = StubSource::new(vec![
            (Site::Amazon, Plan::Hang),
            (Site::Ebay, results(&["e1"])),
        ]);

        let merged = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(source.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(source.released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn acquisition_failing_everywhere_is_fatal() {
        let source = StubSource::new(vec![
            (Site::Amazon, Plan::RefuseSession),
            (Site::Ebay, Plan::RefuseSession),
        ]);

        let result = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await;

        assert!(matches!(result, Err(AppError::ResourceUnavailable(_))));
    }

    #[tokio::test]
    async fn acquisition_failing_for_one_site_is_skipped() {
        let source = StubSource::new(vec![
            (Site::Amazon, Plan::RefuseSession),
            (Site::Ebay, results(&["e1", "e2"])),
        ]);

        let merged = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|l| l.site == Some(Site::Ebay)));
    }

    #[tokio::test]
    async fn out_of_range_limits_are_clamped() {
        let many = Plan::Results {
            names: (0..30).map(|i| format!("item{}", i)).collect(),
            delay_ms: 0,
        };
        let source = StubSource::new(vec![(Site::Amazon, many)]);

        let merged = search_all_sites(&source, "laptop", 100, &[Site::Amazon], PER_SITE_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(merged.len(), MAX_RESULTS);

        let source = StubSource::new(vec![(Site::Amazon, results(&["a1", "a2"]))]);
        let merged = search_all_sites(&source, "laptop", 0, &[Site::Amazon], PER_SITE_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[tokio::test]
    async fn uneven_result_counts_merge_in_order() {
        let source = StubSource::new(vec![
            (Site::Amazon, results(&["a1", "a2", "a3"])),
            (Site::Ebay, results(&["e1", "e2"])),
        ]);

        let merged = search_all_sites(
            &source,
            "laptop",
            3,
            &[Site::Amazon, Site::Ebay],
            PER_SITE_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(merged.len(), 5);
        let names: Vec<&str> = merged.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a1", "a2", "a3", "e1", "e2"]);
        assert!(merged[..3].iter().all(|l| l.site == Some(Site::Amazon)));
        assert!(merged[3..].iter().all(|l| l.site == Some(Site::Ebay)));
    }
}
