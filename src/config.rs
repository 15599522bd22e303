use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on results requested per site, matching what the result
/// pages reliably render above the fold without pagination.
pub const MAX_RESULTS: usize = 21;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserSection,
    pub search: SearchSection,
    pub timeouts: TimeoutSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSection {
    pub headless: bool,
    pub block_media: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    pub default_results: usize,
    pub site_search_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSection {
    pub navigation_secs: u64,
    pub selector_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserSection {
                headless: std::env::var("HEADLESS")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .unwrap_or(true),
                block_media: std::env::var("BLOCK_MEDIA")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .unwrap_or(true),
                window_width: std::env::var("WINDOW_WIDTH")
                    .unwrap_or_else(|_| "1920".to_string())
                    .parse()
                    .unwrap_or(1920),
                window_height: std::env::var("WINDOW_HEIGHT")
                    .unwrap_or_else(|_| "1080".to_string())
                    .parse()
                    .unwrap_or(1080),
                user_agent: std::env::var("USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            },
            search: SearchSection {
                default_results: std::env::var("DEFAULT_RESULTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                site_search_timeout_secs: std::env::var("SITE_SEARCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            timeouts: TimeoutSection {
                navigation_secs: std::env::var("NAV_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                selector_secs: std::env::var("SELECTOR_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            errors.push("Window dimensions must be greater than 0".to_string());
        }

        if self.browser.user_agent.trim().is_empty() {
            errors.push("User agent must not be empty".to_string());
        }

        if self.search.default_results == 0 || self.search.default_results > MAX_RESULTS {
            errors.push(format!(
                "Default result count must be between 1 and {}",
                MAX_RESULTS
            ));
        }

        if self.search.site_search_timeout_secs == 0 {
            errors.push("Site search timeout must be greater than 0".to_string());
        }

        if self.timeouts.navigation_secs == 0 {
            errors.push("Navigation timeout must be greater than 0".to_string());
        }

        if self.timeouts.selector_secs == 0 {
            errors.push("Selector timeout must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.navigation_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.selector_secs)
    }

    pub fn site_search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.site_search_timeout_secs)
    }
}
