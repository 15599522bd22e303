use crate::config::Config;
use crate::error::{AppError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

const LAUNCH_ATTEMPTS: u64 = 3;
const SETTLE_DELAY: Duration = Duration::from_millis(500);
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns the single headless Chromium instance and hands out isolated
/// tabs as [`PageSession`]s. One session per concurrent site search;
/// sessions are never shared between tasks.
pub struct BrowserManager {
    browser: Browser,
    user_data_dir: PathBuf,
    navigation_timeout: Duration,
    selector_timeout: Duration,
}

impl BrowserManager {
    pub async fn launch(config: &Config) -> Result<Self> {
        let user_data_dir = std::env::temp_dir().join(format!(
            "shopscout-profile-{}",
            chrono::Utc::now().timestamp_millis()
        ));

        let mut builder = BrowserConfig::builder()
            .window_size(config.browser.window_width, config.browser.window_height)
            .user_data_dir(&user_data_dir)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", config.browser.user_agent));

        if config.browser.block_media {
            // Extraction only reads the DOM; image loads are skipped.
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }

        if config.browser.headless {
            builder = builder.arg("--headless").arg("--disable-gpu");
        } else {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to build browser config: {}", e)))?;

        let mut last_error = None;
        for attempt in 1..=LAUNCH_ATTEMPTS {
            match Browser::launch(browser_config.clone()).await {
                Ok((browser, mut handler)) => {
                    tokio::spawn(async move {
                        while let Some(event) = handler.next().await {
                            if let Err(e) = event {
                                let message = format!("{:?}", e);
                                // The CDP stream emits events newer than the
                                // generated protocol; those decode errors are
                                // noise, not failures.
                                if !message.contains("data did not match any variant") {
                                    debug!("Browser handler error: {}", e);
                                }
                            }
                        }
                    });

                    debug!("Browser launched with profile {:?}", user_data_dir);
                    return Ok(Self {
                        browser,
                        user_data_dir,
                        navigation_timeout: config.navigation_timeout(),
                        selector_timeout: config.selector_timeout(),
                    });
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < LAUNCH_ATTEMPTS {
                        warn!("Browser launch attempt {} failed, retrying...", attempt);
                        tokio::time::sleep(Duration::from_millis(1000 * attempt)).await;
                    }
                }
            }
        }

        Err(AppError::Browser(format!(
            "Failed to launch browser after {} attempts: {}",
            LAUNCH_ATTEMPTS,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    /// Open a fresh, isolated tab.
    pub async fn new_session(&self) -> Result<PageSession> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Browser(format!("Failed to open page: {}", e)))?;

        Ok(PageSession {
            page,
            navigation_timeout: self.navigation_timeout,
            selector_timeout: self.selector_timeout,
        })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| AppError::Browser(format!("Failed to close browser: {}", e)))?;

        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("Failed to remove profile dir {:?}: {}", self.user_data_dir, e);
        }

        Ok(())
    }
}

/// One isolated browser tab with bounded-timeout navigation and
/// extraction helpers. Closing consumes the session, so a session can
/// only ever be released once.
pub struct PageSession {
    page: Page,
    navigation_timeout: Duration,
    selector_timeout: Duration,
}

impl PageSession {
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::Navigation(format!("{}: {}", url, e)))?;

        // Completion of the load event is best-effort: the result pages
        // keep loading ad iframes long after the DOM we need is in place.
        match tokio::time::timeout(self.navigation_timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Navigation wait error for {}: {}", url, e),
            Err(_) => debug!("Navigation wait timed out for {}", url),
        }
        tokio::time::sleep(SETTLE_DELAY).await;

        Ok(())
    }

    /// Poll until `selector` matches something, bounded by the configured
    /// selector timeout.
    pub async fn wait_for_selector(&self, selector: &str) -> Result<()> {
        let probe = format!(
            "() => document.querySelector('{}') !== null",
            selector.replace('\'', "\\'")
        );

        let deadline = tokio::time::Instant::now() + self.selector_timeout;
        loop {
            let found: bool = self.evaluate(&probe).await.unwrap_or(false);
            if found {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::Timeout(format!("selector {}", selector)));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Run a script in the page and deserialize its JSON result.
    pub async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| AppError::Extraction(format!("Script evaluation failed: {}", e)))?;

        result
            .into_value()
            .map_err(|e| AppError::Extraction(format!("Unexpected script result: {}", e)))
    }

    pub async fn close(self) -> Result<()> {
        self.page
            .close()
            .await
            .map_err(|e| AppError::Browser(format!("Failed to close page: {}", e)))?;
        Ok(())
    }
}
