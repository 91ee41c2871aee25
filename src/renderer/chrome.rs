//! Headless Chrome implementation of [`PageRenderer`]

use std::ffi::OsStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::util::Timeout as BrowserTimeout;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, info, warn};

use crate::config::{Config, build_listing_url};
use crate::error::ScrapeError;
use crate::traits::{PageRenderer, RenderedPage};

/// Extra time granted to browser start-up and teardown on top of the page timeout
const LAUNCH_GRACE: Duration = Duration::from_secs(15);

/// Settings for one browser session
#[derive(Debug, Clone)]
pub struct ChromeSettings {
    pub listing_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
}

impl From<&Config> for ChromeSettings {
    fn from(config: &Config) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            timeout: config.render_timeout(),
        }
    }
}

/// Renders listings in a fresh headless Chrome per call.
///
/// The browser is launched and torn down for every category so a wedged
/// instance never outlives one render.
pub struct ChromeRenderer {
    settings: ChromeSettings,
}

impl ChromeRenderer {
    #[must_use]
    pub const fn new(settings: ChromeSettings) -> Self {
        Self { settings }
    }
}

/// Blocking render: launch, navigate, wait for the document, serialize it.
fn render_blocking(settings: &ChromeSettings, url: &str) -> Result<String> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .idle_browser_timeout(settings.timeout + LAUNCH_GRACE)
        .args(vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--lang=ko-KR"),
        ])
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid browser launch options: {e}"))?;

    let browser =
        Browser::new(options).context("Failed to launch headless Chrome. Is Chrome/Chromium installed?")?;

    let tab = browser.new_tab().context("Failed to create new browser tab")?;
    tab.set_default_timeout(settings.timeout);
    tab.set_user_agent(&settings.user_agent, Some(&settings.accept_language), None)
        .context("Failed to set user agent")?;

    tab.navigate_to(url).context("Failed to navigate to URL")?;
    tab.wait_until_navigated()
        .context("Page did not finish loading")?;

    tab.get_content().context("Failed to get page content")
}

/// Map a failed blocking render to the error taxonomy.
///
/// A headless_chrome wait that ran out of time anywhere in the context chain
/// counts as a timeout; everything else is a navigation failure.
fn classify_render_error(
    code: &str,
    url: &str,
    timeout: Duration,
    err: &anyhow::Error,
) -> ScrapeError {
    if err.chain().any(|cause| cause.downcast_ref::<BrowserTimeout>().is_some()) {
        ScrapeError::RenderTimeout {
            code: code.to_string(),
            timeout,
        }
    } else {
        ScrapeError::Navigation {
            url: url.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, category_code: &str) -> Result<RenderedPage, ScrapeError> {
        let url = build_listing_url(&self.settings.listing_url, category_code);
        info!("Rendering {}", url);

        let settings = self.settings.clone();
        let task_url = url.clone();
        let mut task = tokio::task::spawn_blocking(move || render_blocking(&settings, &task_url));

        let joined = match tokio::time::timeout(self.settings.timeout + LAUNCH_GRACE, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                // The browser lives on the blocking thread; wait for it to wind
                // down so the next category never runs beside it.
                warn!("Render of {} overran, waiting for the browser to exit", url);
                let _ = task.await;
                return Err(ScrapeError::RenderTimeout {
                    code: category_code.to_string(),
                    timeout: self.settings.timeout,
                });
            }
        };

        let html = joined
            .map_err(|e| ScrapeError::Navigation {
                url: url.clone(),
                reason: format!("render task failed: {e}"),
            })?
            .map_err(|e| classify_render_error(category_code, &url, self.settings.timeout, &e))?;

        debug!("Rendered {} bytes from {}", html.len(), url);
        Ok(RenderedPage { url, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let config = Config {
            render_timeout_secs: 42,
            ..Config::default()
        };

        let settings = ChromeSettings::from(&config);
        assert_eq!(settings.timeout, Duration::from_secs(42));
        assert_eq!(settings.accept_language, config.accept_language);
        assert!(settings.listing_url.contains("{code}"));
    }

    #[test]
    fn browser_wait_timeout_is_a_render_timeout() {
        let err = anyhow::Error::new(BrowserTimeout).context("Page did not finish loading");

        let mapped = classify_render_error("C1", "https://example.test/C1", Duration::from_secs(60), &err);
        match mapped {
            ScrapeError::RenderTimeout { code, timeout } => {
                assert_eq!(code, "C1");
                assert_eq!(timeout, Duration::from_secs(60));
            }
            other => panic!("expected RenderTimeout, got {other:?}"),
        }
    }

    #[test]
    fn other_browser_failures_are_navigation_errors() {
        let err = anyhow::anyhow!("net::ERR_NAME_NOT_RESOLVED").context("Failed to navigate to URL");

        let mapped = classify_render_error("C1", "https://example.test/C1", Duration::from_secs(60), &err);
        match mapped {
            ScrapeError::Navigation { url, reason } => {
                assert_eq!(url, "https://example.test/C1");
                assert!(reason.contains("Failed to navigate to URL"));
                assert!(reason.contains("ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("expected Navigation, got {other:?}"),
        }
    }
}
