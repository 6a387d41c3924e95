//! Headless browser client for rematchtracker.com

use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::profile::{parse_profile, ExtractedProfile};
use super::selectors::{CompiledSelectors, SelectorTable};
use super::{profile_url, ScraperError};

/// Default tracker host
pub const DEFAULT_TRACKER_HOST: &str = "www.rematchtracker.com";

/// Scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub tracker_host: String,
    /// Upper bound on waiting for the page anchor, in seconds
    pub timeout_secs: u64,
    /// Pause after each mode-filter click, in milliseconds
    pub settle_ms: u64,
    /// Browser sessions allowed at once
    pub max_concurrent: usize,
    /// Chrome/Chromium binary; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            tracker_host: DEFAULT_TRACKER_HOST.to_string(),
            timeout_secs: 30,
            settle_ms: 1500,
            max_concurrent: 2,
            chrome_path: None,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// What to load and how long to wait for it
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    pub anchor_selector: String,
    pub timeout: Duration,
    /// Elements to click, in order, before capturing the markup
    pub interactions: Vec<String>,
    pub settle: Duration,
    pub user_agent: String,
}

/// Turns a URL into fully rendered markup
///
/// Implementations block; [`ProfileScraper`] calls them on the blocking pool.
pub trait PageRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<String, ScraperError>;
}

/// Renders pages in a fresh headless Chrome per call
#[derive(Debug, Clone, Default)]
pub struct ChromeRenderer {
    pub chrome_path: Option<PathBuf>,
}

impl ChromeRenderer {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

impl PageRenderer for ChromeRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String, ScraperError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(request.timeout + Duration::from_secs(30))
            .build()
            .map_err(|e| ScraperError::Acquisition(format!("invalid browser options: {}", e)))?;

        // Dropping `browser` kills the Chrome process, on every return path
        let browser = Browser::new(options)
            .map_err(|e| ScraperError::Acquisition(format!("failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ScraperError::Acquisition(format!("failed to open tab: {}", e)))?;

        if let Err(e) = tab.set_user_agent(&request.user_agent, None, None) {
            tracing::debug!("Could not set user agent: {}", e);
        }

        load(&tab, request)?;
        apply_mode_filter(&ChromeSession { tab: &tab, request }, &request.interactions)?;

        let html = tab
            .get_content()
            .map_err(|e| ScraperError::Acquisition(format!("failed to read page: {}", e)))?;

        if let Err(e) = tab.close(true) {
            tracing::debug!("Tab close failed: {}", e);
        }

        Ok(html)
    }
}

/// Navigate to the request URL and wait for the anchor element
fn load(tab: &Arc<Tab>, request: &RenderRequest) -> Result<(), ScraperError> {
    tab.navigate_to(&request.url)
        .map_err(|e| ScraperError::Acquisition(format!("failed to load {}: {}", request.url, e)))?;
    tab.wait_for_element_with_custom_timeout(&request.anchor_selector, request.timeout)
        .map_err(|e| {
            ScraperError::Acquisition(format!(
                "page did not render '{}' within {}s: {}",
                request.anchor_selector,
                request.timeout.as_secs(),
                e
            ))
        })?;
    Ok(())
}

/// What the mode-filter sequence needs from a live page
trait FilterSession {
    fn click_step(&self, selector: &str) -> anyhow::Result<()>;

    /// Load the page again in its default view
    fn reload(&self) -> Result<(), ScraperError>;
}

struct ChromeSession<'a> {
    tab: &'a Arc<Tab>,
    request: &'a RenderRequest,
}

impl FilterSession for ChromeSession<'_> {
    fn click_step(&self, selector: &str) -> anyhow::Result<()> {
        click(self.tab, selector, self.request)
    }

    fn reload(&self) -> Result<(), ScraperError> {
        load(self.tab, self.request)
    }
}

/// Click through `steps`; returns whether the filtered view is showing
///
/// A failed step reloads the page, so a half-applied sequence is never
/// captured. Only a failed reload is an error.
fn apply_mode_filter(session: &dyn FilterSession, steps: &[String]) -> Result<bool, ScraperError> {
    for (done, selector) in steps.iter().enumerate() {
        if let Err(e) = session.click_step(selector) {
            tracing::warn!(
                "Mode filter step {} '{}' failed, using default view: {}",
                done + 1,
                selector,
                e
            );
            session.reload()?;
            return Ok(false);
        }
    }
    Ok(true)
}

fn click(tab: &Arc<Tab>, selector: &str, request: &RenderRequest) -> anyhow::Result<()> {
    tab.wait_for_element_with_custom_timeout(selector, request.timeout)?
        .click()?;
    std::thread::sleep(request.settle);
    tab.wait_for_element_with_custom_timeout(&request.anchor_selector, request.timeout)?;
    Ok(())
}

/// Profile scraper with a bounded number of concurrent browser sessions
pub struct ProfileScraper {
    config: ScraperConfig,
    selectors: Arc<CompiledSelectors>,
    renderer: Arc<dyn PageRenderer>,
    permits: Arc<Semaphore>,
}

impl ProfileScraper {
    /// Create a scraper that renders through headless Chrome
    pub fn new(config: ScraperConfig, table: &SelectorTable) -> Result<Self, ScraperError> {
        let renderer = Arc::new(ChromeRenderer::new(config.chrome_path.clone()));
        Self::with_renderer(config, table, renderer)
    }

    pub fn with_renderer(
        config: ScraperConfig,
        table: &SelectorTable,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, ScraperError> {
        let selectors = Arc::new(table.compile()?);
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

        Ok(Self {
            config,
            selectors,
            renderer,
            permits,
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Build URL for a player's profile page
    pub fn build_url(&self, platform: &str, player_id: &str) -> String {
        profile_url(&self.config.tracker_host, platform, player_id)
    }

    /// Render and parse a profile
    ///
    /// `mode` selects a game-mode filter from the selector table; an unknown
    /// mode or a failed click falls back to the default view. Only failing to
    /// load or render the page is an error.
    pub async fn extract(
        &self,
        platform: &str,
        player_id: &str,
        mode: Option<&str>,
    ) -> Result<ExtractedProfile, ScraperError> {
        let url = self.build_url(platform, player_id);

        let interactions = match mode {
            Some(mode) => match self.selectors.mode_filter(mode) {
                Some(steps) => steps.to_vec(),
                None => {
                    tracing::warn!("Unknown mode filter '{}', using default view", mode);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let request = RenderRequest {
            url,
            anchor_selector: self.selectors.anchor.clone(),
            timeout: Duration::from_secs(self.config.timeout_secs),
            interactions,
            settle: Duration::from_millis(self.config.settle_ms),
            user_agent: self.config.user_agent.clone(),
        };

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ScraperError::Acquisition("extraction pool closed".to_string()))?;

        tracing::info!("Scraping profile: {}", request.url);

        // The blocking task owns the permit and the browser, so both are
        // released even if this future is dropped mid-render
        let renderer = Arc::clone(&self.renderer);
        let html = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            renderer.render(&request)
        })
        .await
        .map_err(|e| ScraperError::Acquisition(format!("render task failed: {}", e)))??;

        let profile = parse_profile(&html, &self.selectors);

        let degraded = profile.degraded_fields();
        if !degraded.is_empty() {
            tracing::warn!(
                "Profile {}/{} missing fields: {}",
                platform,
                player_id,
                degraded.join(", ")
            );
        }

        Ok(profile)
    }
}
