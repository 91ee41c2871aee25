//! Configuration with TOML, `.env`, and environment variable layering.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScrapeError;
use crate::traits::SiteSelectors;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// A human-readable category label and the upstream code it selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub code: String,
}

/// Ordered, immutable label → code table.
///
/// Order is both the cycle order and the priority used to break ties when the
/// same product ranks in several categories on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: Vec<Category>,
}

impl CategoryTable {
    pub fn new(entries: Vec<Category>) -> Result<Self> {
        if entries.is_empty() {
            bail!("category table is empty");
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.label.as_str()) {
                bail!("duplicate category label: {}", entry.label);
            }
        }

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a label, rejecting anything not in the table.
    pub fn get(&self, label: &str) -> Result<&Category, ScrapeError> {
        self.entries
            .iter()
            .find(|c| c.label == label)
            .ok_or_else(|| ScrapeError::UnknownCategory(label.to_string()))
    }

    /// Position of a label in the priority order; unknown labels sort last.
    #[must_use]
    pub fn priority(&self, label: &str) -> usize {
        self.entries
            .iter()
            .position(|c| c.label == label)
            .unwrap_or(usize::MAX)
    }
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Ranking listing URL with a `{code}` placeholder
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Upper bound on one page load
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Six-field cron expressions (UTC) that trigger a full cycle
    #[serde(default = "default_schedule")]
    pub schedule: Vec<String>,

    /// Keep the existing snapshot when a page yields no products
    #[serde(default = "default_skip_empty")]
    pub skip_empty_snapshots: bool,

    #[serde(default)]
    pub selectors: SiteSelectors,

    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

fn default_database_url() -> String {
    "sqlite:database/rankings.db".to_string()
}

fn default_listing_url() -> String {
    "https://www.oliveyoung.co.kr/store/main/getBestList.do?dispCatNo=900000100100001&fltDispCatNo={code}&pageIdx=1&rowsPerPage=100".to_string()
}

const fn default_render_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    "ko-KR,ko;q=0.9,en-US;q=0.8".to_string()
}

fn default_schedule() -> Vec<String> {
    // Every three hours at ten past; 3 divides the UTC+9 offset so the
    // local wall-clock times line up with the UTC ones.
    vec!["0 10 */3 * * *".to_string()]
}

const fn default_skip_empty() -> bool {
    true
}

fn default_categories() -> Vec<Category> {
    [
        ("전체", ""),
        ("스킨케어", "10000010001"),
        ("마스크팩", "10000010009"),
        ("클렌징", "10000010010"),
        ("선케어", "10000010011"),
        ("메이크업", "10000010002"),
        ("네일", "10000010012"),
        ("뷰티소품", "10000010006"),
        ("더모 코스메틱", "10000010008"),
        ("맨즈케어", "10000010007"),
        ("향수/디퓨저", "10000010005"),
        ("헤어케어", "10000010004"),
        ("바디케어", "10000010003"),
        ("건강식품", "10000020001"),
        ("푸드", "10000020002"),
        ("구강용품", "10000020003"),
        ("헬스/건강용품", "10000020005"),
        ("여성/위생용품", "10000020004"),
        ("패션", "10000030007"),
        ("리빙/가전", "10000030005"),
        ("취미/팬시", "10000030006"),
    ]
    .into_iter()
    .map(|(label, code)| Category {
        label: label.to_string(),
        code: code.to_string(),
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            listing_url: default_listing_url(),
            render_timeout_secs: default_render_timeout_secs(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            schedule: default_schedule(),
            skip_empty_snapshots: default_skip_empty(),
            selectors: SiteSelectors::default(),
            categories: default_categories(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration from an explicit path, `./ranking.toml`, or defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("ranking.toml");
        if local_config.exists() {
            debug!("Found ranking.toml in current directory");
            return Self::from_file(local_config);
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("RANKING_DATABASE_URL") {
            self.database_url = url;
        }

        if let Ok(schedule) = std::env::var("RANKING_SCHEDULE") {
            self.schedule = schedule
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        self
    }

    #[must_use]
    pub const fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    /// Validated category table.
    pub fn category_table(&self) -> Result<CategoryTable> {
        CategoryTable::new(self.categories.clone())
    }
}

pub fn build_listing_url(pattern: &str, code: &str) -> String {
    let encoded = urlencoding::encode(code);
    pattern.replace("{code}", &encoded)
}
