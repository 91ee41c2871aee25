use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::{Category, CategoryTable, Config};
use crate::database::Database;
use crate::error::ScrapeError;
use crate::extractor::Extractor;
use crate::models::site_now;
use crate::normalizer::normalize_all;
use crate::traits::PageRenderer;

/// What happened to one category during a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot replaced with this many products
    Replaced(usize),
    /// Page had no products; the stored snapshot was kept
    SkippedEmpty,
}

/// Per-category results of one full cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub refreshed: Vec<String>,
    pub skipped_empty: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle was still running when this one was triggered
    Skipped,
}

/// Drives render → extract → normalize → write for every configured category.
///
/// Categories are processed one at a time, and at most one cycle runs at once.
#[derive(Clone)]
pub struct RankingTracker {
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<Extractor>,
    database: Database,
    categories: Arc<CategoryTable>,
    skip_empty_snapshots: bool,
    cycle_guard: Arc<Mutex<()>>,
}

impl RankingTracker {
    pub fn new(
        config: &Config,
        renderer: Arc<dyn PageRenderer>,
        database: Database,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            renderer,
            extractor: Arc::new(Extractor::new(&config.selectors)?),
            database,
            categories: Arc::new(config.category_table()?),
            skip_empty_snapshots: config.skip_empty_snapshots,
            cycle_guard: Arc::new(Mutex::new(())),
        })
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Run one full pass over the category table unless a pass is already underway.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            warn!("Previous ranking cycle still running, skipping this trigger");
            return CycleOutcome::Skipped;
        };

        info!("Starting ranking cycle over {} categories", self.categories.len());
        let mut report = CycleReport::default();

        for category in self.categories.iter() {
            match self.scrape_category(category).await {
                Ok(RefreshOutcome::Replaced(count)) => {
                    info!("Updated {} with {} products", category.label, count);
                    report.refreshed.push(category.label.clone());
                }
                Ok(RefreshOutcome::SkippedEmpty) => {
                    report.skipped_empty.push(category.label.clone());
                }
                Err(e) => {
                    error!("Failed to refresh {}: {}", category.label, e);
                    report.failed.push((category.label.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Ranking cycle finished: {} refreshed, {} empty, {} failed",
            report.refreshed.len(),
            report.skipped_empty.len(),
            report.failed.len()
        );
        CycleOutcome::Completed(report)
    }

    /// Refresh a single category on demand.
    ///
    /// Unknown labels are rejected before anything is rendered. Waits for any
    /// running cycle to finish instead of racing it.
    pub async fn refresh_category(&self, label: &str) -> Result<RefreshOutcome, ScrapeError> {
        let category = self.categories.get(label)?.clone();
        let _guard = self.cycle_guard.lock().await;
        self.scrape_category(&category).await
    }

    async fn scrape_category(&self, category: &Category) -> Result<RefreshOutcome, ScrapeError> {
        info!("Scraping rankings for {} ({})", category.label, category.code);

        let page = self.renderer.render(&category.code).await?;
        let raw = self.extractor.extract(&page.html);

        if raw.is_empty() {
            let empty = ScrapeError::ExtractionEmpty {
                category: category.label.clone(),
            };
            if self.skip_empty_snapshots {
                warn!("{}; keeping the existing snapshot", empty);
                return Ok(RefreshOutcome::SkippedEmpty);
            }
            warn!("{}; replacing the snapshot with an empty one", empty);
        }

        let products = normalize_all(&raw);
        let now = site_now();

        self.database
            .replace_snapshot(now.date_naive(), &category.label, &products, now)
            .await
            .map_err(|source| ScrapeError::Persistence {
                category: category.label.clone(),
                source,
            })?;

        Ok(RefreshOutcome::Replaced(products.len()))
    }
}
