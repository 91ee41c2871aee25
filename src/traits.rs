//! Traits and interfaces for page rendering and markup selection

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// CSS selectors for the parts of a ranking listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// One node per ranked product slot, in page order
    pub product_info: String,
    /// Brand text within a product node
    pub brand: String,
    /// Product name within a product node
    pub name: String,
    /// Discounted price text within a product node
    pub sale_price: String,
    /// List price text within a product node
    pub original_price: String,
    /// Promotional flag badges within a product node
    pub flags: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            product_info: ".prd_info".to_string(),
            brand: ".tx_brand".to_string(),
            name: ".tx_name".to_string(),
            sale_price: ".tx_cur .tx_num".to_string(),
            original_price: ".tx_org .tx_num".to_string(),
            flags: ".prd_flag .icon_flag".to_string(),
        }
    }
}

/// Fully rendered markup of one ranking listing.
///
/// Holds the serialized DOM rather than a parsed tree so it can cross await
/// points; `scraper::Html` is not `Send`.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// Loads a category's ranking listing with scripting enabled
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render the listing for an upstream category code.
    ///
    /// # Errors
    /// * `ScrapeError::RenderTimeout` if the page did not finish loading in time
    /// * `ScrapeError::Navigation` if the browser could not start or navigate
    async fn render(&self, category_code: &str) -> Result<RenderedPage, ScrapeError>;
}
