//! Data models for ranking snapshots and update bookkeeping

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Marker stored when a field could not be read from the page.
pub const UNKNOWN: &str = "X";

/// Canonical currency suffix appended to every known price.
pub const CURRENCY: &str = "원";

/// Separator placed between promotional flags.
pub const FLAG_SEPARATOR: &str = " / ";

/// Offset of the site's local clock (UTC+9).
pub const SITE_UTC_OFFSET_SECS: i32 = 9 * 3600;

const SITE_OFFSET: FixedOffset = match FixedOffset::east_opt(SITE_UTC_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("site offset out of range"),
};

/// The site-local timezone.
#[must_use]
pub const fn site_offset() -> FixedOffset {
    SITE_OFFSET
}

/// Current wall-clock time on the site's local clock.
#[must_use]
pub fn site_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&site_offset())
}

/// Calendar day on the site's local clock.
#[must_use]
pub fn site_today() -> NaiveDate {
    site_now().date_naive()
}

/// One product slot as pulled from the rendered page, before cleanup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub rank: u32,
    pub brand: String,
    pub product: String,
    pub sale_price: String,
    pub original_price: String,
    pub flags: Vec<String>,
}

/// A normalized product slot, ready to be written as part of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub rank: u32,
    pub brand: String,
    pub product: String,
    pub sale_price: String,
    pub original_price: String,
    pub event: String,
}

impl From<&RankedProduct> for RawRecord {
    fn from(item: &RankedProduct) -> Self {
        let flags = if item.event == UNKNOWN {
            Vec::new()
        } else {
            item.event.split(FLAG_SEPARATOR).map(str::to_string).collect()
        };

        Self {
            rank: item.rank,
            brand: item.brand.clone(),
            product: item.product.clone(),
            sale_price: item.sale_price.clone(),
            original_price: item.original_price.clone(),
            flags,
        }
    }
}

/// One product's position in one category on one day, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub date: NaiveDate,
    pub category: String,
    pub rank: u32,
    pub brand: String,
    pub product: String,
    pub sale_price: String,
    pub original_price: String,
    pub event: String,
}

/// Freshness marker appended after a category's snapshot is replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLogEntry {
    pub id: i64,
    pub category: String,
    pub updated_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_from_ranked_product_splits_flags() {
        let item = RankedProduct {
            rank: 3,
            brand: "Brand".to_string(),
            product: "Toner".to_string(),
            sale_price: "9900원".to_string(),
            original_price: "12000원".to_string(),
            event: "세일 / 쿠폰".to_string(),
        };

        let raw = RawRecord::from(&item);
        assert_eq!(raw.rank, 3);
        assert_eq!(raw.flags, vec!["세일", "쿠폰"]);
    }

    #[test]
    fn raw_record_from_unknown_event_has_no_flags() {
        let item = RankedProduct {
            rank: 1,
            brand: String::new(),
            product: "Cream".to_string(),
            sale_price: UNKNOWN.to_string(),
            original_price: UNKNOWN.to_string(),
            event: UNKNOWN.to_string(),
        };

        assert!(RawRecord::from(&item).flags.is_empty());
    }

    #[test]
    fn site_clock_is_nine_hours_ahead() {
        assert_eq!(site_offset().local_minus_utc(), 9 * 3600);
    }
}
