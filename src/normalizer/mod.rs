//! Price and promotion cleanup for extracted product slots.
//!
//! Every function here is pure: the same raw record always yields the same
//! normalized record, and normalizing a normalized record changes nothing.

use crate::models::{CURRENCY, FLAG_SEPARATOR, RankedProduct, RawRecord, UNKNOWN};

/// Canonical form of a price text, or the unknown marker.
pub fn normalize_price(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN {
        return UNKNOWN.to_string();
    }

    let amount = trimmed.strip_suffix(CURRENCY).unwrap_or(trimmed).trim();
    if amount.is_empty() {
        return UNKNOWN.to_string();
    }

    format!("{amount}{CURRENCY}")
}

/// Substitute whichever price is known for the one that is not.
pub fn cross_fill(sale_price: String, original_price: String) -> (String, String) {
    match (sale_price == UNKNOWN, original_price == UNKNOWN) {
        (true, false) => (original_price.clone(), original_price),
        (false, true) => (sale_price.clone(), sale_price),
        _ => (sale_price, original_price),
    }
}

pub fn join_flags(flags: &[String]) -> String {
    let flags: Vec<&str> = flags
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();

    if flags.is_empty() {
        UNKNOWN.to_string()
    } else {
        flags.join(FLAG_SEPARATOR)
    }
}

pub fn normalize(raw: &RawRecord) -> RankedProduct {
    let (sale_price, original_price) = cross_fill(
        normalize_price(&raw.sale_price),
        normalize_price(&raw.original_price),
    );

    RankedProduct {
        rank: raw.rank,
        brand: raw.brand.trim().to_string(),
        product: raw.product.trim().to_string(),
        sale_price,
        original_price,
        event: join_flags(&raw.flags),
    }
}

pub fn normalize_all(raw: &[RawRecord]) -> Vec<RankedProduct> {
    raw.iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(sale: &str, original: &str, flags: &[&str]) -> RawRecord {
        RawRecord {
            rank: 1,
            brand: "A".to_string(),
            product: "B".to_string(),
            sale_price: sale.to_string(),
            original_price: original.to_string(),
            flags: flags.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    #[test]
    fn missing_sale_price_takes_original() {
        let out = normalize(&raw("X", "10000원", &[]));
        assert_eq!(out.sale_price, "10000원");
        assert_eq!(out.original_price, "10000원");
        assert_eq!(out.brand, "A");
        assert_eq!(out.product, "B");
    }

    #[test]
    fn missing_original_price_takes_sale() {
        let out = normalize(&raw("8,900", "", &[]));
        assert_eq!(out.sale_price, "8,900원");
        assert_eq!(out.original_price, "8,900원");
    }

    #[test]
    fn both_prices_missing_stay_unknown() {
        let out = normalize(&raw("", "X", &[]));
        assert_eq!(out.sale_price, UNKNOWN);
        assert_eq!(out.original_price, UNKNOWN);
    }

    #[test]
    fn currency_suffix_is_canonicalized() {
        assert_eq!(normalize_price(" 12,000 원 "), "12,000원");
        assert_eq!(normalize_price("12,000"), "12,000원");
        assert_eq!(normalize_price("12,000원"), "12,000원");
        assert_eq!(normalize_price("원"), UNKNOWN);
    }

    #[test]
    fn flags_are_joined_or_marked_unknown() {
        assert_eq!(normalize(&raw("1", "2", &["세일", "쿠폰"])).event, "세일 / 쿠폰");
        assert_eq!(normalize(&raw("1", "2", &[])).event, UNKNOWN);
        assert_eq!(normalize(&raw("1", "2", &["  ", ""])).event, UNKNOWN);
    }

    #[test]
    fn brand_and_product_are_trimmed() {
        let mut record = raw("1", "2", &[]);
        record.brand = "  라운드랩 ".to_string();
        record.product = "\n독도 토너\t".to_string();

        let out = normalize(&record);
        assert_eq!(out.brand, "라운드랩");
        assert_eq!(out.product, "독도 토너");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = vec![
            raw("X", "10000원", &[]),
            raw("9,900 원", "", &["세일"]),
            raw("", "", &["오늘드림", "증정"]),
            raw(" 5,000", "7,000원 ", &[" 쿠폰 "]),
        ];

        for input in inputs {
            let once = normalize(&input);
            let twice = normalize(&RawRecord::from(&once));
            assert_eq!(once, twice);
        }
    }
}
