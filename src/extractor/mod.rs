use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::RawRecord;
use crate::traits::SiteSelectors;

/// Pulls ranked product slots out of a rendered listing.
///
/// Every product-info node becomes one record, in document order, with no
/// filtering or de-duplication. Order defines rank.
pub struct Extractor {
    product_info: Selector,
    brand: Selector,
    name: Selector,
    sale_price: Selector,
    original_price: Selector,
    flags: Selector,
}

fn parse_selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| anyhow::anyhow!("Failed to parse {field} selector {css:?}: {e:?}"))
}

fn first_text(node: ElementRef<'_>, selector: &Selector) -> String {
    node.select(selector).next().map_or_else(String::new, |el| {
        el.text().collect::<String>().trim().to_string()
    })
}

impl Extractor {
    pub fn new(selectors: &SiteSelectors) -> Result<Self> {
        Ok(Self {
            product_info: parse_selector("product info", &selectors.product_info)?,
            brand: parse_selector("brand", &selectors.brand)?,
            name: parse_selector("name", &selectors.name)?,
            sale_price: parse_selector("sale price", &selectors.sale_price)?,
            original_price: parse_selector("original price", &selectors.original_price)?,
            flags: parse_selector("flags", &selectors.flags)?,
        })
    }

    pub fn extract(&self, html: &str) -> Vec<RawRecord> {
        let document = Html::parse_document(html);

        let records: Vec<RawRecord> = document
            .select(&self.product_info)
            .zip(1u32..)
            .map(|(node, rank)| RawRecord {
                rank,
                brand: first_text(node, &self.brand),
                product: first_text(node, &self.name),
                sale_price: first_text(node, &self.sale_price),
                original_price: first_text(node, &self.original_price),
                flags: node
                    .select(&self.flags)
                    .map(|el| el.text().collect::<String>().trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect(),
            })
            .collect();

        debug!("Extracted {} product slots", records.len());
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&SiteSelectors::default()).unwrap()
    }

    #[test]
    fn ranks_follow_document_order() {
        let html = r#"
            <ul>
              <li><div class="prd_info"><span class="tx_brand">A</span><p class="tx_name">First</p></div></li>
              <li><div class="prd_info"><span class="tx_brand">B</span><p class="tx_name">Second</p></div></li>
              <li><div class="prd_info"><span class="tx_brand">A</span><p class="tx_name">First</p></div></li>
            </ul>
        "#;

        let records = extractor().extract(html);
        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(records[1].product, "Second");
        // duplicates are kept as rendered
        assert_eq!(records[2].product, "First");
    }

    #[test]
    fn missing_sub_elements_become_empty_strings() {
        let html = r#"<div class="prd_info"><p class="tx_name"> Lonely Serum </p></div>"#;

        let records = extractor().extract(html);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.brand, "");
        assert_eq!(record.product, "Lonely Serum");
        assert_eq!(record.sale_price, "");
        assert_eq!(record.original_price, "");
        assert!(record.flags.is_empty());
    }

    #[test]
    fn collects_all_flags_in_order() {
        let html = r#"
            <div class="prd_info">
              <p class="tx_name">Cushion</p>
              <p class="prd_flag">
                <span class="icon_flag sale">세일</span>
                <span class="icon_flag coupon">쿠폰</span>
                <span class="icon_flag gift">증정</span>
              </p>
            </div>
        "#;

        let records = extractor().extract(html);
        assert_eq!(records[0].flags, vec!["세일", "쿠폰", "증정"]);
    }

    #[test]
    fn page_without_products_yields_nothing() {
        assert!(extractor().extract("<html><body><p>점검 중</p></body></html>").is_empty());
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let selectors = SiteSelectors {
            product_info: "div[".to_string(),
            ..SiteSelectors::default()
        };
        let err = Extractor::new(&selectors).err().unwrap().to_string();
        assert!(err.contains("product info"));
    }
}
