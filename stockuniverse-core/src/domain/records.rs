//! Reference records as stored in the reference store.
//!
//! Both shapes deserialize from store documents, which may carry extra keys
//! (the store's `_id` row identifier among them); unknown keys are ignored.

use serde::{Deserialize, Serialize};

/// Separator marking a non-common share class (e.g. `BRK-B`).
pub const CLASS_SEPARATOR: char = '-';

/// One index member (index-membership source).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub symbol: String,
    pub security_name: String,
    pub sector: String,
    pub sub_industry: String,
    pub headquarters: String,
    #[serde(default)]
    pub date_first_added: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub founded: Option<String>,
}

/// One listed instrument (exchange-listing source).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub exchange_symbol: String,
    pub security_name: String,
    pub exchange_id: String,
    pub is_etf: bool,
    #[serde(default)]
    pub act_symbol: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub cqs_symbol: Option<String>,
    #[serde(default)]
    pub round_lot_size: Option<u32>,
    #[serde(default)]
    pub test_issue: Option<bool>,
}

impl ListingRecord {
    /// True when the symbol denotes a non-common share class.
    pub fn is_special_class(&self) -> bool {
        self.exchange_symbol.contains(CLASS_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_document_with_row_id_deserializes() {
        let doc = serde_json::json!({
            "_id": 7,
            "exchange_symbol": "BRK-B",
            "security_name": "Berkshire Hathaway Inc. Class B",
            "exchange_id": "N",
            "is_etf": false
        });
        let rec: ListingRecord = serde_json::from_value(doc).unwrap();
        assert!(rec.is_special_class());
        assert_eq!(rec.round_lot_size, None);
    }

    #[test]
    fn index_record_optional_fields_default() {
        let doc = serde_json::json!({
            "symbol": "MMM",
            "security_name": "3M",
            "sector": "Industrials",
            "sub_industry": "Industrial Conglomerates",
            "headquarters": "Saint Paul, Minnesota"
        });
        let rec: SymbolRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(rec.cik, None);
        assert_eq!(rec.founded, None);
    }
}
