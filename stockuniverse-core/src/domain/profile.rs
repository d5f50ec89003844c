//! Merged per-symbol description.
//!
//! A profile is seeded from whichever source knows the symbol. When both do,
//! the listing seeds it and the index overrides `headquarters`,
//! `sub_industry` and `sector`. The default (all-`None`) profile is the
//! "not found" marker and serializes as `{}`.

use super::records::{ListingRecord, SymbolRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_etf: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cqs_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_lot_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_issue: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_first_added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cik: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded: Option<String>,
}

impl SymbolProfile {
    /// The "not found" marker.
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_not_found(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the two sources for one symbol. `None` on both sides yields the
    /// not-found marker.
    pub fn merge(listing: Option<&ListingRecord>, index: Option<&SymbolRecord>) -> Self {
        match (listing, index) {
            (Some(listing), Some(index)) => {
                let mut profile = Self::from(listing);
                profile.headquarters = Some(index.headquarters.clone());
                profile.sub_industry = Some(index.sub_industry.clone());
                profile.sector = Some(index.sector.clone());
                profile
            }
            (Some(listing), None) => Self::from(listing),
            (None, Some(index)) => Self::from(index),
            (None, None) => Self::not_found(),
        }
    }
}

impl From<&ListingRecord> for SymbolProfile {
    fn from(rec: &ListingRecord) -> Self {
        Self {
            symbol: Some(rec.exchange_symbol.clone()),
            security_name: Some(rec.security_name.clone()),
            company_name: rec.company_name.clone(),
            exchange_id: Some(rec.exchange_id.clone()),
            is_etf: Some(rec.is_etf),
            act_symbol: rec.act_symbol.clone(),
            cqs_symbol: rec.cqs_symbol.clone(),
            round_lot_size: rec.round_lot_size,
            test_issue: rec.test_issue,
            ..Self::default()
        }
    }
}

impl From<&SymbolRecord> for SymbolProfile {
    fn from(rec: &SymbolRecord) -> Self {
        Self {
            symbol: Some(rec.symbol.clone()),
            security_name: Some(rec.security_name.clone()),
            sector: Some(rec.sector.clone()),
            sub_industry: Some(rec.sub_industry.clone()),
            headquarters: Some(rec.headquarters.clone()),
            date_first_added: rec.date_first_added.clone(),
            cik: rec.cik.clone(),
            founded: rec.founded.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ListingRecord {
        ListingRecord {
            exchange_symbol: "IBM".into(),
            security_name: "International Business Machines Corporation Common Stock".into(),
            exchange_id: "N".into(),
            is_etf: false,
            act_symbol: Some("IBM".into()),
            company_name: Some("International Business Machines Corporation".into()),
            cqs_symbol: Some("IBM".into()),
            round_lot_size: Some(100),
            test_issue: Some(false),
        }
    }

    fn index() -> SymbolRecord {
        SymbolRecord {
            symbol: "IBM".into(),
            security_name: "IBM".into(),
            sector: "Information Technology".into(),
            sub_industry: "IT Consulting & Other Services".into(),
            headquarters: "Armonk, New York".into(),
            date_first_added: Some("1957-03-04".into()),
            cik: Some("0000051143".into()),
            founded: Some("1911".into()),
        }
    }

    #[test]
    fn index_overrides_three_fields_only() {
        let merged = SymbolProfile::merge(Some(&listing()), Some(&index()));

        assert_eq!(merged.sector.as_deref(), Some("Information Technology"));
        assert_eq!(merged.headquarters.as_deref(), Some("Armonk, New York"));
        assert_eq!(merged.sub_industry.as_deref(), Some("IT Consulting & Other Services"));
        // Listing fields survive, index-only extras are not pulled in.
        assert_eq!(
            merged.security_name.as_deref(),
            Some("International Business Machines Corporation Common Stock")
        );
        assert_eq!(merged.round_lot_size, Some(100));
        assert_eq!(merged.cik, None);
        assert_eq!(merged.founded, None);
    }

    #[test]
    fn single_source_is_returned_unmodified() {
        let from_index = SymbolProfile::merge(None, Some(&index()));
        assert_eq!(from_index, SymbolProfile::from(&index()));
        assert_eq!(from_index.cik.as_deref(), Some("0000051143"));

        let from_listing = SymbolProfile::merge(Some(&listing()), None);
        assert_eq!(from_listing.sector, None);
        assert_eq!(from_listing.is_etf, Some(false));
    }

    #[test]
    fn not_found_serializes_as_empty_object() {
        let marker = SymbolProfile::merge(None, None);
        assert!(marker.is_not_found());
        assert_eq!(serde_json::to_string(&marker).unwrap(), "{}");
    }
}
