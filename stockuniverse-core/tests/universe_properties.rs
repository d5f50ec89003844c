//! Property tests for universe resolution.
//!
//! Uses proptest to verify:
//! 1. Idempotence: resolving twice over unchanged tables gives the same set
//! 2. Partition: every listing row lands in exactly one of ETF / non-ETF,
//!    except class-separator rows, which only leave the non-ETF side
//! 3. Precedence: the index wins sector, sub-industry and headquarters
//! 4. Case-insensitivity of describe
//! 5. Unknown symbols describe as the empty marker, through the store too

use proptest::prelude::*;
use std::collections::BTreeSet;
use stockuniverse_core::domain::{ListingRecord, SymbolProfile, SymbolRecord};
use stockuniverse_core::store::{
    replace_typed, MemoryStore, ReferenceStore, INDEX_COLLECTION, LISTING_COLLECTION,
};
use stockuniverse_core::universe::{ReferenceTables, UniverseResolver};
use stockuniverse_core::ErrorKind;

// ── Builders ─────────────────────────────────────────────────────────

fn member(symbol: &str, sector: &str) -> SymbolRecord {
    SymbolRecord {
        symbol: symbol.into(),
        security_name: format!("{symbol} Corp"),
        sector: sector.into(),
        sub_industry: format!("{sector} Sub"),
        headquarters: "Index City".into(),
        date_first_added: None,
        cik: None,
        founded: None,
    }
}

fn listed(symbol: &str, is_etf: bool) -> ListingRecord {
    ListingRecord {
        exchange_symbol: symbol.into(),
        security_name: format!("{symbol} Listed"),
        exchange_id: "N".into(),
        is_etf,
        act_symbol: Some(symbol.replace('-', ".")),
        company_name: Some(format!("{symbol} Company")),
        cqs_symbol: None,
        round_lot_size: Some(100),
        test_issue: Some(false),
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_symbol() -> impl Strategy<Value = String> {
    ("[A-E]{1,3}", prop::option::of("[A-B]")).prop_map(|(base, class)| match class {
        Some(c) => format!("{base}-{c}"),
        None => base,
    })
}

fn arb_listing() -> impl Strategy<Value = Vec<ListingRecord>> {
    prop::collection::vec((arb_symbol(), any::<bool>()), 0..40)
        .prop_map(|rows| rows.iter().map(|(s, etf)| listed(s, *etf)).collect())
}

fn arb_index() -> impl Strategy<Value = Vec<SymbolRecord>> {
    prop::collection::vec("[A-E]{1,3}", 0..30)
        .prop_map(|rows| rows.iter().map(|s| member(s, "Industrials")).collect())
}

fn seeded_store(index: &[SymbolRecord], listing: &[ListingRecord]) -> MemoryStore {
    let store = MemoryStore::new();
    replace_typed(&store, INDEX_COLLECTION, index).unwrap();
    replace_typed(&store, LISTING_COLLECTION, listing).unwrap();
    store
}

// ── 1. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn universe_is_idempotent_sorted_and_unique(index in arb_index(), listing in arb_listing()) {
        let store = seeded_store(&index, &listing);
        let resolver = UniverseResolver::new(&store);

        let first = resolver.non_etf_universe().unwrap();
        let second = resolver.non_etf_universe().unwrap();
        prop_assert_eq!(&first, &second);

        let mut sorted = first.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(first, sorted);
    }
}

// ── 2. Partition ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn listing_partition_is_total_and_disjoint(listing in arb_listing()) {
        let tables = ReferenceTables::new(Vec::new(), listing.clone());
        let non_etf: BTreeSet<String> = tables.non_etf_universe().into_iter().collect();
        let etf: BTreeSet<String> = tables.etf_universe().into_iter().collect();

        for rec in &listing {
            let s = &rec.exchange_symbol;
            if rec.is_etf {
                prop_assert!(etf.contains(s));
            } else if rec.is_special_class() {
                prop_assert!(!non_etf.contains(s));
            } else {
                prop_assert!(non_etf.contains(s));
            }
        }
        // With no duplicate rows across the flag, the two sides never overlap.
        let flagged_both = listing.iter().any(|a| {
            listing
                .iter()
                .any(|b| a.exchange_symbol == b.exchange_symbol && a.is_etf != b.is_etf)
        });
        if !flagged_both {
            prop_assert!(non_etf.is_disjoint(&etf));
        }
    }

    #[test]
    fn every_index_member_is_in_the_universe(index in arb_index(), listing in arb_listing()) {
        let tables = ReferenceTables::new(index.clone(), listing);
        let universe: BTreeSet<String> = tables.non_etf_universe().into_iter().collect();
        for rec in &index {
            prop_assert!(universe.contains(&rec.symbol));
        }
    }
}

// ── 3. Precedence ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn index_overrides_classification(symbol in "[A-E]{1,3}", sector in "[A-Za-z ]{1,12}") {
        let mut listing_rec = listed(&symbol, false);
        listing_rec.security_name = "From Listing".into();
        let tables = ReferenceTables::new(vec![member(&symbol, &sector)], vec![listing_rec]);

        let profile = tables.describe(&symbol);
        prop_assert_eq!(profile.sector.as_deref(), Some(sector.as_str()));
        prop_assert_eq!(profile.headquarters.as_deref(), Some("Index City"));
        prop_assert_eq!(profile.security_name.as_deref(), Some("From Listing"));
        prop_assert_eq!(profile.exchange_id.as_deref(), Some("N"));
    }
}

// ── 4. Case-insensitivity ────────────────────────────────────────────

proptest! {
    #[test]
    fn describe_ignores_query_case(index in arb_index(), listing in arb_listing(), pick in 0usize..64) {
        let tables = ReferenceTables::new(index.clone(), listing.clone());
        let candidates: Vec<&str> = index
            .iter()
            .map(|r| r.symbol.as_str())
            .chain(listing.iter().map(|r| r.exchange_symbol.as_str()))
            .collect();
        prop_assume!(!candidates.is_empty());

        let symbol = candidates[pick % candidates.len()];
        let upper = tables.describe(symbol);
        prop_assert_eq!(tables.describe(&symbol.to_lowercase()), upper.clone());
        prop_assert!(!upper.is_not_found());
    }
}

// ── 5. Not-found marker ──────────────────────────────────────────────

#[test]
fn unknown_symbol_is_empty_marker_not_error() {
    let store = seeded_store(&[member("MMM", "Industrials")], &[listed("A", false)]);
    let resolver = UniverseResolver::new(&store);

    let profile = resolver.describe("ZZZNOTREAL").unwrap();
    assert!(profile.is_not_found());
    assert_eq!(serde_json::to_string(&profile).unwrap(), "{}");
}

#[test]
fn describe_all_keeps_going_past_misses() {
    let store = seeded_store(&[member("MMM", "Industrials")], &[listed("SPY", true)]);
    let resolver = UniverseResolver::new(&store);

    let profiles = resolver.describe_all(&["mmm", "NOPE", "spy"]).unwrap();
    assert_eq!(profiles.len(), 3);
    assert_eq!(profiles[0].symbol.as_deref(), Some("MMM"));
    assert_eq!(profiles[1], SymbolProfile::not_found());
    assert_eq!(profiles[2].is_etf, Some(true));
}

#[test]
fn missing_collection_is_source_unavailable() {
    let store = MemoryStore::new();
    replace_typed(&store, INDEX_COLLECTION, &[member("MMM", "Industrials")]).unwrap();
    let resolver = UniverseResolver::new(&store);

    let err = resolver.non_etf_universe().unwrap_err();
    let err: stockuniverse_core::Error = err.into();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    assert!(store.collection_names().unwrap().contains(&INDEX_COLLECTION.to_string()));
}
