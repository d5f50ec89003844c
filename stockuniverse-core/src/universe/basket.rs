//! Curated cross-sector ETF basket.

const KEY_ETFS: [&str; 21] = [
    "FBND", "FCOM", "FCOR", "FDIS", "FENY", "FHLC", "FIDU", "FLTB", "FMAT", "FNCL", "FSTA",
    "FTEC", "FUTY", "FZROX", "GLD", "IWM", "QQQ", "SCHD", "SPY", "VEA", "VOO",
];

/// The hand-maintained key ETF list.
pub fn key_etfs() -> Vec<String> {
    KEY_ETFS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basket_is_fixed_and_unique() {
        let basket = key_etfs();
        assert_eq!(basket.len(), 21);
        assert!(basket.contains(&"SPY".to_string()));
        let mut deduped = basket.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), basket.len());
    }
}
