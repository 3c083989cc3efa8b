/// Known symbol -> venue-code divergences.
///
/// Kraken lists a handful of assets under codes that differ from their
/// common tickers. This is data, not code: the resolver tries the symbol
/// itself first, then each alias in table order.
pub const ALIAS_TABLE: &[(&str, &[&str])] = &[
    ("BTC", &["XBT"]),
    ("DOGE", &["XDG"]),
    ("MIOTA", &["IOTA"]),
];

/// Aliases for one symbol, empty when it has none.
pub fn aliases(symbol: &str) -> &'static [&'static str] {
    ALIAS_TABLE
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, alts)| *alts)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        assert_eq!(aliases("BTC"), &["XBT"]);
        assert_eq!(aliases("DOGE"), &["XDG"]);
    }

    #[test]
    fn test_unknown_symbol_has_no_aliases() {
        assert!(aliases("ETH").is_empty());
        assert!(aliases("ZZZ").is_empty());
    }
}
