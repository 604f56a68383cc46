//! Quote-asset classification for exchange symbols.
//!
//! Exchange symbols are a bare concatenation of base and quote asset
//! (`BTCUSDT`, `ETHBTC`), so the quote is recovered by matching the longest
//! known suffix.

/// Quote assets the board knows how to group by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuoteAsset {
    Usdt,
    Fdusd,
    Usdc,
    Tusd,
    Busd,
    Btc,
    Eth,
    Bnb,
    Eur,
    Try,
    Brl,
    Jpy,
}

impl QuoteAsset {
    /// Cycle order used by the quote filter.
    pub const ALL: [QuoteAsset; 12] = [
        QuoteAsset::Usdt,
        QuoteAsset::Fdusd,
        QuoteAsset::Usdc,
        QuoteAsset::Tusd,
        QuoteAsset::Busd,
        QuoteAsset::Btc,
        QuoteAsset::Eth,
        QuoteAsset::Bnb,
        QuoteAsset::Eur,
        QuoteAsset::Try,
        QuoteAsset::Brl,
        QuoteAsset::Jpy,
    ];

    /// Returns the ticker suffix for this asset.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteAsset::Usdt => "USDT",
            QuoteAsset::Fdusd => "FDUSD",
            QuoteAsset::Usdc => "USDC",
            QuoteAsset::Tusd => "TUSD",
            QuoteAsset::Busd => "BUSD",
            QuoteAsset::Btc => "BTC",
            QuoteAsset::Eth => "ETH",
            QuoteAsset::Bnb => "BNB",
            QuoteAsset::Eur => "EUR",
            QuoteAsset::Try => "TRY",
            QuoteAsset::Brl => "BRL",
            QuoteAsset::Jpy => "JPY",
        }
    }

    /// Parses an asset code such as `USDT`, ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|quote| quote.as_str().eq_ignore_ascii_case(code))
            .copied()
    }
}

/// Returns the quote asset of `symbol`, if its suffix is a known one.
///
/// The longest matching suffix wins, so `BTCFDUSD` is `FDUSD` rather than
/// `USD`-anything, and `USDCUSDT` is `USDT`. A symbol that consists of
/// nothing but a quote suffix has no base and yields `None`.
pub fn quote_asset(symbol: &str) -> Option<QuoteAsset> {
    let upper = symbol.to_ascii_uppercase();

    QuoteAsset::ALL
        .iter()
        .filter(|quote| {
            let suffix = quote.as_str();
            upper.len() > suffix.len() && upper.ends_with(suffix)
        })
        .max_by_key(|quote| quote.as_str().len())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_pairs() {
        assert_eq!(quote_asset("BTCUSDT"), Some(QuoteAsset::Usdt));
        assert_eq!(quote_asset("ETHBTC"), Some(QuoteAsset::Btc));
        assert_eq!(quote_asset("SOLBNB"), Some(QuoteAsset::Bnb));
        assert_eq!(quote_asset("BTCTRY"), Some(QuoteAsset::Try));
    }

    #[test]
    fn longest_suffix_wins() {
        assert_eq!(quote_asset("BTCFDUSD"), Some(QuoteAsset::Fdusd));
        assert_eq!(quote_asset("BTCTUSD"), Some(QuoteAsset::Tusd));
        assert_eq!(quote_asset("USDCUSDT"), Some(QuoteAsset::Usdt));
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(quote_asset("ethusdc"), Some(QuoteAsset::Usdc));
    }

    #[test]
    fn parses_asset_codes() {
        assert_eq!(QuoteAsset::from_code("FDUSD"), Some(QuoteAsset::Fdusd));
        assert_eq!(QuoteAsset::from_code("eur"), Some(QuoteAsset::Eur));
        assert_eq!(QuoteAsset::from_code("DAI"), None);
    }

    #[test]
    fn unknown_or_bare_suffix_is_none() {
        assert_eq!(quote_asset("BTCXYZ"), None);
        assert_eq!(quote_asset("USDT"), None);
        assert_eq!(quote_asset(""), None);
    }
}
