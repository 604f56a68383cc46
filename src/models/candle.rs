//! Historical bar (kline) models.

use serde::Deserialize;

/// One bar of `GET /api/v3/klines`.
///
/// The endpoint returns positional arrays:
/// `[open_time, open, high, low, close, volume, close_time, ...]`; trailing
/// fields are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Kline {
    pub open_time: i64,
    pub close: f64,
}

impl<'de> Deserialize<'de> for Kline {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
        let open_time = raw
            .first()
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| D::Error::custom("kline missing open time"))?;
        let close = match raw.get(4) {
            Some(serde_json::Value::String(s)) => s
                .parse::<f64>()
                .map_err(|e| D::Error::custom(format!("invalid kline close {s:?}: {e}")))?,
            Some(serde_json::Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("kline close out of range"))?,
            _ => return Err(D::Error::custom("kline missing close")),
        };

        Ok(Kline { open_time, close })
    }
}

/// Percent change from the close `days` bars before the last one to `price`.
///
/// Returns `None` when there is not enough history or the reference close
/// is zero.
pub fn change_over_days(bars: &[Kline], days: usize, price: f64) -> Option<f64> {
    let last = bars.len().checked_sub(1)?;
    let reference = bars.get(last.checked_sub(days)?)?.close;
    if reference == 0.0 {
        return None;
    }
    Some((price - reference) * 100.0 / reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_positional_kline() {
        let json = r#"[1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100","148976.11",1499644799999,"2434.19",308,"1756.87","28.46","0"]"#;
        let kline: Kline = serde_json::from_str(json).unwrap();
        assert_eq!(kline.open_time, 1_499_040_000_000);
        assert_eq!(kline.close, 0.015771);
    }

    #[test]
    fn rejects_short_kline() {
        assert!(serde_json::from_str::<Kline>("[1499040000000]").is_err());
    }

    #[test]
    fn change_over_days_uses_close_n_bars_back() {
        let bars: Vec<Kline> = (0..8)
            .map(|i| Kline {
                open_time: i,
                close: 100.0 + i as f64,
            })
            .collect();
        // Last bar is index 7; seven days back is index 0 (close 100).
        assert_eq!(change_over_days(&bars, 7, 110.0), Some(10.0));
        assert_eq!(change_over_days(&bars, 8, 110.0), None);
    }

    #[test]
    fn change_over_days_handles_zero_reference() {
        let bars = vec![
            Kline {
                open_time: 0,
                close: 0.0,
            },
            Kline {
                open_time: 1,
                close: 5.0,
            },
        ];
        assert_eq!(change_over_days(&bars, 1, 5.0), None);
        assert_eq!(change_over_days(&[], 1, 5.0), None);
    }
}
