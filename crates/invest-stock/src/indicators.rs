//! Price statistics and technical indicators over daily quotes

use crate::api::yahoo::Quote;
use crate::error::{Result, StockError};
use crate::records::{TechnicalRecord, timestamp_now};
use ta::Next;
use ta::indicators::SimpleMovingAverage;

const SHORT_MA: usize = 20;
const LONG_MA: usize = 50;
const RSI_PERIOD: usize = 14;

/// Snapshot statistics derived from a price history
#[derive(Debug, Clone, PartialEq)]
pub struct PriceStats {
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub week_52_high: f64,
    pub week_52_low: f64,
    pub volume: u64,
    pub avg_volume: f64,
}

/// Summarize a history; `None` when it is empty
///
/// Change is measured against the previous close and is zero with fewer than
/// two bars.
pub fn price_stats(quotes: &[Quote]) -> Option<PriceStats> {
    let last = quotes.last()?;

    let (price_change, price_change_percent) = match quotes.len() {
        n if n >= 2 => {
            let previous = quotes[n - 2].close;
            let change = last.close - previous;
            let percent = if previous == 0.0 { 0.0 } else { change / previous * 100.0 };
            (change, percent)
        }
        _ => (0.0, 0.0),
    };

    let high = quotes.iter().map(|q| q.high).fold(f64::MIN, f64::max);
    let low = quotes.iter().map(|q| q.low).fold(f64::MAX, f64::min);
    let avg_volume = quotes.iter().map(|q| q.volume as f64).sum::<f64>() / quotes.len() as f64;

    Some(PriceStats {
        current_price: round2(last.close),
        price_change: round2(price_change),
        price_change_percent: round2(price_change_percent),
        week_52_high: round2(high),
        week_52_low: round2(low),
        volume: last.volume,
        avg_volume: avg_volume.round(),
    })
}

/// Compute SMA20, SMA50 and RSI14 with their signals
pub fn technical_record(ticker: &str, quotes: &[Quote]) -> Result<TechnicalRecord> {
    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    let current_price = *closes.last().ok_or_else(|| StockError::DataUnavailable {
        symbol: ticker.to_string(),
        reason: "No historical data available".to_string(),
    })?;

    let ma20 = moving_average(&closes, SHORT_MA)?;
    let ma50 = moving_average(&closes, LONG_MA)?;
    let rsi = relative_strength(&closes, RSI_PERIOD)?;

    Ok(TechnicalRecord {
        ticker: ticker.to_string(),
        current_price: round2(current_price),
        moving_average_20: ma20.map(round2),
        moving_average_50: ma50.map(round2),
        rsi_14: rsi.map(round2),
        price_vs_ma20: position_vs(current_price, ma20).to_string(),
        price_vs_ma50: position_vs(current_price, ma50).to_string(),
        rsi_signal: rsi_signal(rsi).to_string(),
        calculated_at: timestamp_now(),
    })
}

/// Simple moving average of the last `period` closes, once the window is full
fn moving_average(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }
    let mut sma = SimpleMovingAverage::new(period).map_err(indicator_error)?;
    Ok(closes.iter().map(|&c| sma.next(c)).last())
}

/// RSI from plain rolling means of the last `period` gains and losses
///
/// Undefined until `period` price changes exist, and when the window holds no
/// movement at all.
fn relative_strength(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() <= period {
        return Ok(None);
    }
    let mut gains = SimpleMovingAverage::new(period).map_err(indicator_error)?;
    let mut losses = SimpleMovingAverage::new(period).map_err(indicator_error)?;

    let (mut avg_gain, mut avg_loss) = (0.0, 0.0);
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        avg_gain = gains.next(delta.max(0.0));
        avg_loss = losses.next((-delta).max(0.0));
    }

    Ok(match (avg_gain, avg_loss) {
        (g, l) if g == 0.0 && l == 0.0 => None,
        (_, l) if l == 0.0 => Some(100.0),
        (g, l) => Some(100.0 - 100.0 / (1.0 + g / l)),
    })
}

fn indicator_error(err: impl std::fmt::Display) -> StockError {
    StockError::IndicatorError(err.to_string())
}

fn position_vs(price: f64, average: Option<f64>) -> &'static str {
    match average {
        Some(avg) if price > avg => "Above",
        Some(_) => "Below",
        None => "N/A",
    }
}

fn rsi_signal(rsi: Option<f64>) -> &'static str {
    match rsi {
        Some(v) if v > 70.0 => "Overbought",
        Some(v) if v < 30.0 => "Oversold",
        Some(_) => "Neutral",
        None => "N/A",
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn quotes(closes: &[f64]) -> Vec<Quote> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Quote {
                symbol: "TEST".to_string(),
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000 + i as u64,
                adjclose: close,
            })
            .collect()
    }

    #[test]
    fn test_price_stats() {
        let stats = price_stats(&quotes(&[100.0, 110.0, 99.0])).unwrap();
        assert_eq!(stats.current_price, 99.0);
        assert_eq!(stats.price_change, -11.0);
        assert_eq!(stats.price_change_percent, -10.0);
        assert_eq!(stats.week_52_high, 111.0);
        assert_eq!(stats.week_52_low, 98.0);
        assert_eq!(stats.volume, 1_002);
        assert_eq!(stats.avg_volume, 1_001.0);
    }

    #[test]
    fn test_price_stats_single_bar() {
        let stats = price_stats(&quotes(&[42.0])).unwrap();
        assert_eq!(stats.price_change, 0.0);
        assert_eq!(stats.price_change_percent, 0.0);
        assert!(price_stats(&[]).is_none());
    }

    #[test]
    fn test_rising_series() {
        let closes: Vec<f64> = (1..=60).map(f64::from).collect();
        let record = technical_record("TEST", &quotes(&closes)).unwrap();

        assert_eq!(record.current_price, 60.0);
        assert_eq!(record.moving_average_20, Some(50.5));
        assert_eq!(record.moving_average_50, Some(35.5));
        assert_eq!(record.price_vs_ma20, "Above");
        assert_eq!(record.price_vs_ma50, "Above");
        assert_eq!(record.rsi_signal, "Overbought");
    }

    #[test]
    fn test_falling_series() {
        let closes: Vec<f64> = (1..=30).rev().map(f64::from).collect();
        let record = technical_record("TEST", &quotes(&closes)).unwrap();

        assert_eq!(record.price_vs_ma20, "Below");
        assert_eq!(record.moving_average_50, None);
        assert_eq!(record.price_vs_ma50, "N/A");
        assert_eq!(record.rsi_signal, "Oversold");
    }

    #[test]
    fn test_rsi_uses_rolling_means() {
        // 14 changes: seven +2 and seven -1, so average gain 1.0 and loss 0.5
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let record = technical_record("TEST", &quotes(&closes)).unwrap();

        assert_eq!(record.rsi_14, Some(66.67));
        assert_eq!(record.rsi_signal, "Neutral");
    }

    #[test]
    fn test_rsi_window_drops_old_changes() {
        // A crash followed by 14 gains: only the gains are in the window
        let mut closes = vec![200.0, 100.0];
        closes.extend((1..=14).map(|i| 100.0 + f64::from(i)));
        let record = technical_record("TEST", &quotes(&closes)).unwrap();

        assert_eq!(record.rsi_14, Some(100.0));
        assert_eq!(record.rsi_signal, "Overbought");
    }

    #[test]
    fn test_flat_series_has_no_rsi() {
        let record = technical_record("TEST", &quotes(&[50.0; 20])).unwrap();
        assert_eq!(record.rsi_14, None);
        assert_eq!(record.rsi_signal, "N/A");
        assert_eq!(record.moving_average_20, Some(50.0));
        assert_eq!(record.price_vs_ma20, "Below");
    }

    #[test]
    fn test_short_history() {
        let record = technical_record("TEST", &quotes(&[10.0, 11.0, 12.0])).unwrap();
        assert_eq!(record.moving_average_20, None);
        assert_eq!(record.rsi_14, None);
        assert_eq!(record.price_vs_ma20, "N/A");
        assert_eq!(record.rsi_signal, "N/A");
    }

    #[test]
    fn test_empty_history_is_error() {
        assert!(matches!(
            technical_record("TEST", &[]),
            Err(StockError::DataUnavailable { .. })
        ));
    }
}
