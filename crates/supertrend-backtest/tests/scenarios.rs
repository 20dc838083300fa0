//! End-to-end runs through bands, trend, signals and the simulator.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use supertrend_backtest::{ExitReason, Pipeline, PipelineConfig};
use supertrend_core::types::{Bar, BarSeries, Direction, Timeframe};
use supertrend_indicators::{BandParams, MacdOutput};
use supertrend_signals::OscillatorInputs;

const START: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

fn series(closes: &[f64], spread: f64) -> BarSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(START + i as i64 * HOUR, c, c + spread, c - spread, c))
        .collect();
    BarSeries::new("TEST", Timeframe::Hour1, bars).unwrap()
}

fn neutral_inputs(n: usize) -> OscillatorInputs {
    OscillatorInputs {
        momentum: vec![Some(50.0); n],
        macd: vec![Some(MacdOutput { macd: 0.0, signal: 0.0 }); n],
    }
}

#[test]
fn flat_prices_trade_nothing() {
    let s = series(&[100.0; 200], 0.0);
    let report = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run(&s)
        .unwrap();

    assert!(report.long_entries.iter().all(|f| !f));
    assert!(report.short_entries.iter().all(|f| !f));
    assert!(report.trades.is_empty());
    assert_eq!(report.stats.total_return, Decimal::ZERO);
    assert_eq!(report.stats.final_equity, report.stats.initial_cash);
    assert_eq!(report.stats.win_rate_pct, None);
    assert!(report.summary().contains("No trades triggered"));
}

#[test]
fn single_breakout_opens_one_long() {
    // Slow decline, then a gap up at bar 30 and a steady climb
    let closes: Vec<f64> = (0..40)
        .map(|i| {
            if i < 30 {
                100.0 - 0.3 * i as f64
            } else {
                110.0 + 0.5 * (i - 30) as f64
            }
        })
        .collect();
    let s = series(&closes, 0.5);

    let mut inputs = neutral_inputs(40);
    inputs.momentum[29] = Some(25.0);
    for (i, point) in inputs.macd.iter_mut().enumerate() {
        let macd = if i < 30 { -1.0 } else { 1.0 };
        *point = Some(MacdOutput { macd, signal: 0.0 });
    }

    let config = PipelineConfig {
        bands: BandParams {
            period: 3,
            multiplier: 1.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = Pipeline::new(config).unwrap().run_with_inputs(&s, &inputs).unwrap();

    // The close crosses above the trend line exactly once, at bar 30
    let crossings: Vec<usize> = (1..40)
        .filter(|&i| match (report.trend_line[i - 1], report.trend_line[i]) {
            (Some(prev), Some(line)) => closes[i] > line && closes[i - 1] <= prev,
            _ => false,
        })
        .collect();
    assert_eq!(crossings, vec![30]);

    let flagged: Vec<usize> = (0..40).filter(|&i| report.long_entries[i]).collect();
    assert_eq!(flagged, vec![30]);
    assert!(report.short_entries.iter().all(|f| !f));

    assert_eq!(report.trades.len(), 1);
    let trade = &report.trades[0];
    let line = report.trend_line[30].unwrap();
    assert_eq!(trade.direction, Direction::Long);
    assert_eq!(trade.entry_index, 30);
    assert_eq!(trade.entry_price, Decimal::try_from(110.0).unwrap());
    assert_eq!(trade.stop_price, Decimal::try_from(line).unwrap());
    assert_eq!(
        trade.target_price,
        Decimal::try_from(110.0 + (110.0 - line) * 1.5).unwrap()
    );
}

#[test]
fn trend_starts_at_first_defined_atr() {
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
    let s = series(&closes, 1.0);

    let report = Pipeline::new(PipelineConfig::default())
        .unwrap()
        .run_with_inputs(&s, &neutral_inputs(20))
        .unwrap();

    assert_eq!(report.trend_line.len(), 20);
    assert!(report.trend_line[..9].iter().all(Option::is_none));
    assert!(report.trend_line[9..].iter().all(Option::is_some));
}

/// Inputs that confirm every trend-line crossing except one on the last
/// bar: prior-bar momentum past the threshold and a MACD cross on the
/// same bar.
fn confirm_crossings(closes: &[f64], trend_line: &[Option<f64>]) -> OscillatorInputs {
    let n = closes.len();
    let mut inputs = neutral_inputs(n);
    for i in 1..n - 1 {
        let (Some(prev), Some(line)) = (trend_line[i - 1], trend_line[i]) else {
            continue;
        };
        let (momentum, macd) = if closes[i] > line && closes[i - 1] <= prev {
            (25.0, 1.0)
        } else if closes[i] < line && closes[i - 1] >= prev {
            (75.0, -1.0)
        } else {
            continue;
        };
        inputs.momentum[i - 1] = Some(momentum);
        inputs.macd[i] = Some(MacdOutput { macd, signal: 0.0 });
    }
    inputs
}

/// 386 hourly bars swinging both ways, replayed over the last 7 days.
/// The final short entry (bar 381) is still open when the data ends.
fn swinging_run() -> (Pipeline, BarSeries, OscillatorInputs) {
    let closes: Vec<f64> = (0..386)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.09).sin() * 12.0 + (t * 0.7).sin() * 2.0
        })
        .collect();
    let s = series(&closes, 1.2);
    let pipeline = Pipeline::new(PipelineConfig {
        window_days: 7,
        ..Default::default()
    })
    .unwrap();

    let trend_line = pipeline
        .run_with_inputs(&s, &neutral_inputs(closes.len()))
        .unwrap()
        .trend_line;
    let inputs = confirm_crossings(&closes, &trend_line);
    (pipeline, s, inputs)
}

#[test]
fn repeated_runs_are_identical() {
    let (pipeline, s, inputs) = swinging_run();

    let first = pipeline.run_with_inputs(&s, &inputs).unwrap();
    let second = pipeline.run_with_inputs(&s, &inputs).unwrap();
    assert!(!first.trades.is_empty());
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn ledger_entries_match_flags_in_window() {
    let (pipeline, s, inputs) = swinging_run();
    let report = pipeline.run_with_inputs(&s, &inputs).unwrap();
    let from = report.window.start_index;

    assert_eq!(from, s.len() - 1 - 7 * 24);
    assert!(report.trades.iter().any(|t| t.direction == Direction::Long));
    assert!(report.trades.iter().any(|t| t.direction == Direction::Short));
    assert!(report
        .trades
        .iter()
        .any(|t| t.exit_reason == ExitReason::EndOfData && t.exit_index == s.len() - 1));
    // Flags before the window never trade
    let early = report.long_entries[..from]
        .iter()
        .chain(&report.short_entries[..from])
        .any(|&f| f);
    assert!(early);

    for direction in [Direction::Long, Direction::Short] {
        let flags = match direction {
            Direction::Long => &report.long_entries,
            Direction::Short => &report.short_entries,
        };
        let trades: Vec<_> = report
            .trades
            .iter()
            .filter(|t| t.direction == direction)
            .collect();

        for trade in &trades {
            assert!(trade.entry_index >= from);
            assert!(trade.exit_index >= trade.entry_index);
            assert!(flags[trade.entry_index], "trade at {} without a flag", trade.entry_index);
        }

        let flagged: Vec<usize> = (from..flags.len()).filter(|&i| flags[i]).collect();
        let skipped = flagged
            .iter()
            .filter(|&&i| trades.iter().any(|t| t.entry_index < i && i < t.exit_index))
            .count();
        assert_eq!(flagged.len() - skipped, trades.len(), "{direction:?} entries lost");
    }

    let pnl: Decimal = report.trades.iter().map(|t| t.pnl).sum();
    let drift = (report.stats.final_equity - report.stats.initial_cash - pnl).abs();
    assert!(drift < dec!(0.000001), "cash and ledger disagree by {drift}");
}
