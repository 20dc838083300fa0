//! Bar-by-bar bracket simulation.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use supertrend_core::error::{PipelineError, PipelineResult};
use supertrend_core::traits::Validate;
use supertrend_core::types::{Bar, Direction};
use supertrend_signals::SignalSeries;
use tracing::{debug, info, warn};

use crate::position::{ExitReason, Position, PositionSlot, TradeRecord};
use crate::statistics::PortfolioStats;

/// Quantities are truncated to this many decimal places, so a fill never
/// commits more than its budget.
const QUANTITY_DP: u32 = 8;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Starting cash
    pub initial_cash: Decimal,
    /// Proportional fee charged on the notional of every fill
    pub fee_rate: Decimal,
    /// Share of available cash committed to each new position
    pub position_fraction: Decimal,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(10000),
            fee_rate: dec!(0.001),
            position_fraction: dec!(0.5),
        }
    }
}

impl Validate for BacktestConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(PipelineError::invalid_config(
                "initial_cash",
                self.initial_cash,
                "must be positive",
            ));
        }
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err(PipelineError::invalid_config(
                "fee_rate",
                self.fee_rate,
                "must be in [0, 1)",
            ));
        }
        if self.position_fraction <= Decimal::ZERO || self.position_fraction > Decimal::ONE {
            return Err(PipelineError::invalid_config(
                "position_fraction",
                self.position_fraction,
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Ledger and statistics of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// First replayed bar
    pub window_start: usize,
    /// Closed trades ordered by exit bar, long before short on the same bar
    pub trades: Vec<TradeRecord>,
    pub stats: PortfolioStats,
}

/// Backtesting engine.
///
/// Holds at most one long and one short position at a time, each in its
/// own slot. Every replayed bar is handled in a fixed order: bracket exits
/// for open positions, then new entries at the bar's close, then the
/// equity mark. Positions still open after the last bar are closed at its
/// close.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a validated engine.
    pub fn new(config: BacktestConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Replay `bars[from..]` against the signals.
    ///
    /// `signals` must cover the same bars. Signals before `from` are
    /// ignored.
    pub fn run(
        &self,
        bars: &[Bar],
        signals: &SignalSeries,
        from: usize,
    ) -> PipelineResult<BacktestResult> {
        if signals.len() != bars.len() {
            return Err(PipelineError::InvalidInput(format!(
                "signals cover {} bars, bar series has {}",
                signals.len(),
                bars.len()
            )));
        }
        let last = bars.len().checked_sub(1).filter(|&l| from <= l).ok_or(
            PipelineError::InsufficientData {
                required: from + 1,
                available: bars.len(),
            },
        )?;

        let mut cash = self.config.initial_cash;
        let mut long = PositionSlot::Flat;
        let mut short = PositionSlot::Flat;
        let mut trades = Vec::new();
        let mut stats = PortfolioStats::new(self.config.initial_cash);

        for (i, bar) in bars.iter().enumerate().skip(from) {
            let high = to_decimal(bar.high, "high", i)?;
            let low = to_decimal(bar.low, "low", i)?;
            let close = to_decimal(bar.close, "close", i)?;

            // Exits
            for slot in [&mut long, &mut short] {
                let Some(hit) = slot.position().and_then(|p| p.bracket_hit(high, low)) else {
                    continue;
                };
                if let Some(pos) = slot.take() {
                    trades.push(self.settle(&mut cash, pos, i, bar, hit.price, hit.reason, hit.ambiguous));
                }
            }

            // Entries
            if let Some(signal) = signals.get(i) {
                if signal.long_entry && !long.is_open() {
                    if let Some(pos) = self.open(
                        &mut cash,
                        Direction::Long,
                        i,
                        bar,
                        close,
                        signal.long_stop,
                        signal.long_target,
                    )? {
                        long = PositionSlot::Open(pos);
                    }
                }
                if signal.short_entry && !short.is_open() {
                    if let Some(pos) = self.open(
                        &mut cash,
                        Direction::Short,
                        i,
                        bar,
                        close,
                        signal.short_stop,
                        signal.short_target,
                    )? {
                        short = PositionSlot::Open(pos);
                    }
                }
            }

            if i == last {
                for slot in [&mut long, &mut short] {
                    if let Some(pos) = slot.take() {
                        trades.push(self.settle(&mut cash, pos, i, bar, close, ExitReason::EndOfData, false));
                    }
                }
            }

            let equity = cash + mark(&long, close) + mark(&short, close);
            stats.record_equity(bar.timestamp, equity);
        }

        stats.finalize(cash, &trades);
        info!(
            bars = stats.bars_processed,
            trades = trades.len(),
            final_equity = %stats.final_equity.round_dp(2),
            "backtest complete"
        );

        Ok(BacktestResult {
            window_start: from,
            trades,
            stats,
        })
    }

    /// Open a position at `entry`, committing a share of the cash.
    ///
    /// Returns `None` when the bracket does not straddle the entry price or
    /// nothing can be funded.
    #[allow(clippy::too_many_arguments)]
    fn open(
        &self,
        cash: &mut Decimal,
        direction: Direction,
        index: usize,
        bar: &Bar,
        entry: Decimal,
        stop: f64,
        target: f64,
    ) -> PipelineResult<Option<Position>> {
        let stop_price = to_decimal(stop, "stop", index)?;
        let target_price = to_decimal(target, "target", index)?;

        let straddles = match direction {
            Direction::Long => stop_price < entry && entry < target_price,
            Direction::Short => target_price < entry && entry < stop_price,
        };
        if !straddles {
            warn!(
                index,
                %direction,
                entry = %entry,
                stop = %stop_price,
                target = %target_price,
                "bracket does not straddle entry, signal skipped"
            );
            return Ok(None);
        }

        let budget = *cash * self.config.position_fraction;
        if budget <= Decimal::ZERO || entry <= Decimal::ZERO {
            warn!(index, %direction, cash = %cash, "nothing to fund, signal skipped");
            return Ok(None);
        }

        let fee_rate = self.config.fee_rate;
        let quantity = (budget / (entry * (Decimal::ONE + fee_rate)))
            .round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero);
        if quantity <= Decimal::ZERO {
            warn!(index, %direction, cash = %cash, "position rounds to zero, signal skipped");
            return Ok(None);
        }
        let entry_fee = quantity * entry * fee_rate;
        *cash -= quantity * entry + entry_fee;

        debug!(index, %direction, entry = %entry, quantity = %quantity, "position opened");
        Ok(Some(Position {
            direction,
            entry_index: index,
            entry_timestamp: bar.timestamp,
            entry_price: entry,
            stop_price,
            target_price,
            quantity,
            entry_fee,
        }))
    }

    /// Close `pos` at `price` and return its cash to the account.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        cash: &mut Decimal,
        pos: Position,
        index: usize,
        bar: &Bar,
        price: Decimal,
        reason: ExitReason,
        ambiguous: bool,
    ) -> TradeRecord {
        let value = pos.value_at(price);
        let trade = pos.close(index, bar, price, reason, ambiguous, self.config.fee_rate);
        *cash += value - trade.exit_fee;

        if ambiguous {
            debug!(
                index,
                direction = %trade.direction,
                "stop and target both inside bar range, assumed stop"
            );
        }
        debug!(
            direction = %trade.direction,
            entry = trade.entry_index,
            exit = index,
            reason = %reason,
            pnl = %trade.pnl,
            "position closed"
        );
        trade
    }
}

fn mark(slot: &PositionSlot, price: Decimal) -> Decimal {
    slot.position().map_or(Decimal::ZERO, |p| p.value_at(price))
}

fn to_decimal(value: f64, what: &str, index: usize) -> PipelineResult<Decimal> {
    Decimal::try_from(value).map_err(|e| {
        PipelineError::InvalidInput(format!("{what} at bar {index} ({value}) is not a decimal: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use supertrend_signals::Signal;

    const DAY: i64 = 86_400_000;

    fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar::new(i as i64 * DAY, price, price, price, price))
            .collect()
    }

    fn quiet() -> Signal {
        Signal {
            long_entry: false,
            short_entry: false,
            long_stop: 0.0,
            long_target: 0.0,
            short_stop: 0.0,
            short_target: 0.0,
        }
    }

    fn long_at(stop: f64, target: f64) -> Signal {
        Signal {
            long_entry: true,
            long_stop: stop,
            long_target: target,
            ..quiet()
        }
    }

    fn short_at(stop: f64, target: f64) -> Signal {
        Signal {
            short_entry: true,
            short_stop: stop,
            short_target: target,
            ..quiet()
        }
    }

    /// Signals from bar 0 with the given entries.
    fn signals(n: usize, entries: &[(usize, Signal)]) -> SignalSeries {
        let mut all = vec![quiet(); n];
        for (i, s) in entries {
            all[*i] = *s;
        }
        SignalSeries::new(0, all).unwrap()
    }

    fn engine() -> BacktestEngine {
        BacktestEngine::new(BacktestConfig::default()).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(BacktestConfig::default().validate().is_ok());

        let bad_fee = BacktestConfig {
            fee_rate: dec!(1),
            ..Default::default()
        };
        assert!(BacktestEngine::new(bad_fee).is_err());

        let bad_fraction = BacktestConfig {
            position_fraction: Decimal::ZERO,
            ..Default::default()
        };
        assert!(bad_fraction.validate().is_err());
    }

    #[test]
    fn test_no_signals_keeps_cash() {
        let bars = flat_bars(10, 100.0);
        let result = engine().run(&bars, &signals(10, &[]), 0).unwrap();

        assert!(result.trades.is_empty());
        assert_eq!(result.stats.final_equity, dec!(10000));
        assert_eq!(result.stats.total_return, Decimal::ZERO);
        assert_eq!(result.stats.win_rate_pct, None);
        assert_eq!(result.stats.profit_factor, None);
        assert_eq!(result.stats.equity_curve.len(), 10);
    }

    #[test]
    fn test_flat_market_loses_exactly_the_fees() {
        let bars = flat_bars(6, 100.0);
        let sigs = signals(6, &[(1, long_at(95.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 0).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
        assert_eq!(trade.exit_index, 5);
        assert_eq!(trade.pnl, -(trade.entry_fee + trade.exit_fee));
        assert!(trade.pnl < Decimal::ZERO);
        assert_eq!(result.stats.final_equity, dec!(10000) + trade.pnl);
        assert_eq!(result.stats.profit_factor, Some(Decimal::ZERO));
    }

    #[test]
    fn test_target_exit_at_target_price() {
        let mut bars = flat_bars(5, 100.0);
        bars[3] = Bar::new(3 * DAY, 100.0, 112.0, 99.0, 108.0);
        let sigs = signals(5, &[(1, long_at(95.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 0).unwrap();

        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Target);
        assert_eq!(trade.exit_price, dec!(110));
        assert_eq!(trade.exit_index, 3);
        assert!(trade.pnl > Decimal::ZERO);
        assert_eq!(result.stats.profit_factor, None);
        assert_eq!(result.stats.win_rate_pct, Some(dec!(100)));
    }

    #[test]
    fn test_stop_wins_when_bar_spans_both_levels() {
        let mut bars = flat_bars(5, 100.0);
        bars[2] = Bar::new(2 * DAY, 100.0, 115.0, 90.0, 100.0);
        let sigs = signals(5, &[(1, long_at(95.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 0).unwrap();

        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Stop);
        assert_eq!(trade.exit_price, dec!(95));
        assert!(trade.bracket_ambiguous);
    }

    #[test]
    fn test_entry_bar_range_is_not_tested() {
        // The entry bar itself dips below the stop; the position survives it
        let mut bars = flat_bars(4, 100.0);
        bars[1] = Bar::new(DAY, 100.0, 101.0, 90.0, 100.0);
        let sigs = signals(4, &[(1, long_at(95.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 0).unwrap();

        assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfData);
    }

    #[test]
    fn test_long_and_short_held_concurrently() {
        let mut bars = flat_bars(6, 100.0);
        bars[3] = Bar::new(3 * DAY, 100.0, 100.0, 93.0, 94.0);
        let sigs = signals(
            6,
            &[(1, long_at(95.0, 110.0)), (2, short_at(105.0, 94.0))],
        );
        let result = engine().run(&bars, &sigs, 0).unwrap();

        // Bar 3 stops the long and takes the short's profit
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].direction, Direction::Long);
        assert_eq!(result.trades[0].exit_reason, ExitReason::Stop);
        assert_eq!(result.trades[1].direction, Direction::Short);
        assert_eq!(result.trades[1].exit_reason, ExitReason::Target);
        assert_eq!(result.trades[1].exit_price, dec!(94));
        assert!(result.trades[1].pnl > Decimal::ZERO);

        let pnl: Decimal = result.trades.iter().map(|t| t.pnl).sum();
        assert_eq!(result.stats.final_equity, dec!(10000) + pnl);
    }

    #[test]
    fn test_repeat_signal_ignored_while_open() {
        let bars = flat_bars(6, 100.0);
        let sigs = signals(
            6,
            &[(1, long_at(95.0, 110.0)), (2, long_at(96.0, 108.0))],
        );
        let result = engine().run(&bars, &sigs, 0).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_index, 1);
        assert_eq!(result.trades[0].stop_price, dec!(95));
    }

    #[test]
    fn test_every_entry_reaches_the_ledger() {
        let mut bars = flat_bars(8, 100.0);
        bars[2] = Bar::new(2 * DAY, 100.0, 100.0, 94.0, 96.0);
        let sigs = signals(
            8,
            &[
                (1, long_at(95.0, 110.0)),
                (2, long_at(90.0, 108.0)),
                (5, short_at(104.0, 97.0)),
            ],
        );
        let result = engine().run(&bars, &sigs, 0).unwrap();

        // Bar 2 stops the first long and reopens the slot at its close
        let entries: Vec<usize> = result.trades.iter().map(|t| t.entry_index).collect();
        assert_eq!(entries, vec![1, 2, 5]);
        assert!(result.trades.iter().all(|t| t.exit_index >= t.entry_index));
        assert_eq!(result.trades[1].entry_price, dec!(96));
    }

    #[test]
    fn test_window_ignores_earlier_signals() {
        let bars = flat_bars(10, 100.0);
        let sigs = signals(10, &[(2, long_at(95.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 4).unwrap();

        assert!(result.trades.is_empty());
        assert_eq!(result.window_start, 4);
        assert_eq!(result.stats.equity_curve.len(), 6);
    }

    #[test]
    fn test_entry_on_last_bar_is_closed_immediately() {
        let bars = flat_bars(4, 100.0);
        let sigs = signals(4, &[(3, long_at(95.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 0).unwrap();

        let trade = &result.trades[0];
        assert_eq!((trade.entry_index, trade.exit_index), (3, 3));
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    }

    #[test]
    fn test_bracket_on_wrong_side_skipped() {
        let bars = flat_bars(4, 100.0);
        let sigs = signals(4, &[(1, long_at(101.0, 110.0))]);
        let result = engine().run(&bars, &sigs, 0).unwrap();
        assert!(result.trades.is_empty());
    }

    #[test]
    fn test_mismatched_lengths_and_empty_window() {
        let bars = flat_bars(4, 100.0);
        assert!(matches!(
            engine().run(&bars, &signals(5, &[]), 0),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            engine().run(&bars, &signals(4, &[]), 4),
            Err(PipelineError::InsufficientData { .. })
        ));
    }
}
