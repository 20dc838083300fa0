//! Portfolio statistics.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use supertrend_core::types::Direction;

use crate::position::TradeRecord;

/// Aggregates over one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    /// Starting cash
    pub initial_cash: Decimal,
    /// Cash after every position is closed
    pub final_equity: Decimal,
    /// Final equity minus starting cash
    pub total_return: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Maximum peak-to-trough decline of the equity curve, in percent
    pub max_drawdown_pct: Decimal,
    /// Total number of trades
    pub total_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    /// Number of winning trades
    pub winning_trades: usize,
    /// Number of losing trades
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Winning trades over all trades; `None` without trades
    pub win_rate_pct: Option<Decimal>,
    /// Gross profit over gross loss; `None` without a losing trade
    pub profit_factor: Option<Decimal>,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    /// Average profit per winning trade
    pub avg_win: Option<Decimal>,
    /// Average loss per losing trade
    pub avg_loss: Option<Decimal>,
    /// Trades whose exit bar spanned both bracket levels
    pub ambiguous_exits: usize,
    /// Number of bars processed
    pub bars_processed: usize,
    /// Equity marked at each replayed bar's close
    pub equity_curve: Vec<(i64, Decimal)>,
    /// Peak equity (for drawdown)
    #[serde(skip)]
    peak_equity: Decimal,
}

impl PortfolioStats {
    /// Create new stats tracker.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            final_equity: initial_cash,
            total_return: Decimal::ZERO,
            total_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            total_trades: 0,
            long_trades: 0,
            short_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            win_rate_pct: None,
            profit_factor: None,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            avg_win: None,
            avg_loss: None,
            ambiguous_exits: 0,
            bars_processed: 0,
            equity_curve: Vec::new(),
            peak_equity: initial_cash,
        }
    }

    /// Record equity at a timestamp.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        self.equity_curve.push((timestamp, equity));

        // Update peak and drawdown
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }

        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    /// Calculate final statistics from the closed ledger.
    pub fn finalize(&mut self, final_equity: Decimal, trades: &[TradeRecord]) {
        self.final_equity = final_equity;
        self.total_return = final_equity - self.initial_cash;
        if self.initial_cash > Decimal::ZERO {
            self.total_return_pct = self.total_return / self.initial_cash * dec!(100);
        }

        self.total_trades = trades.len();
        for trade in trades {
            match trade.direction {
                Direction::Long => self.long_trades += 1,
                Direction::Short => self.short_trades += 1,
            }
            if trade.bracket_ambiguous {
                self.ambiguous_exits += 1;
            }

            if trade.pnl > Decimal::ZERO {
                self.winning_trades += 1;
                self.gross_profit += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                self.losing_trades += 1;
                self.gross_loss += trade.pnl.abs();
            } else {
                self.breakeven_trades += 1;
            }
        }

        if self.total_trades > 0 {
            self.win_rate_pct = Some(
                Decimal::from(self.winning_trades * 100) / Decimal::from(self.total_trades),
            );
        }
        if self.winning_trades > 0 {
            self.avg_win = Some(self.gross_profit / Decimal::from(self.winning_trades));
        }
        if self.losing_trades > 0 {
            self.avg_loss = Some(self.gross_loss / Decimal::from(self.losing_trades));
        }
        if self.gross_loss > Decimal::ZERO {
            self.profit_factor = Some(self.gross_profit / self.gross_loss);
        }
    }
}
