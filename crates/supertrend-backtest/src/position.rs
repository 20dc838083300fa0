//! Position slots and finalized trades.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use supertrend_core::types::{Bar, Direction};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Stop,
    Target,
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Stop => write!(f, "stop"),
            ExitReason::Target => write!(f, "target"),
            ExitReason::EndOfData => write!(f, "end-of-data"),
        }
    }
}

/// Result of testing a bracket against one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BracketHit {
    pub reason: ExitReason,
    pub price: Decimal,
    /// Both levels were inside the bar's range
    pub ambiguous: bool,
}

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_index: usize,
    pub entry_timestamp: i64,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub quantity: Decimal,
    pub entry_fee: Decimal,
}

impl Position {
    /// Test the bracket against a bar's range.
    ///
    /// When both levels fall inside the range the stop wins: the bar does
    /// not tell which level traded first, and assuming the stop never
    /// overstates performance.
    pub(crate) fn bracket_hit(&self, high: Decimal, low: Decimal) -> Option<BracketHit> {
        let (stop_hit, target_hit) = match self.direction {
            Direction::Long => (low <= self.stop_price, high >= self.target_price),
            Direction::Short => (high >= self.stop_price, low <= self.target_price),
        };

        if stop_hit {
            Some(BracketHit {
                reason: ExitReason::Stop,
                price: self.stop_price,
                ambiguous: target_hit,
            })
        } else if target_hit {
            Some(BracketHit {
                reason: ExitReason::Target,
                price: self.target_price,
                ambiguous: false,
            })
        } else {
            None
        }
    }

    /// Notional posted at entry.
    pub fn notional(&self) -> Decimal {
        self.quantity * self.entry_price
    }

    /// Cash value of the position at `price`, before exit fees.
    pub fn value_at(&self, price: Decimal) -> Decimal {
        self.notional() + self.direction.sign() * self.quantity * (price - self.entry_price)
    }

    /// Finalize into a ledger entry.
    pub(crate) fn close(
        self,
        bar_index: usize,
        bar: &Bar,
        exit_price: Decimal,
        reason: ExitReason,
        ambiguous: bool,
        fee_rate: Decimal,
    ) -> TradeRecord {
        let exit_fee = self.quantity * exit_price * fee_rate;
        let gross = self.direction.sign() * self.quantity * (exit_price - self.entry_price);
        let pnl = gross - self.entry_fee - exit_fee;
        let invested = self.notional() + self.entry_fee;
        let return_pct = if invested > Decimal::ZERO {
            pnl / invested * dec!(100)
        } else {
            Decimal::ZERO
        };

        TradeRecord {
            direction: self.direction,
            entry_index: self.entry_index,
            entry_timestamp: self.entry_timestamp,
            entry_price: self.entry_price,
            exit_index: bar_index,
            exit_timestamp: bar.timestamp,
            exit_price,
            stop_price: self.stop_price,
            target_price: self.target_price,
            quantity: self.quantity,
            entry_fee: self.entry_fee,
            exit_fee,
            pnl,
            return_pct,
            exit_reason: reason,
            bracket_ambiguous: ambiguous,
        }
    }
}

/// One direction's position slot: flat, or holding one position.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionSlot {
    #[default]
    Flat,
    Open(Position),
}

impl PositionSlot {
    /// True while a position is held.
    pub fn is_open(&self) -> bool {
        matches!(self, PositionSlot::Open(_))
    }

    /// Borrow the held position.
    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionSlot::Open(pos) => Some(pos),
            PositionSlot::Flat => None,
        }
    }

    /// Leave the slot flat and return what it held.
    pub fn take(&mut self) -> Option<Position> {
        match std::mem::take(self) {
            PositionSlot::Open(pos) => Some(pos),
            PositionSlot::Flat => None,
        }
    }
}

/// Finalized trade in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: Direction,
    pub entry_index: usize,
    pub entry_timestamp: i64,
    pub entry_price: Decimal,
    pub exit_index: usize,
    pub exit_timestamp: i64,
    pub exit_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub quantity: Decimal,
    pub entry_fee: Decimal,
    pub exit_fee: Decimal,
    /// Realized profit/loss net of both fees
    pub pnl: Decimal,
    /// `pnl` relative to the capital committed at entry, in percent
    pub return_pct: Decimal,
    pub exit_reason: ExitReason,
    /// Stop and target were both inside the exit bar's range
    pub bracket_ambiguous: bool,
}
