//! Backtest report generation.

use std::io;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use supertrend_core::types::{BarSeries, Timeframe};
use supertrend_signals::SignalSeries;

use crate::engine::BacktestResult;
use crate::pipeline::PipelineConfig;
use crate::position::TradeRecord;
use crate::statistics::PortfolioStats;

/// Message shown when the simulation ran but opened nothing.
pub const NO_TRADES_MESSAGE: &str = "No trades triggered in the analysis window.";

/// Bars replayed by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start_index: usize,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub bars: usize,
}

/// Complete backtest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Configuration used
    pub config: PipelineConfig,
    pub window: ReportWindow,
    /// Trend line over the whole series, `None` during warm-up
    pub trend_line: Vec<Option<f64>>,
    pub long_entries: Vec<bool>,
    pub short_entries: Vec<bool>,
    /// Ledger in exit order
    pub trades: Vec<TradeRecord>,
    /// Statistics
    pub stats: PortfolioStats,
}

impl BacktestReport {
    pub(crate) fn new(
        series: &BarSeries,
        config: PipelineConfig,
        trend_line: Vec<Option<f64>>,
        signals: &SignalSeries,
        result: BacktestResult,
    ) -> Self {
        let bars = series.bars();
        let start_index = result.window_start;
        let window = ReportWindow {
            start_index,
            start_timestamp: bars.get(start_index).map_or(0, |b| b.timestamp),
            end_timestamp: bars.last().map_or(0, |b| b.timestamp),
            bars: bars.len().saturating_sub(start_index),
        };

        Self {
            symbol: series.symbol.clone(),
            timeframe: series.timeframe,
            config,
            window,
            trend_line,
            long_entries: signals.long_entries(),
            short_entries: signals.short_entries(),
            trades: result.trades,
            stats: result.stats,
        }
    }

    /// Trades sorted by entry time, oldest first. The ledger itself is in
    /// exit order.
    pub fn trades_by_entry(&self) -> Vec<&TradeRecord> {
        let mut trades: Vec<&TradeRecord> = self.trades.iter().collect();
        trades.sort_by_key(|t| (t.entry_timestamp, t.exit_timestamp));
        trades
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let stats = &self.stats;

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                 SUPERTREND BACKTEST REPORT                 \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str(&format!(
            "  {} ({})  {} -> {}  [{} bars]\n",
            self.symbol,
            self.timeframe,
            format_time(self.window.start_timestamp),
            format_time(self.window.end_timestamp),
            self.window.bars
        ));
        s.push_str(&format!(
            "  ATR {} x {:.2}   R/R {:.2}   fee {}\n\n",
            self.config.bands.period,
            self.config.bands.multiplier,
            self.config.signals.risk_reward,
            self.config.backtest.fee_rate
        ));

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Cash:        ${:.2}\n", stats.initial_cash));
        s.push_str(&format!("  Final Equity:        ${:.2}\n", stats.final_equity));
        s.push_str(&format!(
            "  Total Return:        ${:.2} ({:.2}%)\n",
            stats.total_return, stats.total_return_pct
        ));
        s.push_str(&format!("  Max Drawdown:        {:.2}%\n", stats.max_drawdown_pct));
        s.push_str(&format!(
            "  Profit Factor:       {}\n",
            format_opt(stats.profit_factor, "")
        ));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Total Trades:        {} ({} long, {} short)\n",
            stats.total_trades, stats.long_trades, stats.short_trades
        ));
        s.push_str(&format!("  Winning Trades:      {}\n", stats.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", stats.losing_trades));
        s.push_str(&format!("  Breakeven Trades:    {}\n", stats.breakeven_trades));
        s.push_str(&format!(
            "  Win Rate:            {}\n",
            format_opt(stats.win_rate_pct, "%")
        ));
        s.push_str(&format!("  Avg Win:             {}\n", format_money(stats.avg_win)));
        s.push_str(&format!("  Avg Loss:            {}\n", format_money(stats.avg_loss)));
        if stats.ambiguous_exits > 0 {
            s.push_str(&format!(
                "  Ambiguous Exits:     {} (stop assumed)\n",
                stats.ambiguous_exits
            ));
        }
        s.push('\n');

        s.push_str("TRADES\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&self.trade_table());
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Ledger as a text table, oldest entry first.
    pub fn trade_table(&self) -> String {
        if self.trades.is_empty() {
            return format!("  {NO_TRADES_MESSAGE}\n");
        }

        let mut s = format!(
            "  {:<16}  {:<16}  {:<5}  {:<11}  {:>12}  {:>8}\n",
            "Entry", "Exit", "Side", "Reason", "PnL", "Return"
        );
        for t in self.trades_by_entry() {
            s.push_str(&format!(
                "  {:<16}  {:<16}  {:<5}  {:<11}  {:>12.2}  {:>7.2}%\n",
                format_time(t.entry_timestamp),
                format_time(t.exit_timestamp),
                t.direction.to_string(),
                t.exit_reason.to_string(),
                t.pnl,
                t.return_pct
            ));
        }
        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the ledger as CSV, one row per trade in exit order.
    pub fn write_trades_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for trade in &self.trades {
            wtr.serialize(trade)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the equity curve as CSV.
    pub fn write_equity_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["timestamp", "equity"])?;
        for (ts, equity) in &self.stats.equity_curve {
            wtr.write_record([ts.to_string(), equity.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn format_time(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn format_opt(value: Option<Decimal>, suffix: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}{suffix}"))
}

fn format_money(value: Option<Decimal>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("${v:.2}"))
}
