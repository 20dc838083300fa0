//! Parameter sweep command implementation.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use supertrend_backtest::{BacktestReport, Pipeline};
use supertrend_config::AppConfig;
use supertrend_core::traits::Validate;
use tokio::task::JoinSet;
use tracing::info;

use super::load_series;
use crate::cli::{OutputFormat, SweepArgs};

/// One combination's outcome.
#[derive(Debug, Clone, Serialize)]
struct SweepRow {
    multiplier: f64,
    risk_reward: f64,
    trades: usize,
    win_rate_pct: Option<Decimal>,
    profit_factor: Option<Decimal>,
    total_return: Decimal,
    total_return_pct: Decimal,
    max_drawdown_pct: Decimal,
}

impl SweepRow {
    fn new(multiplier: f64, risk_reward: f64, report: &BacktestReport) -> Self {
        let stats = &report.stats;
        Self {
            multiplier,
            risk_reward,
            trades: stats.total_trades,
            win_rate_pct: stats.win_rate_pct,
            profit_factor: stats.profit_factor,
            total_return: stats.total_return,
            total_return_pct: stats.total_return_pct,
            max_drawdown_pct: stats.max_drawdown_pct,
        }
    }
}

pub async fn run(args: SweepArgs, mut config: AppConfig) -> Result<()> {
    args.strategy.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    if args.multipliers.is_empty() || args.risk_rewards.is_empty() {
        bail!("The sweep grid is empty");
    }

    let series = Arc::new(load_series(&args.data, &config.app).await?);
    let base = config.pipeline_config();

    // Each combination is an independent run; the recurrence inside one run
    // stays sequential.
    let mut tasks = JoinSet::new();
    for &multiplier in &args.multipliers {
        for &risk_reward in &args.risk_rewards {
            let mut params = base.clone();
            params.bands.multiplier = multiplier;
            params.signals.risk_reward = risk_reward;
            let pipeline = Pipeline::new(params).with_context(|| {
                format!("Invalid combination multiplier={multiplier} risk_reward={risk_reward}")
            })?;

            let series = Arc::clone(&series);
            tasks.spawn_blocking(move || {
                pipeline
                    .run(&series)
                    .map(|report| SweepRow::new(multiplier, risk_reward, &report))
            });
        }
    }
    info!(runs = tasks.len(), symbol = %series.symbol, "Starting sweep");

    let mut rows = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let row = joined.context("Sweep task failed")??;
        rows.push(row);
    }

    rows.sort_by(|a, b| {
        b.total_return
            .cmp(&a.total_return)
            .then(a.multiplier.total_cmp(&b.multiplier))
            .then(a.risk_reward.total_cmp(&b.risk_reward))
    });
    if let Some(top) = args.top {
        rows.truncate(top);
    }

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => print!("{}", table(&rows)),
    }
    Ok(())
}

fn table(rows: &[SweepRow]) -> String {
    let na = || "n/a".to_string();
    let mut s = format!(
        "{:>6}  {:>5}  {:>6}  {:>8}  {:>7}  {:>12}  {:>9}  {:>8}\n",
        "mult", "r/r", "trades", "win %", "pf", "return", "return %", "max dd %"
    );
    for r in rows {
        s.push_str(&format!(
            "{:>6.2}  {:>5.2}  {:>6}  {:>8}  {:>7}  {:>12.2}  {:>9.2}  {:>8.2}\n",
            r.multiplier,
            r.risk_reward,
            r.trades,
            r.win_rate_pct.map_or_else(na, |v| format!("{v:.2}")),
            r.profit_factor.map_or_else(na, |v| format!("{v:.2}")),
            r.total_return,
            r.total_return_pct,
            r.max_drawdown_pct
        ));
    }
    s
}
