//! Replay engine.
//!
//! Runs a recorded sequence of spins through a fresh `Engine` and reports
//! how the selected strategies would have done: final bankroll, ROI, peak,
//! max drawdown, settlement counts and per-strategy net result.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::types::{EngineError, SettlementOutcome, StrategyId, WARMUP_SPINS};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Split a recorded spin log into tokens. Accepts whitespace, commas or
/// semicolons between numbers; `#` starts a comment to end of line.
pub fn parse_tokens(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || c == ',' || c == ';'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub initial_bankroll: Decimal,
    pub final_bankroll: Decimal,
    pub profit_loss: Decimal,
    pub roi: Decimal,
    pub peak_bankroll: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    /// Live spins only; warmup excluded.
    pub total_spins: usize,
    pub signals_armed: usize,
    pub wins: usize,
    pub losses: usize,
    pub la_partage: usize,
    pub abandoned: usize,
    /// Net balance change per strategy.
    pub per_strategy: BTreeMap<StrategyId, Decimal>,
    /// Balance after each live spin.
    pub balance_history: Vec<Decimal>,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Spins:         {}", self.total_spins)?;
        writeln!(
            f,
            "Bankroll:      {:.2} -> {:.2} ({:+.2}, ROI {:.2}%)",
            self.initial_bankroll,
            self.final_bankroll,
            self.profit_loss,
            self.roi.saturating_mul(dec!(100))
        )?;
        writeln!(
            f,
            "Peak:          {:.2}, max drawdown {:.2} ({:.1}%)",
            self.peak_bankroll, self.max_drawdown, self.max_drawdown_pct
        )?;
        writeln!(
            f,
            "Signals:       {} armed, {} won, {} lost, {} la partage, {} abandoned",
            self.signals_armed, self.wins, self.losses, self.la_partage, self.abandoned
        )?;
        for (strategy, net) in &self.per_strategy {
            writeln!(f, "  {strategy:<11} {net:+.2}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

pub struct Replay {
    config: EngineConfig,
    bankroll: Decimal,
    strategies: Vec<StrategyId>,
}

impl Replay {
    pub fn new(config: EngineConfig, bankroll: Decimal, strategies: Vec<StrategyId>) -> Self {
        Self {
            config,
            bankroll,
            strategies,
        }
    }

    /// Replay `tokens`, a log in the order the spins fell: the first
    /// `WARMUP_SPINS` seed the session, the rest are played live. Any
    /// rejected token aborts the run.
    pub fn run<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ReplayReport, EngineError> {
        let mut engine = Engine::new(self.config.clone());
        engine.initialize(self.bankroll, &self.strategies)?;

        let split = tokens.len().min(WARMUP_SPINS);
        let (warmup, live) = tokens.split_at(split);
        // Warmup takes the board order, newest first.
        let board: Vec<&str> = warmup.iter().rev().map(|t| t.as_ref()).collect();
        engine.warmup(&board)?;

        let mut report = ReplayReport {
            initial_bankroll: self.bankroll,
            final_bankroll: self.bankroll,
            profit_loss: Decimal::ZERO,
            roi: Decimal::ZERO,
            peak_bankroll: self.bankroll,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: 0.0,
            total_spins: 0,
            signals_armed: 0,
            wins: 0,
            losses: 0,
            la_partage: 0,
            abandoned: 0,
            per_strategy: self.strategies.iter().map(|s| (*s, Decimal::ZERO)).collect(),
            balance_history: Vec::with_capacity(live.len()),
        };

        for token in live {
            let outcome = engine.step(token.as_ref())?;
            report.total_spins += 1;
            report.signals_armed += outcome.armed.len();

            for settlement in &outcome.settlements {
                match settlement.outcome {
                    SettlementOutcome::Win => report.wins += 1,
                    SettlementOutcome::Loss => report.losses += 1,
                    SettlementOutcome::LaPartage => report.la_partage += 1,
                    SettlementOutcome::Abandoned => report.abandoned += 1,
                }
                let net = report.per_strategy.entry(settlement.strategy).or_default();
                *net = net
                    .checked_add(settlement.net())
                    .ok_or(EngineError::AmountOverflow("strategy net"))?;
            }

            let balance = outcome.balance;
            report.balance_history.push(balance);

            // Peak and drawdown
            if balance > report.peak_bankroll {
                report.peak_bankroll = balance;
            }
            let dd = report.peak_bankroll - balance;
            if dd > report.max_drawdown {
                report.max_drawdown = dd;
                report.max_drawdown_pct = dd
                    .checked_div(report.peak_bankroll)
                    .and_then(|ratio| ratio.checked_mul(dec!(100)))
                    .and_then(|pct| pct.to_f64())
                    .unwrap_or(0.0);
            }
        }

        let bank = engine.stats().bank;
        report.final_bankroll = bank.current_balance;
        report.profit_loss = bank.profit_loss;
        report.roi = bank.roi;

        info!(
            spins = report.total_spins,
            final_bankroll = %report.final_bankroll,
            profit_loss = %report.profit_loss,
            max_drawdown = %report.max_drawdown,
            "Replay complete"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
