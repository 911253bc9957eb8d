//! Strategy layer: pattern detectors and their betting progressions.
//!
//! Three detector families share one capability set (`Strategy`):
//! - `sequence`: even-money runs (colour, parity, height), bet the opposite.
//! - `delay`: dozens/columns absent for too long, bet they return.
//! - `cold`: single numbers absent for too long, bet they return.
//!
//! Every open bet runs the same martingale progression (`Progression`),
//! settled by `settle_open_bet`. Strategies never touch the bankroll:
//! they report `Settlement`s and the engine applies them.

pub mod cold;
pub mod delay;
pub mod sequence;

use rust_decimal::Decimal;
use std::fmt;
use tracing::warn;

use crate::config::EngineConfig;
use crate::types::{
    BetTarget, RouletteNumber, Settlement, SettlementOutcome, Signal, StrategyId,
};
use cold::{ColdNumberStrategy, PocketTracker};
use delay::DozenColumnStrategy;
use sequence::SimpleSequenceStrategy;

// ---------------------------------------------------------------------------
// Capability set
// ---------------------------------------------------------------------------

/// What the engine needs from a detector. Per spin the engine calls
/// `settle` on every strategy first, then `observe` + `arm` on every
/// strategy; during warmup it only calls `observe`.
///
/// The per-pocket delay table belongs to the engine and is handed to
/// `arm` already updated with the current spin.
pub trait Strategy: Send + fmt::Debug {
    fn id(&self) -> StrategyId;

    /// Settle open bets against the spin that just fell.
    fn settle(&mut self, number: &RouletteNumber) -> Vec<Settlement>;

    /// Record the spin in history / delay tables. Never bets.
    fn observe(&mut self, number: &RouletteNumber);

    /// Open new bets for the next spin; returns only the newly armed ones.
    fn arm(&mut self, pockets: &PocketTracker) -> Vec<Signal>;

    /// Every open bet, as the instruction for the next spin.
    fn open_signals(&self) -> Vec<Signal>;

    /// Drop all history and open bets.
    fn reset(&mut self);
}

/// Build the detector behind a strategy id.
pub fn build(id: StrategyId, config: &EngineConfig) -> Box<dyn Strategy> {
    match id {
        StrategyId::Color | StrategyId::EvenOdd | StrategyId::HighLow => {
            Box::new(SimpleSequenceStrategy::new(id, config))
        }
        StrategyId::Dozen | StrategyId::Column => Box::new(DozenColumnStrategy::new(id, config)),
        StrategyId::ColdNumber => Box::new(ColdNumberStrategy::new(config)),
    }
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Martingale stake schedule: `initial_bet * factor^losses`, dropped once
/// `max_losses` consecutive losses have been taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    initial_bet: Decimal,
    factor: Decimal,
    max_losses: u32,
}

impl Progression {
    pub fn new(initial_bet: Decimal, factor: Decimal, max_losses: u32) -> Self {
        Self { initial_bet, factor, max_losses }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.initial_bet,
            config.martingale_factor,
            config.max_consecutive_losses,
        )
    }

    pub fn initial_bet(&self) -> Decimal {
        self.initial_bet
    }

    /// Stake after `losses` consecutive losses, `None` once it no longer fits
    /// in a `Decimal`.
    pub fn stake_after(&self, losses: u32) -> Option<Decimal> {
        (0..losses).try_fold(self.initial_bet, |stake, _| stake.checked_mul(self.factor))
    }

    /// The stake on the last step before the progression is dropped.
    pub fn max_stake(&self) -> Option<Decimal> {
        self.stake_after(self.max_losses.saturating_sub(1))
    }

    pub fn is_exhausted(&self, losses: u32) -> bool {
        losses >= self.max_losses
    }
}

// ---------------------------------------------------------------------------
// Open bets
// ---------------------------------------------------------------------------

/// A bet that stays on the layout until it wins or its progression runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenBet {
    pub target: BetTarget,
    pub amount: Decimal,
    pub losses: u32,
    pub strength: u32,
}

impl OpenBet {
    /// A fresh bet at the base stake.
    pub fn arm(target: BetTarget, progression: &Progression, strength: u32) -> Self {
        Self {
            target,
            amount: progression.initial_bet(),
            losses: 0,
            strength,
        }
    }

    pub fn to_signal(&self, strategy: StrategyId) -> Signal {
        Signal {
            strategy,
            target: self.target,
            amount: self.amount,
            losses: self.losses,
            strength: self.strength,
        }
    }
}

/// Settle one open bet against a spin.
///
/// Returns the settlement and the bet as it stands afterwards: `None` once
/// it has won or been abandoned, `Some` while the progression continues.
pub fn settle_open_bet(
    strategy: StrategyId,
    bet: OpenBet,
    number: &RouletteNumber,
    progression: &Progression,
    la_partage_enabled: bool,
) -> (Settlement, Option<OpenBet>) {
    let settlement = |outcome, amount| Settlement {
        strategy,
        target: bet.target,
        stake: bet.amount,
        outcome,
        amount,
    };

    if bet.target.wins(number) {
        // The engine checks the bank can absorb every payout before settling.
        let winnings = bet
            .amount
            .saturating_mul(Decimal::from(bet.target.payout_multiplier()));
        return (settlement(SettlementOutcome::Win, winnings), None);
    }

    if number.is_green() && la_partage_enabled && bet.target.is_even_money() {
        let half = bet.amount / Decimal::from(2);
        return (settlement(SettlementOutcome::LaPartage, half), Some(bet));
    }

    let losses = bet.losses + 1;
    let amount = match progression.stake_after(losses) {
        Some(amount) if !progression.is_exhausted(losses) => amount,
        _ => {
            warn!(
                strategy = %strategy,
                target = %bet.target,
                losses,
                "Loss limit reached, progression abandoned"
            );
            return (settlement(SettlementOutcome::Abandoned, bet.amount), None);
        }
    };

    let lost = bet.amount;
    let next = OpenBet {
        amount,
        losses,
        ..bet
    };
    (settlement(SettlementOutcome::Loss, lost), Some(next))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
