//! Dozen / column delay detector (DUZIA, COLUNA).
//!
//! Keeps, per group member, the number of spins since it last appeared.
//! New bets are only opened while the whole group is idle: every member
//! absent for `min_sequence_dozen` spins or more at that point gets its
//! own bet, and each of those runs an independent progression until it
//! wins or is abandoned.

use tracing::debug;

use crate::config::EngineConfig;
use crate::strategy::cold::PocketTracker;
use crate::strategy::{settle_open_bet, OpenBet, Progression, Strategy};
use crate::types::{
    BetTarget, Column, Dozen, RouletteNumber, Settlement, SettlementOutcome, Signal, StrategyId,
};

#[derive(Debug)]
pub struct DozenColumnStrategy {
    id: StrategyId,
    progression: Progression,
    min_delay: u32,
    delays: [u32; 3],
    open_bets: [Option<OpenBet>; 3],
    /// Targets abandoned on the current spin; skipped by the next `arm`.
    cooldown: [bool; 3],
}

impl DozenColumnStrategy {
    pub fn new(id: StrategyId, config: &EngineConfig) -> Self {
        debug_assert!(matches!(id, StrategyId::Dozen | StrategyId::Column));
        Self {
            id,
            progression: Progression::from_config(config),
            min_delay: config.min_sequence_dozen,
            delays: [0; 3],
            open_bets: [None, None, None],
            cooldown: [false; 3],
        }
    }

    /// Slot of the member a spin landed in, `None` on green.
    fn slot(&self, number: &RouletteNumber) -> Option<usize> {
        match self.id {
            StrategyId::Dozen => number.dozen.map(|d| d as usize),
            _ => number.column.map(|c| c as usize),
        }
    }

    fn target(&self, slot: usize) -> BetTarget {
        match self.id {
            StrategyId::Dozen => BetTarget::Dozen(Dozen::ALL[slot]),
            _ => BetTarget::Column(Column::ALL[slot]),
        }
    }

    /// Spins since each member (D1..D3 or C1..C3) last appeared.
    pub fn delays(&self) -> [u32; 3] {
        self.delays
    }
}

impl Strategy for DozenColumnStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn settle(&mut self, number: &RouletteNumber) -> Vec<Settlement> {
        let mut settlements = Vec::new();
        for slot in 0..3 {
            let Some(bet) = self.open_bets[slot].take() else {
                continue;
            };
            // La Partage never applies here; even-money bets only.
            let (settlement, next) =
                settle_open_bet(self.id, bet, number, &self.progression, false);
            if settlement.outcome == SettlementOutcome::Abandoned {
                self.cooldown[slot] = true;
            }
            self.open_bets[slot] = next;
            settlements.push(settlement);
        }
        settlements
    }

    fn observe(&mut self, number: &RouletteNumber) {
        let hit = self.slot(number);
        for (slot, delay) in self.delays.iter_mut().enumerate() {
            if hit == Some(slot) {
                *delay = 0;
            } else {
                *delay += 1;
            }
        }
    }

    fn arm(&mut self, _pockets: &PocketTracker) -> Vec<Signal> {
        let cooldown = std::mem::take(&mut self.cooldown);
        if self.open_bets.iter().any(Option::is_some) {
            return Vec::new();
        }

        let mut armed = Vec::new();
        for slot in 0..3 {
            if cooldown[slot] || self.delays[slot] < self.min_delay {
                continue;
            }
            let bet = OpenBet::arm(self.target(slot), &self.progression, self.delays[slot]);
            debug!(
                strategy = %self.id,
                target = %bet.target,
                delay = self.delays[slot],
                "Delay threshold reached, arming"
            );
            armed.push(bet.to_signal(self.id));
            self.open_bets[slot] = Some(bet);
        }
        armed
    }

    fn open_signals(&self) -> Vec<Signal> {
        self.open_bets
            .iter()
            .flatten()
            .map(|bet| bet.to_signal(self.id))
            .collect()
    }

    fn reset(&mut self) {
        self.delays = [0; 3];
        self.open_bets = [None, None, None];
        self.cooldown = [false; 3];
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
