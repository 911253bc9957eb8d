//! Cold-number detector (FRIO) and the per-pocket delay table.
//!
//! `PocketTracker` keeps, for every pocket on the wheel, the spins since it
//! last fell plus a rolling window of recent results. The engine owns the
//! one tracker of a session: the hot/cold display reads it, and the
//! strategy bets on any pocket whose delay in it reaches
//! `min_cold_number_delay`.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use crate::config::EngineConfig;
use crate::strategy::{settle_open_bet, OpenBet, Progression, Strategy};
use crate::types::{
    BetTarget, Pocket, RouletteNumber, RouletteType, Settlement, SettlementOutcome, Signal,
    StrategyId,
};

/// Spins counted for hot-number frequency.
pub const HOT_WINDOW: usize = 36;

// ---------------------------------------------------------------------------
// Pocket tracker
// ---------------------------------------------------------------------------

/// One row of the hot/cold display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PocketStat {
    pub number: Pocket,
    /// Spins since the pocket last fell.
    pub delay: u32,
    /// Hits within the last `HOT_WINDOW` spins.
    pub hits: u32,
}

#[derive(Debug, Clone)]
pub struct PocketTracker {
    pockets: Vec<Pocket>,
    delays: Vec<u32>,
    recent: VecDeque<Pocket>,
}

impl PocketTracker {
    pub fn new(wheel: RouletteType) -> Self {
        Self {
            pockets: wheel.pockets(),
            delays: vec![0; wheel.pocket_count()],
            recent: VecDeque::with_capacity(HOT_WINDOW + 1),
        }
    }

    pub fn record(&mut self, number: &RouletteNumber) {
        let hit = number.value.index();
        for (idx, delay) in self.delays.iter_mut().enumerate() {
            if idx == hit {
                *delay = 0;
            } else {
                *delay += 1;
            }
        }
        self.recent.push_back(number.value);
        if self.recent.len() > HOT_WINDOW {
            self.recent.pop_front();
        }
    }

    pub fn delay(&self, pocket: Pocket) -> u32 {
        self.delays.get(pocket.index()).copied().unwrap_or(0)
    }

    /// Every pocket in table order with its current delay.
    pub fn delays(&self) -> impl Iterator<Item = (Pocket, u32)> + '_ {
        self.pockets.iter().map(|p| (*p, self.delay(*p)))
    }

    fn hits(&self, pocket: Pocket) -> u32 {
        self.recent.iter().filter(|p| **p == pocket).count() as u32
    }

    fn stat(&self, pocket: Pocket) -> PocketStat {
        PocketStat {
            number: pocket,
            delay: self.delay(pocket),
            hits: self.hits(pocket),
        }
    }

    /// The `n` pockets with the longest delay. Ties go to table order.
    pub fn cold(&self, n: usize) -> Vec<PocketStat> {
        let mut stats: Vec<PocketStat> = self.pockets.iter().map(|p| self.stat(*p)).collect();
        // Stable sort keeps table order among equal delays.
        stats.sort_by(|a, b| b.delay.cmp(&a.delay));
        stats.truncate(n);
        stats
    }

    /// The `n` most frequent pockets in the recent window, never-seen excluded.
    pub fn hot(&self, n: usize) -> Vec<PocketStat> {
        let mut stats: Vec<PocketStat> = self
            .pockets
            .iter()
            .map(|p| self.stat(*p))
            .filter(|s| s.hits > 0)
            .collect();
        stats.sort_by(|a, b| b.hits.cmp(&a.hits));
        stats.truncate(n);
        stats
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ColdNumberStrategy {
    progression: Progression,
    min_delay: u32,
    open_bets: BTreeMap<Pocket, OpenBet>,
    /// Pockets abandoned on the current spin; skipped by the next `arm`.
    cooldown: BTreeSet<Pocket>,
}

impl ColdNumberStrategy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            progression: Progression::from_config(config),
            min_delay: config.min_cold_number_delay,
            open_bets: BTreeMap::new(),
            cooldown: BTreeSet::new(),
        }
    }
}

impl Strategy for ColdNumberStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::ColdNumber
    }

    fn settle(&mut self, number: &RouletteNumber) -> Vec<Settlement> {
        let open = std::mem::take(&mut self.open_bets);
        let mut settlements = Vec::with_capacity(open.len());
        for (pocket, bet) in open {
            let (settlement, next) =
                settle_open_bet(StrategyId::ColdNumber, bet, number, &self.progression, false);
            if settlement.outcome == SettlementOutcome::Abandoned {
                self.cooldown.insert(pocket);
            }
            if let Some(next) = next {
                self.open_bets.insert(pocket, next);
            }
            settlements.push(settlement);
        }
        settlements
    }

    /// Delays live in the engine's tracker.
    fn observe(&mut self, _number: &RouletteNumber) {}

    fn arm(&mut self, pockets: &PocketTracker) -> Vec<Signal> {
        let cooldown = std::mem::take(&mut self.cooldown);
        let due: Vec<(Pocket, u32)> = pockets
            .delays()
            .filter(|(pocket, delay)| {
                *delay >= self.min_delay
                    && !self.open_bets.contains_key(pocket)
                    && !cooldown.contains(pocket)
            })
            .collect();

        let mut armed = Vec::with_capacity(due.len());
        for (pocket, delay) in due {
            let bet = OpenBet::arm(BetTarget::Number(pocket), &self.progression, delay);
            debug!(number = %pocket, delay, "Cold number due, arming");
            armed.push(bet.to_signal(StrategyId::ColdNumber));
            self.open_bets.insert(pocket, bet);
        }
        armed
    }

    fn open_signals(&self) -> Vec<Signal> {
        self.open_bets
            .values()
            .map(|bet| bet.to_signal(StrategyId::ColdNumber))
            .collect()
    }

    fn reset(&mut self) {
        self.open_bets.clear();
        self.cooldown.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
