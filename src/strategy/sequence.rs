//! Even-money run detector (COR, PAR_IMPAR, ALTO_BAIXO).
//!
//! Counts identical outcomes in a row for one binary category. Once the
//! run reaches `min_sequence_simple`, backs the opposite outcome and keeps
//! backing it through the martingale progression until it wins or the
//! loss limit is hit. Green spins neither extend nor break a run.

use tracing::debug;

use crate::config::EngineConfig;
use crate::strategy::cold::PocketTracker;
use crate::strategy::{settle_open_bet, OpenBet, Progression, Strategy};
use crate::types::{BetTarget, Color, Height, Parity, RouletteNumber, Settlement, Signal, StrategyId};

#[derive(Debug)]
pub struct SimpleSequenceStrategy {
    id: StrategyId,
    progression: Progression,
    la_partage_enabled: bool,
    min_sequence: u32,
    /// Current run: the repeated outcome and how many times in a row.
    run: Option<(BetTarget, u32)>,
    /// Whether the last observed spin carried this category (not green).
    last_was_categorised: bool,
    open_bet: Option<OpenBet>,
}

impl SimpleSequenceStrategy {
    pub fn new(id: StrategyId, config: &EngineConfig) -> Self {
        debug_assert!(matches!(
            id,
            StrategyId::Color | StrategyId::EvenOdd | StrategyId::HighLow
        ));
        Self {
            id,
            progression: Progression::from_config(config),
            la_partage_enabled: config.la_partage_enabled,
            min_sequence: config.min_sequence_simple,
            run: None,
            last_was_categorised: false,
            open_bet: None,
        }
    }

    /// The watched outcome of a spin, `None` on green.
    fn category(&self, number: &RouletteNumber) -> Option<BetTarget> {
        match self.id {
            StrategyId::Color => match number.color {
                Color::Green => None,
                c => Some(BetTarget::Color(c)),
            },
            StrategyId::EvenOdd => number.parity.map(BetTarget::Parity),
            StrategyId::HighLow => number.height.map(BetTarget::Height),
            _ => None,
        }
    }

    pub fn run(&self) -> Option<(BetTarget, u32)> {
        self.run
    }
}

/// The other side of an even-money category.
fn opposite(target: BetTarget) -> BetTarget {
    match target {
        BetTarget::Color(Color::Red) => BetTarget::Color(Color::Black),
        BetTarget::Color(Color::Black) => BetTarget::Color(Color::Red),
        BetTarget::Parity(Parity::Even) => BetTarget::Parity(Parity::Odd),
        BetTarget::Parity(Parity::Odd) => BetTarget::Parity(Parity::Even),
        BetTarget::Height(Height::Low) => BetTarget::Height(Height::High),
        BetTarget::Height(Height::High) => BetTarget::Height(Height::Low),
        other => other,
    }
}

impl Strategy for SimpleSequenceStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn settle(&mut self, number: &RouletteNumber) -> Vec<Settlement> {
        let Some(bet) = self.open_bet.take() else {
            return Vec::new();
        };
        let (settlement, next) = settle_open_bet(
            self.id,
            bet,
            number,
            &self.progression,
            self.la_partage_enabled,
        );
        if next.is_none() {
            // Won or abandoned: the run that triggered the bet is spent.
            self.run = None;
        }
        self.open_bet = next;
        vec![settlement]
    }

    fn observe(&mut self, number: &RouletteNumber) {
        let Some(outcome) = self.category(number) else {
            self.last_was_categorised = false;
            return;
        };
        self.last_was_categorised = true;
        self.run = match self.run {
            Some((current, count)) if current == outcome => Some((current, count + 1)),
            _ => Some((outcome, 1)),
        };
    }

    fn arm(&mut self, _pockets: &PocketTracker) -> Vec<Signal> {
        if self.open_bet.is_some() || !self.last_was_categorised {
            return Vec::new();
        }
        let Some((repeated, count)) = self.run else {
            return Vec::new();
        };
        if count < self.min_sequence {
            return Vec::new();
        }

        let bet = OpenBet::arm(opposite(repeated), &self.progression, count);
        debug!(
            strategy = %self.id,
            run = %repeated,
            count,
            target = %bet.target,
            "Run threshold reached, arming opposite"
        );
        let signal = bet.to_signal(self.id);
        self.open_bet = Some(bet);
        vec![signal]
    }

    fn open_signals(&self) -> Vec<Signal> {
        self.open_bet
            .iter()
            .map(|bet| bet.to_signal(self.id))
            .collect()
    }

    fn reset(&mut self) {
        self.run = None;
        self.last_was_categorised = false;
        self.open_bet = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
