//! Core engine: the session lifecycle and the per-spin settle, then arm loop.
//!
//! `Engine` owns everything a session mutates: the bank, the active
//! strategies, the spin history and the hot/cold tracker. Every operation
//! validates fully before touching state, so a rejected call changes
//! nothing.

pub mod accountant;
pub mod resolver;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::strategy::cold::{PocketStat, PocketTracker};
use crate::strategy::{self, Strategy};
use crate::types::{EngineError, Phase, RouletteNumber, Settlement, Signal, StrategyId};
use accountant::{BankManager, BankSnapshot};

/// Entries in each hot/cold snapshot.
pub const HOT_COLD_SIZE: usize = 3;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Everything the caller needs after a live spin.
#[derive(Debug, Clone, Serialize)]
pub struct SpinResult {
    pub number: RouletteNumber,
    pub bank: BankSnapshot,
    /// Bets settled against this spin, in strategy order.
    pub settlements: Vec<Settlement>,
    /// Bets armed on this spin for the first time.
    pub armed: Vec<Signal>,
    /// Every open bet: the instruction for the next spin.
    pub signals: Vec<Signal>,
    pub history: Vec<RouletteNumber>,
    pub hot: Vec<PocketStat>,
    pub cold: Vec<PocketStat>,
    pub total_spins: usize,
    pub live_spins: usize,
}

/// What one live spin changed, without the session views.
#[derive(Debug, Clone, Serialize)]
pub struct SpinOutcome {
    pub number: RouletteNumber,
    pub settlements: Vec<Settlement>,
    pub armed: Vec<Signal>,
    /// Balance after every settlement of the spin.
    pub balance: Decimal,
}

/// Read-only session summary.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub phase: Phase,
    pub strategies: Vec<StrategyId>,
    pub bank: BankSnapshot,
    pub total_spins: usize,
    pub live_spins: usize,
    pub signals: Vec<Signal>,
    pub hot: Vec<PocketStat>,
    pub cold: Vec<PocketStat>,
    pub history: Vec<RouletteNumber>,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    bank: BankManager,
    /// Sorted by `StrategyId`, which is the evaluation order.
    strategies: Vec<Box<dyn Strategy>>,
    history: Vec<RouletteNumber>,
    pockets: PocketTracker,
    live_spins: usize,
}

impl Session {
    fn record(&mut self, number: RouletteNumber) {
        self.history.push(number);
        self.pockets.record(&number);
    }

    fn open_signals(&self) -> Vec<Signal> {
        self.strategies
            .iter()
            .flat_map(|s| s.open_signals())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// One player's advisor. Not shared: callers serialise access per session.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    phase: Phase,
    session: Option<Session>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            phase: Phase::Uninitialized,
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Open a session: bankroll plus the strategies to run.
    ///
    /// Duplicate ids collapse; evaluation order is fixed regardless of the
    /// order given.
    pub fn initialize(
        &mut self,
        bankroll: Decimal,
        strategies: &[StrategyId],
    ) -> Result<(), EngineError> {
        if self.phase != Phase::Uninitialized {
            return Err(EngineError::AlreadyInitialized);
        }
        self.config.validate()?;
        let bank = BankManager::initialize(bankroll)?;
        let active: BTreeSet<StrategyId> = strategies.iter().copied().collect();
        if active.is_empty() {
            return Err(EngineError::NoStrategySelected);
        }

        let session = Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            bank,
            strategies: active
                .iter()
                .map(|id| strategy::build(*id, &self.config))
                .collect(),
            history: Vec::new(),
            pockets: PocketTracker::new(self.config.roulette_type),
            live_spins: 0,
        };

        info!(
            session = %session.id,
            bankroll = %bankroll,
            strategies = ?active,
            wheel = %self.config.roulette_type,
            "Session initialized, awaiting warmup"
        );
        self.session = Some(session);
        self.phase = Phase::WarmingUp;
        Ok(())
    }

    /// Seed history with exactly `WARMUP_SPINS` numbers, most recent first,
    /// the way a table's result board lists them. They are replayed oldest
    /// to newest; no bet is armed or settled.
    pub fn warmup<S: AsRef<str>>(&mut self, numbers: &[S]) -> Result<(), EngineError> {
        match self.phase {
            Phase::WarmingUp => {}
            Phase::Uninitialized => return Err(EngineError::NotInitialized),
            phase => {
                return Err(EngineError::InvalidState {
                    operation: "warmup",
                    phase,
                })
            }
        }
        let expected = self.config.warmup_spins();
        if numbers.len() != expected {
            return Err(EngineError::WrongWarmupSize {
                expected,
                received: numbers.len(),
            });
        }
        let wheel = self.config.roulette_type;
        let resolved = numbers
            .iter()
            .map(|token| RouletteNumber::resolve(token.as_ref(), wheel))
            .collect::<Result<Vec<_>, _>>()?;

        let session = self.session.as_mut().ok_or(EngineError::NotInitialized)?;
        for number in resolved.into_iter().rev() {
            session.record(number);
            for strategy in session.strategies.iter_mut() {
                strategy.observe(&number);
            }
        }

        info!(session = %session.id, spins = expected, "Warmup complete, going live");
        self.phase = Phase::Live;
        Ok(())
    }

    /// Take one live spin: settle every open bet, then arm for the next spin.
    ///
    /// Returns only what changed. A spin whose payouts could not be booked
    /// is rejected before anything is recorded.
    pub fn step(&mut self, token: &str) -> Result<SpinOutcome, EngineError> {
        if self.phase != Phase::Live {
            return Err(EngineError::NotInitialized);
        }
        let number = RouletteNumber::resolve(token, self.config.roulette_type)?;
        let session = self.session.as_mut().ok_or(EngineError::NotInitialized)?;
        session.bank.check_exposure(&session.open_signals())?;

        session.record(number);
        session.live_spins += 1;
        debug!(session = %session.id, number = %number, spin = session.live_spins, "Spin");

        // Settle everything before anything is armed.
        let mut settlements = Vec::new();
        for strategy in session.strategies.iter_mut() {
            for settlement in strategy.settle(&number) {
                session.bank.apply(&settlement)?;
                info!(
                    strategy = %settlement.strategy,
                    target = %settlement.target,
                    stake = %settlement.stake,
                    outcome = %settlement.outcome,
                    net = %settlement.net(),
                    balance = %session.bank.current_balance(),
                    "Bet settled"
                );
                settlements.push(settlement);
            }
        }

        let mut armed = Vec::new();
        for strategy in session.strategies.iter_mut() {
            strategy.observe(&number);
            armed.extend(strategy.arm(&session.pockets));
        }
        for signal in &armed {
            info!(signal = %signal, "Signal armed");
        }

        Ok(SpinOutcome {
            number,
            settlements,
            armed,
            balance: session.bank.current_balance(),
        })
    }

    /// `step`, plus the bank, open bets, history and hot/cold views.
    pub fn process_spin(&mut self, token: &str) -> Result<SpinResult, EngineError> {
        let outcome = self.step(token)?;
        let session = self.session.as_ref().ok_or(EngineError::NotInitialized)?;
        Ok(SpinResult {
            number: outcome.number,
            bank: session.bank.snapshot(),
            settlements: outcome.settlements,
            armed: outcome.armed,
            signals: session.open_signals(),
            history: session.history.clone(),
            hot: session.pockets.hot(HOT_COLD_SIZE),
            cold: session.pockets.cold(HOT_COLD_SIZE),
            total_spins: session.history.len(),
            live_spins: session.live_spins,
        })
    }

    pub fn stats(&self) -> SessionStats {
        let Some(session) = &self.session else {
            return SessionStats {
                session_id: None,
                started_at: None,
                phase: self.phase,
                strategies: Vec::new(),
                bank: BankSnapshot::default(),
                total_spins: 0,
                live_spins: 0,
                signals: Vec::new(),
                hot: Vec::new(),
                cold: Vec::new(),
                history: Vec::new(),
            };
        };
        SessionStats {
            session_id: Some(session.id),
            started_at: Some(session.started_at),
            phase: self.phase,
            strategies: session.strategies.iter().map(|s| s.id()).collect(),
            bank: session.bank.snapshot(),
            total_spins: session.history.len(),
            live_spins: session.live_spins,
            signals: session.open_signals(),
            hot: session.pockets.hot(HOT_COLD_SIZE),
            cold: session.pockets.cold(HOT_COLD_SIZE),
            history: session.history.clone(),
        }
    }

    /// Drop the session. Valid in any phase.
    pub fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                session = %session.id,
                spins = session.history.len(),
                balance = %session.bank.current_balance(),
                "Session reset"
            );
        }
        self.phase = Phase::Uninitialized;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetTarget, Color, Pocket, SettlementOutcome};
    use rust_decimal_macros::dec;

    /// Twelve warmup spins, most recent first: black, black, red, ...
    const WARMUP: [&str; 12] = ["4", "2", "3", "9", "26", "11", "8", "0", "31", "22", "17", "5"];

    fn make_engine() -> Engine {
        Engine::new(EngineConfig::default())
    }

    fn make_live_engine(strategies: &[StrategyId]) -> Engine {
        let mut engine = make_engine();
        engine.initialize(dec!(100), strategies).unwrap();
        engine.warmup(&WARMUP).unwrap();
        engine
    }

    // -- Lifecycle tests --

    #[test]
    fn test_lifecycle_transitions() {
        let mut engine = make_engine();
        assert_eq!(engine.phase(), Phase::Uninitialized);
        engine.initialize(dec!(50), &[StrategyId::Color]).unwrap();
        assert_eq!(engine.phase(), Phase::WarmingUp);
        engine.warmup(&WARMUP).unwrap();
        assert_eq!(engine.phase(), Phase::Live);
        engine.reset();
        assert_eq!(engine.phase(), Phase::Uninitialized);
        assert!(engine.session_id().is_none());
    }

    #[test]
    fn test_initialize_errors() {
        let mut engine = make_engine();
        assert_eq!(
            engine.initialize(dec!(0), &[StrategyId::Color]),
            Err(EngineError::InvalidBankroll(dec!(0)))
        );
        assert_eq!(
            engine.initialize(dec!(10), &[]),
            Err(EngineError::NoStrategySelected)
        );
        assert_eq!(engine.phase(), Phase::Uninitialized);

        engine.initialize(dec!(10), &[StrategyId::Color]).unwrap();
        assert_eq!(
            engine.initialize(dec!(10), &[StrategyId::Color]),
            Err(EngineError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let mut engine = Engine::new(EngineConfig {
            martingale_factor: dec!(0.5),
            ..Default::default()
        });
        assert!(matches!(
            engine.initialize(dec!(10), &[StrategyId::Color]),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_strategies_run_in_fixed_order() {
        let mut engine = make_engine();
        engine
            .initialize(
                dec!(10),
                &[StrategyId::ColdNumber, StrategyId::Color, StrategyId::Dozen, StrategyId::Color],
            )
            .unwrap();
        assert_eq!(
            engine.stats().strategies,
            vec![StrategyId::Color, StrategyId::Dozen, StrategyId::ColdNumber]
        );
    }

    #[test]
    fn test_warmup_errors() {
        let mut engine = make_engine();
        assert_eq!(engine.warmup(&WARMUP), Err(EngineError::NotInitialized));

        engine.initialize(dec!(10), &[StrategyId::Color]).unwrap();
        assert_eq!(
            engine.warmup(&WARMUP[..11]),
            Err(EngineError::WrongWarmupSize { expected: 12, received: 11 })
        );
        let mut bad = WARMUP.to_vec();
        bad[6] = "37";
        assert_eq!(engine.warmup(&bad), Err(EngineError::InvalidNumber("37".into())));
        // Nothing was recorded by the rejected calls.
        assert_eq!(engine.stats().total_spins, 0);
        assert_eq!(engine.phase(), Phase::WarmingUp);

        engine.warmup(&WARMUP).unwrap();
        assert_eq!(
            engine.warmup(&WARMUP),
            Err(EngineError::InvalidState { operation: "warmup", phase: Phase::Live })
        );
    }

    #[test]
    fn test_spin_before_live() {
        let mut engine = make_engine();
        assert_eq!(engine.process_spin("1").unwrap_err(), EngineError::NotInitialized);
        engine.initialize(dec!(10), &[StrategyId::Color]).unwrap();
        assert_eq!(engine.process_spin("1").unwrap_err(), EngineError::NotInitialized);
    }

    #[test]
    fn test_invalid_spin_changes_nothing() {
        let mut engine = make_live_engine(&[StrategyId::Color]);
        let before = engine.stats();
        assert_eq!(
            engine.process_spin("abc").unwrap_err(),
            EngineError::InvalidNumber("abc".into())
        );
        let after = engine.stats();
        assert_eq!(before.total_spins, after.total_spins);
        assert_eq!(before.bank, after.bank);
    }

    // -- Spin tests --

    #[test]
    fn test_warmup_does_not_bet() {
        let engine = make_live_engine(StrategyId::ALL.as_slice());
        let stats = engine.stats();
        assert_eq!(stats.total_spins, 12);
        assert_eq!(stats.live_spins, 0);
        assert!(stats.signals.is_empty());
        assert_eq!(stats.bank.current_balance, dec!(100));
    }

    #[test]
    fn test_red_run_then_black_win() {
        let mut engine = make_live_engine(&[StrategyId::Color]);
        assert!(engine.process_spin("1").unwrap().signals.is_empty());
        assert!(engine.process_spin("3").unwrap().signals.is_empty());

        let result = engine.process_spin("5").unwrap();
        assert_eq!(result.armed.len(), 1);
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].target, BetTarget::Color(Color::Black));
        assert_eq!(result.signals[0].amount, dec!(0.50));

        let result = engine.process_spin("2").unwrap();
        assert_eq!(result.settlements.len(), 1);
        assert_eq!(result.settlements[0].outcome, SettlementOutcome::Win);
        assert_eq!(result.bank.current_balance, dec!(100.50));
        assert!(result.signals.is_empty());
        assert_eq!(result.total_spins, 16);
        assert_eq!(result.live_spins, 4);
        assert_eq!(result.history.last().unwrap().value, Pocket::Number(2));
    }

    #[test]
    fn test_settlements_follow_strategy_order() {
        let mut engine = Engine::new(EngineConfig {
            min_sequence_simple: 2,
            ..Default::default()
        });
        engine
            .initialize(dec!(100), &[StrategyId::HighLow, StrategyId::Color, StrategyId::EvenOdd])
            .unwrap();
        engine.warmup(&WARMUP).unwrap();
        // Warmup ends on a run of lows, so 7 arms HIGH at once (lost on 9).
        // 7 then 9 are red, odd, low twice in a row.
        let result = engine.process_spin("7").unwrap();
        assert_eq!(result.armed.len(), 1);
        assert_eq!(result.armed[0].strategy, StrategyId::HighLow);
        let result = engine.process_spin("9").unwrap();
        let order: Vec<_> = result.signals.iter().map(|s| s.strategy).collect();
        assert_eq!(order, vec![StrategyId::Color, StrategyId::EvenOdd, StrategyId::HighLow]);

        let result = engine.process_spin("0").unwrap();
        let order: Vec<_> = result.settlements.iter().map(|s| s.strategy).collect();
        assert_eq!(order, vec![StrategyId::Color, StrategyId::EvenOdd, StrategyId::HighLow]);
        assert!(result
            .settlements
            .iter()
            .all(|s| s.outcome == SettlementOutcome::LaPartage));
        // 0.50 lost on 9, then half of 0.50 + 0.50 + 1.00 on the zero.
        assert_eq!(result.bank.current_balance, dec!(98.50));
    }

    #[test]
    fn test_warmup_is_most_recent_first() {
        // Newest three are reds; older ones are all black.
        let board = ["1", "3", "5", "2", "4", "6", "8", "10", "11", "13", "15", "17"];
        let mut engine = make_engine();
        engine.initialize(dec!(100), &[StrategyId::Color]).unwrap();
        engine.warmup(&board).unwrap();

        let history = engine.stats().history;
        assert_eq!(history.first().unwrap().value, Pocket::Number(17));
        assert_eq!(history.last().unwrap().value, Pocket::Number(1));

        // The red run carries into live play: one more red arms black.
        let result = engine.process_spin("7").unwrap();
        assert_eq!(result.armed.len(), 1);
        assert_eq!(result.armed[0].target, BetTarget::Color(Color::Black));
        assert_eq!(result.armed[0].strength, 4);
    }

    #[test]
    fn test_step_matches_process_spin() {
        let mut a = make_live_engine(&StrategyId::ALL);
        let mut b = make_live_engine(&StrategyId::ALL);
        for token in ["1", "3", "5", "0", "2", "14", "36"] {
            let outcome = a.step(token).unwrap();
            let result = b.process_spin(token).unwrap();
            assert_eq!(outcome.settlements, result.settlements);
            assert_eq!(outcome.armed, result.armed);
            assert_eq!(outcome.balance, result.bank.current_balance);
        }
    }

    #[test]
    fn test_unbookable_spin_is_rejected_whole() {
        let mut engine = Engine::new(EngineConfig {
            initial_bet: dec!(1),
            ..Default::default()
        });
        engine.initialize(Decimal::MAX, &[StrategyId::Color]).unwrap();
        engine.warmup(&WARMUP).unwrap();
        for t in ["1", "3", "5"] {
            engine.process_spin(t).unwrap();
        }
        let before = engine.stats();
        assert_eq!(before.signals.len(), 1);

        // A one-unit win cannot be credited on top of the largest bankroll.
        assert_eq!(
            engine.process_spin("2").unwrap_err(),
            EngineError::AmountOverflow("open stakes")
        );
        let after = engine.stats();
        assert_eq!(after.total_spins, before.total_spins);
        assert_eq!(after.live_spins, before.live_spins);
        assert_eq!(after.signals, before.signals);
        assert_eq!(after.bank, before.bank);
    }

    #[test]
    fn test_hot_cold_without_cold_strategy() {
        let mut engine = make_live_engine(&[StrategyId::Color]);
        let result = engine.process_spin("4").unwrap();
        assert_eq!(result.hot.len(), HOT_COLD_SIZE);
        assert_eq!(result.hot[0].number, Pocket::Number(4));
        assert_eq!(result.hot[0].hits, 2);
        assert_eq!(result.cold.len(), HOT_COLD_SIZE);
        assert_eq!(result.cold[0].delay, 13);
    }

    #[test]
    fn test_stats_before_initialize() {
        let stats = make_engine().stats();
        assert_eq!(stats.phase, Phase::Uninitialized);
        assert_eq!(stats.bank.current_balance, Decimal::ZERO);
        assert!(stats.history.is_empty());
        assert!(stats.session_id.is_none());
    }

    #[test]
    fn test_reset_then_reinitialize_is_fresh() {
        let mut engine = make_live_engine(&[StrategyId::Color]);
        let first_id = engine.session_id();
        for t in ["1", "3", "5", "7"] {
            engine.process_spin(t).unwrap();
        }
        engine.reset();
        engine.initialize(dec!(100), &[StrategyId::Color]).unwrap();
        let stats = engine.stats();
        assert_ne!(stats.session_id, first_id);
        assert_eq!(stats.bank, BankManager::initialize(dec!(100)).unwrap().snapshot());
        assert!(stats.history.is_empty());
        assert!(stats.signals.is_empty());
    }
}
