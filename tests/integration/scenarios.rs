//! Scenario checks: one session per property, driven spin by spin.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use roulette_advisor::config::EngineConfig;
use roulette_advisor::engine::Engine;
use roulette_advisor::types::{
    BetTarget, Color, EngineError, Parity, Phase, Pocket, RouletteNumber, RouletteType,
    SettlementOutcome, StrategyId,
};

use crate::mock_table::{make_engine, make_live_engine, MockTable, WARMUP};

fn color_only() -> Engine {
    make_live_engine(EngineConfig::default(), dec!(100), &[StrategyId::Color])
}

#[test]
fn test_resolver_is_total_on_valid_tokens() {
    for n in 0..=36u8 {
        let token = n.to_string();
        let a = RouletteNumber::resolve(&token, RouletteType::European).unwrap();
        let b = RouletteNumber::resolve(&token, RouletteType::European).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.value, Pocket::Number(n));
    }
    for bad in ["37", "-1", "abc"] {
        assert_eq!(
            RouletteNumber::resolve(bad, RouletteType::European),
            Err(EngineError::InvalidNumber(bad.to_string()))
        );
    }
}

#[test]
fn test_warmup_requires_exactly_twelve() {
    let mut table = MockTable::new(3, RouletteType::European);
    for (size, ok) in [(11, false), (12, true), (13, false)] {
        let mut engine = make_engine(EngineConfig::default());
        engine.initialize(dec!(10), &[StrategyId::Dozen]).unwrap();
        let result = engine.warmup(&table.spins(size));
        if ok {
            assert!(result.is_ok());
            assert_eq!(engine.phase(), Phase::Live);
        } else {
            assert_eq!(
                result,
                Err(EngineError::WrongWarmupSize { expected: 12, received: size })
            );
            assert_eq!(engine.phase(), Phase::WarmingUp);
        }
    }
}

#[test]
fn test_three_reds_arm_one_black_signal() {
    let mut engine = color_only();
    engine.process_spin("1").unwrap();
    engine.process_spin("3").unwrap();
    let result = engine.process_spin("5").unwrap();
    assert_eq!(result.signals.len(), 1);
    let signal = &result.signals[0];
    assert_eq!(signal.strategy, StrategyId::Color);
    assert_eq!(signal.target, BetTarget::Color(Color::Black));
    assert_eq!(signal.amount, dec!(0.50));
    assert_eq!(signal.losses, 0);
}

#[test]
fn test_martingale_stakes_and_reset() {
    let config = EngineConfig {
        martingale_factor: dec!(3),
        max_consecutive_losses: 3,
        ..Default::default()
    };
    let mut engine = make_live_engine(config, dec!(100), &[StrategyId::Color]);
    for t in ["1", "3", "5"] {
        engine.process_spin(t).unwrap();
    }

    // Keep red coming: the black bet loses at 0.50, 1.50, 4.50 and is dropped.
    let mut stakes = Vec::new();
    for t in ["7", "9", "12"] {
        let result = engine.process_spin(t).unwrap();
        stakes.push(result.settlements[0].stake);
    }
    assert_eq!(stakes, vec![dec!(0.50), dec!(1.50), dec!(4.50)]);

    let stats = engine.stats();
    assert!(stats.signals.is_empty());
    assert_eq!(stats.bank.current_balance, dec!(93.50));

    // The abandoning spin opens a new run; two more reds re-arm at base stake.
    engine.process_spin("14").unwrap();
    let result = engine.process_spin("16").unwrap();
    assert_eq!(result.armed.len(), 1);
    assert_eq!(result.signals[0].amount, dec!(0.50));
    assert_eq!(result.signals[0].losses, 0);
}

#[test]
fn test_la_partage_on_zero() {
    let mut engine = make_live_engine(EngineConfig::default(), dec!(100), &[StrategyId::EvenOdd]);
    // Warmup ends on two evens; one more arms ODD.
    let armed = engine.process_spin("6").unwrap();
    assert_eq!(armed.signals[0].target, BetTarget::Parity(Parity::Odd));

    // Lose once so the open stake is 1.00.
    engine.process_spin("8").unwrap();
    let result = engine.process_spin("0").unwrap();
    assert_eq!(result.settlements[0].outcome, SettlementOutcome::LaPartage);
    assert_eq!(result.bank.current_balance, dec!(100) - dec!(0.50) - dec!(0.50));
    assert_eq!(result.signals[0].losses, 1);
    assert_eq!(result.signals[0].amount, dec!(1.00));
}

#[test]
fn test_la_partage_disabled_counts_a_loss() {
    let config = EngineConfig {
        la_partage_enabled: false,
        ..Default::default()
    };
    let mut engine = make_live_engine(config, dec!(100), &[StrategyId::EvenOdd]);
    engine.process_spin("6").unwrap();
    let result = engine.process_spin("0").unwrap();
    assert_eq!(result.settlements[0].outcome, SettlementOutcome::Loss);
    assert_eq!(result.bank.current_balance, dec!(99.50));
    assert_eq!(result.signals[0].losses, 1);
}

#[test]
fn test_double_zero_on_american_wheel() {
    let config = EngineConfig {
        roulette_type: RouletteType::American,
        ..Default::default()
    };
    let mut engine = make_live_engine(config, dec!(100), &[StrategyId::Color]);
    for t in ["1", "3", "5"] {
        engine.process_spin(t).unwrap();
    }
    let result = engine.process_spin("00").unwrap();
    assert_eq!(result.number.value, Pocket::DoubleZero);
    assert_eq!(result.settlements[0].outcome, SettlementOutcome::LaPartage);
    assert_eq!(result.bank.current_balance, dec!(99.75));

    // "00" is not a pocket on a European wheel.
    let mut european = color_only();
    assert!(matches!(
        european.process_spin("00"),
        Err(EngineError::InvalidNumber(_))
    ));
}

#[test]
fn test_roi_identity_over_random_session() {
    let mut engine = make_live_engine(
        EngineConfig::default(),
        dec!(250),
        &StrategyId::ALL,
    );
    let mut table = MockTable::new(42, RouletteType::European);
    for token in table.spins(300) {
        let result = engine.process_spin(&token).unwrap();
        let bank = &result.bank;
        assert_eq!(bank.roi, (bank.current_balance - dec!(250)) / dec!(250));
        assert_eq!(bank.profit_loss, bank.current_balance - bank.initial_balance);
    }
}

#[test]
fn test_reset_then_initialize_matches_fresh_session() {
    let mut table = MockTable::new(9, RouletteType::European);
    let mut used = make_live_engine(EngineConfig::default(), dec!(100), &StrategyId::ALL);
    for token in table.spins(60) {
        used.process_spin(&token).unwrap();
    }
    used.reset();
    used.initialize(dec!(100), &[StrategyId::Color]).unwrap();
    used.warmup(&WARMUP).unwrap();

    let fresh = color_only();
    let (a, b) = (used.stats(), fresh.stats());
    assert_eq!(a.bank, b.bank);
    assert_eq!(a.history, b.history);
    assert_eq!(a.signals, b.signals);
    assert_eq!(a.hot, b.hot);
    assert_eq!(a.cold, b.cold);
    assert_eq!(a.strategies, b.strategies);
}

#[test]
fn test_red_red_red_black_scenario() {
    let mut engine = make_engine(EngineConfig::default());
    engine.initialize(dec!(100), &[StrategyId::Color]).unwrap();
    engine.warmup(&WARMUP).unwrap();

    let r1 = engine.process_spin("1").unwrap();
    let r2 = engine.process_spin("3").unwrap();
    assert!(r1.signals.is_empty() && r2.signals.is_empty());

    let r3 = engine.process_spin("5").unwrap();
    assert_eq!(r3.signals.len(), 1);
    assert_eq!(r3.signals[0].target, BetTarget::Color(Color::Black));
    assert_eq!(r3.signals[0].amount, dec!(0.50));

    let r4 = engine.process_spin("2").unwrap();
    assert_eq!(r4.settlements[0].outcome, SettlementOutcome::Win);
    assert_eq!(r4.bank.current_balance, dec!(100.50));
    assert_eq!(r4.bank.profit_loss, dec!(0.50));
    assert_ne!(r4.bank.roi, Decimal::ZERO);
}

#[test]
fn test_rejected_calls_leave_state_unchanged() {
    let mut engine = color_only();
    engine.process_spin("1").unwrap();
    let before = engine.stats();

    assert!(engine.process_spin("40").is_err());
    assert_eq!(engine.initialize(dec!(5), &[StrategyId::Dozen]), Err(EngineError::AlreadyInitialized));
    assert!(engine.warmup(&WARMUP).is_err());

    let after = engine.stats();
    assert_eq!(before.history, after.history);
    assert_eq!(before.bank, after.bank);
    assert_eq!(before.strategies, after.strategies);
    assert_eq!(before.phase, after.phase);
}
