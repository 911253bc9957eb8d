//! Long-session simulation harness.
//!
//! Plays seeded random sessions through the engine with every strategy
//! active and checks the bookkeeping holds on every spin.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use roulette_advisor::backtest::runner::Replay;
use roulette_advisor::config::EngineConfig;
use roulette_advisor::engine::Engine;
use roulette_advisor::strategy::Progression;
use roulette_advisor::types::{RouletteType, SettlementOutcome, StrategyId};

use crate::mock_table::MockTable;

const SPINS: usize = 1_000;

fn run_session(config: EngineConfig, seed: u64) {
    let progression = Progression::from_config(&config);
    let max_losses = config.max_consecutive_losses;
    let wheel = config.roulette_type;
    let mut table = MockTable::new(seed, wheel);

    let mut engine = Engine::new(config);
    engine.initialize(dec!(500), &StrategyId::ALL).unwrap();
    engine.warmup(&table.spins(12)).unwrap();

    let mut expected_balance = dec!(500);
    for spin in 1..=SPINS {
        let result = engine.process_spin(&table.next_token()).unwrap();

        // Balance moves only by settlements.
        expected_balance += result.settlements.iter().map(|s| s.net()).sum::<Decimal>();
        assert_eq!(result.bank.current_balance, expected_balance, "spin {spin}");

        // Fixed evaluation order.
        assert!(result.settlements.windows(2).all(|w| w[0].strategy <= w[1].strategy));
        assert!(result.signals.windows(2).all(|w| w[0].strategy <= w[1].strategy));

        // Every open bet sits on the martingale schedule, under the limit.
        for signal in &result.signals {
            assert!(signal.losses < max_losses);
            assert_eq!(Some(signal.amount), progression.stake_after(signal.losses));
        }

        // La Partage only ever touches even-money bets on green.
        for s in &result.settlements {
            if s.outcome == SettlementOutcome::LaPartage {
                assert!(result.number.is_green());
                assert!(s.target.is_even_money());
                assert_eq!(s.amount * dec!(2), s.stake);
            }
        }

        assert_eq!(result.history.len(), 12 + spin);
        assert_eq!(result.live_spins, spin);
        assert!(result.hot.len() <= 3 && result.cold.len() == 3);
    }
}

#[test]
fn test_european_session_bookkeeping() {
    run_session(EngineConfig::default(), 2024);
}

#[test]
fn test_american_session_bookkeeping() {
    let config = EngineConfig {
        roulette_type: RouletteType::American,
        min_cold_number_delay: 50,
        ..Default::default()
    };
    run_session(config, 77);
}

#[test]
fn test_aggressive_config_bookkeeping() {
    let config = EngineConfig {
        initial_bet: dec!(1),
        martingale_factor: dec!(2.5),
        max_consecutive_losses: 6,
        min_sequence_simple: 2,
        min_sequence_dozen: 1,
        min_cold_number_delay: 10,
        ..Default::default()
    };
    run_session(config, 5);
}

#[test]
fn test_replay_matches_manual_session() {
    let mut table = MockTable::new(1234, RouletteType::European);
    let tokens = table.spins(12 + 400);

    let mut engine = Engine::new(EngineConfig::default());
    engine
        .initialize(dec!(100), &[StrategyId::Color, StrategyId::Dozen])
        .unwrap();
    // The log is in the order spins fell; warmup wants the newest first.
    let board: Vec<&str> = tokens[..12].iter().rev().map(String::as_str).collect();
    engine.warmup(&board).unwrap();
    let mut balances = Vec::new();
    for token in &tokens[12..] {
        balances.push(engine.process_spin(token).unwrap().bank.current_balance);
    }

    let report = Replay::new(
        EngineConfig::default(),
        dec!(100),
        vec![StrategyId::Color, StrategyId::Dozen],
    )
    .run(&tokens)
    .unwrap();

    assert_eq!(report.total_spins, 400);
    assert_eq!(report.balance_history, balances);
    assert_eq!(report.final_bankroll, engine.stats().bank.current_balance);
    let net: Decimal = report.per_strategy.values().copied().sum();
    assert_eq!(net, report.profit_loss);
    assert!(report.peak_bankroll >= report.final_bankroll);
}
