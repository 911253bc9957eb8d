//! Deterministic spin source for integration testing.
//!
//! A small linear congruential generator stands in for a real wheel so
//! long sessions are reproducible from a seed.

use rust_decimal::Decimal;

use roulette_advisor::config::EngineConfig;
use roulette_advisor::engine::Engine;
use roulette_advisor::types::{RouletteType, StrategyId};

/// Twelve warmup spins, most recent first: black, black, red, ...
pub const WARMUP: [&str; 12] = ["4", "2", "3", "9", "26", "11", "8", "0", "31", "22", "17", "5"];

/// A seeded pseudo-random wheel.
pub struct MockTable {
    state: u64,
    wheel: RouletteType,
}

impl MockTable {
    pub fn new(seed: u64, wheel: RouletteType) -> Self {
        Self { state: seed, wheel }
    }

    /// Next pocket as a raw token ("0".."36", or "00" on American wheels).
    pub fn next_token(&mut self) -> String {
        // Knuth's MMIX constants.
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let pocket = (self.state >> 33) % self.wheel.pocket_count() as u64;
        if pocket == 37 {
            "00".to_string()
        } else {
            pocket.to_string()
        }
    }

    pub fn spins(&mut self, n: usize) -> Vec<String> {
        (0..n).map(|_| self.next_token()).collect()
    }
}

pub fn make_engine(config: EngineConfig) -> Engine {
    Engine::new(config)
}

/// An engine past warmup, using the fixed `WARMUP` spins.
pub fn make_live_engine(
    config: EngineConfig,
    bankroll: Decimal,
    strategies: &[StrategyId],
) -> Engine {
    let mut engine = make_engine(config);
    engine.initialize(bankroll, strategies).unwrap();
    engine.warmup(&WARMUP).unwrap();
    engine
}

#[test]
fn test_mock_table_is_reproducible() {
    let a = MockTable::new(7, RouletteType::European).spins(50);
    let b = MockTable::new(7, RouletteType::European).spins(50);
    assert_eq!(a, b);
    assert!(a.iter().all(|t| t.parse::<u8>().unwrap() <= 36));
}

#[test]
fn test_mock_american_table_reaches_double_zero() {
    let spins = MockTable::new(11, RouletteType::American).spins(2_000);
    assert!(spins.iter().any(|t| t == "00"));
}
