//! Shared types for the roulette advisor.
//!
//! These types form the data model used across all modules: wheel
//! attributes, strategy identifiers, bet targets, the signals and
//! settlements the engine reports, and the engine error enum. They
//! depend on nothing else in the crate so that the resolver, strategies
//! and orchestrator can all share them without circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Number of spins required to seed a session before live signals.
pub const WARMUP_SPINS: usize = 12;

// ---------------------------------------------------------------------------
// Wheel
// ---------------------------------------------------------------------------

/// Wheel layout. American wheels add the `00` pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouletteType {
    #[default]
    European,
    American,
}

impl RouletteType {
    /// Number of pockets on the wheel (37 or 38).
    pub fn pocket_count(&self) -> usize {
        match self {
            RouletteType::European => 37,
            RouletteType::American => 38,
        }
    }

    /// Every pocket on the wheel in table order: 0..=36, then 00.
    pub fn pockets(&self) -> Vec<Pocket> {
        let mut pockets: Vec<Pocket> = (0..=36).map(Pocket::Number).collect();
        if *self == RouletteType::American {
            pockets.push(Pocket::DoubleZero);
        }
        pockets
    }
}

impl fmt::Display for RouletteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouletteType::European => write!(f, "EUROPEAN"),
            RouletteType::American => write!(f, "AMERICAN"),
        }
    }
}

/// A single pocket on the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pocket {
    /// 0 through 36.
    Number(u8),
    /// The American `00`.
    DoubleZero,
}

impl Pocket {
    /// Position in a delay/frequency table: 0..=36, with 00 at 37.
    pub fn index(&self) -> usize {
        match self {
            Pocket::Number(n) => *n as usize,
            Pocket::DoubleZero => 37,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Pocket::Number(0) | Pocket::DoubleZero)
    }
}

impl fmt::Display for Pocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pocket::Number(n) => write!(f, "{n}"),
            Pocket::DoubleZero => write!(f, "00"),
        }
    }
}

impl Serialize for Pocket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "RED"),
            Color::Black => write!(f, "BLACK"),
            Color::Green => write!(f, "GREEN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Parity {
    Even,
    Odd,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "EVEN"),
            Parity::Odd => write!(f, "ODD"),
        }
    }
}

/// LOW is 1–18, HIGH is 19–36.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Height {
    Low,
    High,
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Height::Low => write!(f, "LOW"),
            Height::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dozen {
    D1,
    D2,
    D3,
}

impl Dozen {
    pub const ALL: [Dozen; 3] = [Dozen::D1, Dozen::D2, Dozen::D3];
}

impl fmt::Display for Dozen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dozen::D1 => write!(f, "D1"),
            Dozen::D2 => write!(f, "D2"),
            Dozen::D3 => write!(f, "D3"),
        }
    }
}

/// C1 holds 1, 4, 7, …; C2 holds 2, 5, 8, …; C3 holds 3, 6, 9, ….
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Column {
    C1,
    C2,
    C3,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::C1, Column::C2, Column::C3];
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::C1 => write!(f, "C1"),
            Column::C2 => write!(f, "C2"),
            Column::C3 => write!(f, "C3"),
        }
    }
}

/// A resolved spin with every attribute the strategies watch.
///
/// The optional attributes are `None` only for the green pockets (0, 00).
/// Built exclusively by `RouletteNumber::resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouletteNumber {
    pub value: Pocket,
    pub color: Color,
    pub parity: Option<Parity>,
    pub height: Option<Height>,
    pub dozen: Option<Dozen>,
    pub column: Option<Column>,
}

impl RouletteNumber {
    pub fn is_green(&self) -> bool {
        self.color == Color::Green
    }
}

impl fmt::Display for RouletteNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.color)
    }
}

// ---------------------------------------------------------------------------
// Strategies & targets
// ---------------------------------------------------------------------------

/// Strategy identifiers. Declaration order is the fixed evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyId {
    #[serde(rename = "COR")]
    Color,
    #[serde(rename = "PAR_IMPAR")]
    EvenOdd,
    #[serde(rename = "ALTO_BAIXO")]
    HighLow,
    #[serde(rename = "DUZIA")]
    Dozen,
    #[serde(rename = "COLUNA")]
    Column,
    #[serde(rename = "FRIO")]
    ColdNumber,
}

impl StrategyId {
    /// All strategies in evaluation order.
    pub const ALL: [StrategyId; 6] = [
        StrategyId::Color,
        StrategyId::EvenOdd,
        StrategyId::HighLow,
        StrategyId::Dozen,
        StrategyId::Column,
        StrategyId::ColdNumber,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            StrategyId::Color => "COR",
            StrategyId::EvenOdd => "PAR_IMPAR",
            StrategyId::HighLow => "ALTO_BAIXO",
            StrategyId::Dozen => "DUZIA",
            StrategyId::Column => "COLUNA",
            StrategyId::ColdNumber => "FRIO",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

/// Parse a strategy code (case-insensitive).
impl std::str::FromStr for StrategyId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        StrategyId::ALL
            .into_iter()
            .find(|id| id.code() == code)
            .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {s}"))
    }
}

/// What a signal backs on the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BetTarget {
    Color(Color),
    Parity(Parity),
    Height(Height),
    Dozen(Dozen),
    Column(Column),
    Number(Pocket),
}

impl BetTarget {
    /// Whether a spin wins this bet.
    pub fn wins(&self, number: &RouletteNumber) -> bool {
        match self {
            BetTarget::Color(c) => number.color == *c,
            BetTarget::Parity(p) => number.parity == Some(*p),
            BetTarget::Height(h) => number.height == Some(*h),
            BetTarget::Dozen(d) => number.dozen == Some(*d),
            BetTarget::Column(c) => number.column == Some(*c),
            BetTarget::Number(p) => number.value == *p,
        }
    }

    /// Winnings per unit staked, excluding the returned stake.
    pub fn payout_multiplier(&self) -> u32 {
        match self {
            BetTarget::Color(_) | BetTarget::Parity(_) | BetTarget::Height(_) => 1,
            BetTarget::Dozen(_) | BetTarget::Column(_) => 2,
            BetTarget::Number(_) => 35,
        }
    }

    /// Even-money bets are the only ones La Partage applies to.
    pub fn is_even_money(&self) -> bool {
        self.payout_multiplier() == 1
    }
}

impl fmt::Display for BetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetTarget::Color(c) => write!(f, "{c}"),
            BetTarget::Parity(p) => write!(f, "{p}"),
            BetTarget::Height(h) => write!(f, "{h}"),
            BetTarget::Dozen(d) => write!(f, "{d}"),
            BetTarget::Column(c) => write!(f, "{c}"),
            BetTarget::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for BetTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Signals & settlements
// ---------------------------------------------------------------------------

/// A staking instruction for the upcoming spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub strategy: StrategyId,
    pub target: BetTarget,
    pub amount: Decimal,
    /// Consecutive losses in the current progression.
    pub losses: u32,
    /// Run length (sequence strategies) or delay (delay strategies) that triggered the bet.
    pub strength: u32,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] bet {:.2} on {} (losses={} strength={})",
            self.strategy, self.amount, self.target, self.losses, self.strength,
        )
    }
}

/// How an open bet resolved against a spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementOutcome {
    Win,
    /// Zero on an even-money bet: half the stake is lost, the bet stays open.
    LaPartage,
    /// Lost and re-armed at the next martingale stake.
    Loss,
    /// Lost and the loss limit was reached; the progression is dropped.
    Abandoned,
}

impl fmt::Display for SettlementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementOutcome::Win => write!(f, "WIN"),
            SettlementOutcome::LaPartage => write!(f, "LA_PARTAGE"),
            SettlementOutcome::Loss => write!(f, "LOSS"),
            SettlementOutcome::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

/// One open bet settled against a spin. Strategies produce these; only the
/// bank manager turns them into balance changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub strategy: StrategyId,
    pub target: BetTarget,
    pub stake: Decimal,
    pub outcome: SettlementOutcome,
    /// Money moved: winnings credited on WIN, the amount debited otherwise.
    pub amount: Decimal,
}

impl Settlement {
    /// Signed balance change.
    pub fn net(&self) -> Decimal {
        match self.outcome {
            SettlementOutcome::Win => self.amount,
            _ => -self.amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Uninitialized,
    WarmingUp,
    Live,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Uninitialized => write!(f, "UNINITIALIZED"),
            Phase::WarmingUp => write!(f, "WARMING_UP"),
            Phase::Live => write!(f, "LIVE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Every way an engine call can be rejected. None of them leaves the
/// engine in a modified state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("Invalid bankroll: {0} (must be greater than zero)")]
    InvalidBankroll(Decimal),

    #[error("No strategy selected")]
    NoStrategySelected,

    #[error("Wrong warmup size: expected {expected} numbers, received {received}")]
    WrongWarmupSize { expected: usize, received: usize },

    #[error("Engine already initialized")]
    AlreadyInitialized,

    #[error("Engine not ready: initialize and warm up first")]
    NotInitialized,

    #[error("Cannot {operation} while {phase}")]
    InvalidState { operation: &'static str, phase: Phase },

    #[error("ROI undefined: initial balance is zero")]
    DivisionUndefined,

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Amount out of range: {0}")]
    AmountOverflow(&'static str),
}

impl EngineError {
    /// Stable machine-readable name for transport layers.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidNumber(_) => "InvalidNumber",
            EngineError::InvalidBankroll(_) => "InvalidBankroll",
            EngineError::NoStrategySelected => "NoStrategySelected",
            EngineError::WrongWarmupSize { .. } => "WrongWarmupSize",
            EngineError::AlreadyInitialized => "AlreadyInitialized",
            EngineError::NotInitialized => "NotInitialized",
            EngineError::InvalidState { .. } => "InvalidState",
            EngineError::DivisionUndefined => "DivisionUndefined",
            EngineError::InvalidConfig(_) => "InvalidConfig",
            EngineError::AmountOverflow(_) => "AmountOverflow",
        }
    }

    /// Lifecycle errors (wrong call order) as opposed to bad input.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyInitialized
                | EngineError::NotInitialized
                | EngineError::InvalidState { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
