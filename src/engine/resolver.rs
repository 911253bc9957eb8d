//! Raw token → `RouletteNumber`.
//!
//! Accepts "0"–"36", plus "00" on American wheels. Everything about a
//! pocket (colour, parity, height, dozen, column) is derived here once so
//! the strategies never re-parse input.

use crate::types::{
    Color, Column, Dozen, EngineError, Height, Parity, Pocket, RouletteNumber, RouletteType,
};

/// Red pockets; every other non-zero pocket is black.
const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

fn is_red(n: u8) -> bool {
    RED_NUMBERS.contains(&n)
}

impl RouletteNumber {
    /// Resolve a raw token against a wheel layout.
    pub fn resolve(token: &str, wheel: RouletteType) -> Result<Self, EngineError> {
        let trimmed = token.trim();

        if trimmed == "00" {
            return match wheel {
                RouletteType::American => Ok(Self::green(Pocket::DoubleZero)),
                RouletteType::European => Err(EngineError::InvalidNumber(token.to_string())),
            };
        }

        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidNumber(token.to_string()));
        }

        match trimmed.parse::<u8>() {
            Ok(0) => Ok(Self::green(Pocket::Number(0))),
            Ok(n) if n <= 36 => Ok(Self::from_value(n)),
            _ => Err(EngineError::InvalidNumber(token.to_string())),
        }
    }

    fn green(value: Pocket) -> Self {
        Self {
            value,
            color: Color::Green,
            parity: None,
            height: None,
            dozen: None,
            column: None,
        }
    }

    /// Attributes of a non-zero pocket (1..=36).
    fn from_value(n: u8) -> Self {
        debug_assert!((1..=36).contains(&n));
        Self {
            value: Pocket::Number(n),
            color: if is_red(n) { Color::Red } else { Color::Black },
            parity: Some(if n % 2 == 0 { Parity::Even } else { Parity::Odd }),
            height: Some(if n <= 18 { Height::Low } else { Height::High }),
            dozen: Some(Dozen::ALL[((n - 1) / 12) as usize]),
            column: Some(Column::ALL[((n - 1) % 3) as usize]),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
