//! Bank manager: bankroll, profit/loss and ROI.
//!
//! The only place a balance changes. Strategies hand back `Settlement`s;
//! the engine applies them here through `settle_win` / `settle_loss`.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::types::{EngineError, Settlement, SettlementOutcome, Signal};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only view of the bank for responses and reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BankSnapshot {
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub profit_loss: Decimal,
    /// `profit_loss / initial_balance`; zero before a session exists.
    pub roi: Decimal,
    pub peak_balance: Decimal,
    pub max_drawdown: Decimal,
    pub total_won: Decimal,
    pub total_lost: Decimal,
    pub wins: u64,
    pub losses: u64,
}

// ---------------------------------------------------------------------------
// Bank manager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BankManager {
    initial_balance: Decimal,
    current_balance: Decimal,
    peak_balance: Decimal,
    max_drawdown: Decimal,
    total_won: Decimal,
    total_lost: Decimal,
    wins: u64,
    losses: u64,
}

impl BankManager {
    /// Open a bankroll. Fails on a non-positive balance.
    pub fn initialize(balance: Decimal) -> Result<Self, EngineError> {
        if balance <= Decimal::ZERO {
            return Err(EngineError::InvalidBankroll(balance));
        }
        Ok(Self {
            initial_balance: balance,
            current_balance: balance,
            peak_balance: balance,
            max_drawdown: Decimal::ZERO,
            total_won: Decimal::ZERO,
            total_lost: Decimal::ZERO,
            wins: 0,
            losses: 0,
        })
    }

    /// Credit a win. Nothing changes if a total would leave the
    /// representable range.
    pub fn settle_win(&mut self, amount: Decimal) -> Result<(), EngineError> {
        let balance = self
            .current_balance
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow("balance"))?;
        let total_won = self
            .total_won
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow("total won"))?;

        self.current_balance = balance;
        self.total_won = total_won;
        self.wins += 1;
        self.peak_balance = self.peak_balance.max(balance);
        debug!(amount = %amount, balance = %self.current_balance, "Win settled");
        Ok(())
    }

    /// Debit a loss. The balance may go negative; that is reported, not prevented.
    pub fn settle_loss(&mut self, amount: Decimal) -> Result<(), EngineError> {
        let balance = self
            .current_balance
            .checked_sub(amount)
            .ok_or(EngineError::AmountOverflow("balance"))?;
        let total_lost = self
            .total_lost
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow("total lost"))?;
        let drawdown = self
            .peak_balance
            .checked_sub(balance)
            .ok_or(EngineError::AmountOverflow("drawdown"))?;
        balance
            .checked_sub(self.initial_balance)
            .ok_or(EngineError::AmountOverflow("profit/loss"))?;

        self.current_balance = balance;
        self.total_lost = total_lost;
        self.losses += 1;
        self.max_drawdown = self.max_drawdown.max(drawdown);
        debug!(amount = %amount, balance = %self.current_balance, "Loss settled");
        Ok(())
    }

    /// Route a strategy settlement to the matching bank operation.
    pub fn apply(&mut self, settlement: &Settlement) -> Result<(), EngineError> {
        match settlement.outcome {
            SettlementOutcome::Win => self.settle_win(settlement.amount),
            SettlementOutcome::LaPartage
            | SettlementOutcome::Loss
            | SettlementOutcome::Abandoned => self.settle_loss(settlement.amount),
        }
    }

    /// Fail unless every open bet could settle either way without any
    /// total leaving the representable range. The engine checks this
    /// before a spin touches any state.
    pub fn check_exposure(&self, open: &[Signal]) -> Result<(), EngineError> {
        let overflow = || EngineError::AmountOverflow("open stakes");
        let mut credit = Decimal::ZERO;
        let mut debit = Decimal::ZERO;
        for signal in open {
            let payout = signal
                .amount
                .checked_mul(Decimal::from(signal.target.payout_multiplier()))
                .ok_or_else(overflow)?;
            credit = credit.checked_add(payout).ok_or_else(overflow)?;
            debit = debit.checked_add(signal.amount).ok_or_else(overflow)?;
        }

        let high = self.current_balance.checked_add(credit).ok_or_else(overflow)?;
        let low = self.current_balance.checked_sub(debit).ok_or_else(overflow)?;
        self.total_won.checked_add(credit).ok_or_else(overflow)?;
        self.total_lost.checked_add(debit).ok_or_else(overflow)?;
        high.max(self.peak_balance).checked_sub(low).ok_or_else(overflow)?;
        low.checked_sub(self.initial_balance).ok_or_else(overflow)?;
        Ok(())
    }

    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    pub fn current_balance(&self) -> Decimal {
        self.current_balance
    }

    pub fn profit_loss(&self) -> Decimal {
        self.current_balance - self.initial_balance
    }

    pub fn roi(&self) -> Result<Decimal, EngineError> {
        if self.initial_balance.is_zero() {
            return Err(EngineError::DivisionUndefined);
        }
        self.profit_loss()
            .checked_div(self.initial_balance)
            .ok_or(EngineError::AmountOverflow("roi"))
    }

    pub fn snapshot(&self) -> BankSnapshot {
        BankSnapshot {
            initial_balance: self.initial_balance,
            current_balance: self.current_balance,
            profit_loss: self.profit_loss(),
            roi: self.roi().unwrap_or(Decimal::ZERO),
            peak_balance: self.peak_balance,
            max_drawdown: self.max_drawdown,
            total_won: self.total_won,
            total_lost: self.total_lost,
            wins: self.wins,
            losses: self.losses,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
