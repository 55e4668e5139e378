//! Asset movement in and out of the engine's custody.
//!
//! The engine only ever talks to an [`AssetTransferPort`]. How a native coin
//! transfer or a token-contract call is actually executed is the port's
//! business; the engine checks every result and never assumes success.

use std::collections::HashMap;

use lockstake_core::error::TransferError;
use lockstake_core::params::AssetKind;
use lockstake_core::types::{AccountId, Balance};

/// Narrow capability for moving the staked asset.
pub trait AssetTransferPort: Send {
    /// Move `amount` from `from` into engine custody.
    fn pull(&mut self, from: &AccountId, amount: Balance) -> Result<(), TransferError>;

    /// Move `amount` from engine custody to `to`.
    fn push(&mut self, to: &AccountId, amount: Balance) -> Result<(), TransferError>;

    /// Amount currently held in engine custody.
    fn balance(&self) -> Balance;
}

impl<P: AssetTransferPort + ?Sized> AssetTransferPort for Box<P> {
    fn pull(&mut self, from: &AccountId, amount: Balance) -> Result<(), TransferError> {
        (**self).pull(from, amount)
    }

    fn push(&mut self, to: &AccountId, amount: Balance) -> Result<(), TransferError> {
        (**self).push(to, amount)
    }

    fn balance(&self) -> Balance {
        (**self).balance()
    }
}

// ── AssetPort ────────────────────────────────────────────────────────────────

/// The staked asset, selected once at construction.
pub enum AssetPort {
    /// Native coin transfers.
    Native(Box<dyn AssetTransferPort>),
    /// Calls into a token contract at `contract`.
    Token {
        contract: AccountId,
        client: Box<dyn AssetTransferPort>,
    },
}

impl AssetPort {
    /// Wrap `transport` according to the deployed asset kind.
    pub fn from_kind(kind: &AssetKind, transport: Box<dyn AssetTransferPort>) -> Self {
        match kind {
            AssetKind::Native => AssetPort::Native(transport),
            AssetKind::Token { contract } => AssetPort::Token {
                contract: contract.clone(),
                client: transport,
            },
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            AssetPort::Native(_) => AssetKind::Native,
            AssetPort::Token { contract, .. } => AssetKind::Token { contract: contract.clone() },
        }
    }

    fn inner(&self) -> &dyn AssetTransferPort {
        match self {
            AssetPort::Native(port) => port.as_ref(),
            AssetPort::Token { client, .. } => client.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AssetTransferPort {
        match self {
            AssetPort::Native(port) => port.as_mut(),
            AssetPort::Token { client, .. } => client.as_mut(),
        }
    }
}

impl AssetTransferPort for AssetPort {
    fn pull(&mut self, from: &AccountId, amount: Balance) -> Result<(), TransferError> {
        self.inner_mut().pull(from, amount)
    }

    fn push(&mut self, to: &AccountId, amount: Balance) -> Result<(), TransferError> {
        self.inner_mut().push(to, amount)
    }

    fn balance(&self) -> Balance {
        self.inner().balance()
    }
}

// ── InMemoryAsset ────────────────────────────────────────────────────────────

/// In-process balance sheet: participant balances plus the engine's custody.
///
/// Useful for simulations and tests. Balances that would overflow are
/// rejected rather than wrapped.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAsset {
    balances: HashMap<AccountId, Balance>,
    custody: Balance,
}

impl InMemoryAsset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `account` spendable funds (mint, for simulation purposes).
    pub fn credit(&mut self, account: &AccountId, amount: Balance) -> Result<(), TransferError> {
        let entry = self.balances.entry(account.clone()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        Ok(())
    }

    /// Fund engine custody directly, e.g. an interest reserve.
    pub fn fund_custody(&mut self, amount: Balance) -> Result<(), TransferError> {
        self.custody = self
            .custody
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("custody overflow".into()))?;
        Ok(())
    }

    pub fn balance_of(&self, account: &AccountId) -> Balance {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl AssetTransferPort for InMemoryAsset {
    fn pull(&mut self, from: &AccountId, amount: Balance) -> Result<(), TransferError> {
        let have = self.balance_of(from);
        if have < amount {
            return Err(TransferError::InsufficientFunds { need: amount, have });
        }
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("custody overflow".into()))?;
        self.balances.insert(from.clone(), have - amount);
        self.custody = custody;
        Ok(())
    }

    fn push(&mut self, to: &AccountId, amount: Balance) -> Result<(), TransferError> {
        if self.custody < amount {
            return Err(TransferError::InsufficientFunds { need: amount, have: self.custody });
        }
        let have = self.balance_of(to);
        let credited = have
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        self.custody -= amount;
        self.balances.insert(to.clone(), credited);
        Ok(())
    }

    fn balance(&self) -> Balance {
        self.custody
    }
}
