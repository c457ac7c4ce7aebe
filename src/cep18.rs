//! CEP-18 External Contract Interface
//!
//! The farm moves custody of staked tokens and pays rewards through this
//! interface, so any CEP-18 compliant token can be allowed for staking.

use odra::prelude::*;
use odra::casper_types::U256;

/// Subset of the CEP-18 entry points the farm calls.
#[odra::external_contract]
pub trait Cep18Token {
    /// Token decimals, used to normalise staked balances to whole units.
    fn decimals(&self) -> u8;

    /// Balance of an address in base units.
    fn balance_of(&self, owner: Address) -> U256;

    /// Amount `spender` may still move on behalf of `owner`.
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Transfer from the calling contract to `recipient`.
    fn transfer(&mut self, recipient: Address, amount: U256);

    /// Transfer from `owner` to `recipient` using the caller's allowance.
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
}
