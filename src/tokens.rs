//! CEP-18 Token implementations: DAPP and mock test tokens
//!
//! - DAPP: Reward token paid out by the farm, full supply minted to the deployer
//! - MockToken: Test token with faucet mint, stands in for DAI/WETH on local chains

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

/// 1 DAPP = 1e18 base units
pub const DAPP_DECIMALS: u8 = 18;

/// Default DAPP supply: 1,000,000 whole tokens
pub const DAPP_INITIAL_SUPPLY: u128 = 1_000_000 * 1_000_000_000_000_000_000;

/// DAPP: reward token issued by the farm
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom
    ]
)]
pub struct DappToken {
    token: SubModule<Cep18>,
}

#[odra::module]
impl DappToken {
    /// Initialize the token, minting `initial_supply` to the deployer
    pub fn init(&mut self, initial_supply: U256) {
        self.token.init(
            "DAPP".to_string(),
            "Dapp Token".to_string(),
            DAPP_DECIMALS,
            initial_supply,
        );
    }

    pub fn name(&self) -> String {
        self.token.name()
    }

    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        self.token.increase_allowance(&spender, &amount);
    }

    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        self.token.decrease_allowance(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }
}

/// Mock CEP-18 token with faucet mint capability.
/// Anyone can call faucet_mint to get test tokens.
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom
    ]
)]
pub struct MockToken {
    token: SubModule<Cep18>,
}

#[odra::module]
impl MockToken {
    /// Initialize an empty token
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.token.init(symbol, name, decimals, U256::zero());
    }

    pub fn name(&self) -> String {
        self.token.name()
    }

    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    /// Faucet mint - anyone can call to get test tokens
    pub fn faucet_mint(&mut self, to: Address, amount: U256) {
        self.token.raw_mint(&to, &amount);
    }
}

// Tests live in tests/* alongside the farm flow
