//! Token Farm Contract
//!
//! Multi-token staking with price-feed valued rewards.
//! - Owner allows tokens and binds each one to a USD price feed
//! - Users stake allowed CEP-18 tokens (approve -> stake_tokens)
//! - `issue_tokens` pays every staker the USD value of their stake in DAPP
//! - Unstaking always returns the full balance of a token
//!
//! ## Units
//! - Staked amounts: token base units (U256)
//! - Prices: USD per whole token, scaled by the feed's decimals
//! - Rewards: DAPP base units, 1 whole DAPP per 1 USD of stake value
//!
//! ## Accounting
//! `unique_tokens_staked` counts first-ever deposits per token and never goes
//! down. A staker who unstakes everything stays in the registry and keeps
//! receiving zero rewards.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::cep18::Cep18TokenContractRef;
use crate::price_feed::PriceFeedContractRef;
use alloc::vec::Vec;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct TokenAllowed {
        pub token: Address,
    }

    #[odra::event]
    pub struct PriceFeedSet {
        pub token: Address,
        pub old_feed: Option<Address>,
        pub new_feed: Address,
    }

    #[odra::event]
    pub struct Staked {
        pub staker: Address,
        pub token: Address,
        pub amount: U256,
        pub new_balance: U256,
    }

    #[odra::event]
    pub struct StakerRegistered {
        pub staker: Address,
        pub index: u32,
    }

    #[odra::event]
    pub struct Unstaked {
        pub staker: Address,
        pub token: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct TokensIssued {
        pub staker: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct IssuanceCompleted {
        pub stakers_paid: u32,
        pub total_issued: U256,
    }
}

// ==========================================
// Types
// ==========================================

/// Current price of a token as reported by its feed
#[odra::odra_type]
pub struct TokenPrice {
    pub price: U256,
    pub decimals: u8,
}

// ==========================================
// Errors
// ==========================================

#[odra::odra_error]
pub enum TokenFarmError {
    Unauthorized = 1,
    TokenNotAllowed = 2,
    InvalidAmount = 3,
    TransferFailed = 4,
    PriceFeedUnavailable = 5,
    InsufficientReserve = 6,
    NoTokensStaked = 7,
    Overflow = 8,
    RewardTokenNotSet = 9,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::TokenAllowed,
        events::PriceFeedSet,
        events::Staked,
        events::StakerRegistered,
        events::Unstaked,
        events::TokensIssued,
        events::IssuanceCompleted
    ],
    errors = TokenFarmError
)]
pub struct TokenFarm {
    // Reward token
    dapp_token: Var<Address>,

    // Allowed tokens (indexed list + membership)
    allowed_tokens: Mapping<u32, Address>,
    allowed_tokens_count: Var<u32>,
    token_allowed: Mapping<Address, bool>,
    token_price_feed: Mapping<Address, Address>,

    // Per-staker state, keyed by (token, staker)
    staking_balance: Mapping<(Address, Address), U256>,
    ever_staked: Mapping<(Address, Address), bool>,
    unique_tokens_staked: Mapping<Address, u32>,
    total_staked: Mapping<Address, U256>,

    // Stakers registry, append-only in first-seen order
    stakers: Mapping<u32, Address>,
    stakers_count: Var<u32>,

    // Admin
    owner: Var<Address>,
}

#[odra::module]
impl TokenFarm {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the farm with the token it pays rewards in
    pub fn init(&mut self, dapp_token: Address) {
        self.dapp_token.set(dapp_token);
        self.allowed_tokens_count.set(0);
        self.stakers_count.set(0);
        self.owner.set(self.env().caller());
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Allow a token for staking (owner only). Allowing twice is a no-op.
    pub fn set_allowed_token(&mut self, token: Address) {
        self.require_owner();
        self.allow_token(token);
    }

    /// Bind or rebind the price feed of an allowed token (owner only)
    pub fn set_price_feed_contract(&mut self, token: Address, price_feed: Address) {
        self.require_owner();
        self.require_allowed(&token);
        self.bind_price_feed(token, price_feed);
    }

    /// Allow a token and bind its price feed in one call (owner only)
    pub fn add_allowed_token_with_feed(&mut self, token: Address, price_feed: Address) {
        self.require_owner();
        self.allow_token(token);
        self.bind_price_feed(token, price_feed);
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Stake `amount` of an allowed token.
    /// Requires a prior `approve(farm, amount)` on the token.
    pub fn stake_tokens(&mut self, amount: U256, token: Address) {
        if amount.is_zero() {
            self.env().revert(TokenFarmError::InvalidAmount);
        }
        self.require_allowed(&token);

        let caller = self.env().caller();
        let self_address = self.env().self_address();
        let mut token_ref = Cep18TokenContractRef::new(self.env().clone(), token);

        // Check custody can move before touching any state
        if token_ref.balance_of(caller) < amount
            || token_ref.allowance(caller, self_address) < amount
        {
            self.env().revert(TokenFarmError::TransferFailed);
        }
        token_ref.transfer_from(caller, self_address, amount);

        let key = (token, caller);
        let current = self.staking_balance.get(&key).unwrap_or_default();
        let new_balance = current
            .checked_add(amount)
            .unwrap_or_else(|| self.env().revert(TokenFarmError::Overflow));
        self.staking_balance.set(&key, new_balance);
        let total = self.total_staked.get(&token).unwrap_or_default();
        self.total_staked.set(&token, total + amount);

        if !self.ever_staked.get(&key).unwrap_or_default() {
            self.ever_staked.set(&key, true);
            let unique = self.unique_tokens_staked.get(&caller).unwrap_or_default();
            self.unique_tokens_staked.set(&caller, unique + 1);
            if unique == 0 {
                self.register_staker(caller);
            }
        }

        self.env().emit_event(events::Staked {
            staker: caller,
            token,
            amount,
            new_balance,
        });
    }

    /// Withdraw the caller's entire balance of `token`.
    /// A zero balance succeeds without moving anything.
    pub fn unstake_tokens(&mut self, token: Address) {
        let caller = self.env().caller();
        let key = (token, caller);
        let balance = self.staking_balance.get(&key).unwrap_or_default();

        if !balance.is_zero() {
            let self_address = self.env().self_address();
            let mut token_ref = Cep18TokenContractRef::new(self.env().clone(), token);
            if token_ref.balance_of(self_address) < balance {
                self.env().revert(TokenFarmError::TransferFailed);
            }
            token_ref.transfer(caller, balance);

            self.staking_balance.set(&key, U256::zero());
            let total = self.total_staked.get(&token).unwrap_or_default();
            self.total_staked.set(&token, total.saturating_sub(balance));
        }

        self.env().emit_event(events::Unstaked {
            staker: caller,
            token,
            amount: balance,
        });
    }

    /// Pay every registered staker the USD value of their stake in DAPP.
    /// Payouts are computed for all stakers before the first transfer, so a
    /// short reserve or an unreadable feed aborts the whole pass.
    pub fn issue_tokens(&mut self) {
        let dapp_address = self.reward_token();
        let mut dapp = Cep18TokenContractRef::new(self.env().clone(), dapp_address);
        let reward_decimals = dapp.decimals();

        let mut payouts: Vec<(Address, U256)> = Vec::new();
        let mut total = U256::zero();
        for index in 0..self.stakers_count.get_or_default() {
            let staker = match self.stakers.get(&index) {
                Some(staker) => staker,
                None => continue,
            };
            let value = self.user_total_value(staker, reward_decimals);
            total = total
                .checked_add(value)
                .unwrap_or_else(|| self.env().revert(TokenFarmError::Overflow));
            payouts.push((staker, value));
        }

        // Staked DAPP belongs to its stakers and is not part of the reserve
        let staked_dapp = self.total_staked.get(&dapp_address).unwrap_or_default();
        let reserve = dapp
            .balance_of(self.env().self_address())
            .saturating_sub(staked_dapp);
        if reserve < total {
            self.env().revert(TokenFarmError::InsufficientReserve);
        }

        let mut stakers_paid = 0u32;
        for (staker, amount) in payouts {
            if amount.is_zero() {
                continue;
            }
            dapp.transfer(staker, amount);
            stakers_paid += 1;
            self.env().emit_event(events::TokensIssued { staker, amount });
        }

        self.env().emit_event(events::IssuanceCompleted {
            stakers_paid,
            total_issued: total,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Total USD value of a user's stake, in DAPP base units
    pub fn get_user_total_value(&self, user: Address) -> U256 {
        if self.unique_tokens_staked.get(&user).unwrap_or_default() == 0 {
            self.env().revert(TokenFarmError::NoTokensStaked);
        }
        let reward_decimals = self.reward_decimals();
        self.user_total_value(user, reward_decimals)
    }

    /// USD value of a user's stake in one token, in DAPP base units
    pub fn get_user_single_token_value(&self, user: Address, token: Address) -> U256 {
        let reward_decimals = self.reward_decimals();
        self.user_single_token_value(user, token, reward_decimals)
    }

    /// Latest price of a token from its bound feed
    pub fn get_token_value(&self, token: Address) -> TokenPrice {
        self.read_price(&token)
    }

    pub fn staking_balance(&self, token: Address, staker: Address) -> U256 {
        self.staking_balance.get(&(token, staker)).unwrap_or_default()
    }

    /// Sum of all stakers' balances of `token`
    pub fn total_staked(&self, token: Address) -> U256 {
        self.total_staked.get(&token).unwrap_or_default()
    }

    pub fn unique_tokens_staked(&self, staker: Address) -> u32 {
        self.unique_tokens_staked.get(&staker).unwrap_or_default()
    }

    /// Staker at `index` in registration order
    pub fn stakers(&self, index: u32) -> Option<Address> {
        self.stakers.get(&index)
    }

    pub fn stakers_count(&self) -> u32 {
        self.stakers_count.get_or_default()
    }

    /// Allowed token at `index` in allow order
    pub fn allowed_tokens(&self, index: u32) -> Option<Address> {
        self.allowed_tokens.get(&index)
    }

    pub fn allowed_tokens_count(&self) -> u32 {
        self.allowed_tokens_count.get_or_default()
    }

    pub fn is_token_allowed(&self, token: Address) -> bool {
        self.token_allowed.get(&token).unwrap_or_default()
    }

    pub fn token_price_feed_mapping(&self, token: Address) -> Option<Address> {
        self.token_price_feed.get(&token)
    }

    pub fn dapp_token(&self) -> Option<Address> {
        self.dapp_token.get()
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(TokenFarmError::Unauthorized);
        }
    }

    fn require_allowed(&self, token: &Address) {
        if !self.token_allowed.get(token).unwrap_or_default() {
            self.env().revert(TokenFarmError::TokenNotAllowed);
        }
    }

    fn allow_token(&mut self, token: Address) {
        if self.token_allowed.get(&token).unwrap_or_default() {
            return;
        }
        let index = self.allowed_tokens_count.get_or_default();
        self.allowed_tokens.set(&index, token);
        self.allowed_tokens_count.set(index + 1);
        self.token_allowed.set(&token, true);
        self.env().emit_event(events::TokenAllowed { token });
    }

    fn bind_price_feed(&mut self, token: Address, price_feed: Address) {
        let old_feed = self.token_price_feed.get(&token);
        self.token_price_feed.set(&token, price_feed);
        self.env().emit_event(events::PriceFeedSet {
            token,
            old_feed,
            new_feed: price_feed,
        });
    }

    fn register_staker(&mut self, staker: Address) {
        let index = self.stakers_count.get_or_default();
        self.stakers.set(&index, staker);
        self.stakers_count.set(index + 1);
        self.env().emit_event(events::StakerRegistered { staker, index });
    }

    fn reward_token(&self) -> Address {
        self.dapp_token
            .get()
            .unwrap_or_else(|| self.env().revert(TokenFarmError::RewardTokenNotSet))
    }

    fn reward_decimals(&self) -> u8 {
        Cep18TokenContractRef::new(self.env().clone(), self.reward_token()).decimals()
    }

    /// Sum of single-token values over every allowed token
    fn user_total_value(&self, user: Address, reward_decimals: u8) -> U256 {
        let mut total = U256::zero();
        for index in 0..self.allowed_tokens_count.get_or_default() {
            let token = match self.allowed_tokens.get(&index) {
                Some(token) => token,
                None => continue,
            };
            let value = self.user_single_token_value(user, token, reward_decimals);
            total = total
                .checked_add(value)
                .unwrap_or_else(|| self.env().revert(TokenFarmError::Overflow));
        }
        total
    }

    fn user_single_token_value(&self, user: Address, token: Address, reward_decimals: u8) -> U256 {
        let balance = self.staking_balance.get(&(token, user)).unwrap_or_default();
        if balance.is_zero() {
            return U256::zero();
        }
        let token_decimals = Cep18TokenContractRef::new(self.env().clone(), token).decimals();
        let price = self.read_price(&token);
        to_reward_units(balance, token_decimals, &price, reward_decimals)
            .unwrap_or_else(|| self.env().revert(TokenFarmError::Overflow))
    }

    fn read_price(&self, token: &Address) -> TokenPrice {
        let feed_address = self
            .token_price_feed
            .get(token)
            .unwrap_or_else(|| self.env().revert(TokenFarmError::PriceFeedUnavailable));
        let feed = PriceFeedContractRef::new(self.env().clone(), feed_address);
        let round = feed.latest_round_data();
        if round.answer.is_zero() {
            self.env().revert(TokenFarmError::PriceFeedUnavailable);
        }
        TokenPrice {
            price: round.answer,
            decimals: feed.decimals(),
        }
    }
}

// ==========================================
// Unit Conversion
// ==========================================

/// Convert a staked balance to reward base units:
/// `balance * price * 10^reward_decimals / 10^(feed_decimals + token_decimals)`.
/// Rounds down. Returns None on overflow.
pub fn to_reward_units(
    balance: U256,
    token_decimals: u8,
    price: &TokenPrice,
    reward_decimals: u8,
) -> Option<U256> {
    let ten = U256::from(10u64);
    let numerator = balance
        .checked_mul(price.price)?
        .checked_mul(ten.checked_pow(U256::from(reward_decimals))?)?;
    let denominator =
        ten.checked_pow(U256::from(price.decimals as u32 + token_decimals as u32))?;
    numerator.checked_div(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAD: u128 = 1_000_000_000_000_000_000;

    fn price(whole_usd: u64, decimals: u8) -> TokenPrice {
        TokenPrice {
            price: U256::from(whole_usd) * U256::from(10u64).pow(U256::from(decimals)),
            decimals,
        }
    }

    #[test]
    fn test_one_token_at_2000_usd_pays_2000_dapp() {
        let value = to_reward_units(U256::from(WAD), 18, &price(2000, 8), 18).unwrap();
        assert_eq!(value, U256::from(2000u64) * U256::from(WAD));
    }

    #[test]
    fn test_18_decimal_feed_matches_8_decimal_feed() {
        let a = to_reward_units(U256::from(WAD), 18, &price(2000, 8), 18).unwrap();
        let b = to_reward_units(U256::from(WAD), 18, &price(2000, 18), 18).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_decimals_are_normalised() {
        // 1 whole unit of a 6-decimal token at $1
        let value = to_reward_units(U256::from(1_000_000u64), 6, &price(1, 8), 18).unwrap();
        assert_eq!(value, U256::from(WAD));
    }

    #[test]
    fn test_fractional_value_rounds_down() {
        // 1 base unit at $0.5 with no decimals anywhere
        let half = TokenPrice {
            price: U256::from(5u64),
            decimals: 1,
        };
        assert_eq!(to_reward_units(U256::one(), 0, &half, 0), Some(U256::zero()));
    }

    #[test]
    fn test_overflow_returns_none() {
        let value = to_reward_units(U256::max_value(), 18, &price(2000, 8), 18);
        assert_eq!(value, None);
    }
}
