//! Token Farm x Casper — Multi-Token Staking (Odra)
//!
//! This crate implements a staking farm on Casper using Odra framework.
//! - DAPP: Reward token, full supply minted to the deployer
//! - MockToken / MockV3Aggregator: Test tokens and price feeds for local chains
//! - TokenFarm: Core staking ledger paying rewards by USD value of each stake

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod cep18;
pub mod price_feed;
pub mod tokens;
pub mod token_farm;
