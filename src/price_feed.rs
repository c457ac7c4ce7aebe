//! Price Feed External Contract Interface
//!
//! Aggregator-style USD price feeds. Each allowed token is bound to one feed,
//! which the farm reads at reward issuance time.
//!
//! `MockV3Aggregator` is a settable feed for local deployments and tests.

use odra::prelude::*;
use odra::casper_types::U256;

/// Latest round reported by a feed
#[odra::odra_type]
pub struct RoundData {
    pub round_id: u64,
    /// USD per whole token, scaled by the feed's `decimals`
    pub answer: U256,
    pub updated_at: u64,
}

/// Price feed external contract interface
#[odra::external_contract]
pub trait PriceFeed {
    /// Number of decimals `answer` is scaled by
    fn decimals(&self) -> u8;

    /// Latest reported round
    fn latest_round_data(&self) -> RoundData;
}

/// Events for MockV3Aggregator
pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct AnswerUpdated {
        pub round_id: u64,
        pub answer: U256,
        pub updated_at: u64,
    }
}

/// Mock aggregator with a settable answer.
/// Matches the `PriceFeed` entry points so the farm can bind it like a real feed.
#[odra::module(events = [events::AnswerUpdated])]
pub struct MockV3Aggregator {
    decimals: Var<u8>,
    answer: Var<U256>,
    round_id: Var<u64>,
    updated_at: Var<u64>,
}

#[odra::module]
impl MockV3Aggregator {
    /// Initialize the feed with its scale and first answer
    pub fn init(&mut self, decimals: u8, initial_answer: U256) {
        self.decimals.set(decimals);
        self.round_id.set(0);
        self.update_answer(initial_answer);
    }

    /// Publish a new answer as the next round.
    /// A zero answer marks the feed as unavailable to readers.
    pub fn update_answer(&mut self, answer: U256) {
        let round_id = self.round_id.get_or_default() + 1;
        let updated_at = self.env().get_block_time();
        self.answer.set(answer);
        self.round_id.set(round_id);
        self.updated_at.set(updated_at);
        self.env().emit_event(events::AnswerUpdated {
            round_id,
            answer,
            updated_at,
        });
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn latest_round_data(&self) -> RoundData {
        RoundData {
            round_id: self.round_id.get_or_default(),
            answer: self.answer.get_or_default(),
            updated_at: self.updated_at.get_or_default(),
        }
    }

    /// Latest answer only
    pub fn latest_answer(&self) -> U256 {
        self.answer.get_or_default()
    }
}
