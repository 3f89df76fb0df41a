// Randomness oracle integration: request side, on-chain coordinator and winner arithmetic
use crate::{
    error::LotteryError,
    events::LotteryEvent,
    state::{Config, Coordinator},
};
use solana_program::{msg, program_error::ProgramError};

/// Random words requested per round
pub const NUM_WORDS: u32 = 1;
/// Confirmations the oracle waits for before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
pub const MAX_NUM_WORDS: u32 = 500;
pub const MAX_CALLBACK_GAS_LIMIT: u32 = 2_500_000;

/// A 256-bit random word, big-endian
pub type RandomWord = [u8; 32];

/// Parameters of a single randomness request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub gas_lane: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn for_config(config: &Config) -> Self {
        Self {
            gas_lane: config.gas_lane,
            subscription_id: config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: config.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }

    /// Announcement the off-chain oracle answers once the request got `request_id`
    pub fn requested_event(&self, request_id: u64) -> LotteryEvent {
        LotteryEvent::RandomWordsRequested {
            request_id,
            gas_lane: self.gas_lane,
            subscription_id: self.subscription_id,
            request_confirmations: self.request_confirmations,
            callback_gas_limit: self.callback_gas_limit,
            num_words: self.num_words,
        }
    }
}

/// Accepts randomness requests and hands back the id the fulfillment will carry.
pub trait RandomnessCoordinator {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError>;
}

/// Coordinator backed by the program's coordinator account
pub struct VrfCoordinator<'a> {
    state: &'a mut Coordinator,
}

impl<'a> VrfCoordinator<'a> {
    pub fn new(state: &'a mut Coordinator) -> Self {
        Self { state }
    }
}

impl RandomnessCoordinator for VrfCoordinator<'_> {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError> {
        if request.subscription_id != self.state.subscription_id {
            msg!(
                "Unknown subscription {}, coordinator serves {}",
                request.subscription_id,
                self.state.subscription_id
            );
            return Err(LotteryError::InvalidSubscription.into());
        }

        if request.num_words == 0 || request.num_words > MAX_NUM_WORDS {
            msg!("Cannot request {} random words", request.num_words);
            return Err(LotteryError::RandomnessRequestRejected.into());
        }

        if request.callback_gas_limit > MAX_CALLBACK_GAS_LIMIT {
            msg!(
                "Callback gas limit {} above {}",
                request.callback_gas_limit,
                MAX_CALLBACK_GAS_LIMIT
            );
            return Err(LotteryError::RandomnessRequestRejected.into());
        }

        let request_id = self.state.next_request_id;
        self.state.next_request_id = request_id
            .checked_add(1)
            .ok_or(LotteryError::Overflow)?;

        Ok(request_id)
    }
}

/// Index of the winning ticket: `word mod total_tickets`, with `word` read as a
/// big-endian 256-bit integer. Slightly biased unless `total_tickets` is a power of two.
pub fn winner_index(word: &RandomWord, total_tickets: u64) -> u64 {
    if total_tickets == 0 {
        return 0;
    }

    let modulus = total_tickets as u128;
    word.iter()
        .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % modulus) as u64
}

/// Random word holding `value` in its low 64 bits
pub fn word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
