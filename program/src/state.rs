use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

/// Maximum number of tickets a single round can hold
pub const MAX_PLAYERS: usize = 256;

const PLAYERS_BYTES: usize = MAX_PLAYERS * 32;
const ROUND_HEADER_LEN: usize = 72;

/// Status of the active round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryState {
    /// Round accepts entries
    Open,
    /// Entries are closed, waiting for the oracle to deliver randomness
    Calculating,
}

impl TryFrom<u8> for LotteryState {
    type Error = ProgramError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(LotteryState::Open),
            1 => Ok(LotteryState::Calculating),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

impl From<LotteryState> for u8 {
    fn from(state: LotteryState) -> Self {
        match state {
            LotteryState::Open => 0,
            LotteryState::Calculating => 1,
        }
    }
}

/// Arguments of a lottery deployment
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct LotteryParams {
    /// Minimum deposit per ticket in lamports
    pub entrance_fee: u64,
    /// Seconds between settlements
    pub interval: u64,
    /// Oracle key lane the randomness is requested on
    pub gas_lane: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    /// Key allowed to deliver randomness fulfillments, must be set before initializing
    pub oracle: Pubkey,
}

impl Default for LotteryParams {
    fn default() -> Self {
        // 0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc
        let gas_lane = [
            0xd8, 0x9b, 0x2b, 0xf1, 0x50, 0xe3, 0xb9, 0xe1, 0x34, 0x46, 0x98, 0x6e, 0x57, 0x1f,
            0xb9, 0xca, 0xb2, 0x4b, 0x13, 0xce, 0xa0, 0xa4, 0x3e, 0xa2, 0x0a, 0x60, 0x49, 0xa8,
            0x5c, 0xc8, 0x07, 0xcc,
        ];

        Self {
            entrance_fee: 10_000_000, // 0.01 SOL
            interval: 30,
            gas_lane,
            subscription_id: 1,
            callback_gas_limit: 500_000,
            oracle: Pubkey::default(),
        }
    }
}

/// Per-deployment configuration, written once at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub is_initialized: bool,
    /// Account that paid for the deployment
    pub authority: Pubkey,
    pub entrance_fee: u64,
    pub interval: u64,
    pub gas_lane: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
}

impl Config {
    pub fn new(authority: Pubkey, params: &LotteryParams) -> Self {
        Self {
            is_initialized: true,
            authority,
            entrance_fee: params.entrance_fee,
            interval: params.interval,
            gas_lane: params.gas_lane,
            subscription_id: params.subscription_id,
            callback_gas_limit: params.callback_gas_limit,
        }
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }
}

/// Last settled winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinnerRecord {
    pub winner: Pubkey,
    pub timestamp: UnixTimestamp,
}

/// The active lottery round. The round PDA also holds the escrowed deposits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub is_initialized: bool,
    pub state: LotteryState,
    /// Time the previous round was settled (or the lottery was created)
    pub last_timestamp: UnixTimestamp,
    /// Set iff `state == Calculating`
    pub pending_request_id: Option<u64>,
    pub recent_winner: Option<WinnerRecord>,
    pub rounds_settled: u64,
    /// One entry per ticket, in entry order
    pub players: Vec<Pubkey>,
}

impl Round {
    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            state: LotteryState::Open,
            last_timestamp: now,
            pending_request_id: None,
            recent_winner: None,
            rounds_settled: 0,
            players: Vec::new(),
        }
    }

    pub fn state(&self) -> LotteryState {
        self.state
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn latest_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn recent_winner(&self) -> Option<&WinnerRecord> {
        self.recent_winner.as_ref()
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    pub fn rounds_settled(&self) -> u64 {
        self.rounds_settled
    }
}

/// On-chain side of the randomness oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinator {
    pub is_initialized: bool,
    /// Signer of fulfillments
    pub oracle: Pubkey,
    pub subscription_id: u64,
    /// Id handed to the next randomness request, starts at 1
    pub next_request_id: u64,
}

impl Coordinator {
    pub fn new(oracle: Pubkey, subscription_id: u64) -> Self {
        Self {
            is_initialized: true,
            oracle,
            subscription_id,
            next_request_id: 1,
        }
    }
}

impl Sealed for Config {}
impl Sealed for Round {}
impl Sealed for Coordinator {}

impl IsInitialized for Config {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for Round {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for Coordinator {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Config {
    const LEN: usize = 1 + 32 + 8 + 8 + 32 + 8 + 4;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Config::LEN];
        let (
            is_initialized,
            authority,
            entrance_fee,
            interval,
            gas_lane,
            subscription_id,
            callback_gas_limit,
        ) = array_refs![src, 1, 32, 8, 8, 32, 8, 4];

        Ok(Config {
            is_initialized: unpack_bool(is_initialized)?,
            authority: Pubkey::new_from_array(*authority),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            gas_lane: *gas_lane,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Config::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            entrance_fee_dst,
            interval_dst,
            gas_lane_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 32, 8, 4];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *gas_lane_dst = self.gas_lane;
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
    }
}

impl Pack for Round {
    const LEN: usize = ROUND_HEADER_LEN + PLAYERS_BYTES;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Round::LEN];
        let (header, players_src) = array_refs![src, ROUND_HEADER_LEN, PLAYERS_BYTES];
        let (
            is_initialized,
            state,
            last_timestamp,
            has_pending,
            pending_request_id,
            has_winner,
            winner,
            winner_timestamp,
            rounds_settled,
            players_len,
        ) = array_refs![header, 1, 1, 8, 1, 8, 1, 32, 8, 8, 4];

        let players_len = u32::from_le_bytes(*players_len) as usize;
        if players_len > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let players = players_src
            .chunks_exact(32)
            .take(players_len)
            .map(|chunk| {
                let mut key = [0u8; 32];
                key.copy_from_slice(chunk);
                Pubkey::new_from_array(key)
            })
            .collect();

        let pending_request_id = if unpack_bool(has_pending)? {
            Some(u64::from_le_bytes(*pending_request_id))
        } else {
            None
        };
        let recent_winner = if unpack_bool(has_winner)? {
            Some(WinnerRecord {
                winner: Pubkey::new_from_array(*winner),
                timestamp: UnixTimestamp::from_le_bytes(*winner_timestamp),
            })
        } else {
            None
        };

        Ok(Round {
            is_initialized: unpack_bool(is_initialized)?,
            state: LotteryState::try_from(state[0])?,
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            pending_request_id,
            recent_winner,
            rounds_settled: u64::from_le_bytes(*rounds_settled),
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Round::LEN];
        let (header_dst, players_dst) = mut_array_refs![dst, ROUND_HEADER_LEN, PLAYERS_BYTES];
        let (
            is_initialized_dst,
            state_dst,
            last_timestamp_dst,
            has_pending_dst,
            pending_request_id_dst,
            has_winner_dst,
            winner_dst,
            winner_timestamp_dst,
            rounds_settled_dst,
            players_len_dst,
        ) = mut_array_refs![header_dst, 1, 1, 8, 1, 8, 1, 32, 8, 8, 4];

        is_initialized_dst[0] = self.is_initialized as u8;
        state_dst[0] = self.state.into();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();

        has_pending_dst[0] = self.pending_request_id.is_some() as u8;
        *pending_request_id_dst = self.pending_request_id.unwrap_or_default().to_le_bytes();

        match self.recent_winner {
            Some(record) => {
                has_winner_dst[0] = 1;
                winner_dst.copy_from_slice(record.winner.as_ref());
                *winner_timestamp_dst = record.timestamp.to_le_bytes();
            }
            None => {
                has_winner_dst[0] = 0;
                winner_dst.fill(0);
                *winner_timestamp_dst = [0; 8];
            }
        }

        *rounds_settled_dst = self.rounds_settled.to_le_bytes();

        debug_assert!(self.players.len() <= MAX_PLAYERS);
        *players_len_dst = (self.players.len() as u32).to_le_bytes();
        players_dst.fill(0);
        for (slot, player) in players_dst.chunks_exact_mut(32).zip(&self.players) {
            slot.copy_from_slice(player.as_ref());
        }
    }
}

impl Pack for Coordinator {
    const LEN: usize = 1 + 32 + 8 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Coordinator::LEN];
        let (is_initialized, oracle, subscription_id, next_request_id) =
            array_refs![src, 1, 32, 8, 8];

        Ok(Coordinator {
            is_initialized: unpack_bool(is_initialized)?,
            oracle: Pubkey::new_from_array(*oracle),
            subscription_id: u64::from_le_bytes(*subscription_id),
            next_request_id: u64::from_le_bytes(*next_request_id),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Coordinator::LEN];
        let (is_initialized_dst, oracle_dst, subscription_id_dst, next_request_id_dst) =
            mut_array_refs![dst, 1, 32, 8, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        oracle_dst.copy_from_slice(self.oracle.as_ref());
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *next_request_id_dst = self.next_request_id.to_le_bytes();
    }
}

fn unpack_bool(src: &[u8; 1]) -> Result<bool, ProgramError> {
    match src {
        [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(ProgramError::InvalidAccountData),
    }
}
