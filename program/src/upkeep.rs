use crate::state::{Config, LotteryState, Round};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;
use std::convert::TryFrom;

/// Result of the upkeep predicate, published as return data by `CheckUpkeep`.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

/// Decide whether the round may be closed. Pure; safe to call from anywhere.
pub fn check_upkeep(
    config: &Config,
    round: &Round,
    balance: u64,
    now: UnixTimestamp,
) -> UpkeepStatus {
    let is_open = round.state == LotteryState::Open;
    // A clock behind the last settlement counts as no time passed.
    let time_passed = u64::try_from(now.saturating_sub(round.last_timestamp))
        .map(|elapsed| elapsed >= config.interval)
        .unwrap_or(false);
    let has_players = !round.players.is_empty();
    let has_balance = balance > 0;

    UpkeepStatus {
        upkeep_needed: is_open && time_passed && has_players && has_balance,
        is_open,
        time_passed,
        has_players,
        has_balance,
    }
}
