//! Lottery round transitions.
//!
//! Every transition takes the round by exclusive reference and returns the events it
//! produced. Collaborators are called before the round is touched, so a failed
//! transition leaves the round exactly as it was.

use crate::{
    error::LotteryError,
    events::LotteryEvent,
    ledger::Ledger,
    state::{Config, LotteryState, Round, WinnerRecord, MAX_PLAYERS},
    upkeep::check_upkeep,
    vrf::{winner_index, RandomWord, RandomnessCoordinator, RandomnessRequest},
};
use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError, pubkey::Pubkey};

/// Buy one ticket for `player` with a deposit of `amount`.
pub fn enter_lottery<L: Ledger>(
    config: &Config,
    round: &mut Round,
    ledger: &mut L,
    player: &Pubkey,
    amount: u64,
) -> Result<Vec<LotteryEvent>, ProgramError> {
    if amount < config.entrance_fee {
        msg!(
            "Deposit of {} lamports is below the entrance fee of {}",
            amount,
            config.entrance_fee
        );
        return Err(LotteryError::InsufficientFee.into());
    }

    if round.state != LotteryState::Open {
        msg!("Round is calculating a winner, entries are closed");
        return Err(LotteryError::RoundNotOpen.into());
    }

    if round.players.len() >= MAX_PLAYERS {
        msg!("Round already holds {} tickets", MAX_PLAYERS);
        return Err(LotteryError::RoundFull.into());
    }

    ledger.escrow(amount, player)?;
    round.players.push(*player);

    Ok(vec![LotteryEvent::Entered {
        player: *player,
        amount,
    }])
}

/// Close entries and request randomness for the round.
///
/// The upkeep predicate is evaluated again here; a caller claiming that upkeep is
/// due is never trusted.
pub fn perform_upkeep<L: Ledger, C: RandomnessCoordinator>(
    config: &Config,
    round: &mut Round,
    ledger: &L,
    coordinator: &mut C,
    now: UnixTimestamp,
) -> Result<Vec<LotteryEvent>, ProgramError> {
    let balance = ledger.balance()?;
    let status = check_upkeep(config, round, balance, now);
    if !status.upkeep_needed {
        msg!(
            "Upkeep not needed: balance={}, players={}, state={:?}",
            balance,
            round.players.len(),
            round.state
        );
        return Err(LotteryError::UpkeepNotNeeded.into());
    }

    let request = RandomnessRequest::for_config(config);
    let request_id = coordinator.request_random_words(&request)?;

    round.state = LotteryState::Calculating;
    round.pending_request_id = Some(request_id);

    Ok(vec![
        request.requested_event(request_id),
        LotteryEvent::RequestedRandomness { request_id },
    ])
}

/// Settle the round with the oracle's answer to `request_id`.
///
/// Picks `players[random_words[0] mod players.len()]`, pays it the whole escrow and
/// reopens the round. A fulfillment for any id other than the pending one is refused,
/// which also makes a replay after settlement fail.
pub fn fulfill_random_words<L: Ledger>(
    round: &mut Round,
    ledger: &mut L,
    request_id: u64,
    random_words: &[RandomWord],
    now: UnixTimestamp,
) -> Result<Vec<LotteryEvent>, ProgramError> {
    if round.pending_request_id != Some(request_id) {
        msg!(
            "Request {} does not match pending request {:?}",
            request_id,
            round.pending_request_id
        );
        return Err(LotteryError::UnknownRequest.into());
    }

    let word = random_words
        .first()
        .ok_or(LotteryError::MissingRandomWords)?;

    if round.players.is_empty() {
        return Err(LotteryError::EmptyRound.into());
    }

    let index = winner_index(word, round.players.len() as u64) as usize;
    let winner = round.players[index];
    let prize = ledger.balance()?;

    ledger.payout(prize, &winner)?;

    round.players.clear();
    round.pending_request_id = None;
    round.last_timestamp = now;
    round.state = LotteryState::Open;
    round.recent_winner = Some(WinnerRecord {
        winner,
        timestamp: now,
    });
    round.rounds_settled = round.rounds_settled.saturating_add(1);

    Ok(vec![LotteryEvent::WinnerPicked {
        winner,
        prize,
        request_id,
        timestamp: now,
    }])
}
