use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, log::sol_log_data, msg, pubkey::Pubkey};

/// Notifications produced by lottery transitions.
///
/// Each event is logged twice: once as a readable `msg!` line and once as a
/// `sol_log_data` record holding its Borsh encoding, which is what indexers decode.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    /// A ticket was bought
    Entered { player: Pubkey, amount: u64 },
    /// Entries closed and randomness was requested for the round
    RequestedRandomness { request_id: u64 },
    /// The coordinator accepted a request; the off-chain oracle listens for this
    RandomWordsRequested {
        request_id: u64,
        gas_lane: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
    /// The round was settled and the prize paid
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
        request_id: u64,
        timestamp: UnixTimestamp,
    },
}

impl LotteryEvent {
    pub fn emit(&self) {
        match self {
            LotteryEvent::Entered { player, amount } => {
                msg!("Entered: player={}, amount={}", player, amount);
            }
            LotteryEvent::RequestedRandomness { request_id } => {
                msg!("RequestedRandomness: request_id={}", request_id);
            }
            LotteryEvent::RandomWordsRequested {
                request_id,
                subscription_id,
                request_confirmations,
                callback_gas_limit,
                num_words,
                ..
            } => {
                msg!(
                    "RandomWordsRequested: request_id={}, subscription={}, confirmations={}, gas_limit={}, words={}",
                    request_id,
                    subscription_id,
                    request_confirmations,
                    callback_gas_limit,
                    num_words
                );
            }
            LotteryEvent::WinnerPicked {
                winner,
                prize,
                request_id,
                timestamp,
            } => {
                msg!(
                    "WinnerPicked: winner={}, prize={}, request_id={}, at={}",
                    winner,
                    prize,
                    request_id,
                    timestamp
                );
            }
        }

        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[data.as_slice()]);
        }
    }
}

pub fn emit_all(events: &[LotteryEvent]) {
    for event in events {
        event.emit();
    }
}
