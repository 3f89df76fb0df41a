// Automated lottery program
// Tickets are bought while the round is open; once the interval has passed anyone can
// close the round, and the oracle's random word picks the player who takes the pot.

pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod lottery;
pub mod processor;
pub mod state;
pub mod upkeep;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
