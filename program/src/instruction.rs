use crate::{
    error::LotteryError,
    state::LotteryParams,
    utils::{find_config_address, find_coordinator_address, find_round_address},
    vrf::RandomWord,
};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryInstruction {
    /// Create the lottery accounts and store its configuration
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority paying for the accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The round account (PDA)
    /// 3. `[writable]` The coordinator account (PDA)
    /// 4. `[]` The system program
    InitializeLottery { params: LotteryParams },

    /// Buy a ticket for the open round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the deposit
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The system program
    EnterLottery {
        /// Deposit in lamports, at least the entrance fee
        amount: u64,
    },

    /// Evaluate the upkeep predicate and publish it as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The round account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close entries and request randomness. Anyone may send it.
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[writable]` The round account
    /// 2. `[writable]` The coordinator account
    PerformUpkeep { perform_data: Vec<u8> },

    /// Deliver randomness for the pending request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle registered with the coordinator
    /// 1. `[]` The coordinator account
    /// 2. `[writable]` The round account
    /// 3. `[writable]` The drawn player
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<RandomWord>,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| LotteryError::InvalidInstructionData.into())
    }
}

/// Create initialize_lottery instruction
pub fn initialize_lottery(
    program_id: &Pubkey,
    authority: &Pubkey,
    params: LotteryParams,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new(find_coordinator_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction::new_with_borsh(
        *program_id,
        &LotteryInstruction::InitializeLottery { params },
        accounts,
    )
}

/// Create enter_lottery instruction
pub fn enter_lottery(program_id: &Pubkey, player: &Pubkey, amount: u64) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction::new_with_borsh(
        *program_id,
        &LotteryInstruction::EnterLottery { amount },
        accounts,
    )
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, check_data: Vec<u8>) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new_readonly(find_round_address(program_id).0, false),
    ];

    Instruction::new_with_borsh(
        *program_id,
        &LotteryInstruction::CheckUpkeep { check_data },
        accounts,
    )
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, perform_data: Vec<u8>) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new(find_coordinator_address(program_id).0, false),
    ];

    Instruction::new_with_borsh(
        *program_id,
        &LotteryInstruction::PerformUpkeep { perform_data },
        accounts,
    )
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*oracle, true),
        AccountMeta::new_readonly(find_coordinator_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction::new_with_borsh(
        *program_id,
        &LotteryInstruction::FulfillRandomWords {
            request_id,
            random_words,
        },
        accounts,
    )
}
