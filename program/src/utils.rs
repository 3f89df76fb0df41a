// Lottery program - PDA helpers
use crate::error::LotteryError;
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, program::{invoke, invoke_signed},
    pubkey::Pubkey, rent::Rent, system_instruction,
};

pub const CONFIG_SEED: &[u8] = b"config";
pub const ROUND_SEED: &[u8] = b"round";
pub const COORDINATOR_SEED: &[u8] = b"coordinator";

/// Find the program derived address of the lottery config
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the round, which also escrows deposits
pub fn find_round_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ROUND_SEED], program_id)
}

/// Find the program derived address of the randomness coordinator
pub fn find_coordinator_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_SEED], program_id)
}

/// Check that `account` is the PDA for `seed` and return its bump
pub fn assert_pda(account: &AccountInfo, seed: &[u8], program_id: &Pubkey) -> Result<u8, LotteryError> {
    let (expected, bump) = Pubkey::find_program_address(&[seed], program_id);
    if *account.key != expected {
        msg!("Account {} is not the expected PDA {}", account.key, expected);
        return Err(LotteryError::InvalidAccount);
    }
    Ok(bump)
}

/// Allocate a rent-exempt PDA of `space` bytes owned by the program, topping up
/// whatever balance the address already holds
pub fn create_pda_account<'info>(
    payer: &AccountInfo<'info>,
    account: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    seed: &[u8],
    bump: u8,
    space: usize,
    rent: &Rent,
    program_id: &Pubkey,
) -> ProgramResult {
    if account.owner == program_id {
        msg!("Account {} is already initialized", account.key);
        return Err(LotteryError::AlreadyInitialized.into());
    }

    let bump_seed = [bump];
    let signer_seeds: &[&[u8]] = &[seed, &bump_seed];
    let required_lamports = rent.minimum_balance(space).max(1);

    // create_account refuses an address that already holds lamports
    if account.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer.key,
                account.key,
                required_lamports,
                space as u64,
                program_id,
            ),
            &[payer.clone(), account.clone(), system_program.clone()],
            &[signer_seeds],
        );
    }

    let top_up = required_lamports.saturating_sub(account.lamports());
    if top_up > 0 {
        invoke(
            &system_instruction::transfer(payer.key, account.key, top_up),
            &[payer.clone(), account.clone(), system_program.clone()],
        )?;
    }

    invoke_signed(
        &system_instruction::allocate(account.key, space as u64),
        &[account.clone(), system_program.clone()],
        &[signer_seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(account.key, program_id),
        &[account.clone(), system_program.clone()],
        &[signer_seeds],
    )
}
