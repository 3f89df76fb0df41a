use crate::{
    error::LotteryError,
    events,
    instruction::LotteryInstruction,
    ledger::{Ledger, RoundVault},
    lottery,
    state::{Config, Coordinator, LotteryParams, Round},
    upkeep,
    utils::{assert_pda, create_pda_account, CONFIG_SEED, COORDINATOR_SEED, ROUND_SEED},
    vrf::{RandomWord, VrfCoordinator, MAX_CALLBACK_GAS_LIMIT},
};

use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::set_return_data,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::InitializeLottery { params } => {
                msg!("Instruction: Initialize Lottery");
                Self::process_initialize_lottery(accounts, params, program_id)
            }
            LotteryInstruction::EnterLottery { amount } => {
                msg!("Instruction: Enter Lottery");
                Self::process_enter_lottery(accounts, amount, program_id)
            }
            LotteryInstruction::CheckUpkeep { .. } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            LotteryInstruction::PerformUpkeep { .. } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            LotteryInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Creates the config, round and coordinator accounts. Runs once per deployment.
    fn process_initialize_lottery(
        accounts: &[AccountInfo],
        params: LotteryParams,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        check_system_program(system_program_info)?;

        if params.entrance_fee == 0 {
            msg!("Entrance fee must be greater than zero");
            return Err(LotteryError::InvalidConfig.into());
        }
        if params.callback_gas_limit > MAX_CALLBACK_GAS_LIMIT {
            msg!(
                "Callback gas limit cannot exceed {}",
                MAX_CALLBACK_GAS_LIMIT
            );
            return Err(LotteryError::InvalidConfig.into());
        }
        if params.oracle == Pubkey::default() {
            msg!("An oracle must be registered to fulfill randomness requests");
            return Err(LotteryError::InvalidConfig.into());
        }

        let config_bump = assert_pda(config_info, CONFIG_SEED, program_id)?;
        let round_bump = assert_pda(round_info, ROUND_SEED, program_id)?;
        let coordinator_bump = assert_pda(coordinator_info, COORDINATOR_SEED, program_id)?;

        let rent = Rent::get()?;
        let now = Clock::get()?.unix_timestamp;

        create_pda_account(
            authority_info,
            config_info,
            system_program_info,
            CONFIG_SEED,
            config_bump,
            Config::LEN,
            &rent,
            program_id,
        )?;
        create_pda_account(
            authority_info,
            round_info,
            system_program_info,
            ROUND_SEED,
            round_bump,
            Round::LEN,
            &rent,
            program_id,
        )?;
        create_pda_account(
            authority_info,
            coordinator_info,
            system_program_info,
            COORDINATOR_SEED,
            coordinator_bump,
            Coordinator::LEN,
            &rent,
            program_id,
        )?;

        Config::pack(
            Config::new(*authority_info.key, &params),
            &mut config_info.data.borrow_mut(),
        )?;
        Round::pack(Round::new(now), &mut round_info.data.borrow_mut())?;
        Coordinator::pack(
            Coordinator::new(params.oracle, params.subscription_id),
            &mut coordinator_info.data.borrow_mut(),
        )?;

        msg!(
            "Lottery initialized: EntranceFee={}, Interval={}s, Subscription={}, Oracle={}",
            params.entrance_fee,
            params.interval,
            params.subscription_id,
            params.oracle
        );
        Ok(())
    }

    fn process_enter_lottery(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        check_system_program(system_program_info)?;

        let config: Config = load_account(config_info, CONFIG_SEED, program_id)?;
        let mut round: Round = load_account(round_info, ROUND_SEED, program_id)?;

        let mut vault =
            RoundVault::new(round_info, Rent::get()?).with_depositor(player_info, system_program_info);
        let emitted =
            lottery::enter_lottery(&config, &mut round, &mut vault, player_info.key, amount)?;

        let players = round.number_of_players();
        Round::pack(round, &mut round_info.data.borrow_mut())?;
        events::emit_all(&emitted);

        msg!("Round now holds {} tickets", players);
        Ok(())
    }

    /// Read-only: publishes the upkeep status as return data
    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        let config: Config = load_account(config_info, CONFIG_SEED, program_id)?;
        let round: Round = load_account(round_info, ROUND_SEED, program_id)?;

        let balance = RoundVault::new(round_info, Rent::get()?).balance()?;
        let status = upkeep::check_upkeep(&config, &round, balance, Clock::get()?.unix_timestamp);

        msg!(
            "Upkeep needed: {} (open={}, time_passed={}, players={}, balance={})",
            status.upkeep_needed,
            status.is_open,
            status.time_passed,
            round.number_of_players(),
            balance
        );

        let payload = status
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&payload);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        let config: Config = load_account(config_info, CONFIG_SEED, program_id)?;
        let mut round: Round = load_account(round_info, ROUND_SEED, program_id)?;
        let mut coordinator: Coordinator =
            load_account(coordinator_info, COORDINATOR_SEED, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let vault = RoundVault::new(round_info, Rent::get()?);
        let emitted = lottery::perform_upkeep(
            &config,
            &mut round,
            &vault,
            &mut VrfCoordinator::new(&mut coordinator),
            now,
        )?;

        Coordinator::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;
        Round::pack(round, &mut round_info.data.borrow_mut())?;
        events::emit_all(&emitted);
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[RandomWord],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let coordinator: Coordinator =
            load_account(coordinator_info, COORDINATOR_SEED, program_id)?;
        if !oracle_info.is_signer || *oracle_info.key != coordinator.oracle {
            msg!("Fulfillment must be signed by oracle {}", coordinator.oracle);
            return Err(LotteryError::UnauthorizedOracle.into());
        }

        let mut round: Round = load_account(round_info, ROUND_SEED, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let mut vault = RoundVault::new(round_info, Rent::get()?).with_recipient(winner_info);
        let emitted =
            lottery::fulfill_random_words(&mut round, &mut vault, request_id, random_words, now)?;

        Round::pack(round, &mut round_info.data.borrow_mut())?;
        events::emit_all(&emitted);
        Ok(())
    }
}

/// Load a program-owned PDA account
fn load_account<T: Pack + IsInitialized>(
    account: &AccountInfo,
    seed: &[u8],
    program_id: &Pubkey,
) -> Result<T, ProgramError> {
    if account.owner != program_id {
        msg!("Account {} must be owned by the lottery program", account.key);
        return Err(LotteryError::InvalidAccount.into());
    }
    assert_pda(account, seed, program_id)?;

    let data = account.try_borrow_data()?;
    let value = T::unpack(&data)?;
    Ok(value)
}

fn check_system_program(account: &AccountInfo) -> ProgramResult {
    if *account.key != system_program::id() {
        msg!("Expected the system program, got {}", account.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}
