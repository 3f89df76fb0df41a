use crate::error::LotteryError;
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, program::invoke,
    program_error::ProgramError, pubkey::Pubkey, rent::Rent, system_instruction,
};

/// Holds the funds of the active round.
pub trait Ledger {
    /// Move `amount` from `from` into the round escrow
    fn escrow(&mut self, amount: u64, from: &Pubkey) -> ProgramResult;
    /// Move `amount` out of the escrow to `to`
    fn payout(&mut self, amount: u64, to: &Pubkey) -> ProgramResult;
    /// Funds currently escrowed for the round
    fn balance(&self) -> Result<u64, ProgramError>;
}

/// Escrow kept in the lamports of the round PDA, above its rent-exempt minimum.
///
/// Deposits arrive through a system transfer from the depositor; payouts debit the
/// program-owned round account directly.
pub struct RoundVault<'a, 'info> {
    round: &'a AccountInfo<'info>,
    rent: Rent,
    depositor: Option<(&'a AccountInfo<'info>, &'a AccountInfo<'info>)>,
    recipient: Option<&'a AccountInfo<'info>>,
}

impl<'a, 'info> RoundVault<'a, 'info> {
    pub fn new(round: &'a AccountInfo<'info>, rent: Rent) -> Self {
        Self {
            round,
            rent,
            depositor: None,
            recipient: None,
        }
    }

    /// Enable escrow from `depositor` through the system program
    pub fn with_depositor(
        mut self,
        depositor: &'a AccountInfo<'info>,
        system_program: &'a AccountInfo<'info>,
    ) -> Self {
        self.depositor = Some((depositor, system_program));
        self
    }

    /// Enable payouts to `recipient`
    pub fn with_recipient(mut self, recipient: &'a AccountInfo<'info>) -> Self {
        self.recipient = Some(recipient);
        self
    }

    fn rent_floor(&self) -> u64 {
        self.rent.minimum_balance(self.round.data_len())
    }
}

impl Ledger for RoundVault<'_, '_> {
    fn escrow(&mut self, amount: u64, from: &Pubkey) -> ProgramResult {
        let (depositor, system_program) = self.depositor.ok_or(LotteryError::InvalidAccount)?;
        if depositor.key != from {
            msg!("Depositor account {} does not match {}", depositor.key, from);
            return Err(LotteryError::InvalidAccount.into());
        }

        invoke(
            &system_instruction::transfer(from, self.round.key, amount),
            &[depositor.clone(), self.round.clone(), system_program.clone()],
        )
    }

    fn payout(&mut self, amount: u64, to: &Pubkey) -> ProgramResult {
        let recipient = self.recipient.ok_or(LotteryError::WinnerAccountMismatch)?;
        if recipient.key != to {
            msg!("Winner account {} is not the drawn player {}", recipient.key, to);
            return Err(LotteryError::WinnerAccountMismatch.into());
        }

        if !recipient.is_writable {
            msg!("Winner account {} is not writable", to);
            return Err(LotteryError::PayoutRejected.into());
        }

        let credited = recipient
            .lamports()
            .checked_add(amount)
            .ok_or(LotteryError::Overflow)?;
        if !self.rent.is_exempt(credited, recipient.data_len()) {
            msg!(
                "Winner account {} would hold {} lamports, below its rent-exempt minimum",
                to,
                credited
            );
            return Err(LotteryError::PayoutRejected.into());
        }

        let remaining = self
            .round
            .lamports()
            .checked_sub(amount)
            .filter(|remaining| *remaining >= self.rent_floor())
            .ok_or(LotteryError::Overflow)?;

        **self.round.try_borrow_mut_lamports()? = remaining;
        **recipient.try_borrow_mut_lamports()? = credited;
        Ok(())
    }

    fn balance(&self) -> Result<u64, ProgramError> {
        Ok(self.round.lamports().saturating_sub(self.rent_floor()))
    }
}
