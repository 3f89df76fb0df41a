use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Instruction data could not be decoded
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Lottery is already initialized")]
    AlreadyInitialized,

    /// An account is not the expected PDA or is not owned by the program
    #[error("Invalid lottery account")]
    InvalidAccount,

    #[error("Invalid lottery configuration")]
    InvalidConfig,

    /// Deposit is below the entrance fee
    #[error("Deposit is below the entrance fee")]
    InsufficientFee,

    /// Entries are closed while a winner is being calculated
    #[error("Lottery round is not open")]
    RoundNotOpen,

    #[error("Lottery round has no free ticket slots")]
    RoundFull,

    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment does not match the pending randomness request
    #[error("Unknown randomness request")]
    UnknownRequest,

    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    #[error("Round has no players to draw from")]
    EmptyRound,

    /// Fulfillment was not signed by the registered oracle
    #[error("Fulfillment not signed by the oracle")]
    UnauthorizedOracle,

    #[error("Winner account does not match the drawn player")]
    WinnerAccountMismatch,

    /// Prize transfer was refused by the recipient
    #[error("Prize payout rejected")]
    PayoutRejected,

    #[error("Invalid randomness subscription")]
    InvalidSubscription,

    #[error("Randomness request rejected by the coordinator")]
    RandomnessRequestRejected,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
