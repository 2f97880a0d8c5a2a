use solana_program::program_error::ProgramError;
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Lottery account is already initialized")]
    AlreadyInitialized,

    #[error("Lottery account is not initialized")]
    NotInitialized,

    /// Initialization parameters out of range
    #[error("Invalid lottery configuration")]
    InvalidConfig,

    /// Payment below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment,

    /// Entry or draw attempted while a draw is being calculated
    #[error("Round is not open")]
    RoundNotOpen,

    #[error("Entrant registry is full")]
    RegistryFull,

    /// Draw triggered while the upkeep gate is closed
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Callback does not match the outstanding randomness request
    #[error("Unknown or stale randomness request")]
    UnknownRequest,

    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    /// Callback was not signed by the configured oracle
    #[error("Only the configured oracle can fulfill randomness requests")]
    OnlyOracleCanFulfill,

    #[error("Entrant index out of range")]
    IndexOutOfRange,

    /// Prize could not be transferred to the winner
    #[error("Prize transfer failed")]
    TransferFailed,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
