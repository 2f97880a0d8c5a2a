// Autolotto: a periodically drawn lottery settled by an external randomness oracle

pub mod config;
pub mod draw;
pub mod error;
pub mod events;
pub mod instruction;
pub mod oracle;
pub mod payout;
pub mod processor;
pub mod state;
pub mod utils;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
