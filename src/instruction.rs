use arrayref::{array_ref, array_refs};
use solana_program::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::{config::LotteryConfig, error::LotteryError, state::RequestId};

/// Encoded size of `LotteryConfig`
const CONFIG_LEN: usize = 8 + 8 + 4 + 8 + 32 + 4;

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Create and initialize the lottery account
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding the lottery account
    /// 1. `[signer, writable]` The lottery account (new keypair)
    /// 2. `[]` The oracle key allowed to deliver randomness
    /// 3. `[]` The system program
    Initialize { config: LotteryConfig },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entrance fee
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    Enter {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Evaluate the automation gate. Sets the borsh encoded `UpkeepCheck`
    /// as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckUpkeep,

    /// Close entry and request randomness (anyone may call)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The automation caller
    /// 1. `[writable]` The lottery account
    PerformUpkeep,

    /// Oracle callback: settle the pending request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle key stored in the lottery
    /// 1. `[writable]` The lottery account
    /// 2. `[writable]` The winner (entrant at `random_words[0] % entrant_count`)
    FulfillRandomWords {
        request_id: RequestId,
        random_words: Vec<u64>,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstructionData)?;

        Ok(match tag {
            0 => Self::Initialize {
                config: Self::unpack_config(rest)?,
            },
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (count, mut rest) = rest
                    .split_first()
                    .ok_or(LotteryError::InvalidInstructionData)?;
                let mut random_words = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    let (word, next) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = next;
                }
                Self::FulfillRandomWords {
                    request_id: Hash::new_from_array(request_id),
                    random_words,
                }
            }
            _ => return Err(LotteryError::InvalidInstructionData.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Initialize { config } => {
                buf.push(0);
                buf.extend_from_slice(&config.entrance_fee.to_le_bytes());
                buf.extend_from_slice(&config.interval.to_le_bytes());
                buf.extend_from_slice(&config.callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&config.subscription_id.to_le_bytes());
                buf.extend_from_slice(&config.key_hash);
                buf.extend_from_slice(&config.max_entrants.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(request_id.as_ref());
                // words beyond 255 are never read
                let count = random_words.len().min(u8::MAX as usize);
                buf.push(count as u8);
                for word in &random_words[..count] {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        buf
    }

    fn unpack_config(input: &[u8]) -> Result<LotteryConfig, ProgramError> {
        if input.len() < CONFIG_LEN {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let src = array_ref![input, 0, CONFIG_LEN];
        let (entrance_fee, interval, callback_gas_limit, subscription_id, key_hash, max_entrants) =
            array_refs![src, 8, 8, 4, 8, 32, 4];

        Ok(LotteryConfig {
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            subscription_id: u64::from_le_bytes(*subscription_id),
            key_hash: *key_hash,
            max_entrants: u32::from_le_bytes(*max_entrants),
        })
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|_| LotteryError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    lottery_account: &Pubkey,
    oracle: &Pubkey,
    config: LotteryConfig,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*lottery_account, true),
            AccountMeta::new_readonly(*oracle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: LotteryInstruction::Initialize { config }.pack(),
    }
}

/// Create enter instruction
pub fn enter(program_id: &Pubkey, player: &Pubkey, lottery_account: &Pubkey, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*player, true),
            AccountMeta::new(*lottery_account, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: LotteryInstruction::Enter { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, lottery_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*lottery_account, false)],
        data: LotteryInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, caller: &Pubkey, lottery_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*lottery_account, false),
        ],
        data: LotteryInstruction::PerformUpkeep.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle: &Pubkey,
    lottery_account: &Pubkey,
    winner: &Pubkey,
    request_id: RequestId,
    random_words: Vec<u64>,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*oracle, true),
            AccountMeta::new(*lottery_account, false),
            AccountMeta::new(*winner, false),
        ],
        data: LotteryInstruction::FulfillRandomWords {
            request_id,
            random_words,
        }
        .pack(),
    }
}
