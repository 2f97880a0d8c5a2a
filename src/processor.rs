use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    config::LotteryConfig,
    error::LotteryError,
    instruction::LotteryInstruction,
    oracle::CoordinatorOracle,
    payout::LamportPayout,
    state::{Lottery, RequestId},
    utils::lamports_to_sol,
};

pub struct Processor;

impl Processor {
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], instruction_data: &[u8]) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize { config } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, config, program_id)
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            LotteryInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            LotteryInstruction::PerformUpkeep => {
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

    fn process_initialize(accounts: &[AccountInfo], config: LotteryConfig, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer || !lottery_info.is_signer {
            msg!("Payer and lottery account must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        if lottery_info.owner == program_id {
            msg!("Lottery account is already initialized");
            return Err(LotteryError::AlreadyInitialized.into());
        }

        let clock = Clock::get()?;
        let lottery = Lottery::new(&config, *oracle_info.key, clock.unix_timestamp).map_err(fail)?;

        let space = Lottery::space(config.max_entrants);
        let rent_lamports = Rent::get()?.minimum_balance(space);
        invoke(
            &system_instruction::create_account(
                payer_info.key,
                lottery_info.key,
                rent_lamports,
                space as u64,
                program_id,
            ),
            &[payer_info.clone(), lottery_info.clone(), system_program_info.clone()],
        )?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: Fee={} SOL, Interval={}s, Oracle={}, Capacity={}",
            lamports_to_sol(config.entrance_fee),
            config.interval,
            oracle_info.key,
            config.max_entrants
        );
        Ok(())
    }

    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        let mut lottery = load(lottery_info, program_id)?;

        let event = lottery.enter(*player_info.key, amount).map_err(fail)?;

        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[player_info.clone(), lottery_info.clone(), system_program_info.clone()],
        )?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        let lottery = load(lottery_info, program_id)?;
        let check = lottery.check_upkeep(Clock::get()?.unix_timestamp);

        msg!(
            "Upkeep needed: {} (open={}, time_passed={}, players={}, balance={})",
            check.upkeep_needed(),
            check.is_open,
            check.time_passed,
            check.has_players,
            check.has_balance
        );
        let data = check
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        let mut lottery = load(lottery_info, program_id)?;

        let clock = Clock::get()?;
        let mut oracle = CoordinatorOracle::new(*lottery_info.key, clock.slot);
        let event = lottery
            .perform_upkeep(clock.unix_timestamp, &mut oracle)
            .map_err(fail)?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;
        event.emit();
        msg!(
            "Round closed with {} entrants, pot {} SOL",
            lottery.entrant_count(),
            lamports_to_sol(lottery.balance())
        );
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: RequestId,
        random_words: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut lottery = load(lottery_info, program_id)?;

        if !oracle_info.is_signer || *oracle_info.key != lottery.oracle {
            msg!("Callback from {} rejected, expected oracle {}", oracle_info.key, lottery.oracle);
            return Err(fail(LotteryError::OnlyOracleCanFulfill));
        }

        let clock = Clock::get()?;
        let mut payout = LamportPayout::new(lottery_info, winner_info);
        let result = lottery.fulfill_random_words(&request_id, random_words, clock.unix_timestamp, &mut payout);

        // Account data is written even on a failed payout; the runtime
        // discards it together with the rest of the instruction.
        lottery.pack(&mut lottery_info.data.borrow_mut())?;
        let event = result.map_err(fail)?;
        event.emit();
        Ok(())
    }
}

/// Load the lottery from a program-owned account
fn load(lottery_info: &AccountInfo, program_id: &Pubkey) -> Result<Lottery, ProgramError> {
    if lottery_info.owner != program_id {
        msg!("Lottery account must be owned by the program");
        return Err(ProgramError::IncorrectProgramId);
    }
    let lottery = Lottery::unpack(&lottery_info.data.borrow())?;
    Ok(lottery)
}

fn fail(error: LotteryError) -> ProgramError {
    msg!("Error: {}", error);
    error.into()
}
