use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    hash::Hash,
    program_error::ProgramError,
    program_pack::IsInitialized,
    pubkey::Pubkey,
};
use std::fmt;

use crate::{
    config::{LotteryConfig, NUM_WORDS, REQUEST_CONFIRMATIONS},
    error::LotteryError,
    events::LotteryEvent,
};

/// Correlation id binding a randomness request to its callback
pub type RequestId = Hash;

/// Phase of the round state machine
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    /// Accepting entrants and draw triggers
    Open,
    /// Entry closed, waiting on the oracle callback
    Calculating,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Open => write!(f, "OPEN"),
            RoundPhase::Calculating => write!(f, "CALCULATING"),
        }
    }
}

/// Breakdown of the automation gate
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepCheck {
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

/// Lottery account data: the round state plus the entrant registry of the
/// current round.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Lottery {
    /// Is the account initialized
    pub is_initialized: bool,
    pub phase: RoundPhase,
    /// Lamports required per entry
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    /// Time of the last completed draw (or of initialization)
    pub last_draw_timestamp: UnixTimestamp,
    /// Key allowed to deliver randomness callbacks
    pub oracle: Pubkey,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    /// Outstanding request; set iff `phase == Calculating`
    pub pending_request_id: Option<RequestId>,
    /// Number of randomness requests issued so far
    pub request_nonce: u64,
    pub recent_winner: Option<Pubkey>,
    pub rounds_completed: u64,
    /// Lamports paid in during the current round
    pub pot: u64,
    pub max_entrants: u32,
    /// Entrants of the current round in entry order
    pub entrants: Vec<Pubkey>,
}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Lottery {
    /// Serialized size without entrants (includes the registry length prefix)
    pub const HEADER_LEN: usize =
        1 + 1 + 8 + 8 + 8 + 32 + 32 + 8 + 4 + 33 + 8 + 33 + 8 + 8 + 4 + 4;

    /// Account size needed for a registry of `max_entrants`
    pub fn space(max_entrants: u32) -> usize {
        Self::HEADER_LEN + 32 * max_entrants as usize
    }

    /// Create an open round with an empty registry
    pub fn new(config: &LotteryConfig, oracle: Pubkey, now: UnixTimestamp) -> Result<Self, LotteryError> {
        config.validate()?;
        Ok(Self {
            is_initialized: true,
            phase: RoundPhase::Open,
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            last_draw_timestamp: now,
            oracle,
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            callback_gas_limit: config.callback_gas_limit,
            pending_request_id: None,
            request_nonce: 0,
            recent_winner: None,
            rounds_completed: 0,
            pot: 0,
            max_entrants: config.max_entrants,
            entrants: Vec::with_capacity(config.max_entrants as usize),
        })
    }

    /// Read the lottery from account data; trailing space is ignored
    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let mut data = src;
        let lottery = Self::deserialize(&mut data).map_err(|_| ProgramError::InvalidAccountData)?;
        if !lottery.is_initialized {
            return Err(LotteryError::NotInitialized.into());
        }
        Ok(lottery)
    }

    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        let mut data = dst;
        self.serialize(&mut data)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// Record a paid entry for `player`
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<LotteryEvent, LotteryError> {
        if amount < self.entrance_fee {
            return Err(LotteryError::InsufficientPayment);
        }
        if self.phase != RoundPhase::Open {
            return Err(LotteryError::RoundNotOpen);
        }
        if self.entrants.len() >= self.max_entrants as usize {
            return Err(LotteryError::RegistryFull);
        }
        self.pot = self
            .pot
            .checked_add(amount)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        self.entrants.push(player);
        Ok(LotteryEvent::EntryRecorded { player, amount })
    }

    pub fn entrant_count(&self) -> u64 {
        self.entrants.len() as u64
    }

    /// Accumulated pot of the current round
    pub fn balance(&self) -> u64 {
        self.pot
    }

    pub fn entrant_at(&self, index: u64) -> Result<&Pubkey, LotteryError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.entrants.get(index))
            .ok_or(LotteryError::IndexOutOfRange)
    }

    /// Evaluate every term of the automation gate at `now`
    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        let elapsed = now.saturating_sub(self.last_draw_timestamp);
        UpkeepCheck {
            is_open: self.phase == RoundPhase::Open,
            time_passed: elapsed >= 0 && elapsed as u64 >= self.interval,
            has_players: !self.entrants.is_empty(),
            has_balance: self.pot > 0,
        }
    }

    pub fn needs_upkeep(&self, now: UnixTimestamp) -> bool {
        self.check_upkeep(now).upkeep_needed()
    }

    pub fn current_phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn last_draw_timestamp(&self) -> UnixTimestamp {
        self.last_draw_timestamp
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn pending_request_id(&self) -> Option<RequestId> {
        self.pending_request_id
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    /// Close the round after a winner has been picked. Only the
    /// fulfillment path may call this.
    pub(crate) fn reset_round(&mut self, winner: Pubkey, now: UnixTimestamp) {
        self.entrants.clear();
        self.pot = 0;
        self.pending_request_id = None;
        self.recent_winner = Some(winner);
        self.rounds_completed = self.rounds_completed.saturating_add(1);
        self.last_draw_timestamp = now;
        self.phase = RoundPhase::Open;
    }
}
