use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};
use std::fmt;

use crate::state::RequestId;

/// Signals produced by lottery state transitions
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    /// A paid entry joined the current round
    EntryRecorded { player: Pubkey, amount: u64 },
    /// Entry closed and randomness was requested
    DrawRequested { request_id: RequestId },
    /// The round was drawn and its pot paid out
    WinnerPicked {
        winner: Pubkey,
        request_id: RequestId,
        prize: u64,
    },
}

impl LotteryEvent {
    /// Log the event as text and as a borsh data record for indexers
    pub fn emit(&self) {
        msg!("{}", self);
        if let Ok(bytes) = self.try_to_vec() {
            sol_log_data(&[bytes.as_slice()]);
        }
    }
}

impl fmt::Display for LotteryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotteryEvent::EntryRecorded { player, amount } => {
                write!(f, "EntryRecorded: player={} amount={}", player, amount)
            }
            LotteryEvent::DrawRequested { request_id } => {
                write!(f, "DrawRequested: request_id={}", request_id)
            }
            LotteryEvent::WinnerPicked {
                winner,
                request_id,
                prize,
            } => write!(
                f,
                "WinnerPicked: winner={} request_id={} prize={}",
                winner, request_id, prize
            ),
        }
    }
}
