use solana_program::{account_info::AccountInfo, msg, pubkey::Pubkey};

use crate::error::LotteryError;

/// Capability that moves the pot to the winner
pub trait PayoutEngine {
    fn pay(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), LotteryError>;
}

/// Pays out of the program-owned lottery account by moving lamports
/// directly into the winner account supplied with the callback.
pub struct LamportPayout<'a, 'b> {
    source: &'b AccountInfo<'a>,
    winner: &'b AccountInfo<'a>,
}

impl<'a, 'b> LamportPayout<'a, 'b> {
    pub fn new(source: &'b AccountInfo<'a>, winner: &'b AccountInfo<'a>) -> Self {
        Self { source, winner }
    }
}

impl PayoutEngine for LamportPayout<'_, '_> {
    fn pay(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), LotteryError> {
        if self.winner.key != recipient {
            msg!("Winner account {} does not match selected winner {}", self.winner.key, recipient);
            return Err(LotteryError::TransferFailed);
        }
        if !self.winner.is_writable {
            msg!("Winner account must be writable");
            return Err(LotteryError::TransferFailed);
        }

        let source_balance = self.source.lamports();
        let remaining = source_balance
            .checked_sub(amount)
            .ok_or(LotteryError::TransferFailed)?;
        let credited = self
            .winner
            .lamports()
            .checked_add(amount)
            .ok_or(LotteryError::TransferFailed)?;

        **self
            .source
            .try_borrow_mut_lamports()
            .map_err(|_| LotteryError::TransferFailed)? = remaining;
        **self
            .winner
            .try_borrow_mut_lamports()
            .map_err(|_| LotteryError::TransferFailed)? = credited;

        msg!("Paid {} lamports to {}", amount, recipient);
        Ok(())
    }
}
