// Draw lifecycle: closing a round with a randomness request and settling it
// when the oracle calls back.
use solana_program::clock::UnixTimestamp;

use crate::{
    config::{NUM_WORDS, REQUEST_CONFIRMATIONS},
    error::LotteryError,
    events::LotteryEvent,
    oracle::{winner_index, RandomnessOracle, RandomnessRequest},
    payout::PayoutEngine,
    state::{Lottery, RequestId, RoundPhase},
};

impl Lottery {
    /// Parameters for the next randomness request
    pub fn randomness_request(&self) -> RandomnessRequest {
        RandomnessRequest {
            key_hash: self.key_hash,
            subscription_id: self.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.callback_gas_limit,
            num_words: NUM_WORDS,
            nonce: self.request_nonce,
        }
    }

    /// Close entry and request randomness. The gate is evaluated again here
    /// because conditions seen by a poller may no longer hold.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<LotteryEvent, LotteryError> {
        if !self.needs_upkeep(now) {
            return Err(LotteryError::UpkeepNotNeeded);
        }
        let next_nonce = self
            .request_nonce
            .checked_add(1)
            .ok_or(LotteryError::ArithmeticOverflow)?;

        let request_id = oracle.request_random_words(&self.randomness_request())?;

        self.phase = RoundPhase::Calculating;
        self.pending_request_id = Some(request_id);
        self.request_nonce = next_nonce;
        Ok(LotteryEvent::DrawRequested { request_id })
    }

    /// Settle the outstanding request.
    ///
    /// The round is reset before the payout runs, so a failed transfer
    /// surfaces as `TransferFailed` with the round already reopened.
    pub fn fulfill_random_words<P: PayoutEngine>(
        &mut self,
        request_id: &RequestId,
        random_words: &[u64],
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<LotteryEvent, LotteryError> {
        if self.pending_request_id.as_ref() != Some(request_id) {
            return Err(LotteryError::UnknownRequest);
        }
        let random_word = *random_words
            .first()
            .ok_or(LotteryError::MissingRandomWords)?;

        let index = winner_index(random_word, self.entrant_count());
        let winner = *self.entrant_at(index)?;
        let prize = self.balance();

        self.reset_round(winner, now);
        payout.pay(&winner, prize)?;

        Ok(LotteryEvent::WinnerPicked {
            winner,
            request_id: *request_id,
            prize,
        })
    }
}
