// Randomness oracle integration for the lottery program
use solana_program::{hash::hashv, msg, pubkey::Pubkey};

use crate::{error::LotteryError, state::RequestId};

/// Parameters of a single randomness request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    /// Sequence number of this request for the consumer
    pub nonce: u64,
}

/// Capability that accepts a randomness request and later answers it with
/// a callback carrying the returned id.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<RequestId, LotteryError>;
}

/// On-chain coordinator binding. The off-chain VRF service watches the
/// program log for requests and answers through `FulfillRandomWords`,
/// signing with the oracle key stored in the lottery.
pub struct CoordinatorOracle {
    consumer: Pubkey,
    slot: u64,
}

impl CoordinatorOracle {
    pub fn new(consumer: Pubkey, slot: u64) -> Self {
        Self { consumer, slot }
    }
}

impl RandomnessOracle for CoordinatorOracle {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<RequestId, LotteryError> {
        let request_id = hashv(&[
            &request.key_hash,
            self.consumer.as_ref(),
            &request.subscription_id.to_le_bytes(),
            &request.nonce.to_le_bytes(),
            &self.slot.to_le_bytes(),
        ]);

        msg!(
            "RandomWordsRequested: request_id={} consumer={} subscription={} confirmations={} callback_limit={} words={}",
            request_id,
            self.consumer,
            request.subscription_id,
            request.request_confirmations,
            request.callback_gas_limit,
            request.num_words
        );
        Ok(request_id)
    }
}

/// Pick a registry index from a random word. Plain modulo: low indices are
/// slightly favoured unless `count` divides 2^64.
pub fn winner_index(random_word: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    random_word % count
}
