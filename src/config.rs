// Lottery configuration supplied once at initialization
use crate::error::LotteryError;

/// 0.01 SOL
pub const DEFAULT_ENTRANCE_FEE: u64 = 10_000_000;
/// Seconds between draws
pub const DEFAULT_INTERVAL: u64 = 30;
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
pub const DEFAULT_MAX_ENTRANTS: u32 = 128;

/// Upper bound on registry capacity; keeps the lottery account under the
/// 10 KiB limit for accounts created through CPI.
pub const MAX_ENTRANTS: u32 = 256;

/// Confirmations the oracle waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LotteryConfig {
    /// Fixed lamport amount required per entry
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    /// Compute budget the oracle should grant its callback. Opaque here.
    pub callback_gas_limit: u32,
    /// Oracle subscription paying for requests. Opaque here.
    pub subscription_id: u64,
    /// Oracle lane selecting the price/latency tier. Opaque here.
    pub key_hash: [u8; 32],
    /// Capacity of the entrant registry
    pub max_entrants: u32,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            entrance_fee: DEFAULT_ENTRANCE_FEE,
            interval: DEFAULT_INTERVAL,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            subscription_id: 0,
            key_hash: [0u8; 32],
            max_entrants: DEFAULT_MAX_ENTRANTS,
        }
    }
}

impl LotteryConfig {
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.entrance_fee == 0 {
            return Err(LotteryError::InvalidConfig);
        }
        if self.callback_gas_limit == 0 {
            return Err(LotteryError::InvalidConfig);
        }
        if self.max_entrants == 0 || self.max_entrants > MAX_ENTRANTS {
            return Err(LotteryError::InvalidConfig);
        }
        if i64::try_from(self.interval).is_err() {
            return Err(LotteryError::InvalidConfig);
        }
        Ok(())
    }
}
