#![cfg_attr(not(feature = "std"), no_std)]

pub mod currency;
pub use currency::{Coin, CurrencyId, TokenSymbol, TradingPair};

pub type BlockNumber = u32;
pub type Balance = u128;

/// Sequential identifier of a liquidity pool, starting at 1.
pub type PoolId = u64;
