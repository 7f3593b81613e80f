#![cfg_attr(not(feature = "std"), no_std)]

pub mod currency;

pub use currency::MultiCurrency;
