use crate::{Balance, PoolId};
use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_runtime::RuntimeDebug;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// Declares the token symbols together with a `CurrencyId` constant for each.
macro_rules! create_currency_id {
	($(#[$meta:meta])*
	$vis:vis enum TokenSymbol {
		$($(#[$vmeta:meta])* $symbol:ident = $val:literal,)*
	}) => {
		$(#[$meta])*
		$vis enum TokenSymbol {
			$($(#[$vmeta])* $symbol = $val,)*
		}

		$(pub const $symbol: CurrencyId = CurrencyId::Token(TokenSymbol::$symbol);)*
	}
}

create_currency_id! {
	#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, PartialOrd, Ord, TypeInfo, RuntimeDebug, MaxEncodedLen)]
	#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
	pub enum TokenSymbol {
		ACA = 0,
		AUSD = 1,
		DOT = 2,
		LDOT = 3,
		ATOM = 4,
	}
}

/// Anything the ledger can hold. Pool shares are minted by the liquidity module, one
/// currency per pool.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, PartialOrd, Ord, TypeInfo, RuntimeDebug, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum CurrencyId {
	Token(TokenSymbol),
	PoolShare(PoolId),
}

impl CurrencyId {
	pub fn is_pool_share(&self) -> bool {
		matches!(self, CurrencyId::PoolShare(_))
	}
}

/// Two distinct currencies kept in ascending order. The first is the `X` side of a
/// pool and the second the `Y` side, so the pool price is `X / Y`.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, TypeInfo, RuntimeDebug, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct TradingPair(CurrencyId, CurrencyId);

impl TradingPair {
	pub fn from_currency_ids(currency_id_a: CurrencyId, currency_id_b: CurrencyId) -> Option<Self> {
		if currency_id_a == currency_id_b {
			return None
		}
		if currency_id_a < currency_id_b {
			Some(TradingPair(currency_id_a, currency_id_b))
		} else {
			Some(TradingPair(currency_id_b, currency_id_a))
		}
	}

	pub fn first(&self) -> CurrencyId {
		self.0
	}

	pub fn second(&self) -> CurrencyId {
		self.1
	}

	pub fn contains(&self, currency_id: CurrencyId) -> bool {
		self.0 == currency_id || self.1 == currency_id
	}

	/// The counterpart of `currency_id` within the pair.
	pub fn other(&self, currency_id: CurrencyId) -> Option<CurrencyId> {
		if currency_id == self.0 {
			Some(self.1)
		} else if currency_id == self.1 {
			Some(self.0)
		} else {
			None
		}
	}
}

#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, TypeInfo, RuntimeDebug, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct Coin {
	pub currency_id: CurrencyId,
	pub amount: Balance,
}

impl Coin {
	pub fn new(currency_id: CurrencyId, amount: Balance) -> Self {
		Coin { currency_id, amount }
	}
}
