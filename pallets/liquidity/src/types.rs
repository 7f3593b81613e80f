use codec::{Decode, Encode, MaxEncodedLen};
use primitives::{Balance, Coin, PoolId, TradingPair};
use scale_info::TypeInfo;
use sp_runtime::{
	traits::{One, Zero},
	FixedPointNumber, FixedU128, RuntimeDebug,
};
use sp_std::prelude::*;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

pub type PoolTypeId = u32;
pub type MsgIndex = u64;

/// The only swap type: uniform clearing price auction.
pub const DEFAULT_SWAP_TYPE_ID: u32 = 1;
pub const DEFAULT_POOL_TYPE_ID: PoolTypeId = 1;

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct PoolType {
	pub id: PoolTypeId,
	pub name: Vec<u8>,
	pub min_reserve_coin_num: u32,
	pub max_reserve_coin_num: u32,
	pub description: Vec<u8>,
}

/// Parameters read on every request and settlement.
#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct LiquidityParams {
	pub pool_types: Vec<PoolType>,
	/// Each reserve coin of a new (or re-initialised) pool must be at least this.
	pub min_init_deposit_amount: Balance,
	/// Pool shares minted to the creator of a pool.
	pub init_pool_coin_mint_amount: Balance,
	/// Upper bound of each reserve, `0` for no bound.
	pub max_reserve_coin_amount: Balance,
	pub pool_creation_fee: Vec<Coin>,
	pub swap_fee_rate: FixedU128,
	pub withdraw_fee_rate: FixedU128,
	/// A swap may offer at most this share of the pool's reserve of the offer currency.
	pub max_order_amount_ratio: FixedU128,
	pub min_offer_amount: Balance,
	/// Number of blocks a batch accumulates before it is settled.
	pub unit_batch_height: u32,
}

impl Default for LiquidityParams {
	fn default() -> Self {
		LiquidityParams {
			pool_types: vec![PoolType {
				id: DEFAULT_POOL_TYPE_ID,
				name: b"StandardLiquidityPool".to_vec(),
				min_reserve_coin_num: 2,
				max_reserve_coin_num: 2,
				description: b"Standard liquidity pool with pool price function X/Y and two reserve coins"
					.to_vec(),
			}],
			min_init_deposit_amount: 1_000_000,
			init_pool_coin_mint_amount: 1_000_000,
			max_reserve_coin_amount: 0,
			pool_creation_fee: vec![],
			swap_fee_rate: FixedU128::saturating_from_rational(3, 1000),
			withdraw_fee_rate: FixedU128::saturating_from_rational(3, 1000),
			max_order_amount_ratio: FixedU128::saturating_from_rational(1, 10),
			min_offer_amount: 100,
			unit_batch_height: 1,
		}
	}
}

impl LiquidityParams {
	pub fn validate(&self) -> Result<(), &'static str> {
		if self.pool_types.is_empty() {
			return Err("at least one pool type is required")
		}
		for (i, pool_type) in self.pool_types.iter().enumerate() {
			if pool_type.min_reserve_coin_num != 2 || pool_type.max_reserve_coin_num != 2 {
				return Err("pool types must hold exactly two reserve coins")
			}
			if self.pool_types[..i].iter().any(|t| t.id == pool_type.id) {
				return Err("duplicate pool type id")
			}
		}
		if self.min_init_deposit_amount.is_zero() || self.init_pool_coin_mint_amount.is_zero() {
			return Err("initial deposit and mint amounts must be positive")
		}
		if self.pool_creation_fee.iter().any(|c| c.amount.is_zero()) {
			return Err("pool creation fee coins must be positive")
		}
		if self.swap_fee_rate >= FixedU128::one() || self.withdraw_fee_rate >= FixedU128::one() {
			return Err("fee rates must be below one")
		}
		if self.max_order_amount_ratio.is_zero() || self.max_order_amount_ratio > FixedU128::one() {
			return Err("max order amount ratio must be in (0, 1]")
		}
		if self.unit_batch_height.is_zero() {
			return Err("unit batch height must be positive")
		}
		Ok(())
	}

	pub fn pool_type(&self, id: PoolTypeId) -> Option<&PoolType> {
		self.pool_types.iter().find(|t| t.id == id)
	}
}

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct Pool<AccountId> {
	pub id: PoolId,
	pub type_id: PoolTypeId,
	/// Reserve currencies, `X` first.
	pub pair: TradingPair,
	pub reserve_account: AccountId,
	pub share_currency_id: primitives::CurrencyId,
}

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct PoolBatch<BlockNumber> {
	pub pool_id: PoolId,
	pub index: u64,
	pub begin_height: BlockNumber,
	/// Next message index handed to a deposit request.
	pub deposit_msg_index: MsgIndex,
	pub withdraw_msg_index: MsgIndex,
	pub swap_msg_index: MsgIndex,
	/// Set once the current interval has been settled.
	pub executed: bool,
}

impl<BlockNumber> PoolBatch<BlockNumber> {
	pub fn new(pool_id: PoolId, begin_height: BlockNumber) -> Self {
		PoolBatch {
			pool_id,
			index: 1,
			begin_height,
			deposit_msg_index: 1,
			withdraw_msg_index: 1,
			swap_msg_index: 1,
			executed: false,
		}
	}
}

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct DepositRequest<AccountId> {
	pub depositor: AccountId,
	pub pool_id: PoolId,
	/// Sorted like the pool's pair.
	pub deposit_coins: [Coin; 2],
}

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct WithdrawRequest<AccountId> {
	pub withdrawer: AccountId,
	pub pool_id: PoolId,
	pub pool_share: Coin,
}

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct SwapRequest<AccountId> {
	pub requester: AccountId,
	pub pool_id: PoolId,
	pub swap_type_id: u32,
	pub offer_coin: Coin,
	pub demand_currency_id: primitives::CurrencyId,
	/// Limit price in units of `X` per `Y`.
	pub order_price: FixedU128,
	pub offer_coin_fee: Coin,
}

/// A deposit or withdraw request waiting in a batch.
#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct RequestState<Request, BlockNumber> {
	pub msg_height: BlockNumber,
	pub msg_index: MsgIndex,
	pub executed: bool,
	pub succeeded: bool,
	pub to_be_deleted: bool,
	pub request: Request,
}

pub type DepositRequestState<AccountId, BlockNumber> =
	RequestState<DepositRequest<AccountId>, BlockNumber>;
pub type WithdrawRequestState<AccountId, BlockNumber> =
	RequestState<WithdrawRequest<AccountId>, BlockNumber>;

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct SwapRequestState<AccountId, BlockNumber> {
	pub msg_height: BlockNumber,
	pub msg_index: MsgIndex,
	pub executed: bool,
	pub succeeded: bool,
	pub to_be_deleted: bool,
	pub order_expiry_height: BlockNumber,
	/// Offer amount already sold into the pool.
	pub exchanged_offer_amount: Balance,
	pub remaining_offer_amount: Balance,
	/// Offer fee still held in escrow.
	pub reserved_offer_fee: Balance,
	pub request: SwapRequest<AccountId>,
}

#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct PoolMetadata {
	pub pool_share_supply: Balance,
	/// Ledger balances of the reserve account, `X` first.
	pub reserves: [Balance; 2],
}

/// Snapshot of one pool and everything queued against it.
#[derive(Encode, Decode, Clone, Eq, PartialEq, RuntimeDebug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct PoolRecord<AccountId, BlockNumber> {
	pub pool: Pool<AccountId>,
	pub metadata: PoolMetadata,
	pub batch: PoolBatch<BlockNumber>,
	pub deposit_requests: Vec<DepositRequestState<AccountId, BlockNumber>>,
	pub withdraw_requests: Vec<WithdrawRequestState<AccountId, BlockNumber>>,
	pub swap_requests: Vec<SwapRequestState<AccountId, BlockNumber>>,
}

#[derive(Encode, Decode, Clone, Copy, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub enum MatchType {
	Exact,
	Fractional,
	NoMatch,
}

#[derive(Encode, Decode, Clone, Copy, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub enum PriceDirection {
	Increase,
	Decrease,
	Stay,
}
