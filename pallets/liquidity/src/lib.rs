#![cfg_attr(not(feature = "std"), no_std)]

//! Batch-auction liquidity pools.
//!
//! Every pool holds two reserve coins and prices `X` in units of `Y` as `X / Y`.
//! Deposits, withdrawals and swap orders are not applied when they arrive. They are
//! escrowed and queued in the pool's batch, and once per batch interval the whole
//! batch is settled in block finalization: swap orders clear against each other
//! and the pool at one uniform price, then deposits and withdrawals are applied.
//!
//! The module never touches token balances directly. All funds move through
//! [`Config::Currency`].

pub use pallet::*;

#[cfg(test)]
mod mock;


mod batch;
pub mod invariants;
mod lifecycle;
pub mod math;
pub mod matching;
pub mod migrations;
pub mod order_book;
mod pool;
mod settlement;
pub mod types;

use frame_support::{pallet_prelude::*, traits::StorageVersion, PalletId};
use frame_system::pallet_prelude::*;
use module_traits::MultiCurrency;
use primitives::{Balance, Coin, CurrencyId, PoolId, TradingPair};
use sp_runtime::FixedU128;
use sp_std::prelude::*;

pub use matching::BatchError;
pub use types::*;

pub const LOG_TARGET: &str = "runtime::liquidity";

const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

type AccountIdOf<T> = <T as frame_system::Config>::AccountId;
type BlockNumberOf<T> = <T as frame_system::Config>::BlockNumber;

pub type PoolOf<T> = Pool<AccountIdOf<T>>;
pub type PoolBatchOf<T> = PoolBatch<BlockNumberOf<T>>;
pub type DepositRequestStateOf<T> = DepositRequestState<AccountIdOf<T>, BlockNumberOf<T>>;
pub type WithdrawRequestStateOf<T> = WithdrawRequestState<AccountIdOf<T>, BlockNumberOf<T>>;
pub type SwapRequestStateOf<T> = SwapRequestState<AccountIdOf<T>, BlockNumberOf<T>>;
pub type PoolRecordOf<T> = PoolRecord<AccountIdOf<T>, BlockNumberOf<T>>;

#[frame_support::pallet]
pub mod pallet {
	use super::*;

	#[pallet::pallet]
	#[pallet::generate_store(pub(super) trait Store)]
	#[pallet::storage_version(STORAGE_VERSION)]
	#[pallet::without_storage_info]
	pub struct Pallet<T>(_);

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		type Currency: MultiCurrency<Self::AccountId, CurrencyId = CurrencyId, Balance = Balance>;

		/// Owner of the escrow account and seed of every reserve account.
		#[pallet::constant]
		type PalletId: Get<PalletId>;

		/// Blocks a swap order survives after the interval it was placed in.
		#[pallet::constant]
		type OrderLifeSpan: Get<Self::BlockNumber>;

		/// Receives the pool creation fee.
		#[pallet::constant]
		type FeeCollector: Get<Self::AccountId>;

		/// Check every batch match and the escrow balance after settlement. A failed
		/// check aborts the block.
		#[pallet::constant]
		type EnableInvariantChecks: Get<bool>;

		/// Origin allowed to delete pools and replace parameters.
		type UpdateOrigin: EnsureOrigin<<Self as frame_system::Config>::RuntimeOrigin>;
	}

	#[pallet::storage]
	#[pallet::getter(fn params)]
	pub type Params<T: Config> = StorageValue<_, LiquidityParams, ValueQuery>;

	#[pallet::storage]
	#[pallet::getter(fn last_pool_id)]
	pub type LastPoolId<T: Config> = StorageValue<_, PoolId, ValueQuery>;

	#[pallet::storage]
	#[pallet::getter(fn pool)]
	pub type Pools<T: Config> = StorageMap<_, Twox64Concat, PoolId, PoolOf<T>, OptionQuery>;

	#[pallet::storage]
	pub type PoolByReserveAccount<T: Config> =
		StorageMap<_, Blake2_128Concat, T::AccountId, PoolId, OptionQuery>;

	#[pallet::storage]
	#[pallet::getter(fn pool_batch)]
	pub type PoolBatches<T: Config> = StorageMap<_, Twox64Concat, PoolId, PoolBatchOf<T>, OptionQuery>;

	#[pallet::storage]
	#[pallet::getter(fn deposit_request)]
	pub type DepositRequests<T: Config> = StorageDoubleMap<
		_,
		Twox64Concat,
		PoolId,
		Twox64Concat,
		MsgIndex,
		DepositRequestStateOf<T>,
		OptionQuery,
	>;

	#[pallet::storage]
	#[pallet::getter(fn withdraw_request)]
	pub type WithdrawRequests<T: Config> = StorageDoubleMap<
		_,
		Twox64Concat,
		PoolId,
		Twox64Concat,
		MsgIndex,
		WithdrawRequestStateOf<T>,
		OptionQuery,
	>;

	#[pallet::storage]
	#[pallet::getter(fn swap_request)]
	pub type SwapRequests<T: Config> = StorageDoubleMap<
		_,
		Twox64Concat,
		PoolId,
		Twox64Concat,
		MsgIndex,
		SwapRequestStateOf<T>,
		OptionQuery,
	>;

	#[pallet::genesis_config]
	pub struct GenesisConfig<T: Config> {
		pub params: LiquidityParams,
		pub pool_records: Vec<PoolRecordOf<T>>,
	}

	#[cfg(feature = "std")]
	impl<T: Config> Default for GenesisConfig<T> {
		fn default() -> GenesisConfig<T> {
			GenesisConfig { params: Default::default(), pool_records: vec![] }
		}
	}

	#[pallet::genesis_build]
	impl<T: Config> GenesisBuild<T> for GenesisConfig<T> {
		fn build(&self) {
			assert!(self.params.validate().is_ok(), "Invalid liquidity params");
			Params::<T>::put(self.params.clone());
			for record in &self.pool_records {
				if let Err(e) = Pallet::<T>::import_pool_record(record.clone()) {
					panic!("Invalid pool record {}: {}", record.pool.id, e);
				}
			}
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		PoolCreated {
			pool_id: PoolId,
			creator: T::AccountId,
			pair: TradingPair,
			reserve_account: T::AccountId,
			deposit_coins: [Coin; 2],
			minted: Balance,
		},
		PoolDeleted { pool_id: PoolId },
		DepositEnqueued {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			depositor: T::AccountId,
			deposit_coins: [Coin; 2],
		},
		WithdrawEnqueued {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			withdrawer: T::AccountId,
			pool_share: Coin,
		},
		SwapEnqueued {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			requester: T::AccountId,
			offer_coin: Coin,
			demand_currency_id: CurrencyId,
			order_price: FixedU128,
			offer_coin_fee: Coin,
			order_expiry_height: T::BlockNumber,
		},
		DepositExecuted {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			depositor: T::AccountId,
			accepted: [Balance; 2],
			refunded: [Balance; 2],
			minted: Balance,
		},
		/// A deposit could not be applied and was returned in full.
		DepositRefunded { pool_id: PoolId, batch_index: u64, msg_index: MsgIndex, depositor: T::AccountId },
		WithdrawExecuted {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			withdrawer: T::AccountId,
			pool_share: Balance,
			withdrawn: [Balance; 2],
		},
		WithdrawRefunded { pool_id: PoolId, batch_index: u64, msg_index: MsgIndex, withdrawer: T::AccountId },
		/// The swap orders of a batch cleared at `swap_price`.
		SwapBatchMatched {
			pool_id: PoolId,
			batch_index: u64,
			match_type: MatchType,
			price_direction: PriceDirection,
			swap_price: FixedU128,
		},
		SwapTransacted {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			requester: T::AccountId,
			transacted: Balance,
			exchanged: Balance,
			fee: Balance,
			remaining: Balance,
		},
		/// The unfilled remainder of an order and its unused fee went back to the requester.
		SwapRefunded {
			pool_id: PoolId,
			batch_index: u64,
			msg_index: MsgIndex,
			requester: T::AccountId,
			refunded: Balance,
		},
		BatchExecuted { pool_id: PoolId, batch_index: u64, executed_requests: u32 },
		ParamsUpdated,
	}

	#[pallet::error]
	pub enum Error<T> {
		PoolTypeNotExists,
		BadReserveCoinCount,
		IdenticalReserveCurrencies,
		/// A reserve coin of a new or re-initialised pool is below the minimum.
		LessThanMinInitDeposit,
		ExceededReserveCoinLimit,
		PoolAlreadyExists,
		InsufficientBalance,
		ReserveAccountUnavailable,
		PoolNotExists,
		PoolBatchNotExists,
		/// Deposit coins must be one coin of each reserve currency.
		BadDepositCoins,
		ZeroAmount,
		BadPoolShareCurrency,
		BadOfferCurrency,
		BadDemandCurrency,
		OfferAmountTooSmall,
		InvalidOrderPrice,
		/// The fee coin must be `ceil(offer * swap_fee_rate)` of the offer currency.
		BadOfferCoinFee,
		ExceededMaxOrderable,
		InvalidSwapType,
		/// One reserve of the pool is empty.
		DepletedPool,
		DepositTooSmall,
		WithdrawTooSmall,
		InvalidParams,
		PoolIdOverflow,
		MsgIndexOverflow,
	}

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
		fn on_initialize(now: T::BlockNumber) -> Weight {
			match Self::delete_and_init_pool_batches(now) {
				Ok(weight) => weight.saturating_add(Self::pool_batches_finalize_weight(now)),
				Err(e) => abort_block(now, e),
			}
		}

		fn on_finalize(now: T::BlockNumber) {
			if let Err(e) = Self::execute_pool_batches(now) {
				abort_block(now, e)
			}
		}
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Create a pool from two reserve coins. The pool is live immediately.
		#[pallet::weight(
			10_000 + T::DbWeight::get().reads_writes(8, 10).ref_time() +
				Pallet::<T>::batch_settlement_weight().ref_time()
		)]
		pub fn create_pool(
			origin: OriginFor<T>,
			pool_type_id: PoolTypeId,
			deposit_coins: Vec<Coin>,
		) -> DispatchResult {
			let creator = ensure_signed(origin)?;
			Self::do_create_pool(&creator, pool_type_id, deposit_coins)?;
			Ok(())
		}

		#[pallet::weight(10_000 + T::DbWeight::get().reads_writes(1, 2).ref_time())]
		pub fn delete_pool(origin: OriginFor<T>, pool_id: PoolId) -> DispatchResult {
			T::UpdateOrigin::ensure_origin(origin)?;
			Self::do_delete_pool(pool_id)
		}

		#[pallet::weight(
			10_000 + T::DbWeight::get().reads_writes(6, 5).ref_time() +
				Pallet::<T>::request_settlement_weight().ref_time()
		)]
		pub fn deposit_within_batch(
			origin: OriginFor<T>,
			pool_id: PoolId,
			deposit_coins: Vec<Coin>,
		) -> DispatchResult {
			let depositor = ensure_signed(origin)?;
			Self::do_deposit_within_batch(&depositor, pool_id, deposit_coins)
		}

		#[pallet::weight(
			10_000 + T::DbWeight::get().reads_writes(5, 4).ref_time() +
				Pallet::<T>::request_settlement_weight().ref_time()
		)]
		pub fn withdraw_within_batch(
			origin: OriginFor<T>,
			pool_id: PoolId,
			pool_share: Coin,
		) -> DispatchResult {
			let withdrawer = ensure_signed(origin)?;
			Self::do_withdraw_within_batch(&withdrawer, pool_id, pool_share)
		}

		/// Place a limit order at `order_price`, in units of the pool's `X` per `Y`.
		#[pallet::weight(
			10_000 + T::DbWeight::get().reads_writes(7, 4).ref_time() +
				Pallet::<T>::request_settlement_weight().ref_time()
		)]
		pub fn swap_within_batch(
			origin: OriginFor<T>,
			pool_id: PoolId,
			swap_type_id: u32,
			offer_coin: Coin,
			demand_currency_id: CurrencyId,
			order_price: FixedU128,
			offer_coin_fee: Coin,
		) -> DispatchResult {
			let requester = ensure_signed(origin)?;
			Self::do_swap_within_batch(
				&requester,
				pool_id,
				swap_type_id,
				offer_coin,
				demand_currency_id,
				order_price,
				offer_coin_fee,
			)
		}

		#[pallet::weight(10_000 + T::DbWeight::get().writes(1).ref_time())]
		pub fn set_params(origin: OriginFor<T>, params: LiquidityParams) -> DispatchResult {
			T::UpdateOrigin::ensure_origin(origin)?;
			params.validate().map_err(|e| {
				log::debug!(target: LOG_TARGET, "rejected params: {}", e);
				Error::<T>::InvalidParams
			})?;
			Params::<T>::put(params);
			Self::deposit_event(Event::ParamsUpdated);
			Ok(())
		}
	}
}

/// Settlement found the engine or the ledger inconsistent. Producing this block
/// would commit state other nodes might not reproduce.
fn abort_block<BlockNumber: core::fmt::Debug>(now: BlockNumber, e: BatchError) -> ! {
	log::error!(target: LOG_TARGET, "aborting block {:?}: {:?}", now, e);
	panic!("liquidity batch settlement failed at block {:?}: {:?}", now, e)
}
