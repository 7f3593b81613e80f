//! Pool registry: creation, lookup, deletion and the accounts a pool owns.

use crate::*;
use codec::{Decode, Encode};
use frame_support::{ensure, traits::Get};
use sp_io::hashing::blake2_256;
use sp_runtime::{
	traits::{AccountIdConversion, One, TrailingZeroInput, Zero},
	DispatchError, DispatchResult,
};
use sp_std::collections::btree_map::BTreeMap;

/// Orders two coins the way the pool pair orders their currencies.
pub(crate) fn sort_coins(pair: &TradingPair, a: Coin, b: Coin) -> [Coin; 2] {
	if a.currency_id == pair.first() {
		[a, b]
	} else {
		[b, a]
	}
}

impl<T: Config> Pallet<T> {
	/// Holds the funds of every queued request of every pool.
	pub fn escrow_account() -> T::AccountId {
		T::PalletId::get().into_account_truncating()
	}

	/// Deterministic reserve account of a pool with `type_id` over `pair`.
	pub fn reserve_account(type_id: PoolTypeId, pair: &TradingPair) -> Result<T::AccountId, Error<T>> {
		let seed = (b"liquidity/reserve", T::PalletId::get(), type_id, pair).using_encoded(blake2_256);
		T::AccountId::decode(&mut TrailingZeroInput::new(&seed[..])).map_err(|_| Error::<T>::ReserveAccountUnavailable)
	}

	pub fn pool_by_reserve_account(who: &T::AccountId) -> Option<PoolOf<T>> {
		PoolByReserveAccount::<T>::get(who).and_then(|pool_id| Pools::<T>::get(pool_id))
	}

	/// Ledger balances of the reserve account, `X` first.
	pub fn pool_reserves(pool: &PoolOf<T>) -> [Balance; 2] {
		[
			T::Currency::free_balance(pool.pair.first(), &pool.reserve_account),
			T::Currency::free_balance(pool.pair.second(), &pool.reserve_account),
		]
	}

	pub fn pool_share_supply(pool: &PoolOf<T>) -> Balance {
		T::Currency::total_issuance(pool.share_currency_id)
	}

	/// A depleted pool has no shares outstanding or an empty reserve. It only takes
	/// deposits large enough to initialise it again.
	pub fn is_depleted(pool: &PoolOf<T>) -> bool {
		let reserves = Self::pool_reserves(pool);
		Self::pool_share_supply(pool).is_zero() || reserves[0].is_zero() || reserves[1].is_zero()
	}

	pub(crate) fn do_create_pool(
		creator: &T::AccountId,
		pool_type_id: PoolTypeId,
		deposit_coins: Vec<Coin>,
	) -> Result<PoolId, DispatchError> {
		let params = Self::params();
		let pool_type = params.pool_type(pool_type_id).ok_or(Error::<T>::PoolTypeNotExists)?;

		let coin_count = deposit_coins.len() as u32;
		ensure!(
			coin_count == 2 &&
				coin_count >= pool_type.min_reserve_coin_num &&
				coin_count <= pool_type.max_reserve_coin_num,
			Error::<T>::BadReserveCoinCount
		);
		let pair = TradingPair::from_currency_ids(deposit_coins[0].currency_id, deposit_coins[1].currency_id)
			.ok_or(Error::<T>::IdenticalReserveCurrencies)?;
		let coins = sort_coins(&pair, deposit_coins[0], deposit_coins[1]);

		for coin in &coins {
			ensure!(coin.amount >= params.min_init_deposit_amount, Error::<T>::LessThanMinInitDeposit);
			ensure!(
				params.max_reserve_coin_amount.is_zero() || coin.amount <= params.max_reserve_coin_amount,
				Error::<T>::ExceededReserveCoinLimit
			);
		}

		let reserve_account = Self::reserve_account(pool_type_id, &pair)?;
		ensure!(!PoolByReserveAccount::<T>::contains_key(&reserve_account), Error::<T>::PoolAlreadyExists);

		let mut required: BTreeMap<CurrencyId, Balance> = BTreeMap::new();
		for coin in coins.iter().chain(params.pool_creation_fee.iter()) {
			let total = required.entry(coin.currency_id).or_default();
			*total = total.checked_add(coin.amount).ok_or(Error::<T>::InsufficientBalance)?;
		}
		for (currency_id, amount) in &required {
			ensure!(
				T::Currency::free_balance(*currency_id, creator) >= *amount,
				Error::<T>::InsufficientBalance
			);
		}

		let pool_id = Self::last_pool_id().checked_add(One::one()).ok_or(Error::<T>::PoolIdOverflow)?;
		let pool = Pool {
			id: pool_id,
			type_id: pool_type_id,
			pair,
			reserve_account: reserve_account.clone(),
			share_currency_id: CurrencyId::PoolShare(pool_id),
		};

		for coin in &coins {
			T::Currency::transfer(coin.currency_id, creator, &reserve_account, coin.amount)?;
		}
		let fee_collector = T::FeeCollector::get();
		for coin in &params.pool_creation_fee {
			T::Currency::transfer(coin.currency_id, creator, &fee_collector, coin.amount)?;
		}
		T::Currency::deposit(pool.share_currency_id, creator, params.init_pool_coin_mint_amount)?;

		let now = frame_system::Pallet::<T>::block_number();
		LastPoolId::<T>::put(pool_id);
		PoolByReserveAccount::<T>::insert(&reserve_account, pool_id);
		Pools::<T>::insert(pool_id, pool);
		PoolBatches::<T>::insert(pool_id, PoolBatch::new(pool_id, now));

		log::debug!(target: LOG_TARGET, "created pool {} over {:?}", pool_id, pair);
		Self::deposit_event(Event::PoolCreated {
			pool_id,
			creator: creator.clone(),
			pair,
			reserve_account,
			deposit_coins: coins,
			minted: params.init_pool_coin_mint_amount,
		});
		Ok(pool_id)
	}

	/// Unregisters a pool. Its batch stays until the next settlement has refunded
	/// every queued request.
	pub fn do_delete_pool(pool_id: PoolId) -> DispatchResult {
		let pool = Pools::<T>::take(pool_id).ok_or(Error::<T>::PoolNotExists)?;
		PoolByReserveAccount::<T>::remove(&pool.reserve_account);
		Self::deposit_event(Event::PoolDeleted { pool_id });
		Ok(())
	}

	/// Registers a pool snapshot, checking it against the ledger.
	pub fn import_pool_record(record: PoolRecordOf<T>) -> Result<(), &'static str> {
		let pool = &record.pool;
		let reserve_account =
			Self::reserve_account(pool.type_id, &pool.pair).map_err(|_| "reserve account unavailable")?;
		ensure!(pool.reserve_account == reserve_account, "reserve account does not match the pool pair");
		ensure!(pool.share_currency_id == CurrencyId::PoolShare(pool.id), "unexpected pool share currency");
		ensure!(Self::params().pool_type(pool.type_id).is_some(), "unknown pool type");
		ensure!(!Pools::<T>::contains_key(pool.id), "duplicate pool id");
		ensure!(!PoolByReserveAccount::<T>::contains_key(&reserve_account), "duplicate reserve account");
		ensure!(Self::pool_reserves(pool) == record.metadata.reserves, "reserve balances differ from metadata");
		ensure!(
			Self::pool_share_supply(pool) == record.metadata.pool_share_supply,
			"pool share supply differs from metadata"
		);
		ensure!(record.batch.pool_id == pool.id, "batch belongs to another pool");
		ensure!(
			record.deposit_requests.iter().all(|r| r.request.pool_id == pool.id) &&
				record.withdraw_requests.iter().all(|r| r.request.pool_id == pool.id) &&
				record.swap_requests.iter().all(|r| r.request.pool_id == pool.id),
			"request belongs to another pool"
		);

		for state in record.deposit_requests {
			DepositRequests::<T>::insert(pool.id, state.msg_index, state);
		}
		for state in record.withdraw_requests {
			WithdrawRequests::<T>::insert(pool.id, state.msg_index, state);
		}
		for state in record.swap_requests {
			SwapRequests::<T>::insert(pool.id, state.msg_index, state);
		}
		PoolBatches::<T>::insert(pool.id, record.batch);
		PoolByReserveAccount::<T>::insert(&reserve_account, pool.id);
		if pool.id > Self::last_pool_id() {
			LastPoolId::<T>::put(pool.id);
		}
		Pools::<T>::insert(pool.id, record.pool);
		Ok(())
	}

	/// Parameters and every pool with its batch and stored requests, by pool id.
	pub fn export_genesis() -> (LiquidityParams, Vec<PoolRecordOf<T>>) {
		let mut pools: Vec<PoolOf<T>> = Pools::<T>::iter_values().collect();
		pools.sort_by_key(|pool| pool.id);

		let records = pools
			.into_iter()
			.filter_map(|pool| {
				let batch = PoolBatches::<T>::get(pool.id)?;
				let mut deposit_requests: Vec<_> = DepositRequests::<T>::iter_prefix_values(pool.id).collect();
				deposit_requests.sort_by_key(|r| r.msg_index);
				let mut withdraw_requests: Vec<_> = WithdrawRequests::<T>::iter_prefix_values(pool.id).collect();
				withdraw_requests.sort_by_key(|r| r.msg_index);
				let mut swap_requests: Vec<_> = SwapRequests::<T>::iter_prefix_values(pool.id).collect();
				swap_requests.sort_by_key(|r| r.msg_index);
				let metadata = PoolMetadata {
					pool_share_supply: Self::pool_share_supply(&pool),
					reserves: Self::pool_reserves(&pool),
				};
				Some(PoolRecord { pool, metadata, batch, deposit_requests, withdraw_requests, swap_requests })
			})
			.collect();
		(Self::params(), records)
	}
}
