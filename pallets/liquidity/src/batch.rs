//! Batch store: validation and escrow of incoming requests, and the per-pool
//! request queues they wait in until settlement.

use crate::{
	math::{mul_ceil, mul_floor},
	*,
};
use frame_support::{ensure, traits::Get};
use sp_runtime::{
	traits::{One, Saturating, Zero},
	DispatchError, DispatchResult,
};
use sp_std::cmp;

impl<T: Config> Pallet<T> {
	pub(crate) fn pool_and_batch(pool_id: PoolId) -> Result<(PoolOf<T>, PoolBatchOf<T>), Error<T>> {
		let pool = Pools::<T>::get(pool_id).ok_or(Error::<T>::PoolBatchNotExists)?;
		let batch = PoolBatches::<T>::get(pool_id).ok_or(Error::<T>::PoolBatchNotExists)?;
		Ok((pool, batch))
	}

	/// Whether any request, live or terminal, is stored for `pool_id`.
	pub fn has_requests(pool_id: PoolId) -> bool {
		DepositRequests::<T>::iter_prefix_values(pool_id).next().is_some() ||
			WithdrawRequests::<T>::iter_prefix_values(pool_id).next().is_some() ||
			SwapRequests::<T>::iter_prefix_values(pool_id).next().is_some()
	}

	/// Number of requests stored for `pool_id`, live or terminal.
	pub fn request_count(pool_id: PoolId) -> u64 {
		let count = DepositRequests::<T>::iter_prefix_values(pool_id).count() +
			WithdrawRequests::<T>::iter_prefix_values(pool_id).count() +
			SwapRequests::<T>::iter_prefix_values(pool_id).count();
		count as u64
	}

	/// The interval of an idle batch starts with its first request.
	fn open_interval_if_idle(batch: &mut PoolBatchOf<T>, now: T::BlockNumber) {
		if !Self::has_requests(batch.pool_id) {
			batch.begin_height = now;
		}
	}

	fn next_msg_index(counter: &mut MsgIndex) -> Result<MsgIndex, Error<T>> {
		let msg_index = *counter;
		*counter = counter.checked_add(1).ok_or(Error::<T>::MsgIndexOverflow)?;
		Ok(msg_index)
	}

	fn ensure_balance(who: &T::AccountId, currency_id: CurrencyId, amount: Balance) -> Result<(), Error<T>> {
		ensure!(T::Currency::free_balance(currency_id, who) >= amount, Error::<T>::InsufficientBalance);
		Ok(())
	}

	pub(crate) fn do_deposit_within_batch(
		depositor: &T::AccountId,
		pool_id: PoolId,
		deposit_coins: Vec<Coin>,
	) -> DispatchResult {
		let (pool, mut batch) = Self::pool_and_batch(pool_id)?;
		ensure!(deposit_coins.len() == 2, Error::<T>::BadDepositCoins);
		ensure!(
			TradingPair::from_currency_ids(deposit_coins[0].currency_id, deposit_coins[1].currency_id) ==
				Some(pool.pair),
			Error::<T>::BadDepositCoins
		);
		let coins = crate::pool::sort_coins(&pool.pair, deposit_coins[0], deposit_coins[1]);
		for coin in &coins {
			ensure!(!coin.amount.is_zero(), Error::<T>::ZeroAmount);
			Self::ensure_balance(depositor, coin.currency_id, coin.amount)?;
		}

		let now = frame_system::Pallet::<T>::block_number();
		Self::open_interval_if_idle(&mut batch, now);
		let msg_index = Self::next_msg_index(&mut batch.deposit_msg_index)?;

		let escrow = Self::escrow_account();
		for coin in &coins {
			T::Currency::transfer(coin.currency_id, depositor, &escrow, coin.amount)?;
		}

		let state = RequestState {
			msg_height: now,
			msg_index,
			executed: false,
			succeeded: false,
			to_be_deleted: false,
			request: DepositRequest { depositor: depositor.clone(), pool_id, deposit_coins: coins },
		};
		DepositRequests::<T>::insert(pool_id, msg_index, state);
		let batch_index = batch.index;
		PoolBatches::<T>::insert(pool_id, batch);

		Self::deposit_event(Event::DepositEnqueued {
			pool_id,
			batch_index,
			msg_index,
			depositor: depositor.clone(),
			deposit_coins: coins,
		});
		Ok(())
	}

	pub(crate) fn do_withdraw_within_batch(
		withdrawer: &T::AccountId,
		pool_id: PoolId,
		pool_share: Coin,
	) -> DispatchResult {
		let (pool, mut batch) = Self::pool_and_batch(pool_id)?;
		ensure!(pool_share.currency_id == pool.share_currency_id, Error::<T>::BadPoolShareCurrency);
		ensure!(!pool_share.amount.is_zero(), Error::<T>::ZeroAmount);
		Self::ensure_balance(withdrawer, pool_share.currency_id, pool_share.amount)?;

		let now = frame_system::Pallet::<T>::block_number();
		Self::open_interval_if_idle(&mut batch, now);
		let msg_index = Self::next_msg_index(&mut batch.withdraw_msg_index)?;

		T::Currency::transfer(pool_share.currency_id, withdrawer, &Self::escrow_account(), pool_share.amount)?;

		let state = RequestState {
			msg_height: now,
			msg_index,
			executed: false,
			succeeded: false,
			to_be_deleted: false,
			request: WithdrawRequest { withdrawer: withdrawer.clone(), pool_id, pool_share },
		};
		WithdrawRequests::<T>::insert(pool_id, msg_index, state);
		let batch_index = batch.index;
		PoolBatches::<T>::insert(pool_id, batch);

		Self::deposit_event(Event::WithdrawEnqueued {
			pool_id,
			batch_index,
			msg_index,
			withdrawer: withdrawer.clone(),
			pool_share,
		});
		Ok(())
	}

	#[allow(clippy::too_many_arguments)]
	pub(crate) fn do_swap_within_batch(
		requester: &T::AccountId,
		pool_id: PoolId,
		swap_type_id: u32,
		offer_coin: Coin,
		demand_currency_id: CurrencyId,
		order_price: FixedU128,
		offer_coin_fee: Coin,
	) -> DispatchResult {
		let (pool, mut batch) = Self::pool_and_batch(pool_id)?;
		let params = Self::params();

		ensure!(swap_type_id == DEFAULT_SWAP_TYPE_ID, Error::<T>::InvalidSwapType);
		ensure!(pool.pair.contains(offer_coin.currency_id), Error::<T>::BadOfferCurrency);
		ensure!(
			pool.pair.other(offer_coin.currency_id) == Some(demand_currency_id),
			Error::<T>::BadDemandCurrency
		);
		ensure!(
			!offer_coin.amount.is_zero() && offer_coin.amount >= params.min_offer_amount,
			Error::<T>::OfferAmountTooSmall
		);
		ensure!(!order_price.is_zero(), Error::<T>::InvalidOrderPrice);
		let expected_fee = mul_ceil(params.swap_fee_rate, offer_coin.amount).map_err(DispatchError::from)?;
		ensure!(
			offer_coin_fee.currency_id == offer_coin.currency_id && offer_coin_fee.amount == expected_fee,
			Error::<T>::BadOfferCoinFee
		);
		ensure!(!Self::is_depleted(&pool), Error::<T>::DepletedPool);

		let reserves = Self::pool_reserves(&pool);
		let offer_reserve = if offer_coin.currency_id == pool.pair.first() { reserves[0] } else { reserves[1] };
		let max_orderable = mul_floor(params.max_order_amount_ratio, offer_reserve).map_err(DispatchError::from)?;
		ensure!(offer_coin.amount <= max_orderable, Error::<T>::ExceededMaxOrderable);

		let locked = offer_coin.amount.checked_add(offer_coin_fee.amount).ok_or(Error::<T>::InsufficientBalance)?;
		Self::ensure_balance(requester, offer_coin.currency_id, locked)?;

		let now = frame_system::Pallet::<T>::block_number();
		Self::open_interval_if_idle(&mut batch, now);
		let msg_index = Self::next_msg_index(&mut batch.swap_msg_index)?;

		T::Currency::transfer(offer_coin.currency_id, requester, &Self::escrow_account(), locked)?;

		let interval_end = batch
			.begin_height
			.saturating_add(T::BlockNumber::from(params.unit_batch_height))
			.saturating_sub(One::one());
		let order_expiry_height = cmp::max(now, interval_end).saturating_add(T::OrderLifeSpan::get());

		let state = SwapRequestState {
			msg_height: now,
			msg_index,
			executed: false,
			succeeded: false,
			to_be_deleted: false,
			order_expiry_height,
			exchanged_offer_amount: 0,
			remaining_offer_amount: offer_coin.amount,
			reserved_offer_fee: offer_coin_fee.amount,
			request: SwapRequest {
				requester: requester.clone(),
				pool_id,
				swap_type_id,
				offer_coin,
				demand_currency_id,
				order_price,
				offer_coin_fee,
			},
		};
		SwapRequests::<T>::insert(pool_id, msg_index, state);
		let batch_index = batch.index;
		PoolBatches::<T>::insert(pool_id, batch);

		Self::deposit_event(Event::SwapEnqueued {
			pool_id,
			batch_index,
			msg_index,
			requester: requester.clone(),
			offer_coin,
			demand_currency_id,
			order_price,
			offer_coin_fee,
			order_expiry_height,
		});
		Ok(())
	}

	/// Deposit requests not yet marked for deletion, in arrival order.
	pub fn live_deposit_requests(pool_id: PoolId) -> Vec<DepositRequestStateOf<T>> {
		let mut requests: Vec<_> =
			DepositRequests::<T>::iter_prefix_values(pool_id).filter(|r| !r.to_be_deleted).collect();
		requests.sort_by_key(|r| r.msg_index);
		requests
	}

	pub fn live_withdraw_requests(pool_id: PoolId) -> Vec<WithdrawRequestStateOf<T>> {
		let mut requests: Vec<_> =
			WithdrawRequests::<T>::iter_prefix_values(pool_id).filter(|r| !r.to_be_deleted).collect();
		requests.sort_by_key(|r| r.msg_index);
		requests
	}

	pub fn live_swap_requests(pool_id: PoolId) -> Vec<SwapRequestStateOf<T>> {
		let mut requests: Vec<_> =
			SwapRequests::<T>::iter_prefix_values(pool_id).filter(|r| !r.to_be_deleted).collect();
		requests.sort_by_key(|r| r.msg_index);
		requests
	}

	/// Removes every terminal request of `pool_id`. Returns the number removed.
	pub(crate) fn purge_ready_requests(pool_id: PoolId) -> u64 {
		let deposits: Vec<MsgIndex> = DepositRequests::<T>::iter_prefix(pool_id)
			.filter(|(_, r)| r.to_be_deleted)
			.map(|(msg_index, _)| msg_index)
			.collect();
		let withdraws: Vec<MsgIndex> = WithdrawRequests::<T>::iter_prefix(pool_id)
			.filter(|(_, r)| r.to_be_deleted)
			.map(|(msg_index, _)| msg_index)
			.collect();
		let swaps: Vec<MsgIndex> = SwapRequests::<T>::iter_prefix(pool_id)
			.filter(|(_, r)| r.to_be_deleted)
			.map(|(msg_index, _)| msg_index)
			.collect();

		for msg_index in &deposits {
			DepositRequests::<T>::remove(pool_id, msg_index);
		}
		for msg_index in &withdraws {
			WithdrawRequests::<T>::remove(pool_id, msg_index);
		}
		for msg_index in &swaps {
			SwapRequests::<T>::remove(pool_id, msg_index);
		}
		(deposits.len() + withdraws.len() + swaps.len()) as u64
	}

	/// Prepares the requests that outlive an executed interval for the next one.
	/// Swap orders past their expiry are refunded and marked for deletion instead.
	pub(crate) fn reinit_surviving_requests(
		pool_id: PoolId,
		batch_index: u64,
		now: T::BlockNumber,
	) -> Result<u64, BatchError> {
		let mut writes = 0u64;
		for mut state in Self::live_deposit_requests(pool_id) {
			state.executed = false;
			state.succeeded = false;
			DepositRequests::<T>::insert(pool_id, state.msg_index, state);
			writes.saturating_inc();
		}
		for mut state in Self::live_withdraw_requests(pool_id) {
			state.executed = false;
			state.succeeded = false;
			WithdrawRequests::<T>::insert(pool_id, state.msg_index, state);
			writes.saturating_inc();
		}
		for mut state in Self::live_swap_requests(pool_id) {
			if now > state.order_expiry_height {
				Self::refund_swap(pool_id, batch_index, &mut state)?;
			} else {
				state.executed = false;
				state.succeeded = false;
			}
			SwapRequests::<T>::insert(pool_id, state.msg_index, state);
			writes.saturating_inc();
		}
		Ok(writes)
	}
}
