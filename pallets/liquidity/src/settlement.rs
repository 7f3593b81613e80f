//! Settlement of a batch: applies swap fills, deposits and withdrawals to the pool
//! reserves and pays out or refunds every escrowed request.

use crate::{
	math::{mul_div_floor, price_from_dec, trunc_balance, withdraw_amount},
	matching::{match_orders, BatchMatch},
	order_book::SwapOrder,
	*,
};
use frame_support::{ensure, traits::Get, transactional};
use sp_runtime::{traits::Zero, DispatchError, DispatchResult};
use sp_std::cmp;

/// A ledger movement the settlement relies on failed.
fn ledger(result: DispatchResult, what: &'static str) -> Result<(), BatchError> {
	result.map_err(|e| {
		log::error!(target: LOG_TARGET, "{}: {:?}", what, e);
		BatchError::Fatal(what)
	})
}

pub(crate) struct DepositOutcome {
	pub accepted: [Balance; 2],
	pub refunded: [Balance; 2],
	pub minted: Balance,
}

impl<T: Config> Pallet<T> {
	/// Matches and settles the swap orders of the batch that have not run in this
	/// interval yet. Returns the number of orders processed.
	pub(crate) fn execute_swaps(
		pool: &PoolOf<T>,
		batch: &PoolBatchOf<T>,
		now: T::BlockNumber,
	) -> Result<u32, BatchError> {
		let mut states: Vec<SwapRequestStateOf<T>> =
			Self::live_swap_requests(pool.id).into_iter().filter(|s| !s.executed).collect();
		if states.is_empty() {
			return Ok(0)
		}
		for state in states.iter_mut() {
			state.executed = true;
		}

		let reserves = Self::pool_reserves(pool);
		let batch_match = if reserves[0].is_zero() || reserves[1].is_zero() {
			log::warn!(target: LOG_TARGET, "pool {} is depleted, skipping swap matching", pool.id);
			None
		} else {
			let orders: Vec<SwapOrder> = states.iter().map(|state| SwapOrder::from_state(&pool.pair, state)).collect();
			match match_orders(&orders, reserves[0], reserves[1], T::EnableInvariantChecks::get()) {
				Ok(batch_match) => batch_match,
				Err(BatchError::Arithmetic(e)) => {
					log::warn!(
						target: LOG_TARGET,
						"skipping swap matching of pool {} batch {}: {:?}",
						pool.id,
						batch.index,
						e
					);
					None
				},
				Err(fatal) => return Err(fatal),
			}
		};

		if let Some(batch_match) = batch_match {
			Self::apply_batch_match(pool, batch, &batch_match, &mut states)?;
		}

		for state in states.iter_mut() {
			if !state.to_be_deleted && now >= state.order_expiry_height {
				Self::refund_swap(pool.id, batch.index, state)?;
			}
		}

		let count = states.len() as u32;
		for state in states {
			SwapRequests::<T>::insert(pool.id, state.msg_index, state);
		}
		Ok(count)
	}

	/// Moves every filled offer into the reserve before paying any requester out of it.
	fn apply_batch_match(
		pool: &PoolOf<T>,
		batch: &PoolBatchOf<T>,
		batch_match: &BatchMatch,
		states: &mut [SwapRequestStateOf<T>],
	) -> Result<(), BatchError> {
		let escrow = Self::escrow_account();
		let mut payouts: Vec<(T::AccountId, CurrencyId, Balance)> = Vec::new();

		for result in batch_match.results() {
			let state = states
				.iter_mut()
				.find(|s| s.msg_index == result.msg_index)
				.ok_or(BatchError::Fatal("fill for an unknown order"))?;
			let transacted =
				trunc_balance(result.transacted_amount).map_err(|_| BatchError::Fatal("negative fill"))?;
			let exchanged = trunc_balance(result.exchanged_demand_amount)
				.map_err(|_| BatchError::Fatal("negative exchanged amount"))?;
			let remaining = state
				.remaining_offer_amount
				.checked_sub(transacted)
				.ok_or(BatchError::Fatal("fill exceeds the remaining offer"))?;
			// a completed order pays whatever fee is still reserved
			let fee = if remaining.is_zero() {
				state.reserved_offer_fee
			} else {
				let fee = trunc_balance(result.offer_fee_amount)
					.map_err(|_| BatchError::Fatal("negative offer fee"))?;
				cmp::min(fee, state.reserved_offer_fee)
			};

			let offer_currency = state.request.offer_coin.currency_id;
			ledger(
				T::Currency::transfer(
					offer_currency,
					&escrow,
					&pool.reserve_account,
					transacted.saturating_add(fee),
				),
				"escrow cannot cover a filled offer",
			)?;
			payouts.push((state.request.requester.clone(), state.request.demand_currency_id, exchanged));

			state.remaining_offer_amount = remaining;
			state.exchanged_offer_amount = state.exchanged_offer_amount.saturating_add(transacted);
			state.reserved_offer_fee = state.reserved_offer_fee.saturating_sub(fee);
			state.succeeded = true;
			state.to_be_deleted = remaining.is_zero();

			Self::deposit_event(Event::SwapTransacted {
				pool_id: pool.id,
				batch_index: batch.index,
				msg_index: state.msg_index,
				requester: state.request.requester.clone(),
				transacted,
				exchanged,
				fee,
				remaining,
			});
		}

		for (requester, currency_id, amount) in payouts {
			ledger(
				T::Currency::transfer(currency_id, &pool.reserve_account, &requester, amount),
				"reserve cannot cover a swap payout",
			)?;
		}

		let scenario = &batch_match.scenario;
		let swap_price = price_from_dec(scenario.swap_price)
			.map_err(|_| BatchError::Fatal("negative clearing price"))?;
		log::debug!(
			target: LOG_TARGET,
			"pool {} batch {} cleared {:?}/{:?} at {:?}",
			pool.id,
			batch.index,
			scenario.match_type,
			scenario.price_direction,
			swap_price,
		);
		Self::deposit_event(Event::SwapBatchMatched {
			pool_id: pool.id,
			batch_index: batch.index,
			match_type: scenario.match_type,
			price_direction: scenario.price_direction,
			swap_price,
		});
		Ok(())
	}

	/// Applies a deposit at the pool's current ratio or refunds it in full.
	pub(crate) fn execute_deposit(
		pool: &PoolOf<T>,
		batch: &PoolBatchOf<T>,
		state: &mut DepositRequestStateOf<T>,
	) -> Result<(), BatchError> {
		state.executed = true;
		match Self::try_execute_deposit(pool, state) {
			Ok(outcome) => {
				state.succeeded = true;
				state.to_be_deleted = true;
				Self::deposit_event(Event::DepositExecuted {
					pool_id: pool.id,
					batch_index: batch.index,
					msg_index: state.msg_index,
					depositor: state.request.depositor.clone(),
					accepted: outcome.accepted,
					refunded: outcome.refunded,
					minted: outcome.minted,
				});
				Ok(())
			},
			Err(e) => {
				log::debug!(
					target: LOG_TARGET,
					"refunding deposit {} of pool {}: {:?}",
					state.msg_index,
					pool.id,
					e
				);
				Self::refund_deposit(pool.id, batch.index, state)
			},
		}
	}

	#[transactional]
	fn try_execute_deposit(
		pool: &PoolOf<T>,
		state: &DepositRequestStateOf<T>,
	) -> Result<DepositOutcome, DispatchError> {
		let params = Self::params();
		let supply = Self::pool_share_supply(pool);
		let reserves = Self::pool_reserves(pool);
		let deposit = [state.request.deposit_coins[0].amount, state.request.deposit_coins[1].amount];

		let (accepted, minted) = if Self::is_depleted(pool) {
			ensure!(
				deposit[0] >= params.min_init_deposit_amount && deposit[1] >= params.min_init_deposit_amount,
				Error::<T>::LessThanMinInitDeposit
			);
			(deposit, params.init_pool_coin_mint_amount)
		} else {
			let minted = cmp::min(
				mul_div_floor(supply, deposit[0], reserves[0])?,
				mul_div_floor(supply, deposit[1], reserves[1])?,
			);
			ensure!(!minted.is_zero(), Error::<T>::DepositTooSmall);
			let accepted =
				[mul_div_floor(reserves[0], minted, supply)?, mul_div_floor(reserves[1], minted, supply)?];
			ensure!(!accepted[0].is_zero() && !accepted[1].is_zero(), Error::<T>::DepositTooSmall);
			(accepted, minted)
		};

		if !params.max_reserve_coin_amount.is_zero() {
			for (reserve, amount) in reserves.iter().zip(accepted.iter()) {
				ensure!(
					reserve.saturating_add(*amount) <= params.max_reserve_coin_amount,
					Error::<T>::ExceededReserveCoinLimit
				);
			}
		}

		let escrow = Self::escrow_account();
		let depositor = &state.request.depositor;
		let mut refunded = [0; 2];
		for (i, coin) in state.request.deposit_coins.iter().enumerate() {
			refunded[i] = coin.amount.saturating_sub(accepted[i]);
			T::Currency::transfer(coin.currency_id, &escrow, &pool.reserve_account, accepted[i])?;
			T::Currency::transfer(coin.currency_id, &escrow, depositor, refunded[i])?;
		}
		T::Currency::deposit(pool.share_currency_id, depositor, minted)?;

		Ok(DepositOutcome { accepted, refunded, minted })
	}

	/// Burns the presented shares and pays out the matching part of the reserves.
	pub(crate) fn execute_withdraw(
		pool: &PoolOf<T>,
		batch: &PoolBatchOf<T>,
		state: &mut WithdrawRequestStateOf<T>,
	) -> Result<(), BatchError> {
		state.executed = true;
		match Self::try_execute_withdraw(pool, state) {
			Ok(withdrawn) => {
				state.succeeded = true;
				state.to_be_deleted = true;
				Self::deposit_event(Event::WithdrawExecuted {
					pool_id: pool.id,
					batch_index: batch.index,
					msg_index: state.msg_index,
					withdrawer: state.request.withdrawer.clone(),
					pool_share: state.request.pool_share.amount,
					withdrawn,
				});
				Ok(())
			},
			Err(e) => {
				log::debug!(
					target: LOG_TARGET,
					"refunding withdraw {} of pool {}: {:?}",
					state.msg_index,
					pool.id,
					e
				);
				Self::refund_withdraw(pool.id, batch.index, state)
			},
		}
	}

	#[transactional]
	fn try_execute_withdraw(
		pool: &PoolOf<T>,
		state: &WithdrawRequestStateOf<T>,
	) -> Result<[Balance; 2], DispatchError> {
		let fee_rate = Self::params().withdraw_fee_rate;
		let supply = Self::pool_share_supply(pool);
		let reserves = Self::pool_reserves(pool);
		let amount = state.request.pool_share.amount;

		// the last shares out take everything, fee included
		let withdrawn = if amount == supply {
			reserves
		} else {
			[
				withdraw_amount(reserves[0], amount, supply, fee_rate)?,
				withdraw_amount(reserves[1], amount, supply, fee_rate)?,
			]
		};
		ensure!(!withdrawn[0].is_zero() || !withdrawn[1].is_zero(), Error::<T>::WithdrawTooSmall);

		T::Currency::withdraw(pool.share_currency_id, &Self::escrow_account(), amount)?;
		let withdrawer = &state.request.withdrawer;
		T::Currency::transfer(pool.pair.first(), &pool.reserve_account, withdrawer, withdrawn[0])?;
		T::Currency::transfer(pool.pair.second(), &pool.reserve_account, withdrawer, withdrawn[1])?;
		Ok(withdrawn)
	}

	pub(crate) fn refund_deposit(
		pool_id: PoolId,
		batch_index: u64,
		state: &mut DepositRequestStateOf<T>,
	) -> Result<(), BatchError> {
		let escrow = Self::escrow_account();
		for coin in &state.request.deposit_coins {
			ledger(
				T::Currency::transfer(coin.currency_id, &escrow, &state.request.depositor, coin.amount),
				"escrow cannot refund a deposit",
			)?;
		}
		state.executed = true;
		state.succeeded = false;
		state.to_be_deleted = true;
		Self::deposit_event(Event::DepositRefunded {
			pool_id,
			batch_index,
			msg_index: state.msg_index,
			depositor: state.request.depositor.clone(),
		});
		Ok(())
	}

	pub(crate) fn refund_withdraw(
		pool_id: PoolId,
		batch_index: u64,
		state: &mut WithdrawRequestStateOf<T>,
	) -> Result<(), BatchError> {
		let share = state.request.pool_share;
		ledger(
			T::Currency::transfer(
				share.currency_id,
				&Self::escrow_account(),
				&state.request.withdrawer,
				share.amount,
			),
			"escrow cannot refund a withdraw",
		)?;
		state.executed = true;
		state.succeeded = false;
		state.to_be_deleted = true;
		Self::deposit_event(Event::WithdrawRefunded {
			pool_id,
			batch_index,
			msg_index: state.msg_index,
			withdrawer: state.request.withdrawer.clone(),
		});
		Ok(())
	}

	/// Returns the unfilled offer and the unused fee and closes the order.
	pub(crate) fn refund_swap(
		pool_id: PoolId,
		batch_index: u64,
		state: &mut SwapRequestStateOf<T>,
	) -> Result<(), BatchError> {
		let refunded = state.remaining_offer_amount.saturating_add(state.reserved_offer_fee);
		ledger(
			T::Currency::transfer(
				state.request.offer_coin.currency_id,
				&Self::escrow_account(),
				&state.request.requester,
				refunded,
			),
			"escrow cannot refund a swap",
		)?;
		log::debug!(
			target: LOG_TARGET,
			"swap {} of pool {} expired at {:?}, refunded {}",
			state.msg_index,
			pool_id,
			state.order_expiry_height,
			refunded
		);
		state.executed = true;
		state.succeeded = false;
		state.to_be_deleted = true;
		Self::deposit_event(Event::SwapRefunded {
			pool_id,
			batch_index,
			msg_index: state.msg_index,
			requester: state.request.requester.clone(),
			refunded,
		});
		Ok(())
	}

	/// Refunds every live request of a pool that no longer exists. Returns the
	/// number of requests refunded.
	pub(crate) fn refund_all_requests(pool_id: PoolId, batch_index: u64) -> Result<u32, BatchError> {
		let mut count = 0u32;
		for mut state in Self::live_deposit_requests(pool_id) {
			Self::refund_deposit(pool_id, batch_index, &mut state)?;
			DepositRequests::<T>::insert(pool_id, state.msg_index, state);
			count = count.saturating_add(1);
		}
		for mut state in Self::live_withdraw_requests(pool_id) {
			Self::refund_withdraw(pool_id, batch_index, &mut state)?;
			WithdrawRequests::<T>::insert(pool_id, state.msg_index, state);
			count = count.saturating_add(1);
		}
		for mut state in Self::live_swap_requests(pool_id) {
			Self::refund_swap(pool_id, batch_index, &mut state)?;
			SwapRequests::<T>::insert(pool_id, state.msg_index, state);
			count = count.saturating_add(1);
		}
		Ok(count)
	}
}
