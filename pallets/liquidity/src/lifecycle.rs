//! Block hooks driving the batches: settlement at block end, cleanup and the next
//! interval at block start.

use crate::*;
use frame_support::{traits::Get, weights::Weight};
use sp_runtime::traits::{One, Saturating};
use sp_std::collections::btree_map::BTreeMap;

impl<T: Config> Pallet<T> {
	fn sorted_batches() -> Vec<PoolBatchOf<T>> {
		let mut batches: Vec<PoolBatchOf<T>> = PoolBatches::<T>::iter_values().collect();
		batches.sort_by_key(|batch| batch.pool_id);
		batches
	}

	/// Settlement cost of a batch before any of its requests is touched.
	pub fn batch_settlement_weight() -> Weight {
		T::DbWeight::get().reads_writes(4, 2)
	}

	/// Settlement cost of one queued request: its state, the ledger transfers of a
	/// fill or a refund, and its share of the escrow check.
	pub fn request_settlement_weight() -> Weight {
		T::DbWeight::get().reads_writes(8, 8)
	}

	/// Weight `execute_pool_batches` will use at the end of block `now` for the
	/// requests queued before it. Requests submitted within the block carry their
	/// own settlement cost in their call weight.
	pub(crate) fn pool_batches_finalize_weight(now: T::BlockNumber) -> Weight {
		let db = T::DbWeight::get();
		let unit = T::BlockNumber::from(Self::params().unit_batch_height);
		let mut weight = db.reads(1);
		let mut queued = 0u64;

		for batch in PoolBatches::<T>::iter_values() {
			let requests = Self::request_count(batch.pool_id);
			queued.saturating_accrue(requests);
			weight = weight.saturating_add(db.reads(requests.saturating_add(2)));

			let due = !batch.executed &&
				(!Pools::<T>::contains_key(batch.pool_id) ||
					now.saturating_sub(batch.begin_height).saturating_add(One::one()) >= unit);
			if due {
				weight = weight
					.saturating_add(Self::batch_settlement_weight())
					.saturating_add(Self::request_settlement_weight().saturating_mul(requests));
			}
		}

		if T::EnableInvariantChecks::get() {
			// every request is read again, plus the escrow balance of each coin it locks
			weight = weight.saturating_add(db.reads(queued.saturating_mul(3)));
		}
		weight
	}

	/// Closes the intervals settled in the previous block: drops terminal requests,
	/// carries surviving swap orders over and opens the next interval.
	pub(crate) fn delete_and_init_pool_batches(now: T::BlockNumber) -> Result<Weight, BatchError> {
		let mut reads = 1u64;
		let mut writes = 0u64;

		for mut batch in Self::sorted_batches() {
			reads.saturating_inc();
			if !batch.executed {
				continue
			}
			writes.saturating_accrue(Self::reinit_surviving_requests(batch.pool_id, batch.index, now)?);
			writes.saturating_accrue(Self::purge_ready_requests(batch.pool_id));

			if !Pools::<T>::contains_key(batch.pool_id) && !Self::has_requests(batch.pool_id) {
				log::debug!(target: LOG_TARGET, "removing batch of deleted pool {}", batch.pool_id);
				PoolBatches::<T>::remove(batch.pool_id);
				writes.saturating_inc();
				continue
			}

			batch.index.saturating_inc();
			batch.begin_height = now;
			batch.executed = false;
			PoolBatches::<T>::insert(batch.pool_id, batch);
			writes.saturating_inc();
		}

		Ok(T::DbWeight::get().reads_writes(reads, writes))
	}

	/// Settles every batch whose interval ends at `now`.
	pub(crate) fn execute_pool_batches(now: T::BlockNumber) -> Result<(), BatchError> {
		let unit = T::BlockNumber::from(Self::params().unit_batch_height);

		for mut batch in Self::sorted_batches() {
			if batch.executed {
				continue
			}
			match Pools::<T>::get(batch.pool_id) {
				None => {
					let refunded = Self::refund_all_requests(batch.pool_id, batch.index)?;
					if refunded == 0 {
						PoolBatches::<T>::remove(batch.pool_id);
					} else {
						batch.executed = true;
						PoolBatches::<T>::insert(batch.pool_id, batch);
					}
				},
				Some(pool) =>
					if now.saturating_sub(batch.begin_height).saturating_add(One::one()) >= unit {
						Self::execute_pool_batch(&pool, batch, now)?;
					},
			}
		}

		if T::EnableInvariantChecks::get() {
			Self::check_escrow_invariant()?;
		}
		Ok(())
	}

	/// Swaps first, so deposits and withdrawals see the reserves after matching.
	pub(crate) fn execute_pool_batch(
		pool: &PoolOf<T>,
		mut batch: PoolBatchOf<T>,
		now: T::BlockNumber,
	) -> Result<(), BatchError> {
		let mut executed = Self::execute_swaps(pool, &batch, now)?;

		for mut state in Self::live_deposit_requests(pool.id).into_iter().filter(|s| !s.executed) {
			Self::execute_deposit(pool, &batch, &mut state)?;
			DepositRequests::<T>::insert(pool.id, state.msg_index, state);
			executed.saturating_inc();
		}
		for mut state in Self::live_withdraw_requests(pool.id).into_iter().filter(|s| !s.executed) {
			Self::execute_withdraw(pool, &batch, &mut state)?;
			WithdrawRequests::<T>::insert(pool.id, state.msg_index, state);
			executed.saturating_inc();
		}

		if executed > 0 {
			log::info!(
				target: LOG_TARGET,
				"executed batch {} of pool {} at {:?}: {} requests, reserves {:?}",
				batch.index,
				pool.id,
				now,
				executed,
				Self::pool_reserves(pool),
			);
			Self::deposit_event(Event::BatchExecuted {
				pool_id: pool.id,
				batch_index: batch.index,
				executed_requests: executed,
			});
			batch.executed = true;
			PoolBatches::<T>::insert(pool.id, batch);
		}
		Ok(())
	}

	/// The escrow account holds at least what every live request has locked.
	pub fn check_escrow_invariant() -> Result<(), BatchError> {
		let mut locked: BTreeMap<CurrencyId, Balance> = BTreeMap::new();
		let mut lock = |currency_id: CurrencyId, amount: Balance| {
			let total = locked.entry(currency_id).or_default();
			*total = total.saturating_add(amount);
		};

		for state in DepositRequests::<T>::iter_values().filter(|r| !r.to_be_deleted) {
			for coin in &state.request.deposit_coins {
				lock(coin.currency_id, coin.amount);
			}
		}
		for state in WithdrawRequests::<T>::iter_values().filter(|r| !r.to_be_deleted) {
			lock(state.request.pool_share.currency_id, state.request.pool_share.amount);
		}
		for state in SwapRequests::<T>::iter_values().filter(|r| !r.to_be_deleted) {
			lock(
				state.request.offer_coin.currency_id,
				state.remaining_offer_amount.saturating_add(state.reserved_offer_fee),
			);
		}

		let escrow = Self::escrow_account();
		for (currency_id, amount) in locked {
			let held = T::Currency::free_balance(currency_id, &escrow);
			if held < amount {
				log::error!(
					target: LOG_TARGET,
					"escrow holds {} of {:?} but live requests lock {}",
					held,
					currency_id,
					amount
				);
				return Err(BatchError::Fatal("escrow balance below the amount locked by live requests"))
			}
		}
		Ok(())
	}
}
