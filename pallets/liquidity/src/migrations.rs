pub mod v1 {
	use crate::*;
	use codec::{Decode, Encode};
	use frame_support::{
		traits::{Get, GetStorageVersion, OnRuntimeUpgrade},
		weights::Weight,
	};
	use sp_std::marker::PhantomData;

	/// Batch record of storage version 0, with one message counter shared by all
	/// request kinds.
	#[derive(Encode, Decode, Clone, PartialEq, Eq, RuntimeDebug)]
	pub struct OldPoolBatch<BlockNumber> {
		pub pool_id: PoolId,
		pub index: u64,
		pub begin_height: BlockNumber,
		pub msg_index: MsgIndex,
		pub executed: bool,
	}

	/// Splits the shared counter into per-kind counters. Each continues from the old
	/// value so no message index is ever handed out twice.
	pub struct MigrateToV1<T>(PhantomData<T>);

	impl<T: Config> OnRuntimeUpgrade for MigrateToV1<T> {
		fn on_runtime_upgrade() -> Weight {
			let on_chain = Pallet::<T>::on_chain_storage_version();
			if on_chain >= StorageVersion::new(1) {
				log::info!(target: LOG_TARGET, "pool batches already at {:?}, skipping migration", on_chain);
				return T::DbWeight::get().reads(1)
			}

			let mut translated = 0u64;
			PoolBatches::<T>::translate::<OldPoolBatch<T::BlockNumber>, _>(|_, old| {
				translated += 1;
				Some(PoolBatch {
					pool_id: old.pool_id,
					index: old.index,
					begin_height: old.begin_height,
					deposit_msg_index: old.msg_index,
					withdraw_msg_index: old.msg_index,
					swap_msg_index: old.msg_index,
					executed: old.executed,
				})
			});
			StorageVersion::new(1).put::<Pallet<T>>();

			log::info!(target: LOG_TARGET, "migrated {} pool batches to storage version 1", translated);
			T::DbWeight::get().reads_writes(translated + 1, translated + 1)
		}
	}
}
