#![cfg_attr(not(feature = "std"), no_std)]

//! Multi-currency ledger.
//!
//! Keeps one free balance per `(account, currency)` and the total issuance of every
//! currency. Other pallets reach it through [`module_traits::MultiCurrency`].

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(test)]
mod tests;

use module_traits::MultiCurrency;
use primitives::{Balance, CurrencyId};
use sp_runtime::{traits::Zero, DispatchResult};

#[frame_support::pallet]
pub mod pallet {
	use super::*;
	use frame_support::pallet_prelude::*;
	use frame_system::pallet_prelude::*;
	use sp_std::prelude::*;

	#[pallet::pallet]
	#[pallet::generate_store(pub(super) trait Store)]
	pub struct Pallet<T>(_);

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;
	}

	#[pallet::storage]
	pub type TotalIssuance<T: Config> = StorageMap<_, Twox64Concat, CurrencyId, Balance, ValueQuery>;

	#[pallet::storage]
	pub type Accounts<T: Config> = StorageDoubleMap<
		_,
		Blake2_128Concat,
		T::AccountId,
		Twox64Concat,
		CurrencyId,
		Balance,
		ValueQuery,
	>;

	#[pallet::genesis_config]
	pub struct GenesisConfig<T: Config> {
		pub balances: Vec<(T::AccountId, CurrencyId, Balance)>,
	}

	#[cfg(feature = "std")]
	impl<T: Config> Default for GenesisConfig<T> {
		fn default() -> GenesisConfig<T> {
			GenesisConfig { balances: vec![] }
		}
	}

	#[pallet::genesis_build]
	impl<T: Config> GenesisBuild<T> for GenesisConfig<T> {
		fn build(&self) {
			for (who, currency_id, amount) in &self.balances {
				assert!(
					<Pallet<T> as MultiCurrency<T::AccountId>>::deposit(*currency_id, who, *amount)
						.is_ok(),
					"Genesis balances overflow total issuance"
				);
			}
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		Transferred { currency_id: CurrencyId, from: T::AccountId, to: T::AccountId, amount: Balance },
		/// New units were minted into `who`.
		Deposited { currency_id: CurrencyId, who: T::AccountId, amount: Balance },
		/// Units were burned from `who`.
		Withdrawn { currency_id: CurrencyId, who: T::AccountId, amount: Balance },
	}

	#[pallet::error]
	pub enum Error<T> {
		BalanceTooLow,
		BalanceOverflow,
		TotalIssuanceOverflow,
		AmountIsZero,
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		#[pallet::weight(10_000 + T::DbWeight::get().reads_writes(2,2).ref_time())]
		pub fn transfer(
			origin: OriginFor<T>,
			dest: T::AccountId,
			currency_id: CurrencyId,
			amount: Balance,
		) -> DispatchResult {
			let from = ensure_signed(origin)?;
			ensure!(!amount.is_zero(), Error::<T>::AmountIsZero);
			<Self as MultiCurrency<T::AccountId>>::transfer(currency_id, &from, &dest, amount)
		}
	}

	impl<T: Config> Pallet<T> {
		pub fn balances_of(who: &T::AccountId) -> Vec<(CurrencyId, Balance)> {
			Accounts::<T>::iter_prefix(who).collect()
		}
	}
}

impl<T: Config> MultiCurrency<T::AccountId> for Pallet<T> {
	type CurrencyId = CurrencyId;
	type Balance = Balance;

	fn minimum_balance(_currency_id: Self::CurrencyId) -> Self::Balance {
		Zero::zero()
	}

	fn total_issuance(currency_id: Self::CurrencyId) -> Self::Balance {
		TotalIssuance::<T>::get(currency_id)
	}

	fn free_balance(currency_id: Self::CurrencyId, who: &T::AccountId) -> Self::Balance {
		Accounts::<T>::get(who, currency_id)
	}

	fn ensure_can_withdraw(
		currency_id: Self::CurrencyId,
		who: &T::AccountId,
		amount: Self::Balance,
	) -> DispatchResult {
		if amount.is_zero() {
			return Ok(())
		}
		Self::free_balance(currency_id, who)
			.checked_sub(amount)
			.map(|_| ())
			.ok_or_else(|| Error::<T>::BalanceTooLow.into())
	}

	fn transfer(
		currency_id: Self::CurrencyId,
		from: &T::AccountId,
		to: &T::AccountId,
		amount: Self::Balance,
	) -> DispatchResult {
		if amount.is_zero() || from == to {
			return Ok(())
		}
		let from_balance = Self::free_balance(currency_id, from)
			.checked_sub(amount)
			.ok_or(Error::<T>::BalanceTooLow)?;
		let to_balance = Self::free_balance(currency_id, to)
			.checked_add(amount)
			.ok_or(Error::<T>::BalanceOverflow)?;

		set_balance::<T>(currency_id, from, from_balance);
		set_balance::<T>(currency_id, to, to_balance);

		Self::deposit_event(Event::Transferred {
			currency_id,
			from: from.clone(),
			to: to.clone(),
			amount,
		});
		Ok(())
	}

	fn deposit(currency_id: Self::CurrencyId, who: &T::AccountId, amount: Self::Balance) -> DispatchResult {
		if amount.is_zero() {
			return Ok(())
		}
		TotalIssuance::<T>::try_mutate(currency_id, |issuance| -> DispatchResult {
			*issuance = issuance.checked_add(amount).ok_or(Error::<T>::TotalIssuanceOverflow)?;
			Ok(())
		})?;
		// cannot overflow once total issuance did not
		let balance = Self::free_balance(currency_id, who).saturating_add(amount);
		set_balance::<T>(currency_id, who, balance);

		Self::deposit_event(Event::Deposited { currency_id, who: who.clone(), amount });
		Ok(())
	}

	fn withdraw(currency_id: Self::CurrencyId, who: &T::AccountId, amount: Self::Balance) -> DispatchResult {
		if amount.is_zero() {
			return Ok(())
		}
		let balance = Self::free_balance(currency_id, who)
			.checked_sub(amount)
			.ok_or(Error::<T>::BalanceTooLow)?;
		TotalIssuance::<T>::mutate(currency_id, |issuance| *issuance = issuance.saturating_sub(amount));
		set_balance::<T>(currency_id, who, balance);

		log::trace!(target: "runtime::tokens", "burned {:?} {:?} from {:?}", amount, currency_id, who);
		Self::deposit_event(Event::Withdrawn { currency_id, who: who.clone(), amount });
		Ok(())
	}
}

fn set_balance<T: Config>(currency_id: CurrencyId, who: &T::AccountId, balance: Balance) {
	if balance.is_zero() {
		Accounts::<T>::remove(who, currency_id);
	} else {
		Accounts::<T>::insert(who, currency_id, balance);
	}
}
