use codec::{FullCodec, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_runtime::{
	traits::{AtLeast32BitUnsigned, MaybeSerializeDeserialize},
	DispatchResult,
};
use sp_std::{
	cmp::{Eq, Ord, PartialEq},
	fmt::Debug,
};

/// Balance-holding ledger over many currencies.
///
/// `deposit` mints into an account and `withdraw` burns from it, both moving total
/// issuance. `transfer` moves funds without touching issuance.
pub trait MultiCurrency<AccountId> {
	type CurrencyId: FullCodec
		+ Eq
		+ PartialEq
		+ Ord
		+ Copy
		+ MaybeSerializeDeserialize
		+ Debug
		+ TypeInfo
		+ MaxEncodedLen;

	type Balance: AtLeast32BitUnsigned
		+ FullCodec
		+ Copy
		+ MaybeSerializeDeserialize
		+ Debug
		+ Default
		+ TypeInfo
		+ MaxEncodedLen;

	// public immutables
	fn minimum_balance(currency_id: Self::CurrencyId) -> Self::Balance;

	fn total_issuance(currency_id: Self::CurrencyId) -> Self::Balance;

	fn free_balance(currency_id: Self::CurrencyId, who: &AccountId) -> Self::Balance;

	fn ensure_can_withdraw(
		currency_id: Self::CurrencyId,
		who: &AccountId,
		amount: Self::Balance,
	) -> DispatchResult;

	// public mutables
	fn transfer(
		currency_id: Self::CurrencyId,
		from: &AccountId,
		to: &AccountId,
		amount: Self::Balance,
	) -> DispatchResult;

	fn deposit(currency_id: Self::CurrencyId, who: &AccountId, amount: Self::Balance)
		-> DispatchResult;

	fn withdraw(currency_id: Self::CurrencyId, who: &AccountId, amount: Self::Balance)
		-> DispatchResult;
}
