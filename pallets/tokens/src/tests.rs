use crate::{mock::*, Error, Event};
use frame_support::{assert_noop, assert_ok};
use module_traits::MultiCurrency;
use primitives::currency::*;

#[test]
fn genesis_balances_set_issuance() {
	new_test_ext().execute_with(|| {
		assert_eq!(<Tokens as MultiCurrency<u64>>::total_issuance(ACA), 1_100);
		assert_eq!(<Tokens as MultiCurrency<u64>>::free_balance(DOT, &ALICE), 500);
		assert_eq!(Tokens::balances_of(&BOB), vec![(ACA, 100)]);
	});
}

#[test]
fn transfer_moves_free_balance() {
	new_test_ext().execute_with(|| {
		assert_ok!(Tokens::transfer(RuntimeOrigin::signed(ALICE), BOB, DOT, 200));
		assert_eq!(<Tokens as MultiCurrency<u64>>::free_balance(DOT, &ALICE), 300);
		assert_eq!(<Tokens as MultiCurrency<u64>>::free_balance(DOT, &BOB), 200);
		System::assert_last_event(
			Event::Transferred { currency_id: DOT, from: ALICE, to: BOB, amount: 200 }.into(),
		);

		assert_noop!(
			Tokens::transfer(RuntimeOrigin::signed(BOB), ALICE, DOT, 201),
			Error::<Test>::BalanceTooLow
		);
		assert_noop!(
			Tokens::transfer(RuntimeOrigin::signed(BOB), ALICE, DOT, 0),
			Error::<Test>::AmountIsZero
		);
	});
}

#[test]
fn deposit_and_withdraw_track_issuance() {
	new_test_ext().execute_with(|| {
		let share = CurrencyId::PoolShare(1);
		assert_ok!(<Tokens as MultiCurrency<u64>>::deposit(share, &BOB, 1_000));
		assert_eq!(<Tokens as MultiCurrency<u64>>::total_issuance(share), 1_000);

		assert_ok!(<Tokens as MultiCurrency<u64>>::withdraw(share, &BOB, 400));
		assert_eq!(<Tokens as MultiCurrency<u64>>::total_issuance(share), 600);
		assert_eq!(<Tokens as MultiCurrency<u64>>::free_balance(share, &BOB), 600);

		assert_noop!(
			<Tokens as MultiCurrency<u64>>::withdraw(share, &BOB, 601),
			Error::<Test>::BalanceTooLow
		);
		assert_noop!(
			<Tokens as MultiCurrency<u64>>::ensure_can_withdraw(share, &ALICE, 1),
			Error::<Test>::BalanceTooLow
		);
	});
}
