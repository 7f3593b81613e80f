//! Consistency checks over a computed batch match. Any violation is a bug in the
//! matching engine and surfaces as [`BatchError::Fatal`].

use crate::{
	math::{abs, CheckedAddRes, CheckedDivRes, CheckedMulRes, CheckedSubRes, Dec},
	matching::{value_drift, BatchError, BatchMatch, MatchResult, OrderMatch},
	order_book::{OrderDirection, SwapOrder},
	types::{MatchType, PriceDirection},
};
use sp_runtime::ArithmeticError;
use sp_std::{collections::btree_set::BTreeSet, prelude::*};

pub fn check_batch_match(
	batch_match: &BatchMatch,
	orders: &[SwapOrder],
	current_price: Dec,
) -> Result<(), BatchError> {
	let swap_price = batch_match.scenario.swap_price;
	for result in batch_match.results() {
		check_swap_price(result, swap_price)?;
	}
	check_conservation(batch_match)?;
	check_price_direction(batch_match.scenario.price_direction, swap_price, current_price)?;
	if batch_match.scenario.match_type != MatchType::NoMatch {
		check_execution_states(batch_match, orders)?;
	}
	Ok(())
}

/// Every fill exchanges at the clearing price, up to one unit of truncation.
pub fn check_swap_price(result: &MatchResult, swap_price: Dec) -> Result<(), BatchError> {
	let expected = match result.direction {
		OrderDirection::XtoY => result.transacted_amount.checked_div_res(&swap_price)?,
		OrderDirection::YtoX => result.transacted_amount.checked_mul_res(&swap_price)?,
	};
	if abs(expected.checked_sub_res(&result.exchanged_demand_amount)?) > Dec::one() {
		return Err(BatchError::Fatal("fill exchanged at a price other than the clearing price"))
	}
	Ok(())
}

fn recomputed_deltas(side: &OrderMatch) -> Result<(Dec, Dec), ArithmeticError> {
	let mut x = Dec::zero();
	let mut y = Dec::zero();
	for r in &side.results {
		match r.direction {
			OrderDirection::XtoY => {
				x = x.checked_add_res(&r.transacted_amount)?;
				y = y.checked_sub_res(&r.exchanged_demand_amount)?;
			},
			OrderDirection::YtoX => {
				y = y.checked_add_res(&r.transacted_amount)?;
				x = x.checked_sub_res(&r.exchanged_demand_amount)?;
			},
		}
	}
	Ok((x, y))
}

/// The pool neither gains nor loses value at the clearing price.
pub fn check_conservation(batch_match: &BatchMatch) -> Result<(), BatchError> {
	let mut pool_x = Dec::zero();
	let mut pool_y = Dec::zero();
	for side in [&batch_match.x_to_y, &batch_match.y_to_x] {
		let (x, y) = recomputed_deltas(side)?;
		if x != side.pool_x_delta || y != side.pool_y_delta {
			return Err(BatchError::Fatal("reported pool deltas differ from the fills"))
		}
		pool_x = pool_x.checked_add_res(&x)?;
		pool_y = pool_y.checked_add_res(&y)?;
	}
	if value_drift(pool_x, pool_y, batch_match.scenario.swap_price)? > Dec::one() {
		return Err(BatchError::Fatal("batch creates or destroys value at the clearing price"))
	}
	Ok(())
}

pub fn check_price_direction(
	direction: PriceDirection,
	swap_price: Dec,
	current_price: Dec,
) -> Result<(), BatchError> {
	let consistent = match direction {
		PriceDirection::Increase => swap_price >= current_price,
		PriceDirection::Decrease => swap_price <= current_price,
		PriceDirection::Stay => swap_price == current_price,
	};
	if !consistent {
		return Err(BatchError::Fatal("clearing price moved against the book direction"))
	}
	Ok(())
}

/// Filled orders are priced at or better than the clearing price, unfilled ones at
/// or worse, and no order is filled twice.
pub fn check_execution_states(batch_match: &BatchMatch, orders: &[SwapOrder]) -> Result<(), BatchError> {
	let swap_price = batch_match.scenario.swap_price;
	let mut matched = BTreeSet::new();
	for result in batch_match.results() {
		if !matched.insert(result.msg_index) {
			return Err(BatchError::Fatal("order filled twice"))
		}
	}

	for order in orders {
		let is_matched = matched.contains(&order.msg_index);
		let consistent = match (order.direction, is_matched) {
			(OrderDirection::XtoY, true) => order.price >= swap_price,
			(OrderDirection::XtoY, false) => order.price <= swap_price,
			(OrderDirection::YtoX, true) => order.price <= swap_price,
			(OrderDirection::YtoX, false) => order.price >= swap_price,
		};
		if !consistent {
			log::error!(
				target: crate::LOG_TARGET,
				"order {} ({:?} at {:?}) inconsistent with clearing price {:?}",
				order.msg_index,
				order.direction,
				order.price,
				swap_price,
			);
			return Err(BatchError::Fatal("fill state inconsistent with the clearing price"))
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		math::dec,
		matching::{find_order_match, BatchResult},
	};

	fn order(msg_index: u64, direction: OrderDirection, price: Dec, amount: u128) -> SwapOrder {
		SwapOrder { msg_index, direction, price, offer_amount: amount, reserved_fee: 0 }
	}

	fn scenario(match_type: MatchType, price_direction: PriceDirection, swap_price: Dec) -> BatchResult {
		BatchResult {
			match_type,
			price_direction,
			swap_price,
			ex: Dec::zero(),
			ey: Dec::zero(),
			original_ex: 0,
			original_ey: 0,
			pool_x: Dec::zero(),
			pool_y: Dec::zero(),
			transact_amount: Dec::zero(),
		}
	}

	#[test]
	fn accepts_a_netted_batch() {
		let buy = order(1, OrderDirection::XtoY, Dec::one(), 1_000);
		let sell = order(2, OrderDirection::YtoX, Dec::one(), 1_000);
		let x_to_y = find_order_match(OrderDirection::XtoY, vec![buy.clone()], dec(1_000), Dec::one()).unwrap();
		let y_to_x = find_order_match(OrderDirection::YtoX, vec![sell.clone()], dec(1_000), Dec::one()).unwrap();
		let batch_match = BatchMatch {
			scenario: scenario(MatchType::Exact, PriceDirection::Stay, Dec::one()),
			x_to_y,
			y_to_x,
		};
		assert_eq!(check_batch_match(&batch_match, &[buy, sell], Dec::one()), Ok(()));
	}

	#[test]
	fn rejects_tampered_deltas() {
		let buy = order(1, OrderDirection::XtoY, Dec::one(), 1_000);
		let mut x_to_y = find_order_match(OrderDirection::XtoY, vec![buy], dec(1_000), Dec::one()).unwrap();
		x_to_y.pool_x_delta = dec(999);
		let batch_match = BatchMatch {
			scenario: scenario(MatchType::Exact, PriceDirection::Increase, Dec::one()),
			x_to_y,
			y_to_x: OrderMatch::default(),
		};
		assert!(matches!(check_conservation(&batch_match), Err(BatchError::Fatal(_))));
	}

	#[test]
	fn rejects_unfilled_crossing_order() {
		let filled = order(1, OrderDirection::XtoY, Dec::saturating_from_rational(11, 10), 1_000);
		let skipped = order(2, OrderDirection::XtoY, Dec::saturating_from_rational(12, 10), 1_000);
		let x_to_y =
			find_order_match(OrderDirection::XtoY, vec![filled.clone()], dec(1_000), Dec::one()).unwrap();
		let batch_match = BatchMatch {
			scenario: scenario(MatchType::Exact, PriceDirection::Increase, Dec::one()),
			x_to_y,
			y_to_x: OrderMatch::default(),
		};
		assert_eq!(
			check_execution_states(&batch_match, &[filled, skipped]),
			Err(BatchError::Fatal("fill state inconsistent with the clearing price"))
		);
	}

	#[test]
	fn rejects_price_moving_against_direction() {
		let one = Dec::one();
		let lower = Dec::saturating_from_rational(9, 10);
		assert!(check_price_direction(PriceDirection::Increase, lower, one).is_err());
		assert!(check_price_direction(PriceDirection::Stay, lower, one).is_err());
		assert_eq!(check_price_direction(PriceDirection::Decrease, lower, one), Ok(()));
	}

	#[test]
	fn rejects_off_price_fill() {
		let result = MatchResult {
			msg_index: 1,
			direction: OrderDirection::YtoX,
			order_price: Dec::one(),
			offer_amount: dec(100),
			transacted_amount: dec(100),
			exchanged_demand_amount: dec(102),
			offer_fee_amount: Dec::zero(),
		};
		assert!(check_swap_price(&result, Dec::one()).is_err());
	}
}
