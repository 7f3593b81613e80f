//! Uniform clearing price matching of one pool's order book against its reserves.
//!
//! The engine first decides in which direction the book pushes the pool price, then
//! walks the price levels in that direction looking for the price at which the
//! executable volume of both sides and the pool's own trade balance out. Every
//! order that crosses the resulting price is filled at it, pro rata inside the
//! last tier.

use crate::{
	invariants,
	math::{abs, dec, CheckedAddRes, CheckedDivRes, CheckedMulRes, CheckedSubRes, Dec},
	order_book::{split_orders, OrderBook, OrderDirection, SwapOrder},
	types::{MatchType, MsgIndex, PriceDirection},
};
use primitives::Balance;
use sp_runtime::{ArithmeticError, RuntimeDebug};
use sp_std::{cmp, prelude::*};

#[derive(Clone, Copy, Eq, PartialEq, RuntimeDebug)]
pub enum BatchError {
	/// A decimal computation left its range. Matching is skipped for the interval.
	Arithmetic(ArithmeticError),
	/// The engine disagreed with itself. The block must not be produced.
	Fatal(&'static str),
}

impl From<ArithmeticError> for BatchError {
	fn from(e: ArithmeticError) -> Self {
		BatchError::Arithmetic(e)
	}
}

/// One candidate clearing scenario.
#[derive(Clone, Eq, PartialEq, RuntimeDebug)]
pub struct BatchResult {
	pub match_type: MatchType,
	pub price_direction: PriceDirection,
	pub swap_price: Dec,
	/// Executable buy volume in `X`.
	pub ex: Dec,
	/// Executable sell volume in `Y`.
	pub ey: Dec,
	pub original_ex: Balance,
	pub original_ey: Balance,
	pub pool_x: Dec,
	pub pool_y: Dec,
	pub transact_amount: Dec,
}

impl BatchResult {
	fn new(price_direction: PriceDirection, swap_price: Dec) -> Self {
		BatchResult {
			match_type: MatchType::NoMatch,
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

	fn with_executable(mut self, (ex, ey): (Balance, Balance)) -> Self {
		self.original_ex = ex;
		self.original_ey = ey;
		self.ex = dec(ex);
		self.ey = dec(ey);
		self
	}
}

/// Fill of a single order at the clearing price.
#[derive(Clone, Eq, PartialEq, RuntimeDebug)]
pub struct MatchResult {
	pub msg_index: MsgIndex,
	pub direction: OrderDirection,
	pub order_price: Dec,
	pub offer_amount: Dec,
	pub transacted_amount: Dec,
	pub exchanged_demand_amount: Dec,
	pub offer_fee_amount: Dec,
}

#[derive(Clone, Default, Eq, PartialEq, RuntimeDebug)]
pub struct OrderMatch {
	pub results: Vec<MatchResult>,
	/// Change of the `X` reserve caused by `results`.
	pub pool_x_delta: Dec,
	pub pool_y_delta: Dec,
}

/// The chosen scenario together with the fills it implies on both sides.
#[derive(Clone, Eq, PartialEq, RuntimeDebug)]
pub struct BatchMatch {
	pub scenario: BatchResult,
	pub x_to_y: OrderMatch,
	pub y_to_x: OrderMatch,
}

impl BatchMatch {
	pub fn results(&self) -> impl Iterator<Item = &MatchResult> {
		self.x_to_y.results.iter().chain(self.y_to_x.results.iter())
	}
}

/// Matches `orders` against a pool holding `x` and `y`.
///
/// Returns `Ok(None)` when no clearing scenario qualifies. Orders then stay in the
/// book untouched until they expire.
pub fn match_orders(
	orders: &[SwapOrder],
	x: Balance,
	y: Balance,
	check_invariants: bool,
) -> Result<Option<BatchMatch>, BatchError> {
	let x = dec(x);
	let y = dec(y);
	let current_price = x.checked_div_res(&y)?;
	let book = OrderBook::build(orders);

	let direction = book.price_direction(current_price)?;
	let scenario = match direction {
		PriceDirection::Stay => Some(calculate_match_stay(&book, current_price)?),
		_ => calculate_match(&book, direction, x, y)?,
	};
	let scenario = match scenario {
		Some(scenario) => scenario,
		None => return Ok(None),
	};

	let (buys, sells) = split_orders(orders);
	let (x_to_y, y_to_x) = if scenario.match_type == MatchType::NoMatch {
		(OrderMatch::default(), OrderMatch::default())
	} else {
		(
			find_order_match(OrderDirection::XtoY, buys, scenario.ex, scenario.swap_price)?,
			find_order_match(OrderDirection::YtoX, sells, scenario.ey, scenario.swap_price)?,
		)
	};
	let batch_match = BatchMatch { scenario, x_to_y, y_to_x };

	if check_invariants {
		invariants::check_batch_match(&batch_match, orders, current_price)?;
	}
	Ok(Some(batch_match))
}

/// The book exerts no pressure: clear at the pool price and net the two sides.
pub fn calculate_match_stay(book: &OrderBook, current_price: Dec) -> Result<BatchResult, BatchError> {
	let mut r = BatchResult::new(PriceDirection::Stay, current_price)
		.with_executable(book.executable_amount(current_price));

	let ey_in_x = current_price.checked_mul_res(&r.ey)?;
	if r.ex.is_zero() || r.ey.is_zero() {
		r.match_type = MatchType::NoMatch;
	} else if r.ex == ey_in_x {
		r.match_type = MatchType::Exact;
	} else {
		// only the larger side is cut down
		r.match_type = MatchType::Fractional;
		if r.ex > ey_in_x {
			r.ex = ey_in_x;
		} else {
			r.ey = r.ex.checked_div_res(&current_price)?;
		}
	}
	Ok(r)
}

/// Scans the book outward from the pool price and picks the best scenario.
pub fn calculate_match(
	book: &OrderBook,
	direction: PriceDirection,
	x: Dec,
	y: Dec,
) -> Result<Option<BatchResult>, ArithmeticError> {
	let current_price = x.checked_div_res(&y)?;
	let mut last_price = current_price;
	let mut scenarios = Vec::new();

	let levels: Vec<Dec> = match direction {
		PriceDirection::Decrease => book.levels().iter().rev().map(|l| l.price).collect(),
		_ => book.levels().iter().map(|l| l.price).collect(),
	};

	for order_price in levels {
		let behind = match direction {
			PriceDirection::Increase => order_price < current_price,
			_ => order_price > current_price,
		};
		if behind {
			continue
		}

		let r = calculate_swap(book, direction, x, y, order_price, last_price)?;
		// beyond what decimal truncation can explain
		let slack = match direction {
			PriceDirection::Increase => r.pool_y.checked_sub_res(&r.ex.checked_div_res(&r.swap_price)?)?,
			_ => r.pool_x.checked_sub_res(&r.ey.checked_mul_res(&r.swap_price)?)?,
		};
		if slack >= Dec::one() {
			continue
		}

		scenarios.push(r);
		last_price = order_price;
	}

	let mut selected: Option<BatchResult> = None;
	for s in scenarios {
		let (must_ex, must_ey) = book.must_executable_amount(s.swap_price);
		if s.ex < dec(must_ex) || s.ey < dec(must_ey) {
			continue
		}
		if s.match_type == MatchType::Exact && s.transact_amount.is_positive() {
			selected = Some(s);
			break
		}
		let best = selected.as_ref().map(|b| b.transact_amount).unwrap_or_else(Dec::zero);
		if s.transact_amount > best {
			selected = Some(s);
		}
	}
	Ok(selected)
}

/// Trial swap between `last_price` and `order_price`, falling back to a fractional
/// fill at `order_price`.
pub fn calculate_swap(
	book: &OrderBook,
	direction: PriceDirection,
	x: Dec,
	y: Dec,
	order_price: Dec,
	last_price: Dec,
) -> Result<BatchResult, ArithmeticError> {
	let two = Dec::saturating_from_integer(2);
	let mid_price = last_price.checked_add_res(&order_price)?.checked_div_res(&two)?;
	let mut r = BatchResult::new(direction, Dec::zero()).with_executable(book.executable_amount(mid_price));

	// swap price of the doubled reserves: (X + 2EX) / (Y + 2EY)
	r.swap_price = x
		.checked_add_res(&r.ex.checked_mul_res(&two)?)?
		.checked_div_res(&y.checked_add_res(&r.ey.checked_mul_res(&two)?)?)?;

	let mut match_type = None;
	match direction {
		PriceDirection::Increase => {
			r.pool_y = pool_y_delta(x, y, r.swap_price)?;
			if last_price < r.swap_price && r.swap_price < order_price && !r.pool_y.is_negative() {
				match_type = Some(exact_or_none(&r));
			}
		},
		_ => {
			r.pool_x = pool_x_delta(x, y, r.swap_price)?;
			if order_price < r.swap_price && r.swap_price < last_price && !r.pool_x.is_negative() {
				match_type = Some(exact_or_none(&r));
			}
		},
	}

	r.match_type = match match_type {
		Some(match_type) => match_type,
		None => {
			r = r.with_executable(book.executable_amount(order_price));
			r.swap_price = order_price;
			// round towards the pool
			match direction {
				PriceDirection::Increase => {
					r.pool_y = pool_y_delta(x, y, order_price)?;
					r.ex = cmp::min(r.ex, r.ey.checked_add_res(&r.pool_y)?.checked_mul_res(&order_price)?).ceil();
					let ey = cmp::min(r.ey, r.ex.checked_div_res(&order_price)?.checked_sub_res(&r.pool_y)?);
					r.ey = cmp::max(ey, Dec::zero()).ceil();
				},
				_ => {
					r.pool_x = pool_x_delta(x, y, order_price)?;
					r.ey = cmp::min(r.ey, r.ex.checked_add_res(&r.pool_x)?.checked_div_res(&order_price)?).ceil();
					let ex = cmp::min(r.ex, r.ey.checked_mul_res(&order_price)?.checked_sub_res(&r.pool_x)?);
					r.ex = cmp::max(ex, Dec::zero()).ceil();
				},
			}
			MatchType::Fractional
		},
	};

	let pool_price = x.checked_div_res(&y)?;
	r.transact_amount = match direction {
		PriceDirection::Increase =>
			if r.swap_price < pool_price || r.pool_y.is_negative() {
				Dec::zero()
			} else {
				cmp::min(r.ex, r.ey.checked_add_res(&r.pool_y)?.checked_mul_res(&r.swap_price)?)
			},
		_ =>
			if r.swap_price > pool_price || r.pool_x.is_negative() {
				Dec::zero()
			} else {
				cmp::min(r.ey, r.ex.checked_add_res(&r.pool_x)?.checked_div_res(&r.swap_price)?)
			},
	};
	Ok(r)
}

fn exact_or_none(r: &BatchResult) -> MatchType {
	if r.ex.is_zero() && r.ey.is_zero() {
		MatchType::NoMatch
	} else {
		MatchType::Exact
	}
}

/// `(P·Y − X) / 2P`, the `Y` the pool sells when the price rises to `price`.
fn pool_y_delta(x: Dec, y: Dec, price: Dec) -> Result<Dec, ArithmeticError> {
	price
		.checked_mul_res(&y)?
		.checked_sub_res(&x)?
		.checked_div_res(&price.checked_mul_res(&Dec::saturating_from_integer(2))?)
}

/// `(X − P·Y) / 2`, the `X` the pool sells when the price falls to `price`.
fn pool_x_delta(x: Dec, y: Dec, price: Dec) -> Result<Dec, ArithmeticError> {
	x.checked_sub_res(&price.checked_mul_res(&y)?)?
		.checked_div_res(&Dec::saturating_from_integer(2))
}

/// Assigns `executable` volume of one side to its orders, best price first.
///
/// Orders at the same price form a tier and share one fill ratio, so arrival order
/// never matters.
pub fn find_order_match(
	direction: OrderDirection,
	mut orders: Vec<SwapOrder>,
	executable: Dec,
	swap_price: Dec,
) -> Result<OrderMatch, BatchError> {
	let mut order_match = OrderMatch::default();
	if !executable.is_positive() {
		return Ok(order_match)
	}

	match direction {
		OrderDirection::XtoY => orders.sort_by(|a, b| b.price.cmp(&a.price)),
		OrderDirection::YtoX => orders.sort_by(|a, b| a.price.cmp(&b.price)),
	}

	let mut accumulated = Dec::zero();
	let mut start = 0;
	while start < orders.len() && accumulated < executable {
		let price = orders[start].price;
		let crosses = match direction {
			OrderDirection::XtoY => price >= swap_price,
			OrderDirection::YtoX => price <= swap_price,
		};
		if !crosses {
			break
		}

		let end = orders[start..].iter().position(|o| o.price != price).map_or(orders.len(), |n| start + n);
		let tier = &orders[start..end];
		let mut tier_amount = Dec::zero();
		for order in tier {
			tier_amount = tier_amount.checked_add_res(&dec(order.offer_amount))?;
		}
		start = end;
		if tier_amount.is_zero() {
			continue
		}

		let mut ratio = if accumulated.checked_add_res(&tier_amount)? >= executable {
			executable.checked_sub_res(&accumulated)?.checked_div_res(&tier_amount)?
		} else {
			Dec::one()
		};
		if ratio > Dec::one() {
			return Err(BatchError::Fatal("fill ratio above one"))
		}
		if !ratio.is_positive() {
			ratio = Dec::one();
		}

		for order in tier {
			let offer = dec(order.offer_amount);
			let reserved_fee = dec(order.reserved_fee);
			let mut transacted = offer.checked_mul_res(&ratio)?.ceil();
			if offer.checked_sub_res(&transacted)? <= Dec::one() {
				transacted = offer;
			}
			let offer_fee_amount =
				if transacted == offer { reserved_fee } else { reserved_fee.checked_mul_res(&ratio)? };
			let exchanged = match direction {
				OrderDirection::XtoY => transacted.checked_div_res(&swap_price)?,
				OrderDirection::YtoX => transacted.checked_mul_res(&swap_price)?,
			};

			match direction {
				OrderDirection::XtoY => {
					order_match.pool_x_delta = order_match.pool_x_delta.checked_add_res(&transacted)?;
					order_match.pool_y_delta = order_match.pool_y_delta.checked_sub_res(&exchanged)?;
				},
				OrderDirection::YtoX => {
					order_match.pool_y_delta = order_match.pool_y_delta.checked_add_res(&transacted)?;
					order_match.pool_x_delta = order_match.pool_x_delta.checked_sub_res(&exchanged)?;
				},
			}
			order_match.results.push(MatchResult {
				msg_index: order.msg_index,
				direction,
				order_price: order.price,
				offer_amount: offer,
				transacted_amount: transacted,
				exchanged_demand_amount: exchanged,
				offer_fee_amount,
			});
		}
		accumulated = accumulated.checked_add_res(&tier_amount)?;
	}
	Ok(order_match)
}

/// Distance of the traded value from the clearing price, in `X`.
pub fn value_drift(pool_x_delta: Dec, pool_y_delta: Dec, swap_price: Dec) -> Result<Dec, ArithmeticError> {
	Ok(abs(pool_x_delta.checked_add_res(&swap_price.checked_mul_res(&pool_y_delta)?)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	const X: Balance = 1_000_000_000;
	const Y: Balance = 1_000_000_000;

	fn price(n: u128, d: u128) -> Dec {
		Dec::saturating_from_rational(n, d)
	}

	fn order(msg_index: MsgIndex, direction: OrderDirection, p: Dec, amount: Balance) -> SwapOrder {
		SwapOrder { msg_index, direction, price: p, offer_amount: amount, reserved_fee: amount * 3 / 1000 }
	}

	#[test]
	fn buy_pressure_clears_above_pool_price() {
		let orders = vec![order(1, OrderDirection::XtoY, price(11, 10), 10_000_000)];
		let batch = match_orders(&orders, X, Y, true).unwrap().unwrap();

		assert_eq!(batch.scenario.price_direction, PriceDirection::Increase);
		assert_eq!(batch.scenario.match_type, MatchType::Exact);
		assert_eq!(batch.scenario.swap_price, price(102, 100));
		assert_eq!(batch.x_to_y.results.len(), 1);
		let fill = &batch.x_to_y.results[0];
		assert_eq!(fill.transacted_amount, dec(10_000_000));
		assert_eq!(fill.exchanged_demand_amount.trunc(), dec(9_803_921));
		assert_eq!(fill.offer_fee_amount, dec(30_000));
		assert!(batch.y_to_x.results.is_empty());
	}

	#[test]
	fn sell_pressure_clears_below_pool_price() {
		let orders = vec![order(1, OrderDirection::YtoX, price(9, 10), 10_000_000)];
		let batch = match_orders(&orders, X, Y, true).unwrap().unwrap();

		assert_eq!(batch.scenario.price_direction, PriceDirection::Decrease);
		assert_eq!(batch.scenario.match_type, MatchType::Exact);
		assert!(batch.scenario.swap_price < Dec::one());
		let fill = &batch.y_to_x.results[0];
		assert_eq!(fill.transacted_amount, dec(10_000_000));
		assert_eq!(fill.exchanged_demand_amount.trunc(), dec(9_803_921));
	}

	#[test]
	fn balanced_book_nets_at_pool_price() {
		let orders = vec![
			order(1, OrderDirection::XtoY, Dec::one(), 1_000_000),
			order(2, OrderDirection::YtoX, Dec::one(), 1_000_000),
		];
		let batch = match_orders(&orders, X, Y, true).unwrap().unwrap();
		assert_eq!(batch.scenario.match_type, MatchType::Exact);
		assert_eq!(batch.scenario.swap_price, Dec::one());
		assert_eq!(batch.results().count(), 2);
		assert_eq!(batch.x_to_y.pool_x_delta.checked_add_res(&batch.y_to_x.pool_x_delta), Ok(Dec::zero()));
	}

	#[test]
	fn stay_reduces_the_larger_side() {
		let book = OrderBook::build(&[
			order(1, OrderDirection::XtoY, Dec::one(), 2_000_000),
			order(2, OrderDirection::YtoX, Dec::one(), 1_000_000),
		]);
		let r = calculate_match_stay(&book, Dec::one()).unwrap();
		assert_eq!(r.match_type, MatchType::Fractional);
		assert_eq!(r.ex, dec(1_000_000));
		assert_eq!(r.ey, dec(1_000_000));
		assert_eq!(r.original_ex, 2_000_000);
	}

	#[test]
	fn one_sided_book_at_pool_price_does_not_match() {
		let orders = vec![order(1, OrderDirection::XtoY, Dec::one(), 1_000_000)];
		let batch = match_orders(&orders, X, Y, true).unwrap().unwrap();
		assert_eq!(batch.scenario.match_type, MatchType::NoMatch);
		assert_eq!(batch.results().count(), 0);
	}

	#[test]
	fn same_price_tier_is_filled_pro_rata() {
		let orders = vec![
			order(1, OrderDirection::XtoY, price(11, 10), 3_000_000),
			order(2, OrderDirection::XtoY, price(11, 10), 1_000_000),
			order(3, OrderDirection::XtoY, price(9, 10), 5_000_000),
		];
		let m = find_order_match(OrderDirection::XtoY, orders, dec(2_000_000), Dec::one()).unwrap();
		assert_eq!(m.results.len(), 2);
		assert_eq!(m.results[0].msg_index, 1);
		assert_eq!(m.results[0].transacted_amount, dec(1_500_000));
		assert_eq!(m.results[1].transacted_amount, dec(500_000));
		assert_eq!(m.results[0].offer_fee_amount, dec(4_500));
		assert_eq!(m.pool_x_delta, dec(2_000_000));
		assert_eq!(m.pool_y_delta, Dec::zero().checked_sub_res(&dec(2_000_000)).unwrap());
	}

	#[test]
	fn better_tiers_fill_first() {
		let orders = vec![
			order(1, OrderDirection::YtoX, price(9, 10), 1_000_000),
			order(2, OrderDirection::YtoX, price(8, 10), 1_000_000),
		];
		let m = find_order_match(OrderDirection::YtoX, orders, dec(1_000_000), Dec::one()).unwrap();
		assert_eq!(m.results.len(), 1);
		assert_eq!(m.results[0].msg_index, 2);
		assert_eq!(m.results[0].exchanged_demand_amount, dec(1_000_000));
	}

	#[test]
	fn nothing_executable_yields_no_fills() {
		let orders = vec![order(1, OrderDirection::XtoY, price(11, 10), 3_000_000)];
		let m = find_order_match(OrderDirection::XtoY, orders, Dec::zero(), Dec::one()).unwrap();
		assert_eq!(m, OrderMatch::default());
	}

	#[test]
	fn near_complete_fill_takes_the_whole_offer() {
		let orders = vec![order(1, OrderDirection::XtoY, Dec::one(), 1_000)];
		let m = find_order_match(OrderDirection::XtoY, orders, dec(999), Dec::one()).unwrap();
		assert_eq!(m.results[0].transacted_amount, dec(1_000));
		assert_eq!(m.results[0].offer_fee_amount, dec(3));
	}

	#[test]
	fn deep_pool_clears_without_overflow() {
		let reserve: Balance = 200_000_000_000_000_000_000;
		let orders = vec![order(1, OrderDirection::XtoY, price(11, 10), 1_000_000_000_000_000_000)];
		let batch = match_orders(&orders, reserve, reserve, true).unwrap().unwrap();

		assert_eq!(batch.scenario.match_type, MatchType::Exact);
		assert_eq!(batch.scenario.swap_price, price(101, 100));
		let fill = &batch.x_to_y.results[0];
		assert_eq!(fill.transacted_amount, dec(1_000_000_000_000_000_000));
		assert_eq!(fill.exchanged_demand_amount.trunc(), dec(990_099_009_900_990_099));
	}

	#[test]
	fn overflow_past_the_decimal_range_is_reported() {
		// 1e30 Y valued at a pool price of u128::MAX is past the decimal range
		let orders = vec![order(1, OrderDirection::YtoX, Dec::one(), 1_000_000_000_000_000_000_000_000_000_000)];
		assert_eq!(
			match_orders(&orders, u128::MAX, 1, true),
			Err(BatchError::Arithmetic(ArithmeticError::Overflow))
		);
	}

	#[test]
	fn buy_levels_without_a_gap_settle_fractionally_at_the_outer_level() {
		// every trial price overshoots the next level, so each scan falls back
		let book = OrderBook::build(&[
			order(1, OrderDirection::XtoY, price(101, 100), 20_000_000),
			order(2, OrderDirection::XtoY, price(102, 100), 20_000_000),
		]);
		assert_eq!(book.price_direction(Dec::one()), Ok(PriceDirection::Increase));

		let r = calculate_match(&book, PriceDirection::Increase, dec(X), dec(Y)).unwrap().unwrap();
		assert_eq!(r.match_type, MatchType::Fractional);
		assert_eq!(r.swap_price, price(102, 100));
		assert_eq!(r.original_ex, 20_000_000);
		assert_eq!(r.ex, dec(10_000_000));
		assert_eq!(r.ey, Dec::zero());
		// (1.02·Y − X) / 2.04
		assert_eq!(r.pool_y, price(1_000_000_000, 102));

		let orders = vec![
			order(1, OrderDirection::XtoY, price(101, 100), 20_000_000),
			order(2, OrderDirection::XtoY, price(102, 100), 20_000_000),
		];
		let batch = match_orders(&orders, X, Y, true).unwrap().unwrap();
		assert_eq!(batch.x_to_y.results.len(), 1);
		assert_eq!(batch.x_to_y.results[0].msg_index, 2);
		assert_eq!(batch.x_to_y.results[0].transacted_amount, dec(10_000_000));
	}

	#[test]
	fn sell_levels_without_a_gap_settle_fractionally_at_the_outer_level() {
		let book = OrderBook::build(&[
			order(1, OrderDirection::YtoX, price(99, 100), 20_000_000),
			order(2, OrderDirection::YtoX, price(98, 100), 20_000_000),
		]);
		assert_eq!(book.price_direction(Dec::one()), Ok(PriceDirection::Decrease));

		let r = calculate_match(&book, PriceDirection::Decrease, dec(X), dec(Y)).unwrap().unwrap();
		assert_eq!(r.match_type, MatchType::Fractional);
		assert_eq!(r.swap_price, price(98, 100));
		assert_eq!(r.original_ey, 20_000_000);
		// ceil((0 + pool_x) / 0.98)
		assert_eq!(r.ey, dec(10_204_082));
		assert_eq!(r.ex, Dec::zero());
		assert_eq!(r.pool_x, dec(10_000_000));
	}

	#[test]
	fn scenario_short_of_crossing_volume_is_not_selected() {
		let book = OrderBook::build(&[
			order(1, OrderDirection::XtoY, price(110, 100), 121_000_000),
			order(2, OrderDirection::YtoX, price(108, 100), 90_000_000),
		]);
		let x = dec(X);
		let y = dec(Y);

		// clearing at 1.10 trades at least as much, but leaves sells below it unfilled
		let outer = calculate_swap(&book, PriceDirection::Increase, x, y, price(110, 100), price(108, 100)).unwrap();
		assert_eq!(outer.transact_amount, dec(121_000_000));
		assert_eq!(book.must_executable_amount(outer.swap_price), (0, 90_000_000));
		assert!(outer.ey < dec(90_000_000));

		let r = calculate_match(&book, PriceDirection::Increase, x, y).unwrap().unwrap();
		assert_eq!(r.match_type, MatchType::Fractional);
		assert_eq!(r.swap_price, price(108, 100));
		assert_eq!(r.ex, dec(121_000_000));
		assert_eq!(r.ey, dec(75_000_000));
		assert_eq!(r.pool_y, price(8_000_000_000, 216));
		assert!(r.transact_amount < outer.transact_amount);
	}
}
