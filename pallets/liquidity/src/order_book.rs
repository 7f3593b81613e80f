//! Price-indexed view of the live swap requests of one pool.

use crate::{
	math::{dec, dec_from_price, CheckedAddRes, CheckedMulRes, Dec},
	types::{MsgIndex, PriceDirection, SwapRequestState},
};
use primitives::{Balance, TradingPair};
use sp_runtime::{ArithmeticError, RuntimeDebug};
use sp_std::{collections::btree_map::BTreeMap, prelude::*};

#[derive(Clone, Copy, Eq, PartialEq, RuntimeDebug)]
pub enum OrderDirection {
	/// Offers `X` for `Y`, a buy order at price `X / Y`.
	XtoY,
	/// Offers `Y` for `X`, a sell order.
	YtoX,
}

/// A live swap request as the matching engine sees it, addressed by `msg_index`.
#[derive(Clone, Eq, PartialEq, RuntimeDebug)]
pub struct SwapOrder {
	pub msg_index: MsgIndex,
	pub direction: OrderDirection,
	pub price: Dec,
	/// Remaining offer amount.
	pub offer_amount: Balance,
	pub reserved_fee: Balance,
}

impl SwapOrder {
	pub fn from_state<AccountId, BlockNumber>(
		pair: &TradingPair,
		state: &SwapRequestState<AccountId, BlockNumber>,
	) -> Self {
		let direction = if state.request.offer_coin.currency_id == pair.first() {
			OrderDirection::XtoY
		} else {
			OrderDirection::YtoX
		};
		SwapOrder {
			msg_index: state.msg_index,
			direction,
			price: dec_from_price(state.request.order_price),
			offer_amount: state.remaining_offer_amount,
			reserved_fee: state.reserved_offer_fee,
		}
	}
}

/// Splits orders into the buy side (`XtoY`) and the sell side (`YtoX`), keeping their order.
pub fn split_orders(orders: &[SwapOrder]) -> (Vec<SwapOrder>, Vec<SwapOrder>) {
	orders.iter().cloned().partition(|order| order.direction == OrderDirection::XtoY)
}

#[derive(Clone, Eq, PartialEq, RuntimeDebug)]
pub struct OrderByPrice {
	pub price: Dec,
	pub buy_offer_amount: Balance,
	pub sell_offer_amount: Balance,
	pub msg_indexes: Vec<MsgIndex>,
}

/// Price levels in ascending order.
#[derive(Clone, Default, Eq, PartialEq, RuntimeDebug)]
pub struct OrderBook {
	levels: Vec<OrderByPrice>,
}

impl OrderBook {
	pub fn build(orders: &[SwapOrder]) -> Self {
		let mut levels: BTreeMap<Dec, OrderByPrice> = BTreeMap::new();
		for order in orders {
			let level = levels.entry(order.price).or_insert_with(|| OrderByPrice {
				price: order.price,
				buy_offer_amount: 0,
				sell_offer_amount: 0,
				msg_indexes: Vec::new(),
			});
			match order.direction {
				OrderDirection::XtoY =>
					level.buy_offer_amount = level.buy_offer_amount.saturating_add(order.offer_amount),
				OrderDirection::YtoX =>
					level.sell_offer_amount = level.sell_offer_amount.saturating_add(order.offer_amount),
			}
			level.msg_indexes.push(order.msg_index);
		}
		OrderBook { levels: levels.into_values().collect() }
	}

	pub fn levels(&self) -> &[OrderByPrice] {
		&self.levels
	}

	pub fn is_empty(&self) -> bool {
		self.levels.is_empty()
	}

	/// Buy volume priced at or above `price` and sell volume priced at or below it.
	pub fn executable_amount(&self, price: Dec) -> (Balance, Balance) {
		self.levels.iter().fold((0, 0), |(buy, sell), level| {
			let buy =
				if level.price >= price { buy.saturating_add(level.buy_offer_amount) } else { buy };
			let sell =
				if level.price <= price { sell.saturating_add(level.sell_offer_amount) } else { sell };
			(buy, sell)
		})
	}

	/// Volume that strictly crosses `price` and therefore has to be filled there.
	pub fn must_executable_amount(&self, price: Dec) -> (Balance, Balance) {
		self.levels.iter().fold((0, 0), |(buy, sell), level| {
			let buy =
				if level.price > price { buy.saturating_add(level.buy_offer_amount) } else { buy };
			let sell =
				if level.price < price { sell.saturating_add(level.sell_offer_amount) } else { sell };
			(buy, sell)
		})
	}

	pub fn price_direction(&self, current_price: Dec) -> Result<PriceDirection, ArithmeticError> {
		let (mut buy_above, mut buy_at, mut sell_at, mut sell_below) = (0u128, 0u128, 0u128, 0u128);
		for level in &self.levels {
			if level.price > current_price {
				buy_above = buy_above.saturating_add(level.buy_offer_amount);
			} else if level.price < current_price {
				sell_below = sell_below.saturating_add(level.sell_offer_amount);
			} else {
				buy_at = buy_at.saturating_add(level.buy_offer_amount);
				sell_at = sell_at.saturating_add(level.sell_offer_amount);
			}
		}

		// sell volume is denominated in Y, the price converts it into X
		let buy_above = dec(buy_above);
		let sell_below_in_x = current_price.checked_mul_res(&dec(sell_below))?;
		let sell_at_or_below_in_x = current_price.checked_mul_res(&dec(sell_below.saturating_add(sell_at)))?;

		if buy_above > sell_at_or_below_in_x {
			Ok(PriceDirection::Increase)
		} else if sell_below_in_x > buy_above.checked_add_res(&dec(buy_at))? {
			Ok(PriceDirection::Decrease)
		} else {
			Ok(PriceDirection::Stay)
		}
	}
}
