//! Decimal and balance arithmetic.
//!
//! Matching runs on [`Dec`], a signed 18-decimal fixed point, because pool deltas of
//! a trial clearing price can be negative. Its magnitude is a `U256`, so every `u128`
//! balance and every `FixedU128` price converts exactly and products of reserves stay
//! in range. Ledger amounts stay integral and are scaled through `U256` as well.

use primitives::Balance;
use sp_core::{U256, U512};
use sp_runtime::{traits::Zero, ArithmeticError, FixedPointNumber, FixedU128, RuntimeDebug};
use sp_std::cmp::Ordering;

/// Fixed point scale, shared with `FixedU128`.
const DIV: u128 = 1_000_000_000_000_000_000;

fn div() -> U256 {
	U256::from(DIV)
}

/// Signed decimal with 18 fractional digits. Zero is never negative.
#[derive(Clone, Copy, Default, Eq, PartialEq, RuntimeDebug)]
pub struct Dec {
	negative: bool,
	magnitude: U256,
}

impl Dec {
	fn new(negative: bool, magnitude: U256) -> Self {
		Dec { negative: negative && !magnitude.is_zero(), magnitude }
	}

	pub fn zero() -> Self {
		Dec::default()
	}

	pub fn one() -> Self {
		Dec::new(false, div())
	}

	pub fn saturating_from_integer(n: i128) -> Self {
		Dec::new(n < 0, U256::from(n.unsigned_abs()) * div())
	}

	/// `n / d`, truncated to 18 decimals. A zero denominator saturates.
	pub fn saturating_from_rational(n: u128, d: u128) -> Self {
		if d.is_zero() {
			return Dec::new(false, U256::max_value())
		}
		Dec::new(false, U256::from(n) * div() / U256::from(d))
	}

	pub fn is_zero(&self) -> bool {
		self.magnitude.is_zero()
	}

	pub fn is_positive(&self) -> bool {
		!self.negative && !self.magnitude.is_zero()
	}

	pub fn is_negative(&self) -> bool {
		self.negative
	}

	/// Rounds toward zero.
	pub fn trunc(self) -> Self {
		Dec::new(self.negative, self.magnitude - self.magnitude % div())
	}

	/// Smallest integer not below `self`.
	pub fn ceil(self) -> Self {
		let truncated = self.trunc();
		if self.negative || truncated == self {
			truncated
		} else {
			Dec::new(false, truncated.magnitude.saturating_add(div()))
		}
	}

	pub fn abs(self) -> Self {
		Dec::new(false, self.magnitude)
	}

	pub fn checked_add(&self, other: &Self) -> Option<Self> {
		if self.negative == other.negative {
			return self.magnitude.checked_add(other.magnitude).map(|m| Dec::new(self.negative, m))
		}
		Some(if self.magnitude >= other.magnitude {
			Dec::new(self.negative, self.magnitude - other.magnitude)
		} else {
			Dec::new(other.negative, other.magnitude - self.magnitude)
		})
	}

	pub fn checked_sub(&self, other: &Self) -> Option<Self> {
		self.checked_add(&Dec::new(!other.negative, other.magnitude))
	}

	/// Product truncated toward zero.
	pub fn checked_mul(&self, other: &Self) -> Option<Self> {
		let product = self.magnitude.full_mul(other.magnitude) / U512::from(DIV);
		U256::try_from(product).ok().map(|m| Dec::new(self.negative != other.negative, m))
	}

	/// Quotient truncated toward zero.
	pub fn checked_div(&self, other: &Self) -> Option<Self> {
		if other.magnitude.is_zero() {
			return None
		}
		let quotient = self.magnitude.full_mul(div()) / U512::from(other.magnitude);
		U256::try_from(quotient).ok().map(|m| Dec::new(self.negative != other.negative, m))
	}
}

impl PartialOrd for Dec {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Dec {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.negative, other.negative) {
			(false, false) => self.magnitude.cmp(&other.magnitude),
			(true, true) => other.magnitude.cmp(&self.magnitude),
			(false, true) => Ordering::Greater,
			(true, false) => Ordering::Less,
		}
	}
}

pub trait CheckedAddRes: Sized {
	fn checked_add_res(&self, other: &Self) -> Result<Self, ArithmeticError>;
}

pub trait CheckedSubRes: Sized {
	fn checked_sub_res(&self, other: &Self) -> Result<Self, ArithmeticError>;
}

pub trait CheckedMulRes: Sized {
	fn checked_mul_res(&self, other: &Self) -> Result<Self, ArithmeticError>;
}

pub trait CheckedDivRes: Sized {
	fn checked_div_res(&self, other: &Self) -> Result<Self, ArithmeticError>;
}

macro_rules! impl_checked_res {
	($($t:ty),*) => {
		$(
			impl CheckedAddRes for $t {
				fn checked_add_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
					<$t>::checked_add(*self, *other).ok_or(ArithmeticError::Overflow)
				}
			}

			impl CheckedSubRes for $t {
				fn checked_sub_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
					<$t>::checked_sub(*self, *other).ok_or(ArithmeticError::Underflow)
				}
			}

			impl CheckedMulRes for $t {
				fn checked_mul_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
					<$t>::checked_mul(*self, *other).ok_or(ArithmeticError::Overflow)
				}
			}

			impl CheckedDivRes for $t {
				fn checked_div_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
					if other.is_zero() {
						return Err(ArithmeticError::DivisionByZero)
					}
					<$t>::checked_div(*self, *other).ok_or(ArithmeticError::Overflow)
				}
			}
		)*
	};
}

impl_checked_res!(u128);

impl CheckedAddRes for Dec {
	fn checked_add_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
		self.checked_add(other).ok_or(ArithmeticError::Overflow)
	}
}

impl CheckedSubRes for Dec {
	fn checked_sub_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
		self.checked_sub(other).ok_or(ArithmeticError::Underflow)
	}
}

impl CheckedMulRes for Dec {
	fn checked_mul_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
		self.checked_mul(other).ok_or(ArithmeticError::Overflow)
	}
}

impl CheckedDivRes for Dec {
	fn checked_div_res(&self, other: &Self) -> Result<Self, ArithmeticError> {
		if other.is_zero() {
			return Err(ArithmeticError::DivisionByZero)
		}
		self.checked_div(other).ok_or(ArithmeticError::Overflow)
	}
}

pub fn dec(amount: Balance) -> Dec {
	Dec::new(false, U256::from(amount) * div())
}

/// Both types carry 18 decimals.
pub fn dec_from_price(price: FixedU128) -> Dec {
	Dec::new(false, U256::from(price.into_inner()))
}

pub fn price_from_dec(value: Dec) -> Result<FixedU128, ArithmeticError> {
	if value.is_negative() {
		return Err(ArithmeticError::Underflow)
	}
	to_balance(value.magnitude).map(FixedU128::from_inner)
}

/// Integer part of a non-negative decimal.
pub fn trunc_balance(value: Dec) -> Result<Balance, ArithmeticError> {
	let whole = value.magnitude / div();
	if value.is_negative() && !whole.is_zero() {
		return Err(ArithmeticError::Underflow)
	}
	to_balance(whole)
}

pub fn abs(value: Dec) -> Dec {
	value.abs()
}

fn to_balance(value: U256) -> Result<Balance, ArithmeticError> {
	TryInto::<Balance>::try_into(value).map_err(|_| ArithmeticError::Overflow)
}

/// `floor(a * b / c)`
pub fn mul_div_floor(a: Balance, b: Balance, c: Balance) -> Result<Balance, ArithmeticError> {
	if c.is_zero() {
		return Err(ArithmeticError::DivisionByZero)
	}
	let product = U256::from(a).checked_mul(U256::from(b)).ok_or(ArithmeticError::Overflow)?;
	to_balance(product / U256::from(c))
}

/// `floor(amount * rate)`
pub fn mul_floor(rate: FixedU128, amount: Balance) -> Result<Balance, ArithmeticError> {
	mul_div_floor(amount, rate.into_inner(), <FixedU128 as FixedPointNumber>::DIV)
}

/// `ceil(amount * rate)`
pub fn mul_ceil(rate: FixedU128, amount: Balance) -> Result<Balance, ArithmeticError> {
	let div = U256::from(<FixedU128 as FixedPointNumber>::DIV);
	let product = U256::from(amount)
		.checked_mul(U256::from(rate.into_inner()))
		.ok_or(ArithmeticError::Overflow)?;
	let rounded = product.checked_add(div - U256::one()).ok_or(ArithmeticError::Overflow)?;
	to_balance(rounded / div)
}

/// Reserve paid out for burning `share` of `supply`, net of `fee_rate`:
/// `floor(reserve * share * (1 - fee_rate) / supply)`.
pub fn withdraw_amount(
	reserve: Balance,
	share: Balance,
	supply: Balance,
	fee_rate: FixedU128,
) -> Result<Balance, ArithmeticError> {
	if supply.is_zero() {
		return Err(ArithmeticError::DivisionByZero)
	}
	let div = U256::from(<FixedU128 as FixedPointNumber>::DIV);
	let keep = div.checked_sub(U256::from(fee_rate.into_inner())).ok_or(ArithmeticError::Underflow)?;
	let gross = U256::from(reserve).checked_mul(U256::from(share)).ok_or(ArithmeticError::Overflow)?;
	let net = gross.checked_mul(keep).ok_or(ArithmeticError::Overflow)?;
	let denominator = U256::from(supply).checked_mul(div).ok_or(ArithmeticError::Overflow)?;
	to_balance(net / denominator)
}

#[cfg(test)]
mod tests {
	use super::*;
	use sp_std::cmp;

	#[test]
	fn fee_rounding() {
		let rate = FixedU128::saturating_from_rational(3, 1000);
		assert_eq!(mul_ceil(rate, 10_000_000), Ok(30_000));
		assert_eq!(mul_ceil(rate, 1), Ok(1));
		assert_eq!(mul_floor(rate, 1), Ok(0));
		assert_eq!(mul_floor(FixedU128::saturating_from_rational(1, 10), 1_000_000_000), Ok(100_000_000));
	}

	#[test]
	fn decimal_conversions() {
		assert_eq!(trunc_balance(Dec::saturating_from_rational(19, 10)), Ok(1));
		assert_eq!(trunc_balance(Dec::saturating_from_integer(-1)), Err(ArithmeticError::Underflow));
		assert_eq!(trunc_balance(dec(u128::MAX)), Ok(u128::MAX));
		assert_eq!(dec(7), Dec::saturating_from_integer(7));
		let price = FixedU128::saturating_from_rational(11, 10);
		assert_eq!(price_from_dec(dec_from_price(price)), Ok(price));
		assert_eq!(price_from_dec(Dec::saturating_from_integer(-1)), Err(ArithmeticError::Underflow));
		assert_eq!(price_from_dec(dec(u128::MAX)), Err(ArithmeticError::Overflow));
		assert_eq!(abs(Dec::saturating_from_integer(-3)), Dec::saturating_from_integer(3));
	}

	#[test]
	fn signed_decimal_arithmetic() {
		let half = Dec::saturating_from_rational(1, 2);
		let minus_half = Dec::zero().checked_sub_res(&half).unwrap();
		assert!(minus_half.is_negative());
		assert_eq!(minus_half.checked_add_res(&half), Ok(Dec::zero()));
		assert!(!minus_half.checked_add_res(&half).unwrap().is_negative());
		assert_eq!(minus_half.checked_mul_res(&minus_half), Ok(Dec::saturating_from_rational(1, 4)));
		assert_eq!(Dec::one().checked_div_res(&minus_half), Ok(Dec::saturating_from_integer(-2)));

		assert_eq!(Dec::saturating_from_rational(3, 2).ceil(), Dec::saturating_from_integer(2));
		assert_eq!(Dec::saturating_from_rational(3, 2).trunc(), Dec::one());
		let minus_two_and_a_half = Dec::saturating_from_integer(-3).checked_add_res(&half).unwrap();
		assert_eq!(minus_two_and_a_half.ceil(), Dec::saturating_from_integer(-2));
		assert_eq!(minus_half.trunc(), Dec::zero());

		assert!(Dec::saturating_from_integer(-2) < minus_half);
		assert!(minus_half < Dec::zero());
		assert!(Dec::zero() < half);
		assert_eq!(cmp::max(minus_half, Dec::zero()), Dec::zero());
	}

	#[test]
	fn decimal_covers_deep_reserves() {
		// 2e20 scaled by 1e18 is past `i128::MAX`.
		let reserve = dec(200_000_000_000_000_000_000);
		let price = reserve.checked_div_res(&dec(100_000_000_000_000_000_000)).unwrap();
		assert_eq!(price, Dec::saturating_from_integer(2));
		let product = reserve.checked_mul_res(&reserve).unwrap();
		assert_eq!(product.checked_div_res(&reserve), Ok(reserve));
		assert_eq!(trunc_balance(reserve.checked_mul_res(&price).unwrap()), Ok(400_000_000_000_000_000_000));

		let max = dec(u128::MAX);
		assert_eq!(max.checked_mul_res(&max), Err(ArithmeticError::Overflow));
		assert_eq!(Dec::zero().checked_sub_res(&max).unwrap().checked_mul_res(&max), Err(ArithmeticError::Overflow));
	}

	#[test]
	fn checked_ops_report_errors() {
		let one = Dec::one();
		assert_eq!(one.checked_div_res(&Dec::zero()), Err(ArithmeticError::DivisionByZero));
		assert_eq!(0u128.checked_sub_res(&1), Err(ArithmeticError::Underflow));
		assert_eq!(u128::MAX.checked_add_res(&1), Err(ArithmeticError::Overflow));
		assert_eq!(2u128.checked_mul_res(&3), Ok(6));
		assert_eq!(6u128.checked_div_res(&0), Err(ArithmeticError::DivisionByZero));
	}

	#[test]
	fn withdraw_amount_takes_fee() {
		let fee = FixedU128::saturating_from_rational(3, 1000);
		assert_eq!(withdraw_amount(100_000_000, 100_000, 1_000_000, fee), Ok(9_970_000));
		assert_eq!(withdraw_amount(200_000_000, 100_000, 1_000_000, fee), Ok(19_940_000));
		assert_eq!(withdraw_amount(10, 1, 0, fee), Err(ArithmeticError::DivisionByZero));
		assert_eq!(mul_div_floor(1_000_000, 30_000_000, 100_000_000), Ok(300_000));
	}
}
