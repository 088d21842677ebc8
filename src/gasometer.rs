use primitive_types::U256;

use crate::config::Config;
use crate::costs;
use crate::error::{ExitError, ExitException};
use crate::tracing::Event;

/// Per-frame gas accounting.
///
/// All gas arithmetic is carried out at 256-bit width. Every deduction
/// funnels through [Gasometer::record_cost], which is the only place an
/// out-of-gas condition can arise: on failure the remaining gas becomes
/// zero and stays zero.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_left: U256,
	memory_gas: U256,
	refunded_gas: U256,
	/// Active gas schedule.
	pub config: &'config Config,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with the given gas limit.
	#[must_use]
	pub const fn new(gas_limit: U256, config: &'config Config) -> Self {
		Self {
			gas_left: gas_limit,
			memory_gas: U256::zero(),
			refunded_gas: U256::zero(),
			config,
		}
	}

	/// Remaining gas.
	#[inline]
	#[must_use]
	pub const fn gas(&self) -> U256 {
		self.gas_left
	}

	/// Highest memory expansion cost paid so far in this frame.
	#[inline]
	#[must_use]
	pub const fn memory_gas(&self) -> U256 {
		self.memory_gas
	}

	/// Accumulated refund counter.
	#[inline]
	#[must_use]
	pub const fn refunded_gas(&self) -> U256 {
		self.refunded_gas
	}

	/// Maximum gas that may be forwarded to a nested call (EIP-150).
	#[must_use]
	pub fn allowance(&self) -> U256 {
		costs::l64(self.gas_left)
	}

	/// Deduct an explicit cost. If the remaining gas does not cover it,
	/// the remaining gas is set to zero and the operation traps.
	pub fn record_cost(&mut self, cost: U256) -> Result<(), ExitError> {
		if cost > self.gas_left {
			self.gas_left = U256::zero();
			return Err(ExitException::OutOfGas.into());
		}
		self.gas_left -= cost;

		Event::Charge {
			cost,
			gas_left: self.gas_left,
		}
		.emit();

		Ok(())
	}

	/// Credit the refund counter.
	pub fn record_refund(&mut self, refund: U256) {
		self.refunded_gas = self.refunded_gas.saturating_add(refund);

		Event::RefundAdd {
			refund,
			total: self.refunded_gas,
		}
		.emit();
	}

	/// Debit the refund counter. The storage metering never produces a
	/// net-negative counter; saturation guards the arithmetic anyway.
	pub fn sub_refund(&mut self, refund: U256) {
		self.refunded_gas = self.refunded_gas.saturating_sub(refund);

		Event::RefundSub {
			refund,
			total: self.refunded_gas,
		}
		.emit();
	}

	/// Raise the memory expansion account to `cost`, charging only the
	/// part above what this frame already paid. Lower values are no-ops:
	/// memory never shrinks and its cost is never refunded.
	pub fn record_memory_gas(&mut self, cost: U256) -> Result<(), ExitError> {
		if cost > self.memory_gas {
			let extra = cost - self.memory_gas;
			self.record_cost(extra)?;
			self.memory_gas = cost;
		}
		Ok(())
	}
}
