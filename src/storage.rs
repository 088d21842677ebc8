use primitive_types::{H256, U256};

use crate::error::ExitError;
use crate::gasometer::Gasometer;

/// Storage slot values observed before an SSTORE.
///
/// `original` is the value at the start of the transaction, `current`
/// the value in the pending state. The pair comes from the hardfork
/// aware storage reader and is passed explicitly; emptiness is an
/// explicit zero-value check on the respective field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlotValues {
	/// Value of the slot at the start of the transaction.
	pub original: H256,
	/// Value of the slot in the current pending state.
	pub current: H256,
}

/// Charge gas and adjust the refund counter for writing `new` into a
/// slot holding `found`, under the gasometer's active gas schedule.
///
/// Covers both metering families: the net gas metering of EIP-1283 when
/// the schedule enables it, the Yellow Paper rule otherwise.
pub fn record_sstore(
	gasometer: &mut Gasometer,
	found: SlotValues,
	new: H256,
) -> Result<(), ExitError> {
	if gasometer.config.eip1283_sstore_gas_metering {
		record_net_sstore(gasometer, found, new)
	} else {
		record_legacy_sstore(gasometer, found, new)
	}
}

/// EIP-1283: cost and refund depend on the whole
/// (original, current, new) triple.
fn record_net_sstore(
	gasometer: &mut Gasometer,
	found: SlotValues,
	new: H256,
) -> Result<(), ExitError> {
	let config = gasometer.config;
	let SlotValues { original, current } = found;

	if current == new {
		return gasometer.record_cost(U256::from(config.gas_net_sstore_noop));
	}

	if original == current {
		// The slot has not been touched in this transaction yet.
		return if original == H256::zero() {
			gasometer.record_cost(U256::from(config.gas_net_sstore_init))
		} else {
			gasometer.record_cost(U256::from(config.gas_net_sstore_clean))?;
			if new == H256::zero() {
				gasometer.record_refund(U256::from(config.refund_net_sstore_clear));
			}
			Ok(())
		};
	}

	// Dirty slot: every further write is cheap, with the refund counter
	// keeping track of clears and restores.
	gasometer.record_cost(U256::from(config.gas_net_sstore_dirty))?;

	if original != H256::zero() {
		if current == H256::zero() {
			gasometer.sub_refund(U256::from(config.refund_net_sstore_clear));
		}
		if new == H256::zero() {
			gasometer.record_refund(U256::from(config.refund_net_sstore_clear));
		}
	}

	if original == new {
		if original == H256::zero() {
			gasometer.record_refund(U256::from(config.refund_net_sstore_reset_clear));
		} else {
			gasometer.record_refund(U256::from(config.refund_net_sstore_reset));
		}
	}

	Ok(())
}

/// Pre-Constantinople rule: cost and refund depend on the current value
/// only.
fn record_legacy_sstore(
	gasometer: &mut Gasometer,
	found: SlotValues,
	new: H256,
) -> Result<(), ExitError> {
	let config = gasometer.config;

	if found.current == H256::zero() && new != H256::zero() {
		gasometer.record_cost(U256::from(config.gas_sstore_set))
	} else {
		gasometer.record_cost(U256::from(config.gas_sstore_reset))?;
		if found.current != H256::zero() && new == H256::zero() {
			gasometer.record_refund(U256::from(config.refund_sstore_clears));
		}
		Ok(())
	}
}
