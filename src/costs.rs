//! Pure gas cost functions.

use primitive_types::U256;

use crate::config::Config;
use crate::error::{ExitError, ExitException};

/// Maximum gas that may be forwarded to a nested call: all but one
/// 64th of the remaining gas (EIP-150).
#[must_use]
pub fn l64(gas: U256) -> U256 {
	gas - gas / U256::from(64)
}

/// Word count of the memory range touched by an access of `len` bytes at
/// `offset`, or `None` for a zero-length access.
///
/// A range end beyond the addressable space can never be paid for, so it
/// surfaces as out of gas.
pub fn memory_words(offset: U256, len: U256) -> Result<Option<usize>, ExitError> {
	if len.is_zero() {
		return Ok(None);
	}

	let end = offset.checked_add(len).ok_or(ExitException::OutOfGas)?;
	if end > U256::from(usize::MAX) {
		return Err(ExitException::OutOfGas.into());
	}
	let end = end.as_usize();

	let rem = end % 32;
	Ok(Some(if rem == 0 { end / 32 } else { end / 32 + 1 }))
}

/// Total cost of keeping `words` 32-byte words of memory: the linear
/// term plus the quadratic term.
pub fn memory_gas(words: usize, config: &Config) -> Result<U256, ExitError> {
	let words = U256::from(words);

	let linear = words
		.checked_mul(U256::from(config.gas_memory))
		.ok_or(ExitException::OutOfGas)?;
	let quad = words
		.checked_mul(words)
		.ok_or(ExitException::OutOfGas)?
		/ U256::from(config.gas_quad_coeff_div);

	linear.checked_add(quad).ok_or(ExitException::OutOfGas.into())
}
