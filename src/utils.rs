//! Small conversion helpers.

use primitive_types::{H160, H256, U256};

use crate::error::{ExitError, ExitFatal};

/// Convert [U256] into [H256].
#[must_use]
pub fn u256_to_h256(v: U256) -> H256 {
	let mut r = H256::zero();
	v.to_big_endian(&mut r[..]);
	r
}

/// Convert [H256] to [U256].
#[must_use]
pub fn h256_to_u256(v: H256) -> U256 {
	U256::from_big_endian(&v[..])
}

/// Convert [U256] into [H160], taking the low 20 bytes.
#[must_use]
pub fn u256_to_h160(v: U256) -> H160 {
	u256_to_h256(v).into()
}

/// Convert [H160] into [U256].
#[must_use]
pub fn h160_to_u256(v: H160) -> U256 {
	h256_to_u256(v.into())
}

/// Convert [U256] to [usize].
pub fn u256_to_usize(v: U256) -> Result<usize, ExitError> {
	if v > U256::from(usize::MAX) {
		return Err(ExitFatal::NotSupported.into());
	}
	Ok(v.as_usize())
}
