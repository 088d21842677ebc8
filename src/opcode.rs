/// Opcode newtype. One-to-one corresponding to an `u8` value.
///
/// Decoding and dispatch happen outside this crate; only the opcodes
/// that affect jump-destination analysis are named here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode(pub u8);

impl Opcode {
	/// `JUMPDEST`
	pub const JUMPDEST: Opcode = Opcode(0x5b);
	/// `PUSH1`
	pub const PUSH1: Opcode = Opcode(0x60);
	/// `PUSH32`
	pub const PUSH32: Opcode = Opcode(0x7f);

	/// Number of immediate bytes if the opcode is a push opcode.
	#[must_use]
	pub fn is_push(&self) -> Option<u8> {
		if (Self::PUSH1.0..=Self::PUSH32.0).contains(&self.0) {
			Some(self.0 - Self::PUSH1.0 + 1)
		} else {
			None
		}
	}

	/// Convert opcode to u8.
	#[inline]
	#[must_use]
	pub const fn as_u8(&self) -> u8 {
		self.0
	}
}
