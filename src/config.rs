/// Gas schedule and limits of an active hardfork.
///
/// Values are the Ethereum mainnet constants; custom chains construct
/// their own table.
#[derive(Clone, Debug)]
pub struct Config {
	/// Gas paid per 32-byte word of memory in use.
	pub gas_memory: u64,
	/// Divisor of the quadratic term of the memory cost.
	pub gas_quad_coeff_div: u64,
	/// Gas paid for an SSTORE that sets an empty slot.
	pub gas_sstore_set: u64,
	/// Gas paid for any other SSTORE.
	pub gas_sstore_reset: u64,
	/// Refund for clearing a non-empty slot.
	pub refund_sstore_clears: u64,
	/// Net-metered SSTORE: gas paid when the written value equals the
	/// current value.
	pub gas_net_sstore_noop: u64,
	/// Net-metered SSTORE: gas paid for first-time initialization of an
	/// empty slot.
	pub gas_net_sstore_init: u64,
	/// Net-metered SSTORE: gas paid for the first write to a slot in the
	/// transaction when the slot was already set.
	pub gas_net_sstore_clean: u64,
	/// Net-metered SSTORE: gas paid for writes to an already dirty slot.
	pub gas_net_sstore_dirty: u64,
	/// Net-metered SSTORE: refund for clearing a slot.
	pub refund_net_sstore_clear: u64,
	/// Net-metered SSTORE: refund for resetting a dirty slot to its
	/// original non-empty value.
	pub refund_net_sstore_reset: u64,
	/// Net-metered SSTORE: refund for resetting a dirty slot to its
	/// original empty value.
	pub refund_net_sstore_reset_clear: u64,
	/// Operand stack depth limit.
	pub stack_limit: usize,
	/// Call depth limit.
	pub call_stack_limit: usize,
	/// Whether the net gas metering scheme of EIP-1283 applies to SSTORE.
	pub eip1283_sstore_gas_metering: bool,
}

impl Config {
	/// Byzantium hard fork configuration.
	#[must_use]
	pub const fn byzantium() -> Config {
		Config {
			gas_memory: 3,
			gas_quad_coeff_div: 512,
			gas_sstore_set: 20000,
			gas_sstore_reset: 5000,
			refund_sstore_clears: 15000,
			gas_net_sstore_noop: 200,
			gas_net_sstore_init: 20000,
			gas_net_sstore_clean: 5000,
			gas_net_sstore_dirty: 200,
			refund_net_sstore_clear: 15000,
			refund_net_sstore_reset: 4800,
			refund_net_sstore_reset_clear: 19800,
			stack_limit: 1024,
			call_stack_limit: 1024,
			eip1283_sstore_gas_metering: false,
		}
	}

	/// Constantinople hard fork configuration.
	#[must_use]
	pub const fn constantinople() -> Config {
		Config {
			eip1283_sstore_gas_metering: true,
			..Config::byzantium()
		}
	}

	/// Petersburg hard fork configuration. Constantinople with the net
	/// gas metering of EIP-1283 disabled again.
	#[must_use]
	pub const fn petersburg() -> Config {
		Config {
			eip1283_sstore_gas_metering: false,
			..Config::constantinople()
		}
	}
}
