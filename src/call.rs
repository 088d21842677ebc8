//! Nested call and create records.

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::error::ExitResult;
use crate::runtime::{Context, Log, TransactionContext, Transfer};

/// Call scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CallScheme {
	/// `CALL`
	Call,
	/// `CALLCODE`
	CallCode,
	/// `DELEGATECALL`
	DelegateCall,
	/// `STATICCALL`
	StaticCall,
}

/// Create scheme.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// Legacy create scheme of `CREATE`.
	Legacy {
		/// Caller of the create.
		caller: H160,
	},
	/// Create scheme of `CREATE2`.
	Create2 {
		/// Caller of the create.
		caller: H160,
		/// Hash of the init code.
		code_hash: H256,
		/// Salt.
		salt: H256,
	},
}

impl CreateScheme {
	/// Address of the contract being created. `caller_nonce` is the
	/// creator's nonce at the time the creation was initiated; it is
	/// ignored by the `CREATE2` derivation.
	#[must_use]
	pub fn address(&self, caller_nonce: U256) -> H160 {
		match self {
			Self::Create2 {
				caller,
				code_hash,
				salt,
			} => {
				let mut hasher = Keccak256::new();
				hasher.update([0xff]);
				hasher.update(&caller[..]);
				hasher.update(&salt[..]);
				hasher.update(&code_hash[..]);
				H256::from_slice(hasher.finalize().as_slice()).into()
			}
			Self::Legacy { caller } => {
				let mut stream = rlp::RlpStream::new_list(2);
				stream.append(caller);
				stream.append(&caller_nonce);
				H256::from_slice(Keccak256::digest(stream.out()).as_slice()).into()
			}
		}
	}

	/// Caller of the create.
	#[must_use]
	pub const fn caller(&self) -> H160 {
		match self {
			Self::Create2 { caller, .. } => *caller,
			Self::Legacy { caller } => *caller,
		}
	}
}

/// Operands of a call, as popped by the opcode handler.
#[derive(Clone, Debug)]
pub struct CallParams {
	/// Call scheme.
	pub scheme: CallScheme,
	/// Gas the caller pinned for the nested frame, if any.
	pub gas: Option<U256>,
	/// Call target.
	pub to: H160,
	/// Transferred value. Zero for `DELEGATECALL` and `STATICCALL`.
	pub value: U256,
	/// Input data, already read from frame memory.
	pub input: Vec<u8>,
	/// Offset of the return data window in frame memory.
	pub out_offset: U256,
	/// Length of the return data window.
	pub out_len: U256,
}

/// Operands of a create, as popped by the opcode handler.
#[derive(Clone, Debug)]
pub struct CreateParams {
	/// Endowment of the new contract.
	pub value: U256,
	/// Init code, already read from frame memory.
	pub init_code: Vec<u8>,
	/// Salt for `CREATE2`; `None` selects the legacy scheme.
	pub salt: Option<H256>,
}

/// What the nested frame executes.
#[derive(Clone, Debug)]
pub enum CallTarget {
	/// Run the code of an existing account.
	Call {
		/// Address whose code runs.
		code_address: H160,
		/// Context of the nested frame. Encodes the `CALLCODE` and
		/// `DELEGATECALL` identity rules.
		context: Context,
		/// Value movement, if the scheme transfers one.
		transfer: Option<Transfer>,
	},
	/// Deploy a new contract. The created address is derived by the
	/// virtual machine and reported back in the outcome.
	Create {
		/// Creator.
		caller: H160,
		/// Endowment.
		value: U256,
		/// Init code.
		init_code: Vec<u8>,
		/// Salt for `CREATE2`.
		salt: Option<H256>,
	},
}

/// Everything the virtual machine needs to run one nested frame.
#[derive(Clone, Debug)]
pub struct CallInvocation {
	/// Call or create target.
	pub target: CallTarget,
	/// Input data of the nested frame. Empty for creates.
	pub input: Vec<u8>,
	/// Gas forwarded to the nested frame, already clamped by the
	/// one-64th rule.
	pub gas_limit: U256,
	/// Whether the nested frame is static.
	pub is_static: bool,
	/// Depth of the nested frame.
	pub depth: usize,
	/// Transaction-wide context.
	pub transaction_context: Rc<TransactionContext>,
	/// Accounts marked for destruction so far. The nested frame starts
	/// from this set and reports its final set in the outcome.
	pub deleted: BTreeSet<H160>,
}

/// Result of one nested frame, as integrated by the calling frame.
#[derive(Clone, Debug)]
pub struct CallOutcome {
	/// How the nested frame exited.
	pub reason: ExitResult,
	/// Gas consumed by the nested frame.
	pub gas_used: U256,
	/// Refund accumulated by the nested frame. Discarded unless the
	/// frame succeeded.
	pub gas_refund: U256,
	/// Data returned with `RETURN` or `REVERT`.
	pub return_data: Vec<u8>,
	/// Logs produced by the nested frame. Discarded unless the frame
	/// succeeded.
	pub logs: Vec<Log>,
	/// Address of the deployed contract, for creates.
	pub created_address: Option<H160>,
	/// Final pending-destruction set of the nested frame.
	pub deleted: BTreeSet<H160>,
}
