use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};

use crate::call::{CallInvocation, CallOutcome};
use crate::error::ExitError;

/// Identity under which a frame executes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
	/// Execution address.
	pub address: H160,
	/// Immediate caller of the frame.
	pub caller: H160,
	/// Apparent value of the frame.
	pub apparent_value: U256,
}

/// Information that stays constant across all frames of one transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionContext {
	/// Transaction originator.
	pub origin: H160,
	/// Gas price of the transaction.
	pub gas_price: U256,
}

/// Transfer from source to target, with given value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
	/// Source address.
	pub source: H160,
	/// Target address.
	pub target: H160,
	/// Transfer value.
	pub value: U256,
}

/// Log record produced by a frame.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
	/// Address that produced the log.
	pub address: H160,
	/// Log topics.
	pub topics: Vec<H256>,
	/// Log data.
	pub data: Vec<u8>,
}

/// Account record as seen by a frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Account {
	/// Account balance.
	pub balance: U256,
	/// Account nonce.
	pub nonce: U256,
	/// Root of the account storage trie.
	pub storage_root: H256,
	/// Hash of the account code.
	pub code_hash: H256,
}

/// State manager surface a frame depends on.
///
/// Implementations must provide snapshot-and-revert semantics keyed to
/// the lifetime of a call: the virtual machine brackets every nested
/// call with [Backend::checkpoint] and [Backend::commit] or
/// [Backend::revert], so a failed call leaves no account, storage or
/// code mutation behind.
///
/// `storage` returns the pending value of a slot; `original_storage`
/// the value the slot had when the transaction started. On the first
/// access of a slot within a transaction both are equal.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Backend {
	/// Get the account at an address.
	fn account(&self, address: H160) -> Result<Account, ExitError>;
	/// Replace the account at an address.
	fn set_account(&mut self, address: H160, account: Account) -> Result<(), ExitError>;
	/// Get the code of an address.
	fn code(&self, address: H160) -> Result<Vec<u8>, ExitError>;
	/// Get the pending storage value of an address at an index.
	fn storage(&mut self, address: H160, index: H256) -> Result<H256, ExitError>;
	/// Get the transaction-start storage value of an address at an index.
	fn original_storage(&mut self, address: H160, index: H256) -> Result<H256, ExitError>;
	/// Set the storage value of an address at an index.
	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
	/// Open a nested state snapshot.
	fn checkpoint(&mut self) -> Result<(), ExitError>;
	/// Fold the innermost snapshot into its parent.
	fn commit(&mut self) -> Result<(), ExitError>;
	/// Discard the innermost snapshot, rolling its mutations back.
	fn revert(&mut self) -> Result<(), ExitError>;
}

/// Re-entry point into the virtual machine for nested calls.
///
/// `run_call` executes one nested frame to completion, synchronously,
/// and settles the state snapshot for it. The caller integrates the
/// outcome into its own frame.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Invoker<B: Backend> {
	/// Run a nested call against the given backend.
	fn run_call(&mut self, invocation: CallInvocation, backend: &mut B) -> CallOutcome;
}
