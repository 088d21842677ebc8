use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::min;

use primitive_types::{H160, H256, U256};

use crate::call::{CallInvocation, CallParams, CallScheme, CallTarget, CreateParams};
use crate::config::Config;
use crate::costs;
use crate::error::{ExitError, ExitException};
use crate::gasometer::Gasometer;
use crate::jumps::JumpTable;
use crate::memory::Memory;
use crate::runtime::{Account, Backend, Context, Invoker, Log, TransactionContext, Transfer};
use crate::stack::Stack;
use crate::storage::{record_sstore, SlotValues};
use crate::tracing::Event;
use crate::utils::{h160_to_u256, u256_to_usize};

/// One bounded execution of bytecode at a specific address, with its own
/// memory, stack and gas budget.
///
/// Opcode handlers drive a frame through the operations below. Each
/// operation charges gas, mutates the frame, and may trap; a trap
/// propagates to the dispatcher as an [ExitError].
pub struct Frame<'config> {
	code: Rc<Vec<u8>>,
	jumps: JumpTable,
	/// Program counter.
	pub position: usize,
	/// Operand stack.
	pub stack: Stack,
	/// Linear memory.
	pub memory: Memory,
	/// Gas accounting.
	pub gasometer: Gasometer<'config>,
	/// Identity of the frame.
	pub context: Context,
	/// Transaction-wide context, shared by all frames.
	pub transaction_context: Rc<TransactionContext>,
	/// Working copy of the executing account.
	pub contract: Account,
	/// Data returned by this frame with `RETURN` or `REVERT`.
	pub retval: Vec<u8>,
	/// Data returned by the most recent nested frame.
	retbuf: Vec<u8>,
	/// Logs produced by this frame and merged from successful nested
	/// frames.
	pub logs: Vec<Log>,
	/// Accounts marked for destruction.
	pub deleted: BTreeSet<H160>,
	/// Call depth of this frame.
	pub depth: usize,
	/// Whether state-mutating operations are forbidden.
	pub is_static: bool,
}

impl<'config> Frame<'config> {
	/// Create a new frame executing `code` under the given identity and
	/// gas budget.
	#[allow(clippy::too_many_arguments)]
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		context: Context,
		transaction_context: Rc<TransactionContext>,
		contract: Account,
		gas_limit: U256,
		depth: usize,
		is_static: bool,
		config: &'config Config,
	) -> Self {
		let jumps = JumpTable::analyze(&code);

		Self {
			code,
			jumps,
			position: 0,
			stack: Stack::new(config.stack_limit),
			memory: Memory::new(),
			gasometer: Gasometer::new(gas_limit, config),
			context,
			transaction_context,
			contract,
			retval: Vec::new(),
			retbuf: Vec::new(),
			logs: Vec::new(),
			deleted: BTreeSet::new(),
			depth,
			is_static,
		}
	}

	/// Code being executed.
	#[must_use]
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// Data returned by the most recent nested frame.
	#[must_use]
	pub fn last_returned(&self) -> &[u8] {
		&self.retbuf
	}

	/// Whether `position` is a valid jump destination.
	#[must_use]
	pub fn is_valid_jump(&self, position: usize) -> bool {
		self.jumps.is_valid(position)
	}

	/// Move the program counter to `dest`, trapping when the destination
	/// is not a `JUMPDEST` outside of push immediates.
	pub fn jump(&mut self, dest: U256) -> Result<(), ExitError> {
		let dest = u256_to_usize(dest).map_err(|_| ExitException::InvalidJump)?;
		if !self.jumps.is_valid(dest) {
			return Err(ExitException::InvalidJump.into());
		}
		self.position = dest;
		Ok(())
	}

	/// Grow memory to cover `len` bytes at `offset`, charging the
	/// expansion cost. Zero-length accesses never grow nor charge.
	pub fn expand_memory(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		let Some(word_count) = costs::memory_words(offset, len)? else {
			return Ok(());
		};
		if word_count <= self.memory.word_count() {
			return Ok(());
		}

		let cost = costs::memory_gas(word_count, self.gasometer.config)?;
		self.gasometer.record_memory_gas(cost)?;
		self.memory.grow(word_count);

		Event::MemoryExpand { word_count, cost }.emit();

		Ok(())
	}

	/// Read `len` bytes at `offset` from memory, expanding (and
	/// charging) first.
	pub fn memory_load(&mut self, offset: U256, len: U256) -> Result<Vec<u8>, ExitError> {
		self.expand_memory(offset, len)?;
		if len.is_zero() {
			return Ok(Vec::new());
		}

		let offset = u256_to_usize(offset)?;
		let len = u256_to_usize(len)?;
		Ok(self.memory.get(offset, len))
	}

	/// Write a window of `len` bytes at `offset`, sourced from
	/// `src[src_offset..]` with the zero-fill rules of [Memory::set].
	///
	/// `expand` charges the expansion for the window first; pass `false`
	/// only when the same window was already charged by the current
	/// operation.
	pub fn memory_store(
		&mut self,
		offset: U256,
		src: &[u8],
		src_offset: U256,
		len: U256,
		expand: bool,
	) -> Result<(), ExitError> {
		if expand {
			self.expand_memory(offset, len)?;
		}
		if len.is_zero() {
			return Ok(());
		}

		let offset = u256_to_usize(offset)?;
		let len = u256_to_usize(len)?;
		let src_offset = u256_to_usize(min(src_offset, U256::from(src.len())))?;
		self.memory.set(offset, src, src_offset, len);
		Ok(())
	}

	/// Fill `retval` from memory for an explicit return.
	pub fn do_return(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		self.retval = self.memory_load(offset, len)?;
		Ok(())
	}

	/// Fill `retval` from memory and trap with [ExitError::Reverted].
	/// The dispatcher hands the data and the remaining gas back to the
	/// caller.
	pub fn do_revert(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		self.retval = self.memory_load(offset, len)?;
		Err(ExitError::Reverted)
	}

	/// Meter and perform a storage write on the executing account.
	pub fn sstore<H: Backend>(
		&mut self,
		handler: &mut H,
		index: H256,
		value: H256,
	) -> Result<(), ExitError> {
		if self.is_static {
			return Err(ExitException::StaticStateChange.into());
		}

		let address = self.context.address;
		let original = handler.original_storage(address, index)?;
		let current = handler.storage(address, index)?;

		record_sstore(&mut self.gasometer, SlotValues { original, current }, value)?;
		handler.set_storage(address, index, value)?;

		Event::SStore {
			address,
			index,
			value,
		}
		.emit();

		Ok(())
	}

	/// Append a log record owned by the executing account.
	pub fn log(&mut self, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		if self.is_static {
			return Err(ExitException::StaticStateChange.into());
		}

		self.logs.push(Log {
			address: self.context.address,
			topics,
			data,
		});
		Ok(())
	}

	/// Mark the executing account for destruction.
	pub fn mark_delete(&mut self) -> Result<(), ExitError> {
		if self.is_static {
			return Err(ExitException::StaticStateChange.into());
		}

		self.deleted.insert(self.context.address);
		Ok(())
	}

	/// Perform a nested call and integrate its outcome.
	///
	/// Gating happens in order: output window expansion, gas defaulting
	/// and the one-64th clamp, the depth gate, the balance gate. The two
	/// gates fail silently: a zero lands on the stack and no nested
	/// frame is dispatched.
	pub fn call<H: Backend, V: Invoker<H>>(
		&mut self,
		handler: &mut H,
		vm: &mut V,
		params: CallParams,
	) -> Result<(), ExitError> {
		self.retbuf = Vec::new();

		if self.is_static && params.scheme == CallScheme::Call && !params.value.is_zero() {
			return Err(ExitException::StaticStateChange.into());
		}

		self.expand_memory(params.out_offset, params.out_len)?;

		let mut gas_limit = params.gas.unwrap_or_else(|| self.gasometer.gas());
		gas_limit = min(gas_limit, self.gasometer.allowance());

		if self.depth >= self.gasometer.config.call_stack_limit {
			self.stack.push(U256::zero())?;
			return Ok(());
		}

		let transfers_value = matches!(params.scheme, CallScheme::Call | CallScheme::CallCode);
		if transfers_value && params.value > self.contract.balance {
			self.stack.push(U256::zero())?;
			return Ok(());
		}

		handler.set_account(self.context.address, self.contract.clone())?;

		let context = match params.scheme {
			CallScheme::Call | CallScheme::StaticCall => Context {
				address: params.to,
				caller: self.context.address,
				apparent_value: params.value,
			},
			CallScheme::CallCode => Context {
				address: self.context.address,
				caller: self.context.address,
				apparent_value: params.value,
			},
			CallScheme::DelegateCall => Context {
				address: self.context.address,
				caller: self.context.caller,
				apparent_value: self.context.apparent_value,
			},
		};

		let transfer = match params.scheme {
			CallScheme::Call => Some(Transfer {
				source: self.context.address,
				target: params.to,
				value: params.value,
			}),
			CallScheme::CallCode => Some(Transfer {
				source: self.context.address,
				target: self.context.address,
				value: params.value,
			}),
			CallScheme::DelegateCall | CallScheme::StaticCall => None,
		};

		let is_static = self.is_static || params.scheme == CallScheme::StaticCall;

		Event::SubCall {
			target: Some(params.to),
			gas_limit,
			depth: self.depth + 1,
		}
		.emit();

		let outcome = vm.run_call(
			CallInvocation {
				target: CallTarget::Call {
					code_address: params.to,
					context,
					transfer,
				},
				input: params.input,
				gas_limit,
				is_static,
				depth: self.depth + 1,
				transaction_context: self.transaction_context.clone(),
				deleted: self.deleted.clone(),
			},
			handler,
		);

		self.gasometer.record_cost(outcome.gas_used)?;

		match outcome.reason {
			Ok(_) => {
				self.logs.extend(outcome.logs);
				self.gasometer.record_refund(outcome.gas_refund);
				self.deleted = outcome.deleted;
				self.memory_store(
					params.out_offset,
					&outcome.return_data,
					U256::zero(),
					params.out_len,
					false,
				)?;
				self.contract = handler.account(self.context.address)?;
				self.retbuf = outcome.return_data;
				self.stack.push(U256::one())?;
				Ok(())
			}
			Err(ExitError::Reverted) => {
				self.memory_store(
					params.out_offset,
					&outcome.return_data,
					U256::zero(),
					params.out_len,
					false,
				)?;
				self.retbuf = outcome.return_data;
				self.stack.push(U256::zero())?;
				Ok(())
			}
			Err(ExitError::Exception(_)) => {
				self.stack.push(U256::zero())?;
				Ok(())
			}
			Err(ExitError::Fatal(e)) => {
				self.stack.push(U256::zero())?;
				Err(e.into())
			}
		}
	}

	/// Perform a nested create and integrate its outcome.
	///
	/// The creator's nonce is incremented and persisted before dispatch
	/// so the nested frame observes it; a failed create, reverted or
	/// excepted, undoes the increment.
	pub fn create<H: Backend, V: Invoker<H>>(
		&mut self,
		handler: &mut H,
		vm: &mut V,
		params: CreateParams,
	) -> Result<(), ExitError> {
		self.retbuf = Vec::new();

		if self.is_static {
			return Err(ExitException::StaticStateChange.into());
		}

		let gas_limit = self.gasometer.allowance();

		if self.depth >= self.gasometer.config.call_stack_limit {
			self.stack.push(U256::zero())?;
			return Ok(());
		}

		if params.value > self.contract.balance {
			self.stack.push(U256::zero())?;
			return Ok(());
		}

		self.contract.nonce = self.contract.nonce.saturating_add(U256::one());
		handler.set_account(self.context.address, self.contract.clone())?;

		Event::SubCall {
			target: None,
			gas_limit,
			depth: self.depth + 1,
		}
		.emit();

		let outcome = vm.run_call(
			CallInvocation {
				target: CallTarget::Create {
					caller: self.context.address,
					value: params.value,
					init_code: params.init_code,
					salt: params.salt,
				},
				input: Vec::new(),
				gas_limit,
				is_static: self.is_static,
				depth: self.depth + 1,
				transaction_context: self.transaction_context.clone(),
				deleted: self.deleted.clone(),
			},
			handler,
		);

		self.gasometer.record_cost(outcome.gas_used)?;

		match outcome.reason {
			Ok(_) => {
				self.logs.extend(outcome.logs);
				self.gasometer.record_refund(outcome.gas_refund);
				self.deleted = outcome.deleted;
				self.contract = handler.account(self.context.address)?;

				let created = outcome
					.created_address
					.map(h160_to_u256)
					.unwrap_or_default();
				self.stack.push(created)?;
				Ok(())
			}
			Err(ExitError::Reverted) => {
				self.rollback_nonce(handler)?;
				self.retbuf = outcome.return_data;
				self.stack.push(U256::zero())?;
				Ok(())
			}
			Err(ExitError::Exception(_)) => {
				self.rollback_nonce(handler)?;
				self.stack.push(U256::zero())?;
				Ok(())
			}
			Err(ExitError::Fatal(e)) => {
				self.stack.push(U256::zero())?;
				Err(e.into())
			}
		}
	}

	fn rollback_nonce<H: Backend>(&mut self, handler: &mut H) -> Result<(), ExitError> {
		self.contract.nonce = self.contract.nonce.saturating_sub(U256::one());
		handler.set_account(self.context.address, self.contract.clone())
	}
}
