use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use evm_eei::utils::{h160_to_u256, u256_to_h256};
use evm_eei::{
	Account, Backend, CallInvocation, CallOutcome, CallParams, CallScheme, CallTarget, Config,
	Context, CreateParams, ExitError, ExitException, ExitFatal, ExitSucceed, Frame, Invoker, Log,
	TransactionContext,
};
use primitive_types::{H160, H256, U256};

#[derive(Clone, Debug, Default)]
struct State {
	accounts: BTreeMap<H160, Account>,
	storage: BTreeMap<(H160, H256), H256>,
	code: BTreeMap<H160, Vec<u8>>,
}

#[derive(Debug, Default)]
struct MockBackend {
	state: State,
	original: BTreeMap<(H160, H256), H256>,
	snapshots: Vec<State>,
}

impl Backend for MockBackend {
	fn account(&self, address: H160) -> Result<Account, ExitError> {
		Ok(self.state.accounts.get(&address).cloned().unwrap_or_default())
	}

	fn set_account(&mut self, address: H160, account: Account) -> Result<(), ExitError> {
		self.state.accounts.insert(address, account);
		Ok(())
	}

	fn code(&self, address: H160) -> Result<Vec<u8>, ExitError> {
		Ok(self.state.code.get(&address).cloned().unwrap_or_default())
	}

	fn storage(&mut self, address: H160, index: H256) -> Result<H256, ExitError> {
		Ok(self
			.state
			.storage
			.get(&(address, index))
			.copied()
			.unwrap_or_default())
	}

	fn original_storage(&mut self, address: H160, index: H256) -> Result<H256, ExitError> {
		Ok(self
			.original
			.get(&(address, index))
			.or_else(|| self.state.storage.get(&(address, index)))
			.copied()
			.unwrap_or_default())
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.state.storage.insert((address, index), value);
		Ok(())
	}

	fn checkpoint(&mut self) -> Result<(), ExitError> {
		self.snapshots.push(self.state.clone());
		Ok(())
	}

	fn commit(&mut self) -> Result<(), ExitError> {
		self.snapshots
			.pop()
			.map(|_| ())
			.ok_or_else(|| ExitFatal::Internal("no open snapshot".into()).into())
	}

	fn revert(&mut self) -> Result<(), ExitError> {
		let snapshot = self
			.snapshots
			.pop()
			.ok_or_else(|| ExitError::from(ExitFatal::Internal("no open snapshot".into())))?;
		self.state = snapshot;
		Ok(())
	}
}

#[derive(Default)]
struct MockVm {
	outcomes: VecDeque<CallOutcome>,
	invocations: Vec<CallInvocation>,
}

impl MockVm {
	fn scripted(outcomes: Vec<CallOutcome>) -> Self {
		Self {
			outcomes: outcomes.into(),
			invocations: Vec::new(),
		}
	}
}

impl Invoker<MockBackend> for MockVm {
	fn run_call(&mut self, invocation: CallInvocation, backend: &mut MockBackend) -> CallOutcome {
		// The nested frame runs inside its own snapshot; a scripted
		// failure rolls it back the way a real dispatcher would.
		backend.checkpoint().unwrap();
		let outcome = self.outcomes.pop_front().expect("unexpected nested call");
		match &outcome.reason {
			Ok(_) => backend.commit().unwrap(),
			Err(_) => backend.revert().unwrap(),
		}
		self.invocations.push(invocation);
		outcome
	}
}

const ADDRESS: H160 = H160::repeat_byte(0xaa);
const CALLER: H160 = H160::repeat_byte(0xbb);
const TARGET: H160 = H160::repeat_byte(0xcc);

fn frame(config: &Config, gas: u64, contract: Account) -> Frame {
	Frame::new(
		Rc::new(Vec::new()),
		Context {
			address: ADDRESS,
			caller: CALLER,
			apparent_value: U256::zero(),
		},
		Rc::new(TransactionContext {
			origin: CALLER,
			gas_price: U256::one(),
		}),
		contract,
		U256::from(gas),
		0,
		false,
		config,
	)
}

fn funded(balance: u64, nonce: u64) -> Account {
	Account {
		balance: U256::from(balance),
		nonce: U256::from(nonce),
		..Account::default()
	}
}

fn outcome_stopped() -> CallOutcome {
	CallOutcome {
		reason: Ok(ExitSucceed::Stopped),
		gas_used: U256::zero(),
		gas_refund: U256::zero(),
		return_data: Vec::new(),
		logs: Vec::new(),
		created_address: None,
		deleted: BTreeSet::new(),
	}
}

fn call_params(value: u64, out_offset: u64, out_len: u64) -> CallParams {
	CallParams {
		scheme: CallScheme::Call,
		gas: None,
		to: TARGET,
		value: U256::from(value),
		input: Vec::new(),
		out_offset: U256::from(out_offset),
		out_len: U256::from(out_len),
	}
}

#[test]
fn memory_expansion_charges_once() {
	let config = Config::byzantium();
	let mut frame = frame(&config, 10_000, Account::default());

	let data = frame.memory_load(U256::zero(), U256::from(32)).unwrap();
	assert_eq!(data, vec![0; 32]);
	assert_eq!(frame.gasometer.gas(), U256::from(10_000 - 3));
	assert_eq!(frame.memory.word_count(), 1);

	// Reading the same word again costs nothing.
	frame.memory_load(U256::zero(), U256::from(32)).unwrap();
	assert_eq!(frame.gasometer.gas(), U256::from(10_000 - 3));
}

#[test]
fn memory_expansion_quadratic_term() {
	let config = Config::byzantium();
	let mut frame = frame(&config, 10_000, Account::default());

	frame
		.expand_memory(U256::zero(), U256::from(32 * 1024))
		.unwrap();
	assert_eq!(frame.gasometer.gas(), U256::from(10_000 - 5120));
	assert_eq!(frame.memory.word_count(), 1024);
}

#[test]
fn memory_store_load_round_trip() {
	let config = Config::byzantium();
	let mut frame = frame(&config, 10_000, Account::default());

	let data = [1u8, 2, 3, 4, 5];
	frame
		.memory_store(U256::from(64), &data, U256::zero(), U256::from(5), true)
		.unwrap();
	assert_eq!(
		frame.memory_load(U256::from(64), U256::from(5)).unwrap(),
		data
	);
}

#[test]
fn jump_validity() {
	let config = Config::byzantium();
	// PUSH1 0x5b, JUMPDEST
	let mut frame = Frame::new(
		Rc::new(vec![0x60, 0x5b, 0x5b]),
		Context {
			address: ADDRESS,
			caller: CALLER,
			apparent_value: U256::zero(),
		},
		Rc::new(TransactionContext {
			origin: CALLER,
			gas_price: U256::one(),
		}),
		Account::default(),
		U256::from(1000),
		0,
		false,
		&config,
	);

	assert!(!frame.is_valid_jump(1));
	assert!(frame.is_valid_jump(2));
	frame.jump(U256::from(2)).unwrap();
	assert_eq!(frame.position, 2);
	assert_eq!(
		frame.jump(U256::from(1)),
		Err(ExitException::InvalidJump.into())
	);
}

#[test]
fn call_forwards_all_but_one_64th() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::scripted(vec![outcome_stopped()]);
	let mut frame = frame(&config, 6400, Account::default());

	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 0))
		.unwrap();

	assert_eq!(vm.invocations.len(), 1);
	assert_eq!(vm.invocations[0].gas_limit, U256::from(6300));
	assert_eq!(frame.stack.peek(0), Ok(U256::one()));
}

#[test]
fn call_respects_pinned_gas() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::scripted(vec![outcome_stopped()]);
	let mut frame = frame(&config, 6400, Account::default());

	let mut params = call_params(0, 0, 0);
	params.gas = Some(U256::from(100));
	frame.call(&mut backend, &mut vm, params).unwrap();

	assert_eq!(vm.invocations[0].gas_limit, U256::from(100));
}

#[test]
fn depth_limit_fails_silently() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::default();
	let mut frame = Frame::new(
		Rc::new(Vec::new()),
		Context {
			address: ADDRESS,
			caller: CALLER,
			apparent_value: U256::zero(),
		},
		Rc::new(TransactionContext {
			origin: CALLER,
			gas_price: U256::one(),
		}),
		Account::default(),
		U256::from(5000),
		1024,
		false,
		&config,
	);

	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 0))
		.unwrap();

	assert!(vm.invocations.is_empty());
	assert_eq!(frame.stack.peek(0), Ok(U256::zero()));
	assert_eq!(frame.gasometer.gas(), U256::from(5000));
}

#[test]
fn balance_gate_fails_silently() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::default();
	let mut frame = frame(&config, 5000, funded(10, 0));

	frame
		.call(&mut backend, &mut vm, call_params(11, 0, 0))
		.unwrap();

	assert!(vm.invocations.is_empty());
	assert_eq!(frame.stack.peek(0), Ok(U256::zero()));
}

#[test]
fn call_success_merges_logs_and_refund() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();

	let log = Log {
		address: TARGET,
		topics: vec![H256::repeat_byte(1)],
		data: vec![1, 2, 3],
	};
	let mut outcome = outcome_stopped();
	outcome.gas_used = U256::from(400);
	outcome.gas_refund = U256::from(15_000);
	outcome.return_data = vec![0xbe, 0xef];
	outcome.logs = vec![log.clone()];

	let mut vm = MockVm::scripted(vec![outcome]);
	let mut frame = frame(&config, 10_000, Account::default());

	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 32))
		.unwrap();

	assert_eq!(frame.stack.peek(0), Ok(U256::one()));
	assert_eq!(frame.logs, vec![log]);
	assert_eq!(frame.gasometer.refunded_gas(), U256::from(15_000));
	assert_eq!(frame.last_returned(), [0xbe, 0xef]);
	// Return data lands in the output window, zero-filled to its length.
	assert_eq!(
		frame.memory.get(0, 4),
		[0xbe, 0xef, 0x00, 0x00]
	);
	// Expansion of the output window plus the nested frame's usage.
	assert_eq!(frame.gasometer.gas(), U256::from(10_000 - 3 - 400));
}

#[test]
fn call_revert_discards_logs_but_returns_data() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();

	let mut outcome = outcome_stopped();
	outcome.reason = Err(ExitError::Reverted);
	outcome.gas_used = U256::from(100);
	outcome.gas_refund = U256::from(9_000);
	outcome.return_data = vec![0xde, 0xad];
	outcome.logs = vec![Log {
		address: TARGET,
		topics: Vec::new(),
		data: Vec::new(),
	}];

	let mut vm = MockVm::scripted(vec![outcome]);
	let mut frame = frame(&config, 10_000, Account::default());

	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 4))
		.unwrap();

	assert_eq!(frame.stack.peek(0), Ok(U256::zero()));
	assert!(frame.logs.is_empty());
	assert_eq!(frame.gasometer.refunded_gas(), U256::zero());
	assert_eq!(frame.last_returned(), [0xde, 0xad]);
	assert_eq!(frame.memory.get(0, 4), [0xde, 0xad, 0x00, 0x00]);
}

#[test]
fn call_exception_returns_nothing() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();

	let mut outcome = outcome_stopped();
	outcome.reason = Err(ExitException::OutOfGas.into());
	outcome.gas_used = U256::from(6300);
	outcome.return_data = vec![0xff];

	let mut vm = MockVm::scripted(vec![outcome]);
	let mut frame = frame(&config, 6400, Account::default());

	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 4))
		.unwrap();

	assert_eq!(frame.stack.peek(0), Ok(U256::zero()));
	assert!(frame.last_returned().is_empty());
	assert_eq!(frame.memory.get(0, 4), [0x00; 4]);
	// The nested frame's gas is gone regardless.
	assert_eq!(frame.gasometer.gas(), U256::from(6400 - 3 - 6300));
}

#[test]
fn call_fatal_aborts() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();

	let mut outcome = outcome_stopped();
	outcome.reason = Err(ExitFatal::Internal("trie failure".into()).into());

	let mut vm = MockVm::scripted(vec![outcome]);
	let mut frame = frame(&config, 10_000, Account::default());

	assert_eq!(
		frame.call(&mut backend, &mut vm, call_params(0, 0, 0)),
		Err(ExitFatal::Internal("trie failure".into()).into())
	);
	assert_eq!(frame.stack.peek(0), Ok(U256::zero()));
}

#[test]
fn delegate_call_preserves_identity() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::scripted(vec![outcome_stopped()]);

	let mut frame = Frame::new(
		Rc::new(Vec::new()),
		Context {
			address: ADDRESS,
			caller: CALLER,
			apparent_value: U256::from(123),
		},
		Rc::new(TransactionContext {
			origin: CALLER,
			gas_price: U256::one(),
		}),
		Account::default(),
		U256::from(10_000),
		0,
		false,
		&config,
	);

	let mut params = call_params(0, 0, 0);
	params.scheme = CallScheme::DelegateCall;
	frame.call(&mut backend, &mut vm, params).unwrap();

	match &vm.invocations[0].target {
		CallTarget::Call {
			code_address,
			context,
			transfer,
		} => {
			assert_eq!(*code_address, TARGET);
			assert_eq!(context.address, ADDRESS);
			assert_eq!(context.caller, CALLER);
			assert_eq!(context.apparent_value, U256::from(123));
			assert!(transfer.is_none());
		}
		CallTarget::Create { .. } => panic!("expected a call target"),
	}
}

#[test]
fn static_call_propagates_flag() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::scripted(vec![outcome_stopped()]);
	let mut frame = frame(&config, 10_000, Account::default());

	let mut params = call_params(0, 0, 0);
	params.scheme = CallScheme::StaticCall;
	frame.call(&mut backend, &mut vm, params).unwrap();

	assert!(vm.invocations[0].is_static);
}

#[test]
fn static_frame_forbids_state_mutation() {
	let config = Config::constantinople();
	let mut backend = MockBackend::default();
	let mut vm = MockVm::default();

	let mut frame = Frame::new(
		Rc::new(Vec::new()),
		Context {
			address: ADDRESS,
			caller: CALLER,
			apparent_value: U256::zero(),
		},
		Rc::new(TransactionContext {
			origin: CALLER,
			gas_price: U256::one(),
		}),
		funded(1000, 0),
		U256::from(100_000),
		0,
		true,
		&config,
	);

	fn static_err() -> Result<(), ExitError> {
		Err(ExitException::StaticStateChange.into())
	}

	assert_eq!(
		frame.sstore(&mut backend, H256::zero(), H256::repeat_byte(1)),
		static_err()
	);
	assert_eq!(frame.log(Vec::new(), Vec::new()), static_err());
	assert_eq!(frame.mark_delete(), static_err());
	assert_eq!(
		frame.call(&mut backend, &mut vm, call_params(1, 0, 0)),
		static_err()
	);
	assert_eq!(
		frame.create(
			&mut backend,
			&mut vm,
			CreateParams {
				value: U256::zero(),
				init_code: Vec::new(),
				salt: None,
			},
		),
		static_err()
	);
	assert!(vm.invocations.is_empty());
}

#[test]
fn sstore_meters_and_writes() {
	let config = Config::constantinople();
	let mut backend = MockBackend::default();
	let mut frame = frame(&config, 100_000, Account::default());

	let index = H256::repeat_byte(0x11);
	let value = u256_to_h256(U256::from(7));
	frame.sstore(&mut backend, index, value).unwrap();

	assert_eq!(frame.gasometer.gas(), U256::from(100_000 - 20_000));
	assert_eq!(backend.storage(ADDRESS, index), Ok(value));

	// Clearing the now-dirty slot back to its original empty value.
	frame.sstore(&mut backend, index, H256::zero()).unwrap();
	assert_eq!(frame.gasometer.gas(), U256::from(100_000 - 20_000 - 200));
	assert_eq!(frame.gasometer.refunded_gas(), U256::from(19_800));
}

#[test]
fn create_revert_rolls_back_nonce() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	backend.set_account(ADDRESS, funded(1000, 5)).unwrap();

	let mut outcome = outcome_stopped();
	outcome.reason = Err(ExitError::Reverted);
	outcome.return_data = vec![0x01];

	let mut vm = MockVm::scripted(vec![outcome]);
	let mut frame = frame(&config, 100_000, funded(1000, 5));

	frame
		.create(
			&mut backend,
			&mut vm,
			CreateParams {
				value: U256::from(100),
				init_code: vec![0x60, 0x00],
				salt: None,
			},
		)
		.unwrap();

	assert_eq!(frame.stack.peek(0), Ok(U256::zero()));
	assert_eq!(frame.contract.nonce, U256::from(5));
	assert_eq!(backend.account(ADDRESS).unwrap().nonce, U256::from(5));
	// Creation return data is visible after a revert.
	assert_eq!(frame.last_returned(), [0x01]);
}

#[test]
fn create_success_pushes_address() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	backend.set_account(ADDRESS, funded(1000, 5)).unwrap();

	let created = H160::repeat_byte(0xdd);
	let mut outcome = outcome_stopped();
	outcome.reason = Ok(ExitSucceed::Returned);
	outcome.created_address = Some(created);
	outcome.return_data = vec![0x60];

	let mut vm = MockVm::scripted(vec![outcome]);
	let mut frame = frame(&config, 100_000, funded(1000, 5));

	frame
		.create(
			&mut backend,
			&mut vm,
			CreateParams {
				value: U256::from(100),
				init_code: vec![0x60, 0x00],
				salt: None,
			},
		)
		.unwrap();

	assert_eq!(frame.stack.peek(0), Ok(h160_to_u256(created)));
	// The nested frame observed the bumped nonce and it stays bumped.
	assert_eq!(frame.contract.nonce, U256::from(6));
	// Creation return data is not exposed on success.
	assert!(frame.last_returned().is_empty());
}

#[test]
fn deleted_set_restored_on_failure() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();
	let mut frame = frame(&config, 100_000, Account::default());

	frame.mark_delete().unwrap();
	let before = frame.deleted.clone();

	let extra = H160::repeat_byte(0xee);
	let mut failed = outcome_stopped();
	failed.reason = Err(ExitException::OutOfGas.into());
	failed.deleted = {
		let mut set = before.clone();
		set.insert(extra);
		set
	};

	let mut vm = MockVm::scripted(vec![failed]);
	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 0))
		.unwrap();
	assert_eq!(frame.deleted, before);

	let mut merged = outcome_stopped();
	merged.deleted = {
		let mut set = before.clone();
		set.insert(extra);
		set
	};

	let mut vm = MockVm::scripted(vec![merged]);
	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 0))
		.unwrap();
	assert!(frame.deleted.contains(&extra));
	assert!(frame.deleted.contains(&ADDRESS));
}

#[test]
fn retbuf_resets_at_every_attempt() {
	let config = Config::byzantium();
	let mut backend = MockBackend::default();

	let mut first = outcome_stopped();
	first.return_data = vec![0xaa, 0xbb];

	let mut vm = MockVm::scripted(vec![first]);
	let mut frame = frame(&config, 100_000, Account::default());

	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 0))
		.unwrap();
	assert_eq!(frame.last_returned(), [0xaa, 0xbb]);

	// A depth-gated attempt still clears the buffer.
	frame.depth = 1024;
	let mut vm = MockVm::default();
	frame
		.call(&mut backend, &mut vm, call_params(0, 0, 0))
		.unwrap();
	assert!(frame.last_returned().is_empty());
}
