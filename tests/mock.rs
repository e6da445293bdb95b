//! Scripted interpreter and state fixtures shared by the scenario tests.

use std::collections::BTreeSet;
use std::rc::Rc;

use evm_stateful::{
	run_call, Blockchain, CallParams, Error, Interpreter, Log, MemoryTrie, NullBlockchain,
	RunParams, StateManager, Transaction, TransactionAction, Trie, VmError, VmResult,
};
use primitive_types::{H160, U256};

/// Scripted stand-in for the opcode interpreter.
pub enum MockVm {
	/// Fails the test when dispatched.
	Unused,
	/// Returns a fixed outcome.
	Fixed(FixedRun),
	/// Issues a nested call that sends value and then faults, then
	/// completes successfully itself.
	NestedFault {
		to: H160,
		value: U256,
		gas_limit: U256,
		own_gas: U256,
	},
}

#[derive(Clone)]
pub struct FixedRun {
	pub gas_used: U256,
	pub gas_refund: U256,
	pub return_value: Vec<u8>,
	pub logs: Vec<Log>,
	pub suicides: Vec<H160>,
	pub exception_error: Option<VmError>,
}

impl Default for FixedRun {
	fn default() -> Self {
		Self {
			gas_used: U256::zero(),
			gas_refund: U256::zero(),
			return_value: Vec::new(),
			logs: Vec::new(),
			suicides: Vec::new(),
			exception_error: None,
		}
	}
}

impl<T: Trie, B: Blockchain> Interpreter<T, B> for MockVm {
	fn run_code(
		&mut self,
		params: RunParams,
		state: &mut StateManager<T, B>,
		suicides: &mut BTreeSet<H160>,
	) -> Result<VmResult, Error> {
		match self {
			MockVm::Unused => panic!("interpreter should not have been dispatched"),
			MockVm::Fixed(run) => {
				for address in &run.suicides {
					suicides.insert(*address);
				}
				Ok(VmResult {
					account: params.account,
					gas_used: run.gas_used,
					gas_refund: run.gas_refund,
					return_value: run.return_value.clone(),
					logs: run.logs.clone(),
					suicides: suicides.clone(),
					exception: run.exception_error.is_none(),
					exception_error: run.exception_error,
				})
			}
			MockVm::NestedFault {
				to,
				value,
				gas_limit,
				own_gas,
			} => {
				let mut inner = MockVm::Fixed(FixedRun {
					gas_used: *gas_limit,
					exception_error: Some(VmError::OutOfGas),
					..FixedRun::default()
				});
				let sub = run_call(
					state,
					&mut inner,
					suicides,
					CallParams {
						caller: params.address,
						to: Some(*to),
						value: *value,
						data: Rc::new(Vec::new()),
						code: None,
						gas_limit: *gas_limit,
						gas_price: params.gas_price,
						origin: Some(params.origin),
						block: params.block.clone(),
						depth: params.depth + 1,
					},
				)?;
				assert!(!sub.vm.exception, "the sub-call was scripted to fault");

				Ok(VmResult {
					account: params.account,
					gas_used: sub.gas_used + *own_gas,
					gas_refund: U256::zero(),
					return_value: Vec::new(),
					logs: Vec::new(),
					suicides: suicides.clone(),
					exception: true,
					exception_error: None,
				})
			}
		}
	}

	fn run_precompiled(
		&mut self,
		params: RunParams,
		state: &mut StateManager<T, B>,
		suicides: &mut BTreeSet<H160>,
	) -> Result<VmResult, Error> {
		self.run_code(params, state, suicides)
	}
}

pub fn new_state() -> StateManager<MemoryTrie, NullBlockchain> {
	StateManager::new(MemoryTrie::new(), NullBlockchain)
}

pub fn address(byte: u8) -> H160 {
	H160::repeat_byte(byte)
}

/// Seed an externally owned account and persist it to the trie.
pub fn seed(state: &mut StateManager<MemoryTrie, NullBlockchain>, address: H160, balance: u64) {
	let mut account = state.account(address).unwrap();
	account.balance = U256::from(balance);
	state.put_account(address, account);
	state.flush().unwrap();
	state.clear_cache();
}

/// Seed a contract account with code and persist it to the trie.
pub fn seed_contract(
	state: &mut StateManager<MemoryTrie, NullBlockchain>,
	address: H160,
	balance: u64,
	code: Vec<u8>,
) {
	let mut account = state.account(address).unwrap();
	account.balance = U256::from(balance);
	state.put_account(address, account);
	state.put_code(address, code).unwrap();
	state.flush().unwrap();
	state.clear_cache();
}

pub fn balance_of(
	state: &mut StateManager<MemoryTrie, NullBlockchain>,
	address: H160,
) -> U256 {
	state.account(address).unwrap().balance
}

pub fn total_balance(
	state: &mut StateManager<MemoryTrie, NullBlockchain>,
	addresses: &[H160],
) -> U256 {
	addresses
		.iter()
		.fold(U256::zero(), |sum, address| sum + balance_of(state, *address))
}

/// A plain value transfer at gas price one.
pub fn transfer_tx(from: H160, to: H160, nonce: u64, gas_limit: u64, value: u64) -> Transaction {
	Transaction {
		from,
		nonce: U256::from(nonce),
		gas_price: U256::one(),
		gas_limit: U256::from(gas_limit),
		action: TransactionAction::Call(to),
		value: U256::from(value),
		input: Rc::new(Vec::new()),
	}
}
