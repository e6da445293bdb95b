//! Interface to the opcode interpreter supplied by the embedder.

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};

use crate::account::Account;
use crate::error::Error;
use crate::params::HeaderParams;
use crate::state::{Blockchain, StateManager};
use crate::trie::Trie;

/// Number of precompiled contracts, occupying addresses `0x01` upwards.
pub const PRECOMPILE_COUNT: u8 = 4;

/// Whether `address` designates a precompiled contract.
pub fn is_precompiled(address: H160) -> bool {
	let bytes = address.as_bytes();
	bytes[..19].iter().all(|byte| *byte == 0)
		&& bytes[19] >= 1
		&& bytes[19] <= PRECOMPILE_COUNT
}

/// A log emitted during execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
	pub address: H160,
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// Exceptional halts reported by the interpreter.
///
/// These are normal frame outcomes, not system failures: the frame's
/// effects are rolled back and the transaction completes with the halt on
/// its result record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VmError {
	/// Ran out of gas.
	OutOfGas,
	/// Pushed more than the stack can hold.
	StackOverflow,
	/// Popped an empty stack.
	StackUnderflow,
	/// Hit an undefined opcode.
	InvalidOpcode,
	/// Jumped to an invalid destination.
	BadJumpDestination,
	/// Exceeded the call depth limit.
	CallTooDeep,
	/// Halted by the REVERT opcode.
	Revert,
}

/// Inputs of one interpreter dispatch.
#[derive(Clone, Debug)]
pub struct RunParams {
	/// Address of the executing account.
	pub address: H160,
	/// Immediate caller of this frame.
	pub caller: H160,
	/// Transaction origin.
	pub origin: H160,
	/// Code being executed.
	pub code: Rc<Vec<u8>>,
	/// Input data of the frame.
	pub data: Rc<Vec<u8>>,
	/// Gas available to the frame.
	pub gas_limit: U256,
	/// Transaction gas price.
	pub gas_price: U256,
	/// Value attached to the frame.
	pub value: U256,
	/// Executing account, already credited with the value.
	pub account: Account,
	/// Block being executed in.
	pub block: HeaderParams,
	/// Call depth of this frame.
	pub depth: usize,
}

/// Outcome of one interpreter dispatch.
#[derive(Clone, Debug)]
pub struct VmResult {
	/// Executing account as the interpreter left it.
	pub account: Account,
	/// Gas consumed by the frame.
	pub gas_used: U256,
	/// Gas refund accumulated by the frame.
	pub gas_refund: U256,
	/// Return buffer.
	pub return_value: Vec<u8>,
	/// Logs emitted by the frame.
	pub logs: Vec<Log>,
	/// Suicide set as of the end of the frame.
	pub suicides: BTreeSet<H160>,
	/// Whether the frame completed without an exceptional halt.
	pub exception: bool,
	/// The exceptional halt, when there was one.
	pub exception_error: Option<VmError>,
}

impl VmResult {
	/// Result of a frame that had no code to run.
	pub fn empty(account: Account) -> Self {
		Self {
			account,
			gas_used: U256::zero(),
			gas_refund: U256::zero(),
			return_value: Vec::new(),
			logs: Vec::new(),
			suicides: BTreeSet::new(),
			exception: true,
			exception_error: None,
		}
	}
}

/// The opcode interpreter capability.
///
/// `run_code` interprets bytecode, `run_precompiled` dispatches one of the
/// native contracts. Both report exceptional halts in-band on the
/// [`VmResult`] and reserve the error channel for system failures. Both
/// may re-enter [`crate::run_call`] for nested frames, against the same
/// state manager and the same shared suicide set.
pub trait Interpreter<T: Trie, B: Blockchain> {
	fn run_code(
		&mut self,
		params: RunParams,
		state: &mut StateManager<T, B>,
		suicides: &mut BTreeSet<H160>,
	) -> Result<VmResult, Error>;

	fn run_precompiled(
		&mut self,
		params: RunParams,
		state: &mut StateManager<T, B>,
		suicides: &mut BTreeSet<H160>,
	) -> Result<VmResult, Error>;
}
