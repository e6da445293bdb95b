//! One CALL or CREATE frame.

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;

use log::debug;
use primitive_types::{H160, H256, U256};
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

use crate::account::Account;
use crate::error::Error;
use crate::params::{HeaderParams, G_CREATEDATA};
use crate::runtime::{is_precompiled, Interpreter, RunParams, VmResult};
use crate::state::{Blockchain, StateManager};
use crate::trie::Trie;

/// Inputs of one message-call or creation frame.
#[derive(Clone, Debug)]
pub struct CallParams {
	/// Account the value is drawn from.
	pub caller: H160,
	/// Call target; `None` creates a contract.
	pub to: Option<H160>,
	/// Value moved from the caller to the target.
	pub value: U256,
	/// Input data of the frame; init code for a creation.
	pub data: Rc<Vec<u8>>,
	/// Code override for CALLCODE/DELEGATECALL-style dispatch.
	pub code: Option<Rc<Vec<u8>>>,
	/// Gas available to the frame.
	pub gas_limit: U256,
	/// Transaction gas price.
	pub gas_price: U256,
	/// Transaction origin; defaults to the caller.
	pub origin: Option<H160>,
	/// Block being executed in.
	pub block: HeaderParams,
	/// Call depth of this frame.
	pub depth: usize,
}

/// Outcome of one frame.
#[derive(Clone, Debug)]
pub struct CallResult {
	/// Gas consumed by the frame, any returned-code fee included.
	pub gas_used: U256,
	/// Caller account after the frame.
	pub from_account: Account,
	/// Target account after the frame.
	pub to_account: Account,
	/// Address of the created contract, on creation frames.
	pub created_address: Option<H160>,
	/// Interpreter record of the frame.
	pub vm: VmResult,
}

/// Contract address of a legacy creation:
/// the low 20 bytes of `KECCAK(RLP([sender, nonce]))`.
pub fn create_address(sender: H160, nonce: U256) -> H160 {
	let mut stream = RlpStream::new_list(2);
	stream.append(&sender);
	stream.append(&nonce);
	H256::from_slice(Keccak256::digest(&stream.out()).as_slice()).into()
}

struct Frame {
	to_address: H160,
	created_address: Option<H160>,
	vm: VmResult,
}

/// Execute one CALL/CREATE frame against the state.
///
/// The whole frame runs inside one savepoint of the state bundle. On an
/// exceptional halt the savepoint is reverted, which restores the caller
/// debit, the recipient credit, every nested effect and the storage-trie
/// roots in one step; the suicide set is restored alongside. System errors
/// revert the same way before propagating.
pub fn run_call<T, B, I>(
	state: &mut StateManager<T, B>,
	interpreter: &mut I,
	suicides: &mut BTreeSet<H160>,
	params: CallParams,
) -> Result<CallResult, Error>
where
	T: Trie,
	B: Blockchain,
	I: Interpreter<T, B>,
{
	let suicides_snapshot = suicides.clone();
	state.checkpoint();

	let frame = match enter_frame(state, interpreter, suicides, &params) {
		Ok(frame) => frame,
		Err(err) => {
			*suicides = suicides_snapshot;
			state.revert();
			return Err(err);
		}
	};
	let Frame {
		to_address,
		created_address,
		mut vm,
	} = frame;

	let mut gas_used = vm.gas_used;

	// Creation tail: charge for the returned code, or drop the code when
	// the frame cannot afford the install.
	if created_address.is_some() && vm.exception_error.is_none() {
		let return_fee = vm
			.gas_used
			.saturating_add(U256::from(vm.return_value.len() as u64) * U256::from(G_CREATEDATA));
		if return_fee <= params.gas_limit {
			gas_used = return_fee;
		} else {
			debug!(
				target: "evm",
				"returned code of {} bytes does not fit in {} gas, not installed",
				vm.return_value.len(),
				params.gas_limit
			);
			vm.return_value = Vec::new();
		}
	}

	if let Some(halt) = vm.exception_error {
		*suicides = suicides_snapshot;
		state.revert();
		vm.logs.clear();
		vm.return_value = Vec::new();

		if let Some(created) = created_address {
			// A failed creation leaves no empty account behind.
			if state.account(created)?.balance.is_zero() {
				state.delete_account(created);
			}
		}
		debug!(target: "evm", "frame at depth {} halted: {:?}", params.depth, halt);
	} else {
		state.commit();

		// Publish the recipient as the interpreter left it, then install
		// the returned code on top of it.
		state.put_account(to_address, vm.account.clone());
		if let Some(created) = created_address {
			if !vm.return_value.is_empty() {
				state.put_code(created, vm.return_value.clone())?;
			}
		}
	}

	vm.gas_used = gas_used;
	vm.exception = vm.exception_error.is_none();
	vm.suicides = suicides.clone();

	let from_account = state.account(params.caller)?;
	let to_account = state.account(to_address)?;

	Ok(CallResult {
		gas_used,
		from_account,
		to_account,
		created_address,
		vm,
	})
}

/// Steps 1-6 of a frame: transfer the value, resolve the target, select
/// the code and dispatch the interpreter.
fn enter_frame<T, B, I>(
	state: &mut StateManager<T, B>,
	interpreter: &mut I,
	suicides: &mut BTreeSet<H160>,
	params: &CallParams,
) -> Result<Frame, Error>
where
	T: Trie,
	B: Blockchain,
	I: Interpreter<T, B>,
{
	// Debit the caller. Balance sufficiency is the caller's contract; an
	// overdraw here is a bug at the call site.
	let mut from_account = state.account(params.caller)?;
	from_account.balance = from_account
		.balance
		.checked_sub(params.value)
		.ok_or(Error::OutOfFund)?;
	state.put_account(params.caller, from_account.clone());

	// Resolve the target. The caller's nonce was bumped before this frame
	// was entered, so the created address derives from the prior nonce.
	let (to_address, created_address, mut to_account) = match params.to {
		Some(to) => (to, None, state.account(to)?),
		None => {
			let nonce = from_account.nonce.saturating_sub(U256::one());
			let created = create_address(params.caller, nonce);
			(created, Some(created), Account::default())
		}
	};

	// Credit the recipient.
	to_account.balance = to_account.balance.saturating_add(params.value);
	state.put_account(to_address, to_account.clone());

	// Select the code to run.
	let mut compiled = false;
	let (code, data) = if created_address.is_some() {
		(params.data.clone(), Rc::new(Vec::new()))
	} else if let Some(code) = &params.code {
		(code.clone(), params.data.clone())
	} else if is_precompiled(to_address) {
		compiled = true;
		(Rc::new(Vec::new()), params.data.clone())
	} else if to_account.is_contract() {
		(state.code(to_address)?, params.data.clone())
	} else {
		(Rc::new(Vec::new()), params.data.clone())
	};

	// Pure value transfers never reach the interpreter.
	let vm = if code.is_empty() && !compiled {
		VmResult::empty(to_account)
	} else {
		let run = RunParams {
			address: to_address,
			caller: params.caller,
			origin: params.origin.unwrap_or(params.caller),
			code,
			data,
			gas_limit: params.gas_limit,
			gas_price: params.gas_price,
			value: params.value,
			account: to_account,
			block: params.block.clone(),
			depth: params.depth,
		};
		if compiled {
			interpreter.run_precompiled(run, state, suicides)?
		} else {
			interpreter.run_code(run, state, suicides)?
		}
	};

	Ok(Frame {
		to_address,
		created_address,
		vm,
	})
}
