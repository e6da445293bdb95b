//! The outer transaction frame: validation, gas accounting and fee
//! payment around one call or creation.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::cmp::min;

use log::debug;
use primitive_types::{H160, U256};

use crate::account::Account;
use crate::bloom::LogBloom;
use crate::call::{run_call, CallParams};
use crate::error::Error;
use crate::params::{HeaderParams, Transaction, TransactionAction};
use crate::runtime::{Interpreter, VmResult};
use crate::state::{Blockchain, StateManager};
use crate::trie::Trie;

/// Observer invoked around each transaction. Either hook may abort the
/// transaction by returning an error, which propagates unchanged and
/// skips every later stage, the final flush included.
pub trait TxObserver {
	/// Called after the cache warm-up, before validation.
	fn before_tx(&mut self, _transaction: &Transaction) -> Result<(), Error> {
		Ok(())
	}

	/// Called with the finished results record, before the final flush.
	fn after_tx(&mut self, _results: &TxResult) -> Result<(), Error> {
		Ok(())
	}
}

/// Knobs for one transaction execution.
#[derive(Clone, Debug)]
pub struct TransactOptions {
	/// The transaction to execute.
	pub transaction: Transaction,
	/// Block context; a permissive block is synthesised when absent.
	pub block: Option<HeaderParams>,
	/// Skip the nonce check.
	pub skip_nonce: bool,
	/// Warm the cache up front and clear it after the final flush.
	pub populate_cache: bool,
}

impl TransactOptions {
	pub fn new(transaction: Transaction) -> Self {
		Self {
			transaction,
			block: None,
			skip_nonce: false,
			populate_cache: true,
		}
	}
}

/// Results record of one executed transaction.
#[derive(Clone, Debug)]
pub struct TxResult {
	/// Total gas charged: frame gas plus intrinsic gas, minus the capped
	/// refund.
	pub gas_used: U256,
	/// `gas_used * gas_price`.
	pub amount_spent: U256,
	/// Bloom over the addresses and topics of every emitted log.
	pub bloom: LogBloom,
	/// Sender account after the transaction.
	pub from_account: Account,
	/// Target account after the transaction.
	pub to_account: Account,
	/// Created contract address, on creation transactions.
	pub created_address: Option<H160>,
	/// Interpreter record of the outer frame.
	pub vm: VmResult,
}

/// Execute one signed transaction against the state.
///
/// Stages run in strict order. Validation failures surface before any
/// state mutation; frame exceptions are normal outcomes recorded on the
/// result; storage and hook failures abort mid-way without flushing.
pub fn execute_transaction<T, B, I>(
	state: &mut StateManager<T, B>,
	interpreter: &mut I,
	mut observer: Option<&mut dyn TxObserver>,
	options: TransactOptions,
) -> Result<TxResult, Error>
where
	T: Trie,
	B: Blockchain,
	I: Interpreter<T, B>,
{
	let tx = &options.transaction;
	let block = options.block.clone().unwrap_or_default();

	if tx.gas_limit > block.gas_limit {
		return Err(Error::TxGasExceedsBlock);
	}

	if options.populate_cache {
		let mut warm = Vec::new();
		warm.push(tx.from);
		warm.push(block.beneficiary);
		if let TransactionAction::Call(to) = tx.action {
			warm.push(to);
		}
		state.warm_cache(&warm)?;
	}

	if let Some(observer) = observer.as_mut() {
		observer.before_tx(tx)?;
	}

	// Validation. Nothing is mutated until all checks pass.
	let from_account = state.account(tx.from)?;
	let (fee, fee_overflow) = tx.gas_limit.overflowing_mul(tx.gas_price);
	let (upfront, upfront_overflow) = fee.overflowing_add(tx.value);
	if fee_overflow || upfront_overflow || from_account.balance < upfront {
		return Err(Error::InsufficientFunds);
	}
	if !options.skip_nonce && from_account.nonce != tx.nonce {
		return Err(Error::BadNonce);
	}
	let basefee = tx.intrinsic_gas();
	if tx.gas_limit < basefee {
		return Err(Error::InsufficientGasLimit);
	}

	// Nonce bump and gas pre-charge.
	state.increment_nonce(tx.from)?;
	let mut from_account = state.account(tx.from)?;
	from_account.balance = from_account.balance - fee;
	state.put_account(tx.from, from_account);

	// The inner frame.
	let mut suicides = BTreeSet::new();
	let frame = run_call(
		state,
		interpreter,
		&mut suicides,
		CallParams {
			caller: tx.from,
			to: match tx.action {
				TransactionAction::Call(to) => Some(to),
				TransactionAction::Create => None,
			},
			value: tx.value,
			data: tx.input.clone(),
			code: None,
			gas_limit: tx.gas_limit - basefee,
			gas_price: tx.gas_price,
			origin: Some(tx.from),
			block: block.clone(),
			depth: 0,
		},
	)?;

	// Effective gas, with the refund capped at half of what was used.
	let mut gas_used = frame.gas_used + basefee;
	let refund = min(frame.vm.gas_refund, gas_used / U256::from(2));
	gas_used = gas_used - refund;

	// Return what the sender did not use, pay the miner.
	let mut from_account = state.account(tx.from)?;
	from_account.balance = from_account
		.balance
		.saturating_add((tx.gas_limit - gas_used) * tx.gas_price);
	state.put_account(tx.from, from_account);

	let mut coinbase = state.account(block.beneficiary)?;
	coinbase.balance = coinbase.balance.saturating_add(gas_used * tx.gas_price);
	state.put_account(block.beneficiary, coinbase);

	// End-of-transaction sweeps.
	for address in suicides.iter() {
		state.delete_account(*address);
	}
	state.commit_contracts()?;

	let mut bloom = LogBloom::default();
	for log in &frame.vm.logs {
		bloom.insert_log(log);
	}

	let to_account = match tx.action {
		TransactionAction::Call(to) => state.account(to)?,
		TransactionAction::Create => match frame.created_address {
			Some(created) => state.account(created)?,
			None => frame.to_account.clone(),
		},
	};

	let results = TxResult {
		gas_used,
		amount_spent: gas_used * tx.gas_price,
		bloom,
		from_account: state.account(tx.from)?,
		to_account,
		created_address: frame.created_address,
		vm: frame.vm,
	};

	if let Some(observer) = observer.as_mut() {
		observer.after_tx(&results)?;
	}

	state.flush()?;
	if options.populate_cache {
		state.clear_cache();
	}

	debug!(
		target: "evm",
		"transaction from {:?} used {} gas{}",
		tx.from,
		results.gas_used,
		if results.vm.exception { "" } else { " (halted)" }
	);

	Ok(results)
}
