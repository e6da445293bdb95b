//! Transaction and block parameters consumed by the executors.

use alloc::rc::Rc;
use alloc::vec::Vec;

use primitive_types::{H160, U256};

/// Gas charged for any transaction.
pub const G_TRANSACTION: u64 = 21000;
/// Extra gas charged for a contract-creating transaction.
pub const G_TXCREATE: u64 = 32000;
/// Gas charged per zero byte of transaction data.
pub const G_TXDATAZERO: u64 = 4;
/// Gas charged per non-zero byte of transaction data.
pub const G_TXDATANONZERO: u64 = 68;
/// Gas charged per byte of contract code installed at creation.
pub const G_CREATEDATA: u64 = 200;

/// Gas limit of the synthesised block used when none is supplied. Larger
/// than any transaction gas limit in practice.
pub(crate) const DEFAULT_BLOCK_GAS_LIMIT: u64 = (1 << 52) - 1;

/// Whether a transaction calls an existing account or creates a contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionAction {
	/// Message call to the given address.
	Call(H160),
	/// Contract creation; the transaction input is the init code.
	Create,
}

/// A transaction whose sender has already been recovered upstream.
#[derive(Clone, Debug)]
pub struct Transaction {
	/// Recovered sender address.
	pub from: H160,
	/// Sender nonce the transaction claims.
	pub nonce: U256,
	/// Price paid per unit of gas.
	pub gas_price: U256,
	/// Gas limit of the transaction.
	pub gas_limit: U256,
	/// Call target, or contract creation.
	pub action: TransactionAction,
	/// Value transferred to the target.
	pub value: U256,
	/// Call data, or init code for a creation.
	pub input: Rc<Vec<u8>>,
}

impl Transaction {
	/// Intrinsic gas paid before any code runs: the fixed transaction
	/// cost, the creation surcharge and the per-byte data cost.
	pub fn intrinsic_gas(&self) -> U256 {
		let mut gas = U256::from(G_TRANSACTION);

		if self.action == TransactionAction::Create {
			gas = gas + U256::from(G_TXCREATE);
		}

		for byte in self.input.iter() {
			if *byte == 0 {
				gas = gas + U256::from(G_TXDATAZERO);
			} else {
				gas = gas + U256::from(G_TXDATANONZERO);
			}
		}

		gas
	}
}

/// Block header fields visible to the execution core.
#[derive(Clone, Debug)]
pub struct HeaderParams {
	/// Block coinbase, the address credited with gas fees.
	pub beneficiary: H160,
	/// The current block number.
	pub number: U256,
	/// Total block gas limit.
	pub gas_limit: U256,
	/// Block timestamp.
	pub timestamp: u64,
	/// Difficulty of the block.
	pub difficulty: U256,
}

impl Default for HeaderParams {
	/// A block that accepts any transaction, synthesised when the caller
	/// supplies none.
	fn default() -> Self {
		Self {
			beneficiary: H160::default(),
			number: U256::zero(),
			gas_limit: U256::from(DEFAULT_BLOCK_GAS_LIMIT),
			timestamp: 0,
			difficulty: U256::zero(),
		}
	}
}
