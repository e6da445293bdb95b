//! # Trie-backed Ethereum transaction execution
//!
//! This crate executes signed transactions against an authenticated account
//! state: a write-back account cache and per-contract storage tries layered
//! over a Merkle trie, a call executor running one CALL/CREATE frame at a
//! time, and a transaction executor handling validation, gas accounting and
//! fee payment around the outer frame.
//!
//! The opcode interpreter is not part of this crate. It is supplied by the
//! embedder through the [`Interpreter`] trait and invoked once per frame;
//! nested calls re-enter [`run_call`] through the same capability.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod account;
mod bloom;
mod call;
mod error;
mod params;
mod runtime;
mod transact;

pub mod state;
pub mod trie;

pub use crate::account::{Account, EMPTY_CODE_HASH, EMPTY_TRIE_ROOT};
pub use crate::bloom::LogBloom;
pub use crate::call::{create_address, run_call, CallParams, CallResult};
pub use crate::error::{Error, TrieError};
pub use crate::params::{
	HeaderParams, Transaction, TransactionAction, G_CREATEDATA, G_TRANSACTION, G_TXCREATE,
	G_TXDATANONZERO, G_TXDATAZERO,
};
pub use crate::runtime::{is_precompiled, Interpreter, Log, RunParams, VmError, VmResult};
pub use crate::state::{Blockchain, NullBlockchain, StateManager};
pub use crate::transact::{execute_transaction, TransactOptions, TxObserver, TxResult};
pub use crate::trie::{MemoryTrie, Trie};
