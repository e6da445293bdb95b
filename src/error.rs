//! Error taxonomy of the execution core.
//!
//! Exceptional halts inside a frame are not errors: they are reported on
//! the frame's result record (see [`crate::VmError`]) and leave the state
//! rolled back to the frame checkpoint. The variants here abort the whole
//! transaction.

use alloc::string::String;

use primitive_types::{H160, H256};

/// Errors from the authenticated key-value store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieError {
	/// No contents are known for the requested root.
	MissingRoot(H256),
}

/// Errors aborting a transaction or a state operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
	/// Transaction gas limit exceeds the block gas limit.
	TxGasExceedsBlock,
	/// Sender balance cannot cover the up-front cost of the transaction.
	InsufficientFunds,
	/// Transaction gas limit is below the intrinsic gas.
	InsufficientGasLimit,
	/// Transaction nonce does not match the sender account nonce.
	BadNonce,
	/// Strict cache read of an address that was never warmed or loaded.
	CacheMiss(H160),
	/// A value transfer would overdraw the source account.
	OutOfFund,
	/// The backing trie failed; the state must be treated as undefined.
	Trie(TrieError),
	/// A stored record failed to decode.
	Rlp(rlp::DecoderError),
	/// An observer hook aborted the transaction.
	Hook(String),
}

impl From<TrieError> for Error {
	fn from(err: TrieError) -> Self {
		Error::Trie(err)
	}
}

impl From<rlp::DecoderError> for Error {
	fn from(err: rlp::DecoderError) -> Self {
		Error::Rlp(err)
	}
}
