//! Per-contract storage tries, opened lazily for the duration of one
//! transaction.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use primitive_types::{H160, H256};

use crate::error::Error;
use crate::trie::Trie;

/// Registry of open storage tries, keyed by contract address.
pub struct StorageTries<T> {
	tries: BTreeMap<H160, T>,
	checkpoints: Vec<BTreeMap<H160, T>>,
}

impl<T: Trie> StorageTries<T> {
	pub fn new() -> Self {
		Self {
			tries: BTreeMap::new(),
			checkpoints: Vec::new(),
		}
	}

	/// Handle for `address`, if one was opened.
	pub fn get(&self, address: H160) -> Option<&T> {
		self.tries.get(&address)
	}

	/// Handle for `address`, opened over `outer`'s backing store at `root`
	/// on first use.
	pub fn get_or_open(&mut self, address: H160, root: H256, outer: &T) -> Result<&mut T, Error> {
		if !self.tries.contains_key(&address) {
			self.tries.insert(address, outer.at_root(root)?);
		}
		Ok(self
			.tries
			.get_mut(&address)
			.expect("storage trie was just inserted"))
	}

	/// Drain every handle, reporting the final storage root per contract.
	pub fn commit_all(&mut self) -> Vec<(H160, H256)> {
		let tries = mem::take(&mut self.tries);
		tries
			.iter()
			.map(|(address, trie)| (*address, trie.root()))
			.collect()
	}

	/// Snapshot the registry, storage-trie contents included.
	pub fn checkpoint(&mut self) {
		let snapshot = self
			.tries
			.iter()
			.map(|(address, trie)| (*address, trie.copy()))
			.collect();
		self.checkpoints.push(snapshot);
	}

	/// Drop the innermost snapshot.
	///
	/// Panics when no checkpoint is open.
	pub fn commit(&mut self) {
		self.checkpoints
			.pop()
			.expect("no storage checkpoint to commit");
	}

	/// Restore the innermost snapshot.
	///
	/// Panics when no checkpoint is open.
	pub fn revert(&mut self) {
		self.tries = self
			.checkpoints
			.pop()
			.expect("no storage checkpoint to revert");
	}
}

impl<T: Trie> Default for StorageTries<T> {
	fn default() -> Self {
		Self::new()
	}
}
