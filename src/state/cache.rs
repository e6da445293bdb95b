//! Write-back account cache in front of the state trie.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use primitive_types::H160;

use crate::account::Account;
use crate::error::Error;
use crate::trie::Trie;

/// One cached account with its write-back flags.
#[derive(Clone, Debug)]
pub struct CacheEntry {
	/// The account value.
	pub account: Account,
	/// Entry diverged from the trie and must be written on flush.
	pub dirty: bool,
	/// Entry is scheduled for removal from the trie on flush.
	pub deleted: bool,
	/// Entry was pre-loaded from the trie.
	pub warm: bool,
}

/// Write-back map from address to account.
///
/// Reads are served from the entry table; writes stay in the table until
/// [`AccountCache::flush`] walks the dirty entries through to the trie.
/// Checkpoints snapshot the whole table; reverting restores the snapshot.
#[derive(Default)]
pub struct AccountCache {
	entries: BTreeMap<H160, CacheEntry>,
	checkpoints: Vec<BTreeMap<H160, CacheEntry>>,
}

impl AccountCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Strict lookup. The address must have been warmed or loaded before.
	pub fn get(&self, address: H160) -> Result<&CacheEntry, Error> {
		self.entries.get(&address).ok_or(Error::CacheMiss(address))
	}

	/// Cached account, falling back to the trie. A key missing from the
	/// trie yields the fresh zero account.
	pub fn get_or_load<T: Trie>(&mut self, address: H160, trie: &T) -> Result<Account, Error> {
		if let Some(entry) = self.entries.get(&address) {
			return Ok(entry.account.clone());
		}

		let account = Self::load(address, trie)?;
		self.put_warm(address, account.clone());
		Ok(account)
	}

	fn load<T: Trie>(address: H160, trie: &T) -> Result<Account, Error> {
		match trie.get(address.as_bytes())? {
			Some(raw) => Ok(rlp::decode(&raw)?),
			None => Ok(Account::default()),
		}
	}

	/// Write an account into the cache, scheduling a trie write on flush.
	pub fn put(&mut self, address: H160, account: Account) {
		self.entries.insert(
			address,
			CacheEntry {
				account,
				dirty: true,
				deleted: false,
				warm: true,
			},
		);
	}

	/// Insert a clean, warm entry. Flush skips it unless it is mutated
	/// later.
	pub fn put_warm(&mut self, address: H160, account: Account) {
		self.entries.insert(
			address,
			CacheEntry {
				account,
				dirty: false,
				deleted: false,
				warm: true,
			},
		);
	}

	/// Mark an account deleted. Flush removes the key from the trie.
	pub fn del(&mut self, address: H160) {
		self.entries.insert(
			address,
			CacheEntry {
				account: Account::default(),
				dirty: true,
				deleted: true,
				warm: true,
			},
		);
	}

	/// Pre-load addresses from the trie as warm, clean entries. Entries
	/// already cached are left alone.
	pub fn warm<T: Trie>(&mut self, addresses: &[H160], trie: &T) -> Result<(), Error> {
		for address in addresses {
			self.get_or_load(*address, trie)?;
		}
		Ok(())
	}

	/// Snapshot the entry table.
	pub fn checkpoint(&mut self) {
		self.checkpoints.push(self.entries.clone());
	}

	/// Drop the innermost snapshot, keeping the current table.
	///
	/// Panics when no checkpoint is open.
	pub fn commit(&mut self) {
		self.checkpoints
			.pop()
			.expect("no cache checkpoint to commit");
	}

	/// Restore the innermost snapshot.
	///
	/// Panics when no checkpoint is open.
	pub fn revert(&mut self) {
		self.entries = self
			.checkpoints
			.pop()
			.expect("no cache checkpoint to revert");
	}

	/// Write every dirty entry through to the trie. Warm entries that
	/// stayed clean are never written.
	pub fn flush<T: Trie>(&mut self, trie: &mut T) -> Result<(), Error> {
		for (address, entry) in self.entries.iter_mut() {
			if !entry.dirty {
				continue;
			}
			if entry.deleted {
				trie.delete(address.as_bytes())?;
			} else {
				trie.put(address.as_bytes(), entry.account.to_rlp())?;
			}
			entry.dirty = false;
		}
		Ok(())
	}

	/// Drop every entry. Open checkpoints are unaffected.
	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
