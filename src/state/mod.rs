//! Layered, checkpointable view over the authenticated account state.

mod cache;
mod storage;

pub use self::cache::{AccountCache, CacheEntry};
pub use self::storage::StorageTries;

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;

use log::trace;
use primitive_types::{H160, H256, U256};

use crate::account::{Account, EMPTY_CODE_HASH};
use crate::error::Error;
use crate::trie::Trie;

/// Chain context for the BLOCKHASH lookup.
pub trait Blockchain {
	/// Hash of the block at `number`.
	fn block_hash(&self, number: U256) -> Result<H256, Error>;
}

/// Stub chain that knows no blocks.
#[derive(Clone, Debug, Default)]
pub struct NullBlockchain;

impl Blockchain for NullBlockchain {
	fn block_hash(&self, _number: U256) -> Result<H256, Error> {
		Ok(H256::default())
	}
}

/// Unified state facade.
///
/// Owns the outer trie, the write-back account cache, the per-contract
/// storage tries and the content-addressed code region, and checkpoints
/// them as one transactional unit: [`StateManager::revert`] rolls every
/// layer back to the matching [`StateManager::checkpoint`] together.
///
/// All mutators read the account fresh from the cache at the write site;
/// callers never hand in their own account copies.
pub struct StateManager<T, B> {
	trie: T,
	cache: AccountCache,
	storage: StorageTries<T>,
	codes: BTreeMap<H256, Rc<Vec<u8>>>,
	blockchain: B,
}

impl<T: Trie, B: Blockchain> StateManager<T, B> {
	pub fn new(trie: T, blockchain: B) -> Self {
		Self {
			trie,
			cache: AccountCache::new(),
			storage: StorageTries::new(),
			codes: BTreeMap::new(),
			blockchain,
		}
	}

	/// The account under `address`. Missing keys yield the zero account.
	pub fn account(&mut self, address: H160) -> Result<Account, Error> {
		self.cache.get_or_load(address, &self.trie)
	}

	/// Write an account into the cache, scheduling a trie write on flush.
	pub fn put_account(&mut self, address: H160, account: Account) {
		self.cache.put(address, account);
	}

	/// Read-modify-write of the account nonce.
	pub fn increment_nonce(&mut self, address: H160) -> Result<(), Error> {
		let mut account = self.account(address)?;
		account.nonce = account.nonce + U256::one();
		self.cache.put(address, account);
		Ok(())
	}

	/// Replace the account balance, preserving every other field.
	pub fn put_balance(&mut self, address: H160, balance: U256) -> Result<(), Error> {
		let mut account = self.account(address)?;
		account.balance = balance;
		self.cache.put(address, account);
		Ok(())
	}

	/// Mark the account deleted; flush removes it from the trie.
	pub fn delete_account(&mut self, address: H160) {
		self.cache.del(address);
	}

	/// Code of the contract under `address`. Accounts without code yield
	/// the empty blob.
	pub fn code(&mut self, address: H160) -> Result<Rc<Vec<u8>>, Error> {
		let account = self.account(address)?;
		if account.code_hash == EMPTY_CODE_HASH {
			return Ok(Rc::new(Vec::new()));
		}
		Ok(self
			.codes
			.get(&account.code_hash)
			.cloned()
			.unwrap_or_else(|| Rc::new(Vec::new())))
	}

	/// Install `code` under `address`: the blob goes into the code region
	/// keyed by its hash, the hash into the cached account.
	///
	/// The code region is content-addressed and is never rolled back;
	/// reverting the account's `code_hash` is sufficient, orphaned blobs
	/// are inert.
	pub fn put_code(&mut self, address: H160, code: Vec<u8>) -> Result<(), Error> {
		let mut account = self.account(address)?;
		account.code_hash = Account::code_hash_of(&code);
		if account.code_hash != EMPTY_CODE_HASH {
			self.codes.insert(account.code_hash, Rc::new(code));
		}
		self.cache.put(address, account);
		Ok(())
	}

	/// Storage slot `key` of the contract under `address`. Unset slots
	/// read as zero.
	pub fn storage(&mut self, address: H160, key: H256) -> Result<U256, Error> {
		let account = self.account(address)?;
		let raw = match self.storage.get(address) {
			Some(trie) => trie.get(key.as_bytes())?,
			None => self
				.trie
				.at_root(account.storage_root)?
				.get(key.as_bytes())?,
		};
		Ok(match raw {
			Some(raw) => rlp::decode(&raw)?,
			None => U256::zero(),
		})
	}

	/// Write a storage slot and fold the new storage root back into the
	/// cached account. Zero values delete the slot.
	pub fn put_storage(&mut self, address: H160, key: H256, value: U256) -> Result<(), Error> {
		let mut account = self.account(address)?;
		let trie = self
			.storage
			.get_or_open(address, account.storage_root, &self.trie)?;

		if value.is_zero() {
			trie.delete(key.as_bytes())?;
		} else {
			trie.put(key.as_bytes(), rlp::encode(&value).to_vec())?;
		}

		account.storage_root = trie.root();
		self.cache.put(address, account);
		Ok(())
	}

	/// Block hash lookup for the BLOCKHASH opcode.
	pub fn block_hash(&self, number: U256) -> Result<H256, Error> {
		self.blockchain.block_hash(number)
	}

	/// Pre-load `addresses` into the cache as warm, clean entries.
	pub fn warm_cache(&mut self, addresses: &[H160]) -> Result<(), Error> {
		self.cache.warm(addresses, &self.trie)
	}

	/// Open a savepoint across the cache, the outer trie and the storage
	/// tries.
	pub fn checkpoint(&mut self) {
		self.cache.checkpoint();
		self.trie.checkpoint();
		self.storage.checkpoint();
	}

	/// Close the innermost savepoint, keeping all changes.
	pub fn commit(&mut self) {
		self.cache.commit();
		self.trie.commit();
		self.storage.commit();
	}

	/// Roll every layer back to the innermost savepoint.
	pub fn revert(&mut self) {
		self.cache.revert();
		self.trie.revert();
		self.storage.revert();
	}

	/// Commit every open storage trie, folding its final root into the
	/// cached account, and drop the handles.
	pub fn commit_contracts(&mut self) -> Result<(), Error> {
		for (address, root) in self.storage.commit_all() {
			let mut account = self.cache.get_or_load(address, &self.trie)?;
			if account.storage_root != root {
				account.storage_root = root;
				self.cache.put(address, account);
			}
		}
		Ok(())
	}

	/// Write the cache through and report the outer trie root.
	pub fn state_root(&mut self) -> Result<H256, Error> {
		self.flush()?;
		Ok(self.trie.root())
	}

	/// Write every dirty cache entry through to the trie.
	pub fn flush(&mut self) -> Result<(), Error> {
		self.cache.flush(&mut self.trie)?;
		trace!(target: "evm", "account cache flushed");
		Ok(())
	}

	/// Drop every cache entry.
	pub fn clear_cache(&mut self) {
		self.cache.clear();
	}

	/// The underlying cache, for strict reads.
	pub fn cache(&self) -> &AccountCache {
		&self.cache
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::trie::MemoryTrie;

	fn state() -> StateManager<MemoryTrie, NullBlockchain> {
		StateManager::new(MemoryTrie::new(), NullBlockchain)
	}

	fn address(byte: u8) -> H160 {
		H160::repeat_byte(byte)
	}

	#[test]
	fn accounts_round_trip() {
		let mut state = state();
		let mut account = Account::default();
		account.balance = U256::from(42);
		account.nonce = U256::from(2);

		state.put_account(address(0x01), account.clone());
		assert_eq!(state.account(address(0x01)).unwrap(), account);

		// Still there after a flush and a cold re-read.
		state.flush().unwrap();
		state.clear_cache();
		assert_eq!(state.account(address(0x01)).unwrap(), account);
	}

	#[test]
	fn missing_accounts_read_as_zero() {
		let mut state = state();
		assert_eq!(state.account(address(0x09)).unwrap(), Account::default());
	}

	#[test]
	fn nonce_increments_atomically() {
		let mut state = state();
		state.increment_nonce(address(0x01)).unwrap();
		state.increment_nonce(address(0x01)).unwrap();
		assert_eq!(state.account(address(0x01)).unwrap().nonce, U256::from(2));
	}

	#[test]
	fn balance_updates_preserve_other_fields() {
		let mut state = state();
		state.increment_nonce(address(0x01)).unwrap();
		state.put_balance(address(0x01), U256::from(900)).unwrap();

		let account = state.account(address(0x01)).unwrap();
		assert_eq!(account.balance, U256::from(900));
		assert_eq!(account.nonce, U256::one());
	}

	#[test]
	fn code_round_trips_through_the_code_region() {
		let mut state = state();
		let code = alloc::vec![0x60, 0x01, 0x60, 0x02];

		state.put_code(address(0x01), code.clone()).unwrap();
		assert!(state.account(address(0x01)).unwrap().is_contract());
		assert_eq!(*state.code(address(0x01)).unwrap(), code);

		// Plain accounts read as empty code.
		assert!(state.code(address(0x02)).unwrap().is_empty());
	}

	#[test]
	fn storage_round_trips_and_zero_deletes() {
		let mut state = state();
		let key = H256::repeat_byte(0x01);

		state
			.put_storage(address(0x01), key, U256::from(1234))
			.unwrap();
		assert_eq!(state.storage(address(0x01), key).unwrap(), U256::from(1234));

		state.put_storage(address(0x01), key, U256::zero()).unwrap();
		assert_eq!(state.storage(address(0x01), key).unwrap(), U256::zero());
		assert_eq!(
			state.account(address(0x01)).unwrap().storage_root,
			crate::account::EMPTY_TRIE_ROOT
		);
	}

	#[test]
	fn cached_storage_root_matches_the_open_trie() {
		let mut state = state();
		state
			.put_storage(address(0x01), H256::repeat_byte(0x01), U256::from(7))
			.unwrap();
		state
			.put_storage(address(0x01), H256::repeat_byte(0x02), U256::from(8))
			.unwrap();

		let cached = state.account(address(0x01)).unwrap().storage_root;
		let open = state.storage.get(address(0x01)).unwrap().root();
		assert_eq!(cached, open);
	}

	#[test]
	fn storage_survives_commit_contracts() {
		let mut state = state();
		let key = H256::repeat_byte(0x01);
		state
			.put_storage(address(0x01), key, U256::from(55))
			.unwrap();
		state.commit_contracts().unwrap();
		state.flush().unwrap();
		state.clear_cache();

		assert_eq!(state.storage(address(0x01), key).unwrap(), U256::from(55));
	}

	#[test]
	fn revert_restores_every_layer() {
		let mut state = state();
		state.put_balance(address(0x01), U256::from(10)).unwrap();
		state
			.put_storage(address(0x02), H256::repeat_byte(0x01), U256::from(1))
			.unwrap();
		let root_before = state.state_root().unwrap();
		let storage_root_before = state.account(address(0x02)).unwrap().storage_root;

		state.checkpoint();
		state.put_balance(address(0x01), U256::from(999)).unwrap();
		state
			.put_storage(address(0x02), H256::repeat_byte(0x01), U256::from(2))
			.unwrap();
		state.delete_account(address(0x03));
		state.revert();

		assert_eq!(state.account(address(0x01)).unwrap().balance, U256::from(10));
		assert_eq!(
			state.storage(address(0x02), H256::repeat_byte(0x01)).unwrap(),
			U256::one()
		);
		assert_eq!(
			state.account(address(0x02)).unwrap().storage_root,
			storage_root_before
		);
		assert_eq!(state.state_root().unwrap(), root_before);
	}

	#[test]
	fn warming_then_flushing_leaves_the_root_unchanged() {
		let mut state = state();
		state.put_balance(address(0x01), U256::from(5)).unwrap();
		let root = state.state_root().unwrap();
		state.clear_cache();

		state
			.warm_cache(&[address(0x01), address(0x02), address(0x03)])
			.unwrap();
		assert_eq!(state.state_root().unwrap(), root);
	}

	#[test]
	fn block_hashes_come_from_the_chain_handle() {
		let state = state();
		assert_eq!(state.block_hash(U256::from(7)).unwrap(), H256::default());
	}
}
