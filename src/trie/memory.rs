//! In-memory reference trie.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use primitive_types::H256;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

use super::Trie;
use crate::account::EMPTY_TRIE_ROOT;
use crate::error::TrieError;

type Contents = BTreeMap<Vec<u8>, Vec<u8>>;

/// Reference [`Trie`] backed by an ordinary map.
///
/// The root is the Keccak-256 of the RLP of the sorted contents. Every
/// root ever reported is retained in a snapshot store shared between all
/// handles over the same backing store, so [`Trie::at_root`] can reopen any
/// historical root, the way a real trie database resolves roots to nodes.
pub struct MemoryTrie {
	db: Rc<RefCell<BTreeMap<H256, Contents>>>,
	data: Contents,
	checkpoints: Vec<Contents>,
}

impl MemoryTrie {
	/// An empty trie over a fresh backing store.
	pub fn new() -> Self {
		Self {
			db: Rc::new(RefCell::new(BTreeMap::new())),
			data: Contents::new(),
			checkpoints: Vec::new(),
		}
	}

	fn hash_contents(data: &Contents) -> H256 {
		if data.is_empty() {
			return EMPTY_TRIE_ROOT;
		}
		let mut stream = RlpStream::new_list(data.len());
		for (key, value) in data {
			stream.begin_list(2);
			stream.append(key);
			stream.append(value);
		}
		H256::from_slice(Keccak256::digest(&stream.out()).as_slice())
	}

	fn view(&self, data: Contents) -> Self {
		Self {
			db: self.db.clone(),
			data,
			checkpoints: Vec::new(),
		}
	}
}

impl Default for MemoryTrie {
	fn default() -> Self {
		Self::new()
	}
}

impl Trie for MemoryTrie {
	fn root(&self) -> H256 {
		let root = Self::hash_contents(&self.data);
		self.db.borrow_mut().insert(root, self.data.clone());
		root
	}

	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
		Ok(self.data.get(key).cloned())
	}

	fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
		self.data.insert(key.to_vec(), value);
		Ok(())
	}

	fn delete(&mut self, key: &[u8]) -> Result<(), TrieError> {
		self.data.remove(key);
		Ok(())
	}

	fn checkpoint(&mut self) {
		self.checkpoints.push(self.data.clone());
	}

	fn commit(&mut self) {
		self.checkpoints.pop().expect("no trie checkpoint to commit");
	}

	fn revert(&mut self) {
		self.data = self.checkpoints.pop().expect("no trie checkpoint to revert");
	}

	fn copy(&self) -> Self {
		self.view(self.data.clone())
	}

	fn at_root(&self, root: H256) -> Result<Self, TrieError> {
		if root == EMPTY_TRIE_ROOT {
			return Ok(self.view(Contents::new()));
		}
		let data = self
			.db
			.borrow()
			.get(&root)
			.cloned()
			.ok_or(TrieError::MissingRoot(root))?;
		Ok(self.view(data))
	}
}
