//! The account record and its canonical serialisation.

use alloc::vec::Vec;

use primitive_types::{H256, U256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use sha3::{Digest, Keccak256};

/// Root of the empty trie, `KECCAK(RLP(""))`.
pub const EMPTY_TRIE_ROOT: H256 = H256([
	0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
	0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
	0xb4, 0x21,
]);

/// Hash of empty code, `KECCAK("")`.
pub const EMPTY_CODE_HASH: H256 = H256([
	0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
	0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
	0xa4, 0x70,
]);

/// State of one account: nonce, balance, root of the contract storage trie
/// and hash of the contract code.
///
/// Stored in the state trie as the RLP list of its four fields, keyed by
/// the 20-byte address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
	/// Number of transactions sent from this account, or number of
	/// contract creations made by it.
	pub nonce: U256,
	/// Balance in wei.
	pub balance: U256,
	/// Root of the account's storage trie.
	pub storage_root: H256,
	/// Hash of the account's code.
	pub code_hash: H256,
}

impl Default for Account {
	fn default() -> Self {
		Self {
			nonce: U256::zero(),
			balance: U256::zero(),
			storage_root: EMPTY_TRIE_ROOT,
			code_hash: EMPTY_CODE_HASH,
		}
	}
}

impl Account {
	/// Whether the account carries code.
	pub fn is_contract(&self) -> bool {
		self.code_hash != EMPTY_CODE_HASH
	}

	/// Hash under which `code` is stored in the code region.
	pub fn code_hash_of(code: &[u8]) -> H256 {
		if code.is_empty() {
			EMPTY_CODE_HASH
		} else {
			H256::from_slice(Keccak256::digest(code).as_slice())
		}
	}

	/// The RLP encoding written into the state trie.
	pub fn to_rlp(&self) -> Vec<u8> {
		rlp::encode(self).to_vec()
	}
}

impl Encodable for Account {
	fn rlp_append(&self, s: &mut RlpStream) {
		s.begin_list(4);
		s.append(&self.nonce);
		s.append(&self.balance);
		s.append(&self.storage_root);
		s.append(&self.code_hash);
	}
}

impl Decodable for Account {
	fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
		Ok(Self {
			nonce: rlp.val_at(0)?,
			balance: rlp.val_at(1)?,
			storage_root: rlp.val_at(2)?,
			code_hash: rlp.val_at(3)?,
		})
	}
}
