//! 2048-bit log bloom filter.

use sha3::{Digest, Keccak256};

use crate::runtime::Log;

const BLOOM_BYTES: usize = 256;

/// 2048-bit bloom over the addresses and topics of emitted logs.
///
/// Each inserted item sets three bits, indexed by the low eleven bits of
/// the first three 16-bit words of its Keccak-256 digest.
#[derive(Clone, PartialEq, Eq)]
pub struct LogBloom([u8; BLOOM_BYTES]);

impl Default for LogBloom {
	fn default() -> Self {
		Self([0u8; BLOOM_BYTES])
	}
}

impl core::fmt::Debug for LogBloom {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
		write!(f, "LogBloom(")?;
		for byte in &self.0 {
			write!(f, "{:02x}", byte)?;
		}
		write!(f, ")")
	}
}

impl LogBloom {
	/// Insert a single item.
	pub fn insert(&mut self, input: &[u8]) {
		let hash = Keccak256::digest(input);
		for i in 0..3 {
			let bit = (((hash[i * 2] as usize) << 8) | hash[i * 2 + 1] as usize) & 0x7ff;
			self.0[BLOOM_BYTES - 1 - bit / 8] |= 1 << (bit % 8);
		}
	}

	/// Insert the address and every topic of `log`. The data is not part
	/// of the filter.
	pub fn insert_log(&mut self, log: &Log) {
		self.insert(log.address.as_bytes());
		for topic in &log.topics {
			self.insert(topic.as_bytes());
		}
	}

	/// Whether every bit of `input` is set. False positives are possible,
	/// false negatives are not.
	pub fn contains(&self, input: &[u8]) -> bool {
		let hash = Keccak256::digest(input);
		for i in 0..3 {
			let bit = (((hash[i * 2] as usize) << 8) | hash[i * 2 + 1] as usize) & 0x7ff;
			if self.0[BLOOM_BYTES - 1 - bit / 8] & (1 << (bit % 8)) == 0 {
				return false;
			}
		}
		true
	}

	/// Fold another bloom into this one.
	pub fn accrue(&mut self, other: &LogBloom) {
		for (byte, other) in self.0.iter_mut().zip(other.0.iter()) {
			*byte |= other;
		}
	}

	/// The raw 256-byte filter.
	pub fn data(&self) -> &[u8; BLOOM_BYTES] {
		&self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloc::vec::Vec;
	use primitive_types::{H160, H256};

	#[test]
	fn empty_bloom_is_zero() {
		let bloom = LogBloom::default();
		assert!(bloom.data().iter().all(|b| *b == 0));
	}

	#[test]
	fn inserted_items_are_contained() {
		let mut bloom = LogBloom::default();
		let address = H160::repeat_byte(0x11);
		let topic = H256::repeat_byte(0x22);

		bloom.insert(address.as_bytes());
		bloom.insert(topic.as_bytes());

		assert!(bloom.contains(address.as_bytes()));
		assert!(bloom.contains(topic.as_bytes()));
		assert!(!bloom.contains(H160::repeat_byte(0x33).as_bytes()));
	}

	#[test]
	fn log_insertion_covers_address_and_topics() {
		let log = Log {
			address: H160::repeat_byte(0xaa),
			topics: alloc::vec![H256::repeat_byte(0x01), H256::repeat_byte(0x02)],
			data: Vec::from(&b"payload"[..]),
		};

		let mut bloom = LogBloom::default();
		bloom.insert_log(&log);

		assert!(bloom.contains(log.address.as_bytes()));
		assert!(bloom.contains(log.topics[0].as_bytes()));
		assert!(bloom.contains(log.topics[1].as_bytes()));
		assert!(!bloom.contains(&log.data));
	}

	#[test]
	fn accrue_is_a_union() {
		let mut a = LogBloom::default();
		let mut b = LogBloom::default();
		a.insert(b"left");
		b.insert(b"right");

		a.accrue(&b);
		assert!(a.contains(b"left"));
		assert!(a.contains(b"right"));
	}
}
