//! MuHash3072, the multiplicative set hash reported by `gettxoutsetinfo muhash`.
//!
//! https://github.com/bitcoin/bitcoin/blob/6f9db1e/src/crypto/muhash.h#L61

use crate::chacha20_keystream;
use num_bigint::BigUint;
use num_traits::One;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::LazyLock;

/// Byte length of a serialized 3072-bit field element.
pub const NUM3072_BYTES: usize = 384;

/// `2^3072 - 1103717`, the largest 3072-bit safe prime.
static MODULUS: LazyLock<BigUint> =
    LazyLock::new(|| (BigUint::one() << 3072) - BigUint::from(1103717u32));

/// Maps arbitrary data to an element of the 3072-bit field.
///
/// The SHA256 digest of `data` keys ChaCha20 (zero nonce, counter 0) and the first 384 bytes of
/// keystream are read as a little-endian integer.
pub fn data_to_num3072(data: &[u8]) -> BigUint {
    let key: [u8; 32] = Sha256::digest(data).into();

    let mut bytes384 = [0u8; NUM3072_BYTES];
    chacha20_keystream(&key, &[0u8; 12], 0, &mut bytes384);

    BigUint::from_bytes_le(&bytes384) % &*MODULUS
}

/// Running MuHash accumulator.
///
/// Starts at the multiplicative identity and multiplies in one field element per inserted
/// item, so the final digest does not depend on insertion order. [`MuHash3072::finalize`]
/// consumes the accumulator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MuHash3072 {
    numerator: BigUint,
}

impl Default for MuHash3072 {
    fn default() -> Self {
        Self::new()
    }
}

impl MuHash3072 {
    /// Creates an accumulator representing the empty set.
    pub fn new() -> Self {
        Self {
            numerator: BigUint::one(),
        }
    }

    /// Inserts a byte string into the set.
    pub fn insert(&mut self, data: &[u8]) {
        self.numerator *= data_to_num3072(data);
        self.numerator %= &*MODULUS;
    }

    /// Finalizes the accumulator into the 32-byte commitment.
    pub fn finalize(self) -> MuHashDigest {
        let mut bytes384 = self.numerator.to_bytes_le();
        bytes384.resize(NUM3072_BYTES, 0);
        MuHashDigest(Sha256::digest(&bytes384).into())
    }
}

/// Finalized MuHash commitment.
///
/// Stored in hash order; [`fmt::Display`] renders the reversed byte order used by
/// Bitcoin Core when printing 256-bit hashes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MuHashDigest([u8; 32]);

impl MuHashDigest {
    /// Raw digest bytes in hash order.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the value of `muhash` as shown in Bitcoin Core's `gettxoutsetinfo` output.
    pub fn txoutset_muhash(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MuHashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
