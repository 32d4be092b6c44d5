//! Cryptographic primitives behind the UTXO set commitment.

pub mod muhash;
pub mod secp256k1;

pub use self::muhash::{MuHash3072, MuHashDigest};

use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};

/// Size of a ChaCha20 block in bytes.
const CHACHA20_BLOCK_SIZE: u64 = 64;

/// Overwrites `buf` with ChaCha20 keystream, starting at block `counter`.
pub fn chacha20_keystream(key: &[u8; 32], nonce: &[u8; 12], counter: u32, buf: &mut [u8]) {
    let mut cipher = ChaCha20::new(key.into(), nonce.into());
    cipher.seek(u64::from(counter) * CHACHA20_BLOCK_SIZE);

    // XOR over zeroes yields the raw keystream.
    buf.fill(0);
    cipher.apply_keystream(buf);
}
