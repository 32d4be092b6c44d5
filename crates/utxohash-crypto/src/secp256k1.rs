//! Public key decompression on secp256k1.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::sync::LazyLock;

/// Field prime `p = 2^256 - 2^32 - 977`.
static FIELD_PRIME: LazyLock<BigUint> = LazyLock::new(|| {
    (BigUint::one() << 256) - (BigUint::one() << 32) - BigUint::from(977u32)
});

/// `(p + 1) / 4`. Since `p ≡ 3 (mod 4)`, `a^((p+1)/4)` is a square root of `a` whenever one exists.
static SQRT_EXPONENT: LazyLock<BigUint> = LazyLock::new(|| (&*FIELD_PRIME + 1u32) >> 2);

/// Curve constant `b` in `y² = x³ + b`.
const CURVE_B: u32 = 7;

/// Tag byte of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_TAG: u8 = 0x04;

/// Returns the square root of `a` modulo `p`, or `None` if `a` is a quadratic non-residue.
///
/// `a` must already be reduced modulo `p`.
pub fn sqrt_mod_p(a: &BigUint) -> Option<BigUint> {
    let p = &*FIELD_PRIME;
    let root = a.modpow(&SQRT_EXPONENT, p);
    if (&root * &root) % p == *a {
        Some(root)
    } else {
        None
    }
}

/// Decompresses a 33-byte compressed public key (`0x02`/`0x03` tag followed by x) into the
/// 65-byte uncompressed form `0x04 || x || y`.
///
/// Returns `None` if the tag is not a compressed-key tag, if x is not a field element, or if
/// `x³ + 7` has no square root, i.e. the x-coordinate is not on the curve.
pub fn decompress_pubkey(compressed: &[u8; 33]) -> Option<[u8; 65]> {
    let want_odd = match compressed[0] {
        0x02 => false,
        0x03 => true,
        _ => return None,
    };

    let p = &*FIELD_PRIME;
    let x = BigUint::from_bytes_be(&compressed[1..]);
    if x >= *p {
        return None;
    }

    let rhs = (x.modpow(&BigUint::from(3u32), p) + CURVE_B) % p;
    let mut y = sqrt_mod_p(&rhs)?;

    if y.bit(0) != want_odd {
        if y.is_zero() {
            return None;
        }
        y = p - y;
    }

    let mut uncompressed = [0u8; 65];
    uncompressed[0] = UNCOMPRESSED_TAG;
    write_be_padded(&x, &mut uncompressed[1..33]);
    write_be_padded(&y, &mut uncompressed[33..65]);
    Some(uncompressed)
}

fn write_be_padded(value: &BigUint, out: &mut [u8]) {
    let bytes = value.to_bytes_be();
    let offset = out.len() - bytes.len();
    out[..offset].fill(0);
    out[offset..].copy_from_slice(&bytes);
}
