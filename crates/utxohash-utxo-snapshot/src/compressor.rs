use bitcoin::opcodes::all::{OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160};
use utxohash_crypto::secp256k1::decompress_pubkey;

pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

// https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/compressor.cpp#L140
//
// NOTE: This function is defined only for 0 <= n <= MAX_MONEY.
pub fn compress_amount(n: u64) -> u64 {
    debug_assert!(n <= MAX_MONEY);

    if n == 0 {
        return 0;
    }
    let mut e = 0;
    let mut n = n;
    while n % 10 == 0 && e < 9 {
        n /= 10;
        e += 1;
    }
    if e < 9 {
        let d = n % 10;
        n /= 10;
        1 + (n * 9 + d - 1) * 10 + e
    } else {
        1 + (n - 1) * 10 + 9
    }
}

/// Inverse of [`compress_amount`].
///
/// Total over `u64`: codes that no valid amount compresses to wrap around instead of panicking.
pub fn decompress_amount(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }
    let mut x = x - 1;
    let e = x % 10;
    x /= 10;
    let mut n = if e < 9 {
        let d = (x % 9) + 1;
        x /= 9;
        x.wrapping_mul(10).wrapping_add(d)
    } else {
        x + 1
    };
    for _ in 0..e {
        n = n.wrapping_mul(10);
    }
    n
}

fn to_key_id(script: &[u8]) -> Option<&[u8]> {
    (script.len() == 25
        && script[0] == OP_DUP.to_u8()
        && script[1] == OP_HASH160.to_u8()
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY.to_u8()
        && script[24] == OP_CHECKSIG.to_u8())
    .then(|| &script[3..23])
}

fn to_script_id(script: &[u8]) -> Option<&[u8]> {
    (script.len() == 23
        && script[0] == OP_HASH160.to_u8()
        && script[1] == 20
        && script[22] == OP_EQUAL.to_u8())
    .then(|| &script[2..22])
}

/// Returns the `(tag, x)` pair a P2PK script compresses to.
fn to_pub_key(script: &[u8]) -> Option<(u8, &[u8])> {
    if script.len() == 35
        && script[0] == 33
        && script[34] == OP_CHECKSIG.to_u8()
        && (script[1] == 0x02 || script[1] == 0x03)
    {
        Some((script[1], &script[2..34]))
    } else if script.len() == 67
        && script[0] == 65
        && script[66] == OP_CHECKSIG.to_u8()
        && script[1] == 0x04
    {
        let mut compressed = [0u8; 33];
        compressed[0] = 0x02 | (script[65] & 0x01);
        compressed[1..].copy_from_slice(&script[2..34]);

        // If not a valid curve point, it would not survive decompression.
        let is_fully_valid = decompress_pubkey(&compressed)
            .is_some_and(|uncompressed| uncompressed[..] == script[1..66]);
        is_fully_valid.then(|| (0x04 | (script[65] & 0x01), &script[2..34]))
    } else {
        None
    }
}

/// Compresses one of the six special script templates into `code || payload`.
///
/// Returns `None` for any other script, which is then stored literally.
///
/// https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/compressor.cpp#L55
pub fn compress_script(script: &[u8]) -> Option<Vec<u8>> {
    if let Some(hash) = to_key_id(script) {
        let mut out = Vec::with_capacity(21);
        out.push(0x00);
        out.extend_from_slice(hash);
        Some(out)
    } else if let Some(hash) = to_script_id(script) {
        let mut out = Vec::with_capacity(21);
        out.push(0x01);
        out.extend_from_slice(hash);
        Some(out)
    } else if let Some((code, x)) = to_pub_key(script) {
        let mut out = Vec::with_capacity(33);
        out.push(code);
        out.extend_from_slice(x);
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_decompress_amount() {
        assert_eq!(decompress_amount(0), 0);
        assert_eq!(decompress_amount(1), 1);
        assert_eq!(decompress_amount(2), 10);
    }

    // https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/test/compress_tests.cpp#L40
    #[test]
    fn test_core_amount_vectors() {
        const CENT: u64 = 1_000_000;
        const COIN: u64 = 100_000_000;

        for (amount, compressed) in [
            (0, 0x0),
            (1, 0x1),
            (CENT, 0x7),
            (COIN, 0x9),
            (50 * COIN, 0x32),
            (21_000_000 * COIN, 0x1406f40),
        ] {
            assert_eq!(compress_amount(amount), compressed);
            assert_eq!(decompress_amount(compressed), amount);
        }
    }

    #[test]
    fn test_compress_amount() {
        for _ in 0..1000 {
            let n = fastrand::u64(..=MAX_MONEY);
            assert_eq!(n, decompress_amount(compress_amount(n)));
        }
    }

    #[test]
    fn test_decompress_amount_is_total() {
        for x in [u64::MAX, u64::MAX - 1, u64::MAX - 9, u64::MAX / 2] {
            let _ = decompress_amount(x);
        }
    }

    #[test]
    fn test_compress_special_scripts() {
        let p2pkh = hex!("76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac");
        assert_eq!(
            compress_script(&p2pkh).unwrap(),
            hex!("0062e907b15cbf27d5425399ebf6f0fb50ebb88f18")
        );

        let p2sh = hex!("a914748284390f9e263a4b766a75d0633c50426eb87587");
        assert_eq!(
            compress_script(&p2sh).unwrap(),
            hex!("01748284390f9e263a4b766a75d0633c50426eb875")
        );

        let p2pk = hex!(
            "410496b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52\
            da7589379515d4e0a604f8141781e62294721166bf621e73a82cbf2342c858eeac"
        );
        assert_eq!(
            compress_script(&p2pk).unwrap(),
            hex!("0496b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52")
        );
    }

    #[test]
    fn test_off_curve_uncompressed_key_is_not_compressed() {
        let mut p2pk = [0u8; 67];
        p2pk[0] = 65;
        p2pk[1] = 0x04;
        p2pk[66] = OP_CHECKSIG.to_u8();
        assert!(compress_script(&p2pk).is_none());
    }

    #[test]
    fn test_other_scripts_are_not_compressed() {
        // P2WPKH
        let p2wpkh = hex!("0014751e76e8199196d454941c45d1b3a323f1433bd6");
        assert!(compress_script(&p2wpkh).is_none());
        assert!(compress_script(&[]).is_none());
        assert!(compress_script(&[0x6a]).is_none());
    }
}
