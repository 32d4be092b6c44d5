use crate::compressor::compress_script;
use crate::serialize::{read_array, read_exact, VarInt};
use crate::{Error, Result, SkipReason};
use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_PUSHBYTES_33, OP_PUSHBYTES_65};
use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash};
use std::io::{self, Read, Write};
use utxohash_crypto::secp256k1::decompress_pubkey;

/// Number of size codes reserved for the special script templates.
pub const NUM_SPECIAL_SCRIPTS: u64 = 6;

/// Result of expanding a compressed script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptDecompression {
    /// The canonical `scriptPubKey` bytes.
    Script(Vec<u8>),
    /// The payload was consumed but no script could be rebuilt from it.
    Skipped(SkipReason),
}

/// Reads a compressed script: a [`VarInt`] size code followed by its payload.
///
/// | code | payload | script |
/// |---|---|---|
/// | 0 | 20-byte key hash | P2PKH |
/// | 1 | 20-byte script hash | P2SH |
/// | 2, 3 | 32-byte x | P2PK, compressed key with tag `code` |
/// | 4, 5 | 32-byte x | P2PK, uncompressed key with y parity `code - 4` |
/// | n ≥ 6 | `n - 6` bytes | the bytes verbatim |
///
/// https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/compressor.cpp#L95
pub fn decompress_script<R: Read + ?Sized>(
    reader: &mut R,
    max_script_size: usize,
) -> Result<ScriptDecompression> {
    let VarInt(size) = VarInt::consensus_decode(reader)?;

    let script = match size {
        0x00 => {
            // P2PKH
            let hash = read_array(reader, "P2PKH key hash")?;
            ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash)).into_bytes()
        }
        0x01 => {
            // P2SH
            let hash = read_array(reader, "P2SH script hash")?;
            ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(hash)).into_bytes()
        }
        0x02 | 0x03 => {
            // P2PK (compressed)
            let x: [u8; 32] = read_array(reader, "P2PK x-coordinate")?;

            let mut script_bytes = Vec::with_capacity(35);
            script_bytes.push(OP_PUSHBYTES_33.to_u8());
            script_bytes.push(size as u8);
            script_bytes.extend_from_slice(&x);
            script_bytes.push(OP_CHECKSIG.to_u8());
            script_bytes
        }
        0x04 | 0x05 => {
            // P2PK (uncompressed)
            let x: [u8; 32] = read_array(reader, "P2PK x-coordinate")?;

            let mut compressed_pubkey = [0u8; 33];
            compressed_pubkey[0] = (size - 2) as u8;
            compressed_pubkey[1..].copy_from_slice(&x);

            let Some(uncompressed_pubkey) = decompress_pubkey(&compressed_pubkey) else {
                return Ok(ScriptDecompression::Skipped(SkipReason::UndecodablePoint));
            };

            let mut script_bytes = Vec::with_capacity(67);
            script_bytes.push(OP_PUSHBYTES_65.to_u8());
            script_bytes.extend_from_slice(&uncompressed_pubkey);
            script_bytes.push(OP_CHECKSIG.to_u8());
            script_bytes
        }
        _ => {
            let len = size - NUM_SPECIAL_SCRIPTS;
            if len > max_script_size as u64 {
                return Err(Error::ScriptTooLong {
                    size: len,
                    max: max_script_size,
                });
            }
            let mut script_bytes = vec![0u8; len as usize];
            read_exact(reader, &mut script_bytes, "script")?;
            script_bytes
        }
    };

    Ok(ScriptDecompression::Script(script))
}

/// Writes `script` in compressed form, the inverse of [`decompress_script`].
pub fn write_compressed_script<W: Write + ?Sized>(
    writer: &mut W,
    script: &[u8],
) -> io::Result<usize> {
    if let Some(compressed_script) = compress_script(script) {
        writer.write_all(&compressed_script)?;
        return Ok(compressed_script.len());
    }

    let size = script.len() as u64 + NUM_SPECIAL_SCRIPTS;
    let len = VarInt(size).consensus_encode(writer)?;
    writer.write_all(script)?;
    Ok(len + script.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_SCRIPT_SIZE;
    use hex_literal::hex;

    const HASH160: [u8; 20] = hex!("62e907b15cbf27d5425399ebf6f0fb50ebb88f18");
    const X: [u8; 32] = hex!("96b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52");

    fn decode(bytes: &[u8]) -> Result<ScriptDecompression> {
        let mut reader = bytes;
        let decoded = decompress_script(&mut reader, MAX_SCRIPT_SIZE)?;
        assert!(reader.is_empty(), "payload not fully consumed");
        Ok(decoded)
    }

    fn decode_script(bytes: &[u8]) -> Vec<u8> {
        match decode(bytes).unwrap() {
            ScriptDecompression::Script(script) => script,
            ScriptDecompression::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    fn with_code(code: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![code];
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_p2pkh() {
        let mut expected = vec![0x76, 0xa9, 0x14];
        expected.extend_from_slice(&HASH160);
        expected.extend_from_slice(&[0x88, 0xac]);
        assert_eq!(decode_script(&with_code(0, &HASH160)), expected);
    }

    #[test]
    fn test_p2sh() {
        let mut expected = vec![0xa9, 0x14];
        expected.extend_from_slice(&HASH160);
        expected.push(0x87);
        assert_eq!(decode_script(&with_code(1, &HASH160)), expected);
    }

    #[test]
    fn test_p2pk_compressed() {
        for code in [2u8, 3] {
            let mut expected = vec![0x21, code];
            expected.extend_from_slice(&X);
            expected.push(0xac);
            assert_eq!(decode_script(&with_code(code, &X)), expected);
        }
    }

    #[test]
    fn test_p2pk_uncompressed() {
        let even = decode_script(&with_code(4, &X));
        assert_eq!(
            even,
            hex!(
                "410496b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52\
                da7589379515d4e0a604f8141781e62294721166bf621e73a82cbf2342c858eeac"
            )
        );

        let odd = decode_script(&with_code(5, &X));
        assert_eq!(odd.len(), 67);
        assert_eq!(odd[..34], even[..34]);
        assert_eq!(odd[65] & 1, 1);
        assert_eq!(odd[66], 0xac);
    }

    #[test]
    fn test_p2pk_uncompressed_off_curve() {
        assert_eq!(
            decode(&with_code(4, &[0u8; 32])).unwrap(),
            ScriptDecompression::Skipped(SkipReason::UndecodablePoint)
        );
        assert_eq!(
            decode(&with_code(5, &[0u8; 32])).unwrap(),
            ScriptDecompression::Skipped(SkipReason::UndecodablePoint)
        );
    }

    #[test]
    fn test_literal() {
        let p2wpkh = hex!("0014751e76e8199196d454941c45d1b3a323f1433bd6");
        let mut bytes = vec![6 + p2wpkh.len() as u8];
        bytes.extend_from_slice(&p2wpkh);
        assert_eq!(decode_script(&bytes), p2wpkh);

        // Empty script.
        assert_eq!(decode_script(&[6]), Vec::<u8>::new());
    }

    #[test]
    fn test_literal_too_long() {
        let mut bytes = Vec::new();
        VarInt(MAX_SCRIPT_SIZE as u64 + 1 + NUM_SPECIAL_SCRIPTS)
            .consensus_encode(&mut bytes)
            .unwrap();
        assert!(matches!(
            decompress_script(&mut bytes.as_slice(), MAX_SCRIPT_SIZE),
            Err(Error::ScriptTooLong { size, max }) if size == MAX_SCRIPT_SIZE as u64 + 1 && max == MAX_SCRIPT_SIZE
        ));

        // Exactly at the cap is fine.
        let mut bytes = Vec::new();
        VarInt(MAX_SCRIPT_SIZE as u64 + NUM_SPECIAL_SCRIPTS)
            .consensus_encode(&mut bytes)
            .unwrap();
        bytes.resize(bytes.len() + MAX_SCRIPT_SIZE, 0x51);
        assert_eq!(decode_script(&bytes).len(), MAX_SCRIPT_SIZE);
    }

    #[test]
    fn test_truncated_payload() {
        for code in 0u8..6 {
            assert!(matches!(
                decode(&with_code(code, &[0u8; 19])),
                Err(Error::TruncatedInput(_))
            ));
        }
        assert!(matches!(
            decode(&[6 + 3, 0x51, 0x51]),
            Err(Error::TruncatedInput(_))
        ));
    }

    #[test]
    fn test_agrees_with_libsecp256k1() {
        use bitcoin::secp256k1::PublicKey;

        for _ in 0..64 {
            let mut x = [0u8; 32];
            fastrand::fill(&mut x);
            let code = fastrand::u8(4..6);

            let mut compressed = [code - 2; 33];
            compressed[1..].copy_from_slice(&x);

            match (
                decode(&with_code(code, &x)).unwrap(),
                PublicKey::from_slice(&compressed),
            ) {
                (ScriptDecompression::Script(script), Ok(pubkey)) => {
                    assert_eq!(script[1..66], pubkey.serialize_uncompressed());
                }
                (ScriptDecompression::Skipped(_), Err(_)) => {}
                (ours, theirs) => panic!("mismatch for {x:02x?}: {ours:?} vs {theirs:?}"),
            }
        }
    }

    #[test]
    fn test_compression_roundtrip() {
        let scripts: Vec<Vec<u8>> = vec![
            hex!("76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac").to_vec(),
            hex!("a914748284390f9e263a4b766a75d0633c50426eb87587").to_vec(),
            hex!("0014751e76e8199196d454941c45d1b3a323f1433bd6").to_vec(),
            hex!(
                "5121030b3810fd20fd3771517b2b8847d225791035ea06768e17c733a5756b6005bf55210222b6e887bb4d4bca08f97348e6b8561e6d11e0ed96dec0584b34d709078cd4a54104289699814d1c9ef35ae45cfb41116501c15b0141430a481226aa19bcb8806c7223802d24f2638d8ce14378137dd52114d1d965e2969b5b3ac011c25e2803eb5753ae"
            )
            .to_vec(),
            vec![0x6a; 300],
        ];

        for script in scripts {
            let mut encoded = Vec::new();
            let len = write_compressed_script(&mut encoded, &script).unwrap();
            assert_eq!(len, encoded.len());
            assert_eq!(decode_script(&encoded), script);
        }
    }
}
