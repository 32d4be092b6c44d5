use crate::compressor::{compress_amount, decompress_amount, MAX_MONEY};
use crate::script::{decompress_script, write_compressed_script, ScriptDecompression};
use crate::serialize::{read_array, VarInt};
use crate::{DecodeConfig, Error, Result, SkipReason};
use bitcoin::consensus::encode::Encodable;
use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, Txid};
use std::io::{self, Read, Write};

/// Highest height whose `height * 2 + is_coinbase` still fits in 32 bits.
pub const MAX_HEIGHT: u32 = u32::MAX >> 1;

/// Unspent transaction output without its outpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    /// Whether the coin is from a coinbase transaction.
    pub is_coinbase: bool,
    /// Transfer value in satoshis.
    pub amount: u64,
    // Block height at which this containing transaction was included.
    pub height: u32,
    /// Spending condition of the output.
    pub script_pubkey: Vec<u8>,
}

impl Coin {
    /// `height * 2 + is_coinbase`, the packed form shared by the snapshot and the hash input.
    ///
    /// https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/coins.h#L62
    pub fn code(&self) -> u32 {
        (self.height << 1) | u32::from(self.is_coinbase)
    }
}

/// Represents a single UTXO (Unspent Transaction Output) in Bitcoin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// The transaction ID that contains this UTXO.
    pub txid: Txid,
    /// The output index within the transaction.
    pub vout: u32,
    /// The coin data associated with this UTXO.
    pub coin: Coin,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

impl From<(Txid, u32, Coin)> for Utxo {
    fn from((txid, vout, coin): (Txid, u32, Coin)) -> Self {
        Self { txid, vout, coin }
    }
}

/// Result of decoding one snapshot record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded(Utxo),
    /// The record was fully consumed but is excluded from the commitment.
    Skipped {
        outpoint: OutPoint,
        reason: SkipReason,
    },
}

/// Reads one coin record in the compact snapshot layout.
pub fn decode_coin<R: Read + ?Sized>(reader: &mut R, config: &DecodeConfig) -> Result<DecodeOutcome> {
    // Outpoint
    let txid = Txid::from_byte_array(read_array(reader, "outpoint hash")?);
    let vout = u32::from_le_bytes(read_array(reader, "outpoint index")?);

    // Coin
    let VarInt(code) = VarInt::consensus_decode(reader)?;
    let code = u32::try_from(code).map_err(|_| Error::HeightOverflow(code))?;
    let VarInt(compressed_amount) = VarInt::consensus_decode(reader)?;
    let amount = decompress_amount(compressed_amount);

    match decompress_script(reader, config.max_script_size)? {
        ScriptDecompression::Script(script_pubkey) => Ok(DecodeOutcome::Decoded(Utxo {
            txid,
            vout,
            coin: Coin {
                is_coinbase: code & 1 == 1,
                amount,
                height: code >> 1,
                script_pubkey,
            },
        })),
        ScriptDecompression::Skipped(reason) => Ok(DecodeOutcome::Skipped {
            outpoint: OutPoint { txid, vout },
            reason,
        }),
    }
}

/// Writes one coin record in the compact snapshot layout, the inverse of [`decode_coin`].
///
/// Fails with [`io::ErrorKind::InvalidInput`] if the height exceeds [`MAX_HEIGHT`] or the
/// amount exceeds [`MAX_MONEY`], neither of which the compact layout can represent.
pub fn encode_coin<W: Write + ?Sized>(writer: &mut W, utxo: &Utxo) -> io::Result<()> {
    let Utxo { txid, vout, coin } = utxo;

    if coin.height > MAX_HEIGHT {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}: height {} exceeds {MAX_HEIGHT}", utxo.outpoint(), coin.height),
        ));
    }
    if coin.amount > MAX_MONEY {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}: amount {} exceeds {MAX_MONEY}", utxo.outpoint(), coin.amount),
        ));
    }

    writer.write_all(&txid.to_byte_array())?;
    writer.write_all(&vout.to_le_bytes())?;

    VarInt(u64::from(coin.code())).consensus_encode(writer)?;
    VarInt(compress_amount(coin.amount)).consensus_encode(writer)?;
    write_compressed_script(writer, &coin.script_pubkey)?;

    Ok(())
}

/// Serializes an outpoint and its coin into the byte string hashed into the MuHash.
///
/// Layout: `txid || vout (u32 LE) || height * 2 + coinbase (u32 LE) || amount (u64 LE) ||
/// CompactSize(script length) || script`.
///
/// https://github.com/bitcoin/bitcoin/blob/6f9db1ebcab4064065ccd787161bf2b87e03cc1f/src/kernel/coinstats.cpp#L51
pub fn tx_out_ser(outpoint: OutPoint, coin: &Coin, max_script_size: usize) -> Result<Vec<u8>> {
    if coin.script_pubkey.len() > max_script_size {
        return Err(Error::ScriptTooLong {
            size: coin.script_pubkey.len() as u64,
            max: max_script_size,
        });
    }
    if coin.height > MAX_HEIGHT {
        return Err(Error::HeightOverflow(
            u64::from(coin.height) * 2 + u64::from(coin.is_coinbase),
        ));
    }

    let mut data = Vec::with_capacity(36 + 4 + 8 + 3 + coin.script_pubkey.len());

    // Serialize the OutPoint (txid and vout)
    outpoint.consensus_encode(&mut data)?;

    // Serialize the coin's height and coinbase flag
    coin.code().consensus_encode(&mut data)?;

    let txout = bitcoin::TxOut {
        value: bitcoin::Amount::from_sat(coin.amount),
        script_pubkey: bitcoin::ScriptBuf::from_bytes(coin.script_pubkey.clone()),
    };

    // Serialize the actual UTXO (value and script)
    txout.consensus_encode(&mut data)?;

    Ok(data)
}
