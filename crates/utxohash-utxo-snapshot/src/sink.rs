use crate::coin::{Coin, Utxo, MAX_HEIGHT};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Number of records buffered by [`CsvSink`] between two flushes.
pub const CSV_FLUSH_INTERVAL: usize = 1 << 20;

/// Human readable form of a decoded coin.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UtxoRecord {
    /// Txid in display order.
    pub txid: String,
    pub vout: u32,
    pub amount: u64,
    pub is_coinbase: bool,
    pub height: u32,
    /// Lowercase hex.
    pub script_pubkey: String,
}

impl From<&Utxo> for UtxoRecord {
    fn from(utxo: &Utxo) -> Self {
        let Utxo { txid, vout, coin } = utxo;
        Self {
            txid: txid.to_string(),
            vout: *vout,
            amount: coin.amount,
            is_coinbase: coin.is_coinbase,
            height: coin.height,
            script_pubkey: hex::encode(&coin.script_pubkey),
        }
    }
}

impl TryFrom<UtxoRecord> for Utxo {
    type Error = Error;

    fn try_from(record: UtxoRecord) -> Result<Self> {
        let UtxoRecord {
            txid,
            vout,
            amount,
            is_coinbase,
            height,
            script_pubkey,
        } = record;

        if height > MAX_HEIGHT {
            return Err(Error::InvalidRecord(format!(
                "height {height} exceeds {MAX_HEIGHT}"
            )));
        }

        let txid = txid
            .parse()
            .map_err(|err| Error::InvalidRecord(format!("txid {txid}: {err}")))?;
        let script_pubkey = hex::decode(&script_pubkey)
            .map_err(|err| Error::InvalidRecord(format!("script_pubkey {script_pubkey}: {err}")))?;

        Ok(Self {
            txid,
            vout,
            coin: Coin {
                is_coinbase,
                amount,
                height,
                script_pubkey,
            },
        })
    }
}

/// Destination of the decoded coins.
///
/// Skipped coins are never pushed.
pub trait UtxoSink {
    fn push(&mut self, utxo: &Utxo) -> Result<()>;

    /// Called once after the last coin.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drops every coin, for runs that only need the digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl UtxoSink for DiscardSink {
    fn push(&mut self, _utxo: &Utxo) -> Result<()> {
        Ok(())
    }
}

impl UtxoSink for Vec<UtxoRecord> {
    fn push(&mut self, utxo: &Utxo) -> Result<()> {
        Vec::push(self, UtxoRecord::from(utxo));
        Ok(())
    }
}

/// Writes one headerless CSV line per coin.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    pending: usize,
    written: u64,
}

impl CsvSink<File> {
    /// Creates (or truncates) the CSV file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
            pending: 0,
            written: 0,
        }
    }

    /// Number of records handed to the underlying writer so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes outstanding records and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| Error::Io(err.into_error()))
    }
}

impl<W: Write> UtxoSink for CsvSink<W> {
    fn push(&mut self, utxo: &Utxo) -> Result<()> {
        self.writer.serialize(UtxoRecord::from(utxo))?;
        self.written += 1;
        self.pending += 1;

        if self.pending >= CSV_FLUSH_INTERVAL {
            self.writer.flush()?;
            self.pending = 0;
            tracing::debug!("Flushed {} coins to CSV", self.written);
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.pending = 0;
        Ok(())
    }
}

/// Reads back the coins persisted by [`CsvSink`].
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
}

impl CsvSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: csv::ReaderBuilder::new()
                .has_headers(false)
                .from_reader(reader),
        }
    }

    /// Consumes the source, yielding one coin per record in file order.
    pub fn into_utxos(self) -> impl Iterator<Item = Result<Utxo>> {
        self.reader
            .into_deserialize::<UtxoRecord>()
            .map(|record| Utxo::try_from(record?))
    }
}
