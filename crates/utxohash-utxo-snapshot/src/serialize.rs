use crate::{Error, Result};
use std::io::{self, Read, Write};

/// Maximum number of bytes a `u64` occupies in [`VarInt`] encoding.
const MAX_VARINT_LEN: usize = 10;

/// Bitcoin Core's `VARINT`: MSB-first base-128 where every continuation byte adds one.
///
/// Not to be confused with the CompactSize prefix used by consensus serialization.
///
/// https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/serialize.h#L419
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl From<u64> for VarInt {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl VarInt {
    pub fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut n = 0u64;
        loop {
            let [byte] = read_array::<_, 1>(reader, "varint")?;
            if n > (u64::MAX >> 7) {
                return Err(Error::VarIntOverflow);
            }
            n = (n << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 != 0 {
                if n == u64::MAX {
                    return Err(Error::VarIntOverflow);
                }
                n += 1;
            } else {
                return Ok(Self(n));
            }
        }
    }

    pub fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<usize> {
        let mut tmp = [0u8; MAX_VARINT_LEN];
        let mut n = self.0;
        let mut len = 0;
        loop {
            tmp[len] = (n & 0x7f) as u8 | if len > 0 { 0x80 } else { 0x00 };
            if n <= 0x7f {
                break;
            }
            n = (n >> 7) - 1;
            len += 1;
        }
        let encoded = &mut tmp[..=len];
        encoded.reverse();
        writer.write_all(encoded)?;
        Ok(encoded.len())
    }
}

/// Reads exactly `buf.len()` bytes, reporting a short read as [`Error::TruncatedInput`].
pub(crate) fn read_exact<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    field: &'static str,
) -> Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::TruncatedInput(field),
        _ => Error::Io(err),
    })
}

pub(crate) fn read_array<R: Read + ?Sized, const N: usize>(
    reader: &mut R,
    field: &'static str,
) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    read_exact(reader, &mut buf, field)?;
    Ok(buf)
}
