//! Endian-aware binary cursor.
//!
//! [`EndianReader`] wraps any `Read + Seek` resource with a byte order chosen
//! at construction (big-endian by default, the on-disk convention of the
//! archive headers).  Every primitive read is atomic: it either yields the
//! full value or fails with [`Error::EndOfData`] and leaves the position
//! where it was.
//!
//! Containers own their bytes as an `Arc<[u8]>`; object handles read them
//! through `EndianReader<Cursor<Arc<[u8]>>>`, so each handle carries its own
//! position over a shared immutable arena.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    Little,
    #[default]
    Big,
}

impl Endian {
    /// Serialized-file convention: a zero endian byte means little-endian.
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 { Endian::Little } else { Endian::Big }
    }
}

macro_rules! read_primitive {
    ($name:ident, $ty:ty, $len:expr, $conv:ident) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let buf = self.fill::<$len>()?;
            Ok(match self.endian {
                Endian::Big    => BigEndian::$conv(&buf),
                Endian::Little => LittleEndian::$conv(&buf),
            })
        }
    };
}

#[derive(Debug, Clone)]
pub struct EndianReader<R> {
    inner:  R,
    endian: Endian,
    origin: u64,
}

impl<R: Read + Seek> EndianReader<R> {
    /// Wrap `inner`, remembering its current position as the origin offset.
    pub fn new(mut inner: R, endian: Endian) -> Result<Self> {
        let origin = inner.stream_position()?;
        Ok(Self { inner, endian, origin })
    }

    pub fn endian(&self) -> Endian { self.endian }

    pub fn set_endian(&mut self, endian: Endian) { self.endian = endian; }

    pub fn origin(&self) -> u64 { self.origin }

    pub fn into_inner(self) -> R { self.inner }

    // ── Positioning ──────────────────────────────────────────────────────────

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn set_position(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn len(&mut self) -> Result<u64> {
        let pos = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn remaining(&mut self) -> Result<u64> {
        let pos = self.position()?;
        Ok(self.len()?.saturating_sub(pos))
    }

    /// Advance to the next multiple of `alignment` (absolute position).
    pub fn align(&mut self, alignment: u64) -> Result<()> {
        let pos = self.position()?;
        let rem = pos % alignment;
        if rem != 0 {
            self.set_position(pos + alignment - rem)?;
        }
        Ok(())
    }

    /// Copy the whole resource from position 0 into memory and return an
    /// independent reader positioned at this reader's origin offset.
    pub fn materialize_owned(&mut self, endian: Option<Endian>) -> Result<EndianReader<Cursor<Vec<u8>>>> {
        let restore = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        self.inner.seek(SeekFrom::Start(restore))?;

        let mut cursor = Cursor::new(buf);
        cursor.set_position(self.origin);
        EndianReader::new(cursor, endian.unwrap_or(self.endian))
    }

    // ── Primitives ───────────────────────────────────────────────────────────

    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        let start = self.inner.stream_position()?;
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.inner.seek(SeekFrom::Start(start))?;
                Err(Error::EndOfData { offset: start, needed: N as u64 })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.fill::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.fill::<1>()?[0] as i8)
    }

    /// Single byte, nonzero is true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_primitive!(read_u16, u16, 2, read_u16);
    read_primitive!(read_i16, i16, 2, read_i16);
    read_primitive!(read_u32, u32, 4, read_u32);
    read_primitive!(read_i32, i32, 4, read_i32);
    read_primitive!(read_u64, u64, 8, read_u64);
    read_primitive!(read_i64, i64, 8, read_i64);
    read_primitive!(read_f32, f32, 4, read_f32);
    read_primitive!(read_f64, f64, 8, read_f64);

    // ── Composite reads ──────────────────────────────────────────────────────

    /// Read exactly `len` bytes.  The length is checked against the remaining
    /// input before anything is allocated.
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let offset = self.position()?;
        if len > self.remaining()? {
            return Err(Error::EndOfData { offset, needed: len });
        }
        let mut buf = vec![0u8; len as usize];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a signed 32-bit element count.  Negative counts are malformed.
    pub fn read_count(&mut self) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| Error::malformed(format!("negative element count {count}")))
    }

    /// Null-terminated UTF-8 string.  Stops at `max_len` bytes when given.
    pub fn read_cstring(&mut self, max_len: Option<usize>) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            if max_len.is_some_and(|max| bytes.len() >= max) {
                break;
            }
            match self.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Length-prefixed UTF-8 string followed by 4-byte alignment.
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let len = self.read_count()?;
        let bytes = self.read_bytes(len as u64)?;
        self.align(4)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn read_string_array(&mut self) -> Result<Vec<String>> {
        let count = self.read_count()?;
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            out.push(self.read_aligned_string()?);
        }
        Ok(out)
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0f32; N];
        for v in out.iter_mut() {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    /// 16 raw bytes as a GUID, in on-disk order.
    pub fn read_guid(&mut self) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.fill::<16>()?))
    }

    pub fn read_hash128(&mut self) -> Result<[u8; 16]> {
        self.fill::<16>()
    }
}
