use std::io::{Read, Seek};

use byteorder::{BigEndian, ByteOrder};

use crate::endian::{Endian, EndianReader};
use crate::error::{Error, Result};

/// Highest container format version this crate reads.
pub const MAX_FORMAT_VERSION: u32 = 50;

/// Fixed header at the start of every container.  Always big-endian; the
/// `endian` field selects the byte order of everything after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedFileHeader {
    pub metadata_size: u32,
    pub file_size:     u64,
    pub version:       u32,
    pub data_offset:   u64,
    pub endian:        Endian,
}

impl SerializedFileHeader {
    pub fn read<R: Read + Seek>(reader: &mut EndianReader<R>) -> Result<Self> {
        reader.set_endian(Endian::Big);
        let mut metadata_size = reader.read_u32()?;
        let mut file_size = reader.read_u32()? as u64;
        let version = reader.read_u32()?;
        let mut data_offset = reader.read_u32()? as u64;

        if version == 0 || version > MAX_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let endian = if version >= 9 {
            let flag = reader.read_u8()?;
            reader.read_bytes(3)?;
            Endian::from_flag(flag)
        } else {
            let at = file_size
                .checked_sub(metadata_size as u64)
                .ok_or_else(|| Error::malformed("metadata larger than file"))?;
            let back = reader.position()?;
            reader.set_position(at)?;
            let flag = reader.read_u8()?;
            reader.set_position(back)?;
            Endian::from_flag(flag)
        };

        if version >= 22 {
            metadata_size = reader.read_u32()?;
            file_size = to_u64(reader.read_i64()?)?;
            data_offset = to_u64(reader.read_i64()?)?;
            reader.read_i64()?;
        }

        Ok(Self { metadata_size, file_size, version, data_offset, endian })
    }
}

fn to_u64(v: i64) -> Result<u64> {
    u64::try_from(v).map_err(|_| Error::malformed(format!("negative header field {v}")))
}

/// Cheap check used by the sniffer: the declared file size must equal the
/// actual length and the data offset must fall inside the file.
pub fn is_serialized_file(data: &[u8]) -> bool {
    if data.len() < 20 {
        return false;
    }
    let len = data.len() as u64;
    let mut file_size = BigEndian::read_u32(&data[4..8]) as u64;
    let version = BigEndian::read_u32(&data[8..12]);
    let mut data_offset = BigEndian::read_u32(&data[12..16]) as u64;

    if version >= 22 {
        if data.len() < 48 {
            return false;
        }
        file_size = BigEndian::read_i64(&data[24..32]) as u64;
        data_offset = BigEndian::read_i64(&data[32..40]) as u64;
    }
    file_size == len && data_offset <= len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_and_inconsistent_input() {
        assert!(!is_serialized_file(&[0u8; 8]));

        let mut data = vec![0u8; 32];
        BigEndian::write_u32(&mut data[4..8], 32);
        BigEndian::write_u32(&mut data[8..12], 17);
        BigEndian::write_u32(&mut data[12..16], 64);
        assert!(!is_serialized_file(&data));

        BigEndian::write_u32(&mut data[12..16], 32);
        assert!(is_serialized_file(&data));
    }
}
