//! File type detection by header inspection.

use std::io::Cursor;

use crate::bundle::{peek_signature, web::WEB_SIGNATURES};
use crate::endian::{Endian, EndianReader};
use crate::serialized::is_serialized_file;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const BROTLI_MARKER: &[u8] = b"brotli";
const BROTLI_MARKER_OFFSET: usize = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Container,
    Bundle,
    Web,
    /// Gzip envelope; decompress and sniff again.
    Gzip,
    /// Brotli envelope; decompress and sniff again.
    Brotli,
    /// Anything else, kept as a named raw payload.
    Raw,
}

impl FileType {
    pub fn detect(data: &[u8]) -> FileType {
        let signature = EndianReader::new(Cursor::new(data), Endian::Big)
            .and_then(|mut r| peek_signature(&mut r))
            .unwrap_or_default();

        match signature.as_str() {
            "UnityFS" | "UnityWeb" | "UnityRaw" | "UnityArchive" => return FileType::Bundle,
            s if WEB_SIGNATURES.contains(&s) => return FileType::Web,
            _ => {}
        }
        if data.starts_with(&GZIP_MAGIC) {
            return FileType::Gzip;
        }
        if data.get(BROTLI_MARKER_OFFSET..BROTLI_MARKER_OFFSET + BROTLI_MARKER.len()) == Some(BROTLI_MARKER) {
            return FileType::Brotli;
        }
        if is_serialized_file(data) {
            return FileType::Container;
        }
        FileType::Raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_signatures_and_envelopes() {
        assert_eq!(FileType::detect(b"UnityFS\0\0\0\0\x07"), FileType::Bundle);
        assert_eq!(FileType::detect(b"UnityWebData1.0\0"), FileType::Web);
        assert_eq!(FileType::detect(&[0x1F, 0x8B, 0x08, 0x00]), FileType::Gzip);

        let mut brotli = vec![0u8; 0x30];
        brotli[0x20..0x26].copy_from_slice(b"brotli");
        assert_eq!(FileType::detect(&brotli), FileType::Brotli);

        assert_eq!(FileType::detect(b"plain texture bytes"), FileType::Raw);
        assert_eq!(FileType::detect(&[]), FileType::Raw);
    }
}
