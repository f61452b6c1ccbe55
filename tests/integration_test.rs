mod support;

use std::io::Write;
use std::sync::Arc;

use assetgraph::bundle::{web::WebFile, BundleFile};
use assetgraph::codec::{decompress_brotli, decompress_gzip, decompress_lzma_stream, get_codec, CodecError, CompressionType};
use assetgraph::{Endian, Error, FileType, SerializedFile, Session};
use tempfile::NamedTempFile;

use support::{build_bundle, build_bundle_with, build_web, node, string_nodes, ContainerBuilder};

fn sample_container() -> Vec<u8> {
    let mut nodes = vec![node(0, "Holder", "Base")];
    nodes.extend(string_nodes(1, "m_Name"));
    nodes.push(node(1, "int", "m_Count"));

    let mut c = ContainerBuilder::new(22).endian(Endian::Big);
    let t = c.add_type(1001, nodes);
    let mut b = c.payload();
    b.string("first").i32(3);
    c.object(10, t, b.finish());
    let mut b = c.payload();
    b.string("second").i32(4);
    c.object(-5, t, b.finish());
    c.external("archive:/CAB-shared/CAB-shared");
    c.build()
}

#[test]
fn test_container_metadata() {
    let data: Arc<[u8]> = Arc::from(sample_container());
    let file = SerializedFile::parse("Data/sample.assets", Arc::clone(&data)).unwrap();

    assert_eq!(file.file_name, "sample.assets");
    assert_eq!(file.format_version(), 22);
    assert_eq!(file.endian(), Endian::Big);
    assert_eq!(file.unity_version.as_str(), "2019.4.0f1");
    assert_eq!(file.objects.len(), 2);
    assert!(file.contains(-5));
    assert!(!file.contains(11));

    assert_eq!(file.externals.len(), 1);
    assert_eq!(file.externals[0].path_name, "archive:/CAB-shared/CAB-shared");
    assert_eq!(file.externals[0].file_name, "CAB-shared");

    let info = file.object_info(10).unwrap();
    assert!(info.byte_start >= file.header.data_offset);
    assert_eq!(info.byte_size, 4 + 8 + 4);
    let tree = file.serialized_type(info).and_then(|t| t.type_tree.clone()).unwrap();
    assert!(tree.has_member("m_Count"));
}

#[test]
fn test_unsupported_version() {
    let mut data = sample_container();
    data[8..12].copy_from_slice(&99u32.to_be_bytes());
    let err = SerializedFile::parse("bad.assets", Arc::from(data)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion(99)));
}

#[test]
fn test_bundle_unpack() {
    let container = sample_container();
    for (lz4, at_end) in [(false, false), (true, false), (false, true), (true, true)] {
        let bytes = build_bundle_with(&[("CAB-one", &container[..]), ("CAB-one.resS", &b"stream"[..])], lz4, at_end);
        assert_eq!(FileType::detect(&bytes), FileType::Bundle);

        let bundle = BundleFile::parse(&bytes).unwrap();
        assert_eq!(bundle.header.signature, "UnityFS");
        assert_eq!(bundle.version_hint(), "2019.4.0f1");
        assert_eq!(bundle.files.len(), 2);
        assert_eq!(bundle.files[0].file_name, "CAB-one");
        assert_eq!(&bundle.files[0].data[..], &container[..]);
        assert_eq!(&bundle.files[1].data[..], b"stream");
    }
}

#[test]
fn test_bundle_invalid_signature() {
    let mut bytes = build_bundle(&[("a", &b"x"[..])], false);
    bytes[..7].copy_from_slice(b"UnityXX");
    assert!(matches!(BundleFile::parse(&bytes), Err(Error::InvalidSignature(s)) if s == "UnityXX"));
}

#[test]
fn test_web_archive() {
    let bytes = build_web(&[("Build/data.unity3d", &b"abc"[..]), ("globalgamemanagers", &b"defg"[..])]);
    assert_eq!(FileType::detect(&bytes), FileType::Web);

    let web = WebFile::parse(&bytes).unwrap();
    assert_eq!(web.files.len(), 2);
    assert_eq!(web.files[0].path, "Build/data.unity3d");
    assert_eq!(web.files[0].file_name, "data.unity3d");
    assert_eq!(&web.files[1].data[..], b"defg");
}

#[test]
fn test_envelopes() {
    let payload = b"envelope payload ".repeat(64);

    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
    gz.write_all(&payload).unwrap();
    let gz = gz.finish().unwrap();
    assert_eq!(FileType::detect(&gz), FileType::Gzip);
    assert_eq!(decompress_gzip(&gz).unwrap(), payload);

    let mut br = Vec::new();
    {
        let mut w = brotli::CompressorWriter::new(&mut br, 4096, 5, 22);
        w.write_all(&payload).unwrap();
    }
    assert_eq!(decompress_brotli(&br).unwrap(), payload);

    let mut lzma = Vec::new();
    lzma_rs::lzma_compress(&mut &payload[..], &mut lzma).unwrap();
    assert_eq!(decompress_lzma_stream(&lzma).unwrap(), payload);
}

#[test]
fn test_codec_table() {
    assert_eq!(CompressionType::from_flags(0x43).unwrap(), CompressionType::Lz4HC);
    assert!(matches!(CompressionType::from_flags(0x3F), Err(CodecError::UnknownCompression(63))));
    assert!(matches!(get_codec(CompressionType::Lzham), Err(CodecError::Unsupported("lzham"))));

    let data = b"lz4 block payload lz4 block payload".to_vec();
    let packed = lz4_flex::block::compress(&data);
    let codec = get_codec(CompressionType::from_flags(0x02).unwrap()).unwrap();
    assert_eq!(codec.compression(), CompressionType::Lz4);
    assert_eq!(get_codec(CompressionType::Lz4HC).unwrap().compression(), CompressionType::Lz4);
    assert_eq!(get_codec(CompressionType::None).unwrap().compression(), CompressionType::None);
    assert_eq!(codec.decompress(&packed, data.len()).unwrap(), data);
    assert!(matches!(
        codec.decompress(&packed, data.len() + 1),
        Err(CodecError::SizeMismatch { .. }) | Err(CodecError::Decompression(_))
    ));
}

#[test]
fn test_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut temp = NamedTempFile::new_in(dir.path()).unwrap();
    temp.write_all(&sample_container()).unwrap();
    temp.flush().unwrap();

    let mut session = Session::default();
    let report = session.load_files(&[temp.path()]).unwrap();
    assert_eq!(report.containers, 1);
    assert_eq!(report.objects, 2);

    let (r, _) = session.objects().find(|(r, _)| r.path_id == -5).unwrap();
    let value = session.value_tree(r).unwrap().unwrap();
    assert_eq!(value.get("m_Name").and_then(|v| v.as_str()), Some("second"));
    assert_eq!(value.get("m_Count").and_then(|v| v.as_i64()), Some(4));
    assert!(value.to_json().unwrap().contains("\"m_Count\":4"));
}
