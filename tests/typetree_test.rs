mod support;

use std::io::Cursor;

use assetgraph::typetree::{read_dump, read_value, write_value, SchemaMismatch};
use assetgraph::{Endian, EndianReader, Error, Session, TypeTree, TypeTreeNode, Value};
use proptest::prelude::*;

use support::{map_nodes, node, string_nodes, vector_nodes, Bytes, ContainerBuilder};

fn reader(data: Vec<u8>, endian: Endian) -> EndianReader<Cursor<Vec<u8>>> {
    EndianReader::new(Cursor::new(data), endian).unwrap()
}

fn decode(nodes: Vec<TypeTreeNode>, data: Vec<u8>, expected: Option<u64>) -> assetgraph::Result<assetgraph::typetree::Decoded<Value>> {
    let tree = TypeTree::from_nodes(nodes);
    read_value(&tree, &mut reader(data, Endian::Little), expected)
}

// ── Single values ────────────────────────────────────────────────────────────

#[test]
fn big_endian_single_int_object() {
    support::init_logging();
    let mut c = ContainerBuilder::new(17).endian(Endian::Big);
    let ty = c.add_type(1001, vec![node(0, "int", "size")]);
    c.object(1, ty, vec![0x00, 0x00, 0x00, 0x05]);

    let mut session = Session::default();
    let report = session.load_memory("single.assets", c.build());
    assert!(report.is_clean(), "{:?}", report.failures);

    let (r, _) = session.objects().next().expect("one object");
    let tree = session.value_tree(r).unwrap().expect("embedded schema");
    assert_eq!(tree.get("size").and_then(Value::as_i64), Some(5));
    assert_eq!(tree.as_record().map(|f| f.len()), Some(1));
}

#[test]
fn int_array_decodes_in_order() {
    let mut b = Bytes::new(Endian::Little);
    b.i32(2).i32(7).i32(9);
    let decoded = decode(vector_nodes(0, "list", "int"), b.finish(), Some(12)).unwrap();

    assert_eq!(decoded.value, Value::Array(vec![Value::I32(7), Value::I32(9)]));
    assert_eq!(decoded.consumed, 12);
    assert!(decoded.mismatch.is_none());
}

#[test]
fn size_mismatch_is_reported_but_value_returned() {
    let mut b = Bytes::new(Endian::Little);
    b.i32(2).i32(7).i32(9).i32(0);
    let decoded = decode(vector_nodes(0, "list", "int"), b.finish(), Some(16)).unwrap();

    assert_eq!(decoded.value, Value::Array(vec![Value::I32(7), Value::I32(9)]));
    assert_eq!(decoded.mismatch, Some(SchemaMismatch { expected: 16, consumed: 12 }));
}

#[test]
fn several_roots_form_a_record() {
    let mut b = Bytes::new(Endian::Little);
    b.i32(3).f32(1.5);
    let decoded = decode(vec![node(0, "int", "a"), node(0, "float", "b")], b.finish(), None).unwrap();

    assert_eq!(decoded.value.get("a"), Some(&Value::I32(3)));
    assert_eq!(decoded.value.get("b"), Some(&Value::F32(1.5)));
}

// ── Shapes ───────────────────────────────────────────────────────────────────

#[test]
fn unknown_types_decode_as_records() {
    let mut nodes = vec![node(0, "MyBehaviour", "Base"), node(1, "Vector2f", "m_Offset")];
    nodes.extend([node(2, "float", "x"), node(2, "float", "y")]);
    nodes.push(node(1, "bool", "m_Flag").aligned());
    nodes.push(node(1, "int", "m_After"));

    let mut b = Bytes::new(Endian::Little);
    b.f32(1.0).f32(-2.0).u8(1).align(4).i32(42);
    let decoded = decode(nodes, b.finish(), Some(16)).unwrap();

    let offset = decoded.value.get("m_Offset").expect("nested record");
    assert_eq!(offset.get("x").and_then(Value::as_f64), Some(1.0));
    assert_eq!(offset.get("y").and_then(Value::as_f64), Some(-2.0));
    assert_eq!(decoded.value.get("m_Flag").and_then(Value::as_bool), Some(true));
    assert_eq!(decoded.value.get("m_After").and_then(Value::as_i64), Some(42));
    assert!(decoded.mismatch.is_none());
}

#[test]
fn strings_are_padded_to_four_bytes() {
    let mut nodes = vec![node(0, "Base", "Base")];
    nodes.extend(string_nodes(1, "m_Name"));
    nodes.push(node(1, "int", "m_Next"));

    let mut b = Bytes::new(Endian::Little);
    b.string("abcde").i32(77);
    let data = b.finish();
    assert_eq!(data.len(), 4 + 8 + 4);

    let decoded = decode(nodes, data, Some(16)).unwrap();
    assert_eq!(decoded.value.get("m_Name").and_then(Value::as_str), Some("abcde"));
    assert_eq!(decoded.value.get("m_Next").and_then(Value::as_i64), Some(77));
}

#[test]
fn typeless_data_is_raw_bytes() {
    let nodes = vec![
        node(0, "Base", "Base"),
        node(1, "TypelessData", "image data"),
        node(2, "UInt8", "data"),
        node(1, "int", "tail"),
    ];
    let mut b = Bytes::new(Endian::Little);
    b.i32(4).raw(&[1, 2, 3, 4]).i32(-1);
    let decoded = decode(nodes, b.finish(), None).unwrap();

    assert_eq!(decoded.value.get("image data").and_then(Value::as_bytes), Some(&[1u8, 2, 3, 4][..]));
    assert_eq!(decoded.value.get("tail"), Some(&Value::I32(-1)));
}

#[test]
fn map_keeps_duplicate_keys_in_order() {
    let mut b = Bytes::new(Endian::Little);
    b.i32(3).i32(1).i32(10).i32(1).i32(20).i32(2).i32(30);
    let decoded = decode(map_nodes(0, "m_Map", "int", "int"), b.finish(), None).unwrap();

    let pairs = decoded.value.as_pairs().expect("map");
    let flat: Vec<(i64, i64)> = pairs.iter().map(|(k, v)| (k.as_i64().unwrap(), v.as_i64().unwrap())).collect();
    assert_eq!(flat, vec![(1, 10), (1, 20), (2, 30)]);
}

#[test]
fn empty_map_and_array() {
    let mut nodes = vec![node(0, "Base", "Base")];
    nodes.extend(map_nodes(1, "m_Map", "int", "float"));
    nodes.extend(vector_nodes(1, "m_List", "int"));

    let mut b = Bytes::new(Endian::Little);
    b.i32(0).i32(0);
    let decoded = decode(nodes, b.finish(), Some(8)).unwrap();

    assert_eq!(decoded.value.get("m_Map").and_then(Value::as_pairs).map(<[_]>::len), Some(0));
    assert_eq!(decoded.value.get("m_List").and_then(Value::as_array).map(<[_]>::len), Some(0));
}

// ── Failure modes ────────────────────────────────────────────────────────────

#[test]
fn truncated_primitive_is_end_of_data() {
    let err = decode(vec![node(0, "int", "x")], vec![1, 2], None).unwrap_err();
    assert!(matches!(err, Error::EndOfData { offset: 0, needed: 4 }), "{err:?}");
}

#[test]
fn oversized_count_is_rejected_before_reading() {
    let mut b = Bytes::new(Endian::Little);
    b.i32(1_000_000).i32(1);
    let err = decode(vector_nodes(0, "list", "int"), b.finish(), None).unwrap_err();
    assert!(matches!(err, Error::EndOfData { .. }), "{err:?}");
}

#[test]
fn empty_records_may_outnumber_remaining_bytes() {
    let mut nodes = vec![node(0, "Holder", "Base")];
    nodes.extend(vector_nodes(1, "m_Empties", "EmptyStruct"));

    let mut b = Bytes::new(Endian::Little);
    b.i32(8);
    let decoded = decode(nodes, b.finish(), Some(4)).unwrap();

    let items = decoded.value.get("m_Empties").and_then(Value::as_array).unwrap();
    assert_eq!(items.len(), 8);
    assert!(items.iter().all(|v| v.as_record().is_some_and(|f| f.is_empty())));
    assert_eq!(decoded.consumed, 4);
    assert!(decoded.mismatch.is_none());
}

#[test]
fn negative_count_is_malformed() {
    let mut b = Bytes::new(Endian::Little);
    b.i32(-3);
    let err = decode(vector_nodes(0, "list", "int"), b.finish(), None).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)), "{err:?}");
}

// ── Text dump ────────────────────────────────────────────────────────────────

#[test]
fn dump_renders_indented_lines() {
    let mut nodes = vec![node(0, "MonoBehaviour", "Base")];
    nodes.extend(string_nodes(1, "m_Name"));
    nodes.push(node(1, "bool", "m_Enabled").aligned());
    nodes.extend(vector_nodes(1, "m_Values", "int"));

    let mut b = Bytes::new(Endian::Little);
    b.string("hero").u8(1).align(4).i32(2).i32(5).i32(6);
    let tree = TypeTree::from_nodes(nodes);
    let dump = read_dump(&tree, &mut reader(b.finish(), Endian::Little), None).unwrap().value;

    let expected = [
        "MonoBehaviour Base",
        "\tstring m_Name = \"hero\"",
        "\tbool m_Enabled = True",
        "\tvector m_Values",
        "\t\tArray Array",
        "\t\tint size = 2",
        "\t\t\t[0]",
        "\t\t\tint data = 5",
        "\t\t\t[1]",
        "\t\t\tint data = 6",
    ];
    let lines: Vec<&str> = dump.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines, expected);
}

#[test]
fn dump_and_value_consume_the_same_bytes() {
    let mut nodes = vec![node(0, "Base", "Base")];
    nodes.extend(map_nodes(1, "m_Table", "int", "float"));
    nodes.extend(string_nodes(1, "m_Label"));

    let mut b = Bytes::new(Endian::Big);
    b.i32(2).i32(1).f32(0.5).i32(2).f32(0.25).string("xy");
    let data = b.finish();
    let tree = TypeTree::from_nodes(nodes);

    let value = read_value(&tree, &mut reader(data.clone(), Endian::Big), None).unwrap();
    let dump = read_dump(&tree, &mut reader(data, Endian::Big), None).unwrap();
    assert_eq!(value.consumed, dump.consumed);
    assert!(dump.value.contains("\t\t\tpair data\r\n"));
    assert!(dump.value.contains("\t\t\t\tfloat second = 0.25\r\n"));
}

// ── Encoder ──────────────────────────────────────────────────────────────────

fn record_schema() -> Vec<TypeTreeNode> {
    let mut nodes = vec![node(0, "Sample", "Base")];
    nodes.extend(string_nodes(1, "m_Name"));
    nodes.push(node(1, "bool", "m_Flag").aligned());
    nodes.extend(vector_nodes(1, "m_Items", "SInt16"));
    nodes.extend(map_nodes(1, "m_Lookup", "int", "double"));
    nodes.push(node(1, "UInt64", "m_Id"));
    nodes
}

fn record_value(name: String, flag: bool, items: Vec<i16>, lookup: Vec<(i32, f64)>, id: u64) -> Value {
    Value::Record(
        [
            ("m_Name", Value::String(name)),
            ("m_Flag", Value::Bool(flag)),
            ("m_Items", Value::Array(items.into_iter().map(Value::I16).collect())),
            (
                "m_Lookup",
                Value::Map(lookup.into_iter().map(|(k, v)| (Value::I32(k), Value::F64(v))).collect()),
            ),
            ("m_Id", Value::U64(id)),
        ]
        .into_iter()
        .collect(),
    )
}

#[test]
fn invalid_utf8_string_keeps_its_bytes() {
    let mut nodes = vec![node(0, "Holder", "Base")];
    nodes.extend(string_nodes(1, "m_Name"));
    nodes.push(node(1, "int", "m_Tail"));

    let mut b = Bytes::new(Endian::Little);
    b.i32(3).raw(&[0xFF, 0xFE, b'A']).align(4).i32(11);
    let data = b.finish();

    let tree = TypeTree::from_nodes(nodes);
    let decoded = read_value(&tree, &mut reader(data.clone(), Endian::Little), Some(data.len() as u64)).unwrap();
    assert_eq!(decoded.value.get("m_Name"), Some(&Value::Bytes(vec![0xFF, 0xFE, b'A'])));
    assert_eq!(decoded.value.get("m_Tail"), Some(&Value::I32(11)));
    assert!(decoded.mismatch.is_none());

    assert_eq!(write_value(&tree, &decoded.value, Endian::Little).unwrap(), data);
}

#[test]
fn encoder_rejects_shape_mismatch() {
    let tree = TypeTree::from_nodes(vector_nodes(0, "list", "int"));
    let err = write_value(&tree, &Value::String("nope".into()), Endian::Little).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
}

proptest! {
    #[test]
    fn string_padding_keeps_following_field_aligned(s in "[a-z]{0,128}", tail in any::<i32>()) {
        let mut nodes = string_nodes(0, "m_Name");
        nodes.push(node(0, "int", "m_Tail"));

        let mut b = Bytes::new(Endian::Little);
        b.string(&s).i32(tail);
        let data = b.finish();
        prop_assert_eq!(data.len() % 4, 0);

        let decoded = decode(nodes, data.clone(), Some(data.len() as u64)).unwrap();
        prop_assert_eq!(decoded.value.get("m_Name").and_then(Value::as_str), Some(s.as_str()));
        prop_assert_eq!(decoded.value.get("m_Tail"), Some(&Value::I32(tail)));
        prop_assert!(decoded.mismatch.is_none());
    }

    #[test]
    fn map_pair_count_is_preserved(keys in prop::collection::vec(0i32..4, 0..200)) {
        let mut b = Bytes::new(Endian::Little);
        b.i32(keys.len() as i32);
        for (i, k) in keys.iter().enumerate() {
            b.i32(*k).i32(i as i32);
        }
        let decoded = decode(map_nodes(0, "m_Map", "int", "int"), b.finish(), None).unwrap();
        let pairs = decoded.value.as_pairs().unwrap();

        prop_assert_eq!(pairs.len(), keys.len());
        for (i, (k, v)) in pairs.iter().enumerate() {
            prop_assert_eq!(k.as_i64(), Some(keys[i] as i64));
            prop_assert_eq!(v.as_i64(), Some(i as i64));
        }
    }

    #[test]
    fn encoded_values_decode_back(
        name in "[ -~]{0,24}",
        flag in any::<bool>(),
        items in prop::collection::vec(any::<i16>(), 0..16),
        lookup in prop::collection::vec((any::<i32>(), -1.0e6f64..1.0e6), 0..8),
        id in any::<u64>(),
        big in any::<bool>(),
    ) {
        let endian = if big { Endian::Big } else { Endian::Little };
        let tree = TypeTree::from_nodes(record_schema());
        let value = record_value(name, flag, items, lookup, id);

        let bytes = write_value(&tree, &value, endian).unwrap();
        let decoded = read_value(&tree, &mut reader(bytes.clone(), endian), Some(bytes.len() as u64)).unwrap();
        prop_assert_eq!(decoded.value, value);
        prop_assert!(decoded.mismatch.is_none());
    }
}
