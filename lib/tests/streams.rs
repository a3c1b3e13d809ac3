//! End-to-end scenarios over handcrafted streams
//!
//! Each stream below is byte-for-byte what the standard Java writer emits
//! for the scenario, minus any detail irrelevant to it (serial version UIDs
//! are arbitrary, library super classes are cut short with a null).

use jserial::descriptors::{BaseType, FieldKind};
use jserial::dump;
use jserial::{parse, Content, DescFlags, Error, Value, BASE_HANDLE};

/// u16 byte-length followed by the (here: ASCII) bytes.
fn utf(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len());
    out.extend((text.len() as u16).to_be_bytes());
    out.extend(text.as_bytes());
    out
}

fn header() -> Vec<u8> {
    vec![0xAC, 0xED, 0x00, 0x05]
}

/// `class Demo implements Serializable { int a = 42; String b = "zoo"; }`
fn demo_stream() -> Vec<u8> {
    let mut s = header();
    s.push(0x73); // TC_OBJECT
    s.push(0x72); // TC_CLASSDESC
    s.extend(utf("Demo"));
    s.extend(42i64.to_be_bytes()); // serialVersionUID
    s.push(0x02); // SC_SERIALIZABLE
    s.extend(2u16.to_be_bytes()); // two fields
    s.push(b'I');
    s.extend(utf("a"));
    s.push(b'L');
    s.extend(utf("b"));
    s.push(0x74); // the object field's type descriptor, a new string
    s.extend(utf("Ljava/lang/String;"));
    s.push(0x78); // TC_ENDBLOCKDATA, no class annotations
    s.push(0x70); // TC_NULL, no super class
    s.extend(42i32.to_be_bytes()); // a = 42
    s.push(0x74); // b = "zoo"
    s.extend(utf("zoo"));
    s
}

#[test]
fn primitive_only_instance() {
    let parsed = parse(&demo_stream()[..], true).unwrap();
    assert_eq!(parsed.contents.len(), 1);
    let id = parsed.contents[0].expect("item is not null");
    let instance = parsed.arena.instance(id).expect("item is an instance");
    assert_eq!(instance.handle, BASE_HANDLE + 2);

    let desc = parsed.arena.class_desc(instance.class_desc).unwrap();
    assert_eq!(desc.name, "Demo");
    assert_eq!(desc.serial_uid(), Some(42));
    assert!(desc.flags().contains(DescFlags::SERIALIZABLE));
    let names: Vec<_> = desc.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(desc.fields()[0].kind, FieldKind::Base(BaseType::Int));
    assert_eq!(desc.fields()[1].kind, FieldKind::Object);
    assert_eq!(
        desc.fields()[1].java_type(&parsed.arena).as_deref(),
        Some("java.lang.String")
    );

    assert_eq!(instance.class_data.len(), 1);
    let data = &instance.class_data[0];
    assert_eq!(data.class_desc, instance.class_desc);
    assert_eq!(data.values[0], Value::Int(42));
    match data.values[1] {
        Value::Ref(string_id) => {
            let s = parsed.arena.string(string_id).expect("b is a string");
            assert_eq!(s.value, "zoo");
            assert_eq!(s.utf_len, 3);
            assert_eq!(s.handle, BASE_HANDLE + 3);
        }
        ref other => panic!("expected a reference, got {:?}", other),
    }
}

#[test]
fn repeated_string_shares_its_handle() {
    let mut s = header();
    s.push(0x74);
    s.extend(utf("zoo"));
    s.push(0x71); // TC_REFERENCE
    s.extend(BASE_HANDLE.to_be_bytes());
    let parsed = parse(&s[..], true).unwrap();
    assert_eq!(parsed.contents.len(), 2);
    assert_eq!(parsed.contents[0], parsed.contents[1]);
    let id = parsed.contents[0].unwrap();
    assert_eq!(parsed.arena.string(id).unwrap().value, "zoo");
}

/// `class Outer { class Inner implements Serializable {} }`, an `Inner`
/// serialized with its synthetic outer reference.
fn inner_class_stream() -> Vec<u8> {
    let mut s = header();
    s.push(0x73); // TC_OBJECT
    s.push(0x72); // TC_CLASSDESC
    s.extend(utf("Outer$Inner"));
    s.extend(2i64.to_be_bytes());
    s.push(0x02); // SC_SERIALIZABLE
    s.extend(1u16.to_be_bytes());
    s.push(b'L');
    s.extend(utf("this$0"));
    s.push(0x74);
    s.extend(utf("LOuter;"));
    s.push(0x78);
    s.push(0x70);
    // class data: this$0 holds an Outer instance
    s.push(0x73);
    s.push(0x72);
    s.extend(utf("Outer"));
    s.extend(1i64.to_be_bytes());
    s.push(0x02);
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    s
}

#[test]
fn inner_class_is_reconnected() {
    let parsed = parse(&inner_class_stream()[..], true).unwrap();
    let inner_instance = parsed.arena.instance(parsed.contents[0].unwrap()).unwrap();
    let inner_id = inner_instance.class_desc;
    let inner = parsed.arena.class_desc(inner_id).unwrap();

    assert_eq!(inner.name, "Inner");
    assert!(inner.is_inner_class);
    assert!(!inner.is_static_member_class);
    assert!(inner.fields()[0].is_inner_class_reference);

    let outer_id = inner.outer_class.expect("inner class has an outer");
    let outer = parsed.arena.class_desc(outer_id).unwrap();
    assert_eq!(outer.name, "Outer");
    assert!(outer.inner_classes.contains(&inner_id));
}

#[test]
fn reconnection_can_be_disabled() {
    let parsed = parse(&inner_class_stream()[..], false).unwrap();
    let instance = parsed.arena.instance(parsed.contents[0].unwrap()).unwrap();
    let desc = parsed.arena.class_desc(instance.class_desc).unwrap();
    assert_eq!(desc.name, "Outer$Inner");
    assert!(!desc.is_inner_class);
    assert!(!desc.fields()[0].is_inner_class_reference);
}

#[test]
fn inner_class_hidden_from_declarations() {
    let parsed = parse(&inner_class_stream()[..], true).unwrap();
    let mut out = Vec::new();
    dump::write_class_declarations(
        &mut out,
        &parsed.arena,
        &parsed.epochs,
        &dump::DumpOptions::default(),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("class Outer {"), "got:\n{}", text);
    assert!(text.contains("    class Inner {"), "got:\n{}", text);
    assert!(!text.contains("this$0"), "got:\n{}", text);
}

#[test]
fn enum_constant() {
    let mut s = header();
    s.push(0x7E); // TC_ENUM
    s.push(0x72);
    s.extend(utf("Color"));
    s.extend(0i64.to_be_bytes());
    s.push(0x12); // SC_SERIALIZABLE | SC_ENUM
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    s.push(0x74); // the constant's name
    s.extend(utf("RED"));

    let parsed = parse(&s[..], true).unwrap();
    let id = parsed.contents[0].unwrap();
    match parsed.arena.get(id) {
        Content::Enum(e) => {
            assert_eq!(e.handle, BASE_HANDLE + 1);
            let desc = parsed.arena.class_desc(e.class_desc).unwrap();
            assert!(desc.flags().contains(DescFlags::ENUM));
            assert_eq!(desc.enum_constants, ["RED"]);
            assert_eq!(parsed.arena.string(e.constant).unwrap().value, "RED");
        }
        other => panic!("expected an enum, got {:?}", other),
    }
}

#[test]
fn custom_write_annotation() {
    let mut s = header();
    s.push(0x73);
    s.push(0x72);
    s.extend(utf("Custom"));
    s.extend(3i64.to_be_bytes());
    s.push(0x03); // SC_SERIALIZABLE | SC_WRITE_METHOD
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    // the custom writeObject wrote one int, then the terminator
    s.extend([0x77, 0x04, 0x00, 0x00, 0x00, 0x07]);
    s.push(0x78);

    let parsed = parse(&s[..], true).unwrap();
    let instance = parsed.arena.instance(parsed.contents[0].unwrap()).unwrap();
    assert_eq!(instance.class_data.len(), 1);
    let data = &instance.class_data[0];
    assert!(data.values.is_empty());
    let annotations = data.annotations.as_ref().expect("write method annotations");
    assert_eq!(annotations.len(), 1);
    match parsed.arena.get(annotations[0].unwrap()) {
        Content::BlockData(block) => assert_eq!(block.bytes, [0x00, 0x00, 0x00, 0x07]),
        other => panic!("expected block data, got {:?}", other),
    }
}

#[test]
fn embedded_exception() {
    let mut s = header();
    s.push(0x73);
    s.push(0x72);
    s.extend(utf("Foo"));
    s.extend(7i64.to_be_bytes());
    s.push(0x03); // SC_SERIALIZABLE | SC_WRITE_METHOD
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    s.extend([0x77, 0x02, 0xAA, 0xBB]); // partial custom write
    let cut = s.len();
    s.push(0x7B); // TC_EXCEPTION: the writer threw here
    s.push(0x73);
    s.push(0x72);
    s.extend(utf("MyExc"));
    s.extend(9i64.to_be_bytes());
    s.push(0x02);
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);

    let parsed = parse(&s[..], true).unwrap();
    assert_eq!(parsed.contents.len(), 1);
    match parsed.arena.get(parsed.contents[0].unwrap()) {
        Content::Exception(state) => {
            // the failing write's bytes, from the item start up to the marker
            assert_eq!(state.data, s[4..cut].to_vec());
            let exception = parsed.arena.instance(state.exception).unwrap();
            assert!(exception.is_exception);
            assert_eq!(exception.handle, BASE_HANDLE + 1);
            assert_eq!(state.handle, exception.handle);
            let desc = parsed.arena.class_desc(exception.class_desc).unwrap();
            assert_eq!(desc.name, "MyExc");
        }
        other => panic!("expected an exception state, got {:?}", other),
    }
    // the epoch of the failing write, the epoch of the exception itself,
    // and the empty final epoch
    assert_eq!(parsed.epochs.len(), 3);
    assert_eq!(parsed.epochs[1].len(), 2);
    assert!(parsed.epochs[2].is_empty());
}

#[test]
fn reset_restarts_handles() {
    let mut s = header();
    s.push(0x74);
    s.extend(utf("a"));
    s.push(0x79); // TC_RESET
    s.push(0x74);
    s.extend(utf("b"));

    let parsed = parse(&s[..], true).unwrap();
    let a = parsed.contents[0].unwrap();
    let b = parsed.contents[1].unwrap();
    assert_ne!(a, b);
    assert_eq!(parsed.arena.string(a).unwrap().handle, BASE_HANDLE);
    assert_eq!(parsed.arena.string(b).unwrap().handle, BASE_HANDLE);
    assert_eq!(parsed.epochs.len(), 2);
    assert_eq!(parsed.epochs[0].get(&BASE_HANDLE), Some(&a));
    assert_eq!(parsed.epochs[1].get(&BASE_HANDLE), Some(&b));
}

#[test]
fn hierarchy_is_read_eldest_first() {
    let mut s = header();
    s.push(0x73);
    s.push(0x72);
    s.extend(utf("Child"));
    s.extend(2i64.to_be_bytes());
    s.push(0x02);
    s.extend(1u16.to_be_bytes());
    s.push(b'I');
    s.extend(utf("c"));
    s.push(0x78);
    s.push(0x72); // super class descriptor
    s.extend(utf("Parent"));
    s.extend(1i64.to_be_bytes());
    s.push(0x02);
    s.extend(1u16.to_be_bytes());
    s.push(b'I');
    s.extend(utf("p"));
    s.push(0x78);
    s.push(0x70);
    s.extend(1i32.to_be_bytes()); // Parent.p
    s.extend(2i32.to_be_bytes()); // Child.c

    let parsed = parse(&s[..], true).unwrap();
    let instance = parsed.arena.instance(parsed.contents[0].unwrap()).unwrap();
    assert_eq!(instance.class_data.len(), 2);
    let parent = &instance.class_data[0];
    let child = &instance.class_data[1];
    assert_eq!(parsed.arena.class_desc(parent.class_desc).unwrap().name, "Parent");
    assert_eq!(parsed.arena.class_desc(child.class_desc).unwrap().name, "Child");
    assert_eq!(parent.values, [Value::Int(1)]);
    assert_eq!(child.values, [Value::Int(2)]);
}

#[test]
fn primitive_array() {
    let mut s = header();
    s.push(0x75); // TC_ARRAY
    s.push(0x72);
    s.extend(utf("[I"));
    s.extend(5i64.to_be_bytes());
    s.push(0x02);
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    s.extend(2i32.to_be_bytes()); // two elements
    s.extend(1i32.to_be_bytes());
    s.extend(2i32.to_be_bytes());

    let parsed = parse(&s[..], true).unwrap();
    match parsed.arena.get(parsed.contents[0].unwrap()) {
        Content::Array(array) => {
            assert_eq!(array.elements, [Value::Int(1), Value::Int(2)]);
        }
        other => panic!("expected an array, got {:?}", other),
    }
}

#[test]
fn object_array_with_nulls_and_references() {
    let mut s = header();
    s.push(0x75);
    s.push(0x72);
    s.extend(utf("[Ljava/lang/String;"));
    s.extend(6i64.to_be_bytes());
    s.push(0x02);
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    s.extend(3i32.to_be_bytes());
    s.push(0x74); // "x"
    s.extend(utf("x"));
    s.push(0x70); // null
    s.push(0x71); // the same "x" again
    s.extend((BASE_HANDLE + 2).to_be_bytes());

    let parsed = parse(&s[..], true).unwrap();
    match parsed.arena.get(parsed.contents[0].unwrap()) {
        Content::Array(array) => {
            assert_eq!(array.elements.len(), 3);
            assert_eq!(array.elements[1], Value::Null);
            assert_eq!(array.elements[0], array.elements[2]);
        }
        other => panic!("expected an array, got {:?}", other),
    }
}

#[test]
fn long_string_with_small_length_is_tolerated() {
    let mut s = header();
    s.push(0x7C); // TC_LONGSTRING
    s.extend(3i64.to_be_bytes());
    s.extend(b"zoo");
    let parsed = parse(&s[..], true).unwrap();
    let string = parsed.arena.string(parsed.contents[0].unwrap()).unwrap();
    assert_eq!(string.value, "zoo");
    assert_eq!(string.utf_len, 3);
}

#[test]
fn long_string_with_negative_length_is_rejected() {
    let mut s = header();
    s.push(0x7C);
    s.extend((-1i64).to_be_bytes());
    match parse(&s[..], true) {
        Err(Error::StringLength(-1)) => (),
        other => panic!("expected a length error, got {:?}", other.err()),
    }
}

#[test]
fn externalizable_protocol_one_is_unreadable() {
    let mut s = header();
    s.push(0x73);
    s.push(0x72);
    s.extend(utf("Ext"));
    s.extend(4i64.to_be_bytes());
    s.push(0x04); // SC_EXTERNALIZABLE without SC_BLOCK_DATA
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    match parse(&s[..], true) {
        Err(Error::ExternalContents(name)) => assert_eq!(name, "Ext"),
        other => panic!("expected an externalizable error, got {:?}", other.err()),
    }
}

#[test]
fn proxy_class_descriptor() {
    let mut s = header();
    s.push(0x7D); // TC_PROXYCLASSDESC
    s.extend(1i32.to_be_bytes());
    s.extend(utf("some.Intf"));
    s.push(0x78);
    s.push(0x70);
    let parsed = parse(&s[..], true).unwrap();
    let desc = parsed.arena.class_desc(parsed.contents[0].unwrap()).unwrap();
    assert!(desc.is_proxy());
    match &desc.kind {
        jserial::ClassDescKind::Proxy { interfaces } => {
            assert_eq!(interfaces, &["some.Intf".to_string()])
        }
        other => panic!("expected a proxy, got {:?}", other),
    }
}

#[test]
fn class_object() {
    let mut s = header();
    s.push(0x76); // TC_CLASS
    s.push(0x72);
    s.extend(utf("java.lang.Integer"));
    s.extend(8i64.to_be_bytes());
    s.push(0x02);
    s.extend(0u16.to_be_bytes());
    s.push(0x78);
    s.push(0x70);
    let parsed = parse(&s[..], true).unwrap();
    match parsed.arena.get(parsed.contents[0].unwrap()) {
        Content::ClassObject(class) => {
            assert_eq!(class.handle, BASE_HANDLE + 1);
            let desc = parsed.arena.class_desc(class.class_desc).unwrap();
            assert_eq!(desc.name, "java.lang.Integer");
        }
        other => panic!("expected a class object, got {:?}", other),
    }
}

#[test]
fn back_reference_must_match_its_use() {
    let mut s = header();
    s.push(0x74);
    s.extend(utf("zoo"));
    s.push(0x73); // TC_OBJECT whose class descriptor is ...
    s.push(0x71); // ... a back-reference to the string
    s.extend(BASE_HANDLE.to_be_bytes());
    match parse(&s[..], true) {
        Err(Error::WrongVariant { expected, found }) => {
            assert_eq!(expected, "class descriptor");
            assert_eq!(found, "string");
        }
        other => panic!("expected a variant error, got {:?}", other.err()),
    }
}

#[test]
fn dangling_back_reference_is_rejected() {
    let mut s = header();
    s.push(0x71);
    s.extend((BASE_HANDLE + 5).to_be_bytes());
    match parse(&s[..], true) {
        Err(Error::DanglingHandle(handle)) => assert_eq!(handle, BASE_HANDLE + 5),
        other => panic!("expected a dangling handle, got {:?}", other.err()),
    }
}

#[test]
fn static_member_class_is_reconnected() {
    let mut s = header();
    for name in ["Outer", "Outer$Member"] {
        s.push(0x72);
        s.extend(utf(name));
        s.extend(1i64.to_be_bytes());
        s.push(0x02);
        s.extend(0u16.to_be_bytes());
        s.push(0x78);
        s.push(0x70);
    }
    let parsed = parse(&s[..], true).unwrap();
    let member = parsed.arena.class_desc(parsed.contents[1].unwrap()).unwrap();
    assert_eq!(member.name, "Member");
    assert!(member.is_static_member_class);
    assert!(!member.is_inner_class);
    let outer = parsed.arena.class_desc(member.outer_class.unwrap()).unwrap();
    assert_eq!(outer.name, "Outer");
}

#[test]
fn rename_collisions_abort() {
    let mut s = header();
    for name in ["Outer", "Outer$Member", "Member"] {
        s.push(0x72);
        s.extend(utf(name));
        s.extend(1i64.to_be_bytes());
        s.push(0x02);
        s.extend(0u16.to_be_bytes());
        s.push(0x78);
        s.push(0x70);
    }
    match parse(&s[..], true) {
        Err(Error::RenameCollision(old, new)) => {
            assert_eq!(old, "Outer$Member");
            assert_eq!(new, "Member");
        }
        other => panic!("expected a rename collision, got {:?}", other.err()),
    }
}

#[test]
fn renames_rewrite_field_descriptors() {
    // `Holder` keeps a reference to the member class by its old name
    let mut s = header();
    for name in ["Outer", "Outer$Member"] {
        s.push(0x72);
        s.extend(utf(name));
        s.extend(1i64.to_be_bytes());
        s.push(0x02);
        s.extend(0u16.to_be_bytes());
        s.push(0x78);
        s.push(0x70);
    }
    s.push(0x72);
    s.extend(utf("Holder"));
    s.extend(1i64.to_be_bytes());
    s.push(0x02);
    s.extend(1u16.to_be_bytes());
    s.push(b'L');
    s.extend(utf("member"));
    s.push(0x74);
    s.extend(utf("LOuter$Member;"));
    s.push(0x78);
    s.push(0x70);

    let parsed = parse(&s[..], true).unwrap();
    let holder = parsed.arena.class_desc(parsed.contents[2].unwrap()).unwrap();
    assert_eq!(
        holder.fields()[0].java_type(&parsed.arena).as_deref(),
        Some("Member")
    );
}

#[test]
fn declarations_render_field_types() {
    let parsed = parse(&demo_stream()[..], true).unwrap();
    let mut out = Vec::new();
    dump::write_class_declarations(
        &mut out,
        &parsed.arena,
        &parsed.epochs,
        &dump::DumpOptions::default(),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("class Demo {"), "got:\n{}", text);
    assert!(text.contains("    int a;"), "got:\n{}", text);
    assert!(text.contains("    java.lang.String b;"), "got:\n{}", text);
}

#[test]
fn instance_dump_shows_values() {
    let parsed = parse(&demo_stream()[..], true).unwrap();
    let instance = parsed.arena.instance(parsed.contents[0].unwrap()).unwrap();
    let mut out = Vec::new();
    dump::write_instance(
        &mut out,
        &parsed.arena,
        instance,
        &dump::DumpOptions::default(),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("a = 42"), "got:\n{}", text);
    assert!(text.contains("\"zoo\""), "got:\n{}", text);
}

#[test]
fn block_data_between_objects() {
    let mut s = header();
    s.extend([0x77, 0x03, 0x01, 0x02, 0x03]);
    s.push(0x7A); // TC_BLOCKDATALONG
    s.extend(2i32.to_be_bytes());
    s.extend([0xEE, 0xFF]);
    let parsed = parse(&s[..], true).unwrap();
    assert_eq!(parsed.contents.len(), 2);
    match parsed.arena.get(parsed.contents[0].unwrap()) {
        Content::BlockData(block) => assert_eq!(block.bytes, [1, 2, 3]),
        other => panic!("expected block data, got {:?}", other),
    }
    match parsed.arena.get(parsed.contents[1].unwrap()) {
        Content::BlockData(block) => assert_eq!(block.bytes, [0xEE, 0xFF]),
        other => panic!("expected block data, got {:?}", other),
    }
}
