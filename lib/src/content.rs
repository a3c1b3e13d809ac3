//! The content model
//!
//! Everything read from a stream becomes a node in a [`ContentArena`].
//! Class descriptors reference themselves through their super chain and
//! their annotations, and member classes point back into their outer class,
//! so inter-node references are arena indices ([`ContentId`]) rather than
//! owning pointers. Wire handles are a separate namespace: they are the
//! stream's own back-reference scheme, scoped to a reset epoch, and map to
//! `ContentId`s through [`crate::handles::HandleTable`].

use crate::codes::{DescFlags, Handle};
use crate::descriptors::{FieldKind, TypeDescriptor};

/// Index of a node in a [`ContentArena`]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContentId(u32);

/// Owns every content node produced by one parse
#[derive(Debug, Default)]
pub struct ContentArena {
    nodes: Vec<Content>,
}

impl ContentArena {
    pub fn new() -> ContentArena {
        ContentArena::default()
    }

    pub fn alloc(&mut self, content: Content) -> ContentId {
        let id = ContentId(self.nodes.len() as u32);
        self.nodes.push(content);
        id
    }

    /// Ids are only ever produced by [`ContentArena::alloc`], so lookup is
    /// infallible.
    pub fn get(&self, id: ContentId) -> &Content {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ContentId) -> &mut Content {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn class_desc(&self, id: ContentId) -> Option<&ClassDesc> {
        match self.get(id) {
            Content::ClassDesc(desc) => Some(desc),
            _ => None,
        }
    }

    pub fn class_desc_mut(&mut self, id: ContentId) -> Option<&mut ClassDesc> {
        match self.get_mut(id) {
            Content::ClassDesc(desc) => Some(desc),
            _ => None,
        }
    }

    pub fn string(&self, id: ContentId) -> Option<&JavaString> {
        match self.get(id) {
            Content::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn instance(&self, id: ContentId) -> Option<&Instance> {
        match self.get(id) {
            Content::Instance(inst) => Some(inst),
            _ => None,
        }
    }
}

/// One item of stream content
#[derive(Debug)]
pub enum Content {
    Str(JavaString),
    ClassDesc(ClassDesc),
    ClassObject(ClassObject),
    Enum(EnumObject),
    Array(ArrayObject),
    Instance(Instance),
    BlockData(BlockData),
    Exception(ExceptionState),
}

impl Content {
    /// The wire handle bound to this item. Block data is the one content
    /// kind the protocol does not assign a handle to.
    pub fn handle(&self) -> Option<Handle> {
        match self {
            Content::Str(s) => Some(s.handle),
            Content::ClassDesc(d) => Some(d.handle),
            Content::ClassObject(c) => Some(c.handle),
            Content::Enum(e) => Some(e.handle),
            Content::Array(a) => Some(a.handle),
            Content::Instance(i) => Some(i.handle),
            Content::BlockData(_) => None,
            Content::Exception(x) => Some(x.handle),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Content::Str(_) => "string",
            Content::ClassDesc(_) => "class descriptor",
            Content::ClassObject(_) => "class object",
            Content::Enum(_) => "enum",
            Content::Array(_) => "array",
            Content::Instance(_) => "instance",
            Content::BlockData(_) => "block data",
            Content::Exception(_) => "exception state",
        }
    }
}

/// A serialized string: decoded text plus its modified-UTF-8 byte length
#[derive(Debug)]
pub struct JavaString {
    pub handle: Handle,
    pub value: String,
    pub utf_len: usize,
}

/// Stream representation of a class
///
/// Two layouts share this node: ordinary class descriptors, which carry a
/// name, serial version UID, flags and declared fields, and dynamic-proxy
/// descriptors, which carry only an interface list. The member-class
/// linkage (`inner_classes`, `outer_class`, the `is_*` flags) is not on the
/// wire; it is reconstructed after the parse from naming conventions.
#[derive(Debug)]
pub struct ClassDesc {
    pub handle: Handle,
    pub name: String,
    pub kind: ClassDescKind,
    pub annotations: Vec<Option<ContentId>>,
    pub super_desc: Option<ContentId>,
    pub inner_classes: Vec<ContentId>,
    pub outer_class: Option<ContentId>,
    pub enum_constants: Vec<String>,
    pub is_inner_class: bool,
    pub is_static_member_class: bool,
    pub is_local_inner_class: bool,
}

#[derive(Debug)]
pub enum ClassDescKind {
    Normal {
        serial_uid: i64,
        flags: DescFlags,
        fields: Vec<Field>,
    },
    Proxy {
        interfaces: Vec<String>,
    },
}

/// Placeholder name for proxy descriptors; the wire carries none.
pub const PROXY_CLASS_NAME: &str = "(proxy class)";

impl ClassDesc {
    pub fn new_normal(name: String, handle: Handle, serial_uid: i64) -> ClassDesc {
        ClassDesc {
            handle,
            name,
            kind: ClassDescKind::Normal {
                serial_uid,
                flags: DescFlags::empty(),
                fields: Vec::new(),
            },
            annotations: Vec::new(),
            super_desc: None,
            inner_classes: Vec::new(),
            outer_class: None,
            enum_constants: Vec::new(),
            is_inner_class: false,
            is_static_member_class: false,
            is_local_inner_class: false,
        }
    }

    pub fn new_proxy(handle: Handle) -> ClassDesc {
        ClassDesc {
            handle,
            name: PROXY_CLASS_NAME.to_string(),
            kind: ClassDescKind::Proxy {
                interfaces: Vec::new(),
            },
            annotations: Vec::new(),
            super_desc: None,
            inner_classes: Vec::new(),
            outer_class: None,
            enum_constants: Vec::new(),
            is_inner_class: false,
            is_static_member_class: false,
            is_local_inner_class: false,
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, ClassDescKind::Proxy { .. })
    }

    pub fn is_array_class(&self) -> bool {
        self.name.starts_with('[')
    }

    /// Effective flags. Proxy descriptors carry none on the wire but
    /// behave as plain serializable classes with no declared fields.
    pub fn flags(&self) -> DescFlags {
        match &self.kind {
            ClassDescKind::Normal { flags, .. } => *flags,
            ClassDescKind::Proxy { .. } => DescFlags::SERIALIZABLE,
        }
    }

    pub fn serial_uid(&self) -> Option<i64> {
        match &self.kind {
            ClassDescKind::Normal { serial_uid, .. } => Some(*serial_uid),
            ClassDescKind::Proxy { .. } => None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            ClassDescKind::Normal { fields, .. } => fields,
            ClassDescKind::Proxy { .. } => &[],
        }
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        match &mut self.kind {
            ClassDescKind::Normal { fields, .. } => fields,
            ClassDescKind::Proxy { .. } => &mut [],
        }
    }
}

/// One declared field of a class descriptor
#[derive(Debug)]
pub struct Field {
    pub kind: FieldKind,
    pub name: String,
    /// For object and array kinds, the string node holding the JVM type
    /// descriptor (`Lfoo/bar;`, `[I`)
    pub descriptor: Option<ContentId>,
    /// Set during reconnection for the synthetic `this$N` field
    pub is_inner_class_reference: bool,
}

impl Field {
    /// Java-source type of an object or array field, resolved from its
    /// descriptor string. `None` for primitive fields or when the
    /// descriptor does not parse.
    pub fn java_type(&self, arena: &ContentArena) -> Option<String> {
        let text = &arena.string(self.descriptor?)?.value;
        TypeDescriptor::parse(text).ok().map(|d| d.java_type())
    }
}

/// A serialized `java.lang.Class` value
#[derive(Debug)]
pub struct ClassObject {
    pub handle: Handle,
    pub class_desc: ContentId,
}

/// A serialized enum constant
#[derive(Debug)]
pub struct EnumObject {
    pub handle: Handle,
    pub class_desc: ContentId,
    /// String node with the constant's name
    pub constant: ContentId,
}

/// A serialized array
#[derive(Debug)]
pub struct ArrayObject {
    pub handle: Handle,
    /// Descriptor whose name starts with `[`
    pub class_desc: ContentId,
    pub elements: Vec<Value>,
}

/// A serialized object instance
#[derive(Debug)]
pub struct Instance {
    pub handle: Handle,
    /// Most-derived class descriptor
    pub class_desc: ContentId,
    /// Per-class data in reading order (eldest ancestor first)
    pub class_data: Vec<InstanceClassData>,
    /// Set when this instance arrived through a serialized exception
    pub is_exception: bool,
}

/// Data one class of the hierarchy contributed to an instance
#[derive(Debug)]
pub struct InstanceClassData {
    pub class_desc: ContentId,
    /// Field values, parallel to the declared fields; empty for
    /// externalizable classes
    pub values: Vec<Value>,
    /// Object annotations, present when the class wrote any (custom write
    /// method or externalizable block data)
    pub annotations: Option<Vec<Option<ContentId>>>,
}

/// Opaque block-data payload
#[derive(Debug)]
pub struct BlockData {
    pub bytes: Vec<u8>,
}

/// A thrown exception recorded mid-stream, with the raw bytes of the
/// enclosing partial write
#[derive(Debug)]
pub struct ExceptionState {
    /// Adopted from the wrapped exception instance
    pub handle: Handle,
    pub exception: ContentId,
    pub data: Vec<u8>,
}

/// A field or array-element value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Ref(ContentId),
    Byte(i8),
    /// UTF-16 code unit, as the JVM stores it
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
}

impl Value {
    /// An object value read through the content rule: either a reference or
    /// a written null.
    pub fn reference(item: Option<ContentId>) -> Value {
        match item {
            Some(id) => Value::Ref(id),
            None => Value::Null,
        }
    }
}
