//! The grammar driver
//!
//! One forward pass over the stream: check the header, then repeatedly read
//! a type code and dispatch through the protocol grammar, registering
//! handle-carrying items in the handle table and appending each completed
//! top-level item to the content list. Two entry rules exist: *content*
//! admits raw block data, *object* does not; field values are read through
//! the object rule.
//!
//! A `TC_EXCEPTION` marker means the writer's `writeObject` threw. The
//! thrown object is decoded and the whole nested read unwinds through
//! [`Error::ExceptionInStream`], which the top-level loop converts into an
//! [`ExceptionState`] replacing the partially read item.

use crate::codes::{DescFlags, TypeCode, MAGIC, VERSION};
use crate::connect;
use crate::content::{
    ArrayObject, BlockData, ClassDesc, ClassDescKind, ClassObject, Content, ContentArena,
    ContentId, EnumObject, ExceptionState, Field, Instance, InstanceClassData, JavaString, Value,
};
use crate::data_input::DataInput;
use crate::descriptors::{self, BaseType, FieldKind};
use crate::errors::{Error, Result};
use crate::handles::{HandleMap, HandleTable};
use std::io::Read;

/// Everything produced by one parse
#[derive(Debug)]
pub struct Parsed {
    pub arena: ContentArena,
    /// Top-level content items in stream order; `None` is a written null
    pub contents: Vec<Option<ContentId>>,
    /// Handle bindings per reset epoch, final epoch last
    pub epochs: Vec<HandleMap>,
}

/// Read every content item from `source`. When `connect` is set (the
/// default entry point for consumers), the member-class reconnection pass
/// runs before the results are returned.
pub fn parse<R: Read>(source: R, connect: bool) -> Result<Parsed> {
    let mut parser = Parser::new(source)?;
    parser.run(connect)?;
    Ok(parser.into_parsed())
}

pub struct Parser<R: Read> {
    input: DataInput<R>,
    arena: ContentArena,
    handles: HandleTable,
    contents: Vec<Option<ContentId>>,
}

impl<R: Read> Parser<R> {
    /// Wrap a source, checking the stream header.
    pub fn new(source: R) -> Result<Parser<R>> {
        let mut input = DataInput::new(source);
        let magic = input.read_u16()?;
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = input.read_u16()?;
        if version != VERSION {
            return Err(Error::BadVersion(version));
        }
        Ok(Parser {
            input,
            arena: ContentArena::new(),
            handles: HandleTable::new(),
            contents: Vec::new(),
        })
    }

    /// Read top-level items until the source is exhausted, then optionally
    /// reconnect member classes.
    pub fn run(&mut self, connect: bool) -> Result<()> {
        loop {
            self.input.mark();
            let code = match self.next_top_code()? {
                Some(code) => code,
                None => break,
            };
            if code == TypeCode::Reset {
                log::debug!("stream reset");
                self.handles.reset();
                continue;
            }
            match self.read_content(code, true) {
                Ok(item) => self.contents.push(item),
                Err(Error::ExceptionInStream { instance, data }) => {
                    let handle = match self.arena.get(instance) {
                        Content::Instance(inst) => inst.handle,
                        other => {
                            return Err(Error::WrongVariant {
                                expected: "exception instance",
                                found: other.kind_name(),
                            })
                        }
                    };
                    log::debug!(
                        "stream exception, salvaged {} byte(s) of the failing write",
                        data.len()
                    );
                    let id = self.arena.alloc(Content::Exception(ExceptionState {
                        handle,
                        exception: instance,
                        data,
                    }));
                    self.contents.push(Some(id));
                }
                Err(other) => return Err(other),
            }
        }
        if connect {
            connect::connect(&mut self.arena, self.handles.current())?;
        }
        Ok(())
    }

    pub fn into_parsed(self) -> Parsed {
        Parsed {
            arena: self.arena,
            contents: self.contents,
            epochs: self.handles.finish(),
        }
    }

    /// Next type code at a top-level boundary; end of input is a normal end
    /// of the stream here and nowhere else.
    fn next_top_code(&mut self) -> Result<Option<TypeCode>> {
        match self.input.read_u8() {
            Ok(byte) => TypeCode::from_byte(byte).map(Some),
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read_code(&mut self) -> Result<TypeCode> {
        TypeCode::from_byte(self.input.read_u8()?)
    }

    /// The *content* rule (and, with `blockdata` false, the *object* rule):
    /// one item dispatched on an already-read type code. Returns `None` for
    /// a written null.
    fn read_content(&mut self, code: TypeCode, blockdata: bool) -> Result<Option<ContentId>> {
        log::debug!("content item: {:?}", code);
        match code {
            TypeCode::Null => Ok(None),
            TypeCode::Reference => self.read_back_reference().map(Some),
            TypeCode::ClassDesc => self.read_plain_class_desc().map(Some),
            TypeCode::ProxyClassDesc => self.read_proxy_class_desc().map(Some),
            TypeCode::Object => self.read_new_object().map(Some),
            TypeCode::String | TypeCode::LongString => self.read_new_string(code).map(Some),
            TypeCode::Array => self.read_new_array().map(Some),
            TypeCode::Class => self.read_new_class().map(Some),
            TypeCode::Enum => self.read_new_enum().map(Some),
            TypeCode::BlockData | TypeCode::BlockDataLong if blockdata => {
                self.read_block_data(code).map(Some)
            }
            TypeCode::Exception => self.read_exception(),
            other => Err(Error::UnexpectedTypeCode(other as u8, "a content item")),
        }
    }

    fn read_back_reference(&mut self) -> Result<ContentId> {
        let handle = self.input.read_u32()?;
        let id = self.handles.lookup(handle)?;
        log::debug!("back-reference to handle 0x{:X}", handle);
        Ok(id)
    }

    /// The classDesc rule: a new (plain or proxy) descriptor, a
    /// back-reference to one, or null.
    fn read_class_desc(&mut self) -> Result<Option<ContentId>> {
        let code = self.read_code()?;
        match code {
            TypeCode::Null => Ok(None),
            TypeCode::ClassDesc => self.read_plain_class_desc().map(Some),
            TypeCode::ProxyClassDesc => self.read_proxy_class_desc().map(Some),
            TypeCode::Reference => {
                let id = self.read_back_reference()?;
                match self.arena.get(id) {
                    Content::ClassDesc(_) => Ok(Some(id)),
                    other => Err(Error::WrongVariant {
                        expected: "class descriptor",
                        found: other.kind_name(),
                    }),
                }
            }
            other => Err(Error::UnexpectedTypeCode(other as u8, "a class descriptor")),
        }
    }

    fn read_plain_class_desc(&mut self) -> Result<ContentId> {
        let (name, _) = self.input.read_utf()?;
        let serial_uid = self.input.read_i64()?;
        let handle = self.handles.allocate();
        log::debug!(
            "class descriptor '{}' (suid {}) -> handle 0x{:X}",
            name,
            serial_uid,
            handle
        );
        // Bound before the annotations and super chain are read: a class
        // description may be referenced from inside its own definition.
        let id = self
            .arena
            .alloc(Content::ClassDesc(ClassDesc::new_normal(
                name,
                handle,
                serial_uid,
            )));
        self.handles.bind(handle, id)?;

        let flags = DescFlags::from_stream_byte(self.input.read_u8()?)?;
        let field_count = self.input.read_i16()?;
        if field_count < 0 {
            return Err(Error::NegativeCount(field_count as i64, "field count"));
        }
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(self.read_field()?);
        }
        if let Some(desc) = self.arena.class_desc_mut(id) {
            desc.kind = ClassDescKind::Normal {
                serial_uid,
                flags,
                fields,
            };
        }

        let annotations = self.read_annotations()?;
        let super_desc = self.read_class_desc()?;
        if let Some(desc) = self.arena.class_desc_mut(id) {
            desc.annotations = annotations;
            desc.super_desc = super_desc;
        }
        Ok(id)
    }

    fn read_proxy_class_desc(&mut self) -> Result<ContentId> {
        let handle = self.handles.allocate();
        let id = self
            .arena
            .alloc(Content::ClassDesc(ClassDesc::new_proxy(handle)));
        self.handles.bind(handle, id)?;
        let interface_count = self.input.read_i32()?;
        if interface_count < 0 {
            return Err(Error::NegativeCount(
                interface_count as i64,
                "interface count",
            ));
        }
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(self.input.read_utf()?.0);
        }
        log::debug!(
            "proxy class descriptor over {:?} -> handle 0x{:X}",
            interfaces,
            handle
        );
        let annotations = self.read_annotations()?;
        let super_desc = self.read_class_desc()?;
        if let Some(desc) = self.arena.class_desc_mut(id) {
            desc.kind = ClassDescKind::Proxy { interfaces };
            desc.annotations = annotations;
            desc.super_desc = super_desc;
        }
        Ok(id)
    }

    fn read_field(&mut self) -> Result<Field> {
        let code = self.input.read_u8()?;
        let kind = FieldKind::from_code(code)?;
        let (name, _) = self.input.read_utf()?;
        let descriptor = if kind.is_reference() {
            let id = self.read_string_content("a field type descriptor")?;
            if kind == FieldKind::Object {
                let text = match self.arena.string(id) {
                    Some(s) => &s.value,
                    None => {
                        return Err(Error::WrongVariant {
                            expected: "string",
                            found: self.arena.get(id).kind_name(),
                        })
                    }
                };
                if !(text.starts_with('L') && text.ends_with(';')) {
                    return Err(Error::BadDescriptor(text.clone()));
                }
            }
            Some(id)
        } else {
            None
        };
        Ok(Field {
            kind,
            name,
            descriptor,
            is_inner_class_reference: false,
        })
    }

    /// A content item that must resolve to a string (field type
    /// descriptors, enum constant names).
    fn read_string_content(&mut self, what: &'static str) -> Result<ContentId> {
        let code = self.read_code()?;
        let id = match code {
            TypeCode::String | TypeCode::LongString => self.read_new_string(code)?,
            TypeCode::Reference => self.read_back_reference()?,
            other => return Err(Error::UnexpectedTypeCode(other as u8, what)),
        };
        match self.arena.get(id) {
            Content::Str(_) => Ok(id),
            other => Err(Error::WrongVariant {
                expected: "string",
                found: other.kind_name(),
            }),
        }
    }

    /// Zero or more content items terminated by `TC_ENDBLOCKDATA`. A reset
    /// in this position resets the handle table and the list goes on.
    fn read_annotations(&mut self) -> Result<Vec<Option<ContentId>>> {
        let mut items = Vec::new();
        loop {
            let code = self.read_code()?;
            match code {
                TypeCode::EndBlockData => break,
                TypeCode::Reset => {
                    log::debug!("stream reset inside an annotation list");
                    self.handles.reset();
                }
                code => items.push(self.read_content(code, true)?),
            }
        }
        Ok(items)
    }

    fn read_new_string(&mut self, code: TypeCode) -> Result<ContentId> {
        let handle = self.handles.allocate();
        let (value, utf_len) = if code == TypeCode::String {
            self.input.read_utf()?
        } else {
            let len = self.input.read_i64()?;
            if len < 0 || len > i32::MAX as i64 {
                return Err(Error::StringLength(len));
            }
            if len < 65536 {
                log::warn!(
                    "long-string encoding used for a {}-byte string; continuing",
                    len
                );
            }
            self.input.read_utf_body(len as usize)?
        };
        log::debug!("string \"{}\" -> handle 0x{:X}", value, handle);
        let id = self.arena.alloc(Content::Str(JavaString {
            handle,
            value,
            utf_len,
        }));
        self.handles.bind(handle, id)?;
        Ok(id)
    }

    fn read_new_object(&mut self) -> Result<ContentId> {
        let desc = self
            .read_class_desc()?
            .ok_or(Error::NullClassDesc("an object"))?;
        let handle = self.handles.allocate();
        let id = self.arena.alloc(Content::Instance(Instance {
            handle,
            class_desc: desc,
            class_data: Vec::new(),
            is_exception: false,
        }));
        self.handles.bind(handle, id)?;
        log::debug!("instance -> handle 0x{:X}", handle);
        let class_data = self.read_class_data(desc)?;
        if let Content::Instance(inst) = self.arena.get_mut(id) {
            inst.class_data = class_data;
        }
        Ok(id)
    }

    fn read_new_class(&mut self) -> Result<ContentId> {
        let desc = self
            .read_class_desc()?
            .ok_or(Error::NullClassDesc("a class object"))?;
        let handle = self.handles.allocate();
        log::debug!("class object -> handle 0x{:X}", handle);
        let id = self.arena.alloc(Content::ClassObject(ClassObject {
            handle,
            class_desc: desc,
        }));
        self.handles.bind(handle, id)?;
        Ok(id)
    }

    fn read_new_enum(&mut self) -> Result<ContentId> {
        let desc = self
            .read_class_desc()?
            .ok_or(Error::NullClassDesc("an enum"))?;
        let handle = self.handles.allocate();
        let constant = self.read_string_content("an enum constant name")?;
        let text = match self.arena.string(constant) {
            Some(s) => s.value.clone(),
            None => {
                return Err(Error::WrongVariant {
                    expected: "string",
                    found: self.arena.get(constant).kind_name(),
                })
            }
        };
        log::debug!("enum constant {} -> handle 0x{:X}", text, handle);
        if let Some(class_desc) = self.arena.class_desc_mut(desc) {
            class_desc.enum_constants.push(text);
        }
        let id = self.arena.alloc(Content::Enum(EnumObject {
            handle,
            class_desc: desc,
            constant,
        }));
        self.handles.bind(handle, id)?;
        Ok(id)
    }

    fn read_new_array(&mut self) -> Result<ContentId> {
        let desc = self
            .read_class_desc()?
            .ok_or(Error::NullClassDesc("an array"))?;
        let name = match self.arena.class_desc(desc) {
            Some(class_desc) => class_desc.name.clone(),
            None => {
                return Err(Error::WrongVariant {
                    expected: "class descriptor",
                    found: self.arena.get(desc).kind_name(),
                })
            }
        };
        if !name.starts_with('[') {
            return Err(Error::BadDescriptor(name));
        }
        let element = descriptors::element_kind(&name)?;
        let handle = self.handles.allocate();
        // Bound before the elements are read: an array may contain itself.
        let id = self.arena.alloc(Content::Array(ArrayObject {
            handle,
            class_desc: desc,
            elements: Vec::new(),
        }));
        self.handles.bind(handle, id)?;
        let size = self.input.read_i32()?;
        if size < 0 {
            return Err(Error::NegativeCount(size as i64, "array size"));
        }
        log::debug!("array '{}' x {} -> handle 0x{:X}", name, size, handle);
        let mut elements = Vec::with_capacity(size as usize);
        for _ in 0..size {
            elements.push(self.read_value(element)?);
        }
        if let Content::Array(array) = self.arena.get_mut(id) {
            array.elements = elements;
        }
        Ok(id)
    }

    fn read_block_data(&mut self, code: TypeCode) -> Result<ContentId> {
        let len = if code == TypeCode::BlockData {
            self.input.read_u8()? as usize
        } else {
            let len = self.input.read_i32()?;
            if len < 0 {
                return Err(Error::NegativeCount(len as i64, "block data size"));
            }
            len as usize
        };
        log::debug!("block data, {} byte(s)", len);
        let bytes = self.input.read_bytes(len)?;
        Ok(self.arena.alloc(Content::BlockData(BlockData { bytes })))
    }

    /// A `TC_EXCEPTION` marker. Decodes the thrown object and unwinds; the
    /// recorded bytes of the failing write (everything since the top-level
    /// mark, up to but excluding the marker byte) travel with the signal.
    fn read_exception(&mut self) -> Result<Option<ContentId>> {
        let mut data = self.input.snapshot();
        data.pop();
        self.handles.reset();
        let code = self.read_code()?;
        if code == TypeCode::Reset {
            return Err(Error::UnexpectedTypeCode(code as u8, "a thrown object"));
        }
        let thrown = self.read_content(code, false)?;
        let id = match thrown {
            Some(id) => id,
            None => {
                return Err(Error::WrongVariant {
                    expected: "exception instance",
                    found: "null reference",
                })
            }
        };
        match self.arena.get_mut(id) {
            Content::Instance(inst) => inst.is_exception = true,
            other => {
                return Err(Error::WrongVariant {
                    expected: "exception instance",
                    found: other.kind_name(),
                })
            }
        }
        self.handles.reset();
        Err(Error::ExceptionInStream { instance: id, data })
    }

    /// Per-instance data: walk the descriptor chain from the eldest
    /// ancestor down, reading what each class wrote.
    fn read_class_data(&mut self, desc: ContentId) -> Result<Vec<InstanceClassData>> {
        let mut chain = Vec::new();
        let mut cursor = Some(desc);
        while let Some(id) = cursor {
            chain.push(id);
            cursor = match self.arena.class_desc(id) {
                Some(class_desc) => class_desc.super_desc,
                None => {
                    return Err(Error::WrongVariant {
                        expected: "class descriptor",
                        found: self.arena.get(id).kind_name(),
                    })
                }
            };
        }
        chain.reverse();

        let mut class_data = Vec::with_capacity(chain.len());
        for id in chain {
            let (name, flags, kinds) = match self.arena.class_desc(id) {
                Some(class_desc) => (
                    class_desc.name.clone(),
                    class_desc.flags(),
                    class_desc
                        .fields()
                        .iter()
                        .map(|f| f.kind)
                        .collect::<Vec<_>>(),
                ),
                None => continue,
            };
            if flags.contains(DescFlags::SERIALIZABLE) {
                log::debug!("field values for '{}' ({} field(s))", name, kinds.len());
                let mut values = Vec::with_capacity(kinds.len());
                for kind in kinds {
                    values.push(self.read_value(kind)?);
                }
                let annotations = if flags.contains(DescFlags::WRITE_METHOD) {
                    Some(self.read_annotations()?)
                } else {
                    None
                };
                class_data.push(InstanceClassData {
                    class_desc: id,
                    values,
                    annotations,
                });
            } else if flags.contains(DescFlags::EXTERNALIZABLE) {
                if !flags.contains(DescFlags::BLOCK_DATA) {
                    // Protocol version 1 externalizable data has no
                    // structure a reader can recover without the class.
                    return Err(Error::ExternalContents(name));
                }
                log::debug!("externalizable data for '{}'", name);
                let annotations = Some(self.read_annotations()?);
                class_data.push(InstanceClassData {
                    class_desc: id,
                    values: Vec::new(),
                    annotations,
                });
            } else {
                log::debug!("'{}' contributes no data", name);
            }
        }
        Ok(class_data)
    }

    /// One field or array-element value, typed by the field kind.
    fn read_value(&mut self, kind: FieldKind) -> Result<Value> {
        match kind {
            FieldKind::Base(base) => self.read_primitive(base),
            FieldKind::Object => {
                let code = self.read_code()?;
                Ok(Value::reference(self.read_content(code, false)?))
            }
            FieldKind::Array => {
                let code = self.read_code()?;
                match code {
                    TypeCode::Array | TypeCode::Null | TypeCode::Reference => {
                        Ok(Value::reference(self.read_content(code, false)?))
                    }
                    other => Err(Error::UnexpectedTypeCode(other as u8, "an array value")),
                }
            }
        }
    }

    fn read_primitive(&mut self, base: BaseType) -> Result<Value> {
        Ok(match base {
            BaseType::Byte => Value::Byte(self.input.read_i8()?),
            BaseType::Char => Value::Char(self.input.read_u16()?),
            BaseType::Double => Value::Double(self.input.read_f64()?),
            BaseType::Float => Value::Float(self.input.read_f32()?),
            BaseType::Int => Value::Int(self.input.read_i32()?),
            BaseType::Long => Value::Long(self.input.read_i64()?),
            BaseType::Short => Value::Short(self.input.read_i16()?),
            BaseType::Boolean => Value::Boolean(self.input.read_u8()? != 0),
        })
    }
}
