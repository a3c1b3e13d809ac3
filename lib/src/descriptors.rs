//! JVM field-type codes and type-descriptor strings
//!
//! Fields announce their type with a single code byte (`I`, `L`, `[`, ...);
//! object and array fields additionally carry a full descriptor string such
//! as `Ljava/lang/String;` or `[[Z`. Array classes encode their element type
//! in the class name itself (`[I`, `[Ljava/lang/String;`).

use crate::errors::{Error, Result};
use std::str::Chars;

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn from_code(code: u8) -> Option<BaseType> {
        Some(match code {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }

    pub fn code(&self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    /// Java-source spelling of the type.
    pub fn java_name(&self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

/// Kind of a serialized field, as carried by its one-byte type code
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FieldKind {
    Base(BaseType),
    Object,
    Array,
}

impl FieldKind {
    pub fn from_code(code: u8) -> Result<FieldKind> {
        match code {
            b'L' => Ok(FieldKind::Object),
            b'[' => Ok(FieldKind::Array),
            other => BaseType::from_code(other)
                .map(FieldKind::Base)
                .ok_or(Error::UnknownFieldType(other as char)),
        }
    }

    /// Object and array fields carry a descriptor string after their name.
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldKind::Object | FieldKind::Array)
    }
}

/// Parsed form of a type-descriptor string
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TypeDescriptor {
    Base(BaseType),
    /// Class name in internal (slashed) form
    Object(String),
    Array(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Parse a descriptor string, rejecting leftover input.
    pub fn parse(source: &str) -> Result<TypeDescriptor> {
        let mut chars = source.chars();
        let parsed = TypeDescriptor::parse_from(&mut chars)?;
        if chars.as_str().is_empty() {
            Ok(parsed)
        } else {
            Err(Error::BadDescriptor(source.to_string()))
        }
    }

    fn parse_from(source: &mut Chars) -> Result<TypeDescriptor> {
        match source.next() {
            Some('L') => {
                let mut class_name = String::new();
                loop {
                    match source.next() {
                        Some(';') => return Ok(TypeDescriptor::Object(class_name)),
                        Some(c) => class_name.push(c),
                        None => return Err(Error::BadDescriptor(format!("L{}", class_name))),
                    }
                }
            }
            Some('[') => {
                let element = TypeDescriptor::parse_from(source)?;
                Ok(TypeDescriptor::Array(Box::new(element)))
            }
            Some(c) => BaseType::from_code(c as u8)
                .map(TypeDescriptor::Base)
                .ok_or(Error::UnknownFieldType(c)),
            None => Err(Error::BadDescriptor(String::new())),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_to(&mut out);
        out
    }

    fn render_to(&self, out: &mut String) {
        match self {
            TypeDescriptor::Base(base) => out.push(base.code()),
            TypeDescriptor::Object(class_name) => {
                out.push('L');
                out.push_str(class_name);
                out.push(';');
            }
            TypeDescriptor::Array(element) => {
                out.push('[');
                element.render_to(out);
            }
        }
    }

    /// Java-source spelling: `int`, `foo.bar.Baz`, `java.lang.String[][]`.
    pub fn java_type(&self) -> String {
        match self {
            TypeDescriptor::Base(base) => base.java_name().to_string(),
            TypeDescriptor::Object(class_name) => class_name.replace('/', "."),
            TypeDescriptor::Array(element) => format!("{}[]", element.java_type()),
        }
    }
}

/// Element kind of an array class, derived from the second character of its
/// name (`[I` holds ints, `[Lfoo;` holds objects, `[[...` holds arrays).
pub fn element_kind(array_class_name: &str) -> Result<FieldKind> {
    match array_class_name.chars().nth(1) {
        Some(c) => FieldKind::from_code(c as u8),
        None => Err(Error::BadDescriptor(array_class_name.to_string())),
    }
}
