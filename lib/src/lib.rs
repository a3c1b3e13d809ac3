//! Read Java serialization streams without Java
//!
//! The object-output facility of the Java standard library writes a
//! self-describing binary format: every stream carries full class
//! descriptions alongside the data, so its structure can be recovered with
//! no access to the classes that produced it. This crate decodes such a
//! stream into an arena of content nodes (instances, arrays, class
//! descriptions, strings, enum constants, raw block data and serialized
//! exceptions) without ever interpreting field values against runtime
//! types.
//!
//! ```no_run
//! # use std::fs::File;
//! # use std::io::BufReader;
//! # fn main() -> jserial::Result<()> {
//! let file = File::open("invoice.ser").expect("sample missing");
//! let parsed = jserial::parse(BufReader::new(file), true)?;
//! for item in &parsed.contents {
//!     println!("{}", jserial::dump::describe(&parsed.arena, *item));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Streams refer back to previously written objects through 32-bit handles,
//! assigned in reading order and reset by `TC_RESET`; [`Parsed::epochs`]
//! exposes the handle table of every reset window. Because the wire format
//! drops the source-level relationship between inner classes and their
//! outer class, a post-pass ([`connect`]) recovers it from the compiler's
//! naming conventions (`Outer$Inner` names, synthetic `this$0` fields); it
//! runs by default and can be switched off through the second argument of
//! [`parse`].

pub mod codes;
pub mod connect;
pub mod content;
pub mod data_input;
pub mod descriptors;
pub mod dump;
pub mod errors;
pub mod handles;
pub mod mutf8;
pub mod names;
pub mod parser;

pub use codes::{DescFlags, Handle, TypeCode, BASE_HANDLE};
pub use content::{
    ArrayObject, BlockData, ClassDesc, ClassDescKind, ClassObject, Content, ContentArena,
    ContentId, EnumObject, ExceptionState, Field, Instance, InstanceClassData, JavaString, Value,
};
pub use errors::{Error, Result};
pub use handles::HandleMap;
pub use parser::{parse, Parsed, Parser};
