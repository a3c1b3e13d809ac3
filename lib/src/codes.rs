use crate::errors::{Error, Result};
use bitflags::bitflags;

/// Wire handle identifying a previously written object within one reset epoch.
pub type Handle = u32;

/// First two bytes of every serialization stream.
pub const MAGIC: u16 = 0xAC_ED;

/// Stream protocol version; unchanged since protocol version 2.
pub const VERSION: u16 = 0x00_05;

/// Handle assigned to the first object of every epoch. Subsequent objects
/// take successive values until the next reset.
pub const BASE_HANDLE: Handle = 0x7E_00_00;

/// Type codes prefixing every item in the stream
///
/// See <https://docs.oracle.com/en/java/javase/17/docs/specs/serialization/protocol.html>
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum TypeCode {
    Null = 0x70,
    Reference = 0x71,
    ClassDesc = 0x72,
    Object = 0x73,
    String = 0x74,
    Array = 0x75,
    Class = 0x76,
    BlockData = 0x77,
    EndBlockData = 0x78,
    Reset = 0x79,
    BlockDataLong = 0x7A,
    Exception = 0x7B,
    LongString = 0x7C,
    ProxyClassDesc = 0x7D,
    Enum = 0x7E,
}

impl TypeCode {
    pub fn from_byte(byte: u8) -> Result<TypeCode> {
        Ok(match byte {
            0x70 => TypeCode::Null,
            0x71 => TypeCode::Reference,
            0x72 => TypeCode::ClassDesc,
            0x73 => TypeCode::Object,
            0x74 => TypeCode::String,
            0x75 => TypeCode::Array,
            0x76 => TypeCode::Class,
            0x77 => TypeCode::BlockData,
            0x78 => TypeCode::EndBlockData,
            0x79 => TypeCode::Reset,
            0x7A => TypeCode::BlockDataLong,
            0x7B => TypeCode::Exception,
            0x7C => TypeCode::LongString,
            0x7D => TypeCode::ProxyClassDesc,
            0x7E => TypeCode::Enum,
            other => return Err(Error::UnknownTypeCode(other)),
        })
    }
}

bitflags! {
    /// Flag bits of a class descriptor
    ///
    /// `SERIALIZABLE` and `EXTERNALIZABLE` are mutually exclusive on the
    /// wire; `ENUM` implies `SERIALIZABLE`.
    pub struct DescFlags: u8 {
        const WRITE_METHOD   = 0x01;
        const SERIALIZABLE   = 0x02;
        const EXTERNALIZABLE = 0x04;
        const BLOCK_DATA     = 0x08;
        const ENUM           = 0x10;
    }
}

impl DescFlags {
    /// Decode the flag byte of a class descriptor. Unknown bits are dropped
    /// (the protocol reserves them) but validity of the known combination is
    /// checked.
    pub fn from_stream_byte(byte: u8) -> Result<DescFlags> {
        let flags = DescFlags::from_bits_truncate(byte);
        if flags.bits() != byte {
            log::debug!("ignoring unknown class descriptor flag bits in 0x{:02X}", byte);
        }
        if flags.contains(DescFlags::SERIALIZABLE | DescFlags::EXTERNALIZABLE) {
            return Err(Error::BadFlags(byte, "serializable and externalizable at once"));
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for byte in 0x70..=0x7E {
            let code = TypeCode::from_byte(byte).expect("code in range");
            assert_eq!(code as u8, byte);
        }
    }

    #[test]
    fn type_code_out_of_range() {
        match TypeCode::from_byte(0x6F) {
            Err(Error::UnknownTypeCode(0x6F)) => (),
            other => panic!("expected unknown type code error, got {:?}", other),
        }
        assert!(TypeCode::from_byte(0x7F).is_err());
    }

    #[test]
    fn flag_bytes() {
        assert_eq!(
            DescFlags::from_stream_byte(0x03).unwrap(),
            DescFlags::SERIALIZABLE | DescFlags::WRITE_METHOD
        );
        assert_eq!(
            DescFlags::from_stream_byte(0x12).unwrap(),
            DescFlags::SERIALIZABLE | DescFlags::ENUM
        );
        // reserved bits are tolerated
        assert_eq!(
            DescFlags::from_stream_byte(0x82).unwrap(),
            DescFlags::SERIALIZABLE
        );
    }

    #[test]
    fn conflicting_flags_rejected() {
        match DescFlags::from_stream_byte(0x06) {
            Err(Error::BadFlags(0x06, _)) => (),
            other => panic!("expected flag error, got {:?}", other),
        }
    }
}
