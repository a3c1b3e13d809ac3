//! Recording big-endian reader over the raw byte source
//!
//! Every multi-byte quantity in the stream is big-endian, so the reader is a
//! thin layer over [`byteorder::ReadBytesExt`]. On top of that it records
//! the bytes consumed since the last [`DataInput::mark`]: when a serialized
//! exception unwinds an in-progress read, the recording is what ends up in
//! the resulting [`crate::content::ExceptionState`].

use crate::errors::Result;
use crate::mutf8;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

pub struct DataInput<R> {
    source: R,
    record: Vec<u8>,
}

impl<R: Read> Read for DataInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.source.read(buf)?;
        self.record.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

impl<R: Read> DataInput<R> {
    pub fn new(source: R) -> DataInput<R> {
        DataInput {
            source,
            record: Vec::new(),
        }
    }

    /// Restart recording at the current position.
    pub fn mark(&mut self) {
        self.record.clear();
    }

    /// Copy of every byte read since the last [`DataInput::mark`].
    pub fn snapshot(&self) -> Vec<u8> {
        self.record.clone()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(ReadBytesExt::read_u8(self)?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(ReadBytesExt::read_i8(self)?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(ReadBytesExt::read_u16::<BigEndian>(self)?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(ReadBytesExt::read_i16::<BigEndian>(self)?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(ReadBytesExt::read_u32::<BigEndian>(self)?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(ReadBytesExt::read_i32::<BigEndian>(self)?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(ReadBytesExt::read_i64::<BigEndian>(self)?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(ReadBytesExt::read_f32::<BigEndian>(self)?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(ReadBytesExt::read_f64::<BigEndian>(self)?)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// A `u16` byte-length followed by that many modified-UTF-8 bytes.
    /// Returns the decoded text and its source byte length.
    pub fn read_utf(&mut self) -> Result<(String, usize)> {
        let len = self.read_u16()? as usize;
        self.read_utf_body(len)
    }

    /// The body of a string whose byte length was already read.
    pub fn read_utf_body(&mut self, len: usize) -> Result<(String, usize)> {
        let bytes = self.read_bytes(len)?;
        Ok((mutf8::decode(&bytes)?, len))
    }
}
