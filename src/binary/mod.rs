//! Hand-written binary payload structures.
//!
//! The map and pose payloads predate the protobuf schemas: they are packed
//! little-endian structs, and the large map pushes arrive zlib-compressed.
//! This module provides the bounds-checked reader/writer the struct codecs
//! are built on, plus the compression helpers.

pub mod area;
pub mod map;
pub mod pose;

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{CodecError, Result};

/// Decompress a zlib stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::Inflate(e.to_string()))?;
    Ok(out)
}

/// Compress a buffer as a zlib stream.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Bounds-checked little-endian reader over a byte slice. Every read past the
/// end reports how many bytes it needed instead of panicking.
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(CodecError::Truncated {
                needed: n,
                remaining: self.buf.len(),
            }
            .into());
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Read a length-prefixed UTF-8 string (u8 length).
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::InvalidArgument(format!("invalid utf-8 string: {e}")).into())
    }
}

/// Little-endian writer mirroring [`ByteReader`].
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a length-prefixed UTF-8 string (u8 length).
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if value.len() > u8::MAX as usize {
            return Err(CodecError::OutOfRange {
                value: value.len() as i64,
                min: 0,
                max: i64::from(u8::MAX),
            }
            .into());
        }
        self.write_u8(value.len() as u8);
        self.write_bytes(value.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_reader_tracks_position() {
        let mut reader = ByteReader::new(&[0x01, 0x00, 0x00, 0x00, 0x2a]);
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.read_u8().unwrap(), 0x2a);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_reports_truncation() {
        let mut reader = ByteReader::new(&[0x01, 0x02]);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(CodecError::Truncated {
                needed: 4,
                remaining: 2,
            })
        ));
    }

    #[test]
    fn test_string_round_trip() {
        let mut writer = ByteWriter::new();
        writer.write_string("Living room").unwrap();
        let buf = writer.into_vec();
        assert_eq!(buf[0], 11);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_string().unwrap(), "Living room");
    }

    #[test]
    fn test_zlib_round_trip() {
        let data = vec![7u8; 4096];
        let packed = deflate(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(inflate(&packed).unwrap(), data);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        let err = inflate(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::Inflate(_))));
    }
}
