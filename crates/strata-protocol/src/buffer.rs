use byteorder::{BigEndian, ByteOrder};
use std::error::Error;
use std::fmt;
use std::io::{self, Read};
use strata_common::BlockPosition;
use strata_nbt::{Compound, NbtError, Tag};
use uuid::Uuid;

pub const VARINT_MAX_BYTES: usize = 5;
pub const VARLONG_MAX_BYTES: usize = 10;

/// Longest string, in bytes, a packet may carry.
pub const MAX_STRING_LENGTH: usize = 32767;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A read of `requested` bytes at `index` would pass the end of a
    /// buffer of `length` bytes.
    OutOfBounds {
        length: usize,
        index: usize,
        requested: usize,
    },
    VariableIntegerTooLarge { maximum_bytes: usize },
    NegativeLength(i32),
    InvalidUtf8,
    StringTooLong { length: usize },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::OutOfBounds {
                length,
                index,
                requested,
            } => write!(
                f,
                "Read of {} bytes at index {} is out of bounds for a buffer of {} bytes",
                requested, index, length
            ),
            BufferError::VariableIntegerTooLarge { maximum_bytes } => {
                write!(f, "Variable length integer longer than {} bytes", maximum_bytes)
            }
            BufferError::NegativeLength(length) => write!(f, "Negative length prefix: {}", length),
            BufferError::InvalidUtf8 => write!(f, "String is not valid UTF-8"),
            BufferError::StringTooLong { length } => write!(
                f,
                "String of {} bytes exceeds the limit of {}",
                length, MAX_STRING_LENGTH
            ),
        }
    }
}

impl Error for BufferError {}

impl From<BufferError> for io::Error {
    fn from(err: BufferError) -> Self {
        let kind = match err {
            BufferError::OutOfBounds { .. } => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

/// Packet bytes plus a read cursor.
///
/// Reads advance the cursor and fail with [`BufferError::OutOfBounds`]
/// instead of running past the end; a failed read leaves the cursor where it
/// was. Writes append to the end and never fail. Multi-byte reads and writes
/// take the byte order as a type parameter, [`BigEndian`] being the network
/// order every packet field uses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    buffer: Vec<u8>,
    cursor: usize,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            cursor: 0,
        }
    }

    /// Every byte written or received, regardless of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn unread(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    fn ensure(&self, requested: usize) -> Result<(), BufferError> {
        if requested > self.remaining() {
            return Err(BufferError::OutOfBounds {
                length: self.buffer.len(),
                index: self.cursor,
                requested,
            });
        }
        Ok(())
    }

    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.ensure(length)?;
        self.cursor += length;
        Ok(())
    }

    fn read_slice(&mut self, length: usize) -> Result<&[u8], BufferError> {
        self.ensure(length)?;
        let start = self.cursor;
        self.cursor += length;
        Ok(&self.buffer[start..start + length])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.read_slice(N)?);
        Ok(bytes)
    }

    /// Copies out the next `length` bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, BufferError> {
        Ok(self.read_slice(length)?.to_vec())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    // Fixed width

    pub fn read_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, BufferError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16<E: ByteOrder>(&mut self) -> Result<u16, BufferError> {
        Ok(E::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_i16<E: ByteOrder>(&mut self) -> Result<i16, BufferError> {
        Ok(self.read_u16::<E>()? as i16)
    }

    pub fn read_u32<E: ByteOrder>(&mut self) -> Result<u32, BufferError> {
        Ok(E::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_i32<E: ByteOrder>(&mut self) -> Result<i32, BufferError> {
        Ok(self.read_u32::<E>()? as i32)
    }

    pub fn read_u64<E: ByteOrder>(&mut self) -> Result<u64, BufferError> {
        Ok(E::read_u64(&self.read_array::<8>()?))
    }

    pub fn read_i64<E: ByteOrder>(&mut self) -> Result<i64, BufferError> {
        Ok(self.read_u64::<E>()? as i64)
    }

    pub fn read_f32<E: ByteOrder>(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_bits(self.read_u32::<E>()?))
    }

    pub fn read_f64<E: ByteOrder>(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_bits(self.read_u64::<E>()?))
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(value as u8);
    }

    pub fn write_u16<E: ByteOrder>(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        E::write_u16(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn write_i16<E: ByteOrder>(&mut self, value: i16) {
        self.write_u16::<E>(value as u16);
    }

    pub fn write_u32<E: ByteOrder>(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        E::write_u32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn write_i32<E: ByteOrder>(&mut self, value: i32) {
        self.write_u32::<E>(value as u32);
    }

    pub fn write_u64<E: ByteOrder>(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        E::write_u64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn write_i64<E: ByteOrder>(&mut self, value: i64) {
        self.write_u64::<E>(value as u64);
    }

    pub fn write_f32<E: ByteOrder>(&mut self, value: f32) {
        self.write_u32::<E>(value.to_bits());
    }

    pub fn write_f64<E: ByteOrder>(&mut self, value: f64) {
        self.write_u64::<E>(value.to_bits());
    }

    // Variable width

    fn read_variable(&mut self, maximum_bytes: usize) -> Result<u64, BufferError> {
        let start = self.cursor;
        let mut result = 0u64;
        for index in 0..maximum_bytes {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(err) => {
                    self.cursor = start;
                    return Err(err);
                }
            };
            result |= ((byte & 0x7F) as u64) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        self.cursor = start;
        Err(BufferError::VariableIntegerTooLarge { maximum_bytes })
    }

    fn write_variable(&mut self, mut value: u64) {
        while value & !0x7F != 0 {
            self.buffer.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Reads a VarInt: 7 data bits per byte, low group first, top bit set
    /// on every byte but the last. At most 5 bytes.
    pub fn read_varint(&mut self) -> Result<i32, BufferError> {
        Ok(self.read_variable(VARINT_MAX_BYTES)? as u32 as i32)
    }

    /// Writes a VarInt in as few bytes as the value needs. Negative values
    /// always take 5.
    pub fn write_varint(&mut self, value: i32) {
        self.write_variable(value as u32 as u64);
    }

    pub fn read_varlong(&mut self) -> Result<i64, BufferError> {
        Ok(self.read_variable(VARLONG_MAX_BYTES)? as i64)
    }

    pub fn write_varlong(&mut self, value: i64) {
        self.write_variable(value as u64);
    }

    /// Reads a VarInt used as a length or count.
    pub fn read_length(&mut self) -> Result<usize, BufferError> {
        let start = self.cursor;
        let length = self.read_varint()?;
        if length < 0 {
            self.cursor = start;
            return Err(BufferError::NegativeLength(length));
        }
        Ok(length as usize)
    }

    // Composite

    pub fn read_byte_array(&mut self) -> Result<Vec<u8>, BufferError> {
        let length = self.read_length()?;
        self.read_bytes(length)
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as i32);
        self.buffer.extend_from_slice(bytes);
    }

    /// Reads `count` big-endian longs.
    pub fn read_long_array(&mut self, count: usize) -> Result<Vec<u64>, BufferError> {
        self.ensure(count.saturating_mul(8))?;
        (0..count).map(|_| self.read_u64::<BigEndian>()).collect()
    }

    pub fn write_long_array(&mut self, longs: &[u64]) {
        for long in longs {
            self.write_u64::<BigEndian>(*long);
        }
    }

    /// Reads a VarInt-prefixed UTF-8 string of at most 32767 bytes.
    pub fn read_string(&mut self) -> Result<String, BufferError> {
        let start = self.cursor;
        let length = self.read_length()?;
        if length > MAX_STRING_LENGTH {
            self.cursor = start;
            return Err(BufferError::StringTooLong { length });
        }
        let bytes = match self.read_bytes(length) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.cursor = start;
                return Err(err);
            }
        };
        String::from_utf8(bytes).map_err(|_| {
            self.cursor = start;
            BufferError::InvalidUtf8
        })
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_byte_array(value.as_bytes());
    }

    /// Reads a UUID as sixteen bytes, most significant first.
    pub fn read_uuid(&mut self) -> Result<Uuid, BufferError> {
        Ok(Uuid::from_bytes(self.read_array::<16>()?))
    }

    pub fn write_uuid(&mut self, value: Uuid) {
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Reads a position packed into one long: x in the top 26 bits, then z
    /// in 26 bits, then y in the low 12, each signed.
    pub fn read_block_position(&mut self) -> Result<BlockPosition, BufferError> {
        let value = self.read_i64::<BigEndian>()?;
        Ok(BlockPosition::new(
            (value >> 38) as i32,
            (value << 52 >> 52) as i32,
            (value << 26 >> 38) as i32,
        ))
    }

    pub fn write_block_position(&mut self, position: BlockPosition) {
        let value = ((position.x as i64 & 0x3FF_FFFF) << 38)
            | ((position.z as i64 & 0x3FF_FFFF) << 12)
            | (position.y as i64 & 0xFFF);
        self.write_i64::<BigEndian>(value);
    }

    /// Reads a named root compound from the unread bytes and moves the
    /// cursor past exactly the bytes it used. On failure the cursor does
    /// not move.
    pub fn read_nbt(&mut self) -> Result<(String, Compound), NbtError> {
        let (name, compound, consumed) = Tag::read_root_from_slice(self.unread())?;
        self.cursor += consumed;
        Ok((name, compound))
    }

    pub fn write_nbt(&mut self, name: &str, compound: &Compound) -> Result<(), NbtError> {
        Tag::Compound(compound.clone()).write(&mut self.buffer, name)
    }
}

impl Read for PacketBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.remaining());
        buf[..count].copy_from_slice(&self.buffer[self.cursor..self.cursor + count]);
        self.cursor += count;
        Ok(count)
    }
}
