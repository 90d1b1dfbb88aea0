//! Named binary tags: the recursive, self-describing tree format used for
//! height maps and block entity data in chunk packets.

mod error;

pub use error::NbtError;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// Nesting limit for compounds and lists.
pub const MAX_DEPTH: usize = 512;

// Upper bound on up-front allocation for arrays whose length comes off the wire.
const PREALLOCATION_LIMIT: usize = 4096;

pub type Compound = HashMap<String, Tag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TryFrom<u8> for TagType {
    type Error = NbtError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Ok(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            other => return Err(NbtError::InvalidTagType(other)),
        })
    }
}

/// A single tag payload. Names live in the enclosing compound.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    /// Lists keep their declared element type so that empty lists encode
    /// back to the same bytes.
    List {
        element_type: TagType,
        items: Vec<Tag>,
    },
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::Byte(_) => TagType::Byte,
            Tag::Short(_) => TagType::Short,
            Tag::Int(_) => TagType::Int,
            Tag::Long(_) => TagType::Long,
            Tag::Float(_) => TagType::Float,
            Tag::Double(_) => TagType::Double,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::String(_) => TagType::String,
            Tag::List { .. } => TagType::List,
            Tag::Compound(_) => TagType::Compound,
            Tag::IntArray(_) => TagType::IntArray,
            Tag::LongArray(_) => TagType::LongArray,
        }
    }

    /// Builds a list, taking the element type from the first item.
    /// An empty vector produces a list of `End`.
    pub fn list(items: Vec<Tag>) -> Tag {
        let element_type = items.first().map(Tag::tag_type).unwrap_or(TagType::End);
        Tag::List {
            element_type,
            items,
        }
    }

    /// Reads one named tag. Returns `None` when the next tag is `End`.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<(String, Tag)>, NbtError> {
        Tag::read_named(reader, 0)
    }

    /// Reads a named root tag that must be a compound.
    pub fn read_root<R: Read>(reader: &mut R) -> Result<(String, Compound), NbtError> {
        match Tag::read(reader)? {
            Some((name, Tag::Compound(compound))) => Ok((name, compound)),
            _ => Err(NbtError::RootNotCompound),
        }
    }

    /// Reads a root compound from the front of `bytes` and reports how many
    /// bytes it occupied, so a caller reading from a shared buffer can skip
    /// exactly that far.
    pub fn read_root_from_slice(bytes: &[u8]) -> Result<(String, Compound, usize), NbtError> {
        let mut remaining = bytes;
        let (name, compound) = Tag::read_root(&mut remaining)?;
        Ok((name, compound, bytes.len() - remaining.len()))
    }

    fn read_named<R: Read>(reader: &mut R, depth: usize) -> Result<Option<(String, Tag)>, NbtError> {
        let tag_type = TagType::try_from(reader.read_u8()?)?;
        if tag_type == TagType::End {
            return Ok(None);
        }

        let name = read_string(reader)?;
        let tag = Tag::read_payload(reader, tag_type, depth)?;
        Ok(Some((name, tag)))
    }

    fn read_payload<R: Read>(reader: &mut R, tag_type: TagType, depth: usize) -> Result<Tag, NbtError> {
        if depth > MAX_DEPTH {
            return Err(NbtError::DepthLimitExceeded);
        }

        Ok(match tag_type {
            TagType::End => return Err(NbtError::InvalidTagType(0)),
            TagType::Byte => Tag::Byte(reader.read_i8()?),
            TagType::Short => Tag::Short(reader.read_i16::<BigEndian>()?),
            TagType::Int => Tag::Int(reader.read_i32::<BigEndian>()?),
            TagType::Long => Tag::Long(reader.read_i64::<BigEndian>()?),
            TagType::Float => Tag::Float(reader.read_f32::<BigEndian>()?),
            TagType::Double => Tag::Double(reader.read_f64::<BigEndian>()?),
            TagType::ByteArray => {
                let length = read_array_length(reader)?;
                let mut bytes = Vec::with_capacity(length.min(PREALLOCATION_LIMIT));
                (&mut *reader).take(length as u64).read_to_end(&mut bytes)?;
                if bytes.len() != length {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                }
                Tag::ByteArray(bytes.into_iter().map(|b| b as i8).collect())
            }
            TagType::String => Tag::String(read_string(reader)?),
            TagType::List => {
                let element_type = TagType::try_from(reader.read_u8()?)?;
                let length = reader.read_i32::<BigEndian>()?;
                if length < 0 {
                    return Err(NbtError::NegativeListLength(length));
                }
                if element_type == TagType::End && length > 0 {
                    return Err(NbtError::InvalidTagType(0));
                }

                let length = length as usize;
                let mut items = Vec::with_capacity(length.min(PREALLOCATION_LIMIT));
                for _ in 0..length {
                    items.push(Tag::read_payload(reader, element_type, depth + 1)?);
                }
                Tag::List {
                    element_type,
                    items,
                }
            }
            TagType::Compound => {
                let mut compound = HashMap::new();
                while let Some((name, tag)) = Tag::read_named(reader, depth + 1)? {
                    compound.insert(name, tag);
                }
                Tag::Compound(compound)
            }
            TagType::IntArray => {
                let length = read_array_length(reader)?;
                let mut ints = Vec::with_capacity(length.min(PREALLOCATION_LIMIT));
                for _ in 0..length {
                    ints.push(reader.read_i32::<BigEndian>()?);
                }
                Tag::IntArray(ints)
            }
            TagType::LongArray => {
                let length = read_array_length(reader)?;
                let mut longs = Vec::with_capacity(length.min(PREALLOCATION_LIMIT));
                for _ in 0..length {
                    longs.push(reader.read_i64::<BigEndian>()?);
                }
                Tag::LongArray(longs)
            }
        })
    }

    /// Writes this tag with a name, as a compound child or a root.
    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> Result<(), NbtError> {
        writer.write_u8(self.tag_type() as u8)?;
        write_string(writer, name)?;
        self.write_payload(writer)
    }

    /// Encodes this tag as a named root into a fresh vector.
    pub fn to_bytes(&self, name: &str) -> Result<Vec<u8>, NbtError> {
        let mut bytes = Vec::new();
        self.write(&mut bytes, name)?;
        Ok(bytes)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> Result<(), NbtError> {
        match self {
            Tag::Byte(v) => writer.write_i8(*v)?,
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v)?,
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v)?,
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v)?,
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v)?,
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v)?,
            Tag::ByteArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                let bytes: Vec<u8> = v.iter().map(|b| *b as u8).collect();
                writer.write_all(&bytes)?;
            }
            Tag::String(v) => write_string(writer, v)?,
            Tag::List {
                element_type,
                items,
            } => {
                if items.iter().any(|item| item.tag_type() != *element_type) {
                    return Err(NbtError::HeterogeneousList);
                }
                writer.write_u8(*element_type as u8)?;
                writer.write_i32::<BigEndian>(items.len() as i32)?;
                for item in items {
                    item.write_payload(writer)?;
                }
            }
            Tag::Compound(v) => {
                for (name, tag) in v {
                    tag.write(writer, name)?;
                }
                writer.write_u8(TagType::End as u8)?;
            }
            Tag::IntArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for i in v {
                    writer.write_i32::<BigEndian>(*i)?;
                }
            }
            Tag::LongArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for l in v {
                    writer.write_i64::<BigEndian>(*l)?;
                }
            }
        }
        Ok(())
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(longs) => Some(longs),
            _ => None,
        }
    }
}

/// Typed field lookups on a compound, failing with `MissingField` when the
/// key is absent or holds a different tag type.
pub trait CompoundExt {
    fn get_int(&self, key: &str) -> Result<i32, NbtError>;
    fn get_string(&self, key: &str) -> Result<&str, NbtError>;
    fn get_long_array(&self, key: &str) -> Result<&[i64], NbtError>;
    fn get_compound(&self, key: &str) -> Result<&Compound, NbtError>;
}

impl CompoundExt for Compound {
    fn get_int(&self, key: &str) -> Result<i32, NbtError> {
        self.get(key)
            .and_then(Tag::as_i32)
            .ok_or_else(|| NbtError::MissingField(key.to_string()))
    }

    fn get_string(&self, key: &str) -> Result<&str, NbtError> {
        self.get(key)
            .and_then(Tag::as_string)
            .ok_or_else(|| NbtError::MissingField(key.to_string()))
    }

    fn get_long_array(&self, key: &str) -> Result<&[i64], NbtError> {
        self.get(key)
            .and_then(Tag::as_long_array)
            .ok_or_else(|| NbtError::MissingField(key.to_string()))
    }

    fn get_compound(&self, key: &str) -> Result<&Compound, NbtError> {
        self.get(key)
            .and_then(Tag::as_compound)
            .ok_or_else(|| NbtError::MissingField(key.to_string()))
    }
}

fn read_array_length<R: Read>(reader: &mut R) -> Result<usize, NbtError> {
    let length = reader.read_i32::<BigEndian>()?;
    if length < 0 {
        return Err(NbtError::NegativeArrayLength(length));
    }
    Ok(length as usize)
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, NbtError> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| NbtError::InvalidUtf8)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), NbtError> {
    if value.len() > u16::MAX as usize {
        return Err(NbtError::StringTooLong(value.len()));
    }
    writer.write_u16::<BigEndian>(value.len() as u16)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn round_trip(tag: &Tag) -> Tag {
        let bytes = tag.to_bytes("value").unwrap();
        let (name, read) = Tag::read(&mut Cursor::new(bytes)).unwrap().unwrap();
        assert_eq!(name, "value");
        read
    }

    #[test]
    fn test_tag_types() {
        assert_eq!(Tag::Byte(0).tag_type(), TagType::Byte);
        assert_eq!(Tag::list(vec![]).tag_type(), TagType::List);
        assert_eq!(Tag::LongArray(vec![]).tag_type() as u8, 12);
        assert_eq!(TagType::try_from(10).unwrap(), TagType::Compound);
        assert_matches!(TagType::try_from(13), Err(NbtError::InvalidTagType(13)));
    }

    #[test]
    fn test_scalar_and_array_round_trip() {
        let tags = vec![
            Tag::Byte(-7),
            Tag::Short(1234),
            Tag::Int(-12345678),
            Tag::Long(123456789012),
            Tag::Float(2.5),
            Tag::Double(-0.125),
            Tag::ByteArray(vec![1, -2, 3]),
            Tag::String("stone_bricks".to_string()),
            Tag::IntArray(vec![1, -2, i32::MAX]),
            Tag::LongArray(vec![i64::MIN, 0, 42]),
        ];

        for tag in tags {
            assert_eq!(round_trip(&tag), tag);
        }
    }

    #[test]
    fn test_nested_compound_round_trip() {
        let mut inner = Compound::new();
        inner.insert("MOTION_BLOCKING".to_string(), Tag::LongArray(vec![1, 2, 3]));
        inner.insert(
            "names".to_string(),
            Tag::list(vec![Tag::String("a".into()), Tag::String("b".into())]),
        );

        let mut root = Compound::new();
        root.insert("inner".to_string(), Tag::Compound(inner));
        root.insert(
            "empty".to_string(),
            Tag::List {
                element_type: TagType::Int,
                items: vec![],
            },
        );
        root.insert(
            "nested".to_string(),
            Tag::list(vec![Tag::list(vec![Tag::Byte(1)]), Tag::list(vec![Tag::Byte(2)])]),
        );

        let tag = Tag::Compound(root);
        assert_eq!(round_trip(&tag), tag);
    }

    #[test]
    fn test_read_root_from_slice_reports_consumed_bytes() {
        let mut root = Compound::new();
        root.insert("x".to_string(), Tag::Int(5));
        let mut bytes = Tag::Compound(root).to_bytes("").unwrap();
        let encoded_length = bytes.len();
        bytes.extend_from_slice(&[0xAA, 0xBB]);

        let (name, compound, consumed) = Tag::read_root_from_slice(&bytes).unwrap();
        assert_eq!(name, "");
        assert_eq!(consumed, encoded_length);
        assert_eq!(compound.get_int("x").unwrap(), 5);
    }

    #[test]
    fn test_root_must_be_compound() {
        let bytes = Tag::Int(1).to_bytes("").unwrap();
        assert_matches!(Tag::read_root_from_slice(&bytes), Err(NbtError::RootNotCompound));
        assert_matches!(Tag::read_root_from_slice(&[0]), Err(NbtError::RootNotCompound));
    }

    #[test]
    fn test_negative_list_length() {
        // compound "" { list "l" of int, length -1 }
        let bytes = [10, 0, 0, 9, 0, 1, b'l', 3, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_matches!(
            Tag::read_root_from_slice(&bytes),
            Err(NbtError::NegativeListLength(-1))
        );
    }

    #[test]
    fn test_zero_length_list_is_valid() {
        let bytes = [10, 0, 0, 9, 0, 1, b'l', 3, 0, 0, 0, 0, 0];
        let (_, compound, consumed) = Tag::read_root_from_slice(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(compound.get("l").and_then(Tag::as_list).map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_negative_array_length() {
        let bytes = [10, 0, 0, 12, 0, 1, b'a', 0x80, 0, 0, 0];
        assert_matches!(
            Tag::read_root_from_slice(&bytes),
            Err(NbtError::NegativeArrayLength(i32::MIN))
        );
    }

    #[test]
    fn test_invalid_tag_type() {
        let bytes = [10, 0, 0, 42, 0, 0];
        assert_matches!(Tag::read_root_from_slice(&bytes), Err(NbtError::InvalidTagType(42)));
    }

    #[test]
    fn test_truncated_input() {
        let mut root = Compound::new();
        root.insert("value".to_string(), Tag::Long(9));
        let bytes = Tag::Compound(root).to_bytes("").unwrap();
        assert_matches!(
            Tag::read_root_from_slice(&bytes[..bytes.len() - 3]),
            Err(NbtError::Io(_))
        );
    }

    #[test]
    fn test_invalid_utf8_string() {
        let bytes = [10, 0, 0, 8, 0, 1, b's', 0, 2, 0xC3, 0x28, 0];
        assert_matches!(Tag::read_root_from_slice(&bytes), Err(NbtError::InvalidUtf8));
    }

    #[test]
    fn test_heterogeneous_list_is_rejected_on_write() {
        let tag = Tag::List {
            element_type: TagType::Int,
            items: vec![Tag::Int(1), Tag::Byte(2)],
        };
        assert_matches!(tag.to_bytes(""), Err(NbtError::HeterogeneousList));
    }

    #[test]
    fn test_depth_limit() {
        let mut tag = Tag::list(vec![]);
        for _ in 0..(MAX_DEPTH + 2) {
            tag = Tag::list(vec![tag]);
        }
        let bytes = tag.to_bytes("").unwrap();
        assert_matches!(
            Tag::read(&mut Cursor::new(bytes)),
            Err(NbtError::DepthLimitExceeded)
        );
    }

    #[test]
    fn test_compound_field_lookups() {
        let mut compound = Compound::new();
        compound.insert("x".to_string(), Tag::Int(3));
        compound.insert("id".to_string(), Tag::String("minecraft:chest".to_string()));

        assert_eq!(compound.get_int("x").unwrap(), 3);
        assert_eq!(compound.get_string("id").unwrap(), "minecraft:chest");
        assert_matches!(compound.get_int("y"), Err(NbtError::MissingField(field)) if field == "y");
        assert_matches!(compound.get_int("id"), Err(NbtError::MissingField(_)));
        assert_matches!(compound.get_long_array("x"), Err(NbtError::MissingField(_)));
    }
}
