use crate::buffer::{PacketBuffer, VARINT_MAX_BYTES};
use bytes::{Buf, BufMut, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use tokio_util::codec::{Decoder, Encoder};

/// Largest frame a three byte length prefix can describe.
pub const MAX_FRAME_LENGTH: usize = 2_097_151;

/// Largest packet a compressed frame may expand to.
pub const MAX_PACKET_LENGTH: usize = 8_388_608;

/// One length-delimited frame read off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Packet id followed by the packet body.
    Packet(Vec<u8>),
    /// A frame whose body could not be decompressed. Its bytes have been
    /// consumed, so the stream stays aligned on the next frame.
    Corrupt(String),
}

/// Splits the TCP stream into packets (packet id plus body) and joins them
/// back together.
///
/// Every frame starts with its length as a VarInt. Once compression is
/// enabled the frame body begins with a second VarInt, the uncompressed
/// length, which is zero when the rest of the frame is sent as is.
///
/// Only a broken length prefix is a stream error. A frame with a bad body
/// decodes to [`Frame::Corrupt`].
#[derive(Debug, Default, Clone)]
pub struct PacketFrameCodec {
    compression_threshold: Option<usize>,
}

impl PacketFrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a threshold from a Set Compression packet. Negative values
    /// turn compression off.
    pub fn set_compression_threshold(&mut self, threshold: i32) {
        self.compression_threshold = usize::try_from(threshold).ok();
    }

    pub fn compression_threshold(&self) -> Option<usize> {
        self.compression_threshold
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Reads a VarInt from the front of `bytes` without consuming it. `None`
/// while more bytes are needed.
fn peek_varint(bytes: &[u8]) -> io::Result<Option<(i32, usize)>> {
    let mut value = 0u32;
    for (index, byte) in bytes.iter().take(VARINT_MAX_BYTES).enumerate() {
        value |= ((byte & 0x7F) as u32) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(Some((value as i32, index + 1)));
        }
    }
    if bytes.len() >= VARINT_MAX_BYTES {
        return Err(invalid_data("Frame length prefix is too long".to_string()));
    }
    Ok(None)
}

fn decompress(frame: &[u8]) -> io::Result<Vec<u8>> {
    let mut buffer = PacketBuffer::from_bytes(frame.to_vec());
    let data_length = buffer.read_length()?;
    if data_length == 0 {
        return Ok(buffer.unread().to_vec());
    }
    if data_length > MAX_PACKET_LENGTH {
        return Err(invalid_data(format!(
            "Compressed packet claims {} bytes, limit is {}",
            data_length, MAX_PACKET_LENGTH
        )));
    }

    let mut packet = Vec::with_capacity(data_length);
    ZlibDecoder::new(buffer.unread())
        .take(MAX_PACKET_LENGTH as u64 + 1)
        .read_to_end(&mut packet)?;
    if packet.len() != data_length {
        return Err(invalid_data(format!(
            "Compressed packet expanded to {} bytes, expected {}",
            packet.len(),
            data_length
        )));
    }
    Ok(packet)
}

impl Decoder for PacketFrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        let (length, header) = match peek_varint(&src[..])? {
            Some(prefix) => prefix,
            None => return Ok(None),
        };
        let length = usize::try_from(length)
            .ok()
            .filter(|length| *length <= MAX_FRAME_LENGTH)
            .ok_or_else(|| invalid_data(format!("Invalid frame length: {}", length)))?;

        if src.len() < header + length {
            src.reserve(header + length - src.len());
            return Ok(None);
        }

        src.advance(header);
        let frame = src.split_to(length);
        let frame = match self.compression_threshold {
            None => Frame::Packet(frame.to_vec()),
            Some(_) => match decompress(&frame) {
                Ok(packet) => Frame::Packet(packet),
                Err(err) => Frame::Corrupt(err.to_string()),
            },
        };
        Ok(Some(frame))
    }
}

impl Encoder<Vec<u8>> for PacketFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, packet: Vec<u8>, dst: &mut BytesMut) -> io::Result<()> {
        let body = match self.compression_threshold {
            None => packet,
            Some(threshold) => {
                let mut body = PacketBuffer::new();
                if packet.len() >= threshold {
                    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(&packet)?;
                    body.write_varint(packet.len() as i32);
                    body.write_bytes(&encoder.finish()?);
                } else {
                    body.write_varint(0);
                    body.write_bytes(&packet);
                }
                body.into_inner()
            }
        };

        if body.len() > MAX_FRAME_LENGTH {
            return Err(invalid_data(format!("Frame of {} bytes is too long", body.len())));
        }

        let mut header = PacketBuffer::new();
        header.write_varint(body.len() as i32);
        dst.reserve(header.as_bytes().len() + body.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(&body);
        Ok(())
    }
}
