use byteorder::BigEndian;
use futures::{SinkExt, StreamExt};
use strata_common::{BlockPosition, ChunkPosition};
use strata_protocol::packets::{ChunkDataPacket, LoginSuccessPacket, SetCompressionPacket};
use strata_protocol::{encode_packet, Frame, Packet, PacketBuffer, PacketFrameCodec};
use strata_world::chunk::NUM_BIOMES;
use strata_world::{BlockId, BlockRegistry, Chunk, Section};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use uuid::Uuid;

pub const USERNAME: &str = "Steve";

/// Server side of one test connection.
pub struct FakeServer {
    pub framed: Framed<TcpStream, PacketFrameCodec>,
}

/// Binds an ephemeral port and returns it with the listener.
pub async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

impl FakeServer {
    pub async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().await.unwrap();
        FakeServer {
            framed: Framed::new(stream, PacketFrameCodec::new()),
        }
    }

    pub async fn send<P: Packet>(&mut self, packet: &P) {
        self.framed.send(encode_packet(packet).unwrap()).await.unwrap();
    }

    pub async fn send_raw(&mut self, packet: Vec<u8>) {
        self.framed.send(packet).await.unwrap();
    }

    /// Writes bytes straight to the socket, bypassing the frame encoder.
    pub async fn send_bytes(&mut self, bytes: &[u8]) {
        self.framed.get_mut().write_all(bytes).await.unwrap();
    }

    /// Reads one serverbound packet and returns its id with the body.
    pub async fn receive(&mut self) -> (i32, PacketBuffer) {
        let packet = match self.framed.next().await.unwrap().unwrap() {
            Frame::Packet(packet) => packet,
            Frame::Corrupt(reason) => panic!("corrupt frame from client: {}", reason),
        };
        let mut buffer = PacketBuffer::from_bytes(packet);
        let id = buffer.read_varint().unwrap();
        (id, buffer)
    }

    /// Reads the handshake and login start, returning the protocol version
    /// and the username.
    pub async fn expect_login_start(&mut self) -> (i32, String) {
        let (id, mut handshake) = self.receive().await;
        assert_eq!(id, 0x00);
        let protocol_version = handshake.read_varint().unwrap();
        handshake.read_string().unwrap();
        handshake.read_u16::<BigEndian>().unwrap();
        assert_eq!(handshake.read_varint().unwrap(), 2);

        let (id, mut login_start) = self.receive().await;
        assert_eq!(id, 0x00);
        (protocol_version, login_start.read_string().unwrap())
    }

    /// Enables compression on both ends and completes the login.
    pub async fn accept_login(&mut self, threshold: i32) {
        self.send(&SetCompressionPacket { threshold }).await;
        self.framed.codec_mut().set_compression_threshold(threshold);
        self.send(&LoginSuccessPacket {
            uuid: Uuid::from_u128(0x1234),
            username: USERNAME.to_string(),
        })
        .await;
    }
}

/// A full chunk with the given blocks, positioned relative to the chunk.
pub fn chunk_packet(
    position: ChunkPosition,
    blocks: &[(BlockPosition, BlockId)],
    registry: &BlockRegistry,
) -> ChunkDataPacket {
    let mut chunk = Chunk::default();
    for (block, id) in blocks {
        chunk.set_block_id(*block, *id, registry).unwrap();
    }
    let sections: Vec<(usize, Section)> = chunk
        .sections()
        .iter()
        .cloned()
        .enumerate()
        .filter(|(_, section)| !section.is_empty())
        .collect();

    ChunkDataPacket {
        position,
        full_chunk: true,
        ignore_old_data: true,
        heightmap: chunk.heightmap().clone(),
        biomes: Some(vec![1; NUM_BIOMES]),
        sections,
        block_entities: vec![],
        palette_misses: 0,
    }
}
