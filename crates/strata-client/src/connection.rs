use crate::config::ClientConfig;
use crate::handler::PacketHandler;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use strata_common::{Result, StrataError};
use strata_logger::Logger;
use strata_protocol::packets::{
    HandshakePacket, LoginDisconnectPacket, LoginStartPacket, LoginSuccessPacket, NextState,
    SetCompressionPacket, ENCRYPTION_REQUEST_ID,
};
use strata_protocol::{
    encode_packet, ClientboundPacket, DecodeContext, DecodeError, Frame, Packet, PacketBuffer,
    PacketFrameCodec,
};
use strata_world::BlockRegistry;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// A framed connection to a server.
pub struct Connection {
    framed: Framed<TcpStream, PacketFrameCodec>,
    registry: Arc<BlockRegistry>,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("framed", &self.framed)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub async fn connect(
        address: &str,
        registry: Arc<BlockRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        let stream = TcpStream::connect(address).await.map_err(|err| {
            StrataError::ConnectionError(format!("Failed to connect to {}: {}", address, err))
        })?;
        logger.info(&format!("Connected to {}", address));
        Ok(Self::from_stream(stream, registry, logger))
    }

    pub fn from_stream(
        stream: TcpStream,
        registry: Arc<BlockRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Connection {
            framed: Framed::new(stream, PacketFrameCodec::new()),
            registry,
            logger,
        }
    }

    pub async fn send<P: Packet>(&mut self, packet: &P) -> Result<()> {
        let bytes = encode_packet(packet)?;
        self.send_raw(bytes).await
    }

    /// Sends an already encoded packet id and body.
    pub async fn send_raw(&mut self, packet: Vec<u8>) -> Result<()> {
        self.framed.send(packet).await?;
        Ok(())
    }

    /// Next frame, or `None` once the server has closed the connection.
    pub async fn receive(&mut self) -> Result<Option<Frame>> {
        match self.framed.next().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(err)) => Err(err.into()),
            None => Ok(None),
        }
    }

    /// Runs the offline-mode login sequence and leaves the connection in the
    /// play state.
    pub async fn login(&mut self, config: &ClientConfig) -> Result<LoginSuccessPacket> {
        self.send(&HandshakePacket {
            protocol_version: config.protocol_version,
            server_address: config.host.clone(),
            server_port: config.port,
            next_state: NextState::Login,
        })
        .await?;
        self.send(&LoginStartPacket {
            username: config.username.clone(),
        })
        .await?;

        loop {
            let frame = self.receive().await?.ok_or_else(|| {
                StrataError::ConnectionError("Server closed the connection during login".to_string())
            })?;
            let packet = match frame {
                Frame::Packet(packet) => packet,
                Frame::Corrupt(reason) => {
                    return Err(StrataError::ConnectionError(format!(
                        "Corrupt frame during login: {}",
                        reason
                    )))
                }
            };
            let mut buffer = PacketBuffer::from_bytes(packet);
            let id = buffer.read_varint().map_err(DecodeError::from)?;
            let context = DecodeContext::new(&self.registry, self.logger.as_ref());

            if id == LoginDisconnectPacket::packet_id() {
                let packet = LoginDisconnectPacket::read_from_buffer(&mut buffer, &context)?;
                return Err(StrataError::ConnectionError(format!(
                    "Login refused: {}",
                    packet.reason
                )));
            } else if id == ENCRYPTION_REQUEST_ID {
                return Err(StrataError::ConnectionError(
                    "Server requires online-mode authentication".to_string(),
                ));
            } else if id == SetCompressionPacket::packet_id() {
                let packet = SetCompressionPacket::read_from_buffer(&mut buffer, &context)?;
                self.framed
                    .codec_mut()
                    .set_compression_threshold(packet.threshold);
                self.logger.debug(&format!(
                    "Compression threshold set to {}",
                    packet.threshold
                ));
            } else if id == LoginSuccessPacket::packet_id() {
                let packet = LoginSuccessPacket::read_from_buffer(&mut buffer, &context)?;
                self.logger.info(&format!(
                    "Logged in as {} ({})",
                    packet.username, packet.uuid
                ));
                return Ok(packet);
            } else {
                self.logger
                    .debug(&format!("Ignoring login packet {:#04x}", id));
            }
        }
    }

    /// Feeds every play-state frame to `handler` and sends back its
    /// responses until the server disconnects. Each frame is decoded and
    /// applied on the blocking pool.
    pub async fn run(&mut self, mut handler: PacketHandler) -> Result<PacketHandler> {
        while let Some(frame) = self.receive().await? {
            let (returned, outcome) = tokio::task::spawn_blocking(move || {
                let outcome = handler.handle_frame(frame);
                (handler, outcome)
            })
            .await
            .map_err(|err| {
                StrataError::ConnectionError(format!("Packet handler failed: {}", err))
            })?;
            handler = returned;

            if let Some(response) = outcome? {
                self.send_raw(response).await?;
            }
        }
        self.logger.info("Server closed the connection");
        Ok(handler)
    }
}
