//! TCP plumbing for the relay connection.
//!
//! The connection is split into owned halves so the frame reader can live
//! on its own task while the client keeps the writer. Framing is strict:
//! any read error or magic mismatch poisons the stream, and the reader
//! must be dropped rather than resumed.

use std::io;

use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::error::{ConnectionError, ReceiveError};
use crate::protocol::{codec, Frame, FrameKind};

/// Reading half of a relay connection.
pub struct RelayReader {
    reader: BufReader<OwnedReadHalf>,
    peer_addr: String,
}

/// Writing half of a relay connection.
pub struct RelayWriter {
    writer: BufWriter<OwnedWriteHalf>,
    peer_addr: String,
}

/// Connects to the relay at `host:port`.
pub async fn connect(host: &str, port: u16) -> Result<(RelayReader, RelayWriter), ConnectionError> {
    let addr = format!("{host}:{port}");
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| ConnectionError::Connect {
            addr: addr.clone(),
            source,
        })?;
    debug!("connected to {addr}");
    Ok(split_stream(stream))
}

/// Wraps an already established stream, e.g. an accepted test connection.
pub fn split_stream(stream: TcpStream) -> (RelayReader, RelayWriter) {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let (read_half, write_half) = stream.into_split();
    (
        RelayReader {
            reader: BufReader::new(read_half),
            peer_addr: peer_addr.clone(),
        },
        RelayWriter {
            writer: BufWriter::new(write_half),
            peer_addr,
        },
    )
}

impl RelayReader {
    /// Reads the next frame off the wire.
    ///
    /// Image frames carry their dimensions where textual frames carry the
    /// character count; everything else about the header is shared.
    pub async fn read_frame(&mut self) -> Result<Frame, ReceiveError> {
        let mut magic = [0u8; 3];
        self.reader.read_exact(&mut magic).await?;
        codec::decode_header(magic)?;

        let kind = codec::decode_type(self.reader.read_u8().await?);
        match kind {
            FrameKind::Image => {
                let width = self.reader.read_u8().await?;
                let height = self.reader.read_u8().await?;
                let mut pixels = vec![0u8; width as usize * height as usize * 3];
                self.reader.read_exact(&mut pixels).await?;
                Ok(Frame::Image(codec::decode_image(width, height, &pixels)))
            }
            FrameKind::Text => Ok(Frame::Text(self.read_cell_text().await?)),
            FrameKind::Relay => Ok(Frame::Relay(self.read_cell_text().await?)),
            FrameKind::Other(kind) => Ok(Frame::Other {
                kind,
                text: self.read_cell_text().await?,
            }),
        }
    }

    async fn read_cell_text(&mut self) -> Result<String, ReceiveError> {
        let mut length = [0u8; 2];
        self.reader.read_exact(&mut length).await?;
        let count = codec::decode_length(length) as usize;
        let mut payload = vec![0u8; count * codec::CELL_BYTES];
        self.reader.read_exact(&mut payload).await?;
        Ok(codec::decode_text(&payload))
    }

    /// Address of the connected relay.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl RelayWriter {
    /// Writes a complete frame and flushes it out.
    pub async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.writer.write_all(frame).await?;
        self.writer.flush().await
    }

    /// Flushes and shuts down the write side.
    pub async fn close(&mut self) -> io::Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await
    }

    /// Address of the connected relay.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FramingError;
    use tokio::net::TcpListener;

    async fn connected_pair() -> ((RelayReader, RelayWriter), (RelayReader, RelayWriter)) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client_task =
            tokio::spawn(async move { connect("127.0.0.1", addr.port()).await.unwrap() });

        let (stream, _) = listener.accept().await.unwrap();
        let server = split_stream(stream);
        let client = client_task.await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn test_text_frame_round_trip() {
        let ((mut client_reader, mut client_writer), (mut server_reader, mut server_writer)) =
            connected_pair().await;

        let frame = codec::encode_text(FrameKind::Text, "hello \u{e9}").unwrap();
        client_writer.send_frame(&frame).await.unwrap();
        assert_eq!(
            server_reader.read_frame().await.unwrap(),
            Frame::Text("hello \u{e9}".to_string())
        );

        let frame = codec::encode_text(FrameKind::Relay, "task shift encode 3").unwrap();
        server_writer.send_frame(&frame).await.unwrap();
        assert_eq!(
            client_reader.read_frame().await.unwrap(),
            Frame::Relay("task shift encode 3".to_string())
        );
    }

    #[tokio::test]
    async fn test_consecutive_frames() {
        let ((mut reader, _client_writer), (_server_reader, mut writer)) = connected_pair().await;

        for i in 0..10 {
            let frame = codec::encode_text(FrameKind::Text, &format!("msg{i}")).unwrap();
            writer.send_frame(&frame).await.unwrap();
        }
        for i in 0..10 {
            assert_eq!(
                reader.read_frame().await.unwrap(),
                Frame::Text(format!("msg{i}"))
            );
        }
    }

    #[tokio::test]
    async fn test_image_frame() {
        let ((mut reader, _client_writer), (_server_reader, mut writer)) = connected_pair().await;

        let pixels: Vec<u8> = (0..12).collect();
        let mut frame = b"ISCi".to_vec();
        frame.push(2);
        frame.push(2);
        frame.extend_from_slice(&pixels);
        writer.send_frame(&frame).await.unwrap();

        let received = match reader.read_frame().await.unwrap() {
            Frame::Image(image) => image,
            other => panic!("expected image, got {other:?}"),
        };
        assert_eq!(received.width, 2);
        assert_eq!(received.height, 2);
        assert_eq!(received.pixels, pixels);
    }

    #[tokio::test]
    async fn test_unknown_kind_decodes_as_text() {
        let ((mut reader, _client_writer), (_server_reader, mut writer)) = connected_pair().await;

        let frame = codec::encode_text(FrameKind::Other(b'z'), "q").unwrap();
        writer.send_frame(&frame).await.unwrap();

        assert_eq!(
            reader.read_frame().await.unwrap(),
            Frame::Other {
                kind: b'z',
                text: "q".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_bad_magic_is_fatal() {
        let ((mut reader, _client_writer), (_server_reader, mut writer)) = connected_pair().await;

        writer.send_frame(b"XYZt\x00\x00").await.unwrap();
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(
            err,
            ReceiveError::Framing(FramingError::BadMagic(magic)) if &magic == b"XYZ"
        ));
    }

    #[tokio::test]
    async fn test_peer_close_is_io_error() {
        let ((mut reader, _client_writer), server) = connected_pair().await;
        drop(server);

        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, ReceiveError::Io(_)));
    }
}
