//! The relay client task.
//!
//! A [`RelayClient`] owns the socket on a background task and talks to
//! the presentation layer over channels: [`ClientCommand`]s in,
//! [`ClientEvent`]s out. A second task blocks on the frame reader and
//! forwards everything here, so surfacing rules, echo suppression and the
//! task coordinator all live in one place.

use std::path::PathBuf;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::error::{ConnectionError, ReceiveError};
use crate::net::{self, RelayReader, RelayWriter};
use crate::protocol::{codec, Frame, FrameKind, RasterImage};
use crate::tasks::{TaskCoordinator, TaskReply, TaskRequest};

/// Label shown for our own sends.
pub const LABEL_YOU: &str = "[You] ";
/// Label for broadcast chat text.
pub const LABEL_PEER: &str = "[User] ";
/// Label for relay-directed traffic.
pub const LABEL_RELAY: &str = "[Server] ";
/// Label for frames of unknown kind.
pub const LABEL_OTHER: &str = "[Other] ";

/// Connection and task lifecycle notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The connection died; one reconnect attempt follows.
    ConnectionLost {
        /// Why the reader gave up.
        reason: String,
    },

    /// The reconnect attempt succeeded.
    Reconnected {
        /// The endpoint in `host:port` form.
        addr: String,
    },

    /// The reconnect attempt failed; the client stays disconnected.
    ReconnectFailed {
        /// Why the attempt failed.
        reason: String,
    },

    /// An outgoing payload was dropped.
    SendFailed {
        /// Why nothing was written.
        reason: String,
    },

    /// An armed task aborted without submitting anything.
    TaskFailed {
        /// The input or range problem that stopped it.
        reason: String,
    },
}

/// Events delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A chat line, tagged with its sender label.
    Message {
        /// One of the `LABEL_*` constants.
        label: &'static str,
        /// The line itself, without the label.
        text: String,
    },

    /// An image arrived and was written to disk.
    Image {
        /// Running image number, starting at zero.
        index: u32,
        /// Where the PNG was written.
        path: PathBuf,
    },

    /// Connection or task lifecycle notice.
    Status(StatusEvent),
}

/// Commands accepted by the client task.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    /// Encode `text` as cells of the given kind and send it.
    SendText { kind: FrameKind, text: String },
    /// Frame pre-built cells and send them.
    SendCells { kind: FrameKind, cells: Vec<u8> },
    /// Arm a task on the coordinator.
    StartTask(TaskRequest),
    /// Flush, close the connection and stop the client task.
    Close,
}

/// Cloneable handle used to drive the client task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<ClientCommand>,
}

impl ClientHandle {
    /// Sends ordinary chat text.
    pub fn send_text(&self, text: impl Into<String>) {
        self.send(ClientCommand::SendText {
            kind: FrameKind::Text,
            text: text.into(),
        });
    }

    /// Sends relay-directed text.
    pub fn send_relay(&self, text: impl Into<String>) {
        self.send(ClientCommand::SendText {
            kind: FrameKind::Relay,
            text: text.into(),
        });
    }

    /// Sends text with an explicit frame kind.
    pub fn send_message(&self, kind: FrameKind, text: impl Into<String>) {
        self.send(ClientCommand::SendText {
            kind,
            text: text.into(),
        });
    }

    /// Sends pre-built cells with an explicit frame kind.
    pub fn send_cells(&self, kind: FrameKind, cells: Vec<u8>) {
        self.send(ClientCommand::SendCells { kind, cells });
    }

    /// Arms a task on the coordinator.
    pub fn start_task(&self, request: TaskRequest) {
        self.send(ClientCommand::StartTask(request));
    }

    /// Asks the client task to shut down.
    pub fn close(&self) {
        self.send(ClientCommand::Close);
    }

    fn send(&self, command: ClientCommand) {
        // A dropped client task means shutdown is already underway.
        let _ = self.commands.send(command);
    }
}

/// Suppresses the relay's echo of our own submissions.
///
/// The relay broadcasts every frame back to its sender. The filter keeps
/// the text of the last send; an arrival matching it is hidden. A chat
/// text match consumes the token, so only the first echo is hidden; a
/// relay-kind match keeps it, so repeated relay echoes of the same line
/// all stay quiet.
#[derive(Debug, Default)]
struct EchoFilter {
    last_sent: Option<String>,
}

impl EchoFilter {
    fn note_text_sent(&mut self, text: &str) {
        self.last_sent = Some(text.to_owned());
    }

    /// Cell payloads have no textual echo to match, so the token is
    /// dropped rather than replaced.
    fn note_cells_sent(&mut self) {
        self.last_sent = None;
    }

    fn should_surface(&mut self, kind: FrameKind, text: &str) -> bool {
        match &self.last_sent {
            Some(last) if last == text => {
                if kind == FrameKind::Text {
                    self.last_sent = None;
                }
                false
            }
            _ => true,
        }
    }
}

/// Entry point for a relay session.
pub struct RelayClient;

impl RelayClient {
    /// Connects to the relay and spawns the client task.
    ///
    /// Returns the command handle and the event stream. Only the initial
    /// connection failure is returned as an error; everything after this
    /// point arrives as [`StatusEvent`]s.
    pub async fn connect(
        config: ClientConfig,
    ) -> Result<(ClientHandle, mpsc::UnboundedReceiver<ClientEvent>), ConnectionError> {
        let (reader, writer) = net::connect(&config.host, config.port).await?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();

        spawn_reader(reader, frame_tx.clone());
        let task = ClientTask {
            config,
            writer: Some(writer),
            frames: frame_rx,
            frame_tx,
            commands: command_rx,
            events: event_tx,
            coordinator: TaskCoordinator::new(),
            echo: EchoFilter::default(),
            image_count: 0,
        };
        tokio::spawn(task.run());

        Ok((
            ClientHandle {
                commands: command_tx,
            },
            event_rx,
        ))
    }
}

enum ReaderEvent {
    Frame(Frame),
    Closed(ReceiveError),
}

/// Forwards frames until the connection dies, then reports why and exits.
fn spawn_reader(mut reader: RelayReader, tx: mpsc::UnboundedSender<ReaderEvent>) {
    tokio::spawn(async move {
        loop {
            match reader.read_frame().await {
                Ok(frame) => {
                    if tx.send(ReaderEvent::Frame(frame)).is_err() {
                        return;
                    }
                }
                Err(error) => {
                    let _ = tx.send(ReaderEvent::Closed(error));
                    return;
                }
            }
        }
    });
}

struct ClientTask {
    config: ClientConfig,
    writer: Option<RelayWriter>,
    frames: mpsc::UnboundedReceiver<ReaderEvent>,
    frame_tx: mpsc::UnboundedSender<ReaderEvent>,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
    events: mpsc::UnboundedSender<ClientEvent>,
    coordinator: TaskCoordinator,
    echo: EchoFilter,
    image_count: u32,
}

impl ClientTask {
    async fn run(mut self) {
        loop {
            tokio::select! {
                reader_event = self.frames.recv() => match reader_event {
                    Some(ReaderEvent::Frame(frame)) => self.on_frame(frame).await,
                    Some(ReaderEvent::Closed(error)) => self.on_connection_lost(error).await,
                    None => return,
                },
                command = self.commands.recv() => match command {
                    Some(ClientCommand::SendText { kind, text }) => {
                        self.send_text(kind, text).await;
                    }
                    Some(ClientCommand::SendCells { kind, cells }) => {
                        self.send_cells(kind, cells).await;
                    }
                    Some(ClientCommand::StartTask(request)) => self.coordinator.start(request),
                    Some(ClientCommand::Close) | None => {
                        self.shutdown().await;
                        return;
                    }
                },
            }
        }
    }

    async fn on_frame(&mut self, frame: Frame) {
        match frame {
            Frame::Text(text) => {
                if !text.is_empty() && self.echo.should_surface(FrameKind::Text, &text) {
                    self.emit_message(LABEL_PEER, text);
                }
            }
            Frame::Relay(text) => {
                if !text.is_empty() && self.echo.should_surface(FrameKind::Relay, &text) {
                    self.emit_message(LABEL_RELAY, text.clone());
                }
                // The coordinator sees every relay message, echoes and
                // empties included; several exercises key off our own
                // echoed submissions.
                self.feed_coordinator(&text).await;
            }
            Frame::Image(raster) => self.save_image(raster),
            Frame::Other { kind, text } => {
                if !text.is_empty() && self.echo.should_surface(FrameKind::Other(kind), &text) {
                    self.emit_message(LABEL_OTHER, text);
                }
            }
        }
    }

    async fn feed_coordinator(&mut self, text: &str) {
        match self.coordinator.on_relay_message(text) {
            Ok(Some(TaskReply::Text(reply))) => self.send_text(FrameKind::Relay, reply).await,
            Ok(Some(TaskReply::Cells(cells))) => self.send_cells(FrameKind::Relay, cells).await,
            Ok(None) => {}
            Err(error) => {
                warn!("task aborted: {error}");
                self.emit_status(StatusEvent::TaskFailed {
                    reason: error.to_string(),
                });
            }
        }
    }

    async fn send_text(&mut self, kind: FrameKind, text: String) {
        if text.is_empty() || kind == FrameKind::Image {
            return;
        }
        let frame = match codec::encode_text(kind, &text) {
            Ok(frame) => frame,
            Err(error) => {
                warn!("could not encode message: {error}");
                self.emit_status(StatusEvent::SendFailed {
                    reason: error.to_string(),
                });
                return;
            }
        };
        if self.write_frame(&frame).await {
            self.echo.note_text_sent(&text);
            self.emit_message(LABEL_YOU, text);
        }
    }

    async fn send_cells(&mut self, kind: FrameKind, cells: Vec<u8>) {
        if cells.is_empty() || kind == FrameKind::Image {
            return;
        }
        let frame = match codec::encode_cells(kind, &cells) {
            Ok(frame) => frame,
            Err(error) => {
                warn!("could not frame cells: {error}");
                self.emit_status(StatusEvent::SendFailed {
                    reason: error.to_string(),
                });
                return;
            }
        };
        if self.write_frame(&frame).await {
            self.echo.note_cells_sent();
            self.emit_message(LABEL_YOU, codec::cells_preview(&cells));
        }
    }

    /// Writes one frame. A write failure is reported but does not tear
    /// the session down; the reader notices the dead connection and owns
    /// the reconnect.
    async fn write_frame(&mut self, frame: &[u8]) -> bool {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => {
                self.emit_status(StatusEvent::SendFailed {
                    reason: "not connected".to_string(),
                });
                return false;
            }
        };
        match writer.send_frame(frame).await {
            Ok(()) => true,
            Err(error) => {
                warn!("send failed: {error}");
                self.emit_status(StatusEvent::SendFailed {
                    reason: error.to_string(),
                });
                false
            }
        }
    }

    async fn on_connection_lost(&mut self, error: ReceiveError) {
        warn!("connection lost: {error}");
        self.writer = None;
        self.emit_status(StatusEvent::ConnectionLost {
            reason: error.to_string(),
        });

        // One fresh attempt per failure; no backoff, no retry loop.
        match net::connect(&self.config.host, self.config.port).await {
            Ok((reader, writer)) => {
                spawn_reader(reader, self.frame_tx.clone());
                self.writer = Some(writer);
                self.emit_status(StatusEvent::Reconnected {
                    addr: self.config.addr(),
                });
            }
            Err(error) => {
                warn!("reconnect failed: {error}");
                self.emit_status(StatusEvent::ReconnectFailed {
                    reason: error.to_string(),
                });
            }
        }
    }

    fn save_image(&mut self, raster: RasterImage) {
        let index = self.image_count;
        let path = self.config.image_dir.join(format!("img{index}.png"));

        let (width, height) = (u32::from(raster.width), u32::from(raster.height));
        let buffer = match image::RgbImage::from_raw(width, height, raster.pixels) {
            Some(buffer) => buffer,
            None => {
                warn!("discarding truncated {width}x{height} image frame");
                return;
            }
        };

        if let Err(error) = std::fs::create_dir_all(&self.config.image_dir) {
            warn!(
                "could not create {}: {error}",
                self.config.image_dir.display()
            );
            return;
        }
        match buffer.save(&path) {
            Ok(()) => {
                debug!("image {index} written to {}", path.display());
                self.image_count += 1;
                let _ = self.events.send(ClientEvent::Image { index, path });
            }
            Err(error) => warn!("could not write {}: {error}", path.display()),
        }
    }

    async fn shutdown(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(error) = writer.close().await {
                debug!("close failed: {error}");
            }
        }
    }

    fn emit_message(&self, label: &'static str, text: String) {
        let _ = self.events.send(ClientEvent::Message { label, text });
    }

    fn emit_status(&self, status: StatusEvent) {
        let _ = self.events.send(ClientEvent::Status(status));
    }
}
