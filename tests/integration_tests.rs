//! Integration tests for the relay client.
//!
//! Each test stands up a local TCP listener that plays the relay: frames
//! the client writes are read back with the same codec, and scripted
//! relay traffic drives the echo filter, the task coordinator and image
//! persistence end to end.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use iscat::client::{
    ClientEvent, ClientHandle, RelayClient, StatusEvent, LABEL_PEER, LABEL_RELAY, LABEL_YOU,
};
use iscat::command::{self, Action};
use iscat::config::ClientConfig;
use iscat::crypto::{digest_hex, vigenere_encode};
use iscat::net::{self, RelayReader, RelayWriter};
use iscat::protocol::{codec, Frame, FrameKind};
use iscat::tasks::{CipherDirection, HashMode, TaskRequest};

const WAIT: Duration = Duration::from_secs(5);

/// A connected client plus the relay's side of the socket.
struct TestSession {
    listener: TcpListener,
    addr: String,
    handle: ClientHandle,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    relay_reader: RelayReader,
    relay_writer: RelayWriter,
    image_dir: tempfile::TempDir,
}

async fn start_session() -> TestSession {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let image_dir = tempfile::tempdir().unwrap();

    let mut config = ClientConfig::new("127.0.0.1", port);
    config.image_dir = image_dir.path().to_path_buf();
    let addr = config.addr();

    let connect = tokio::spawn(RelayClient::connect(config));
    let (socket, _) = listener.accept().await.unwrap();
    let (relay_reader, relay_writer) = net::split_stream(socket);
    let (handle, events) = connect.await.unwrap().unwrap();

    TestSession {
        listener,
        addr,
        handle,
        events,
        relay_reader,
        relay_writer,
        image_dir,
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("no event within the deadline")
        .expect("event channel closed")
}

async fn next_frame(reader: &mut RelayReader) -> Frame {
    timeout(WAIT, reader.read_frame())
        .await
        .expect("no frame within the deadline")
        .expect("relay-side read failed")
}

async fn relay_says(session: &mut TestSession, kind: FrameKind, text: &str) {
    let frame = codec::encode_text(kind, text).unwrap();
    session.relay_writer.send_frame(&frame).await.unwrap();
}

#[tokio::test]
async fn test_chat_text_reaches_relay_and_back() {
    let mut session = start_session().await;

    session.handle.send_text("hello everyone");
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_YOU,
            text: "hello everyone".to_string(),
        }
    );
    assert_eq!(
        next_frame(&mut session.relay_reader).await,
        Frame::Text("hello everyone".to_string())
    );

    // Another user's line surfaces under the chat label.
    relay_says(&mut session, FrameKind::Text, "welcome").await;
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_PEER,
            text: "welcome".to_string(),
        }
    );
}

#[tokio::test]
async fn test_own_echo_is_hidden_once() {
    let mut session = start_session().await;

    session.handle.send_text("mine");
    let _ = next_event(&mut session.events).await;
    let _ = next_frame(&mut session.relay_reader).await;

    // The relay echoes our line back, then someone else repeats it.
    relay_says(&mut session, FrameKind::Text, "mine").await;
    relay_says(&mut session, FrameKind::Text, "mine").await;
    relay_says(&mut session, FrameKind::Text, "done").await;

    // Only the second copy surfaces, followed by the sentinel.
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_PEER,
            text: "mine".to_string(),
        }
    );
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_PEER,
            text: "done".to_string(),
        }
    );
}

#[tokio::test]
async fn test_shift_task_driven_by_relay_traffic() {
    let mut session = start_session().await;

    // Submitting a task announcement arms the task and sends the line
    // as relay-kind text.
    let directive = command::interpret("task shift encode 7");
    session.handle.start_task(directive.armed.unwrap());
    match directive.action {
        Action::Send { kind, text } => session.handle.send_message(kind, text),
        other => panic!("expected a send, got {other:?}"),
    }

    assert_eq!(
        next_frame(&mut session.relay_reader).await,
        Frame::Relay("task shift encode 7".to_string())
    );
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_YOU,
            text: "task shift encode 7".to_string(),
        }
    );

    // The relay echoes the announcement (carrying the key), then sends
    // the payload to encode.
    relay_says(&mut session, FrameKind::Relay, "task shift encode 7").await;
    relay_says(&mut session, FrameKind::Relay, "hello").await;

    // The payload surfaces; the echo stays hidden.
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_RELAY,
            text: "hello".to_string(),
        }
    );

    // "hello" shifted by 7 comes back on the wire and is mirrored locally.
    assert_eq!(
        next_frame(&mut session.relay_reader).await,
        Frame::Relay("olssv".to_string())
    );
    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Message {
            label: LABEL_YOU,
            text: "olssv".to_string(),
        }
    );
}

#[tokio::test]
async fn test_hash_verify_task_submits_verdict() {
    let mut session = start_session().await;
    session.handle.start_task(TaskRequest::Hash(HashMode::Verify));

    relay_says(&mut session, FrameKind::Relay, "verify this").await;
    relay_says(&mut session, FrameKind::Relay, "payload").await;
    let digest = digest_hex("payload");
    relay_says(&mut session, FrameKind::Relay, &digest).await;

    assert_eq!(
        next_frame(&mut session.relay_reader).await,
        Frame::Relay("True".to_string())
    );
}

#[tokio::test]
async fn test_key_exchange_over_relay() {
    let mut session = start_session().await;
    session.handle.start_task(TaskRequest::Dh);

    // The opening prompt makes the client publish its parameters.
    relay_says(&mut session, FrameKind::Relay, "let us exchange keys").await;
    let params = match next_frame(&mut session.relay_reader).await {
        Frame::Relay(text) => text,
        other => panic!("expected parameters, got {other:?}"),
    };
    let (p_text, g_text) = params.split_once(',').unwrap();
    let p: u64 = p_text.parse().unwrap();
    let g: u64 = g_text.parse().unwrap();
    assert!(p > 2);

    // Echo the parameters, then play the peer with exponent 11.
    relay_says(&mut session, FrameKind::Relay, &params).await;
    let peer_partial = mod_pow_u64(g, 11, p);
    relay_says(&mut session, FrameKind::Relay, &peer_partial.to_string()).await;

    let own_partial = match next_frame(&mut session.relay_reader).await {
        Frame::Relay(text) => text.parse::<u64>().unwrap(),
        other => panic!("expected a partial key, got {other:?}"),
    };

    // The echo of the client's partial key triggers the confirmation,
    // which must equal the secret computed on the peer's side.
    relay_says(&mut session, FrameKind::Relay, &own_partial.to_string()).await;
    let confirmed = match next_frame(&mut session.relay_reader).await {
        Frame::Relay(text) => text.parse::<u64>().unwrap(),
        other => panic!("expected the shared secret, got {other:?}"),
    };
    assert_eq!(confirmed, mod_pow_u64(own_partial, 11, p));
}

/// Square-and-multiply, local to the tests so the exchange is checked
/// against independent arithmetic.
fn mod_pow_u64(base: u64, mut exponent: u64, modulus: u64) -> u64 {
    let mut result: u128 = 1;
    let mut base = u128::from(base) % u128::from(modulus);
    let modulus = u128::from(modulus);
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exponent >>= 1;
    }
    result as u64
}

#[tokio::test]
async fn test_task_abort_reports_status() {
    let mut session = start_session().await;
    session
        .handle
        .start_task(TaskRequest::Shift(CipherDirection::Encode));

    relay_says(&mut session, FrameKind::Relay, "no digits anywhere").await;
    relay_says(&mut session, FrameKind::Relay, "payload").await;

    // Both lines surface, then the abort notice lands.
    let _ = next_event(&mut session.events).await;
    let _ = next_event(&mut session.events).await;
    match next_event(&mut session.events).await {
        ClientEvent::Status(StatusEvent::TaskFailed { reason }) => {
            assert!(reason.contains("anywhere"));
        }
        other => panic!("expected a task failure, got {other:?}"),
    }

    // The aborted task sends nothing; a later chat line still flows.
    session.handle.send_text("still here");
    assert_eq!(
        next_frame(&mut session.relay_reader).await,
        Frame::Text("still here".to_string())
    );
}

#[tokio::test]
async fn test_received_image_saved_as_png() {
    let mut session = start_session().await;

    // 2x2 RGB raster; the dimension bytes sit where text frames carry
    // their character count.
    let pixels: Vec<u8> = vec![
        255, 0, 0, 0, 255, 0, //
        0, 0, 255, 255, 255, 255,
    ];
    let mut frame = Vec::from(*b"ISCi");
    frame.push(2);
    frame.push(2);
    frame.extend_from_slice(&pixels);
    session.relay_writer.send_frame(&frame).await.unwrap();

    let (index, path) = match next_event(&mut session.events).await {
        ClientEvent::Image { index, path } => (index, path),
        other => panic!("expected an image event, got {other:?}"),
    };
    assert_eq!(index, 0);
    assert!(path.starts_with(session.image_dir.path()));
    assert!(path.ends_with("img0.png"));

    let saved = image::open(&path).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (2, 2));
    assert_eq!(saved.as_raw().as_slice(), pixels.as_slice());
}

#[tokio::test]
async fn test_reader_reconnects_after_relay_drop() {
    let mut session = start_session().await;

    // Sever the relay side; the client notices and dials back in.
    drop(session.relay_reader);
    drop(session.relay_writer);

    match next_event(&mut session.events).await {
        ClientEvent::Status(StatusEvent::ConnectionLost { .. }) => {}
        other => panic!("expected a connection loss, got {other:?}"),
    }

    let (socket, _) = timeout(WAIT, session.listener.accept())
        .await
        .expect("no reconnect within the deadline")
        .unwrap();
    let (mut relay_reader, _relay_writer) = net::split_stream(socket);

    assert_eq!(
        next_event(&mut session.events).await,
        ClientEvent::Status(StatusEvent::Reconnected {
            addr: session.addr.clone(),
        })
    );

    // Traffic flows over the fresh connection.
    session.handle.send_text("back again");
    assert_eq!(
        next_frame(&mut relay_reader).await,
        Frame::Text("back again".to_string())
    );
}

#[test]
fn test_local_crypto_matches_wire_cipher() {
    let directive = command::interpret("/crypto vigenere encode attack lemon");
    let lines = match directive.action {
        Action::Crypto(lines) => lines,
        other => panic!("expected crypto output, got {other:?}"),
    };
    assert_eq!(lines[0], "vigenere encode attack lemon");
    assert_eq!(
        lines[1],
        codec::cells_preview(&vigenere_encode("attack", "lemon"))
    );
}
