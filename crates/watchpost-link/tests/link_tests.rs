//! End-to-end tests for the device link against a local echo endpoint.
//!
//! The echo server stands in for the device-control endpoint: every text
//! frame it receives is sent straight back, and a client close frame is
//! answered in kind.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use watchpost_link::{DeviceLink, LinkError, LinkState};
use watchpost_types::LinkConfig;

/// Spawn a WebSocket echo server on an ephemeral local port.
async fn spawn_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind echo server");
    let addr = listener.local_addr().expect("echo server addr");

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let ws = match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => return,
                };
                let (mut sink, mut source) = ws.split();
                while let Some(Ok(msg)) = source.next().await {
                    match msg {
                        Message::Text(t) => {
                            if sink.send(Message::Text(t)).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(frame) => {
                            let _ = sink.send(Message::Close(frame)).await;
                            break;
                        }
                        _ => {}
                    }
                }
            });
        }
    });

    addr
}

fn config_for(addr: SocketAddr) -> LinkConfig {
    LinkConfig::new(addr.ip().to_string(), addr.port())
        .expect("valid link config")
        .with_connect_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn connect_reaches_open() {
    let addr = spawn_echo_server().await;
    let link = DeviceLink::connect(&config_for(addr))
        .await
        .expect("connect to echo server");
    assert_eq!(link.state(), LinkState::Open);

    // Debug output reports the link state.
    assert!(format!("{link:?}").contains("Open"));
}

#[tokio::test]
async fn echo_round_trip_delivers_exact_payload_once() {
    let addr = spawn_echo_server().await;
    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    link.start(move |payload| {
        let _ = tx.send(payload);
    });

    link.send("lidar LDA0 open").await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("reply within timeout")
        .expect("handler delivered a payload");
    assert_eq!(reply, "lidar LDA0 open");

    // Exactly once: nothing else arrives.
    let extra = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(extra.is_err(), "handler must be invoked exactly once");
}

#[tokio::test]
async fn inbound_frames_arrive_in_send_order() {
    let addr = spawn_echo_server().await;
    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    link.start(move |payload| {
        let _ = tx.send(payload);
    });

    let lines = ["lidar LDA0 open", "camera CMA1 open", "lidar LDA0 close"];
    for line in lines {
        link.send(line).await.unwrap();
    }

    for expected in lines {
        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("reply within timeout")
            .expect("payload");
        assert_eq!(got, expected);
    }
}

#[tokio::test]
async fn start_replaces_previous_handler() {
    let addr = spawn_echo_server().await;
    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();

    let (old_tx, mut old_rx) = mpsc::unbounded_channel();
    link.start(move |payload| {
        let _ = old_tx.send(payload);
    });

    let (new_tx, mut new_rx) = mpsc::unbounded_channel();
    link.start(move |payload| {
        let _ = new_tx.send(payload);
    });

    link.send("camera CMA1 start_record").await.unwrap();

    let got = tokio::time::timeout(Duration::from_secs(2), new_rx.recv())
        .await
        .expect("reply within timeout")
        .expect("payload");
    assert_eq!(got, "camera CMA1 start_record");

    // Replacing the handler drops the old closure, closing its channel;
    // a `None` result means it was never handed a payload.
    let stale = tokio::time::timeout(Duration::from_millis(200), old_rx.recv()).await;
    assert!(
        matches!(stale, Ok(None)),
        "replaced handler must not receive deliveries, got: {stale:?}"
    );
}

#[tokio::test]
async fn stop_closes_link_and_send_fails_after() {
    let addr = spawn_echo_server().await;
    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();

    link.stop().await.unwrap();
    link.wait_for_state(LinkState::Closed, Duration::from_secs(2))
        .await
        .expect("link reaches Closed after stop");

    let result = link.send("lidar LDA0 open").await;
    assert!(
        matches!(result, Err(LinkError::SendAfterClose { .. })),
        "send after stop must fail, got: {result:?}"
    );

    // stop is idempotent on a closed link.
    link.stop().await.unwrap();
}

#[tokio::test]
async fn remote_close_transitions_to_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // A server that accepts the handshake and immediately closes.
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                let _ = ws.close(None).await;
            }
        }
    });

    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();
    link.wait_for_state(LinkState::Closed, Duration::from_secs(2))
        .await
        .expect("remote close must surface as Closed");

    assert!(matches!(
        link.send("lidar LDA0 open").await,
        Err(LinkError::SendAfterClose { .. })
    ));
}

#[tokio::test]
async fn unreachable_endpoint_fails_with_typed_error() {
    // Bind and drop a listener so the port is very likely unbound.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = config_for(addr);
    let result = tokio::time::timeout(Duration::from_secs(5), DeviceLink::connect(&config)).await;

    let err = result
        .expect("connect must resolve within the configured timeout")
        .expect_err("connect to an unbound port must fail");
    assert!(
        matches!(
            err,
            LinkError::ConnectFailed { .. } | LinkError::ConnectTimeout { .. }
        ),
        "expected a typed connection error, got: {err}"
    );
}

#[tokio::test]
async fn malformed_binary_frame_is_skipped_and_link_keeps_delivering() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // On the first frame from the client, reply with an invalid-UTF-8
    // binary frame followed by a valid text frame, then hold the
    // connection open until the client closes it.
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                let (mut sink, mut source) = ws.split();
                let mut cued = false;
                while let Some(Ok(msg)) = source.next().await {
                    match msg {
                        Message::Text(_) if !cued => {
                            cued = true;
                            let _ = sink
                                .send(Message::Binary(vec![0xff, 0xfe, 0xfd].into()))
                                .await;
                            let _ = sink.send(Message::Text("lidar LDA0 open".into())).await;
                        }
                        Message::Close(frame) => {
                            let _ = sink.send(Message::Close(frame)).await;
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });

    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    link.start(move |payload| {
        let _ = tx.send(payload);
    });

    link.send("lidar LDA0 open").await.unwrap();

    // Only the valid text frame reaches the handler.
    let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("reply within timeout")
        .expect("payload");
    assert_eq!(got, "lidar LDA0 open");

    let extra = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(
        extra.is_err(),
        "malformed frame must be skipped, not delivered"
    );

    // The link survives the malformed frame.
    assert_eq!(link.state(), LinkState::Open);
    link.send("camera CMA1 close").await.unwrap();
}

#[tokio::test]
async fn frames_before_start_are_dropped_not_fatal() {
    let addr = spawn_echo_server().await;
    let link = DeviceLink::connect(&config_for(addr)).await.unwrap();

    // No handler installed yet; the echo of this send is dropped.
    link.send("lidar LDA0 open").await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // The link is still healthy and later frames reach a new handler.
    let (tx, mut rx) = mpsc::unbounded_channel();
    link.start(move |payload| {
        let _ = tx.send(payload);
    });
    link.send("camera CMA1 close").await.unwrap();

    let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("reply within timeout")
        .expect("payload");
    assert_eq!(got, "camera CMA1 close");
}
