//! The WebSocket link against a local server: gate, request encoding,
//! frame delivery and disconnect reporting.

use chanview::app::AppEvent;
use chanview::channel::{await_ready, ChannelId, FetchRequest, ReadyPolicy};
use chanview::transport::{connect, spawn_link, Endpoints};
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

async fn next_event(rx: &mut mpsc::Receiver<AppEvent>) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within 5s")
        .expect("event channel open")
}

#[tokio::test]
async fn test_request_and_reply_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let Some(Ok(Message::Text(request))) = ws.next().await else {
            panic!("expected a text request");
        };
        ws.send(Message::Text(
            r#"[{"Title":"T1","Link":"http://x/1","Description":"D1"}]"#.into(),
        ))
        .await
        .unwrap();
        ws.close(None).await.unwrap();
        request.as_str().to_owned()
    });

    let endpoints = Endpoints::from_page_url(&format!("http://{addr}/channels/5")).unwrap();
    let socket = connect(endpoints.ws_url()).await.unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let link = spawn_link(socket, 1, tx);

    link.send(FetchRequest {
        channel_id: ChannelId::new(5).unwrap(),
        offset: 0,
        filter: String::new(),
    })
    .unwrap();

    match next_event(&mut rx).await {
        AppEvent::Frame { link, payload } => {
            assert_eq!(link, 1);
            let items = chanview::channel::decode_items(&payload).unwrap();
            assert_eq!(items[0].title, "T1");
        }
        _ => panic!("expected a frame"),
    }
    match next_event(&mut rx).await {
        AppEvent::Disconnected { link, .. } => assert_eq!(link, 1),
        _ => panic!("expected a disconnect"),
    }

    assert_eq!(
        server.await.unwrap(),
        r#"{"Id":5,"Offset":0,"Filter":""}"#
    );
}

#[tokio::test]
async fn test_gate_waits_for_late_server() {
    // Reserve a port, then free it so the first attempts are refused.
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let endpoints = Endpoints::from_page_url(&format!("http://{addr}/")).unwrap();

    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let policy = ReadyPolicy::new(Duration::from_millis(50), Some(Duration::from_secs(5)));
    let url = endpoints.ws_url();
    let socket = await_ready(policy, || connect(url)).await;
    assert!(socket.is_ok());
    server.await.unwrap();
}
