// telegraph_ws/tests/server_transport_integration_test.rs

use futures_util::{SinkExt, StreamExt};
use log::{info, LevelFilter};
use std::sync::Arc;
use std::time::Duration;
use telegraph_models::{ClientIdentifier, DelegateEvent};
use telegraph_ws::{ChannelDelegate, ServerHandle, ServerOptions, TelegraphServer, WsError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TungsteniteMessage};

type ClientStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// 辅助函数：初始化日志，仅用于测试，避免多次初始化
fn init_test_logger() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

async fn next_event(rx: &mut UnboundedReceiver<telegraph_models::EventRecord>) -> DelegateEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("等待委托事件超时")
        .expect("事件通道意外关闭")
        .event
}

async fn start_server() -> (ServerHandle, UnboundedReceiver<telegraph_models::EventRecord>) {
    init_test_logger();
    let (delegate, rx) = ChannelDelegate::new();
    let server = TelegraphServer::new(Arc::new(delegate));
    let handle = server.start("127.0.0.1", 0).await.expect("服务器启动失败");
    (handle, rx)
}

async fn connect(handle: &ServerHandle) -> ClientStream {
    let url = format!("ws://{}", handle.local_addr());
    info!("[Test Main] 客户端尝试连接到: {}", url);
    let (stream, response) = connect_async(url).await.expect("客户端连接失败");
    info!("[Test Main] 客户端连接成功，服务器响应状态: {}", response.status());
    stream
}

async fn expect_connected(rx: &mut UnboundedReceiver<telegraph_models::EventRecord>) -> ClientIdentifier {
    match next_event(rx).await {
        DelegateEvent::ClientConnected { client_identifier } => client_identifier,
        other => panic!("预期 ClientConnected，实际收到: {:?}", other),
    }
}

/// 读取客户端收到的下一条非 Ping/Pong 消息。
async fn next_client_message(client: &mut ClientStream) -> Option<TungsteniteMessage> {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("等待服务端消息超时");
        match next {
            Some(Ok(TungsteniteMessage::Ping(_))) | Some(Ok(TungsteniteMessage::Pong(_))) => continue,
            Some(Ok(msg)) => return Some(msg),
            Some(Err(_)) | None => return None,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_reports_the_bound_port() {
    let (handle, mut rx) = start_server().await;

    match next_event(&mut rx).await {
        DelegateEvent::ServerStarted { host, port } => {
            assert_eq!(host, "127.0.0.1");
            assert_ne!(port, 0, "应报告系统实际分配的端口");
            assert_eq!(port, handle.local_addr().port());
        }
        other => panic!("预期 ServerStarted，实际收到: {:?}", other),
    }
    assert_eq!(handle.host_address().port, handle.local_addr().port());

    handle.stop().await.expect("停止服务器失败");
    assert_eq!(next_event(&mut rx).await, DelegateEvent::ServerStopped { error: None });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connect_text_and_close_are_reported_in_order() {
    let (handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    let mut client = connect(&handle).await;
    let id = expect_connected(&mut rx).await;
    assert_eq!(handle.client_identifiers(), vec![id.clone()]);

    client
        .send(TungsteniteMessage::Text("Hello from client!".to_string()))
        .await
        .expect("客户端发送消息失败");
    assert_eq!(
        next_event(&mut rx).await,
        DelegateEvent::TextReceived {
            client_identifier: id.clone(),
            text: "Hello from client!".to_string(),
        }
    );

    // 二进制消息不产生委托事件
    client
        .send(TungsteniteMessage::Binary(vec![1, 2, 3]))
        .await
        .expect("客户端发送二进制消息失败");
    client.close(None).await.expect("客户端关闭失败");

    assert_eq!(
        next_event(&mut rx).await,
        DelegateEvent::ClientDisconnected {
            client_identifier: id,
            error: None,
        }
    );
    assert!(handle.client_identifiers().is_empty());

    handle.stop().await.expect("停止服务器失败");
    assert_eq!(next_event(&mut rx).await, DelegateEvent::ServerStopped { error: None });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn send_text_reaches_the_client() {
    let (handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    let mut client = connect(&handle).await;
    let id = expect_connected(&mut rx).await;

    handle.send_text(&id, "server push").await.expect("服务端发送失败");
    assert_eq!(
        next_client_message(&mut client).await,
        Some(TungsteniteMessage::Text("server push".to_string()))
    );

    let ghost = ClientIdentifier::from("not-a-client");
    assert!(matches!(
        handle.send_text(&ghost, "lost").await,
        Err(WsError::ClientNotFound(_))
    ));

    handle.stop().await.expect("停止服务器失败");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn host_requested_disconnect_is_clean() {
    let (handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    let mut client = connect(&handle).await;
    let id = expect_connected(&mut rx).await;

    handle.disconnect_client(&id).expect("断开请求失败");

    assert!(matches!(
        next_client_message(&mut client).await,
        Some(TungsteniteMessage::Close(_)) | None
    ));
    assert_eq!(
        next_event(&mut rx).await,
        DelegateEvent::ClientDisconnected {
            client_identifier: id,
            error: None,
        }
    );

    handle.stop().await.expect("停止服务器失败");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_tcp_without_close_is_reported_with_error() {
    let (handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    let client = connect(&handle).await;
    let id = expect_connected(&mut rx).await;

    // 不经过关闭握手直接丢弃连接
    drop(client);

    match next_event(&mut rx).await {
        DelegateEvent::ClientDisconnected {
            client_identifier,
            error,
        } => {
            assert_eq!(client_identifier, id);
            assert!(error.is_some(), "未完成关闭握手的断开应携带错误");
        }
        other => panic!("预期 ClientDisconnected，实际收到: {:?}", other),
    }

    handle.stop().await.expect("停止服务器失败");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_disconnects_clients_before_reporting_stop() {
    let (handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    let mut first = connect(&handle).await;
    let first_id = expect_connected(&mut rx).await;
    let mut second = connect(&handle).await;
    let second_id = expect_connected(&mut rx).await;

    handle.stop().await.expect("停止服务器失败");

    let mut disconnected = Vec::new();
    for _ in 0..2 {
        match next_event(&mut rx).await {
            DelegateEvent::ClientDisconnected {
                client_identifier,
                error: None,
            } => disconnected.push(client_identifier),
            other => panic!("预期正常的 ClientDisconnected，实际收到: {:?}", other),
        }
    }
    disconnected.sort();
    let mut expected = vec![first_id, second_id];
    expected.sort();
    assert_eq!(disconnected, expected);

    assert_eq!(next_event(&mut rx).await, DelegateEvent::ServerStopped { error: None });

    assert!(matches!(
        next_client_message(&mut first).await,
        Some(TungsteniteMessage::Close(_)) | None
    ));
    assert!(matches!(
        next_client_message(&mut second).await,
        Some(TungsteniteMessage::Close(_)) | None
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bind_failure_returns_error_without_events() {
    let (handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    let (delegate, mut second_rx) = ChannelDelegate::new();
    let second = TelegraphServer::new(Arc::new(delegate));
    let result = second.start("127.0.0.1", handle.local_addr().port()).await;

    assert!(matches!(result, Err(WsError::IoError(_))));
    assert!(second_rx.try_recv().is_err(), "绑定失败时不应产生任何委托事件");

    handle.stop().await.expect("停止服务器失败");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_and_stalled_handshakes_produce_no_events() {
    init_test_logger();
    let (delegate, mut rx) = ChannelDelegate::new();
    let options = ServerOptions {
        handshake_timeout: Duration::from_millis(200),
        ..ServerOptions::default()
    };
    let server = TelegraphServer::with_options(Arc::new(delegate), options);
    let handle = server.start("127.0.0.1", 0).await.expect("服务器启动失败");
    let _started = next_event(&mut rx).await;

    // 普通 HTTP 请求，没有 Upgrade 头
    let mut plain_http = TcpStream::connect(handle.local_addr()).await.expect("TCP 连接失败");
    plain_http
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .expect("写入失败");
    let mut garbage = TcpStream::connect(handle.local_addr()).await.expect("TCP 连接失败");
    garbage.write_all(b"\x16\x03\x01 not http\r\n\r\n").await.expect("写入失败");
    // 连上之后一个字节也不发，等待握手超时
    let _idle = TcpStream::connect(handle.local_addr()).await.expect("TCP 连接失败");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err(), "未完成握手的连接不应产生委托事件");
    assert!(handle.client_identifiers().is_empty());

    // 服务器仍然可以接受正常客户端
    let mut client = connect(&handle).await;
    let id = expect_connected(&mut rx).await;
    client
        .send(TungsteniteMessage::Text("after failures".to_string()))
        .await
        .expect("客户端发送消息失败");
    assert_eq!(
        next_event(&mut rx).await,
        DelegateEvent::TextReceived {
            client_identifier: id.clone(),
            text: "after failures".to_string(),
        }
    );

    handle.stop().await.expect("停止服务器失败");
    assert_eq!(
        next_event(&mut rx).await,
        DelegateEvent::ClientDisconnected {
            client_identifier: id,
            error: None,
        }
    );
    assert_eq!(next_event(&mut rx).await, DelegateEvent::ServerStopped { error: None });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wait_can_be_cancelled_and_resumed() {
    let (mut handle, mut rx) = start_server().await;
    let _started = next_event(&mut rx).await;

    for _ in 0..3 {
        tokio::select! {
            result = handle.wait() => panic!("服务器不应自行停止: {:?}", result),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
    }

    // 被取消的 wait 不影响服务器继续工作
    let mut client = connect(&handle).await;
    let id = expect_connected(&mut rx).await;
    handle.send_text(&id, "still serving").await.expect("服务端发送失败");
    assert_eq!(
        next_client_message(&mut client).await,
        Some(TungsteniteMessage::Text("still serving".to_string()))
    );

    handle.stop().await.expect("停止服务器失败");
    assert!(matches!(
        next_event(&mut rx).await,
        DelegateEvent::ClientDisconnected { error: None, .. }
    ));
    assert_eq!(next_event(&mut rx).await, DelegateEvent::ServerStopped { error: None });
}
