// telegraph_ws/src/server/transport.rs

//! 服务端 WebSocket 监听、握手与单连接读写循环。
//!
//! 帧的编解码完全交给 `tokio-tungstenite`；本模块只负责把底层连接事件
//! 翻译成委托通知：握手成功 → `client_did_connect`，文本帧 → `did_receive_text`，
//! 会话结束 → `client_did_disconnect`。

use crate::delegate::TelegraphDelegate;
use crate::error::WsError;
use crate::server::client_session::ClientSession;
use crate::server::connection_manager::ConnectionManager;
use crate::server::options::ServerOptions;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use telegraph_models::ClientIdentifier;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

/// `WsStream` 是一个类型别名，代表经过 WebSocket 握手后的 TCP 流。
pub type WsStream = WebSocketStream<TcpStream>;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// 新 TCP 连接的来源。
pub(crate) trait Acceptor: Send + 'static {
    fn accept_connection(
        &mut self,
    ) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Acceptor for TcpListener {
    fn accept_connection(
        &mut self,
    ) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        self.accept()
    }
}

/// 监听循环所需的全部状态。
pub(crate) struct AcceptLoop<A> {
    pub acceptor: A,
    pub delegate: Arc<dyn TelegraphDelegate>,
    pub manager: ConnectionManager,
    pub options: ServerOptions,
}

impl<A: Acceptor> AcceptLoop<A> {
    /// 持续接受新连接，直到 `shutdown_rx` 发生变化 (或其发送端被丢弃)，
    /// 或连续 accept 失败次数达到上限。
    ///
    /// 返回前会通知所有会话关闭并等待它们的处理任务结束，
    /// 因此调用方拿到返回值时，所有客户端的断开通知都已经发出。
    pub(crate) async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), WsError> {
        let AcceptLoop {
            mut acceptor,
            delegate,
            manager,
            options,
        } = self;

        // 内部停止信号：无论正常停止还是异常退出，都通过它让连接任务收尾
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections: JoinSet<()> = JoinSet::new();
        let mut consecutive_failures: u32 = 0;

        let result = loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("[TelegraphServer] 收到停止请求，不再接受新连接。");
                    break Ok(());
                }
                accepted = acceptor.accept_connection() => match accepted {
                    Ok((tcp_stream, peer_addr)) => {
                        consecutive_failures = 0;
                        debug!("[TelegraphServer] 从 {} 接受了新的 TCP 连接", peer_addr);
                        connections.spawn(handle_connection(
                            tcp_stream,
                            peer_addr,
                            Arc::clone(&delegate),
                            manager.clone(),
                            options.clone(),
                            stop_rx.clone(),
                        ));
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        error!(
                            "[TelegraphServer] 接受 TCP 连接失败 (连续第 {} 次): {}",
                            consecutive_failures, e
                        );
                        if options.accept_error_limit > 0 && consecutive_failures >= options.accept_error_limit {
                            break Err(WsError::AcceptLimitExceeded {
                                count: consecutive_failures,
                                last: e,
                            });
                        }
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!("[TelegraphServer] 连接处理任务异常结束: {}", e);
                    }
                }
            }
        };

        drop(acceptor);
        stop_tx.send_replace(true);
        if !connections.is_empty() {
            info!(
                "[TelegraphServer] 正在关闭 {} 个仍在处理中的连接...",
                connections.len()
            );
        }
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!("[TelegraphServer] 连接处理任务异常结束: {}", e);
            }
        }
        result
    }
}

/// 处理单个 TCP 连接的完整生命周期。
async fn handle_connection(
    tcp_stream: TcpStream,
    peer_addr: SocketAddr,
    delegate: Arc<dyn TelegraphDelegate>,
    manager: ConnectionManager,
    options: ServerOptions,
    mut stop_rx: watch::Receiver<bool>,
) {
    let handshake = tokio::time::timeout(options.handshake_timeout, accept_async(tcp_stream));
    let ws_stream: WsStream = tokio::select! {
        _ = stop_rx.changed() => {
            debug!("[TelegraphServer] 服务器停止时 {} 仍在握手，放弃该连接", peer_addr);
            return;
        }
        res = handshake => match res {
            Ok(Ok(ws_stream)) => ws_stream,
            Ok(Err(e)) => {
                warn!("[TelegraphServer] 与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                return;
            }
            Err(_) => {
                warn!(
                    "[TelegraphServer] 与 {} 的 WebSocket 握手超时 ({:?})",
                    peer_addr, options.handshake_timeout
                );
                return;
            }
        }
    };

    let client_identifier = ClientIdentifier::generate();
    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let (out_tx, out_rx) = mpsc::channel::<Message>(options.outbound_buffer.max(1));
    let (close_tx, mut close_rx) = watch::channel(false);
    let session = Arc::new(ClientSession::new(
        client_identifier.clone(),
        peer_addr,
        out_tx,
        close_tx,
    ));

    manager.add_client(Arc::clone(&session));
    delegate.client_did_connect(&client_identifier);

    let mut sender_task = tokio::spawn(run_sender(client_identifier.clone(), ws_sender, out_rx));
    let mut sender_finished = false;

    // None 表示正常结束
    let outcome: Option<WsError> = loop {
        tokio::select! {
            _ = close_rx.changed() => {
                info!("[TelegraphServer] 客户端 {}: 宿主请求断开。", client_identifier);
                break None;
            }
            _ = stop_rx.changed() => {
                debug!("[TelegraphServer] 客户端 {}: 服务器停止，关闭会话。", client_identifier);
                break None;
            }
            joined = &mut sender_task, if !sender_finished => {
                sender_finished = true;
                match joined {
                    Ok(Ok(())) => break None,
                    Ok(Err(e)) => break Some(e),
                    Err(join_err) => break Some(WsError::Message(format!("发送任务异常结束: {}", join_err))),
                }
            }
            frame = ws_receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    debug!("[TelegraphServer] 客户端 {}: 收到文本 ({} 字节)", client_identifier, text.len());
                    delegate.did_receive_text(&client_identifier, &text);
                }
                Some(Ok(Message::Close(close_frame))) => {
                    debug!("[TelegraphServer] 客户端 {}: 收到 Close 帧: {:?}", client_identifier, close_frame);
                    break None;
                }
                Some(Ok(Message::Binary(bin))) => {
                    debug!(
                        "[TelegraphServer] 客户端 {}: 忽略二进制消息 ({} 字节)",
                        client_identifier,
                        bin.len()
                    );
                }
                // Ping/Pong 由 tungstenite 自动应答
                Some(Ok(_)) => {}
                Some(Err(e)) if WsError::is_closed_connection(&e) => break None,
                Some(Err(e)) => break Some(WsError::WebSocketProtocolError(e)),
                None => break None,
            }
        }
    };

    manager.remove_client(&client_identifier);
    // 丢弃最后一个出站发送端后，发送任务会发出 Close 帧并退出
    drop(session);
    if !sender_finished {
        match tokio::time::timeout(options.close_timeout, &mut sender_task).await {
            Ok(Ok(Err(e))) => debug!("[TelegraphServer] 客户端 {}: 关闭连接时出错: {}", client_identifier, e),
            Ok(_) => {}
            Err(_) => {
                warn!(
                    "[TelegraphServer] 客户端 {}: 等待发送任务结束超时，强制终止。",
                    client_identifier
                );
                sender_task.abort();
            }
        }
    }
    drop(ws_receiver);

    match &outcome {
        None => info!("[TelegraphServer] 客户端 {} ({}) 已断开。", client_identifier, peer_addr),
        Some(e) => warn!(
            "[TelegraphServer] 客户端 {} ({}) 异常断开: {}",
            client_identifier, peer_addr, e
        ),
    }
    delegate.client_did_disconnect(&client_identifier, outcome.as_ref());
}

/// 把出站队列中的消息写入 WebSocket。队列关闭后发送 Close 帧。
///
/// 连接已被关闭导致的写失败视为正常结束。
async fn run_sender(
    client_identifier: ClientIdentifier,
    mut ws_sender: SplitSink<WsStream, Message>,
    mut out_rx: mpsc::Receiver<Message>,
) -> Result<(), WsError> {
    while let Some(message) = out_rx.recv().await {
        match ws_sender.send(message).await {
            Ok(()) => {}
            Err(e) if WsError::is_closed_connection(&e) => {
                debug!("[SenderTask {}] 连接已关闭，停止发送。", client_identifier);
                return Ok(());
            }
            Err(e) => {
                error!("[SenderTask {}] 发送消息失败: {}", client_identifier, e);
                return Err(e.into());
            }
        }
    }

    debug!("[SenderTask {}] 出站队列已关闭，发送 Close 帧。", client_identifier);
    match ws_sender.close().await {
        Ok(()) => Ok(()),
        Err(e) if WsError::is_closed_connection(&e) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
