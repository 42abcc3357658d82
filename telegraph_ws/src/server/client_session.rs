// telegraph_ws/src/server/client_session.rs

use crate::error::WsError;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use telegraph_models::ClientIdentifier;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::Message;

/// 代表一个已完成 WebSocket 握手的客户端会话。
///
/// 会话由连接处理任务创建并登记到 `ConnectionManager`；宿主通过管理器找到会话后，
/// 可以向它排队发送文本，或请求关闭连接。真正的网络读写都在连接处理任务中完成。
#[derive(Debug)]
pub struct ClientSession {
    /// 服务端签发的会话标识符。
    pub client_identifier: ClientIdentifier,

    /// 客户端的网络源地址。
    pub addr: SocketAddr,

    /// 会话创建时间 (UTC)。
    pub creation_time: DateTime<Utc>,

    /// 出站消息队列的发送端，由该连接的发送任务消费。
    sender: mpsc::Sender<Message>,

    /// 关闭信号。置为 `true` 后，连接处理任务会发送 Close 帧并结束会话。
    close_signal: watch::Sender<bool>,
}

impl ClientSession {
    pub(crate) fn new(
        client_identifier: ClientIdentifier,
        addr: SocketAddr,
        sender: mpsc::Sender<Message>,
        close_signal: watch::Sender<bool>,
    ) -> Self {
        Self {
            client_identifier,
            addr,
            creation_time: Utc::now(),
            sender,
            close_signal,
        }
    }

    /// 把一条文本消息放入出站队列。队列满时等待。
    pub async fn send_text(&self, text: String) -> Result<(), WsError> {
        self.sender
            .send(Message::Text(text))
            .await
            .map_err(|_| WsError::SendErrorClosed)
    }

    /// 不等待地把文本放入出站队列；队列已满时立即返回 `SendQueueFull`。
    pub fn try_send_text(&self, text: String) -> Result<(), WsError> {
        self.sender.try_send(Message::Text(text)).map_err(|e| match e {
            TrySendError::Full(_) => WsError::SendQueueFull(self.client_identifier.clone()),
            TrySendError::Closed(_) => WsError::SendErrorClosed,
        })
    }

    /// 请求关闭此会话。重复调用无副作用。
    pub fn request_close(&self) {
        self.close_signal.send_replace(true);
    }
}
