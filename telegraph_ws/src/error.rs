// telegraph_ws/src/error.rs

//! 定义 Telegraph 服务端封装库的错误类型。
//!
//! 同一个 `WsError` 既作为各公开操作的 `Result` 错误类型，也作为委托通知中
//! "异常停止/异常断开" 时携带的可选错误值。

use telegraph_models::ClientIdentifier;
use thiserror::Error;

/// 库的统一错误类型。
#[derive(Error, Debug)]
pub enum WsError {
    /// 当 serde 序列化失败时返回。
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// WebSocket 协议相关的错误，例如握手失败、帧格式不正确、连接被重置等。
    #[error("WebSocket协议错误: {0}")]
    WebSocketProtocolError(#[from] tokio_tungstenite::tungstenite::Error),

    /// 底层 I/O 错误 (绑定监听地址失败、accept 失败等)。
    #[error("I/O错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 当尝试发送消息到一个已关闭的通道时发生。
    #[error("发送错误: 通道已关闭")]
    SendErrorClosed,

    /// 客户端的出站队列已满 (客户端读取过慢)，消息被丢弃。
    #[error("客户端 {0} 的出站队列已满")]
    SendQueueFull(ClientIdentifier),

    /// 指定的客户端不存在或已断开。
    #[error("客户端不存在: {0}")]
    ClientNotFound(ClientIdentifier),

    /// WebSocket 握手在限定时间内没有完成。
    #[error("连接超时")]
    ConnectionTimeout,

    /// 连续 accept 失败的次数达到上限，服务器放弃继续监听。
    #[error("连续 {count} 次接受连接失败，最后一次错误: {last}")]
    AcceptLimitExceeded { count: u32, last: std::io::Error },

    /// 通用消息错误，用于其他未明确分类的错误。
    #[error("消息错误: {0}")]
    Message(String),
}

impl WsError {
    /// 判断一个底层 tungstenite 错误是否只是表示连接已经正常关闭。
    pub(crate) fn is_closed_connection(err: &tokio_tungstenite::tungstenite::Error) -> bool {
        matches!(
            err,
            tokio_tungstenite::tungstenite::Error::ConnectionClosed
                | tokio_tungstenite::tungstenite::Error::AlreadyClosed
        )
    }
}
