use telegraph_ws::WsError;
use thiserror::Error;

/// 宿主程序的主要错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("WebSocket 服务错误: {0}")]
    WebSocketService(#[from] WsError),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("配置文件读写错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}
