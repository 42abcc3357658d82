//! `telegraph_ws` 是一个内嵌 WebSocket 服务器的事件封装库。
//!
//! 宿主应用实现 [`TelegraphDelegate`] (五个方法都可选)，交给 [`TelegraphServer`]
//! 启动后即可收到服务器启停、客户端连接/断开以及文本消息事件。
//!
//! 主要模块包括：
//! - `delegate`: 委托 trait 本身。
//! - `callbacks`: 以可选闭包字段实现委托的 `DelegateCallbacks`。
//! - `channel`: 把事件转发到 tokio 通道的 `ChannelDelegate`。
//! - `error`: 统一错误类型 `WsError`。
//! - `server`: 服务器、连接管理与传输层。

pub mod callbacks;
pub mod channel;
pub mod delegate;
pub mod error;
pub mod server;

pub use callbacks::DelegateCallbacks;
pub use channel::ChannelDelegate;
pub use delegate::{NoopDelegate, TelegraphDelegate};
pub use error::WsError;
pub use server::connection_manager::ConnectionManager;
pub use server::options::ServerOptions;
pub use server::service::{ServerHandle, TelegraphServer};
pub use telegraph_models::{ClientIdentifier, HostAddress};
