// telegraph_ws/src/server/mod.rs

//! WebSocket 服务端模块。
//!
//! - `service`: 对外入口 `TelegraphServer` 与运行期句柄 `ServerHandle`。
//! - `transport`: 监听循环与单连接读写，负责在合适的时机调用委托。
//! - `connection_manager` / `client_session`: 在线会话登记，供宿主发送文本或主动断开。
//! - `options`: 超时、队列容量等运行参数。

pub mod client_session;
pub mod connection_manager;
pub mod options;
pub mod service;
pub mod transport;
