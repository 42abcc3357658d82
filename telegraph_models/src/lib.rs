//! `telegraph_models` 公共模型库 crate。
//!
//! 本 crate 集中定义了 `telegraph_ws` 服务端封装库与 `telegraph_host` 宿主程序之间
//! 共享的数据结构：
//! - **客户端标识 (`client`)**: 由服务端签发的不透明会话标识符 `ClientIdentifier`。
//! - **监听地址 (`host`)**: 服务器启动通知携带的 `HostAddress`。
//! - **委托事件 (`events`)**: 五种委托通知的可序列化镜像 `DelegateEvent` 以及带时间戳的 `EventRecord`。
//!
//! 所有模型都派生 `serde::Serialize`/`Deserialize`、`Debug` 和 `Clone`。

pub mod client;
pub mod events;
pub mod host;

pub use client::ClientIdentifier;
pub use events::{DelegateEvent, EventRecord};
pub use host::HostAddress;
