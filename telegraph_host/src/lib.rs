//! `telegraph_host` 宿主程序核心库。
//!
//! 把 `telegraph_ws` 内嵌服务器包装成一个独立可运行的宿主：
//! - `config`: 配置文件的加载、创建与全局访问。
//! - `error`: 宿主程序的错误类型。
//! - `logging`: 基于 env_logger 的日志初始化。
//! - `runner`: 启动服务器、消费委托事件并在停止信号到来时优雅退出。

pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
