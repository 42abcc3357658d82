// telegraph_ws/src/server/options.rs

use std::time::Duration;

/// 每个客户端出站队列的默认容量。
pub const DEFAULT_OUTBOUND_BUFFER: usize = 32;
/// WebSocket 握手的默认超时时间。
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// 会话结束时等待发送任务冲刷 Close 帧的默认时长。
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
/// 允许的连续 accept 失败次数，超过后服务器异常停止。
pub const DEFAULT_ACCEPT_ERROR_LIMIT: u32 = 16;

/// 服务器运行参数。
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub handshake_timeout: Duration,
    pub close_timeout: Duration,
    pub outbound_buffer: usize,
    /// 为 0 时不设上限，accept 失败只记录日志。
    pub accept_error_limit: u32,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            accept_error_limit: DEFAULT_ACCEPT_ERROR_LIMIT,
        }
    }
}
