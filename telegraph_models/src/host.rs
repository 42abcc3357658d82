// telegraph_models/src/host.rs

//! 服务器监听地址模型。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 服务器启动通知中携带的监听地址：主机文本和端口号。
///
/// 这里不做任何校验，`host` 按原样透传 (可以是 IP、主机名或 "0.0.0.0")。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAddress {
    pub host: String,
    pub port: u16,
}

impl HostAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_host_and_port() {
        let addr = HostAddress::new("127.0.0.1", 8088);
        assert_eq!(addr.to_string(), "127.0.0.1:8088");
    }
}
