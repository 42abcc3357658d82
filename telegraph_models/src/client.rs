// telegraph_models/src/client.rs

//! 客户端标识符模型。

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 服务端为每个已连接的客户端会话签发的不透明标识符。
///
/// 标识符的内容对宿主应用没有任何结构含义：只允许做相等比较、哈希和显示，
/// 不应尝试解析其中的文本。序列化时表现为一个普通字符串。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ClientIdentifier(String);

impl ClientIdentifier {
    /// 生成一个新的、全局唯一的标识符 (UUID v4 文本)。
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ClientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ClientIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for ClientIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
