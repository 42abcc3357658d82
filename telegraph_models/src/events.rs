// telegraph_models/src/events.rs

//! 委托事件的可序列化表示。
//!
//! `telegraph_ws` 中的委托 trait 以方法调用的形式传递事件；当宿主需要把事件
//! 排队、跨任务传递或以 JSON 形式输出时，就使用本模块中的 `DelegateEvent`
//! 和带元数据的 `EventRecord`。错误在这里只保留其显示文本。

use crate::client::ClientIdentifier;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 五种委托通知的数据镜像。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DelegateEvent {
    /// 服务器已开始在 `host:port` 上监听。
    ServerStarted { host: String, port: u16 },
    /// 服务器已停止；`error` 为 `None` 表示正常停止。
    ServerStopped { error: Option<String> },
    /// 新的客户端会话建立。
    ClientConnected { client_identifier: ClientIdentifier },
    /// 客户端会话结束；`error` 为 `None` 表示正常断开。
    ClientDisconnected {
        client_identifier: ClientIdentifier,
        error: Option<String>,
    },
    /// 收到某个客户端发来的文本。
    TextReceived {
        client_identifier: ClientIdentifier,
        text: String,
    },
}

impl DelegateEvent {
    /// 停止或断开事件是否携带了错误。其他事件恒为 `false`。
    pub fn is_abnormal(&self) -> bool {
        matches!(
            self,
            DelegateEvent::ServerStopped { error: Some(_) }
                | DelegateEvent::ClientDisconnected { error: Some(_), .. }
        )
    }
}

/// 带有唯一 ID 和产生时间戳的事件记录。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventRecord {
    /// UUID v4 文本。
    pub record_id: String,
    /// 事件产生时的 UTC 毫秒时间戳。
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: DelegateEvent,
}

impl EventRecord {
    pub fn new(event: DelegateEvent) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            event,
        }
    }

    /// 序列化为单行 JSON 文本。
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
