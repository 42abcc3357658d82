// telegraph_ws/src/server/connection_manager.rs

//! WebSocket 连接管理。

use crate::error::WsError;
use crate::server::client_session::ClientSession;
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use telegraph_models::ClientIdentifier;

/// 管理所有活动的客户端会话。
///
/// 克隆开销很小 (内部共享同一个 `DashMap`)，宿主可以把克隆交给自己的任务，
/// 用于向客户端发送文本或主动断开客户端。
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    /// Key: 服务端签发的 `ClientIdentifier`
    clients: Arc<DashMap<ClientIdentifier, Arc<ClientSession>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个刚完成握手的会话。
    pub(crate) fn add_client(&self, session: Arc<ClientSession>) {
        info!(
            "[ConnectionManager] 新客户端连接成功: id={}, addr={}",
            session.client_identifier, session.addr
        );
        self.clients
            .insert(session.client_identifier.clone(), session);
        debug!("[ConnectionManager] 当前活动客户端总数: {}", self.clients.len());
    }

    /// 移除一个会话。会话不存在时返回 `None`。
    pub(crate) fn remove_client(&self, client_identifier: &ClientIdentifier) -> Option<Arc<ClientSession>> {
        match self.clients.remove(client_identifier) {
            Some((_id, session)) => {
                info!(
                    "[ConnectionManager] 客户端断开连接: id={}, addr={}, 在线时长={}s",
                    session.client_identifier,
                    session.addr,
                    (chrono::Utc::now() - session.creation_time).num_seconds()
                );
                debug!("[ConnectionManager] 移除后当前活动客户端总数: {}", self.clients.len());
                Some(session)
            }
            None => {
                warn!("[ConnectionManager] 尝试移除不存在的客户端: id={}", client_identifier);
                None
            }
        }
    }

    pub fn get_client(&self, client_identifier: &ClientIdentifier) -> Option<Arc<ClientSession>> {
        self.clients
            .get(client_identifier)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// 当前所有在线客户端的标识符快照。
    pub fn client_identifiers(&self) -> Vec<ClientIdentifier> {
        self.clients.iter().map(|entry| entry.key().clone()).collect()
    }

    /// 向指定客户端发送一条文本消息。
    pub async fn send_text(
        &self,
        client_identifier: &ClientIdentifier,
        text: impl Into<String>,
    ) -> Result<(), WsError> {
        // 先克隆出会话再 await，避免跨 await 持有 DashMap 的分片锁
        let session = self
            .get_client(client_identifier)
            .ok_or_else(|| WsError::ClientNotFound(client_identifier.clone()))?;
        session.send_text(text.into()).await
    }

    /// `send_text` 的非阻塞版本：客户端出站队列已满时返回 `SendQueueFull` 而不是等待。
    ///
    /// 适合在不能被单个慢客户端拖住的循环里使用。
    pub fn try_send_text(
        &self,
        client_identifier: &ClientIdentifier,
        text: impl Into<String>,
    ) -> Result<(), WsError> {
        let session = self
            .get_client(client_identifier)
            .ok_or_else(|| WsError::ClientNotFound(client_identifier.clone()))?;
        session.try_send_text(text.into())
    }

    /// 把 `payload` 序列化为 JSON 文本后发送给指定客户端。
    pub async fn send_json<T: Serialize>(
        &self,
        client_identifier: &ClientIdentifier,
        payload: &T,
    ) -> Result<(), WsError> {
        let text = serde_json::to_string(payload)
            .map_err(|e| WsError::SerializationError(format!("序列化出站载荷失败: {}", e)))?;
        self.send_text(client_identifier, text).await
    }

    /// 请求断开指定客户端。断开完成后委托会收到不带错误的断开通知。
    pub fn disconnect_client(&self, client_identifier: &ClientIdentifier) -> Result<(), WsError> {
        let session = self
            .get_client(client_identifier)
            .ok_or_else(|| WsError::ClientNotFound(client_identifier.clone()))?;
        info!("[ConnectionManager] 请求断开客户端: id={}", client_identifier);
        session.request_close();
        Ok(())
    }
}
