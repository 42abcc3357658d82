//! 宿主运行循环：启动内嵌服务器，消费委托事件，直到收到停止信号或服务器异常停止。

use crate::config::AppConfig;
use crate::error::AppError;
use log::{info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use telegraph_models::{DelegateEvent, EventRecord};
use telegraph_ws::{ChannelDelegate, ConnectionManager, ServerHandle, TelegraphServer, WsError};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct HostRunner {
    handle: ServerHandle,
    events: UnboundedReceiver<EventRecord>,
    echo_text: bool,
}

enum Exit {
    Shutdown,
    Stopped(Result<(), WsError>),
}

impl HostRunner {
    /// 按配置启动服务器。
    pub async fn start(config: &AppConfig) -> Result<Self, AppError> {
        let (delegate, events) = ChannelDelegate::new();
        let server = TelegraphServer::with_options(Arc::new(delegate), config.server.to_options());
        let handle = server.start(&config.server.host, config.server.port).await?;
        info!(
            "[HostRunner] 服务器已启动: {} (回显: {})",
            handle.host_address(),
            config.echo_text
        );
        Ok(Self {
            handle,
            events,
            echo_text: config.echo_text,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// 运行直到 `shutdown` 完成或服务器自行停止。每个事件记录都会交给 `on_record`，
    /// 包括停止过程中产生的断开与停止事件。
    pub async fn run_until<F, R>(self, shutdown: F, mut on_record: R) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
        R: FnMut(&EventRecord),
    {
        let HostRunner {
            mut handle,
            mut events,
            echo_text,
        } = self;
        let connections = handle.connections();
        tokio::pin!(shutdown);

        let exit = loop {
            tokio::select! {
                Some(record) = events.recv() => {
                    // 回显不能等待：读得慢的客户端不应拖住这个循环
                    if echo_text {
                        echo(&connections, &record.event);
                    }
                    note_abnormal(&record.event);
                    on_record(&record);
                }
                result = handle.wait() => break Exit::Stopped(result),
                _ = &mut shutdown => break Exit::Shutdown,
            }
        };

        let result = match exit {
            Exit::Shutdown => {
                info!("[HostRunner] 收到停止信号，正在停止服务器...");
                handle.stop().await
            }
            Exit::Stopped(result) => result,
        };

        // 停止过程中产生的事件
        while let Ok(record) = events.try_recv() {
            note_abnormal(&record.event);
            on_record(&record);
        }

        result.map_err(AppError::from)
    }
}

/// 出站队列已满时丢弃这条回显。
fn echo(connections: &ConnectionManager, event: &DelegateEvent) {
    if let DelegateEvent::TextReceived {
        client_identifier,
        text,
    } = event
    {
        if let Err(e) = connections.try_send_text(client_identifier, text.clone()) {
            warn!("[HostRunner] 回显给客户端 {} 失败: {}", client_identifier, e);
        }
    }
}

fn note_abnormal(event: &DelegateEvent) {
    if event.is_abnormal() {
        warn!("[HostRunner] 异常事件: {:?}", event);
    }
}
