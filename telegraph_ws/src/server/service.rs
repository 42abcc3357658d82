// telegraph_ws/src/server/service.rs

//! 对外的服务器入口：`TelegraphServer` 负责启动，`ServerHandle` 负责运行期控制与停止。

use crate::delegate::TelegraphDelegate;
use crate::error::WsError;
use crate::server::connection_manager::ConnectionManager;
use crate::server::options::ServerOptions;
use crate::server::transport::{AcceptLoop, Acceptor};
use log::{error, info};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use telegraph_models::{ClientIdentifier, HostAddress};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 内嵌 WebSocket 服务器，把连接事件转发给一个 `TelegraphDelegate`。
pub struct TelegraphServer {
    delegate: Arc<dyn TelegraphDelegate>,
    options: ServerOptions,
}

impl TelegraphServer {
    pub fn new(delegate: Arc<dyn TelegraphDelegate>) -> Self {
        Self::with_options(delegate, ServerOptions::default())
    }

    pub fn with_options(delegate: Arc<dyn TelegraphDelegate>, options: ServerOptions) -> Self {
        Self { delegate, options }
    }

    /// 绑定 `host:port` 并在后台开始接受连接。
    ///
    /// 绑定失败时直接返回错误，委托不会收到任何通知。绑定成功后委托先收到
    /// `server_did_start(host, 实际端口)`，`port` 为 0 时报告的是系统分配的端口。
    pub async fn start(&self, host: &str, port: u16) -> Result<ServerHandle, WsError> {
        info!("[TelegraphServer] 正在启动，监听地址: {}:{}", host, port);
        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            error!("[TelegraphServer] 绑定 {}:{} 失败: {}", host, port, e);
            WsError::IoError(e)
        })?;
        let local_addr = listener.local_addr()?;
        info!("[TelegraphServer] WebSocket 服务器正在监听地址: {}", local_addr);
        Ok(self.launch(listener, host, local_addr))
    }

    /// 通知委托服务器已启动，并在后台任务中运行监听循环。
    pub(crate) fn launch<A: Acceptor>(
        &self,
        acceptor: A,
        host: &str,
        local_addr: SocketAddr,
    ) -> ServerHandle {
        let manager = ConnectionManager::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        self.delegate.server_did_start(host, local_addr.port());

        let accept_loop = AcceptLoop {
            acceptor,
            delegate: Arc::clone(&self.delegate),
            manager: manager.clone(),
            options: self.options.clone(),
        };
        let delegate = Arc::clone(&self.delegate);
        let task = tokio::spawn(async move {
            let result = accept_loop.run(shutdown_rx).await;
            match &result {
                Ok(()) => info!("[TelegraphServer] 服务器已正常停止。"),
                Err(e) => error!("[TelegraphServer] 服务器异常停止: {}", e),
            }
            delegate.server_did_stop(result.as_ref().err());
            result
        });

        ServerHandle {
            host: HostAddress::new(host, local_addr.port()),
            local_addr,
            manager,
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// 运行中服务器的控制句柄。
///
/// 丢弃句柄等同于请求正常停止 (不等待停止完成)。
#[derive(Debug)]
pub struct ServerHandle {
    host: HostAddress,
    local_addr: SocketAddr,
    manager: ConnectionManager,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<Result<(), WsError>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 启动时传入的主机文本与实际绑定的端口。
    pub fn host_address(&self) -> &HostAddress {
        &self.host
    }

    /// 连接管理器的克隆，可交给其他任务用于发送或断开。
    pub fn connections(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn client_identifiers(&self) -> Vec<ClientIdentifier> {
        self.manager.client_identifiers()
    }

    pub async fn send_text(
        &self,
        client_identifier: &ClientIdentifier,
        text: impl Into<String>,
    ) -> Result<(), WsError> {
        self.manager.send_text(client_identifier, text).await
    }

    pub async fn send_json<T: Serialize>(
        &self,
        client_identifier: &ClientIdentifier,
        payload: &T,
    ) -> Result<(), WsError> {
        self.manager.send_json(client_identifier, payload).await
    }

    pub fn disconnect_client(&self, client_identifier: &ClientIdentifier) -> Result<(), WsError> {
        self.manager.disconnect_client(client_identifier)
    }

    /// 请求停止并等待停止完成。
    ///
    /// 返回时所有客户端的断开通知以及 `server_did_stop` 都已发出。
    /// 如果服务器在此之前已经异常停止，返回那个错误。
    pub async fn stop(mut self) -> Result<(), WsError> {
        info!("[TelegraphServer] 请求停止服务器 {}", self.host);
        self.shutdown_tx.send_replace(true);
        self.join().await
    }

    /// 等待服务器自行结束 (只有异常停止才会发生)。
    ///
    /// 可以放在 `tokio::select!` 中使用：被取消后再调用 `wait` 或 `stop` 仍然有效。
    /// 停止结果只交付一次，之后再调用 `wait` 或 `stop` 返回 `Ok(())`。
    pub async fn wait(&mut self) -> Result<(), WsError> {
        self.join().await
    }

    async fn join(&mut self) -> Result<(), WsError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let joined = task.await;
        self.task = None;
        match joined {
            Ok(result) => result,
            Err(join_err) => Err(WsError::Message(format!("服务器任务异常结束: {}", join_err))),
        }
    }
}
