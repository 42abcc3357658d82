// telegraph_ws/src/delegate.rs

//! 宿主应用用来观察服务器事件的委托接口。

use crate::error::WsError;
use std::sync::Arc;
use telegraph_models::ClientIdentifier;

/// 服务器事件委托。
///
/// 五个方法都带有空实现，实现者只需覆盖自己关心的事件。服务器在 tokio 工作
/// 任务上同步调用这些方法，因此实现应当尽快返回；需要异步处理时可以改用
/// [`crate::ChannelDelegate`] 把事件转交给自己的任务。
///
/// 不同客户端的事件可能并发到达。对同一个客户端而言，`client_did_connect`
/// 总是先于它的所有 `did_receive_text`，`client_did_disconnect` 总是最后一个。
pub trait TelegraphDelegate: Send + Sync {
    /// 服务器开始在 `host:port` 上监听。`port` 为实际绑定的端口。
    fn server_did_start(&self, host: &str, port: u16) {
        let _ = (host, port);
    }

    /// 服务器已停止。`error` 为 `None` 表示由宿主主动正常停止。
    fn server_did_stop(&self, error: Option<&WsError>) {
        let _ = error;
    }

    fn client_did_connect(&self, client_identifier: &ClientIdentifier) {
        let _ = client_identifier;
    }

    /// 客户端会话结束。`error` 为 `None` 表示正常关闭 (任一方发起的 Close 帧、
    /// 服务器停止或宿主主动断开)。
    fn client_did_disconnect(&self, client_identifier: &ClientIdentifier, error: Option<&WsError>) {
        let _ = (client_identifier, error);
    }

    fn did_receive_text(&self, client_identifier: &ClientIdentifier, text: &str) {
        let _ = (client_identifier, text);
    }
}

impl<T: TelegraphDelegate + ?Sized> TelegraphDelegate for Arc<T> {
    fn server_did_start(&self, host: &str, port: u16) {
        (**self).server_did_start(host, port)
    }

    fn server_did_stop(&self, error: Option<&WsError>) {
        (**self).server_did_stop(error)
    }

    fn client_did_connect(&self, client_identifier: &ClientIdentifier) {
        (**self).client_did_connect(client_identifier)
    }

    fn client_did_disconnect(&self, client_identifier: &ClientIdentifier, error: Option<&WsError>) {
        (**self).client_did_disconnect(client_identifier, error)
    }

    fn did_receive_text(&self, client_identifier: &ClientIdentifier, text: &str) {
        (**self).did_receive_text(client_identifier, text)
    }
}

/// 不关心任何事件的委托。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl TelegraphDelegate for NoopDelegate {}
