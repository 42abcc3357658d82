// telegraph_ws/src/channel.rs

//! 把委托通知转换为 `EventRecord` 并推送到 tokio 通道的委托实现。

use crate::delegate::TelegraphDelegate;
use crate::error::WsError;
use log::debug;
use telegraph_models::{ClientIdentifier, DelegateEvent, EventRecord};
use tokio::sync::mpsc;

/// 通道委托。
///
/// 委托方法在服务器的工作任务上被同步调用；`ChannelDelegate` 只做一次无界
/// 通道发送，真正的处理交给持有接收端的宿主任务。
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl ChannelDelegate {
    /// 创建委托及其对应的事件接收端。
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: DelegateEvent) {
        if self.tx.send(EventRecord::new(event)).is_err() {
            debug!("[ChannelDelegate] 事件接收端已关闭，丢弃事件。");
        }
    }
}

impl TelegraphDelegate for ChannelDelegate {
    fn server_did_start(&self, host: &str, port: u16) {
        self.emit(DelegateEvent::ServerStarted {
            host: host.to_string(),
            port,
        });
    }

    fn server_did_stop(&self, error: Option<&WsError>) {
        self.emit(DelegateEvent::ServerStopped {
            error: error.map(|e| e.to_string()),
        });
    }

    fn client_did_connect(&self, client_identifier: &ClientIdentifier) {
        self.emit(DelegateEvent::ClientConnected {
            client_identifier: client_identifier.clone(),
        });
    }

    fn client_did_disconnect(&self, client_identifier: &ClientIdentifier, error: Option<&WsError>) {
        self.emit(DelegateEvent::ClientDisconnected {
            client_identifier: client_identifier.clone(),
            error: error.map(|e| e.to_string()),
        });
    }

    fn did_receive_text(&self, client_identifier: &ClientIdentifier, text: &str) {
        self.emit(DelegateEvent::TextReceived {
            client_identifier: client_identifier.clone(),
            text: text.to_string(),
        });
    }
}
