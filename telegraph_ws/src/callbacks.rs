// telegraph_ws/src/callbacks.rs

//! 以闭包字段形式注册事件回调的委托实现。
//!
//! 对于只关心一两个事件的宿主，实现完整的 trait 略显繁琐；`DelegateCallbacks`
//! 允许按需挂接闭包，未设置的回调什么也不做。

use crate::delegate::TelegraphDelegate;
use crate::error::WsError;
use std::fmt;
use telegraph_models::ClientIdentifier;

type StartFn = Box<dyn Fn(&str, u16) + Send + Sync>;
type StopFn = Box<dyn Fn(Option<&WsError>) + Send + Sync>;
type ConnectFn = Box<dyn Fn(&ClientIdentifier) + Send + Sync>;
type DisconnectFn = Box<dyn Fn(&ClientIdentifier, Option<&WsError>) + Send + Sync>;
type TextFn = Box<dyn Fn(&ClientIdentifier, &str) + Send + Sync>;

/// 每个事件对应一个可选回调的委托。
///
/// ```
/// use std::sync::atomic::{AtomicU16, Ordering};
/// use std::sync::Arc;
/// use telegraph_ws::{DelegateCallbacks, TelegraphDelegate};
///
/// let port = Arc::new(AtomicU16::new(0));
/// let seen = Arc::clone(&port);
/// let callbacks = DelegateCallbacks::new()
///     .on_server_start(move |_host, p| seen.store(p, Ordering::SeqCst));
///
/// callbacks.server_did_start("127.0.0.1", 8088);
/// callbacks.did_receive_text(&"c1".into(), "未注册的事件被忽略");
/// assert_eq!(port.load(Ordering::SeqCst), 8088);
/// ```
#[derive(Default)]
pub struct DelegateCallbacks {
    server_start: Option<StartFn>,
    server_stop: Option<StopFn>,
    client_connect: Option<ConnectFn>,
    client_disconnect: Option<DisconnectFn>,
    text_received: Option<TextFn>,
}

impl DelegateCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_server_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u16) + Send + Sync + 'static,
    {
        self.server_start = Some(Box::new(f));
        self
    }

    pub fn on_server_stop<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&WsError>) + Send + Sync + 'static,
    {
        self.server_stop = Some(Box::new(f));
        self
    }

    pub fn on_client_connect<F>(mut self, f: F) -> Self
    where
        F: Fn(&ClientIdentifier) + Send + Sync + 'static,
    {
        self.client_connect = Some(Box::new(f));
        self
    }

    pub fn on_client_disconnect<F>(mut self, f: F) -> Self
    where
        F: Fn(&ClientIdentifier, Option<&WsError>) + Send + Sync + 'static,
    {
        self.client_disconnect = Some(Box::new(f));
        self
    }

    pub fn on_text_received<F>(mut self, f: F) -> Self
    where
        F: Fn(&ClientIdentifier, &str) + Send + Sync + 'static,
    {
        self.text_received = Some(Box::new(f));
        self
    }
}

impl TelegraphDelegate for DelegateCallbacks {
    fn server_did_start(&self, host: &str, port: u16) {
        if let Some(cb) = &self.server_start {
            cb(host, port);
        }
    }

    fn server_did_stop(&self, error: Option<&WsError>) {
        if let Some(cb) = &self.server_stop {
            cb(error);
        }
    }

    fn client_did_connect(&self, client_identifier: &ClientIdentifier) {
        if let Some(cb) = &self.client_connect {
            cb(client_identifier);
        }
    }

    fn client_did_disconnect(&self, client_identifier: &ClientIdentifier, error: Option<&WsError>) {
        if let Some(cb) = &self.client_disconnect {
            cb(client_identifier, error);
        }
    }

    fn did_receive_text(&self, client_identifier: &ClientIdentifier, text: &str) {
        if let Some(cb) = &self.text_received {
            cb(client_identifier, text);
        }
    }
}

impl fmt::Debug for DelegateCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateCallbacks")
            .field("server_start", &self.server_start.is_some())
            .field("server_stop", &self.server_stop.is_some())
            .field("client_connect", &self.client_connect.is_some())
            .field("client_disconnect", &self.client_disconnect.is_some())
            .field("text_received", &self.text_received.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn empty_callbacks_ignore_all_events() {
        let callbacks = DelegateCallbacks::new();
        let id = ClientIdentifier::from("c");
        callbacks.server_did_start("h", 1);
        callbacks.client_did_connect(&id);
        callbacks.did_receive_text(&id, "t");
        callbacks.client_did_disconnect(&id, None);
        callbacks.server_did_stop(None);
    }

    #[test]
    fn stop_callback_sees_whether_an_error_was_given() {
        let seen: Arc<Mutex<Vec<bool>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let callbacks = DelegateCallbacks::new().on_server_stop(move |err| {
            sink.lock().expect("锁中毒").push(err.is_some());
        });

        callbacks.server_did_stop(None);
        callbacks.server_did_stop(Some(&WsError::ConnectionTimeout));

        assert_eq!(*seen.lock().expect("锁中毒"), vec![false, true]);
    }

    #[test]
    fn only_registered_callbacks_fire() {
        let connects = Arc::new(AtomicUsize::new(0));
        let disconnect_errors: Arc<Mutex<Vec<Option<String>>>> = Arc::default();

        let c = Arc::clone(&connects);
        let d = Arc::clone(&disconnect_errors);
        let callbacks = DelegateCallbacks::new()
            .on_client_connect(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_client_disconnect(move |_, err| {
                d.lock().expect("锁中毒").push(err.map(|e| e.to_string()));
            });

        let id = ClientIdentifier::from("c9");
        callbacks.client_did_connect(&id);
        callbacks.did_receive_text(&id, "ignored");
        callbacks.client_did_disconnect(&id, None);
        callbacks.client_did_disconnect(&id, Some(&WsError::SendErrorClosed));

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        let errors = disconnect_errors.lock().expect("锁中毒");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].is_none());
        assert!(errors[1].is_some());
    }
}
