//! Best-effort delivery of server notifications during a call.
//!
//! A [`Notifier`] is handed to each tool invocation. Where its messages end
//! up depends on the transport: the SSE stream of the current POST, the
//! session's standalone stream, or stdout. A notifier may also be
//! detached, in which case everything it is asked to send is dropped.

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use super::protocol::{
    methods, LogLevel, LoggingMessageParams, McpNotification, ProgressParams, ProgressToken,
};

/// Capacity of the per-call and per-session notification channels.
pub const NOTIFICATION_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no notification channel is attached")]
    Detached,

    #[error("notification receiver is gone")]
    Closed,

    #[error("could not encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::Sender<McpNotification>>,
    progress_token: Option<ProgressToken>,
}

impl Notifier {
    pub fn new(tx: mpsc::Sender<McpNotification>) -> Self {
        Self {
            tx: Some(tx),
            progress_token: None,
        }
    }

    /// A notifier that silently discards everything.
    pub fn detached() -> Self {
        Self::default()
    }

    /// A connected notifier and the receiving half of its channel.
    pub fn channel() -> (Self, mpsc::Receiver<McpNotification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        (Self::new(tx), rx)
    }

    pub fn with_progress_token(mut self, token: Option<ProgressToken>) -> Self {
        self.progress_token = token;
        self
    }

    pub fn progress_token(&self) -> Option<&ProgressToken> {
        self.progress_token.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.tx.is_some()
    }

    pub async fn send(&self, notification: McpNotification) -> Result<(), NotifyError> {
        let tx = self.tx.as_ref().ok_or(NotifyError::Detached)?;
        tx.send(notification).await.map_err(|_| NotifyError::Closed)
    }

    /// Emit `notifications/message`. Failures are logged and swallowed.
    pub async fn log(&self, level: LogLevel, data: impl Into<Value>) {
        if let Err(e) = self.try_log(level, data.into()).await {
            debug!("Dropped log notification: {}", e);
        }
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, Value::String(message.into())).await;
    }

    /// Emit `notifications/progress` when the caller asked for progress.
    pub async fn progress(&self, progress: u64, total: Option<u64>, message: Option<String>) {
        let Some(token) = self.progress_token.clone() else {
            return;
        };
        let params = ProgressParams {
            progress_token: token,
            progress,
            total,
            message,
        };
        if let Err(e) = self.try_progress(params).await {
            debug!("Dropped progress notification: {}", e);
        }
    }

    async fn try_log(&self, level: LogLevel, data: Value) -> Result<(), NotifyError> {
        let params = serde_json::to_value(LoggingMessageParams { level, data })?;
        self.send(McpNotification::new(methods::NOTIFY_MESSAGE, params))
            .await
    }

    async fn try_progress(&self, params: ProgressParams) -> Result<(), NotifyError> {
        let params = serde_json::to_value(params)?;
        self.send(McpNotification::new(methods::NOTIFY_PROGRESS, params))
            .await
    }
}
