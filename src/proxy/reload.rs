// src/proxy/reload.rs

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::engine::ReloadSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    FullReload,
}

impl ReloadMessage {
    /// Text frame sent over the live-reload socket.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadMessage::FullReload => "reload",
        }
    }
}

/// Fan-out of reload messages to every connected browser.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadMessage>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Tell every connected client to reload. Returns how many were reached.
    pub fn reload(&self) -> usize {
        match self.tx.send(ReloadMessage::FullReload) {
            Ok(n) => {
                info!(clients = n, "broadcast full-page reload");
                n
            }
            Err(_) => {
                debug!("reload requested with no connected clients");
                0
            }
        }
    }
}

impl ReloadSink for ReloadHub {
    fn reload(&self) {
        ReloadHub::reload(self);
    }
}
