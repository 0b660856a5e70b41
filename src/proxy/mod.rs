// src/proxy/mod.rs

//! Development reverse proxy with live reload.
//!
//! - `server.rs`: axum server forwarding to the upstream site.
//! - `inject.rs`: client script injection and origin rewriting.
//! - `reload.rs`: the broadcast hub connected browsers listen on.

pub mod inject;
pub mod reload;
pub mod server;

pub use inject::{CLIENT_SCRIPT_PATH, LIVERELOAD_PATH};
pub use reload::{ReloadHub, ReloadMessage};
pub use server::{start_proxy, ProxyConfig, ProxyHandle};
