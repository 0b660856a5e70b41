// src/proxy/inject.rs

use regex::{Captures, Regex};

use crate::config::Upstream;

pub const CLIENT_SCRIPT_PATH: &str = "/__themewatch/client.js";
pub const LIVERELOAD_PATH: &str = "/__themewatch/livereload";

pub const CLIENT_JS: &str = include_str!("client.js");

pub fn script_tag() -> String {
    format!(r#"<script async src="{CLIENT_SCRIPT_PATH}"></script>"#)
}

/// Insert the client script tag before the last `</body>` (any case), or
/// append it when there is none. Pages that already carry the tag are
/// returned unchanged.
pub fn inject_client(html: &str) -> String {
    let tag = script_tag();
    if html.contains(&tag) {
        return html.to_string();
    }

    // ASCII lowercasing keeps byte offsets intact.
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

fn mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_html(content_type: &str) -> bool {
    mime(content_type) == "text/html"
}

/// Bodies whose upstream origin references get rewritten.
pub fn is_rewritable(content_type: &str) -> bool {
    matches!(
        mime(content_type).as_str(),
        "text/html"
            | "text/css"
            | "text/javascript"
            | "application/javascript"
            | "application/x-javascript"
    )
}

/// Rewrites protocol-relative upstream origins (`//host:port`) to the
/// proxy's authority. For port 80 the bare `//host` form matches too.
#[derive(Debug, Clone)]
pub struct OriginRewriter {
    re: Regex,
}

impl OriginRewriter {
    pub fn new(upstream: &Upstream) -> Result<Self, regex::Error> {
        let host = regex::escape(&upstream.host);
        let pattern = if upstream.port == 80 {
            format!(r"//{host}(?::80)?(?P<end>[^0-9A-Za-z.:\-]|$)")
        } else {
            format!(r"//{host}:{}(?P<end>[^0-9]|$)", upstream.port)
        };
        Ok(Self {
            re: Regex::new(&pattern)?,
        })
    }

    pub fn rewrite(&self, text: &str, proxy_authority: &str) -> String {
        self.re
            .replace_all(text, |caps: &Captures| format!("//{proxy_authority}{}", &caps["end"]))
            .into_owned()
    }
}
