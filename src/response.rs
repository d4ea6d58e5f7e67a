//! Chat responses as returned by the research query endpoint.
//!
//! A response is the answer text plus the sources it cites. The session it
//! belongs to travels with it as a plain value; nothing here remembers a
//! "current" session between calls.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sourcefinder_core::SourceRecord;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(alias = "content", alias = "response")]
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

impl ChatResponse {
    /// Session id for log spans; `-` when the response carries none.
    pub fn session_label(&self) -> &str {
        self.session_id.as_deref().unwrap_or("-")
    }
}

pub fn parse_response(json: &str) -> Result<ChatResponse> {
    if json.trim().is_empty() {
        bail!("Chat response is empty");
    }
    serde_json::from_str(json).with_context(|| "Failed to parse chat response JSON")
}

/// Read a response from `path`, or from stdin when `path` is `None` or `-`.
pub fn load_response(path: Option<&Path>) -> Result<ChatResponse> {
    let content = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read chat response: {}", p.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .with_context(|| "Failed to read chat response from stdin")?;
            buf
        }
    };
    parse_response(&content)
}
