//! Operational settings resolved from an optional key=value file.
//!
//! Every recognised key falls back to its default on its own: a missing,
//! blank, or invalid value for one key never affects another. Resolution
//! never fails; an absent or unreadable file yields the defaults silently.
//!
//! ```text
//! # ~/.ai/ai.conf
//! AI_OLLAMA_MODEL=mistral          # inline comments are stripped
//! AI_OLLAMA_API_URL="http://gpu-box:11434/api/generate"
//! AI_MAX_CONTEXT_TOKENS=8192
//! ```

use std::fs;
use std::path::Path;
use url::Url;

pub const KEY_MODEL: &str = "AI_OLLAMA_MODEL";
pub const KEY_API_URL: &str = "AI_OLLAMA_API_URL";
pub const KEY_MAX_CONTEXT: &str = "AI_MAX_CONTEXT_TOKENS";

pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_API_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MAX_CONTEXT_SIZE: usize = 4096;

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: String,
    /// Well-formed http(s) endpoint.
    pub api_url: String,
    /// Maximum number of rolling-context elements kept after a turn. Always > 0.
    pub max_context_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            max_context_size: DEFAULT_MAX_CONTEXT_SIZE,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults per key.
    pub fn resolve(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse settings file content. Later valid occurrences of a key win.
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();

        for (number, line) in content.lines().enumerate() {
            let Some((key, value)) = split_entry(line) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            match key {
                KEY_MODEL => settings.model = value.to_string(),
                KEY_API_URL => match validate_api_url(value) {
                    Ok(url) => settings.api_url = url,
                    Err(reason) => log::warn!(
                        "{} (line {}): {}; using default {}",
                        KEY_API_URL,
                        number + 1,
                        reason,
                        DEFAULT_API_URL
                    ),
                },
                KEY_MAX_CONTEXT => match parse_max_context_size(value) {
                    Ok(size) => settings.max_context_size = size,
                    Err(reason) => log::warn!(
                        "{} (line {}): {}; using default {}",
                        KEY_MAX_CONTEXT,
                        number + 1,
                        reason,
                        DEFAULT_MAX_CONTEXT_SIZE
                    ),
                },
                _ => {}
            }
        }

        settings
    }

    /// Apply a per-call model override (`-m/--model`). Blank overrides are ignored.
    pub fn with_model_override(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.map(str::trim)
            && !model.is_empty()
        {
            self.model = model.to_string();
        }
        self
    }
}

/// Split a settings line into a trimmed `(key, value)` pair.
///
/// Returns `None` for blank lines, full-line comments, and lines without `=`.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    let key = key.strip_prefix("export ").map(str::trim).unwrap_or(key);

    Some((key, parse_value(value)))
}

/// Trimmed value with quotes and any inline comment removed.
///
/// A quoted value ends at its closing quote, so a `#` inside the quotes is
/// kept and only text after the closing quote can be a comment.
fn parse_value(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote)
            && let Some(end) = rest.find(quote)
        {
            return rest[..end].trim();
        }
    }
    strip_inline_comment(value).trim()
}

fn strip_inline_comment(value: &str) -> &str {
    match value.find('#') {
        Some(idx) => &value[..idx],
        None => value,
    }
}

fn parse_max_context_size(value: &str) -> Result<usize, String> {
    match value.parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).map_err(|_| format!("'{}' is too large", value)),
        Ok(_) => Err(format!("'{}' must be a positive integer", value)),
        Err(_) => Err(format!("'{}' is not a number", value)),
    }
}

fn validate_api_url(value: &str) -> Result<String, String> {
    let url = Url::parse(value).map_err(|e| format!("'{}' is not a valid URL: {}", value, e))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(value.to_string()),
        "http" | "https" => Err(format!("'{}' has no host", value)),
        other => Err(format!("'{}' uses unsupported scheme '{}'", value, other)),
    }
}
