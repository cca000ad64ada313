//! Prompt composition and text resource loading.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const NOTES_HEADER: &str = "[PERSISTENT NOTES]";
pub const NOTES_FOOTER: &str = "[END OF NOTES]";
pub const REQUEST_HEADER: &str = "[USER REQUEST]";

/// Merge persistent notes into the user prompt.
///
/// Notes always precede the request, separated by delimiters. Empty notes
/// leave the prompt untouched.
pub fn compose(user_prompt: &str, notes: &str) -> String {
    let notes = strip_control_chars(notes);
    let notes = notes.trim();
    if notes.is_empty() {
        return user_prompt.to_string();
    }

    format!(
        "{}\n{}\n{}\n\n{}\n{}",
        NOTES_HEADER, notes, NOTES_FOOTER, REQUEST_HEADER, user_prompt
    )
}

/// Remove control characters, keeping line breaks and tabs.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

/// Read an externally authored text file, returning an empty string when it
/// is missing or unreadable.
pub fn load_text_resource(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {}", path.display(), e);
            String::new()
        }
    }
}
