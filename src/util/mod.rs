//! Utility module
//!
//! Small helpers shared by the status monitor, socket keeper and station.

/// Copies reply bytes into a text field of `size` bytes (one reserved for a
/// terminator, as on the modem), stopping at the first NUL.
pub fn copy_text(bytes: &[u8], size: usize) -> String {
    let bytes = &bytes[..bytes.len().min(size.saturating_sub(1))];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Renders a two-byte AT command code for logs
pub fn command_text(command: [u8; 2]) -> String {
    String::from_utf8_lossy(&command).into_owned()
}

/// Truncates `text` to at most `max` bytes on a character boundary
pub fn truncate_text(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
