/// Non-digit characters that mark a message as arithmetic.
pub const ON_TOPIC_SYMBOLS: &[char] = &['+', '-', '*', '/', '(', ')', '.'];

/// True if `text` has at least one ASCII digit or arithmetic symbol.
pub fn is_on_topic(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_ascii_digit() || ON_TOPIC_SYMBOLS.contains(&c))
}

/// Stored in place of an off-topic message's content.
pub fn filtered_placeholder(channel_name: &str) -> String {
    format!("[Filtered] Off-topic message for {channel_name}.")
}
