#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((clip_idx, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let mut out = text[..clip_idx].to_string();
    out.push_str("...");
    out
}

/// Quotes a word for display in a POSIX shell command line.
#[must_use]
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if plain {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', "'\\''"))
}
