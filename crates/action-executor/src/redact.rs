/// Typed input never reaches logs verbatim.
pub fn input(raw: &str) -> String {
    format!("<{} chars>", raw.chars().count())
}

pub fn target(raw: &str, max_len: usize) -> String {
    if raw.len() > max_len {
        let mut trimmed: String = raw.chars().take(max_len).collect();
        trimmed.push('…');
        trimmed
    } else {
        raw.to_string()
    }
}
