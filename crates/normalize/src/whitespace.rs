/// Collapses runs of Unicode whitespace to single ASCII spaces and trims
/// both ends.
///
/// ```rust
/// use normalize::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  acme \t\n corp  "), "acme corp");
/// assert_eq!(collapse_whitespace("acme\u{00A0}corp"), "acme corp");
/// assert_eq!(collapse_whitespace("   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
