use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::config::{NormalizeConfig, RETAINED_PUNCTUATION};
use crate::whitespace::collapse_whitespace;

/// Normalize one text cell. `None` means the cell is missing.
///
/// Steps, in order:
/// 1. drop currency symbols (Unicode `Sc`)
/// 2. drop punctuation and symbols other than [`RETAINED_PUNCTUATION`]
/// 3. transliterate to ASCII (NFKD, drop combining marks, then `deunicode`)
/// 4. lower-case
/// 5. collapse whitespace and trim
/// 6. map null tokens (and, if configured, empty text) to `None`
///
/// Only word characters reach transliteration. Its ASCII output is filtered
/// again, so the function is idempotent.
///
/// ```rust
/// use normalize::{normalize_text, NormalizeConfig};
///
/// let cfg = NormalizeConfig::default();
/// assert_eq!(normalize_text("  Café   Münster! ", &cfg).as_deref(), Some("cafe munster"));
/// assert_eq!(normalize_text("$1,200.50", &cfg).as_deref(), Some("1,200.50"));
/// assert_eq!(normalize_text("NaN", &cfg), None);
/// ```
pub fn normalize_text(input: &str, cfg: &NormalizeConfig) -> Option<String> {
    let mut cleaned = String::with_capacity(input.len());

    for ch in input.chars().filter(|c| !c.is_symbol_currency()) {
        if ch.is_ascii() || !cfg.transliterate {
            push_retained(ch, &mut cleaned);
        } else if is_word_or_space(ch) {
            transliterate_into(ch, &mut cleaned);
        }
    }

    let collapsed = collapse_whitespace(&cleaned);

    if collapsed.is_empty() && cfg.empty_as_null {
        return None;
    }
    if cfg.null_tokens.iter().any(|t| *t == collapsed) {
        return None;
    }
    Some(collapsed)
}

fn transliterate_into(ch: char, out: &mut String) {
    for decomposed in std::iter::once(ch).nfkd().filter(|c| !c.is_mark()) {
        if decomposed.is_ascii() {
            push_retained(decomposed, out);
        } else if let Some(ascii) = deunicode::deunicode_char(decomposed) {
            for c in ascii.chars() {
                push_retained(c, out);
            }
        }
    }
}

fn is_word_or_space(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch.is_whitespace()
}

/// Push `ch` lower-cased if it survives punctuation stripping.
fn push_retained(ch: char, out: &mut String) {
    if is_word_or_space(ch) || RETAINED_PUNCTUATION.contains(&ch) {
        out.extend(ch.to_lowercase());
    }
}
