/// Text cleanup applied before text is handed to the engine
use unicode_normalization::UnicodeNormalization;

/// Normalize request text for espeak-ng
///
/// - Unicode NFC composition
/// - control characters and soft hyphens removed
/// - non-breaking spaces and line breaks become plain spaces
/// - runs of whitespace collapsed, ends trimmed
pub fn normalize_for_engine(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut last_was_space = true;

    for ch in text.nfc() {
        let ch = match ch {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
            '\u{00AD}' | '\u{200B}' | '\u{FEFF}' => continue,
            c if c.is_whitespace() => ' ',
            c if c.is_control() => continue,
            c => c,
        };

        if ch == ' ' {
            if !last_was_space {
                normalized.push(' ');
            }
            last_was_space = true;
        } else {
            normalized.push(ch);
            last_was_space = false;
        }
    }

    if normalized.ends_with(' ') {
        normalized.pop();
    }

    normalized
}
