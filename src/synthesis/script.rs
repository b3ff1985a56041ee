//! Character-range script detection, used only for diagnostics.

/// Dominant writing system of a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Chinese,
    Japanese,
    Korean,
    /// Latin or anything outside the CJK blocks
    Other,
}

impl Script {
    /// Language codes consistent with this script
    fn expected_languages(&self) -> &'static [&'static str] {
        match self {
            Script::Chinese => &["zh", "cmn", "yue", "hak", "ja"],
            Script::Japanese => &["ja"],
            Script::Korean => &["ko"],
            Script::Other => &[],
        }
    }

    /// Whether the requested language plausibly matches the detected script
    ///
    /// Text in Latin or other scripts is compatible with every language.
    pub fn matches_language(&self, lang: &str) -> bool {
        if *self == Script::Other {
            return true;
        }
        let primary = lang.split(['-', '_']).next().unwrap_or(lang);
        self.expected_languages()
            .iter()
            .any(|expected| primary.eq_ignore_ascii_case(expected))
    }
}

fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
        | '\u{20000}'..='\u{2A6DF}')
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}')
}

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7AF}'   // Syllables
        | '\u{1100}'..='\u{11FF}' // Jamo
        | '\u{3130}'..='\u{318F}')
}

/// Classify text by counting characters in the CJK blocks
///
/// Any kana marks the text as Japanese (Japanese mixes kanji and kana);
/// otherwise the larger of Hangul and Han wins.
pub fn detect_script(text: &str) -> Script {
    let (mut han, mut kana, mut hangul) = (0usize, 0usize, 0usize);

    for c in text.chars() {
        if is_han(c) {
            han += 1;
        } else if is_kana(c) {
            kana += 1;
        } else if is_hangul(c) {
            hangul += 1;
        }
    }

    if han + kana + hangul == 0 {
        Script::Other
    } else if hangul > han + kana {
        Script::Korean
    } else if kana > 0 {
        Script::Japanese
    } else {
        Script::Chinese
    }
}
