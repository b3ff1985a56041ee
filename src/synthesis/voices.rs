use serde::Serialize;

use crate::error::{Result, TtsError};

/// Language code → espeak-ng voice identifier
///
/// Concrete engine identifiers map to themselves so callers can pick a
/// specific accent directly.
const VOICE_TABLE: &[(&str, &str)] = &[
    ("zh", "zh-cn"),
    ("zh-cn", "zh-cn"),
    ("cmn", "cmn"),
    ("yue", "yue"),
    ("zh-yue", "yue"),
    ("en", "en-us"),
    ("en-us", "en-us"),
    ("en-gb", "en-gb"),
    ("ja", "ja"),
    ("ko", "ko"),
    ("fr", "fr-fr"),
    ("fr-fr", "fr-fr"),
    ("de", "de"),
    ("es", "es"),
    ("it", "it"),
    ("pt", "pt"),
    ("pt-br", "pt-br"),
    ("ru", "ru"),
];

/// Look up the engine voice for a language code
pub fn lookup_voice(lang: &str) -> Option<&'static str> {
    VOICE_TABLE
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(lang))
        .map(|(_, voice)| *voice)
}

/// Final `-v` argument for a request
///
/// Unknown languages use `default_voice`. A variant is only appended when
/// the resolved voice does not already carry one.
pub fn resolve_voice(lang: &str, variant: Option<&str>, default_voice: &str) -> String {
    let base = lookup_voice(lang).unwrap_or(default_voice);

    match variant {
        Some(variant) if !base.contains('+') => format!("{}+{}", base, variant),
        _ => base.to_string(),
    }
}

/// One row of `espeak-ng --voices`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceInfo {
    pub code: String,
    pub name: String,
    pub gender: String,
}

/// Parse the tabular output of `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
///
/// Any malformed row fails the whole parse rather than returning a partial list.
pub fn parse_voice_list(output: &str) -> Result<Vec<VoiceInfo>> {
    let mut lines = output.lines().filter(|line| !line.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| TtsError::VoiceList("engine produced no output".to_string()))?;
    let columns: Vec<&str> = header.split_whitespace().collect();
    if columns.first() != Some(&"Pty")
        || !columns.contains(&"Language")
        || !columns.contains(&"VoiceName")
    {
        return Err(TtsError::VoiceList(format!(
            "unexpected header: {}",
            header.trim()
        )));
    }

    let mut voices = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || fields[0].parse::<i32>().is_err() || !fields[2].contains('/') {
            return Err(TtsError::VoiceList(format!(
                "malformed row: {}",
                line.trim()
            )));
        }

        voices.push(VoiceInfo {
            code: fields[1].to_string(),
            name: fields[3].replace('_', " "),
            gender: parse_gender(fields[2]).to_string(),
        });
    }

    if voices.is_empty() {
        return Err(TtsError::VoiceList("engine listed no voices".to_string()));
    }

    Ok(voices)
}

fn parse_gender(age_gender: &str) -> &'static str {
    match age_gender.rsplit('/').next() {
        Some("M") => "male",
        Some("F") => "female",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
 5  ko              --/F      Korean             ko
";

    #[test]
    fn test_lookup_known_codes() {
        assert_eq!(lookup_voice("zh"), Some("zh-cn"));
        assert_eq!(lookup_voice("en"), Some("en-us"));
        assert_eq!(lookup_voice("ja"), Some("ja"));
        assert_eq!(lookup_voice("ko"), Some("ko"));
        assert_eq!(lookup_voice("EN"), Some("en-us"));
    }

    #[test]
    fn test_unknown_code_falls_back() {
        assert_eq!(lookup_voice("tlh"), None);
        assert_eq!(resolve_voice("tlh", None, "en-us"), "en-us");
    }

    #[test]
    fn test_variant_appended_to_base_voice() {
        assert_eq!(resolve_voice("zh", Some("f2"), "en-us"), "zh-cn+f2");
        assert_eq!(resolve_voice("en", None, "en-us"), "en-us");
    }

    #[test]
    fn test_variant_not_doubled() {
        assert_eq!(resolve_voice("xx", Some("f3"), "en-us+m1"), "en-us+m1");
    }

    #[test]
    fn test_parse_voice_list() {
        let voices = parse_voice_list(SAMPLE).unwrap();
        assert_eq!(voices.len(), 4);
        assert_eq!(
            voices[1],
            VoiceInfo {
                code: "cmn".to_string(),
                name: "Chinese (Mandarin)".to_string(),
                gender: "male".to_string(),
            }
        );
        assert_eq!(voices[3].gender, "female");
        assert_eq!(voices[2].code, "en-us");
    }

    #[test]
    fn test_parse_preserves_engine_order() {
        let codes: Vec<String> = parse_voice_list(SAMPLE)
            .unwrap()
            .into_iter()
            .map(|v| v.code)
            .collect();
        assert_eq!(codes, vec!["af", "cmn", "en-us", "ko"]);
    }

    #[test]
    fn test_parse_empty_output_fails() {
        assert!(parse_voice_list("").is_err());
        assert!(parse_voice_list("\n\n").is_err());
    }

    #[test]
    fn test_parse_header_only_fails() {
        let header = SAMPLE.lines().next().unwrap();
        assert!(parse_voice_list(header).is_err());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_voice_list("espeak-ng: command not understood").is_err());
    }

    #[test]
    fn test_parse_malformed_row_fails_whole_list() {
        let output = format!("{} 5 broken\n", SAMPLE);
        assert!(matches!(parse_voice_list(&output), Err(TtsError::VoiceList(_))));
    }
}
