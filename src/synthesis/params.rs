use crate::config::constants::{
    DEFAULT_LANG, DEFAULT_PITCH, DEFAULT_SPEED, DEFAULT_VOLUME, MAX_TEXT_LENGTH,
    MAX_VARIANT_LENGTH, PITCH_RANGE, SPEED_RANGE, VOLUME_RANGE,
};
use crate::error::{Result, TtsError};
use crate::utils::text_normalization::normalize_for_engine;

/// Validated synthesis parameters, ready to hand to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisParams {
    /// Normalized text
    pub text: String,
    /// Caller's abstract language code, lower-cased
    pub lang: String,
    /// Words per minute
    pub speed: u32,
    pub pitch: u32,
    pub volume: u32,
    /// Variant name without the leading `+`
    pub voice_variant: Option<String>,
}

impl SynthesisParams {
    /// Parameters with defaults for everything but the text
    pub fn new(text: &str) -> Result<Self> {
        Ok(Self {
            text: validate_text(text)?,
            lang: DEFAULT_LANG.to_string(),
            speed: DEFAULT_SPEED,
            pitch: DEFAULT_PITCH,
            volume: DEFAULT_VOLUME,
            voice_variant: None,
        })
    }
}

/// Reject empty or oversized text and normalize the rest
pub fn validate_text(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(TtsError::EmptyText);
    }

    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(TtsError::TextTooLong(MAX_TEXT_LENGTH));
    }

    let normalized = normalize_for_engine(text);
    if normalized.is_empty() {
        return Err(TtsError::EmptyText);
    }

    Ok(normalized)
}

/// Language codes look like `zh`, `en-us` or `cmn-latn-pinyin`
pub fn validate_lang(lang: Option<&str>) -> Result<String> {
    let lang = match lang.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_LANG.to_string()),
        Some(lang) => lang,
    };

    let valid = lang.len() <= 24
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        return Err(TtsError::InvalidRequest(format!(
            "Invalid language code: {}",
            lang
        )));
    }

    Ok(lang.to_ascii_lowercase())
}

/// Parse an optional integer field and check it against an inclusive range
pub fn parse_ranged(name: &str, value: Option<&str>, default: u32, range: (u32, u32)) -> Result<u32> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(v) => v,
    };

    let out_of_range = || {
        TtsError::InvalidRequest(format!(
            "{} must be an integer between {} and {}",
            name, range.0, range.1
        ))
    };

    let parsed: u32 = value.parse().map_err(|_| out_of_range())?;
    if parsed < range.0 || parsed > range.1 {
        return Err(out_of_range());
    }

    Ok(parsed)
}

pub fn parse_speed(value: Option<&str>) -> Result<u32> {
    parse_ranged("speed", value, DEFAULT_SPEED, SPEED_RANGE)
}

pub fn parse_pitch(value: Option<&str>) -> Result<u32> {
    parse_ranged("pitch", value, DEFAULT_PITCH, PITCH_RANGE)
}

pub fn parse_volume(value: Option<&str>) -> Result<u32> {
    parse_ranged("volume", value, DEFAULT_VOLUME, VOLUME_RANGE)
}

/// Accept `f2` or `+f2`; blank means no variant
pub fn normalize_variant(variant: Option<&str>) -> Result<Option<String>> {
    let variant = match variant.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v.strip_prefix('+').unwrap_or(v),
    };

    let valid = !variant.is_empty()
        && variant.len() <= MAX_VARIANT_LENGTH
        && variant
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid {
        return Err(TtsError::InvalidRequest(format!(
            "Invalid voice variant: {}",
            variant
        )));
    }

    Ok(Some(variant.to_string()))
}
