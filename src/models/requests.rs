use serde::Deserialize;

use crate::error::Result;
use crate::synthesis::params::{
    normalize_variant, parse_pitch, parse_speed, parse_volume, validate_lang, validate_text,
};
use crate::synthesis::SynthesisParams;

/// Form fields accepted by `POST /tts`
///
/// Everything arrives as text so that malformed numbers surface as our own
/// validation errors instead of the extractor's rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub pitch: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub voice_variant: Option<String>,
}

impl TtsRequest {
    /// Validate every field, text first
    pub fn into_params(self) -> Result<SynthesisParams> {
        let text = validate_text(self.text.as_deref().unwrap_or_default())?;

        Ok(SynthesisParams {
            text,
            lang: validate_lang(self.lang.as_deref())?,
            speed: parse_speed(self.speed.as_deref())?,
            pitch: parse_pitch(self.pitch.as_deref())?,
            volume: parse_volume(self.volume.as_deref())?,
            voice_variant: normalize_variant(self.voice_variant.as_deref())?,
        })
    }
}
