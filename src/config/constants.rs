/// Maximum allowed text length for TTS requests (in characters)
///
/// Requests exceeding this limit are rejected before the engine is started.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Filename prefix shared by every temporary audio artifact
pub const ARTIFACT_PREFIX: &str = "tts_";

/// Filename extension of temporary audio artifacts
pub const ARTIFACT_EXTENSION: &str = "wav";

/// Defaults for form fields on `/tts`
pub const DEFAULT_LANG: &str = "zh";
pub const DEFAULT_SPEED: u32 = 160;
pub const DEFAULT_PITCH: u32 = 50;
pub const DEFAULT_VOLUME: u32 = 100;

/// Words-per-minute range accepted by espeak-ng
pub const SPEED_RANGE: (u32, u32) = (80, 450);

/// Pitch adjustment range accepted by espeak-ng
pub const PITCH_RANGE: (u32, u32) = (0, 99);

/// Amplitude range accepted by espeak-ng
pub const VOLUME_RANGE: (u32, u32) = (0, 200);

/// Longest voice variant name we forward to the engine
pub const MAX_VARIANT_LENGTH: usize = 32;

/// Number of random characters in an issued API key
///
/// 43 characters from a 62-symbol alphabet carry just over 256 bits.
pub const API_KEY_LENGTH: usize = 43;
