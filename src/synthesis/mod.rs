//! Translation of synthesis requests into espeak-ng invocations.

pub mod engine;
pub mod params;
pub mod script;
pub mod voices;

pub use engine::{EspeakEngine, SynthesizedAudio};
pub use params::SynthesisParams;
pub use voices::VoiceInfo;
