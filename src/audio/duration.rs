use hound::WavReader;
use std::path::Path;

use crate::error::Result;

/// Read the header of a WAV file on disk and return its duration in milliseconds
///
/// Fails if the file does not start with a valid RIFF/WAVE header.
pub fn from_file(path: &Path) -> Result<f64> {
    let reader = WavReader::open(path)?;
    Ok(duration_of(&reader))
}

fn duration_of<R: std::io::Read>(reader: &WavReader<R>) -> f64 {
    let spec = reader.spec();
    let num_samples = reader.len() as f64;
    let sample_rate = spec.sample_rate as f64;
    let num_channels = spec.channels.max(1) as f64;

    if sample_rate == 0.0 {
        return 0.0;
    }

    // reader.len() counts samples across all channels
    let num_frames = num_samples / num_channels;
    (num_frames / sample_rate) * 1000.0
}
