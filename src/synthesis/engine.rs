use axum::body::Body;
use bytes::Bytes;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use uuid::Uuid;

use super::params::SynthesisParams;
use super::script::detect_script;
use super::voices::{parse_voice_list, resolve_voice, VoiceInfo};
use crate::audio::duration;
use crate::config::ServerConfig;
use crate::error::{Result, TtsError};
use crate::utils::temp_file::TempFile;

/// Read size when streaming an artifact to the client
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Runs espeak-ng as a subprocess
#[derive(Debug, Clone)]
pub struct EspeakEngine {
    binary: PathBuf,
    scratch_dir: PathBuf,
    default_voice: String,
}

/// A finished synthesis: the artifact on disk plus what we learned about it
#[derive(Debug)]
pub struct SynthesizedAudio {
    artifact: TempFile,
    pub voice: String,
    pub size: u64,
    pub duration_ms: f64,
}

impl EspeakEngine {
    pub fn new(
        binary: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
        default_voice: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir: scratch_dir.into(),
            default_voice: default_voice.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.engine_binary.clone(),
            config.scratch_dir.clone(),
            config.default_voice.clone(),
        )
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Locate the engine executable, searching PATH for bare names
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        let not_found = || TtsError::EngineNotFound(self.binary.display().to_string());

        if self.binary.is_absolute() || self.binary.components().count() > 1 {
            return if is_executable(&self.binary) {
                Ok(self.binary.clone())
            } else {
                Err(not_found())
            };
        }

        env::var_os("PATH")
            .and_then(|paths| {
                env::split_paths(&paths)
                    .map(|dir| dir.join(&self.binary))
                    .find(|candidate| is_executable(candidate))
            })
            .ok_or_else(not_found)
    }

    /// Check the scratch directory with a throwaway file
    pub async fn ensure_scratch_writable(&self) -> Result<()> {
        let unwritable = || TtsError::ScratchDirUnwritable(self.scratch_dir.display().to_string());

        let marker = self.scratch_dir.join(format!(".write_test_{}", Uuid::new_v4()));
        tokio::fs::write(&marker, b"").await.map_err(|e| {
            tracing::error!(dir = ?self.scratch_dir, error = %e, "Scratch directory write check failed");
            unwritable()
        })?;
        let _ = tokio::fs::remove_file(&marker).await;

        Ok(())
    }

    /// Argument vector for one synthesis run
    ///
    /// The text follows `--` so input starting with `-` is never read as a flag.
    pub fn build_args(voice: &str, params: &SynthesisParams, output: &Path) -> Vec<OsString> {
        vec![
            "-v".into(),
            voice.into(),
            "-s".into(),
            params.speed.to_string().into(),
            "-p".into(),
            params.pitch.to_string().into(),
            "-a".into(),
            params.volume.to_string().into(),
            "-w".into(),
            output.as_os_str().to_owned(),
            "--".into(),
            params.text.as_str().into(),
        ]
    }

    /// Synthesize speech into a fresh temporary WAV file
    ///
    /// The child is killed if this future is dropped before it exits, and
    /// the artifact is removed once the returned value (or its body) is dropped.
    pub async fn synthesize(&self, params: &SynthesisParams) -> Result<SynthesizedAudio> {
        let start = Instant::now();

        let script = detect_script(&params.text);
        if !script.matches_language(&params.lang) {
            tracing::warn!(
                detected = ?script,
                requested = %params.lang,
                "Text script does not match requested language"
            );
        }

        let voice = resolve_voice(
            &params.lang,
            params.voice_variant.as_deref(),
            &self.default_voice,
        );

        let binary = self.resolve_binary()?;
        self.ensure_scratch_writable().await?;

        let artifact = TempFile::new_in(&self.scratch_dir);
        let args = Self::build_args(&voice, params, artifact.path());

        tracing::debug!(
            voice = %voice,
            speed = params.speed,
            pitch = params.pitch,
            volume = params.volume,
            text_len = params.text.chars().count(),
            output = ?artifact.path(),
            "Running espeak-ng"
        );

        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TtsError::synthesis(format!("failed to launch {}: {}", binary.display(), e)))?;

        if !output.status.success() {
            return Err(TtsError::Synthesis {
                message: format!("engine exited with {}", output.status),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }

        let size = match tokio::fs::metadata(artifact.path()).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        if size == 0 {
            return Err(TtsError::Synthesis {
                message: "empty output".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }

        let wav_path = artifact.path().to_path_buf();
        let duration_ms = tokio::task::spawn_blocking(move || duration::from_file(&wav_path)).await??;

        tracing::info!(
            voice = %voice,
            bytes = size,
            audio_ms = duration_ms as u64,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Synthesis complete"
        );

        Ok(SynthesizedAudio {
            artifact,
            voice,
            size,
            duration_ms,
        })
    }

    /// Ask the engine for its installed voices
    pub async fn list_available_voices(&self) -> Result<Vec<VoiceInfo>> {
        let binary = self
            .resolve_binary()
            .map_err(|e| TtsError::VoiceList(e.to_string()))?;

        let output = Command::new(&binary)
            .arg("--voices")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TtsError::VoiceList(format!("failed to launch {}: {}", binary.display(), e)))?;

        if !output.status.success() {
            return Err(TtsError::VoiceList(format!(
                "engine exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_voice_list(&String::from_utf8_lossy(&output.stdout))
    }
}

impl SynthesizedAudio {
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }

    /// Stream the artifact as a response body
    ///
    /// The artifact travels with the stream and is deleted once the body
    /// has been fully read or dropped.
    pub async fn into_body(self) -> Result<Body> {
        let file = tokio::fs::File::open(self.artifact.path()).await?;

        let stream = futures::stream::unfold(Some((file, self.artifact)), |state| async move {
            let (mut file, artifact) = state?;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            match file.read(&mut buf).await {
                Ok(0) => None,
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok(Bytes::from(buf)), Some((file, artifact))))
                }
                Err(e) => Some((Err(e), None)),
            }
        });

        Ok(Body::from_stream(stream))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
