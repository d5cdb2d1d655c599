// Audio rendering from a written MIDI file.
//
// Synthesis itself is external. `Renderer` is the seam; `FluidSynthRenderer`
// runs the FluidSynth command line in offline mode:
//
//   fluidsynth -ni -F <out.wav> -r <rate> <soundfont> <in.mid>
//
// A missing soundfont is only a warning (FluidSynth may still find one of its
// own). A missing input, a spawn failure or a non-zero exit is an error for
// that attempt. The MIDI file is only ever read, so a failed render can be
// retried against the same file.

use crate::error::RenderError;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_SOUNDFONT: &str = "/usr/share/sounds/sf2/FluidR3_GM.sf2";
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

pub trait Renderer {
    /// Render `midi` into an audio file at `output`, returning its path.
    fn render(&self, midi: &Path, output: &Path) -> Result<PathBuf, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluidSynthRenderer {
    pub program: String,
    pub soundfont: PathBuf,
    pub sample_rate: u32,
}

impl Default for FluidSynthRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FluidSynthRenderer {
    /// Use `soundfont` if it exists, else the system General MIDI bank.
    pub fn new(soundfont: Option<&Path>) -> Self {
        let soundfont = match soundfont {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => {
                log::warn!(
                    "SoundFont {} not found, falling back to {DEFAULT_SOUNDFONT}",
                    path.display()
                );
                PathBuf::from(DEFAULT_SOUNDFONT)
            }
            None => PathBuf::from(DEFAULT_SOUNDFONT),
        };
        if !soundfont.exists() {
            log::warn!("SoundFont {} not found; rendering may fail", soundfont.display());
        }
        FluidSynthRenderer {
            program: "fluidsynth".to_string(),
            soundfont,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, midi: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-ni")
            .arg("-F")
            .arg(output)
            .arg("-r")
            .arg(self.sample_rate.to_string())
            .arg(&self.soundfont)
            .arg(midi);
        cmd
    }
}

impl Renderer for FluidSynthRenderer {
    fn render(&self, midi: &Path, output: &Path) -> Result<PathBuf, RenderError> {
        if !midi.exists() {
            return Err(RenderError::MissingInput(midi.to_path_buf()));
        }
        log::info!(
            "Rendering {} with {}",
            midi.display(),
            self.soundfont.file_name().unwrap_or_default().to_string_lossy()
        );

        let result = self.command(midi, output).output().map_err(|source| RenderError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if !result.status.success() {
            return Err(RenderError::ProcessFailed {
                program: self.program.clone(),
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        log::info!("Rendered {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// The WAV path that sits next to a MIDI file.
pub fn wav_path_for(midi: &Path) -> PathBuf {
    midi.with_extension("wav")
}
