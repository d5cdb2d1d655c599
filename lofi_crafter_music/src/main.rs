// Lofi Crafter, CLI entry point.
//
// Composes one lofi piece (or one per style with --all), writes it as a MIDI
// file and optionally renders it to WAV with FluidSynth.
//
// Usage:
//   cargo run -p lofi_crafter_music -- [--style NAME] [--key KEY] [--mode MODE]
//     [--bpm N] [--measures N] [--no-percussion] [--instruments a,b,c]
//     [--seed N] [--output DIR] [--config FILE] [--render] [--soundfont FILE]
//   cargo run -p lofi_crafter_music -- --list
//   cargo run -p lofi_crafter_music -- --all [--measures N]
//
// Logging goes through env_logger; set RUST_LOG=debug for per-track detail.

use clap::Parser;
use lofi_crafter_music::config::EngineConfig;
use lofi_crafter_music::midi::write_midi;
use lofi_crafter_music::render::{wav_path_for, FluidSynthRenderer, Renderer};
use lofi_crafter_music::{compose_with, CompositionRequest, Instrument, Style};
use lofi_crafter_prng::LofiRng;
use std::path::{Path, PathBuf};

/// Measures per piece when generating every style at once.
const ALL_STYLES_MEASURES: u32 = 8;

#[derive(Parser, Debug)]
#[command(name = "lofi-crafter")]
#[command(about = "Procedural lofi composer: writes multi-track MIDI", long_about = None)]
struct Args {
    /// Style name (see --list). Unknown names fall back to chillhop.
    #[arg(long, default_value = "chillhop")]
    style: String,

    /// Key such as C, Am or Bb. Random from the style's preferences if omitted.
    #[arg(long)]
    key: Option<String>,

    /// Scale mode: major, minor, dorian, pentatonic_minor, lydian_b7
    #[arg(long)]
    mode: Option<String>,

    /// Tempo in BPM (20-300). Random from the style's range if omitted.
    #[arg(long)]
    bpm: Option<u16>,

    /// Number of 4/4 measures
    #[arg(long)]
    measures: Option<u32>,

    /// Leave out the drum track
    #[arg(long)]
    no_percussion: bool,

    /// Comma-separated instrument list (piano,bass,pad,melody,koto,accordion,shakuhachi,drums)
    #[arg(long, value_delimiter = ',')]
    instruments: Option<Vec<String>>,

    /// RNG seed (same seed => same piece). Derived from the clock if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// JSON engine config (resolution and style presets)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List styles and exit
    #[arg(long)]
    list: bool,

    /// Generate one piece per style
    #[arg(long)]
    all: bool,

    /// Render each MIDI file to WAV with FluidSynth
    #[arg(long)]
    render: bool,

    /// SoundFont used for rendering
    #[arg(long, value_name = "FILE")]
    soundfont: Option<PathBuf>,
}

impl Args {
    fn request(&self, style: &str) -> CompositionRequest {
        let mut request = CompositionRequest::new(style);
        request.overrides.key = self.key.clone();
        request.overrides.mode = self.mode.clone();
        request.overrides.bpm = self.bpm;
        request.overrides.measures = self.measures;
        if self.no_percussion {
            request.overrides.include_percussion = Some(false);
        }
        request.overrides.instruments = self.instruments.as_ref().map(|names| parse_instruments(names));
        request
    }
}

fn parse_instruments(names: &[String]) -> Vec<Instrument> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .filter_map(|name| {
            let inst = Instrument::from_name(name);
            if inst.is_none() {
                log::warn!("Unknown instrument '{name}', skipping");
            }
            inst
        })
        .collect()
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn print_styles(config: &EngineConfig) {
    for style in Style::ALL {
        let preset = config.preset(style);
        println!(
            "{:<16} {:<18} {:>3}-{:<3} BPM  {}",
            style.name(),
            preset.name,
            preset.bpm_range.0,
            preset.bpm_range.1,
            preset.description
        );
    }
}

/// Compose, write, and optionally render one piece. Returns false on failure.
fn generate(
    config: &EngineConfig,
    request: &CompositionRequest,
    output_dir: &Path,
    renderer: Option<&FluidSynthRenderer>,
    rng: &mut LofiRng,
) -> bool {
    let piece = match compose_with(config, request, rng) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Could not compose '{}': {e}", request.style);
            return false;
        }
    };

    let midi_path = output_dir.join(piece.file_name());
    if let Err(e) = write_midi(&piece, &midi_path) {
        log::error!("Error writing MIDI: {e}");
        return false;
    }
    println!(
        "{}: {} {} BPM, {} measures -> {}",
        piece.style.name(),
        piece.key.describe(),
        piece.bpm,
        piece.measures,
        midi_path.display()
    );

    if let Some(renderer) = renderer {
        match renderer.render(&midi_path, &wav_path_for(&midi_path)) {
            Ok(wav) => println!("  rendered {}", wav.display()),
            Err(e) => {
                log::error!("Rendering failed: {e} (MIDI kept at {})", midi_path.display());
                return false;
            }
        }
    }
    true
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_or_default(path),
        None => EngineConfig::default(),
    };

    if args.list {
        print_styles(&config);
        return;
    }

    if let Err(e) = std::fs::create_dir_all(&args.output) {
        eprintln!("Could not create {}: {e}", args.output.display());
        std::process::exit(1);
    }

    let seed = args.seed.unwrap_or_else(clock_seed);
    log::info!("Seed: {seed}");
    let mut rng = LofiRng::new(seed);

    let renderer = args
        .render
        .then(|| FluidSynthRenderer::new(args.soundfont.as_deref()));

    let ok = if args.all {
        let mut all_ok = true;
        for style in Style::ALL {
            let mut request = args.request(style.name());
            request.overrides.measures.get_or_insert(ALL_STYLES_MEASURES);
            // One child source per style, so each piece depends only on
            // the seed and its own position in the batch.
            let mut style_rng = rng.fork();
            all_ok &= generate(&config, &request, &args.output, renderer.as_ref(), &mut style_rng);
        }
        all_ok
    } else {
        generate(&config, &args.request(&args.style), &args.output, renderer.as_ref(), &mut rng)
    };

    if !ok {
        std::process::exit(1);
    }
}
