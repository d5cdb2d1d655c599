// End-to-end tests for the composition pipeline.
//
// Each test goes through the public API only: request -> compose -> (MIDI
// bytes -> read back), checking the properties a listener or a downstream
// renderer depends on.

use lofi_crafter_music::config::EngineConfig;
use lofi_crafter_music::drums::{swung_offbeat, CLOSED_HAT, OPEN_HAT};
use lofi_crafter_music::midi::{read_midi, to_bytes, write_midi};
use lofi_crafter_music::{compose, compose_with, CompositionRequest, EventKind, Instrument, Style};
use lofi_crafter_prng::LofiRng;

fn sleepy() -> CompositionRequest {
    CompositionRequest::new("sleepy")
        .key("A")
        .bpm(65)
        .measures(4)
        .percussion(false)
}

#[test]
fn test_sleepy_piece_without_percussion() {
    let piece = compose(&sleepy(), &mut LofiRng::new(1)).unwrap();

    assert_eq!(piece.style, Style::Sleep);
    assert_eq!(piece.bpm, 65);
    assert_eq!(piece.measures, 4);
    let roles: Vec<_> = piece.tracks.iter().map(|t| t.instrument).collect();
    assert_eq!(
        roles,
        vec![Instrument::Piano, Instrument::Bass, Instrument::Pad, Instrument::Melody]
    );
    assert!(!piece.has_percussion());
    assert!(piece.tracks.iter().all(|t| t.channel != 9));

    let total = 4 * 4 * piece.ticks_per_beat as u32;
    assert_eq!(piece.total_ticks(), total);
    let harmony = piece.track(Instrument::Piano).unwrap();
    assert!(!harmony.is_empty());
    assert!(harmony.events.iter().all(|e| e.tick < total));
}

#[test]
fn test_energetic_swing_hats_are_swung() {
    let request = CompositionRequest::new("energetic_swing").measures(2);
    let piece = compose(&request, &mut LofiRng::new(2)).unwrap();
    assert!((0.62..=0.66).contains(&piece.swing_fraction), "{}", piece.swing_fraction);

    let drums = piece.track(Instrument::Drums).expect("percussion track");
    let hats: Vec<i64> = drums
        .events
        .iter()
        .filter(|e| e.kind == EventKind::On)
        .filter(|e| e.pitch as i32 == CLOSED_HAT || e.pitch as i32 == OPEN_HAT)
        .map(|e| e.tick as i64)
        .collect();
    assert_eq!(hats.len(), 2 * 8);

    let tpb = piece.ticks_per_beat as i64;
    let swung = swung_offbeat(tpb as u32, piece.swing_fraction) as i64;
    let preset = EngineConfig::default().preset(Style::EnergeticSwing);
    let spread = (preset.groove.drums.hat.time_spread + preset.groove.drums.offbeat_hat.time_spread) as i64;
    // Swing offset: strictly positive, and short of the next beat.
    assert!(swung - tpb / 2 > 0);
    assert!(swung - tpb / 2 < tpb / 2);
    for pair in hats.chunks(2) {
        assert!((pair[1] - pair[0] - swung).abs() <= spread, "{pair:?} vs {swung}");
    }
}

#[test]
fn test_same_seed_same_bytes() {
    let request = CompositionRequest::new("jazzhop").measures(8);
    let a = to_bytes(&compose(&request, &mut LofiRng::new(42)).unwrap()).unwrap();
    let b = to_bytes(&compose(&request, &mut LofiRng::new(42)).unwrap()).unwrap();
    let c = to_bytes(&compose(&request, &mut LofiRng::new(43)).unwrap()).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_midi_file_round_trip_preserves_ticks_and_tempo() {
    let piece = compose(&sleepy(), &mut LofiRng::new(3)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(piece.file_name());
    write_midi(&piece, &path).unwrap();

    let parsed = read_midi(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(parsed.ticks_per_beat, piece.ticks_per_beat);
    let bpm = parsed.bpm().unwrap();
    assert!((bpm - 65.0).abs() < 0.01, "{bpm}");
    assert_eq!(parsed.tracks.len(), piece.tracks.len() + 1);

    for (track, read) in piece.tracks.iter().zip(&parsed.tracks[1..]) {
        let expected: Vec<_> = track.events.iter().map(|e| (e.tick, e.kind, e.pitch)).collect();
        let actual: Vec<_> = read.events.iter().map(|e| (e.tick, e.kind, e.pitch)).collect();
        assert_eq!(actual, expected, "{:?}", track.instrument);
    }
}

#[test]
fn test_batch_pieces_do_not_depend_on_earlier_items() {
    // Mirrors `--all`: one forked source per style.
    let mut parent_a = LofiRng::new(9);
    let mut first = parent_a.fork();
    compose(&CompositionRequest::new("jazzhop").measures(8), &mut first).unwrap();
    let second_a = compose(&sleepy(), &mut parent_a.fork()).unwrap();

    // Same batch position, but the first item drew nothing.
    let mut parent_b = LofiRng::new(9);
    let _unused = parent_b.fork();
    let second_b = compose(&sleepy(), &mut parent_b.fork()).unwrap();

    assert_eq!(to_bytes(&second_a).unwrap(), to_bytes(&second_b).unwrap());
}

#[test]
fn test_every_style_composes() {
    let mut rng = LofiRng::new(4);
    for style in Style::ALL {
        let piece = compose(&CompositionRequest::new(style.name()).measures(4), &mut rng).unwrap();
        assert_eq!(piece.style, style);
        let preset = EngineConfig::default().preset(style);
        assert!((preset.bpm_range.0..=preset.bpm_range.1).contains(&piece.bpm));
        assert_eq!(piece.has_percussion(), preset.has_percussion, "{style:?}");
        for track in &piece.tracks {
            let ons = track.events.iter().filter(|e| e.kind == EventKind::On).count();
            let offs = track.events.len() - ons;
            assert_eq!(ons, offs, "{style:?} {:?}", track.instrument);
        }
    }
}

#[test]
fn test_config_file_changes_the_catalog() {
    let json = r#"{
        "styles": {
            "chillhop": {
                "name": "House Chillhop",
                "bpm_range": [88, 88],
                "key_preferences": ["Gm"],
                "mode": "minor",
                "measures": 2,
                "has_percussion": false,
                "instruments": ["pad"]
            }
        }
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lofi.json");
    std::fs::write(&path, json).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let piece = compose_with(&config, &CompositionRequest::new("chillhop"), &mut LofiRng::new(5)).unwrap();
    assert_eq!(piece.bpm, 88);
    assert_eq!(piece.key.root, 7);
    assert_eq!(piece.measures, 2);
    assert_eq!(piece.tracks.len(), 1);
    assert_eq!(piece.tracks[0].instrument, Instrument::Pad);
    assert_eq!(piece.file_name(), "lofi_chillhop_Gm_88bpm.mid");
}
