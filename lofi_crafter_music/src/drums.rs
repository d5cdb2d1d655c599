// Percussion kit and swing.
//
// Three sub-patterns per bar, all on General MIDI drum keys:
// - kick on beat 1 and a syncopated kick on the "and" of 3 (sometimes
//   dropped), loosely timed;
// - rimshot on 2 and snare on 4, always dragged late for a laid-back
//   backbeat, each possibly followed half a beat later by a quiet ghost snare;
// - hi-hat on every beat and every off-beat. Off-beats are swung: they land
//   `round_up((swing_fraction - 0.5) * ticks_per_beat)` ticks after the
//   straight eighth. The bar's last off-beat may open the hat.
//
// The swing fraction is drawn once per composition (compose.rs) from the
// style's range and passed in through `GenContext`.

use crate::event::{Instrument, Tick, Track};
use crate::generate::{GenContext, BEATS_PER_MEASURE};
use crate::humanize::{drag_time, jitter_time, jitter_velocity};
use crate::style::Hit;
use lofi_crafter_prng::LofiRng;

pub const KICK: i32 = 36;
pub const RIMSHOT: i32 = 37;
pub const SNARE: i32 = 38;
pub const CLOSED_HAT: i32 = 42;
pub const OPEN_HAT: i32 = 46;

/// Straight eighths.
pub const MIN_SWING: f64 = 0.5;
/// Beyond this the off-beat collides with the next beat's hit.
pub const MAX_SWING: f64 = 0.75;

/// Draw a swing fraction from a style range, clamped to the legal span.
pub fn draw_swing(range: (f64, f64), rng: &mut LofiRng) -> f64 {
    let lo = range.0.clamp(MIN_SWING, MAX_SWING);
    let hi = range.1.clamp(MIN_SWING, MAX_SWING);
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    rng.range_f64(lo, hi)
}

/// Delay of a swung off-beat behind the straight eighth. Zero for 0.5,
/// strictly positive for anything above.
pub fn swing_offset(ticks_per_beat: Tick, swing_fraction: f64) -> Tick {
    let fraction = swing_fraction.clamp(MIN_SWING, MAX_SWING);
    ((fraction - MIN_SWING) * ticks_per_beat as f64).ceil() as Tick
}

/// Distance from a beat to its swung off-beat.
pub fn swung_offbeat(ticks_per_beat: Tick, swing_fraction: f64) -> Tick {
    ticks_per_beat / 2 + swing_offset(ticks_per_beat, swing_fraction)
}

fn hit(track: &mut Track, on: Tick, length: Tick, pitch: i32, feel: Hit, rng: &mut LofiRng) {
    let velocity = jitter_velocity(feel.velocity, feel.velocity_spread, rng);
    track.push_note(on, on + length, pitch, velocity);
}

pub fn percussion_track(ctx: &GenContext, rng: &mut LofiRng) -> Track {
    let mut track = Track::new(Instrument::Drums);
    let feel = &ctx.groove.drums;
    let tpb = ctx.ticks_per_beat;
    let kick_len = (tpb * 5 / 24).max(1);
    let snare_len = (tpb / 4).max(1);
    let short_len = (tpb / 6).max(1);
    let open_len = (tpb / 3).max(1);
    let offbeat = swung_offbeat(tpb, ctx.swing_fraction);

    for m in 0..ctx.measures {
        let bar = ctx.measure_start(m);

        for (i, eighth) in [0u32, 5].into_iter().enumerate() {
            if i > 0 && rng.random_bool(feel.kick_skip_chance) {
                continue;
            }
            let t = jitter_time(ctx.eighth(m, eighth), ctx.scale_ticks(feel.kick.time_spread), rng);
            hit(&mut track, t, kick_len, KICK, feel.kick, rng);
        }

        for (beat, drum) in [(1, RIMSHOT), (3, SNARE)] {
            let (min_late, max_late) = feel.backbeat_drag;
            let t = drag_time(
                bar + beat * tpb,
                ctx.scale_ticks(min_late),
                ctx.scale_ticks(max_late),
                rng,
            );
            hit(&mut track, t, snare_len, drum, feel.backbeat, rng);
            if rng.random_bool(feel.ghost_chance) {
                hit(&mut track, t + tpb / 2, short_len, SNARE, feel.ghost, rng);
            }
        }

        for beat in 0..BEATS_PER_MEASURE {
            let beat_tick = bar + beat * tpb;
            let t1 = jitter_time(beat_tick, ctx.scale_ticks(feel.hat.time_spread), rng);
            hit(&mut track, t1, short_len, CLOSED_HAT, feel.hat, rng);

            let t2 = jitter_time(
                beat_tick + offbeat,
                ctx.scale_ticks(feel.offbeat_hat.time_spread),
                rng,
            );
            let open = beat == BEATS_PER_MEASURE - 1 && rng.random_bool(feel.open_hat_chance);
            let (pitch, length) = if open { (OPEN_HAT, open_len) } else { (CLOSED_HAT, short_len) };
            hit(&mut track, t2, length, pitch, feel.offbeat_hat, rng);
        }
    }
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::generate::tests::{assert_well_formed, context, TPB};
    use crate::progression::{HarmonicCharacter, Progression};
    use crate::style::GrooveFeel;

    fn prog() -> Progression {
        Progression::new(
            HarmonicCharacter::Melancholic,
            HarmonicCharacter::Melancholic.catalog()[0],
        )
    }

    #[test]
    fn test_no_swing_at_half() {
        assert_eq!(swing_offset(480, 0.5), 0);
        assert_eq!(swung_offbeat(480, 0.5), 240);
        assert_eq!(swing_offset(481, 0.5), 0);
    }

    #[test]
    fn test_swing_positive_above_half() {
        for f in [0.5001, 0.55, 0.58, 0.62, 0.66, 0.75] {
            assert!(swing_offset(480, f) > 0, "fraction {f}");
        }
        assert_eq!(swing_offset(480, 0.6), 48);
        // Out-of-range fractions are clamped.
        assert_eq!(swing_offset(480, 0.2), 0);
        assert_eq!(swing_offset(480, 0.9), swing_offset(480, MAX_SWING));
    }

    #[test]
    fn test_draw_swing_respects_range() {
        let mut rng = LofiRng::new(1);
        for _ in 0..1_000 {
            let s = draw_swing((0.58, 0.62), &mut rng);
            assert!((0.58..0.62).contains(&s));
        }
        assert_eq!(draw_swing((0.5, 0.5), &mut rng), 0.5);
        assert_eq!(draw_swing((0.1, 0.2), &mut rng), 0.5);
    }

    #[test]
    fn test_kit_is_well_formed() {
        let p = prog();
        let groove = GrooveFeel::default();
        let ctx = context(&p, &groove, 8);
        let track = percussion_track(&ctx, &mut LofiRng::new(2));
        assert_well_formed(&track);
        assert_eq!(track.channel, 9);
    }

    #[test]
    fn test_hats_pair_with_swung_offbeats() {
        let p = prog();
        let groove = GrooveFeel::default();
        let ctx = context(&p, &groove, 4);
        let track = percussion_track(&ctx, &mut LofiRng::new(3));
        let swung = swung_offbeat(TPB, ctx.swing_fraction) as i64;
        let spread = (groove.drums.hat.time_spread + groove.drums.offbeat_hat.time_spread) as i64;

        let mut hats: Vec<_> = track
            .events
            .iter()
            .filter(|e| e.kind == EventKind::On)
            .filter(|e| e.pitch as i32 == CLOSED_HAT || e.pitch as i32 == OPEN_HAT)
            .map(|e| e.tick as i64)
            .collect();
        hats.sort_unstable();
        assert_eq!(hats.len(), 4 * 8);
        for pair in hats.chunks(2) {
            let gap = pair[1] - pair[0];
            assert!(gap > 0);
            assert!((gap - swung).abs() <= spread, "gap {gap} vs swung {swung}");
        }
    }

    #[test]
    fn test_backbeat_is_always_late() {
        let p = prog();
        let mut groove = GrooveFeel::default();
        groove.drums.ghost_chance = 0.0;
        let ctx = context(&p, &groove, 4);
        let track = percussion_track(&ctx, &mut LofiRng::new(4));
        for e in track.events.iter().filter(|e| e.kind == EventKind::On) {
            if e.pitch as i32 == RIMSHOT || e.pitch as i32 == SNARE {
                let into_beat = e.tick % TPB;
                assert!((15..=45).contains(&into_beat), "backbeat at {}", e.tick);
            }
        }
    }

    #[test]
    fn test_ghosts_are_quiet() {
        let p = prog();
        let mut groove = GrooveFeel::default();
        groove.drums.ghost_chance = 1.0;
        let ctx = context(&p, &groove, 4);
        let track = percussion_track(&ctx, &mut LofiRng::new(5));
        let snares: Vec<_> = track
            .events
            .iter()
            .filter(|e| e.kind == EventKind::On && e.pitch as i32 == SNARE)
            .collect();
        // Each bar: two ghosts plus the beat-4 snare.
        assert_eq!(snares.len(), 4 * 3);
        let ghosts = snares.iter().filter(|e| e.velocity <= 30).count();
        assert_eq!(ghosts, 4 * 2);
    }
}
