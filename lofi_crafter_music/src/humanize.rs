// Bounded random perturbation of timing and loudness.
//
// Every generator goes through these functions, so the whole groove is
// governed by the spread values in `GrooveFeel` rather than by ad-hoc
// randomness scattered through the track code. Ticks never go negative and
// velocities always land in [VELOCITY_FLOOR, VELOCITY_CEILING], whatever the
// spread.

use crate::event::Tick;
use lofi_crafter_prng::LofiRng;

/// Quietest velocity any generated note may have. Keeps ghost notes audible.
pub const VELOCITY_FLOOR: u8 = 20;

/// Loudest velocity any generated note may have. Leaves headroom below 127.
pub const VELOCITY_CEILING: u8 = 120;

/// `base_tick + uniform(-spread, spread)`, floored at zero.
pub fn jitter_time(base_tick: Tick, spread: u32, rng: &mut LofiRng) -> Tick {
    let spread = spread as i64;
    let offset = rng.range_i64_inclusive(-spread, spread);
    (base_tick as i64 + offset).clamp(0, Tick::MAX as i64) as Tick
}

/// `base_velocity + uniform(-spread, spread)`, clamped to the velocity range.
pub fn jitter_velocity(base_velocity: i32, spread: u32, rng: &mut LofiRng) -> u8 {
    jitter_velocity_capped(base_velocity, spread, VELOCITY_CEILING, rng)
}

/// `jitter_velocity` with a lower ceiling, for voices that must stay in the
/// background. A ceiling below the floor is raised to the floor.
pub fn jitter_velocity_capped(base_velocity: i32, spread: u32, ceiling: u8, rng: &mut LofiRng) -> u8 {
    let spread = spread as i64;
    let offset = rng.range_i64_inclusive(-spread, spread);
    let ceiling = ceiling.clamp(VELOCITY_FLOOR, VELOCITY_CEILING) as i64;
    (base_velocity as i64 + offset).clamp(VELOCITY_FLOOR as i64, ceiling) as u8
}

/// Push a hit behind the beat by `uniform(min_late, max_late)` ticks.
/// Used for the laid-back backbeat.
pub fn drag_time(base_tick: Tick, min_late: u32, max_late: u32, rng: &mut LofiRng) -> Tick {
    let (lo, hi) = if min_late <= max_late {
        (min_late, max_late)
    } else {
        (max_late, min_late)
    };
    let late = rng.range_i64_inclusive(lo as i64, hi as i64);
    base_tick.saturating_add(late as Tick)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_time_stays_within_spread() {
        let mut rng = LofiRng::new(1);
        for _ in 0..5_000 {
            let t = jitter_time(1_000, 40, &mut rng);
            assert!((960..=1_040).contains(&t), "tick {t}");
        }
    }

    #[test]
    fn test_jitter_time_never_negative() {
        let mut rng = LofiRng::new(2);
        for _ in 0..5_000 {
            // u32 already rules out negatives; the clamp must keep small
            // bases from wrapping around to huge ticks.
            assert!(jitter_time(5, 100, &mut rng) <= 105);
        }
        assert_eq!(jitter_time(0, 0, &mut rng), 0);
    }

    #[test]
    fn test_zero_spread_is_identity() {
        let mut rng = LofiRng::new(3);
        assert_eq!(jitter_time(480, 0, &mut rng), 480);
        assert_eq!(jitter_velocity(64, 0, &mut rng), 64);
    }

    #[test]
    fn test_velocity_clamped_for_extreme_spreads() {
        let mut rng = LofiRng::new(4);
        for spread in [0, 5, 50, 500, u32::MAX] {
            for base in [-1_000, 0, 25, 75, 127, 10_000] {
                for _ in 0..200 {
                    let v = jitter_velocity(base, spread, &mut rng);
                    assert!(
                        (VELOCITY_FLOOR..=VELOCITY_CEILING).contains(&v),
                        "velocity {v} from base {base} spread {spread}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_capped_velocity_respects_ceiling() {
        let mut rng = LofiRng::new(5);
        for _ in 0..2_000 {
            let v = jitter_velocity_capped(70, 30, 55, &mut rng);
            assert!((VELOCITY_FLOOR..=55).contains(&v));
        }
        // A nonsensical ceiling still yields a legal velocity.
        assert_eq!(jitter_velocity_capped(70, 0, 0, &mut rng), VELOCITY_FLOOR);
    }

    #[test]
    fn test_drag_time_is_always_late() {
        let mut rng = LofiRng::new(6);
        for _ in 0..2_000 {
            let t = drag_time(480, 15, 45, &mut rng);
            assert!((495..=525).contains(&t));
        }
        let t = drag_time(480, 45, 15, &mut rng);
        assert!((495..=525).contains(&t));
    }
}
