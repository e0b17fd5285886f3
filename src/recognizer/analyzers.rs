//! Built-in analyzers. Angles in arguments are degrees; track angles are radians.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use super::{AnalyzerRegistry, GestureContext};
use crate::track::Track;

const TAP_MAX_LENGTH: f64 = 5.0;
const TAP_MAX_DURATION_MS: f64 = 400.0;
const LONG_TAP_MIN_DURATION_MS: f64 = 400.0;
const LINE_MIN_LENGTH: f64 = 5.0;
const ARC_MIN_LENGTH: f64 = 20.0;
const DEFAULT_THRESHOLD_DEG: f64 = 30.0;
const DEFAULT_CIRCLE_THRESHOLD: f64 = 0.8;
const DEFAULT_PARALLEL_THRESHOLD_DEG: f64 = 45.0;
const DEFAULT_THROW_SPEED: f64 = 5.0;

pub fn register_builtins(registry: &mut AnalyzerRegistry) {
    registry.register_analyzer("press", press);
    registry.register_analyzer("tap", tap);
    registry.register_analyzer("longTap", long_tap);
    registry.register_analyzer("line", line);
    registry.register_analyzer("swipe", line);
    registry.register_analyzer("throw", throw);
    registry.register_analyzer("arc", arc);
    registry.register_analyzer("curve", arc);
    registry.register_analyzer("circle", circle);
    registry.register_analyzer("loop", loops);
    registry.register_analyzer("pinch", pinch);
}

fn arg(args: &[&str], idx: usize) -> Option<f64> {
    args.get(idx).and_then(|a| a.trim().parse::<f64>().ok())
}

fn arg_or(args: &[&str], idx: usize, default: f64) -> f64 {
    arg(args, idx).unwrap_or(default)
}

/// Angular argument in radians; missing or non-positive values use the default.
fn threshold_rad(args: &[&str], idx: usize, default_deg: f64) -> f64 {
    arg(args, idx)
        .filter(|v| *v > 0.0)
        .unwrap_or(default_deg)
        .to_radians()
}

fn score_if(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

pub fn press(_track: &Track, _ctx: &GestureContext<'_>, _args: &[&str]) -> f64 {
    1.0
}

/// `tap(min_ms = 0, max_ms = 400)`
pub fn tap(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let min = arg_or(args, 0, 0.0);
    let max = arg_or(args, 1, TAP_MAX_DURATION_MS);
    let duration = track.duration() as f64;
    score_if(track.length() < TAP_MAX_LENGTH && duration >= min && duration < max)
}

/// `longTap(min_ms = 400)`
pub fn long_tap(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let min = arg_or(args, 0, LONG_TAP_MIN_DURATION_MS);
    score_if(track.length() < TAP_MAX_LENGTH && track.duration() as f64 >= min)
}

/// `line(angle_deg, threshold_deg = 30)`: a mostly straight stroke ending along `angle`.
pub fn line(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let Some(angle) = arg(args, 0).map(f64::to_radians) else {
        return 0.0;
    };
    let threshold = threshold_rad(args, 1, DEFAULT_THRESHOLD_DEG);
    line_score(track, angle, threshold)
}

fn line_score(track: &Track, angle: f64, threshold: f64) -> f64 {
    if track.absolute_rotation() >= FRAC_PI_2 || track.length() <= LINE_MIN_LENGTH {
        return 0.0;
    }
    let end = track.end_angle();
    let delta = (end - angle).abs().min((end + TAU - angle).abs());
    if delta <= threshold {
        1.0 - delta / (2.0 * threshold)
    } else {
        0.0
    }
}

/// `throw(angle_deg, threshold_deg = 30, min_speed_px_s = 5)`: a line still moving
/// when released.
pub fn throw(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let Some(angle) = arg(args, 0).map(f64::to_radians) else {
        return 0.0;
    };
    let threshold = threshold_rad(args, 1, DEFAULT_THRESHOLD_DEG);
    let min_speed = arg_or(args, 2, DEFAULT_THROW_SPEED);
    if track.end_speed_px_per_sec() < min_speed {
        return 0.0;
    }
    line_score(track, angle, threshold)
}

/// `arc(angle_deg, threshold_deg = 30)`: total signed turning close to `angle`.
pub fn arc(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let Some(angle) = arg(args, 0).map(f64::to_radians) else {
        return 0.0;
    };
    let threshold = threshold_rad(args, 1, DEFAULT_THRESHOLD_DEG);
    let delta = (track.rotation() - angle).abs();
    if track.length() <= ARC_MIN_LENGTH || delta > threshold {
        return 0.0;
    }
    1.0 - delta / (2.0 * threshold)
}

/// `circle(threshold = 0.8)`: how evenly the samples sit around the centroid.
pub fn circle(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let threshold = arg(args, 0)
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_CIRCLE_THRESHOLD);
    let middle = track.middle();
    let (min, max) = track
        .points()
        .iter()
        .map(|p| p.distance_to(&middle))
        .fold((f64::MAX, 0.0_f64), |(min, max), d| (min.min(d), max.max(d)));
    if max <= 0.0 {
        return 0.0;
    }
    (threshold - (max - min) / max).max(0.0)
}

/// `loop(count = 1)`
pub fn loops(track: &Track, _ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    let count = arg(args, 0).map_or(1, |c| c as i32);
    score_if(track.loops().abs() == count)
}

/// `pinch(zoom, parallel_threshold_deg = 45)`: two fingers moving apart (`zoom < 0`)
/// or together (`zoom > 0`) along a common axis.
pub fn pinch(track: &Track, ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
    if ctx.current_step_tracks.len() != 2 {
        return 0.0;
    }
    let Some(zoom) = arg(args, 0) else {
        return 0.0;
    };
    let parallel = threshold_rad(args, 1, DEFAULT_PARALLEL_THRESHOLD_DEG);
    let Some(other) = ctx.others().next() else {
        return 0.0;
    };

    let (Some(first), Some(last)) = (track.first_point(), track.last_point()) else {
        return 0.0;
    };
    let (Some(other_first), Some(other_last)) = (other.first_point(), other.last_point()) else {
        return 0.0;
    };

    let start_bearing = first.angle_to(other_first);
    let end_bearing = last.angle_to(other_last);
    let start_gap = first.distance_to(other_first);
    let end_gap = last.distance_to(other_last);

    let heading = track.offset().angle();
    let other_heading = other.offset().angle();
    let opposite = (heading.sin() + other_heading.sin()).abs() < FRAC_PI_4
        && (heading.cos() + other_heading.cos()).abs() < FRAC_PI_4;

    score_if(
        opposite
            && start_gap * zoom > end_gap * zoom
            && angle_between(start_bearing, end_bearing) <= parallel,
    )
}

/// Unsigned difference between two bearings, in `[0, pi]`.
fn angle_between(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        recognizer::{Step, build_steps},
        types::{Point, Timestamp},
    };

    fn track_from(id: u32, points: &[(f64, f64)], start: Timestamp, step_ms: Timestamp) -> Track {
        let mut track = Track::new(id, start);
        for (i, (x, y)) in points.iter().enumerate() {
            track.push(Point::new(*x, *y, start + i as u64 * step_ms));
        }
        track.end(start + (points.len().max(1) as u64 - 1) * step_ms);
        track
    }

    fn straight(id: u32, from: (f64, f64), to: (f64, f64), samples: usize) -> Track {
        let points: Vec<(f64, f64)> = (0..samples)
            .map(|i| {
                let f = i as f64 / (samples - 1) as f64;
                (from.0 + (to.0 - from.0) * f, from.1 + (to.1 - from.1) * f)
            })
            .collect();
        track_from(id, &points, 0, 16)
    }

    fn ring(turns: f64, radius: f64) -> Track {
        let samples = (turns * 24.0).round() as usize;
        let points: Vec<(f64, f64)> = (0..=samples)
            .map(|i| {
                let theta = i as f64 / 24.0 * TAU;
                (200.0 + radius * theta.cos(), 200.0 + radius * theta.sin())
            })
            .collect();
        track_from(0, &points, 0, 16)
    }

    fn score_alone(
        f: fn(&Track, &GestureContext<'_>, &[&str]) -> f64,
        track: &Track,
        args: &[&str],
    ) -> f64 {
        let session = std::slice::from_ref(track);
        let steps = build_steps(session);
        let ctx = GestureContext {
            all_tracks: session,
            steps: &steps,
            current_step_tracks: &steps[0].tracks,
            subject_track_index: 0,
        };
        f(track, &ctx, args)
    }

    fn score_pair(session: &[Track], zoom: &str) -> (f64, f64) {
        let steps: Vec<Step<'_>> = build_steps(session);
        let score = |subject| {
            let ctx = GestureContext {
                all_tracks: session,
                steps: &steps,
                current_step_tracks: &steps[0].tracks,
                subject_track_index: subject,
            };
            pinch(steps[0].tracks[subject], &ctx, &[zoom])
        };
        (score(0), score(1))
    }

    #[test]
    fn tap_and_long_tap_split_on_duration() {
        let quick = track_from(0, &[(1.0, 1.0), (2.0, 2.0)], 0, 100);
        let slow = track_from(0, &[(1.0, 1.0), (2.0, 2.0)], 0, 600);
        assert_eq!(score_alone(tap, &quick, &[]), 1.0);
        assert_eq!(score_alone(long_tap, &quick, &[]), 0.0);
        assert_eq!(score_alone(tap, &slow, &[]), 0.0);
        assert_eq!(score_alone(long_tap, &slow, &[]), 1.0);
        assert_eq!(score_alone(tap, &slow, &["0", "1000"]), 1.0);
        assert_eq!(score_alone(long_tap, &slow, &["700"]), 0.0);
    }

    #[test]
    fn tap_rejects_movement() {
        let moved = track_from(0, &[(0.0, 0.0), (10.0, 0.0)], 0, 50);
        assert_eq!(score_alone(tap, &moved, &[]), 0.0);
        assert_eq!(score_alone(press, &moved, &[]), 1.0);
    }

    #[test]
    fn line_follows_end_angle() {
        // Moving left: the last sample looks back towards +x.
        let left = straight(0, (300.0, 100.0), (100.0, 100.0), 10);
        assert_eq!(score_alone(line, &left, &["0"]), 1.0);
        assert_eq!(score_alone(line, &left, &["90"]), 0.0);

        let rise = 200.0 * 15f64.to_radians().tan();
        let tilted = straight(0, (300.0, 100.0), (100.0, 100.0 - rise), 10);
        let score = score_alone(line, &tilted, &["0"]);
        assert!((score - 0.75).abs() < 1e-9, "got {score}");
        assert_eq!(score_alone(line, &tilted, &["0", "10"]), 0.0);
    }

    #[test]
    fn line_wraps_around_half_turn() {
        let right = straight(0, (100.0, 100.0), (300.0, 100.0 + 1e-6), 10);
        assert!(right.end_angle() < 0.0);
        assert!(score_alone(line, &right, &["180"]) > 0.99);
        assert_eq!(score_alone(line, &right, &[]), 0.0);
    }

    #[test]
    fn line_rejects_short_or_curved_strokes() {
        let short = straight(0, (0.0, 0.0), (4.0, 0.0), 5);
        assert_eq!(score_alone(line, &short, &["180"]), 0.0);
        let curved = ring(0.5, 80.0);
        assert_eq!(score_alone(line, &curved, &["0", "180"]), 0.0);
    }

    #[test]
    fn throw_needs_release_speed() {
        let fast = straight(0, (300.0, 100.0), (100.0, 100.0), 10);
        assert!(fast.end_speed_px_per_sec() > 1_000.0);
        assert_eq!(score_alone(throw, &fast, &["0"]), 1.0);
        assert_eq!(score_alone(throw, &fast, &["0", "30", "100000"]), 0.0);
    }

    #[test]
    fn arc_scores_signed_rotation() {
        let full = ring(1.2, 80.0);
        let degrees = full.rotation().to_degrees();
        assert!(degrees.abs() > 360.0);
        let target = format!("{}", degrees.round());
        assert!(score_alone(arc, &full, &[&target, "90"]) > 0.99);
        let opposite = format!("{}", -degrees.round());
        assert_eq!(score_alone(arc, &full, &[&opposite, "90"]), 0.0);
    }

    #[test]
    fn circle_prefers_round_paths() {
        let round = ring(1.0, 80.0);
        let score = score_alone(circle, &round, &[]);
        // The closing sample repeats the first one, pulling the centroid slightly.
        assert!(score > 0.7, "got {score}");

        let flat = straight(0, (0.0, 0.0), (200.0, 0.0), 20);
        assert_eq!(score_alone(circle, &flat, &[]), 0.0);

        let dot = track_from(0, &[(5.0, 5.0), (5.0, 5.0)], 0, 10);
        assert_eq!(score_alone(circle, &dot, &[]), 0.0);
    }

    #[test]
    fn loop_counts_whole_turns() {
        let once = ring(1.3, 60.0);
        let twice = ring(2.3, 60.0);
        assert_eq!(score_alone(loops, &once, &[]), 1.0);
        assert_eq!(score_alone(loops, &twice, &[]), 0.0);
        assert_eq!(score_alone(loops, &twice, &["2"]), 1.0);
    }

    #[test]
    fn pinch_detects_spread_and_squeeze() {
        let spread = vec![
            straight(0, (190.0, 200.0), (100.0, 200.0), 8),
            straight(1, (210.0, 200.0), (300.0, 200.0), 8),
        ];
        assert_eq!(score_pair(&spread, "-1"), (1.0, 1.0));
        assert_eq!(score_pair(&spread, "1"), (0.0, 0.0));

        let squeeze = vec![
            straight(0, (100.0, 200.0), (190.0, 200.0), 8),
            straight(1, (300.0, 200.0), (210.0, 200.0), 8),
        ];
        assert_eq!(score_pair(&squeeze, "1"), (1.0, 1.0));
        assert_eq!(score_pair(&squeeze, "-1"), (0.0, 0.0));
    }

    #[test]
    fn pinch_tolerates_jitter_across_the_bearing_seam() {
        // Seen from the right finger the left one sits near +-pi; a fraction of a pixel
        // of vertical drift flips the sign of that bearing.
        let spread = vec![
            straight(0, (90.0, 100.0), (20.0, 100.0), 8),
            straight(1, (110.0, 100.2), (180.0, 99.5), 8),
        ];
        assert_eq!(score_pair(&spread, "-1"), (1.0, 1.0));
        assert_eq!(score_pair(&spread, "1"), (0.0, 0.0));
    }

    #[test]
    fn bearing_difference_wraps() {
        assert!((angle_between(3.1, -3.1) - (TAU - 6.2)).abs() < 1e-12);
        assert!((angle_between(-0.5, 0.25) - 0.75).abs() < 1e-12);
        assert_eq!(angle_between(1.0, 1.0), 0.0);
    }

    #[test]
    fn pinch_rejects_parallel_drag_and_single_track() {
        let drag = vec![
            straight(0, (100.0, 200.0), (100.0, 50.0), 8),
            straight(1, (200.0, 200.0), (200.0, 50.0), 8),
        ];
        assert_eq!(score_pair(&drag, "1"), (0.0, 0.0));
        assert_eq!(score_pair(&drag, "-1"), (0.0, 0.0));

        let lone = straight(0, (0.0, 0.0), (100.0, 0.0), 5);
        assert_eq!(score_alone(pinch, &lone, &["1"]), 0.0);
    }

    #[test]
    fn registers_every_builtin() {
        let registry = AnalyzerRegistry::with_builtins();
        for name in [
            "press", "tap", "longTap", "line", "swipe", "throw", "arc", "curve", "circle", "loop",
            "pinch",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }
}
