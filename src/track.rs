use std::f64::consts::{FRAC_PI_2, TAU};

use crate::types::{Point, Timestamp};

/// One continuous pointer path, from press to release.
///
/// Every statistic is updated incrementally in [`Track::push`], so a track can be
/// inspected at any time while it is still being recorded. Once [`Track::end`] has
/// been called the track is frozen.
#[derive(Clone, Debug)]
pub struct Track {
    id: u32,
    points: Vec<Point>,
    start_time: Timestamp,
    end_time: Option<Timestamp>,
    duration: Timestamp,
    length: f64,
    speed: f64,
    end_speed: f64,
    rotation: f64,
    absolute_rotation: f64,
    loops: i32,
    start_angle: f64,
    end_angle: f64,
    offset: Point,
    middle: Point,
    sum_x: f64,
    sum_y: f64,
    winding: i32,
    last_heading: Option<f64>,
    last_unwrapped: Option<f64>,
}

impl Track {
    pub fn new(id: u32, start_time: Timestamp) -> Self {
        Self {
            id,
            points: Vec::new(),
            start_time,
            end_time: None,
            duration: 0,
            length: 0.0,
            speed: 0.0,
            end_speed: 0.0,
            rotation: 0.0,
            absolute_rotation: 0.0,
            loops: 0,
            start_angle: 0.0,
            end_angle: 0.0,
            offset: Point::new(0.0, 0.0, start_time),
            middle: Point::new(0.0, 0.0, start_time),
            sum_x: 0.0,
            sum_y: 0.0,
            winding: 0,
            last_heading: None,
            last_unwrapped: None,
        }
    }

    /// Appends a sample. Ended tracks are frozen and ignore further samples.
    pub fn push(&mut self, point: Point) {
        if self.end_time.is_some() {
            log::debug!("track {} already ended, dropping sample at {}", self.id, point.t);
            return;
        }
        let prev = self.points.last().copied();
        self.points.push(point);
        let n = self.points.len();
        let first = self.points[0];

        if let Some(prev) = prev {
            self.length += point.distance_to(&prev);
        }

        self.sum_x += point.x;
        self.sum_y += point.y;
        self.middle = Point::new(self.sum_x / n as f64, self.sum_y / n as f64, point.t);
        self.offset = Point::new(point.x - first.x, point.y - first.y, point.t);

        if let Some(prev) = prev {
            self.update_rotation(point.angle_to(&prev));

            self.end_angle = point.angle_to(&self.points[n.saturating_sub(4)]);
            self.start_angle = self.points[3.min(n - 1)].angle_to(&first);

            let dt = point.t.saturating_sub(prev.t) as f64;
            self.end_speed = point.distance_to(&prev) / dt / 1000.0;
        }

        self.duration = point.t.saturating_sub(self.start_time);
        self.speed = self.length / self.duration as f64 * 1000.0;
    }

    fn update_rotation(&mut self, heading: f64) {
        // Consecutive samples never turn by more than a quarter turn, so a jump across
        // the +-pi seam is a wrap, not a real reversal.
        if let Some(last) = self.last_heading {
            if last > FRAC_PI_2 && heading < -FRAC_PI_2 {
                self.winding += 1;
            } else if last < -FRAC_PI_2 && heading > FRAC_PI_2 {
                self.winding -= 1;
            }
        }

        let unwrapped = heading + self.winding as f64 * TAU;
        if let Some(last) = self.last_unwrapped {
            let delta = unwrapped - last;
            self.rotation += delta;
            self.absolute_rotation += delta.abs();
        }

        self.last_heading = Some(heading);
        self.last_unwrapped = Some(unwrapped);
        self.loops = whole_loops(self.rotation);
    }

    /// Freezes the end time. Later calls are ignored.
    pub fn end(&mut self, at: Timestamp) {
        if self.end_time.is_some() {
            return;
        }
        self.end_time = Some(at);
        self.duration = at.saturating_sub(self.start_time);
        self.speed = self.length / self.duration as f64 * 1000.0;
    }

    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first_point(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last_point(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn duration(&self) -> Timestamp {
        self.duration
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Pixels per second over the whole track.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn end_speed(&self) -> f64 {
        self.end_speed
    }

    /// Pixels per second between the last two samples.
    pub fn end_speed_px_per_sec(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let (prev, last) = (&self.points[n - 2], &self.points[n - 1]);
        last.distance_to(prev) / last.t.saturating_sub(prev.t) as f64 * 1000.0
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn absolute_rotation(&self) -> f64 {
        self.absolute_rotation
    }

    pub fn loops(&self) -> i32 {
        self.loops
    }

    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    pub fn end_angle(&self) -> f64 {
        self.end_angle
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn middle(&self) -> Point {
        self.middle
    }
}

fn whole_loops(rotation: f64) -> i32 {
    let loops = (rotation / TAU).floor() as i32;
    if rotation < 0.0 { loops + 1 } else { loops }
}
