use crate::track::Track;

/// Milliseconds on whatever clock the capture layer uses.
pub type Timestamp = u64;

/// A finished gesture attempt: ended tracks ordered by `start_time`.
pub type Session = Vec<Track>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub t: Timestamp,
    pub size: f64,
    pub force: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, t: Timestamp) -> Self {
        Self {
            x,
            y,
            t,
            size: 1.0,
            force: 1.0,
        }
    }

    pub fn with_pressure(mut self, size: f64, force: f64) -> Self {
        self.size = size;
        self.force = force;
        self
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Bearing in radians from `self` towards `other`.
    pub fn angle_to(&self, other: &Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Bearing of this point seen from the origin.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn invert(&self) -> Point {
        Point {
            x: -self.x,
            y: -self.y,
            ..*self
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub name: String,
    pub score: f64,
}

impl Match {
    pub fn display_text(&self) -> String {
        format!("{} ({:.0}%)", self.name, self.score * 100.0)
    }
}

#[derive(Clone, Debug)]
pub struct RecognizedSession {
    pub session: Session,
    pub matches: Option<Vec<Match>>,
}

impl RecognizedSession {
    pub fn best(&self) -> Option<&Match> {
        self.matches.as_ref().and_then(|m| m.first())
    }

    pub fn display_text(&self) -> String {
        match &self.matches {
            Some(matches) => matches
                .iter()
                .map(Match::display_text)
                .collect::<Vec<_>>()
                .join(", "),
            None => format!("no match ({} tracks)", self.session.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0, 0);
        let b = Point::new(3.0, 4.0, 10);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn angle_to_measures_from_self() {
        let a = Point::new(1.0, 1.0, 0);
        let b = Point::new(1.0, 3.0, 0);
        assert!((a.angle_to(&b) - FRAC_PI_2).abs() < 1e-12);
        assert!((b.angle_to(&a) + FRAC_PI_2).abs() < 1e-12);
        assert!((Point::new(-2.0, 0.0, 0).angle() - PI).abs() < 1e-12);
    }

    #[test]
    fn invert_keeps_pressure() {
        let p = Point::new(2.0, -5.0, 7).with_pressure(3.0, 0.5);
        let q = p.invert();
        assert_eq!((q.x, q.y), (-2.0, 5.0));
        assert_eq!((q.size, q.force, q.t), (3.0, 0.5, 7));
    }
}
