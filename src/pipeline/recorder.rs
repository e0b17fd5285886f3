use std::collections::HashMap;

use crate::{
    config::RecorderConfig,
    error::{Error, Result},
    track::Track,
    types::{Point, Session, Timestamp},
};

/// Turns raw touch samples into a session.
///
/// The recorder owns no timers: callers report samples with their timestamps and poll
/// [`is_idle`](Self::is_idle) to decide when the attempt is over.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    config: RecorderConfig,
    tracks: Vec<Track>,
    touches: HashMap<u32, usize>,
    next_id: u32,
    last_release: Option<Timestamp>,
}

impl SessionRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Starts a track for `touch`, returning its track id. A touch that is already down
    /// keeps its current track.
    pub fn begin(&mut self, touch: u32, point: Point) -> u32 {
        if let Some(&idx) = self.touches.get(&touch) {
            return self.tracks[idx].id();
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut track = Track::new(id, point.t);
        track.push(point);
        self.touches.insert(touch, self.tracks.len());
        self.tracks.push(track);
        self.last_release = None;

        log::trace!("touch {touch} started track {id}");
        id
    }

    pub fn move_to(&mut self, touch: u32, point: Point) -> Result<()> {
        let idx = *self
            .touches
            .get(&touch)
            .ok_or(Error::UnknownTouch { id: touch })?;
        self.tracks[idx].push(point);
        Ok(())
    }

    pub fn end(&mut self, touch: u32, at: Timestamp) -> Result<()> {
        let idx = self
            .touches
            .remove(&touch)
            .ok_or(Error::UnknownTouch { id: touch })?;
        self.tracks[idx].end(at);
        if self.touches.is_empty() {
            self.last_release = Some(at);
        }
        Ok(())
    }

    pub fn end_all(&mut self, at: Timestamp) {
        for (_, idx) in self.touches.drain() {
            self.tracks[idx].end(at);
        }
        if !self.tracks.is_empty() {
            self.last_release = Some(at);
        }
    }

    pub fn is_recording(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn active_touches(&self) -> usize {
        self.touches.len()
    }

    /// True once every touch has lifted and the end-of-gesture delay has passed.
    pub fn is_idle(&self, now: Timestamp) -> bool {
        self.touches.is_empty()
            && self.last_release.is_some_and(|released| {
                now >= released.saturating_add(self.config.end_gesture_delay_ms)
            })
    }

    /// Hands over the recorded tracks ordered by start time and resets the recorder.
    /// Touches still down are ended at their latest sample.
    pub fn take_session(&mut self) -> Session {
        for (_, idx) in self.touches.drain() {
            let track = &mut self.tracks[idx];
            let at = track.last_point().map_or(track.start_time(), |p| p.t);
            track.end(at);
        }

        let mut session = std::mem::take(&mut self.tracks);
        session.sort_by_key(Track::start_time);

        self.next_id = 0;
        self.last_release = None;
        session
    }
}
