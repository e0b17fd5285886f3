pub mod analyzers;
pub mod expr;

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    config::{AnalyzerConfig, ScoreOrder},
    error::{Error, Result},
    gesture::{Gesture, GestureList},
    track::Track,
    types::{Match, Session, Timestamp},
};

use self::expr::truthy;

/// A group of temporally overlapping tracks.
#[derive(Clone, Debug)]
pub struct Step<'a> {
    pub time: Timestamp,
    pub tracks: Vec<&'a Track>,
}

/// What an analyzer can see besides its subject track.
#[derive(Clone, Copy, Debug)]
pub struct GestureContext<'a> {
    pub all_tracks: &'a [Track],
    pub steps: &'a [Step<'a>],
    pub current_step_tracks: &'a [&'a Track],
    pub subject_track_index: usize,
}

impl<'a> GestureContext<'a> {
    pub fn subject(&self) -> &'a Track {
        self.current_step_tracks[self.subject_track_index]
    }

    pub fn others(&self) -> impl Iterator<Item = &'a Track> + '_ {
        let subject = self.subject_track_index;
        self.current_step_tracks
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != subject)
            .map(|(_, t)| *t)
    }
}

/// A named scoring rule. Scores are expected in `[0, 1]`.
pub trait AnalyzerFn: Send + Sync {
    fn score(&self, subject: &Track, ctx: &GestureContext<'_>, args: &[&str]) -> f64;
}

impl<F> AnalyzerFn for F
where
    F: Fn(&Track, &GestureContext<'_>, &[&str]) -> f64 + Send + Sync,
{
    fn score(&self, subject: &Track, ctx: &GestureContext<'_>, args: &[&str]) -> f64 {
        self(subject, ctx, args)
    }
}

/// Analyzer functions by (case sensitive) name.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    table: HashMap<String, Arc<dyn AnalyzerFn>>,
}

impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("AnalyzerRegistry")
            .field("analyzers", &names)
            .finish()
    }
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        analyzers::register_builtins(&mut registry);
        registry
    }

    pub fn register_analyzer(&mut self, name: impl Into<String>, f: impl AnalyzerFn + 'static) {
        self.table.insert(name.into(), Arc::new(f));
    }

    /// Same as [`register_analyzer`](Self::register_analyzer), but pins closure
    /// signatures so they can be written inline.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Track, &GestureContext<'_>, &[&str]) -> f64 + Send + Sync + 'static,
    {
        self.register_analyzer(name, f);
    }

    pub fn unregister_analyzer(&mut self, name: &str) -> bool {
        self.table.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AnalyzerFn>> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

/// Groups tracks into steps: a new step opens whenever no earlier track is still
/// active at the start of the next one. Tracks must be ordered by start time.
pub fn build_steps(tracks: &[Track]) -> Vec<Step<'_>> {
    let mut steps: Vec<Step<'_>> = Vec::new();
    let mut active: Vec<&Track> = Vec::new();

    for track in tracks {
        let time = track.start_time();
        active.retain(|t| t.end_time().is_none_or(|end| time < end));

        match steps.last_mut() {
            Some(step) if !active.is_empty() => step.tracks.push(track),
            _ => steps.push(Step {
                time,
                tracks: vec![track],
            }),
        }
        active.push(track);
    }

    steps
}

fn check_session(session: &[Track]) -> Result<()> {
    for (index, track) in session.iter().enumerate() {
        if !track.is_ended() {
            return Err(Error::OpenTrack { id: track.id() });
        }
        if index > 0 && track.start_time() < session[index - 1].start_time() {
            return Err(Error::UnsortedSession { index });
        }
    }
    Ok(())
}

/// Scores sessions against a gesture list.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    registry: AnalyzerRegistry,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(registry: AnalyzerRegistry, config: AnalyzerConfig) -> Self {
        Self { registry, config }
    }

    pub fn with_builtins() -> Self {
        Self::new(AnalyzerRegistry::with_builtins(), AnalyzerConfig::default())
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AnalyzerRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Ranked matches for `session`, or `None` if nothing matched.
    ///
    /// Fails only when the session breaks its contract (unsorted, or holding a track
    /// that was never ended). Problems inside a single gesture are logged and make
    /// that gesture score zero.
    pub fn analyze(&self, session: &[Track], gestures: &GestureList) -> Result<Option<Vec<Match>>> {
        check_session(session)?;

        let steps = build_steps(session);
        log::debug!(
            "analyzing {} tracks in {} steps against {} gestures",
            session.len(),
            steps.len(),
            gestures.len()
        );

        let mut matches = Vec::new();
        for gesture in gestures.get_sorted() {
            if gesture.steps().len() != steps.len() {
                continue;
            }

            let score = self.score_gesture(gesture, session, &steps);
            log::debug!("gesture '{}' scored {score:.3}", gesture.name());

            if score > 0.0 && score > self.config.min_score {
                matches.push(Match {
                    name: gesture.name().to_string(),
                    score,
                });
                if self.config.first_match_wins {
                    break;
                }
            }
        }

        if matches.is_empty() {
            return Ok(None);
        }

        match self.config.order {
            ScoreOrder::Descending => matches.sort_by(|a, b| b.score.total_cmp(&a.score)),
            ScoreOrder::Ascending => matches.sort_by(|a, b| a.score.total_cmp(&b.score)),
        }

        Ok(Some(matches))
    }

    /// Independent sessions, analyzed in parallel when the `parallel` feature is on.
    pub fn analyze_many(
        &self,
        sessions: &[Session],
        gestures: &GestureList,
    ) -> Vec<Result<Option<Vec<Match>>>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            sessions
                .par_iter()
                .map(|session| self.analyze(session, gestures))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            sessions
                .iter()
                .map(|session| self.analyze(session, gestures))
                .collect()
        }
    }

    fn score_gesture(&self, gesture: &Gesture, session: &[Track], steps: &[Step<'_>]) -> f64 {
        let mut total = 0.0;
        for (index, expression) in gesture.steps().iter().enumerate() {
            match self.score_step(expression, session, steps, index) {
                Some(score) => total += score,
                None => return 0.0,
            }
        }
        (total / steps.len() as f64).min(1.0)
    }

    fn score_step(
        &self,
        expression: &str,
        session: &[Track],
        steps: &[Step<'_>],
        index: usize,
    ) -> Option<f64> {
        let step = &steps[index];
        let track_exprs = expr::split_tracks(expression);
        if track_exprs.len() != step.tracks.len() {
            return None;
        }

        let mut total = 0.0;
        for (subject, source) in track_exprs.into_iter().enumerate() {
            let ctx = GestureContext {
                all_tracks: session,
                steps,
                current_step_tracks: &step.tracks,
                subject_track_index: subject,
            };
            total += self.score_track(source, &ctx)?;
        }
        Some(total / step.tracks.len() as f64)
    }

    fn score_track(&self, source: &str, ctx: &GestureContext<'_>) -> Option<f64> {
        let parsed = match expr::parse(source) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("cannot evaluate '{}': {err}", source.trim());
                return None;
            }
        };

        let subject = ctx.subject();
        let evaluation = parsed.evaluate(|rule| {
            let Some(analyzer) = self.registry.get(&rule.name) else {
                log::warn!("undefined analyzer '{}'", rule.name);
                return None;
            };
            let args: Vec<&str> = rule.args.iter().map(String::as_str).collect();
            Some(analyzer.score(subject, ctx, &args).clamp(0.0, 1.0))
        });

        if !truthy(evaluation.value) {
            return None;
        }
        Some(evaluation.value / evaluation.nrules.max(1) as f64)
    }
}
