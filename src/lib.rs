//! Multi-touch gesture matching.
//!
//! Recorded pointer paths ([`Track`]) are grouped into steps of simultaneous touches and
//! scored against named gesture definitions. Each gesture step is a small expression
//! over analyzer calls, e.g. `"arc(400,90) * circle() || arc(-400,90) * circle()"` or
//! `"pinch(-1) && pinch(-1)"`.

pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod recognizer;
pub mod track;
pub mod types;

pub use config::{AnalyzerConfig, RecorderConfig, ScoreOrder};
pub use error::{Error, ExprError, Result};
pub use gesture::{Gesture, GestureList};
pub use recognizer::{Analyzer, AnalyzerFn, AnalyzerRegistry, GestureContext, Step, build_steps};
pub use track::Track;
pub use types::{Match, Point, RecognizedSession, Session, Timestamp};
