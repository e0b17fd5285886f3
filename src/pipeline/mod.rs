mod recorder;
mod worker;

pub use recorder::SessionRecorder;
pub use worker::start_analyzer;
