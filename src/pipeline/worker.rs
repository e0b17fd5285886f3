use std::{sync::Arc, thread};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};

use crate::{
    gesture::GestureList,
    recognizer::Analyzer,
    types::{RecognizedSession, Session},
};

/// Something that turns a finished session into ranked matches.
pub(crate) trait SessionEngine: Send + 'static {
    fn recognize(&mut self, session: &Session) -> Result<RecognizedSession>;
}

struct SnapshotEngine {
    analyzer: Arc<Analyzer>,
    gestures: Arc<GestureList>,
}

impl SessionEngine for SnapshotEngine {
    fn recognize(&mut self, session: &Session) -> Result<RecognizedSession> {
        let matches = self
            .analyzer
            .analyze(session, &self.gestures)
            .with_context(|| format!("failed to analyze session of {} tracks", session.len()))?;
        Ok(RecognizedSession {
            session: session.clone(),
            matches,
        })
    }
}

fn run_worker_loop<E: SessionEngine>(
    mut engine: E,
    session_rx: Receiver<Session>,
    result_tx: Sender<RecognizedSession>,
) {
    while let Ok(session) = session_rx.recv() {
        match engine.recognize(&session) {
            Ok(recognized) => {
                if result_tx.send(recognized).is_err() {
                    log::info!("result receiver dropped, stopping analyzer worker");
                    return;
                }
            }
            Err(err) => {
                log::error!("gesture analysis failed: {err:?}");
            }
        }
    }
    log::info!("session channel closed, analyzer worker exiting");
}

/// Runs `analyzer` over every session received on `session_rx` on a dedicated thread.
///
/// The gesture list is a shared snapshot: to change the registered gestures, start a
/// new worker with a new list. The thread exits once either channel is closed.
pub fn start_analyzer(
    analyzer: Arc<Analyzer>,
    gestures: Arc<GestureList>,
    session_rx: Receiver<Session>,
    result_tx: Sender<RecognizedSession>,
) -> thread::JoinHandle<()> {
    log::info!(
        "starting analyzer worker with {} gestures and {} analyzers",
        gestures.len(),
        analyzer.registry().names().count()
    );

    let engine = SnapshotEngine { analyzer, gestures };
    thread::spawn(move || run_worker_loop(engine, session_rx, result_tx))
}
