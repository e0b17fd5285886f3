use std::{f64::consts::TAU, sync::Arc};

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use gesture_tracks::{
    Analyzer, AnalyzerConfig, AnalyzerRegistry, GestureList, Point, RecorderConfig, Session,
    pipeline::{SessionRecorder, start_analyzer},
};

const SAMPLE_MS: u64 = 16;

fn main() -> Result<()> {
    env_logger::init();

    let analyzer = Arc::new(Analyzer::new(
        AnalyzerRegistry::with_builtins(),
        AnalyzerConfig::from_env(),
    ));
    let gestures = Arc::new(GestureList::with_builtins());

    let (session_tx, session_rx) = bounded(4);
    let (result_tx, result_rx) = bounded(4);
    let worker = start_analyzer(analyzer, gestures, session_rx, result_tx);

    let demos = demo_sessions()?;
    let labels: Vec<&str> = demos.iter().map(|(label, _)| *label).collect();

    let producer = std::thread::spawn(move || {
        for (_, session) in demos {
            if session_tx.send(session).is_err() {
                break;
            }
        }
    });

    for (label, recognized) in labels.iter().zip(result_rx.iter()) {
        match recognized.best() {
            Some(best) => log::info!("{label}: best match {}", best.display_text()),
            None => log::info!("{label}: nothing matched"),
        }
        println!("{label:>12} -> {}", recognized.display_text());
    }

    producer
        .join()
        .map_err(|_| anyhow::anyhow!("demo producer panicked"))?;
    worker
        .join()
        .map_err(|_| anyhow::anyhow!("analyzer worker panicked"))?;
    Ok(())
}

fn demo_sessions() -> Result<Vec<(&'static str, Session)>> {
    Ok(vec![
        ("tap", record(|r| stroke(r, 0, &[(100.0, 100.0); 6], 0))?),
        (
            "double tap",
            record(|r| {
                stroke(r, 0, &[(100.0, 100.0); 5], 0)?;
                stroke(r, 1, &[(160.0, 100.0); 5], 8)
            })?,
        ),
        ("long tap", record(|r| stroke(r, 0, &[(50.0, 50.0); 40], 0))?),
        (
            "swipe right",
            record(|r| stroke(r, 0, &line((40.0, 200.0), (320.0, 200.0), 12), 0))?,
        ),
        (
            "swipe up",
            record(|r| stroke(r, 0, &line((200.0, 320.0), (200.0, 40.0), 12), 0))?,
        ),
        ("circle", record(|r| stroke(r, 0, &ring(1.15), 0))?),
        (
            "zoom in",
            record(|r| {
                stroke(r, 0, &line((190.0, 200.0), (60.0, 200.0), 10), 0)?;
                stroke(r, 1, &line((210.0, 200.0), (340.0, 200.0), 10), 0)
            })?,
        ),
    ])
}

fn record<F>(script: F) -> Result<Session>
where
    F: FnOnce(&mut SessionRecorder) -> Result<()>,
{
    let mut recorder = SessionRecorder::new(RecorderConfig::default());
    script(&mut recorder)?;
    Ok(recorder.take_session())
}

fn stroke(
    recorder: &mut SessionRecorder,
    touch: u32,
    path: &[(f64, f64)],
    delay: u64,
) -> Result<()> {
    let Some((&(x, y), rest)) = path.split_first() else {
        return Ok(());
    };
    let start = delay * SAMPLE_MS;
    recorder.begin(touch, Point::new(x, y, start));

    let mut t = start;
    for &(x, y) in rest {
        t += SAMPLE_MS;
        recorder
            .move_to(touch, Point::new(x, y, t))
            .with_context(|| format!("touch {touch} lost while recording"))?;
    }
    recorder.end(touch, t)?;
    Ok(())
}

fn line(from: (f64, f64), to: (f64, f64), samples: usize) -> Vec<(f64, f64)> {
    (0..samples)
        .map(|i| {
            let f = i as f64 / (samples - 1) as f64;
            (from.0 + (to.0 - from.0) * f, from.1 + (to.1 - from.1) * f)
        })
        .collect()
}

fn ring(turns: f64) -> Vec<(f64, f64)> {
    let samples = (turns * 32.0).round() as usize;
    (0..=samples)
        .map(|i| {
            let theta = i as f64 / 32.0 * TAU;
            (200.0 + 90.0 * theta.cos(), 200.0 + 90.0 * theta.sin())
        })
        .collect()
}
