use super::frame_metrics::FrameMetrics;
use super::net::Predictions;
use super::{FrameSource, Viewer};
use anyhow::{Context, Result};
use log::{debug, info};
use opencv::core::Mat;

/// A detection model: called with a frame, returns one result per image.
pub trait Detector {
    fn predict(&mut self, frame: &Mat) -> Result<Vec<Predictions>>;
}

#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub window: String,
    pub quit_key: char,
    /// Frames between two frame-rate log lines
    pub log_every: usize,
}

/// Runs `model` on every frame of `source` and shows the annotated frames
/// until the stream ends, a read fails or the quit key is pressed.
///
/// Returns the number of frames processed. Resources are released on every
/// exit path; model and display errors are propagated.
pub fn run_inference<S, D, V>(source: &mut S, model: &mut D, viewer: &mut V, opts: &InferenceOptions) -> Result<usize>
where
    S: FrameSource,
    D: Detector,
    V: Viewer,
{
    let result = inference_loop(source, model, viewer, opts);

    let released = source.release();
    let closed = viewer.close();
    let frames = result?;
    released.context("Failed to release capture source")?;
    closed.context("Failed to close display")?;

    Ok(frames)
}

fn inference_loop<S, D, V>(source: &mut S, model: &mut D, viewer: &mut V, opts: &InferenceOptions) -> Result<usize>
where
    S: FrameSource,
    D: Detector,
    V: Viewer,
{
    let mut metrics = FrameMetrics::new(opts.log_every);

    while let Some(frame) = source.next_frame()? {
        let results = model.predict(&frame).context("Model inference failed")?;

        let annotated = match results.first() {
            Some(first) => first.plot(&frame)?,
            None => frame,
        };
        viewer.show(&opts.window, &annotated)?;
        metrics.update();

        if viewer.quit_requested(opts.quit_key)? {
            info!("Inference stopped by user");
            break;
        }
    }

    debug!("Inference loop finished");
    info!("{}", metrics.summary());
    Ok(metrics.frame_count())
}
