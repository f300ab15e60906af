use super::{FrameSource, Viewer};
use crate::error::{Error, Result};
use log::{debug, info, warning};
use opencv::core::Vector;
use opencv::imgcodecs;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub num_imgs: usize,
    pub classes: Vec<String>,
    pub img_path: PathBuf,
    /// Pause between two images
    pub delay: Duration,
    /// Pause before the first image of every label
    pub label_pause: Duration,
    pub extension: String,
    /// Render each captured frame
    pub show: bool,
    pub window: String,
    pub quit_key: char,
}

#[derive(Debug, Default)]
pub struct CaptureSummary {
    pub written: Vec<PathBuf>,
    pub interrupted: bool,
}

/// `<label>.<uuid>.<extension>` inside `dir`.
pub fn image_file_name(dir: &Path, label: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}.{}", label, Uuid::new_v4(), extension))
}

/// Captures `num_imgs` images for every class label and writes them to
/// `img_path`.
///
/// Stops early when the quit key is pressed. The source is released and the
/// viewer closed on every exit path; a failed read aborts with
/// [`Error::FrameRead`].
pub fn capture_images<S, V>(source: &mut S, viewer: &mut V, opts: &CaptureOptions) -> Result<CaptureSummary>
where
    S: FrameSource,
    V: Viewer,
{
    fs::create_dir_all(&opts.img_path)?;

    let result = capture_loop(source, viewer, opts);

    let released = source.release();
    let closed = viewer.close();
    let summary = result?;
    released?;
    closed?;

    info!("Images saved at {}.", opts.img_path.display());
    Ok(summary)
}

fn capture_loop<S, V>(source: &mut S, viewer: &mut V, opts: &CaptureOptions) -> Result<CaptureSummary>
where
    S: FrameSource,
    V: Viewer,
{
    let mut summary = CaptureSummary::default();

    'labels: for label in &opts.classes {
        info!("Capturing images for label: {}", label);
        thread::sleep(opts.label_pause);

        for img_num in 0..opts.num_imgs {
            info!("Capturing {}, image {}", label, img_num);

            let frame = source.next_frame()?.ok_or_else(|| Error::FrameRead {
                label: label.clone(),
                index: img_num,
            })?;

            let img_name = image_file_name(&opts.img_path, label, &opts.extension);
            let name = img_name.to_string_lossy();
            if !imgcodecs::imwrite(&name, &frame, &Vector::new())? {
                warning!("OpenCV refused to encode {}", name);
                return Err(Error::ImageWrite(img_name));
            }
            debug!("Wrote {}", name);
            summary.written.push(img_name);

            if opts.show {
                viewer.show(&opts.window, &frame)?;
            }

            thread::sleep(opts.delay);
            if viewer.quit_requested(opts.quit_key)? {
                info!("Capture interrupted by user");
                summary.interrupted = true;
                break 'labels;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::testing::{MockSource, MockViewer};

    fn options(dir: &Path, num_imgs: usize, classes: &[&str]) -> CaptureOptions {
        CaptureOptions {
            num_imgs,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            img_path: dir.to_path_buf(),
            delay: Duration::ZERO,
            label_pause: Duration::ZERO,
            extension: "png".into(),
            show: true,
            window: "capture".into(),
            quit_key: 'q',
        }
    }

    fn files_with_prefix(dir: &Path, prefix: &str) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
            .count()
    }

    #[test]
    fn writes_one_file_per_image_and_label() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("images");
        let opts = options(&out, 3, &["thumbsup", "thumbsdown"]);
        let mut source = MockSource::new(6);
        let mut viewer = MockViewer::default();

        let summary = capture_images(&mut source, &mut viewer, &opts).unwrap();

        assert_eq!(summary.written.len(), 6);
        assert!(!summary.interrupted);
        assert_eq!(fs::read_dir(&out).unwrap().count(), 6);
        assert_eq!(files_with_prefix(&out, "thumbsup."), 3);
        assert_eq!(files_with_prefix(&out, "thumbsdown."), 3);
        assert_eq!(viewer.shown.len(), 6);
        assert!(source.released);
        assert!(viewer.closed);
    }

    #[test]
    fn quit_key_stops_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), 5, &["a", "b"]);
        let mut source = MockSource::new(10);
        let mut viewer = MockViewer::with_keys([None, Some('q')]);

        let summary = capture_images(&mut source, &mut viewer, &opts).unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.written.len(), 2);
        assert_eq!(files_with_prefix(dir.path(), "b."), 0);
        assert!(source.released);
    }

    #[test]
    fn failed_read_aborts_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), 2, &["x"]);
        let mut source = MockSource::new(1);
        let mut viewer = MockViewer::default();

        let err = capture_images(&mut source, &mut viewer, &opts).unwrap_err();

        assert!(matches!(err, Error::FrameRead { index: 1, .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(source.released);
        assert!(viewer.closed);
    }

    #[test]
    fn unwritable_image_is_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), 2, &["a/b"]);
        let mut source = MockSource::new(2);
        let mut viewer = MockViewer::default();

        let err = capture_images(&mut source, &mut viewer, &opts).unwrap_err();

        assert!(matches!(err, Error::ImageWrite(_) | Error::Opencv(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(viewer.shown.is_empty());
        assert!(source.released);
    }

    #[test]
    fn hidden_display_still_polls_for_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), 2, &["x"]);
        opts.show = false;
        let mut source = MockSource::new(2);
        let mut viewer = MockViewer::default();

        capture_images(&mut source, &mut viewer, &opts).unwrap();

        assert!(viewer.shown.is_empty());
        assert_eq!(viewer.polls, 2);
    }

    #[test]
    fn file_names_combine_label_and_uuid() {
        let name = image_file_name(Path::new("imgs"), "peace", "jpg");
        let file = name.file_name().unwrap().to_str().unwrap();

        assert!(file.starts_with("peace."));
        assert!(file.ends_with(".jpg"));
        assert!(Uuid::parse_str(&file["peace.".len()..file.len() - ".jpg".len()]).is_ok());
    }
}
