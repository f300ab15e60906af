pub mod capture;
pub mod frame_metrics;
pub mod grid;
pub mod infer;
pub mod net;
pub mod tensor_view;

use crate::error::{Error, Result};
use log::{debug, info, warning};
use opencv::core::Mat;
use opencv::highgui;
use opencv::prelude::*;
use opencv::videoio::VideoCapture;
use std::fmt;
use std::path::PathBuf;

/// Where frames come from: a local camera or a video file.
#[derive(Debug, Clone)]
pub enum CaptureSource {
    Device(i32),
    File(PathBuf),
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Device(index) => write!(f, "camera {index}"),
            CaptureSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl CaptureSource {
    pub fn open(&self) -> Result<VideoCapture> {
        info!("Opening capture source: {}", self);
        let capture = match self {
            CaptureSource::Device(index) => VideoCapture::new_def(*index)?,
            CaptureSource::File(path) => {
                let path = path
                    .to_str()
                    .ok_or_else(|| Error::SourceNotOpened(self.to_string()))?;
                VideoCapture::from_file_def(path)?
            }
        };

        if !capture.is_opened()? {
            return Err(Error::SourceNotOpened(self.to_string()));
        }
        debug!("Capture source {} opened", self);
        Ok(capture)
    }
}

/// A capture device that yields frames one at a time.
pub trait FrameSource {
    /// Reads the next frame. `Ok(None)` means the read failed: end of stream
    /// or a device that stopped delivering.
    fn next_frame(&mut self) -> Result<Option<Mat>>;

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

impl FrameSource for VideoCapture {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        if !self.is_opened()? {
            return Ok(None);
        }
        let mut frame = Mat::default();
        if !self.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        VideoCaptureTrait::release(self)?;
        Ok(())
    }
}

/// Display surface that also carries the user's quit signal.
pub trait Viewer {
    fn show(&mut self, window: &str, frame: &Mat) -> Result<()>;

    /// Polls the keyboard for up to `wait_ms` and returns the pressed key.
    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<char>>;

    fn close(&mut self) -> Result<()>;

    fn quit_requested(&mut self, quit_key: char) -> Result<bool> {
        Ok(self.poll_key(1)? == Some(quit_key))
    }
}

/// Viewer backed by OpenCV's highgui windows.
#[derive(Debug, Default)]
pub struct HighguiViewer {
    windows: Vec<String>,
}

impl HighguiViewer {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_window(&mut self, window: &str) {
        if self.windows.iter().any(|w| w == window) {
            return;
        }

        debug!("Initializing display window '{}'", window);
        let result = highgui::named_window(
            window,
            highgui::WINDOW_KEEPRATIO | highgui::WINDOW_GUI_NORMAL,
        );

        if let Err(e) = result {
            warning!("Could not create named window '{}': {}", window, e);
        }
        self.windows.push(window.to_owned());
    }
}

impl Viewer for HighguiViewer {
    fn show(&mut self, window: &str, frame: &Mat) -> Result<()> {
        self.ensure_window(window);
        highgui::imshow(window, frame)?;
        Ok(())
    }

    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<char>> {
        let key = highgui::wait_key(wait_ms)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(char::from_u32((key & 0xFF) as u32))
    }

    fn close(&mut self) -> Result<()> {
        if !self.windows.is_empty() {
            highgui::destroy_all_windows()?;
            self.windows.clear();
        }
        Ok(())
    }
}
