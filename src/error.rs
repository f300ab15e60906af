use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("OpenCV error: {0}")]
    Opencv(#[from] opencv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model directory contains no run subdirectories
    #[error("No run directories found in {}", .0.display())]
    NoRunDirectories(PathBuf),

    /// The selected run has no weights file at the expected location
    #[error("Weights file not found: {}", .0.display())]
    MissingWeights(PathBuf),

    #[error("Capture source could not be opened: {0}")]
    SourceNotOpened(String),

    #[error("Failed to read frame {index} for label '{label}'")]
    FrameRead { label: String, index: usize },

    #[error("Failed to write image {}", .0.display())]
    ImageWrite(PathBuf),

    #[error("File not found: {}", .0.display())]
    SourceMissing(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
