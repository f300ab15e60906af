use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "cvkit";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    pub version: u8,
    pub capture: CaptureConf,
    pub grid: GridConf,
    pub model: ModelConf,
    pub inference: InferenceConf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConf {
    /// Seconds between two captured images
    pub delay_secs: f32,
    /// Seconds to wait before the first image of every label
    pub label_pause_secs: f32,
    /// Image encoding, chosen by OpenCV from the extension
    pub extension: String,
    pub window: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConf {
    pub columns: usize,
    /// Edge length in pixels of every grid cell
    pub tile_size: i32,
    pub window: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConf {
    /// Weights location relative to a run directory
    pub weights: PathBuf,
    pub input_size: i32,
    pub confidence: f32,
    pub iou: f32,
    /// Label per class id; ids without a name are shown as `class <id>`
    pub class_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConf {
    pub window: String,
    pub quit_key: char,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            version: 1,
            capture: CaptureConf::default(),
            grid: GridConf::default(),
            model: ModelConf::default(),
            inference: InferenceConf::default(),
        }
    }
}

impl Default for CaptureConf {
    fn default() -> Self {
        Self {
            delay_secs: 3.,
            label_pause_secs: 3.,
            extension: "jpg".into(),
            window: "Current image".into(),
        }
    }
}

impl Default for GridConf {
    fn default() -> Self {
        Self {
            columns: 4,
            tile_size: 240,
            window: "Images".into(),
        }
    }
}

impl Default for ModelConf {
    fn default() -> Self {
        Self {
            weights: PathBuf::from("weights").join("best.onnx"),
            input_size: 640,
            confidence: 0.25,
            iou: 0.45,
            class_names: Vec::new(),
        }
    }
}

impl Default for InferenceConf {
    fn default() -> Self {
        Self {
            window: "Model Prediction".into(),
            quit_key: 'q',
        }
    }
}

/// Loads the configuration from `path`, or from the platform config
/// directory when no path is given. A missing file is created with defaults.
pub fn load_config(path: Option<&Path>) -> Result<Conf> {
    let cfg: Conf = match path {
        Some(path) => confy::load_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => confy::load(APP_NAME, None).context("Failed to load config")?,
    };
    debug!("Loaded configuration: {:?}", cfg);
    Ok(cfg)
}
