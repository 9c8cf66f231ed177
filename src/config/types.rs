use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Detection model settings. Defaults match the YOLO exporter's inference defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// One class name per line; line index is the class id.
    /// When unset, names come from the model's embedded metadata.
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config("server.port must be non-zero"));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(Error::config("server.max_upload_bytes must be non-zero"));
        }
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(Error::config(format!(
                "model.input_size must be a positive multiple of 32, got {}",
                self.model.input_size
            )));
        }
        if !(0.0..=1.0).contains(&self.model.confidence_threshold) {
            return Err(Error::config(format!(
                "model.confidence_threshold must be within [0, 1], got {}",
                self.model.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.model.iou_threshold) {
            return Err(Error::config(format!(
                "model.iou_threshold must be within [0, 1], got {}",
                self.model.iou_threshold
            )));
        }
        if self.model.max_detections == 0 {
            return Err(Error::config("model.max_detections must be non-zero"));
        }
        if self.model.intra_threads == 0 {
            return Err(Error::config("model.intra_threads must be non-zero"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            labels_path: None,
            input_size: default_input_size(),
            confidence_threshold: default_confidence_threshold(),
            iou_threshold: default_iou_threshold(),
            max_detections: default_max_detections(),
            intra_threads: default_intra_threads(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("best.onnx")
}

fn default_input_size() -> u32 {
    640
}

fn default_confidence_threshold() -> f32 {
    0.25
}

fn default_iou_threshold() -> f32 {
    0.7
}

fn default_max_detections() -> usize {
    300
}

fn default_intra_threads() -> usize {
    4
}
