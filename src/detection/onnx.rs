use super::postprocess::{self, Candidate, DecodeParams};
use super::{DetectError, Detection, Detector, LabelTable};
use crate::{Error, Result, config::ModelConfig, imaging};
use image::DynamicImage;
use ndarray::{Array2, Axis, Ix2};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Value;
use std::fmt::Display;
use std::sync::Mutex;
use tracing::{debug, info};

/// YOLO detector running on ONNX Runtime (CPU).
pub struct OnnxDetector {
    // ort sessions need exclusive access to run
    session: Mutex<Session>,
    input_name: String,
    input_size: u32,
    labels: LabelTable,
    params: DecodeParams,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("classes", &self.labels.len())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn model_error<E: Display>(context: &'static str) -> impl FnOnce(E) -> Error {
    move |e| Error::model(format!("{}: {}", context, e))
}

fn inference_error<E: Display>(context: &'static str) -> impl FnOnce(E) -> DetectError {
    move |e| DetectError::inference(format!("{}: {}", context, e))
}

impl OnnxDetector {
    /// Loads the model and its label table. Any failure here is fatal for
    /// the server.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let model_path = config.path.as_path();
        if !model_path.exists() {
            return Err(Error::model(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .map_err(model_error("failed to create session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_error("failed to set optimization level"))?
            .with_intra_threads(config.intra_threads)
            .map_err(model_error("failed to set intra threads"))?
            .commit_from_file(model_path)
            .map_err(model_error("failed to load model"))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| Error::model("model declares no inputs"))?;

        let labels = match &config.labels_path {
            Some(path) => LabelTable::from_file(path)?,
            None => embedded_labels(&session)?,
        };

        debug!(
            "Detection model input: {}, output count: {}",
            input_name,
            session.outputs.len()
        );
        info!("Detection model loaded with {} classes", labels.len());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            input_size: config.input_size,
            labels,
            params: DecodeParams {
                confidence_threshold: config.confidence_threshold,
                iou_threshold: config.iou_threshold,
                max_detections: config.max_detections,
            },
        })
    }

    fn run(&self, input: Value) -> std::result::Result<Array2<f32>, DetectError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::inference("model session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input])
            .map_err(inference_error("model run failed"))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_error("failed to extract output tensor"))?;

        if output.ndim() != 3 || output.shape()[0] != 1 {
            return Err(DetectError::output(format!(
                "expected [1, 4 + classes, candidates], got {:?}",
                output.shape()
            )));
        }

        let head = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| DetectError::output(e.to_string()))?
            .to_owned();
        Ok(head)
    }
}

/// Reads the `names` entry YOLO exporters embed in model metadata.
fn embedded_labels(session: &Session) -> Result<LabelTable> {
    let metadata = session
        .metadata()
        .map_err(model_error("failed to read model metadata"))?;
    let names = metadata
        .custom("names")
        .map_err(model_error("failed to read class names from metadata"))?
        .ok_or_else(|| {
            Error::labels("model metadata has no class names; set model.labels_path")
        })?;
    LabelTable::from_names_metadata(&names)
}

impl Detector for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> std::result::Result<Vec<Detection>, DetectError> {
        let (input, letterbox) = imaging::to_input_tensor(image, self.input_size);
        let input = Value::from_array(input)
            .map_err(inference_error("failed to create input tensor"))?
            .into_dyn();

        let head = self.run(input)?;
        let candidates = postprocess::decode(head.view(), &letterbox, &self.params)?;

        label_candidates(&self.labels, candidates)
    }
}

/// Names each surviving candidate. An id outside the table means the model
/// and its labels disagree, which fails the whole request.
pub(crate) fn label_candidates(
    labels: &LabelTable,
    candidates: Vec<Candidate>,
) -> std::result::Result<Vec<Detection>, DetectError> {
    candidates
        .into_iter()
        .map(|c| {
            labels
                .name(c.class_id)
                .ok_or(DetectError::UnknownClass(c.class_id))
                .map(|class_name| Detection {
                    class_id: c.class_id,
                    class_name: class_name.to_string(),
                    confidence: c.confidence,
                    bbox: c.bbox,
                })
        })
        .collect()
}
