use crate::detection::{DetectError, Detection, Detector};
use crate::imaging::{self, ImageError};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Per-request failures of the image endpoint. The message is what the
/// client sees.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error("{0}")]
    DecodeFailure(#[from] ImageError),

    #[error("{0}")]
    InferenceFailure(#[from] DetectError),
}

impl ExtractionError {
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::DecodeFailure(_) => "decode",
            Self::InferenceFailure(_) => "inference",
        }
    }
}

/// Turns uploaded image bytes into the list of ingredient names the
/// detector sees in them.
#[derive(Clone)]
pub struct IngredientExtractor {
    detector: Arc<dyn Detector>,
}

impl IngredientExtractor {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self { detector }
    }

    /// Decodes and runs inference synchronously; call from a blocking context.
    pub fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let image = imaging::decode_image(bytes)?;
        debug!("Decoded upload: {}x{}", image.width(), image.height());

        let detections = self.detector.detect(&image)?;
        debug!("Detector returned {} boxes", detections.len());

        Ok(ingredient_names(&detections))
    }
}

/// Distinct class names in ascending order.
pub fn ingredient_names(detections: &[Detection]) -> Vec<String> {
    detections
        .iter()
        .map(|d| d.class_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn detection(class_id: usize, class_name: &str) -> Detection {
        Detection {
            class_id,
            class_name: class_name.to_string(),
            confidence: 0.9,
            bbox: BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: 10.0,
                y2: 10.0,
            },
        }
    }

    struct FixedDetector {
        result: Result<Vec<Detection>, String>,
        calls: AtomicUsize,
    }

    impl Detector for FixedDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, DetectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(DetectError::Inference)
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_names_sorted_and_deduplicated() {
        let names = ingredient_names(&[
            detection(1, "egg"),
            detection(0, "apple"),
            detection(1, "egg"),
        ]);
        assert_eq!(names, vec!["apple", "egg"]);
    }

    #[test]
    fn test_names_empty() {
        assert!(ingredient_names(&[]).is_empty());
    }

    #[test]
    fn test_extract_runs_detector_on_decoded_image() {
        let detector = Arc::new(FixedDetector {
            result: Ok(vec![detection(3, "tomato"), detection(3, "tomato")]),
            calls: AtomicUsize::new(0),
        });
        let extractor = IngredientExtractor::new(detector.clone());

        let names = extractor.extract(&png_bytes()).unwrap();
        assert_eq!(names, vec!["tomato"]);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extract_decode_failure_skips_detector() {
        let detector = Arc::new(FixedDetector {
            result: Ok(vec![]),
            calls: AtomicUsize::new(0),
        });
        let extractor = IngredientExtractor::new(detector.clone());

        let err = extractor.extract(b"not an image").unwrap_err();
        assert_eq!(err.kind(), "decode");
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_extract_inference_failure() {
        let extractor = IngredientExtractor::new(Arc::new(FixedDetector {
            result: Err("out of memory".to_string()),
            calls: AtomicUsize::new(0),
        }));

        let err = extractor.extract(&png_bytes()).unwrap_err();
        assert_eq!(err.kind(), "inference");
        assert_eq!(err.to_string(), "Inference failed: out of memory");
    }
}
