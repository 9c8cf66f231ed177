use image::DynamicImage;
use pantry_vision::detection::{BoundingBox, DetectError, Detection, Detector};
use std::sync::{Arc, Mutex};

/// Mock detector returning a fixed set of detections for every image.
#[derive(Debug)]
pub struct MockDetector {
    pub detections: Arc<Mutex<Vec<Detection>>>,
    pub seen_sizes: Arc<Mutex<Vec<(u32, u32)>>>,
    pub error: Option<String>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self {
            detections: Arc::new(Mutex::new(Vec::new())),
            seen_sizes: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    /// Detections with the given class names, one box each.
    pub fn with_labels(self, labels: &[&str]) -> Self {
        *self.detections.lock().unwrap() = labels
            .iter()
            .enumerate()
            .map(|(i, name)| detection(i, name, i as f32 * 20.0))
            .collect();
        self
    }

    pub fn with_detections(self, detections: Vec<Detection>) -> Self {
        *self.detections.lock().unwrap() = detections;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.seen_sizes.lock().unwrap().len()
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MockDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectError> {
        self.seen_sizes
            .lock()
            .unwrap()
            .push((image.width(), image.height()));

        if let Some(ref error) = self.error {
            return Err(DetectError::inference(error.clone()));
        }

        Ok(self.detections.lock().unwrap().clone())
    }
}

pub fn detection(class_id: usize, class_name: &str, x1: f32) -> Detection {
    Detection {
        class_id,
        class_name: class_name.to_string(),
        confidence: 0.8,
        bbox: BoundingBox {
            x1,
            y1: 0.0,
            x2: x1 + 50.0,
            y2: 50.0,
        },
    }
}
