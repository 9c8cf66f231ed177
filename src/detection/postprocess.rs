use super::{BoundingBox, DetectError};
use crate::imaging::Letterbox;
use ndarray::ArrayView2;
use std::cmp::Ordering;

const BOX_ROWS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

/// A scored box before its class id has been resolved to a name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

pub fn decode(
    output: ArrayView2<'_, f32>,
    letterbox: &Letterbox,
    params: &DecodeParams,
) -> Result<Vec<Candidate>, DetectError> {
    let (rows, candidates) = output.dim();
    if rows <= BOX_ROWS {
        return Err(DetectError::output(format!(
            "expected more than {} rows per candidate, got {}",
            BOX_ROWS, rows
        )));
    }

    let mut kept = Vec::new();
    for i in 0..candidates {
        let column = output.column(i);

        let best = column
            .iter()
            .skip(BOX_ROWS)
            .enumerate()
            .filter(|(_, score)| score.is_finite())
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let Some((class_id, &confidence)) = best else {
            continue;
        };
        if confidence <= params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
        if ![cx, cy, w, h].iter().all(|v| v.is_finite()) || w <= 0.0 || h <= 0.0 {
            continue;
        }

        let model_box = BoundingBox::from_center(cx, cy, w, h);
        let (x1, y1) = letterbox.to_source(model_box.x1, model_box.y1);
        let (x2, y2) = letterbox.to_source(model_box.x2, model_box.y2);

        kept.push(Candidate {
            class_id,
            confidence,
            bbox: BoundingBox { x1, y1, x2, y2 },
        });
    }

    Ok(non_max_suppression(
        kept,
        params.iou_threshold,
        params.max_detections,
    ))
}

/// Class-aware NMS: a box is only suppressed by a higher-scoring box of the
/// same class. Output is ordered by descending confidence.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if keep.len() >= max_detections {
            break;
        }
        let suppressed = keep.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}
