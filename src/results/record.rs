use super::quality::QualityTier;
use super::text::clean_text;
use crate::engine::{Detection, Polygon};
use serde::{Deserialize, Serialize};

/// Schema version written into every record
pub const PROCESSING_VERSION: &str = "1.0.0";

/// Confidence above which a detection counts as high confidence
const HIGH_CONFIDENCE: f64 = 0.8;

/// Axis-aligned box enclosing a detection polygon.
/// Serialized as `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn from_polygon(polygon: &Polygon) -> Self {
        let xs = polygon.iter().map(|p| p[0]);
        let ys = polygon.iter().map(|p| p[1]);
        Self {
            x_min: xs.clone().min().unwrap_or_default(),
            y_min: ys.clone().min().unwrap_or_default(),
            x_max: xs.max().unwrap_or_default(),
            y_max: ys.max().unwrap_or_default(),
        }
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x_min, y_min, x_max, y_max]: [i32; 4]) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

/// One cleaned, annotated detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDetection {
    pub id: String,
    pub text: String,
    pub raw_text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub bbox_polygon: Polygon,
}

impl StructuredDetection {
    fn new(index: usize, detection: &Detection) -> Self {
        Self {
            id: format!("detection_{:03}", index),
            text: clean_text(&detection.text),
            raw_text: detection.text.clone(),
            confidence: round3(detection.confidence),
            bbox: BoundingBox::from_polygon(&detection.polygon),
            bbox_polygon: detection.polygon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub filename: String,
    pub timestamp: String,
    pub total_detections: usize,
    pub average_confidence: f64,
    pub high_confidence_count: usize,
    pub processing_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub extracted_texts: Vec<String>,
    pub quality_score: QualityTier,
}

/// Complete result for one processed image.
///
/// Built once by [`structure`]; only read accessors are exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutput {
    metadata: Metadata,
    detections: Vec<StructuredDetection>,
    summary: Summary,
}

impl StructuredOutput {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn detections(&self) -> &[StructuredDetection] {
        &self.detections
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn quality(&self) -> QualityTier {
        self.summary.quality_score
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Structure raw engine output for `filename`, keeping every detection
pub fn structure(detections: &[Detection], filename: &str) -> StructuredOutput {
    structure_with_threshold(detections, filename, 0.0)
}

/// Structure raw engine output, dropping detections whose rounded confidence
/// is below `min_confidence`. Ids follow engine order and are assigned
/// before filtering.
pub fn structure_with_threshold(
    detections: &[Detection],
    filename: &str,
    min_confidence: f64,
) -> StructuredOutput {
    let detections: Vec<StructuredDetection> = detections
        .iter()
        .enumerate()
        .map(|(index, detection)| StructuredDetection::new(index, detection))
        .filter(|d| d.confidence >= min_confidence)
        .collect();

    let confidences: Vec<f64> = detections.iter().map(|d| d.confidence).collect();
    let average_confidence = if confidences.is_empty() {
        0.0
    } else {
        round3(confidences.iter().sum::<f64>() / confidences.len() as f64)
    };

    let metadata = Metadata {
        filename: filename.to_string(),
        timestamp: chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        total_detections: detections.len(),
        average_confidence,
        high_confidence_count: confidences.iter().filter(|&&c| c > HIGH_CONFIDENCE).count(),
        processing_version: PROCESSING_VERSION.to_string(),
    };

    let summary = Summary {
        extracted_texts: detections.iter().map(|d| d.text.clone()).collect(),
        quality_score: QualityTier::from_confidences(&confidences),
    };

    StructuredOutput {
        metadata,
        detections,
        summary,
    }
}

fn round3(value: f64) -> f64 {
    if value.is_finite() {
        (value * 1000.0).round() / 1000.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Polygon {
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    #[test]
    fn test_bounding_box_from_axis_aligned_polygon() {
        let bbox = BoundingBox::from_polygon(&[[10, 20], [50, 20], [50, 40], [10, 40]]);
        assert_eq!(bbox, BoundingBox::from([10, 20, 50, 40]));
    }

    #[test]
    fn test_bounding_box_contains_rotated_polygon() {
        let polygon = [[30, 5], [60, 25], [40, 55], [8, 33]];
        let bbox = BoundingBox::from_polygon(&polygon);

        assert_eq!(<[i32; 4]>::from(bbox), [8, 5, 60, 55]);
        assert!(bbox.x_min <= bbox.x_max && bbox.y_min <= bbox.y_max);
        for [x, y] in polygon {
            assert!(bbox.contains(x, y));
        }
    }

    #[test]
    fn test_ids_are_zero_padded_in_engine_order() {
        let detections: Vec<Detection> = (0..12)
            .map(|i| Detection::new(rect(0, i * 10, 20, i * 10 + 8), format!("T{}", i), 0.9))
            .collect();

        let output = structure(&detections, "box.jpg");

        let ids: Vec<&str> = output.detections().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids[0], "detection_000");
        assert_eq!(ids[11], "detection_011");
        assert_eq!(output.summary().extracted_texts[3], "T3");
    }

    #[test]
    fn test_detection_fields() {
        let output = structure(
            &[Detection::new(rect(10, 20, 50, 40), " BATCH-2024-A!! ", 0.91237)],
            "crate.png",
        );

        let d = &output.detections()[0];
        assert_eq!(d.text, "BATCH-2024-A");
        assert_eq!(d.raw_text, " BATCH-2024-A!! ");
        assert_eq!(d.confidence, 0.912);
        assert_eq!(d.bbox, BoundingBox::from([10, 20, 50, 40]));
        assert_eq!(d.bbox_polygon, rect(10, 20, 50, 40));
    }

    #[test]
    fn test_metadata_and_summary() {
        let detections = [
            Detection::new(rect(0, 0, 10, 10), "A", 0.95),
            Detection::new(rect(0, 20, 10, 30), "B", 0.81),
            Detection::new(rect(0, 40, 10, 50), "C", 0.60),
        ];

        let output = structure(&detections, "pallet_07.jpg");
        let meta = output.metadata();

        assert_eq!(meta.filename, "pallet_07.jpg");
        assert_eq!(meta.total_detections, 3);
        assert_eq!(meta.average_confidence, 0.787);
        assert_eq!(meta.high_confidence_count, 2);
        assert_eq!(meta.processing_version, PROCESSING_VERSION);
        assert_eq!(output.summary().extracted_texts, ["A", "B", "C"]);
        assert_eq!(output.quality(), QualityTier::Good);
    }

    #[test]
    fn test_empty_detections_produce_valid_record() {
        let output = structure(&[], "blank.jpg");

        assert_eq!(output.metadata().total_detections, 0);
        assert_eq!(output.metadata().average_confidence, 0.0);
        assert_eq!(output.metadata().high_confidence_count, 0);
        assert!(output.summary().extracted_texts.is_empty());
        assert_eq!(output.quality(), QualityTier::NoTextDetected);

        let json: serde_json::Value = serde_json::from_str(&output.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["metadata"]["average_confidence"], 0.0);
        assert_eq!(json["summary"]["quality_score"], "NO_TEXT_DETECTED");
        assert!(json["detections"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_threshold_keeps_original_ids() {
        let detections = [
            Detection::new(rect(0, 0, 10, 10), "LOW", 0.30),
            Detection::new(rect(0, 20, 10, 30), "HIGH", 0.90),
        ];

        let output = structure_with_threshold(&detections, "x.jpg", 0.5);

        assert_eq!(output.metadata().total_detections, 1);
        assert_eq!(output.detections()[0].id, "detection_001");
        assert_eq!(output.quality(), QualityTier::Excellent);
    }

    #[test]
    fn test_serialized_schema() {
        let output = structure(&[Detection::new(rect(1, 2, 3, 4), "SN-1", 0.5)], "a.jpg");
        let json = serde_json::to_value(&output).unwrap();

        for key in ["metadata", "detections", "summary"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["detections"][0]["bbox"], serde_json::json!([1, 2, 3, 4]));
        assert_eq!(
            json["detections"][0]["bbox_polygon"],
            serde_json::json!([[1, 2], [3, 2], [3, 4], [1, 4]])
        );
        assert_eq!(json["summary"]["quality_score"], "POOR");
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let output = structure(&[], "a.jpg");
        let ts = &output.metadata().timestamp;
        assert!(chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok(), "{}", ts);
    }
}
