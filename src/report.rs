use crate::models::{BoundingBox, DetectionRecord, FeatureKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportParseError {
    #[error("line {line}: expected \"<Kind>: <x>, <y>, <width>, <height>\"")]
    Malformed { line: usize },

    #[error("line {line}: unknown feature kind {kind:?}")]
    UnknownKind { line: usize, kind: String },
}

/// `"<Kind>: <x>, <y>, <width>, <height>"`
pub fn format_record(record: &DetectionRecord) -> String {
    let r = &record.bbox;
    format!("{}: {}, {}, {}, {}", record.kind, r.x, r.y, r.width, r.height)
}

/// One line per record in order; empty input gives an empty string
pub fn format_report(records: &[DetectionRecord]) -> String {
    records
        .iter()
        .map(format_record)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read back a report produced by [`format_report`]. Blank lines are skipped.
pub fn parse_report(text: &str) -> Result<Vec<DetectionRecord>, ReportParseError> {
    let mut records = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let (kind, values) = raw
            .split_once(':')
            .ok_or(ReportParseError::Malformed { line })?;
        let kind = FeatureKind::from_name(kind.trim()).ok_or_else(|| {
            ReportParseError::UnknownKind {
                line,
                kind: kind.trim().to_string(),
            }
        })?;
        let numbers = values
            .split(',')
            .map(|v| v.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ReportParseError::Malformed { line })?;
        let [x, y, width, height] = numbers[..] else {
            return Err(ReportParseError::Malformed { line });
        };
        records.push(DetectionRecord::new(kind, BoundingBox::new(x, y, width, height)));
    }
    Ok(records)
}
