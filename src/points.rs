//! `x,y,z` point records in volume-space voxel units.

use std::{fs, path::Path};

use glam::Vec3;

use crate::error::{PlanError, PointParseError};
use crate::overlay::NeedlePlan;

/// Parse one CSV record. Blank lines give `Ok(None)`.
///
/// `line` is the 1-based line number used in error messages.
pub fn parse_record(text: &str, line: usize) -> Result<Option<Vec3>, PointParseError> {
    let text = text.trim().trim_start_matches('\u{feff}');
    if text.is_empty() {
        return Ok(None);
    }
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(PointParseError::FieldCount {
            line,
            found: fields.len(),
        });
    }
    let mut coords = [0.0f32; 3];
    for (coord, field) in coords.iter_mut().zip(&fields) {
        *coord = field
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PointParseError::InvalidNumber {
                line,
                value: (*field).to_owned(),
            })?;
    }
    Ok(Some(Vec3::from_array(coords)))
}

/// Parse every record, keeping the good ones and reporting the rest.
pub fn parse_records(text: &str) -> (Vec<Vec3>, Vec<PointParseError>) {
    let mut points = Vec::new();
    let mut rejected = Vec::new();
    for (i, line) in text.lines().enumerate() {
        match parse_record(line, i + 1) {
            Ok(Some(point)) => points.push(point),
            Ok(None) => {}
            Err(err) => rejected.push(err),
        }
    }
    (points, rejected)
}

/// Parse a plan: the first record is the start, the second the end.
///
/// # Errors
///
/// Fails on any malformed record or when fewer than two records exist
pub fn parse_plan(text: &str) -> Result<NeedlePlan, PlanError> {
    let mut points = Vec::with_capacity(2);
    for (i, line) in text.lines().enumerate() {
        if let Some(point) = parse_record(line, i + 1)? {
            points.push(point);
        }
    }
    match points.as_slice() {
        [start, end, ..] => Ok(NeedlePlan {
            start: *start,
            end: *end,
        }),
        _ => Err(PlanError::InsufficientPlanData {
            found: points.len(),
        }),
    }
}

pub fn load_plan_file(path: impl AsRef<Path>) -> Result<NeedlePlan, PlanError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_plan(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        assert_eq!(
            parse_record(" 1.5, -2 ,3e1 ", 1),
            Ok(Some(Vec3::new(1.5, -2.0, 30.0)))
        );
        assert_eq!(parse_record("   ", 2), Ok(None));
        assert_eq!(
            parse_record("1,2", 3),
            Err(PointParseError::FieldCount { line: 3, found: 2 })
        );
        assert_eq!(
            parse_record("1,two,3", 4),
            Err(PointParseError::InvalidNumber {
                line: 4,
                value: "two".into()
            })
        );
        assert!(parse_record("1,NaN,3", 5).is_err());
    }

    #[test]
    fn test_parse_records_skips_bad_rows() {
        let (points, rejected) = parse_records("0,0,0\nbad\n\n1,1,1\n1,1\n2,2,2\n");
        assert_eq!(points, vec![Vec3::ZERO, Vec3::ONE, Vec3::splat(2.0)]);
        assert_eq!(rejected.len(), 2);
    }

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan("10,20,30\n40,50,60\n70,80,90\n").unwrap();
        assert_eq!(plan.start, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(plan.end, Vec3::new(40.0, 50.0, 60.0));
    }

    #[test]
    fn test_plan_needs_two_points() {
        assert!(matches!(
            parse_plan("10,20,30\n"),
            Err(PlanError::InsufficientPlanData { found: 1 })
        ));
        assert!(matches!(
            parse_plan(""),
            Err(PlanError::InsufficientPlanData { found: 0 })
        ));
    }

    #[test]
    fn test_plan_rejects_malformed_rows() {
        assert!(matches!(
            parse_plan("10,20,30\n40,x,60\n"),
            Err(PlanError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_plan_file(dir.path().join("missing.csv"));
        assert!(matches!(result, Err(PlanError::Io { .. })));
    }
}
