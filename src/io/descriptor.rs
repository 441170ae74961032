//! Read/write chart descriptor JSON files.
//!
//! Descriptor JSON is the "portable" representation of a built chart:
//! - the descriptor itself (categories, series with gaps as `null`, axis/legend flags)
//! - when and for which datasets it was produced
//!
//! `entsoe plot --descriptor` re-renders these files offline.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::{ChartDescriptor, ChartKind};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    /// Dataset names, e.g. `actual_load:10YAT-APG------L`.
    #[serde(default)]
    pub datasets: Vec<String>,
    pub descriptor: ChartDescriptor,
}

impl DescriptorFile {
    pub fn new(descriptor: ChartDescriptor, datasets: Vec<String>) -> Self {
        Self {
            tool: "entsoe".to_string(),
            generated_at: Utc::now(),
            datasets,
            descriptor,
        }
    }
}

/// Write a descriptor JSON file.
pub fn write_descriptor_json(path: &Path, file_contents: &DescriptorFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create descriptor JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, file_contents)
        .map_err(|e| AppError::new(2, format!("Failed to write descriptor JSON: {e}")))?;

    Ok(())
}

/// Read a descriptor JSON file.
pub fn read_descriptor_json(path: &Path) -> Result<DescriptorFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open descriptor JSON '{}': {e}", path.display())))?;
    let contents: DescriptorFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid descriptor JSON: {e}")))?;
    check_shape(&contents.descriptor)?;
    Ok(contents)
}

/// Every series needs one value per category; pie slices carry exactly one.
fn check_shape(descriptor: &ChartDescriptor) -> Result<(), AppError> {
    let expected = match descriptor.kind {
        ChartKind::Pie => 1,
        _ => descriptor.categories.len(),
    };
    for s in &descriptor.series {
        if s.values.len() != expected {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid descriptor JSON: series '{}' has {} values, expected {expected}",
                    s.label,
                    s.values.len()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartOptions, build_single};
    use crate::domain::{Point, Series};
    use chrono::{Duration, TimeZone};

    #[test]
    fn descriptor_file_round_trips() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = Series::with_points(
            "Actual Load",
            "MW",
            vec![Point::new(t0, 1.5), Point::gap(t0 + Duration::hours(1))],
        );
        let contents = DescriptorFile::new(
            build_single(&series, &ChartOptions::default()),
            vec!["actual_load:10YAT-APG------L".into()],
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        write_descriptor_json(&path, &contents).unwrap();
        let back = read_descriptor_json(&path).unwrap();

        assert_eq!(back, contents);
        assert_eq!(back.descriptor.series[0].values, vec![Some(1.5), None]);
    }

    #[test]
    fn invalid_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"tool\": 1}").unwrap();
        let err = read_descriptor_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("Invalid descriptor JSON"));

        assert!(read_descriptor_json(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn series_longer_than_the_axis_are_rejected() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = Series::with_points(
            "Actual Load",
            "MW",
            vec![Point::new(t0, 1.0), Point::new(t0 + Duration::hours(1), 2.0)],
        );
        let mut contents = DescriptorFile::new(build_single(&series, &ChartOptions::default()), Vec::new());
        contents.descriptor.series[0].values.extend([Some(3.0), Some(4.0)]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        write_descriptor_json(&path, &contents).unwrap();

        let err = read_descriptor_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("has 4 values, expected 2"));
    }
}
