//! Integration Tests for the feature input path
//!
//! CSV text → FeatureTable → schema check → canonical FeatureVectors.

#[cfg(test)]
mod integration_tests {
    use crate::logic::error::{PipelineError, SchemaError};
    use crate::logic::features::{FeatureTable, FEATURE_COUNT, FEATURE_LAYOUT};

    /// Build CSV with the features in reverse order plus an extra text column
    fn shuffled_csv(rows: usize) -> String {
        let mut header: Vec<String> = FEATURE_LAYOUT.iter().rev().map(|s| s.to_string()).collect();
        header.insert(3, "Machining_Process".to_string());

        let mut text = header.join(",");
        text.push('\n');

        for r in 0..rows {
            let cells: Vec<String> = header
                .iter()
                .map(|name| match FEATURE_LAYOUT.iter().position(|n| *n == name.as_str()) {
                    Some(i) => format!("{}", r * 100 + i),
                    None => "Layer 1 Up".to_string(),
                })
                .collect();
            text.push_str(&cells.join(","));
            text.push('\n');
        }

        text
    }

    /// Test projection restores canonical order regardless of file order
    #[test]
    fn test_projection_canonical_order() {
        let table = FeatureTable::parse_csv(&shuffled_csv(3)).unwrap();
        assert_eq!(table.row_count(), 3);

        let vectors = table.project().unwrap();
        assert_eq!(vectors.len(), 3);

        for (r, vector) in vectors.iter().enumerate() {
            for i in 0..FEATURE_COUNT {
                assert_eq!(vector.values[i], (r * 100 + i) as f32);
            }
        }
    }

    /// Test missing column is a schema error, not an input error
    #[test]
    fn test_projection_missing_column() {
        let header: Vec<&str> = FEATURE_LAYOUT[1..].to_vec();
        let row = vec!["1"; header.len()];
        let csv = format!("{}\n{}\n", header.join(","), row.join(","));

        let table = FeatureTable::parse_csv(&csv).unwrap();
        match table.project() {
            Err(PipelineError::Schema(SchemaError::MissingFeatures { missing })) => {
                assert_eq!(missing, vec!["feedrate".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    /// Test non-numeric value in a required column names line and column
    #[test]
    fn test_projection_non_numeric() {
        let header = FEATURE_LAYOUT.join(",");
        let mut cells = vec!["0"; FEATURE_COUNT];
        cells[2] = "high";
        let csv = format!("{}\n{}\n", header, cells.join(","));

        let err = FeatureTable::parse_csv(&csv).unwrap().project().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "{}", message);
        assert!(message.contains("clamp_pressure"), "{}", message);
    }

    /// Test duplicated required column is rejected
    #[test]
    fn test_projection_duplicate_column() {
        let mut header: Vec<&str> = FEATURE_LAYOUT.to_vec();
        header.push("feedrate");
        let cells = vec!["0"; header.len()];
        let csv = format!("{}\n{}\n", header.join(","), cells.join(","));

        let err = FeatureTable::parse_csv(&csv).unwrap().project().unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
    }

    /// Test header-only file projects to zero rows
    #[test]
    fn test_projection_header_only() {
        let table = FeatureTable::parse_csv(&FEATURE_LAYOUT.join(",")).unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(table.project().unwrap().is_empty());
    }
}
