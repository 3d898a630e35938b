use super::provider::Dataset;
use polars::prelude::*;

/// Expected column schemas for the three tables.
pub struct TableSchema;

impl TableSchema {
    /// Get the canonical schema for a dataset.
    pub fn schema(dataset: Dataset) -> Schema {
        match dataset {
            Dataset::Points => Schema::from_iter(vec![
                Field::new("player_id".into(), DataType::Int64),
                Field::new("player".into(), DataType::String),
                Field::new("team".into(), DataType::String),
                Field::new("round".into(), DataType::Int64),
                Field::new("minutes".into(), DataType::Int64),
                Field::new("points".into(), DataType::Int64),
            ]),
            Dataset::Playing => Schema::from_iter(vec![
                Field::new("player_id".into(), DataType::Int64),
                Field::new("player".into(), DataType::String),
                Field::new("team".into(), DataType::String),
                Field::new("status".into(), DataType::String),
                Field::new("chance_of_playing".into(), DataType::Float64),
            ]),
            Dataset::Forecast => Schema::from_iter(vec![
                Field::new("player_id".into(), DataType::Int64),
                Field::new("player".into(), DataType::String),
                Field::new("round".into(), DataType::Int64),
                Field::new("predicted_points".into(), DataType::Float64),
            ]),
        }
    }

    /// Column names a stored snapshot must carry to be considered intact.
    pub fn required_columns(dataset: Dataset) -> &'static [&'static str] {
        match dataset {
            Dataset::Points => &["player_id", "player", "team", "round", "minutes", "points"],
            Dataset::Playing => &["player_id", "player", "team", "status", "chance_of_playing"],
            Dataset::Forecast => &["player_id", "player", "round", "predicted_points"],
        }
    }

    /// Validate a DataFrame against the dataset schema.
    pub fn validate(dataset: Dataset, df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema(dataset);
        let actual = df.schema();

        // Check all required columns exist
        for field in expected.iter_fields() {
            if !actual.contains(field.name()) {
                return Err(SchemaError::MissingColumn(field.name().to_string()));
            }
        }

        // Check data types match
        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dataset_schema_has_player_id() {
        for ds in Dataset::ALL {
            let schema = TableSchema::schema(ds);
            assert!(schema.contains("player_id"), "{ds} lacks player_id");
        }
    }

    #[test]
    fn required_columns_match_schema() {
        for ds in Dataset::ALL {
            let schema = TableSchema::schema(ds);
            for col_name in TableSchema::required_columns(ds) {
                assert!(schema.contains(col_name), "{ds} schema lacks {col_name}");
            }
            assert_eq!(schema.len(), TableSchema::required_columns(ds).len());
        }
    }

    #[test]
    fn validate_accepts_valid_playing_frame() {
        let df = df!(
            "player_id" => &[11i64, 12],
            "player" => &["Saka", "Haaland"],
            "team" => &["ARS", "MCI"],
            "status" => &["a", "d"],
            "chance_of_playing" => &[100.0, 75.0],
        )
        .unwrap();

        assert!(TableSchema::validate(Dataset::Playing, &df).is_ok());
    }

    #[test]
    fn validate_rejects_missing_column() {
        let df = df!(
            "player_id" => &[11i64],
            "player" => &["Saka"],
            // Missing team, status, chance_of_playing
        )
        .unwrap();

        let result = TableSchema::validate(Dataset::Playing, &df);
        assert!(matches!(
            result.unwrap_err(),
            SchemaError::MissingColumn(_)
        ));
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let df = df!(
            "player_id" => &[11i64],
            "player" => &["Saka"],
            "team" => &["ARS"],
            "status" => &["a"],
            "chance_of_playing" => &["certain"], // Wrong type
        )
        .unwrap();

        let result = TableSchema::validate(Dataset::Playing, &df);
        assert!(matches!(
            result.unwrap_err(),
            SchemaError::TypeMismatch { .. }
        ));
    }
}
