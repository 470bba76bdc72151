//! Tests for error types

#[cfg(test)]
mod tests {
    use super::super::error::DatasetError;

    #[test]
    fn test_config_error() {
        let err = DatasetError::Config("no price columns".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("no price columns"));
    }

    #[test]
    fn test_missing_column() {
        let err = DatasetError::MissingColumn {
            feed: "actual_generation".to_string(),
            column: "Total [MWh] Original resolutions".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("actual_generation"));
        assert!(msg.contains("Total [MWh] Original resolutions"));
    }

    #[test]
    fn test_missing_feed() {
        let err = DatasetError::MissingFeed("price".to_string());
        assert!(err.to_string().contains("Missing feed"));
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_data_error() {
        let err = DatasetError::Data("duplicate timestamp".to_string());
        assert!(err.to_string().contains("Data error"));
    }

    #[test]
    fn test_timestamp_error() {
        let err = DatasetError::Timestamp("bad value".to_string());
        assert!(err.to_string().contains("Timestamp error"));
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DatasetError = io.into();
        assert!(err.to_string().contains("IO error"));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_polars_error_from() {
        let polars = polars::prelude::PolarsError::ColumnNotFound("Average_Price".into());
        let err: DatasetError = polars.into();
        assert!(err.to_string().contains("Dataframe error"));
        assert!(err.to_string().contains("Average_Price"));
    }

    #[test]
    fn test_export_error_lists_failures() {
        let err = DatasetError::Export {
            failed: vec!["daily".to_string(), "weekly".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Export failed"));
        assert!(msg.contains("daily, weekly"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = DatasetError::Config("test".to_string());
        let debug = format!("{:?}", err);
        assert!(debug.contains("Config"));
    }

    #[test]
    fn test_error_variants_distinct() {
        let config = DatasetError::Config("test".to_string());
        let data = DatasetError::Data("test".to_string());

        assert_ne!(config.to_string(), data.to_string());
    }
}
