//! Unit tests for the normalize stage

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::fs;
    use tempfile::TempDir;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn column(table: &RawTable, col: usize) -> Vec<&str> {
        table.column(col).collect()
    }

    #[test]
    fn test_column_kind() {
        let table = raw(
            &["n", "c", "blank", "mixed"],
            &[&["1.5", "a", "", "1"], &["-", "b", "-", "x"], &["", "", "", "2"]],
        );
        assert_eq!(column_kind(&table, 0), ColumnKind::Numeric);
        assert_eq!(column_kind(&table, 1), ColumnKind::Categorical);
        assert_eq!(column_kind(&table, 2), ColumnKind::Categorical);
        assert_eq!(column_kind(&table, 3), ColumnKind::Categorical);
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        assert_eq!(mode(["b", "a", "a", "b"].into_iter()), Some("b"));
        assert_eq!(mode(["b", "a", "a", ""].into_iter()), Some("a"));
        assert_eq!(mode(["", "-"].into_iter()), None);
    }

    #[test]
    fn test_min_max_scale() {
        let mut values = vec![10.0, 20.0, 15.0];
        min_max_scale(&mut values);
        assert_eq!(values, vec![0.0, 1.0, 0.5]);

        let mut constant = vec![3.0, 3.0];
        min_max_scale(&mut constant);
        assert_eq!(constant, vec![0.0, 0.0]);
    }

    #[test]
    fn test_numeric_gap_takes_median_before_scaling() {
        let mut table = raw(
            &["Start date", "Load"],
            &[
                &["2023-01-02 00:00:00", "0"],
                &["2023-01-02 01:00:00", "-"],
                &["2023-01-02 02:00:00", "10"],
                &["2023-01-02 03:00:00", "4"],
            ],
        );

        let summary = normalize_table(&mut table);
        assert_eq!(summary.numeric, vec!["Load".to_string()]);
        assert_eq!(summary.categorical, vec!["Start date".to_string()]);
        assert_eq!(summary.filled, 1);
        // median 4 -> 0.4 after scaling over [0, 10]
        assert_eq!(column(&table, 1), vec!["0", "0.4", "1", "0.4"]);
        assert_eq!(column(&table, 0)[1], "2023-01-02 01:00:00");
    }

    #[test]
    fn test_categorical_gap_takes_mode() {
        let mut table = raw(&["Area"], &[&["DE"], &[""], &["FR"], &["DE"]]);
        let summary = normalize_table(&mut table);
        assert_eq!(summary.filled, 1);
        assert_eq!(column(&table, 0), vec!["DE", "DE", "FR", "DE"]);
    }

    #[test]
    fn test_categorical_without_mode_is_left_empty() {
        let mut table = raw(&["Note", "Value"], &[&["", "1"], &["", "2"]]);
        let summary = normalize_table(&mut table);
        assert_eq!(summary.unfilled, vec!["Note".to_string()]);
        assert_eq!(column(&table, 0), vec!["", ""]);
    }

    #[test]
    fn test_run_writes_optimized_files() {
        let refined = TempDir::new().unwrap();
        let optimized = TempDir::new().unwrap();
        fs::write(
            refined.path().join("refined_prices.csv"),
            "Start date,Price\n2023-01-02 00:00:00,10\n2023-01-02 01:00:00,30\n",
        )
        .unwrap();

        let report = Normalizer::new(refined.path(), optimized.path()).run().unwrap();
        assert_eq!(report.processed, vec!["refined_prices.csv".to_string()]);

        let out = fs::read_to_string(optimized.path().join("optimized_refined_prices.csv")).unwrap();
        assert_eq!(
            out,
            "Start date,Price\n2023-01-02 00:00:00,0\n2023-01-02 01:00:00,1\n"
        );
    }
}
