//! Unit tests for resampling and export

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::DatasetError;
    use crate::table::io::read_time_table_path;
    use crate::table::{float_column, ReadOptions};
    use crate::testing::generators::TestDataGenerator;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .unwrap()
    }

    fn hourly_table(gen: &TestDataGenerator, hours: usize) -> TimeTable {
        let values = (0..hours).map(|h| Some((h % 17) as f64 * 1.5)).collect();
        TimeTable::from_columns(gen.hourly_index(hours), vec![float_column("price", values)]).unwrap()
    }

    #[test]
    fn test_bucket_start() {
        let t = ts(2023, 1, 4, 13, 45);
        assert_eq!(Resolution::Hourly.bucket_start(t), ts(2023, 1, 4, 13, 0));
        assert_eq!(Resolution::Daily.bucket_start(t), ts(2023, 1, 4, 0, 0));
        // 2023-01-04 is a Wednesday
        assert_eq!(Resolution::Weekly.bucket_start(t), ts(2023, 1, 2, 0, 0));
        // Sunday still belongs to the week that started on Monday
        assert_eq!(
            Resolution::Weekly.bucket_start(ts(2023, 1, 8, 23, 0)),
            ts(2023, 1, 2, 0, 0)
        );
    }

    #[test]
    fn test_bucket_alignment_ignores_first_row() {
        let index = vec![ts(2023, 1, 4, 13, 30), ts(2023, 1, 4, 14, 15)];
        let table = TimeTable::from_columns(
            index,
            vec![float_column("a", vec![Some(1.0), Some(3.0)])],
        )
        .unwrap();

        let hourly = resample(&table, Resolution::Hourly).unwrap();
        assert_eq!(
            hourly.index().unwrap(),
            vec![ts(2023, 1, 4, 13, 0), ts(2023, 1, 4, 14, 0)]
        );
        let daily = resample(&table, Resolution::Daily).unwrap();
        assert_eq!(daily.index().unwrap(), vec![ts(2023, 1, 4, 0, 0)]);
        assert_eq!(daily.values("a"), Some(vec![Some(2.0)]));
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        let index = vec![ts(2023, 1, 2, 0, 0), ts(2023, 1, 5, 0, 0)];
        let table = TimeTable::from_columns(
            index,
            vec![float_column("a", vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();

        let daily = resample(&table, Resolution::Daily).unwrap();
        assert_eq!(
            daily.index().unwrap(),
            vec![ts(2023, 1, 2, 0, 0), ts(2023, 1, 5, 0, 0)]
        );
    }

    #[test]
    fn test_bucket_mean_skips_missing() {
        let gen = TestDataGenerator::new();
        let table = TimeTable::from_columns(
            gen.hourly_index(3),
            vec![
                float_column("a", vec![Some(1.0), None, Some(5.0)]),
                float_column("b", vec![None, None, None]),
            ],
        )
        .unwrap();

        let daily = resample(&table, Resolution::Daily).unwrap();
        assert_eq!(daily.values("a"), Some(vec![Some(3.0)]));
        assert_eq!(daily.values("b"), Some(vec![None]));
        assert_eq!(daily.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_daily_is_mean_of_hourly() {
        let gen = TestDataGenerator::new();
        let table = hourly_table(&gen, 72);

        let hourly = resample(&table, Resolution::Hourly).unwrap();
        let daily = resample(&table, Resolution::Daily).unwrap();
        assert_eq!(daily.len(), 3);

        let hourly_index = hourly.index().unwrap();
        let hourly_price = hourly.values("price").unwrap();
        for (row, day) in daily.index().unwrap().iter().enumerate() {
            let in_day: Vec<f64> = hourly_index
                .iter()
                .zip(&hourly_price)
                .filter(|(t, _)| Resolution::Daily.bucket_start(**t) == *day)
                .filter_map(|(_, v)| *v)
                .collect();
            assert_eq!(in_day.len(), 24);
            let expected = in_day.iter().sum::<f64>() / 24.0;
            let actual = daily.values("price").unwrap()[row].unwrap();
            assert!((actual - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_weekly_buckets() {
        let gen = TestDataGenerator::new();
        let table = hourly_table(&gen, 24 * 10);

        let weekly = resample(&table, Resolution::Weekly).unwrap();
        // Monday-to-Sunday buckets, labelled with the closing Sunday
        assert_eq!(
            weekly.index().unwrap(),
            vec![ts(2023, 1, 8, 0, 0), ts(2023, 1, 15, 0, 0)]
        );
    }

    #[test]
    fn test_one_full_week_is_one_sunday_bucket() {
        let gen = TestDataGenerator::new();
        let table = hourly_table(&gen, 168);

        let weekly = resample(&table, Resolution::Weekly).unwrap();
        assert_eq!(weekly.index().unwrap(), vec![ts(2023, 1, 8, 0, 0)]);

        let expected = table.values("price").unwrap().iter().flatten().sum::<f64>() / 168.0;
        let actual = weekly.values("price").unwrap()[0].unwrap();
        assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn test_week_starting_midweek_closes_on_sunday() {
        // Thursday 2023-01-05 through Tuesday 2023-01-10
        let index = vec![ts(2023, 1, 5, 0, 0), ts(2023, 1, 8, 23, 0), ts(2023, 1, 10, 0, 0)];
        let table = TimeTable::from_columns(
            index,
            vec![float_column("a", vec![Some(1.0), Some(3.0), Some(10.0)])],
        )
        .unwrap();

        let weekly = resample(&table, Resolution::Weekly).unwrap();
        assert_eq!(
            weekly.index().unwrap(),
            vec![ts(2023, 1, 8, 0, 0), ts(2023, 1, 15, 0, 0)]
        );
        assert_eq!(weekly.values("a"), Some(vec![Some(2.0), Some(10.0)]));
    }

    #[test]
    fn test_label() {
        let monday = ts(2023, 1, 2, 0, 0);
        assert_eq!(Resolution::Weekly.label(monday), ts(2023, 1, 8, 0, 0));
        assert_eq!(Resolution::Daily.label(monday), monday);
        assert_eq!(Resolution::Hourly.label(monday), monday);
    }

    #[test]
    fn test_export_all_writes_three_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("finalized");
        let gen = TestDataGenerator::new();
        let table = hourly_table(&gen, 48);

        let written = export_all(&table, &out, "Start date").unwrap();
        assert_eq!(written.len(), 3);
        for resolution in Resolution::ALL {
            assert!(out.join(resolution.file_name()).exists());
        }

        let daily = read_time_table_path(
            &out.join("finalized_daily_data.csv"),
            &ReadOptions::new("daily", "Start date"),
        )
        .unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily.column_names(), vec!["price"]);
    }

    #[test]
    fn test_export_failure_is_per_output() {
        let dir = TempDir::new().unwrap();
        // a directory where the daily file should go makes only that write fail
        std::fs::create_dir(dir.path().join(Resolution::Daily.file_name())).unwrap();
        let gen = TestDataGenerator::new();
        let table = hourly_table(&gen, 24);

        let err = export_all(&table, dir.path(), "Start date").unwrap_err();
        match err {
            DatasetError::Export { failed } => {
                assert_eq!(failed.len(), 1);
                assert!(failed[0].starts_with("finalized_daily_data.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join(Resolution::Hourly.file_name()).is_file());
        assert!(dir.path().join(Resolution::Weekly.file_name()).is_file());
    }
}
