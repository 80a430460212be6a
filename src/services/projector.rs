//! Table and chart projections of a collapsed table

use std::collections::HashMap;

use crate::types::{GroupKey, TableRow, WeeklyTable};

/// Collapsed table plus a trailing `("Total", "")` row summing every row,
/// `Others` included.
pub fn table_view(collapsed: &WeeklyTable) -> WeeklyTable {
    let mut view = collapsed.clone();
    view.rows.push(TableRow {
        key: GroupKey::total(collapsed.arity()),
        values: collapsed.column_sums(),
    });
    view
}

/// One row per top-level key, sub-rows summed, original order kept.
/// The synthetic Others row stays separate from a real group with the same
/// text. Never carries a Total row.
pub fn chart_view(collapsed: &WeeklyTable) -> WeeklyTable {
    let mut rows: Vec<TableRow> = Vec::new();
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();

    for row in collapsed.rows.iter().filter(|r| !r.key.is_total()) {
        let pos = *positions.entry(row.key.top_level()).or_insert_with_key(|key| {
            rows.push(TableRow {
                key: key.clone(),
                values: vec![0; collapsed.weeks.len()],
            });
            rows.len() - 1
        });
        for (sum, value) in rows[pos].values.iter_mut().zip(&row.values) {
            *sum = sum.saturating_add(*value);
        }
    }

    WeeklyTable {
        weeks: collapsed.weeks.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::week::bucket;
    use crate::types::WeekKey;
    use chrono::{Duration, NaiveDate};

    fn weeks(n: usize) -> Vec<WeekKey> {
        let base = NaiveDate::from_ymd_opt(2024, 2, 4).unwrap();
        (0..n)
            .map(|i| bucket(base - Duration::weeks(i as i64)))
            .collect()
    }

    fn row(fields: &[&str], values: &[u64]) -> TableRow {
        TableRow {
            key: GroupKey::new(fields.iter().map(|s| s.to_string()).collect()),
            values: values.to_vec(),
        }
    }

    fn collapsed() -> WeeklyTable {
        WeeklyTable {
            weeks: weeks(2),
            rows: vec![
                row(&["a", "google / cpc"], &[5, 1]),
                row(&["a", "bing / cpc"], &[2, 2]),
                row(&["b", "google / cpc"], &[4, 0]),
                TableRow {
                    key: GroupKey::others(2),
                    values: vec![3, 3],
                },
            ],
        }
    }

    // ========== table_view() tests ==========

    #[test]
    fn test_table_view_appends_total_last() {
        let view = table_view(&collapsed());

        assert_eq!(view.rows.len(), 5);
        let total = view.rows.last().unwrap();
        assert!(total.key.is_total());
        assert_eq!(total.key.fields(), &["Total", ""]);
        assert_eq!(total.values, vec![14, 6]);
    }

    #[test]
    fn test_table_view_total_equals_column_sums_of_other_rows() {
        let view = table_view(&collapsed());
        let (total, rest) = view.rows.split_last().unwrap();
        for col in 0..view.weeks.len() {
            let sum: u64 = rest.iter().map(|r| r.values[col]).sum();
            assert_eq!(total.values[col], sum);
        }
    }

    #[test]
    fn test_table_view_single_level_key() {
        let table = WeeklyTable {
            weeks: weeks(1),
            rows: vec![row(&["Direct"], &[7]), row(&["Paid Search"], &[3])],
        };

        let view = table_view(&table);

        assert_eq!(view.rows.last().unwrap().key, GroupKey::total(1));
    }

    // ========== chart_view() tests ==========

    #[test]
    fn test_chart_view_one_row_per_top_level() {
        let chart = chart_view(&collapsed());

        let tops: Vec<&str> = chart.rows.iter().map(|r| r.key.top()).collect();
        assert_eq!(tops, vec!["a", "b", "Others"]);
        assert_eq!(chart.rows[0].values, vec![7, 3]);
        assert!(chart.rows.iter().all(|r| r.key.arity() == 1));
    }

    #[test]
    fn test_chart_view_skips_total() {
        let chart = chart_view(&table_view(&collapsed()));

        assert!(chart.rows.iter().all(|r| !r.key.is_total()));
        assert_eq!(chart.rows.len(), 3);
    }

    #[test]
    fn test_chart_view_real_others_group_not_merged() {
        let collapsed = WeeklyTable {
            weeks: weeks(1),
            rows: vec![
                row(&["Others", "email / newsletter"], &[100]),
                row(&["a", "x"], &[50]),
                TableRow {
                    key: GroupKey::others(2),
                    values: vec![2],
                },
            ],
        };

        let chart = chart_view(&collapsed);

        assert_eq!(chart.rows.len(), 3);
        assert_eq!(chart.rows[0].values, vec![100]);
        assert!(!chart.rows[0].key.is_others());
        let last = chart.rows.last().unwrap();
        assert!(last.key.is_others());
        assert_eq!(last.values, vec![2]);
    }

    #[test]
    fn test_chart_view_keeps_real_total_channel() {
        let table = WeeklyTable {
            weeks: weeks(1),
            rows: vec![row(&["Direct"], &[7]), row(&["Total"], &[3])],
        };

        let chart = chart_view(&table_view(&table));

        let tops: Vec<&str> = chart.rows.iter().map(|r| r.key.top()).collect();
        assert_eq!(tops, vec!["Direct", "Total"]);
        assert!(chart.rows.iter().all(|r| !r.key.is_total()));
    }
}
