use crate::{PriceColumn, PricePoint, PriceSeries, PriceTable, RawPriceData};

const ADJUSTED_CLOSE: &str = "Adj Close";
const CLOSE: &str = "Close";

/// Extract a single clean closing-price series from raw provider data.
///
/// Shape rules, in priority order: absent or empty data yields `None`; a
/// plain series passes through; a table selects the adjusted close when
/// present, then the plain close, then the first column. Rows with missing,
/// non-positive or non-finite values are dropped. Fails closed so callers
/// can skip a ticker cleanly.
pub fn normalize(raw: RawPriceData) -> Option<PriceSeries> {
    match raw {
        RawPriceData::Empty => None,
        RawPriceData::Series(points) => {
            let points: Vec<PricePoint> = points
                .into_iter()
                .filter(|p| p.close.is_finite() && p.close > 0.0)
                .collect();
            non_empty(points)
        }
        RawPriceData::Table(table) => {
            if table.dates.is_empty() {
                return None;
            }
            let column = select_close_column(&table)?;
            let points: Vec<PricePoint> = table
                .dates
                .iter()
                .zip(column.values.iter())
                .filter_map(|(date, value)| match value {
                    Some(v) if v.is_finite() && *v > 0.0 => {
                        Some(PricePoint { date: *date, close: *v })
                    }
                    _ => None,
                })
                .collect();
            non_empty(points)
        }
    }
}

fn select_close_column(table: &PriceTable) -> Option<&PriceColumn> {
    table
        .columns
        .iter()
        .find(|c| c.name == ADJUSTED_CLOSE)
        .or_else(|| table.columns.iter().find(|c| c.name == CLOSE))
        .or_else(|| table.columns.first())
}

fn non_empty(points: Vec<PricePoint>) -> Option<PriceSeries> {
    if points.is_empty() {
        None
    } else {
        Some(PriceSeries::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn table(columns: Vec<PriceColumn>) -> RawPriceData {
        RawPriceData::Table(PriceTable {
            dates: vec![date(2), date(3), date(4)],
            columns,
        })
    }

    fn column(name: &str, values: Vec<Option<f64>>) -> PriceColumn {
        PriceColumn {
            name: name.to_string(),
            values,
        }
    }

    #[test]
    fn empty_input_is_no_data() {
        assert!(normalize(RawPriceData::Empty).is_none());
        assert!(normalize(RawPriceData::Series(vec![])).is_none());
        assert!(normalize(RawPriceData::Table(PriceTable::default())).is_none());
    }

    #[test]
    fn plain_series_passes_through() {
        let points = vec![
            PricePoint { date: date(2), close: 101.0 },
            PricePoint { date: date(3), close: 102.5 },
        ];
        let series = normalize(RawPriceData::Series(points.clone())).unwrap();
        assert_eq!(series.points, points);
    }

    #[test]
    fn adjusted_close_preferred_over_close() {
        let raw = table(vec![
            column("Close", vec![Some(10.0), Some(11.0), Some(12.0)]),
            column("Adj Close", vec![Some(9.0), Some(9.9), Some(10.8)]),
        ]);
        let series = normalize(raw).unwrap();
        assert_eq!(series.closes(), vec![9.0, 9.9, 10.8]);
    }

    #[test]
    fn falls_back_to_close_then_first_column() {
        let raw = table(vec![column("Close", vec![Some(10.0), Some(11.0), Some(12.0)])]);
        assert_eq!(normalize(raw).unwrap().closes(), vec![10.0, 11.0, 12.0]);

        let raw = table(vec![
            column("Open", vec![Some(1.0), Some(2.0), Some(3.0)]),
            column("High", vec![Some(4.0), Some(5.0), Some(6.0)]),
        ]);
        assert_eq!(normalize(raw).unwrap().closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_and_degenerate_values_are_dropped() {
        let raw = table(vec![column(
            "Close",
            vec![Some(10.0), None, Some(f64::NAN)],
        )]);
        let series = normalize(raw).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points[0].date, date(2));
    }

    #[test]
    fn all_missing_column_is_no_data() {
        let raw = table(vec![column("Close", vec![None, None, None])]);
        assert!(normalize(raw).is_none());
    }
}
