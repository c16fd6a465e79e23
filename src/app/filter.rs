//! Time-range filters over a [`Catalog`]
//!
//! Both filters are pure and order-preserving. Quarter filtering layers on top
//! of year filtering: it only applies when a year is also given.

use crate::app::models::{Catalog, Quarter};
use crate::errors::FilterResult;

/// Keep only records for `year`; `None` returns the catalog unchanged
pub fn filter_by_year(catalog: &Catalog, year: Option<i32>) -> Catalog {
    let Some(year) = year else {
        return catalog.clone();
    };

    Catalog::from_sorted(
        catalog
            .iter()
            .filter(|record| record.year == year)
            .cloned()
            .collect(),
    )
}

/// Keep only records in `quarter` of `year`
///
/// A no-op unless both `year` and `quarter` are given. A quarter outside
/// 1..=4 fails with [`FilterError::InvalidQuarter`](crate::errors::FilterError)
/// even when the caller already validated it.
pub fn filter_by_quarter(
    catalog: &Catalog,
    year: Option<i32>,
    quarter: Option<u8>,
) -> FilterResult<Catalog> {
    let (Some(year), Some(quarter)) = (year, quarter) else {
        return Ok(catalog.clone());
    };
    let quarter = Quarter::try_from(quarter)?;

    Ok(Catalog::from_sorted(
        catalog
            .iter()
            .filter(|record| record.year == year && quarter.contains(record.month))
            .cloned()
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{archive_filename, FileRecord};
    use crate::errors::FilterError;
    use url::Url;

    fn catalog() -> Catalog {
        let base = Url::parse("https://example.com/").unwrap();
        let records = [(2020, 12), (2021, 1), (2021, 4), (2021, 5), (2021, 6), (2021, 7), (2022, 5)]
            .into_iter()
            .map(|(year, month)| {
                let filename = archive_filename("divvy", year, month);
                let url = base.join(&filename).unwrap();
                FileRecord::new(filename, url, 1024, year, month)
            })
            .collect();
        Catalog::new(records)
    }

    fn periods(catalog: &Catalog) -> Vec<(i32, u32)> {
        catalog.iter().map(FileRecord::period).collect()
    }

    #[test]
    fn test_filter_by_year() {
        let filtered = filter_by_year(&catalog(), Some(2021));
        assert_eq!(
            periods(&filtered),
            vec![(2021, 1), (2021, 4), (2021, 5), (2021, 6), (2021, 7)]
        );
    }

    #[test]
    fn test_filter_by_year_none_is_identity() {
        let original = catalog();
        assert_eq!(filter_by_year(&original, None), original);
    }

    #[test]
    fn test_filter_by_year_no_match() {
        assert!(filter_by_year(&catalog(), Some(2013)).is_empty());
    }

    #[test]
    fn test_filter_by_quarter() {
        let filtered = filter_by_quarter(&catalog(), Some(2021), Some(2)).unwrap();
        assert_eq!(periods(&filtered), vec![(2021, 4), (2021, 5), (2021, 6)]);
    }

    #[test]
    fn test_filter_by_quarter_checks_year_too() {
        // (2022, 5) is in Q2 but the wrong year
        let filtered = filter_by_quarter(&catalog(), Some(2022), Some(2)).unwrap();
        assert_eq!(periods(&filtered), vec![(2022, 5)]);
    }

    #[test]
    fn test_filter_by_quarter_invalid() {
        let result = filter_by_quarter(&catalog(), Some(2021), Some(5));
        assert_eq!(result, Err(FilterError::InvalidQuarter { value: 5 }));

        let result = filter_by_quarter(&catalog(), Some(2021), Some(0));
        assert_eq!(result, Err(FilterError::InvalidQuarter { value: 0 }));
    }

    #[test]
    fn test_filter_by_quarter_requires_both() {
        let original = catalog();
        assert_eq!(filter_by_quarter(&original, None, Some(2)).unwrap(), original);
        assert_eq!(filter_by_quarter(&original, Some(2021), None).unwrap(), original);
        // Out-of-range quarter is not inspected without a year
        assert_eq!(filter_by_quarter(&original, None, Some(9)).unwrap(), original);
    }

    #[test]
    fn test_filters_compose() {
        let by_year = filter_by_year(&catalog(), Some(2021));
        let by_quarter = filter_by_quarter(&by_year, Some(2021), Some(3)).unwrap();
        assert_eq!(periods(&by_quarter), vec![(2021, 7)]);
    }

    #[test]
    fn test_filters_do_not_mutate_input() {
        let original = catalog();
        let snapshot = original.clone();
        let _ = filter_by_year(&original, Some(2021));
        let _ = filter_by_quarter(&original, Some(2021), Some(1));
        assert_eq!(original, snapshot);
    }
}
