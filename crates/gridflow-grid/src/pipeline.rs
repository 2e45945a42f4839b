//! The filter → sort → paginate pipeline.
//!
//! Every stage is a pure function over a row slice and returns new `Vec`s of
//! shared [`Row`] handles; no record is ever cloned. [`GridModel`] installs
//! these as computed properties, but they are usable on their own.
//!
//! [`GridModel`]: crate::GridModel

use std::rc::Rc;

use crate::column::Column;
use crate::filter::Filters;
use crate::record::{Cell, Row};
use crate::sort::{SortState, compare_optional};

/// Rows passing every filter, in input order.
#[must_use]
pub fn compute_filtered_rows(rows: &[Row], filters: Option<&Filters>) -> Vec<Row> {
    match filters {
        Some(filters) if !filters.is_empty() => rows
            .iter()
            .filter(|row| filters.matches(row))
            .cloned()
            .collect(),
        _ => rows.to_vec(),
    }
}

/// Rows stably sorted by `sort`.
///
/// The cell comes from the matching column (accessor or field). A sort key
/// with no matching column falls back to the record field of that name.
#[must_use]
pub fn compute_sorted_rows(rows: &[Row], sort: Option<&SortState>, columns: &[Column]) -> Vec<Row> {
    let Some(sort) = sort else {
        return rows.to_vec();
    };
    let column = columns.iter().find(|c| c.key == sort.key);

    let mut keyed: Vec<(Option<Cell>, &Row)> = rows
        .iter()
        .map(|row| {
            let cell = match column {
                Some(column) => column.cell(row),
                None => row.get(&sort.key).cloned(),
            };
            (cell, row)
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_optional(a.as_ref(), b.as_ref(), sort.direction));
    keyed.into_iter().map(|(_, row)| Rc::clone(row)).collect()
}

/// The rows of 1-based `page`. Pages below 1 read as page 1; bounds past the
/// end are clamped. Without a page size (or with size 0) every row is
/// returned.
#[must_use]
pub fn compute_paged_rows(rows: &[Row], page: usize, page_size: Option<usize>) -> Vec<Row> {
    let Some(size) = page_size.filter(|size| *size > 0) else {
        return rows.to_vec();
    };
    let start = page.max(1).saturating_sub(1).saturating_mul(size).min(rows.len());
    let end = start.saturating_add(size).min(rows.len());
    rows[start..end].to_vec()
}

/// All three stages in order.
#[must_use]
pub fn compute_visible_rows(
    rows: &[Row],
    filters: Option<&Filters>,
    sort: Option<&SortState>,
    columns: &[Column],
    page: usize,
    page_size: Option<usize>,
) -> Vec<Row> {
    let filtered = compute_filtered_rows(rows, filters);
    let sorted = compute_sorted_rows(&filtered, sort, columns);
    compute_paged_rows(&sorted, page, page_size)
}

/// `max(1, ceil(total / page_size))`, or 1 without a page size.
#[must_use]
pub fn compute_total_pages(total_rows: usize, page_size: Option<usize>) -> usize {
    match page_size {
        Some(size) if size > 0 => total_rows.div_ceil(size).max(1),
        _ => 1,
    }
}

/// Same length and the same row handles in the same order.
#[must_use]
pub fn rows_shallow_eq(a: &[Row], b: &[Row]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::record::Record;

    fn rows(values: &[(&str, Option<i32>)]) -> Vec<Row> {
        values
            .iter()
            .map(|(name, age)| {
                let record = Record::new().with("name", *name);
                let record = match age {
                    Some(age) => record.with("age", *age),
                    None => record,
                };
                record.into_row()
            })
            .collect()
    }

    fn names(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r.get("name").map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn filtering_keeps_order_and_handles() {
        let input = rows(&[("Ada", Some(36)), ("Bob", Some(20)), ("Adele", None)]);
        let filters = Filters::new().with("name", Filter::contains("Ad"));
        let out = compute_filtered_rows(&input, Some(&filters));
        assert_eq!(names(&out), ["Ada", "Adele"]);
        assert!(Rc::ptr_eq(&out[0], &input[0]));
    }

    #[test]
    fn empty_filters_pass_everything() {
        let input = rows(&[("a", None), ("b", None)]);
        assert!(rows_shallow_eq(&compute_filtered_rows(&input, Some(&Filters::new())), &input));
        assert!(rows_shallow_eq(&compute_filtered_rows(&input, None), &input));
    }

    #[test]
    fn sort_puts_missing_last_in_both_directions() {
        let input = rows(&[("x", None), ("y", Some(2)), ("z", Some(1))]);
        let columns = [Column::new("age")];

        let asc = compute_sorted_rows(&input, Some(&SortState::asc("age")), &columns);
        assert_eq!(names(&asc), ["z", "y", "x"]);

        let desc = compute_sorted_rows(&input, Some(&SortState::desc("age")), &columns);
        assert_eq!(names(&desc), ["y", "z", "x"]);
    }

    #[test]
    fn sort_is_stable() {
        let input = rows(&[("a", Some(1)), ("b", Some(0)), ("c", Some(1)), ("d", Some(0))]);
        let sorted = compute_sorted_rows(&input, Some(&SortState::asc("age")), &[]);
        assert_eq!(names(&sorted), ["b", "d", "a", "c"]);
    }

    #[test]
    fn sort_uses_column_accessor() {
        let input = rows(&[("bb", None), ("a", None), ("ccc", None)]);
        let columns = [Column::new("len").accessor(|r| {
            let len = r.get("name")?.to_string().len();
            Some(Cell::Number(len as f64))
        })];
        let sorted = compute_sorted_rows(&input, Some(&SortState::desc("len")), &columns);
        assert_eq!(names(&sorted), ["ccc", "bb", "a"]);
    }

    #[test]
    fn paging_clamps_bounds() {
        let input = rows(&[("a", None), ("b", None), ("c", None)]);
        assert_eq!(names(&compute_paged_rows(&input, 2, Some(2))), ["c"]);
        assert_eq!(names(&compute_paged_rows(&input, 0, Some(2))), ["a", "b"]);
        assert!(compute_paged_rows(&input, 9, Some(2)).is_empty());
        assert_eq!(compute_paged_rows(&input, 3, None).len(), 3);
        assert_eq!(compute_paged_rows(&input, usize::MAX, Some(usize::MAX)).len(), 0);
    }

    #[test]
    fn total_pages_has_floor_of_one() {
        assert_eq!(compute_total_pages(0, Some(10)), 1);
        assert_eq!(compute_total_pages(25, Some(10)), 3);
        assert_eq!(compute_total_pages(25, None), 1);
        assert_eq!(compute_total_pages(25, Some(0)), 1);
    }

    #[test]
    fn pipeline_is_idempotent_on_unchanged_input() {
        let input = rows(&[("c", Some(3)), ("a", Some(1)), ("b", Some(2))]);
        let sort = SortState::asc("age");
        let first = compute_visible_rows(&input, None, Some(&sort), &[], 1, Some(2));
        let second = compute_visible_rows(&input, None, Some(&sort), &[], 1, Some(2));
        assert!(rows_shallow_eq(&first, &second));
        assert_eq!(names(&first), ["a", "b"]);
    }
}
