//! Property-based invariant tests for the grid pipeline and window math.
//!
//! 1. Window bounds satisfy `0 <= start <= end <= total` for any offset,
//!    including negative and non-finite ones.
//! 2. Spacers plus materialized rows add up to the full list height.
//! 3. Re-running the pipeline on unchanged inputs yields the same row handles.
//! 4. Sorting is a permutation that orders present cells and puts missing
//!    cells last.
//! 5. Concatenating every page reproduces the unpaged rows.
//! 6. Columns mixing numbers, NaN, booleans and text sort without panicking,
//!    into an order consistent with `compare_cells`.
//! 7. Replacing the rows after any scroll restarts the window at the top.

use std::cmp::Ordering;

use gridflow_grid::sort::compare_cells;
use gridflow_grid::{
    Cell, Filter, Filters, Phase, Record, Row, SortDirection, SortState, VirtualRenderer,
    WindowMetrics, compute_filtered_rows, compute_paged_rows, compute_sorted_rows,
    compute_total_pages, compute_visible_rows, rows_shallow_eq,
};
use proptest::prelude::*;

fn scroll_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6f64..1.0e7,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((prop::option::of(-100i32..100), "[a-c]{0,3}"), 0..60).prop_map(
        |fields| {
            fields
                .into_iter()
                .enumerate()
                .map(|(i, (score, tag))| {
                    let record = Record::new().with("id", i as f64).with("tag", tag);
                    let record = match score {
                        Some(score) => record.with("score", score),
                        None => record,
                    };
                    record.into_row()
                })
                .collect::<Vec<Row>>()
        },
    )
}

fn cell_strategy() -> impl Strategy<Value = Cell> {
    prop_oneof![
        (-1.0e3f64..1.0e3).prop_map(Cell::from),
        Just(Cell::from(f64::NAN)),
        Just(Cell::from(f64::INFINITY)),
        any::<bool>().prop_map(Cell::from),
        "[a-cA-C0-9]{0,3}".prop_map(Cell::from),
    ]
}

fn mixed_rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(prop::option::of(cell_strategy()), 0..120).prop_map(|cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                let record = Record::new().with("id", i as f64);
                let record = match cell {
                    Some(cell) => record.with("v", cell),
                    None => record,
                };
                record.into_row()
            })
            .collect::<Vec<Row>>()
    })
}

fn numbered(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| Record::new().with("id", i as f64).into_row())
        .collect()
}

fn score(row: &Row) -> Option<f64> {
    row.get("score").and_then(Cell::as_number)
}

proptest! {
    #[test]
    fn window_bounds_hold(
        row_height in 1.0f64..200.0,
        viewport in 0.0f64..5000.0,
        buffer in 0usize..20,
        scroll_top in scroll_strategy(),
        total in 0usize..100_000,
    ) {
        let metrics = WindowMetrics::new(row_height, viewport)
            .with_buffer(buffer)
            .with_scroll_top(scroll_top);
        let range = metrics.range(total);
        prop_assert!(range.start <= range.end);
        prop_assert!(range.end <= total);

        let pos = metrics.positioning(range, total);
        let materialized = range.len() as f64 * row_height;
        let sum = pos.top + pos.bottom + materialized;
        prop_assert!((sum - pos.total_height).abs() <= pos.total_height * 1e-9 + 1e-6);
    }

    #[test]
    fn pipeline_is_idempotent(
        rows in rows_strategy(),
        needle in "[a-c]{0,2}",
        desc in any::<bool>(),
        page in 0usize..6,
        page_size in prop::option::of(1usize..20),
    ) {
        let filters = Filters::new().with("tag", Filter::contains(needle));
        let sort = SortState {
            key: "score".into(),
            direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
        };
        let first = compute_visible_rows(&rows, Some(&filters), Some(&sort), &[], page, page_size);
        let second = compute_visible_rows(&rows, Some(&filters), Some(&sort), &[], page, page_size);
        prop_assert!(rows_shallow_eq(&first, &second));
    }

    #[test]
    fn sort_orders_and_puts_missing_last(rows in rows_strategy(), desc in any::<bool>()) {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        let sorted = compute_sorted_rows(
            &rows,
            Some(&SortState { key: "score".into(), direction }),
            &[],
        );
        prop_assert_eq!(sorted.len(), rows.len());

        let scores: Vec<Option<f64>> = sorted.iter().map(score).collect();
        let first_missing = scores.iter().position(Option::is_none).unwrap_or(scores.len());
        prop_assert!(scores[first_missing..].iter().all(Option::is_none));
        for pair in scores[..first_missing].windows(2) {
            let (a, b) = (pair[0].unwrap_or_default(), pair[1].unwrap_or_default());
            match direction {
                SortDirection::Asc => prop_assert!(a <= b),
                SortDirection::Desc => prop_assert!(a >= b),
            }
        }
    }

    #[test]
    fn pages_partition_the_rows(rows in rows_strategy(), page_size in 1usize..15) {
        let pages = compute_total_pages(rows.len(), Some(page_size));
        let mut joined = Vec::new();
        for page in 1..=pages {
            let chunk = compute_paged_rows(&rows, page, Some(page_size));
            prop_assert!(chunk.len() <= page_size);
            joined.extend(chunk);
        }
        prop_assert!(rows_shallow_eq(&joined, &rows));
        prop_assert!(compute_paged_rows(&rows, pages + 1, Some(page_size)).is_empty());
    }

    #[test]
    fn filtering_never_adds_rows(rows in rows_strategy(), needle in "[a-c]{0,2}") {
        let filters = Filters::new().with("tag", Filter::contains(needle.clone()));
        let filtered = compute_filtered_rows(&rows, Some(&filters));
        prop_assert!(filtered.len() <= rows.len());
        for row in &filtered {
            let tag = row.get("tag").map(ToString::to_string).unwrap_or_default();
            prop_assert!(tag.contains(needle.as_str()));
        }
    }

    #[test]
    fn mixed_kind_columns_sort_consistently(rows in mixed_rows_strategy(), desc in any::<bool>()) {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        let sorted = compute_sorted_rows(
            &rows,
            Some(&SortState { key: "v".into(), direction }),
            &[],
        );
        prop_assert_eq!(sorted.len(), rows.len());
        let mut ids: Vec<String> = sorted
            .iter()
            .filter_map(|row| row.get("id").map(ToString::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), rows.len());

        let cells: Vec<Option<&Cell>> = sorted.iter().map(|row| row.get("v")).collect();
        let first_missing = cells.iter().position(Option::is_none).unwrap_or(cells.len());
        prop_assert!(cells[first_missing..].iter().all(Option::is_none));
        for pair in cells[..first_missing].windows(2) {
            if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                let ord = compare_cells(a, b);
                match direction {
                    SortDirection::Asc => prop_assert_ne!(ord, Ordering::Greater),
                    SortDirection::Desc => prop_assert_ne!(ord, Ordering::Less),
                }
            }
        }
    }

    #[test]
    fn replacing_rows_after_scroll_restarts_at_top(
        row_height in 1.0f64..100.0,
        viewport in 0.0f64..2000.0,
        buffer in 0usize..10,
        before in 0usize..5000,
        scroll_top in scroll_strategy(),
        after in 1usize..500,
    ) {
        let metrics = WindowMetrics::new(row_height, viewport).with_buffer(buffer);
        let mut renderer = VirtualRenderer::new(metrics);
        renderer.set_rows(numbered(before));
        renderer.scroll(scroll_top);

        let slice = renderer.set_rows(numbered(after)).expect("new rows always render");
        prop_assert_eq!(renderer.phase(), Phase::Idle);
        prop_assert_eq!(slice.start_index, 0);
        let expected = (metrics.rows_per_viewport() + 2 * buffer).min(after);
        prop_assert_eq!(slice.end_index, expected);
        prop_assert_eq!(slice.rows.len(), expected);
    }
}
