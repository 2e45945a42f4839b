//! Sort state and cell ordering.

use std::cmp::Ordering;

use crate::record::Cell;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Which column the grid is sorted by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    #[must_use]
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Order two defined cells ascending.
///
/// This is a total order, so it is safe for `sort_by`:
///
/// - Cells of different kinds order by kind: numbers, then booleans, then
///   text.
/// - Numbers compare numerically; NaN sorts after every other number.
/// - Text compares case-insensitively first, then by exact text.
#[must_use]
pub fn compare_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.is_nan().cmp(&y.is_nan()).then_with(|| {
            if x.is_nan() {
                Ordering::Equal
            } else {
                x.total_cmp(y)
            }
        }),
        (Cell::Bool(x), Cell::Bool(y)) => x.cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(cell: &Cell) -> u8 {
    match cell {
        Cell::Number(_) => 0,
        Cell::Bool(_) => 1,
        Cell::Text(_) => 2,
    }
}

/// Order two possibly missing cells for `direction`. Missing cells sort
/// after every present cell in both directions.
#[must_use]
pub fn compare_optional(a: Option<&Cell>, b: Option<&Cell>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_cells(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_cells(&Cell::from(9), &Cell::from(10)), Ordering::Less);
        assert_eq!(
            compare_cells(&Cell::from("9"), &Cell::from("10")),
            Ordering::Greater
        );
    }

    #[test]
    fn text_ignores_case_first() {
        assert_eq!(compare_cells(&Cell::from("apple"), &Cell::from("Banana")), Ordering::Less);
        assert_eq!(compare_cells(&Cell::from("a"), &Cell::from("A")), Ordering::Greater);
    }

    #[test]
    fn missing_sorts_last_both_ways() {
        let one = Cell::from(1);
        for dir in [SortDirection::Asc, SortDirection::Desc] {
            assert_eq!(compare_optional(None, Some(&one), dir), Ordering::Greater);
            assert_eq!(compare_optional(Some(&one), None, dir), Ordering::Less);
        }
    }

    #[test]
    fn mixed_kinds_order_by_kind() {
        let nine = Cell::from(9);
        let ten = Cell::from(10);
        let five = Cell::from("5");
        assert_eq!(compare_cells(&nine, &ten), Ordering::Less);
        assert_eq!(compare_cells(&ten, &five), Ordering::Less);
        assert_eq!(compare_cells(&nine, &five), Ordering::Less);
        assert_eq!(compare_cells(&Cell::from(true), &five), Ordering::Less);
        assert_eq!(compare_cells(&ten, &Cell::from(false)), Ordering::Less);
    }

    #[test]
    fn nan_sorts_after_numbers() {
        let nan = Cell::from(f64::NAN);
        assert_eq!(compare_cells(&nan, &Cell::from(f64::INFINITY)), Ordering::Greater);
        assert_eq!(compare_cells(&Cell::from(-f64::NAN), &Cell::from(1)), Ordering::Greater);
        assert_eq!(compare_cells(&nan, &nan), Ordering::Equal);
        assert_eq!(compare_cells(&nan, &Cell::from("a")), Ordering::Less);
    }
}
