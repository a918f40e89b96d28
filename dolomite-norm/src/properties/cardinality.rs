use std::cmp::{max, min};
use std::fmt::{Display, Formatter};

/// Bounds of the number of rows a relational expression may return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cardinality {
    min: u64,
    /// `None` means unbounded.
    max: Option<u64>,
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::ANY
    }
}

impl Cardinality {
    pub const ANY: Cardinality = Cardinality { min: 0, max: None };
    pub const ZERO: Cardinality = Cardinality {
        min: 0,
        max: Some(0),
    };

    pub fn new(min: u64, max: Option<u64>) -> Self {
        Self { min, max }
    }

    pub fn exact(rows: u64) -> Self {
        Self {
            min: rows,
            max: Some(rows),
        }
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> Option<u64> {
        self.max
    }

    pub fn is_zero(&self) -> bool {
        self.max == Some(0)
    }

    /// Same upper bound, but may return no rows at all.
    pub fn as_low_as_zero(&self) -> Self {
        Self {
            min: 0,
            max: self.max,
        }
    }

    /// Bounds after returning at most `rows` rows.
    pub fn limit(&self, rows: u64) -> Self {
        Self {
            min: min(self.min, rows),
            max: Some(self.max.map_or(rows, |m| min(m, rows))),
        }
    }

    /// Upper bound of the cross product of both inputs.
    pub fn product(&self, other: &Self) -> Self {
        Self {
            min: self.min.saturating_mul(other.min),
            max: match (self.max, other.max) {
                (Some(0), _) | (_, Some(0)) => Some(0),
                (Some(l), Some(r)) => l.checked_mul(r),
                _ => None,
            },
        }
    }

    /// At least `min_rows` rows are returned.
    pub fn at_least(&self, min_rows: u64) -> Self {
        Self {
            min: max(self.min, min_rows),
            max: self.max.map(|m| max(m, min_rows)),
        }
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(m) => write!(f, "[{} - {}]", self.min, m),
            None => write!(f, "[{} - ]", self.min),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::properties::Cardinality;

    #[test]
    fn test_limit() {
        assert_eq!(Cardinality::new(0, Some(10)), Cardinality::ANY.limit(10));
        assert_eq!(Cardinality::exact(3), Cardinality::exact(5).limit(3));
        assert!(Cardinality::exact(5).limit(0).is_zero());
    }

    #[test]
    fn test_product() {
        assert_eq!(
            Cardinality::new(2, Some(12)),
            Cardinality::exact(2).product(&Cardinality::new(1, Some(6)))
        );
        assert_eq!(None, Cardinality::ANY.product(&Cardinality::exact(1)).max());
        assert!(Cardinality::ZERO.product(&Cardinality::exact(4)).is_zero());
        assert!(Cardinality::ANY.product(&Cardinality::ZERO).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!("[0 - 0]", Cardinality::ZERO.to_string());
        assert_eq!("[1 - ]", Cardinality::ANY.at_least(1).to_string());
    }
}
