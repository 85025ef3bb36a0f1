//! Row ordering
//!
//! A comparator built once per ORDER BY and applied to many rows. Direction
//! and null placement are per-column; the column types do the actual
//! comparisons.

use super::data_type::SqlType;
use super::value::Value;
use crate::error::{Error, Result};
use crate::session::SessionContext;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub descending: bool,
    pub nulls_last: bool,
}

impl SortSpec {
    pub fn ascending() -> Self {
        SortSpec {
            descending: false,
            nulls_last: false,
        }
    }

    pub fn descending() -> Self {
        SortSpec {
            descending: true,
            nulls_last: false,
        }
    }

    pub fn with_nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self
    }
}

pub struct RowComparator {
    columns: Vec<(SqlType, SortSpec)>,
}

impl RowComparator {
    /// One spec per column of the row type, resolved eagerly so compare
    /// itself never re-derives column information.
    pub fn new(row_type: &SqlType, specs: &[SortSpec]) -> Result<Self> {
        let fields = match row_type {
            SqlType::Row { fields } => fields,
            other => {
                return Err(Error::Internal(format!(
                    "row comparator over {}",
                    other.name()
                )));
            }
        };
        if fields.len() != specs.len() {
            return Err(Error::Internal(format!(
                "{} sort specs for {} columns",
                specs.len(),
                fields.len()
            )));
        }
        Ok(RowComparator {
            columns: fields
                .iter()
                .cloned()
                .zip(specs.iter().copied())
                .collect(),
        })
    }

    pub fn compare(
        &self,
        session: &dyn SessionContext,
        a: &[Value],
        b: &[Value],
    ) -> Result<Ordering> {
        if a.len() != self.columns.len() || b.len() != self.columns.len() {
            return Err(Error::Internal(format!(
                "compared rows of {} and {} columns against {}",
                a.len(),
                b.len(),
                self.columns.len()
            )));
        }
        for (i, (ty, spec)) in self.columns.iter().enumerate() {
            let (x, y) = (&a[i], &b[i]);
            let ord = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => {
                    if spec.nulls_last {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    }
                }
                (false, true) => {
                    if spec.nulls_last {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                (false, false) => {
                    let ord = ty.compare(session, x, y)?;
                    if spec.descending { ord.reverse() } else { ord }
                }
            };
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalSession;
    use crate::types::collation::Collation;

    fn row_type() -> SqlType {
        SqlType::Row {
            fields: vec![
                SqlType::Integer,
                SqlType::Varchar {
                    length: 16,
                    collation: Collation::DEFAULT,
                },
            ],
        }
    }

    fn row(n: i32, s: &str) -> Vec<Value> {
        vec![Value::Integer(n), Value::String(s.to_string())]
    }

    #[test]
    fn test_multi_column_order() {
        let session = LocalSession::new();
        let cmp = RowComparator::new(
            &row_type(),
            &[SortSpec::ascending(), SortSpec::descending()],
        )
        .unwrap();
        assert_eq!(
            cmp.compare(&session, &row(1, "a"), &row(2, "a")).unwrap(),
            Ordering::Less
        );
        // Second column is descending.
        assert_eq!(
            cmp.compare(&session, &row(1, "a"), &row(1, "b")).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn test_null_placement() {
        let session = LocalSession::new();
        let cmp = RowComparator::new(
            &row_type(),
            &[SortSpec::ascending().with_nulls_last(), SortSpec::ascending()],
        )
        .unwrap();
        let with_null = vec![Value::Null, Value::String("x".into())];
        assert_eq!(
            cmp.compare(&session, &with_null, &row(1, "x")).unwrap(),
            Ordering::Greater
        );

        let nulls_first = RowComparator::new(
            &row_type(),
            &[SortSpec::ascending(), SortSpec::ascending()],
        )
        .unwrap();
        assert_eq!(
            nulls_first
                .compare(&session, &with_null, &row(1, "x"))
                .unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_descending_does_not_flip_nulls() {
        let session = LocalSession::new();
        let cmp = RowComparator::new(
            &row_type(),
            &[SortSpec::descending().with_nulls_last(), SortSpec::ascending()],
        )
        .unwrap();
        let with_null = vec![Value::Null, Value::String("x".into())];
        // NULLS LAST holds regardless of direction.
        assert_eq!(
            cmp.compare(&session, &with_null, &row(100, "x")).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn test_spec_arity_checked() {
        assert!(RowComparator::new(&row_type(), &[SortSpec::ascending()]).is_err());
    }

    #[test]
    fn test_row_arity_checked() {
        let session = LocalSession::new();
        let cmp = RowComparator::new(
            &row_type(),
            &[SortSpec::ascending(), SortSpec::ascending()],
        )
        .unwrap();
        let short = vec![Value::Integer(1)];
        assert!(cmp.compare(&session, &short, &row(1, "a")).is_err());
        assert!(cmp.compare(&session, &row(1, "a"), &short).is_err());
    }
}
