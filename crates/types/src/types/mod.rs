//! The SQL type system: descriptors, values, and per-family kernels.

pub mod binary;
pub mod boolean;
pub mod character;
pub mod collation;
pub mod collection;
pub mod data_type;
pub mod datetime;
pub mod interval;
pub mod number;
pub mod registry;
pub mod scanner;
pub mod sort;
pub mod value;

pub use collation::{Collation, CollationKind};
pub use data_type::{ComparisonGroup, OperatorKind, SqlType};
pub use datetime::DateTimePart;
pub use interval::IntervalField;
pub use registry::TypeCode;
pub use scanner::scan_value;
pub use sort::{RowComparator, SortSpec};
pub use value::Value;
