//! SQL type system: a closed hierarchy of SQL data types with inference,
//! conversion, comparison, arithmetic, and large-object indirection.
//!
//! The layering is strict: [`types::value`] holds runtime representations,
//! the kernel modules under [`types`] own per-family semantics, and
//! [`types::SqlType`] dispatches every operation to the right kernel. The
//! [`session::SessionContext`] capability carries the ambient state
//! (timezone, conversion policy, lob store) the kernels need; everything
//! else is a pure function.

pub mod error;
pub mod lob;
pub mod session;
pub mod types;

pub use error::{CastWarning, Error, Result};
pub use lob::{BlobReader, ClobReader, LobStore, MemoryLobStore, RemoteLobStore};
pub use session::{DoubleZeroPolicy, LocalSession, SessionContext};
pub use types::{
    Collation, CollationKind, ComparisonGroup, DateTimePart, IntervalField, OperatorKind,
    RowComparator, SortSpec, SqlType, TypeCode, Value, scan_value,
};
