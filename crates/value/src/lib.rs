//! Silica Value - plain value representations for the SQL type system
//!
//! This crate provides the raw in-memory shapes the type kernels operate on
//! and the storage layer serializes verbatim:
//! - Bit strings with a bit length distinct from the byte length
//! - Interval values (month-count and seconds/nanos families)
//! - Temporal tuples (epoch seconds, nanoseconds, optional zone offset)
//! - Large object locators
//!
//! Range checks and SQL semantics live in the type system crate; values here
//! only know how to hold, normalize, and render themselves.

pub mod bitstring;
pub mod interval;
pub mod lob;
pub mod temporal;

pub use bitstring::BitString;
pub use interval::{IntervalValue, NANOS_PER_SECOND};
pub use lob::{LobId, LobLocator};
pub use temporal::{SECONDS_PER_DAY, TimestampValue};
