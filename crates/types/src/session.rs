//! Session context
//!
//! The type kernels are pure functions over immutable inputs plus this
//! capability: locale/timezone, conversion policy flags, and large-object
//! creation. The scanner counterpart (typed-literal parsing) lives in
//! [`crate::types::scanner`] and takes the session as an argument.

use crate::lob::{LobStore, MemoryLobStore};
use chrono::NaiveDate;

/// What a DOUBLE division by exact zero produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoubleZeroPolicy {
    /// Fail with `DivisionByZero`.
    #[default]
    Error,
    /// Produce IEEE 754 Infinity/NaN results.
    Ieee,
}

pub trait SessionContext {
    /// Signed local zone offset in seconds, applied when converting between
    /// zoned and unzoned datetime values.
    fn zone_offset_seconds(&self) -> i32;

    /// The session's current date, used when widening TIME to TIMESTAMP.
    fn current_date(&self) -> NaiveDate;

    /// Whether implicit numeric conversions truncate excess fraction digits
    /// (true) or round them half-up (false).
    fn numeric_truncates(&self) -> bool {
        true
    }

    fn double_zero_division(&self) -> DoubleZeroPolicy {
        DoubleZeroPolicy::Error
    }

    /// Minimum result scale for exact numeric division.
    fn min_division_scale(&self) -> u32 {
        0
    }

    fn lobs(&self) -> &dyn LobStore;
}

/// Concrete session for embedded callers and tests.
pub struct LocalSession {
    zone_offset: i32,
    current_date: NaiveDate,
    numeric_truncates: bool,
    double_zero: DoubleZeroPolicy,
    min_division_scale: u32,
    lobs: MemoryLobStore,
}

impl LocalSession {
    pub fn new() -> Self {
        LocalSession {
            zone_offset: 0,
            current_date: chrono::Utc::now().date_naive(),
            numeric_truncates: true,
            double_zero: DoubleZeroPolicy::Error,
            min_division_scale: 0,
            lobs: MemoryLobStore::new(),
        }
    }

    pub fn with_zone_offset(mut self, seconds: i32) -> Self {
        self.zone_offset = seconds;
        self
    }

    pub fn with_current_date(mut self, date: NaiveDate) -> Self {
        self.current_date = date;
        self
    }

    /// Switch implicit numeric conversions from truncation to rounding.
    pub fn with_rounding_conversions(mut self) -> Self {
        self.numeric_truncates = false;
        self
    }

    pub fn with_double_zero_division(mut self, policy: DoubleZeroPolicy) -> Self {
        self.double_zero = policy;
        self
    }

    pub fn with_min_division_scale(mut self, scale: u32) -> Self {
        self.min_division_scale = scale;
        self
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        LocalSession::new()
    }
}

impl SessionContext for LocalSession {
    fn zone_offset_seconds(&self) -> i32 {
        self.zone_offset
    }

    fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    fn numeric_truncates(&self) -> bool {
        self.numeric_truncates
    }

    fn double_zero_division(&self) -> DoubleZeroPolicy {
        self.double_zero
    }

    fn min_division_scale(&self) -> u32 {
        self.min_division_scale
    }

    fn lobs(&self) -> &dyn LobStore {
        &self.lobs
    }
}
