//! Large object locators
//!
//! A locator is an opaque handle to data that may not be materialized in
//! memory. The backing store (in-process buffers or a server-resident lob
//! manager) is reached through the type system's indirection layer; values
//! only carry the identity.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LobId(pub u64);

impl fmt::Display for LobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lob:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LobLocator {
    pub id: LobId,
}

impl LobLocator {
    pub fn new(id: LobId) -> Self {
        LobLocator { id }
    }
}

impl fmt::Display for LobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
