//! Collations
//!
//! A collation pairs an ordering rule with a pad-space flag. Under pad-space
//! comparison the shorter operand is logically right-padded with spaces
//! before comparing, which is what makes CHAR(5) 'ab' equal to VARCHAR 'ab'.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollationKind {
    /// Code-point order.
    Ordinal,
    /// Case-insensitive: operands compare by their upper-cased form.
    UpperCase,
    /// Locale order: case-folded primary comparison with a raw tie-break,
    /// so distinct strings never compare equal.
    Locale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Collation {
    pub kind: CollationKind,
    pub pad_space: bool,
}

impl Collation {
    /// The SQL default: ordinal ordering with pad-space semantics.
    pub const DEFAULT: Collation = Collation {
        kind: CollationKind::Ordinal,
        pad_space: true,
    };

    pub fn ordinal() -> Self {
        Collation::DEFAULT
    }

    pub fn upper_case() -> Self {
        Collation {
            kind: CollationKind::UpperCase,
            pad_space: true,
        }
    }

    pub fn locale() -> Self {
        Collation {
            kind: CollationKind::Locale,
            pad_space: true,
        }
    }

    pub fn no_pad(mut self) -> Self {
        self.pad_space = false;
        self
    }

    /// Two collations order text the same way when their kinds match; the
    /// pad flag is a comparison-time policy, not an ordering family.
    pub fn same_family(&self, other: &Collation) -> bool {
        self.kind == other.kind
    }

    pub fn is_default(&self) -> bool {
        *self == Collation::DEFAULT
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if self.pad_space {
            let len = a.chars().count().max(b.chars().count());
            self.compare_padded(a, b, len)
        } else {
            self.compare_padded(a, b, 0)
        }
    }

    /// Character-wise comparison, extending both operands with spaces up to
    /// `pad_to` characters.
    fn compare_padded(&self, a: &str, b: &str, pad_to: usize) -> Ordering {
        let pad = |s: &str| {
            let n = pad_to.saturating_sub(s.chars().count());
            s.chars().chain(std::iter::repeat_n(' ', n)).collect::<String>()
        };
        let (a, b) = (pad(a), pad(b));
        match self.kind {
            CollationKind::Ordinal => a.cmp(&b),
            CollationKind::UpperCase => a.to_uppercase().cmp(&b.to_uppercase()),
            CollationKind::Locale => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(&b)),
        }
    }
}

impl Default for Collation {
    fn default() -> Self {
        Collation::DEFAULT
    }
}
