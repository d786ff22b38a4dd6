//! Static catalog of user-facing error messages.
//!
//! Codes are fixed at compile time and never mutated. Unknown codes are not
//! mapped to anything: [`lookup`] returns `None` for them.

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A single catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub code: &'static str,
    pub message: &'static str,
}

/// Known error codes
///
/// Displayed and parsed as the code string, e.g. `"ERR0000"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum ErrorCode {
    /// Generic failure, used as the fallback message
    #[strum(serialize = "ERR0000")]
    Generic,

    #[strum(serialize = "ERR0001")]
    AccessDenied,
}

static ENTRIES: [ErrorEntry; 2] = [
    ErrorEntry {
        code: "ERR0000",
        message: "Something went wrong. Please try again.",
    },
    ErrorEntry {
        code: "ERR0001",
        message: "Access denied..!",
    },
];

impl ErrorCode {
    pub fn entry(self) -> &'static ErrorEntry {
        match self {
            ErrorCode::Generic => &ENTRIES[0],
            ErrorCode::AccessDenied => &ENTRIES[1],
        }
    }

    pub fn message(self) -> &'static str {
        self.entry().message
    }
}

/// Look up a catalog entry by its code string
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    code.parse::<ErrorCode>().ok().map(ErrorCode::entry)
}

/// All entries, in code order
pub fn entries() -> &'static [ErrorEntry] {
    &ENTRIES
}
