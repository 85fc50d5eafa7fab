//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `SubAccountId` where an
//! `InvoiceId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(CompanyId, "Unique identifier for a company.");
typed_id!(JournalEntryId, "Unique identifier for a journal entry.");
typed_id!(LedgerLineId, "Unique identifier for a ledger line.");
typed_id!(SubAccountId, "Unique identifier for a sub-account.");
typed_id!(TaxPeriodId, "Unique identifier for a tax regularization period.");
typed_id!(InvoiceId, "Unique identifier for an invoice.");
typed_id!(ReceiptId, "Unique identifier for a payment receipt.");
typed_id!(DeliveryNoteId, "Unique identifier for a delivery note.");

/// Short alphanumeric code identifying a fiscal year (e.g. "2026").
///
/// Fiscal years are keyed by a human-assigned code rather than a UUID, so the
/// code travels denormalized on entries and invoices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearCode(String);

impl YearCode {
    /// Maximum length of a year code.
    pub const MAX_LEN: usize = 4;

    /// Creates a year code, validating length and character set.
    ///
    /// # Errors
    ///
    /// Returns an error message if the code is empty, longer than
    /// [`Self::MAX_LEN`], or contains non-alphanumeric characters.
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.is_empty() || code.len() > Self::MAX_LEN {
            return Err(format!(
                "Year code must be 1-{} characters: {code:?}",
                Self::MAX_LEN
            ));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("Year code must be alphanumeric: {code:?}"));
        }
        Ok(Self(code))
    }

    /// Derives the code for the calendar year containing the given date.
    #[must_use]
    pub fn from_year(year: i32) -> Self {
        Self(format!("{year:04}"))
    }

    /// Wraps a code read back from storage without re-validating it.
    ///
    /// Stored codes were validated on the way in; use [`Self::new`] for any
    /// external input.
    #[must_use]
    pub fn trusted(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for YearCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for YearCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
