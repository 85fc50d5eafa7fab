//! Common types used across the application.

pub mod amount;
pub mod id;

pub use amount::{round_amount, AMOUNT_SCALE, BALANCE_TOLERANCE, ENTRY_AMOUNT_TOLERANCE};
pub use id::*;
