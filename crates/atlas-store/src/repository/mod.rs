//! # Repositories
//!
//! Append-only record access for the audit trail entities.
//!
//! ## Ownership
//! - `sale`: Sale records. Created by the checkout processor; the void
//!   processor flips the void sub-state exactly once. Never deleted.
//! - `transfer`: Transfer records. Immutable once created.
//! - `request`: Stock requests. Created pending; decided exactly once.

pub mod request;
pub mod sale;
pub mod transfer;
