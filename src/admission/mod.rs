//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (derive client identity from forwarding headers)
//!     → registry.rs (atomic fixed-window check for that identity)
//!     → filter.rs (admit-and-forward, or short-circuit with 429)
//!
//! Background:
//!     sweep.rs ticks once per window
//!     → registry.rs removes expired client records
//! ```
//!
//! # Design Decisions
//! - The registry is owned by the server and injected into the
//!   middleware; no ambient module state
//! - Check-then-act per identity happens under one shard write lock,
//!   so concurrent requests can never increment past the ceiling
//! - Rejected requests do not consume quota; the client may retry
//!   immediately after the window resets

pub mod filter;
pub mod identity;
pub mod registry;
pub mod sweep;

pub use filter::{admission_middleware, AdmissionSettings, AdmissionState};
pub use identity::{client_identity, ANONYMOUS_IDENTITY};
pub use registry::{ClientWindowRecord, Decision, WindowRegistry};
pub use sweep::Sweeper;
