//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, upgrade headers)
//!     → router.rs (ordered rules, first match wins)
//!     → matcher.rs (evaluate individual predicates)
//!     → Return: exactly one RouteKind (Fallback when nothing else applies)
//!
//! Route Compilation (at startup):
//!     forwarded paths + instance mode
//!     → Compile matchers
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Classification has no side effects; the lazily discovered website file
//!   set is initialized by the caller before classifying
//! - Deterministic: same input always yields the same route

pub mod matcher;
pub mod router;

pub use router::{
    DirectoryProbe, DiscoveredFiles, FileProbe, RouteKind, Router, SharedRouter, INDEX_HTML,
    PILET_API_SEGMENT,
};
