//! Path patterns used by route records
//!
//! Patterns use `:name` segments with optional `?`, `*` and `+` modifiers,
//! custom `(regex)` groups and a bare `*` catch-all.
//!
//! ## Example
//!
//! ```
//! use reinhardt_navigator::pattern::{PathPattern, PatternOptions};
//!
//! let pattern = PathPattern::compile("/users/:id", &PatternOptions::default()).unwrap();
//! assert!(pattern.exec("/users/7").is_some());
//! assert!(pattern.exec("/posts/7").is_none());
//! ```

// Re-export all reinhardt-route-pattern functionality
pub use reinhardt_route_pattern::*;
