//! Path templates for client-side routing.
//!
//! A template such as `/user/:id(\\d+)/posts/:slug*` is parsed into a list of
//! [`Token`]s. The tokens compile into an anchored [`regex::Regex`] with one
//! capture group per [`Key`] ([`PathPattern`]) and, in the other direction,
//! into a [`PathFiller`] that renders a concrete path from [`Params`].
//!
//! ## Syntax
//!
//! | Template | Meaning |
//! |----------|---------|
//! | `:name` | Named parameter, matches up to the next delimiter |
//! | `:name(\\d+)` | Named parameter with a custom pattern |
//! | `(\\d+)` | Unnamed parameter, keyed by its index |
//! | `:name?` | Optional parameter |
//! | `:name+` / `:name*` | Repeated parameter (one or more / zero or more) |
//! | `*` | Wildcard, matches anything including `/` |
//! | `\\:` | Escaped literal |
//!
//! ## Example
//!
//! ```
//! use reinhardt_route_pattern::{ParamValue, Params, PathFiller, PathPattern, PatternOptions};
//!
//! let pattern = PathPattern::compile("/user/:id", &PatternOptions::default()).unwrap();
//! let captures = pattern.exec("/user/42").unwrap();
//! assert_eq!(captures, vec![Some("42".to_string())]);
//!
//! let filler = PathFiller::compile("/user/:id").unwrap();
//! let mut params = Params::new();
//! params.insert("id".to_string(), ParamValue::from("42"));
//! assert_eq!(filler.fill(&params).unwrap(), "/user/42");
//! ```

mod cache;
mod compile;
mod encode;
mod error;
mod fill;
mod params;
mod token;

pub use cache::PatternCache;
pub use compile::{PathPattern, PatternOptions};
pub use encode::{encode_asterisk, encode_pretty};
pub use error::{FillError, PatternError};
pub use fill::PathFiller;
pub use params::{ParamValue, Params};
pub use token::{Key, KeyName, Token, parse};
