use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{FillError, PatternError};
use crate::fill::PathFiller;
use crate::params::Params;

/// Cache of compiled fillers keyed by raw template.
///
/// Entries are never evicted; the set of templates is bounded by the route
/// table that feeds it.
#[derive(Debug, Default)]
pub struct PatternCache {
	fillers: RwLock<HashMap<String, Arc<PathFiller>>>,
}

impl PatternCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the filler for `template`, compiling it on first use.
	pub fn filler(&self, template: &str) -> Result<Arc<PathFiller>, PatternError> {
		if let Some(filler) = self.fillers.read().get(template) {
			return Ok(Arc::clone(filler));
		}

		let filler = Arc::new(PathFiller::compile(template)?);
		let mut fillers = self.fillers.write();
		Ok(Arc::clone(
			fillers.entry(template.to_string()).or_insert(filler),
		))
	}

	/// Fills `template` with `params` through the cached filler.
	pub fn fill(&self, template: &str, params: &Params) -> Result<String, FillError> {
		self.filler(template)?.fill(params)
	}

	/// Number of cached templates.
	pub fn len(&self) -> usize {
		self.fillers.read().len()
	}

	/// Whether nothing has been cached yet.
	pub fn is_empty(&self) -> bool {
		self.fillers.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::ParamValue;
	use rstest::rstest;

	#[rstest]
	fn test_cache_reuses_compiled_filler() {
		// Arrange
		let cache = PatternCache::new();
		let mut params = Params::new();
		params.insert("id".to_string(), ParamValue::from("1"));

		// Act
		let first = cache.filler("/user/:id").unwrap();
		let second = cache.filler("/user/:id").unwrap();
		let path = cache.fill("/user/:id", &params).unwrap();

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(cache.len(), 1);
		assert_eq!(path, "/user/1");
	}

	#[rstest]
	fn test_cache_propagates_fill_errors() {
		// Arrange
		let cache = PatternCache::new();

		// Act
		let result = cache.fill("/user/:id", &Params::new());

		// Assert
		assert!(matches!(result, Err(FillError::Missing { .. })));
	}
}
