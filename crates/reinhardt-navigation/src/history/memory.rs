use std::sync::Arc;

use parking_lot::Mutex;

use super::{HistoryBackend, HistoryMode, Traversal, join_base, normalize_base};
use crate::route::Route;

#[derive(Debug)]
struct Stack {
	routes: Vec<Arc<Route>>,
	index: Option<usize>,
}

/// In-memory history stack for non-browser environments.
#[derive(Debug)]
pub struct MemoryHistory {
	base: String,
	stack: Mutex<Stack>,
}

impl MemoryHistory {
	/// Creates an empty stack.
	pub fn new(base: &str) -> Self {
		Self {
			base: normalize_base(base),
			stack: Mutex::new(Stack {
				routes: Vec::new(),
				index: None,
			}),
		}
	}

	/// Full paths of the recorded entries, oldest first.
	pub fn entries(&self) -> Vec<String> {
		self.stack
			.lock()
			.routes
			.iter()
			.map(|route| route.full_path().to_string())
			.collect()
	}

	/// Index of the current entry, if any was recorded.
	pub fn index(&self) -> Option<usize> {
		self.stack.lock().index
	}
}

impl HistoryBackend for MemoryHistory {
	fn mode(&self) -> HistoryMode {
		HistoryMode::Abstract
	}

	fn base(&self) -> &str {
		&self.base
	}

	fn read_location(&self) -> String {
		self.stack
			.lock()
			.routes
			.last()
			.map(|route| route.full_path().to_string())
			.unwrap_or_else(|| "/".to_string())
	}

	fn persist(&self, route: &Arc<Route>, replace: bool) {
		let mut stack = self.stack.lock();
		if replace {
			let keep = stack.index.unwrap_or(0);
			stack.routes.truncate(keep);
			stack.routes.push(Arc::clone(route));
			stack.index = Some(keep);
		} else {
			let keep = stack.index.map_or(0, |index| index + 1);
			stack.routes.truncate(keep);
			stack.routes.push(Arc::clone(route));
			stack.index = Some(keep);
		}
	}

	fn ensure_synced(&self, _current: &Route, _push: bool) {}

	fn traverse(&self, delta: isize) -> Traversal {
		let stack = self.stack.lock();
		let target = stack
			.index
			.and_then(|index| index.checked_add_signed(delta))
			.filter(|target| *target < stack.routes.len());
		match target {
			Some(index) => Traversal::Entry {
				index,
				route: Arc::clone(&stack.routes[index]),
			},
			None => Traversal::None,
		}
	}

	fn settle_traversal(&self, index: usize) {
		let mut stack = self.stack.lock();
		if index < stack.routes.len() {
			stack.index = Some(index);
		}
	}

	fn create_href(&self, full_path: &str) -> String {
		join_base(&self.base, full_path)
	}

	fn external_location(&self, _current: &Arc<Route>) -> Option<String> {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::location::Location;
	use crate::query::QueryCodec;
	use rstest::rstest;

	fn route(path: &str) -> Arc<Route> {
		Arc::new(Route::new(None, &Location::from_path(path), None, &QueryCodec::new()))
	}

	#[rstest]
	fn test_push_truncates_forward_entries() {
		// Arrange
		let history = MemoryHistory::new("");
		for path in ["/a", "/b", "/c"] {
			history.persist(&route(path), false);
		}
		history.settle_traversal(0);

		// Act
		history.persist(&route("/d"), false);

		// Assert
		assert_eq!(history.entries(), ["/a", "/d"]);
		assert_eq!(history.index(), Some(1));
	}

	#[rstest]
	fn test_replace_overwrites_current_entry() {
		// Arrange
		let history = MemoryHistory::new("");
		history.persist(&route("/a"), false);
		history.persist(&route("/b"), false);

		// Act
		history.persist(&route("/c"), true);

		// Assert
		assert_eq!(history.entries(), ["/a", "/c"]);
		assert_eq!(history.index(), Some(1));
		assert_eq!(history.read_location(), "/c");
	}

	#[rstest]
	fn test_replace_on_empty_stack_starts_it() {
		// Arrange
		let history = MemoryHistory::new("");

		// Act
		history.persist(&route("/a"), true);

		// Assert
		assert_eq!(history.entries(), ["/a"]);
		assert_eq!(history.index(), Some(0));
	}

	#[rstest]
	#[case(-1, Some(1))]
	#[case(-2, Some(0))]
	#[case(-3, None)]
	#[case(1, None)]
	fn test_traverse_bounds(#[case] delta: isize, #[case] expected: Option<usize>) {
		// Arrange
		let history = MemoryHistory::new("");
		for path in ["/a", "/b", "/c"] {
			history.persist(&route(path), false);
		}

		// Act
		let traversal = history.traverse(delta);

		// Assert
		let index = match traversal {
			Traversal::Entry { index, .. } => Some(index),
			_ => None,
		};
		assert_eq!(index, expected);
	}

	#[rstest]
	fn test_empty_stack_reads_root_and_hrefs_use_base() {
		// Arrange
		let history = MemoryHistory::new("/app/");

		// Act & Assert
		assert_eq!(history.read_location(), "/");
		assert_eq!(history.create_href("/users"), "/app/users");
		assert!(matches!(history.traverse(-1), Traversal::None));
	}
}
