use std::fmt;
use std::sync::Arc;

use super::{ChangeListener, HistoryBackend, HistoryMode, Traversal, UrlBar, join_base, normalize_base};
use crate::path::{clean_path, decode_uri};
use crate::route::Route;

/// Path-based history through `pushState`.
pub struct BrowserHistory {
	bar: Arc<dyn UrlBar>,
	base: String,
	initial: String,
}

impl BrowserHistory {
	/// Creates a backend over `bar`. URLs are prefixed with `base`.
	pub fn new(bar: Arc<dyn UrlBar>, base: &str) -> Self {
		let base = normalize_base(base);
		let initial = location_of(bar.as_ref(), &base);
		Self { bar, base, initial }
	}
}

/// Decoded pathname without `base`, plus search and hash.
pub(super) fn location_of(bar: &dyn UrlBar, base: &str) -> String {
	let pathname = decode_uri(&bar.pathname());
	let path = match pathname.strip_prefix(base) {
		Some(rest) if !base.is_empty() => rest,
		_ => pathname.as_str(),
	};
	let path = if path.is_empty() { "/" } else { path };
	format!("{}{}{}", path, bar.search(), bar.hash())
}

impl HistoryBackend for BrowserHistory {
	fn mode(&self) -> HistoryMode {
		HistoryMode::History
	}

	fn base(&self) -> &str {
		&self.base
	}

	fn read_location(&self) -> String {
		location_of(self.bar.as_ref(), &self.base)
	}

	fn persist(&self, route: &Arc<Route>, replace: bool) {
		let url = clean_path(&format!("{}{}", self.base, route.full_path()));
		if replace {
			self.bar.replace(&url);
		} else {
			self.bar.push(&url);
		}
	}

	fn ensure_synced(&self, current: &Route, push: bool) {
		if self.read_location() != current.full_path() {
			let url = clean_path(&format!("{}{}", self.base, current.full_path()));
			if push {
				self.bar.push(&url);
			} else {
				self.bar.replace(&url);
			}
		}
	}

	fn traverse(&self, delta: isize) -> Traversal {
		self.bar.go(delta);
		Traversal::Delegated
	}

	fn create_href(&self, full_path: &str) -> String {
		join_base(&self.base, full_path)
	}

	fn external_location(&self, current: &Arc<Route>) -> Option<String> {
		let location = self.read_location();
		// Some browsers fire a popstate on load before the first route commits
		if Route::is_start(current) && location == self.initial {
			return None;
		}
		Some(location)
	}

	fn listen(&self, listener: ChangeListener) {
		self.bar.on_change(listener);
	}
}

impl fmt::Debug for BrowserHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserHistory")
			.field("base", &self.base)
			.field("initial", &self.initial)
			.finish()
	}
}
