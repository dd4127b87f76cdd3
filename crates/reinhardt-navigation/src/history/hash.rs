use std::fmt;
use std::sync::Arc;

use super::browser::location_of;
use super::{ChangeListener, HistoryBackend, HistoryMode, Traversal, UrlBar, join_base, normalize_base};
use crate::path::{clean_path, decode_uri};
use crate::route::Route;

/// History kept in the URL fragment as `#/path`.
pub struct HashHistory {
	bar: Arc<dyn UrlBar>,
	base: String,
}

impl HashHistory {
	/// Creates a backend over `bar` and makes sure the fragment starts with
	/// a slash.
	///
	/// With `fallback` set, a path-style URL is first rewritten into its
	/// fragment form, for browsers without `pushState`.
	pub fn new(bar: Arc<dyn UrlBar>, base: &str, fallback: bool) -> Self {
		let history = Self {
			bar,
			base: normalize_base(base),
		};
		if fallback {
			let location = location_of(history.bar.as_ref(), &history.base);
			if !location.starts_with("/#") {
				history
					.bar
					.replace(&clean_path(&format!("{}/#{}", history.base, location)));
				return history;
			}
		}
		history.ensure_slash();
		history
	}

	/// Decoded fragment without `#`.
	fn hash_path(&self) -> String {
		let href = self.bar.href();
		match href.find('#') {
			Some(index) => decode_uri(&href[index + 1..]),
			None => String::new(),
		}
	}

	fn url_for(&self, path: &str) -> String {
		let href = self.bar.href();
		let base = match href.find('#') {
			Some(index) => &href[..index],
			None => href.as_str(),
		};
		format!("{}#{}", base, path)
	}

	fn push_hash(&self, path: &str) {
		self.bar.push(&self.url_for(path));
	}

	fn replace_hash(&self, path: &str) {
		self.bar.replace(&self.url_for(path));
	}

	/// Returns `false` after rewriting a fragment that lacked its leading
	/// slash.
	fn ensure_slash(&self) -> bool {
		let path = self.hash_path();
		if path.starts_with('/') {
			return true;
		}
		self.replace_hash(&format!("/{}", path));
		false
	}
}

impl HistoryBackend for HashHistory {
	fn mode(&self) -> HistoryMode {
		HistoryMode::Hash
	}

	fn base(&self) -> &str {
		&self.base
	}

	fn read_location(&self) -> String {
		self.hash_path()
	}

	fn persist(&self, route: &Arc<Route>, replace: bool) {
		if replace {
			self.replace_hash(route.full_path());
		} else {
			self.push_hash(route.full_path());
		}
	}

	fn ensure_synced(&self, current: &Route, push: bool) {
		if self.hash_path() != current.full_path() {
			if push {
				self.push_hash(current.full_path());
			} else {
				self.replace_hash(current.full_path());
			}
		}
	}

	fn traverse(&self, delta: isize) -> Traversal {
		self.bar.go(delta);
		Traversal::Delegated
	}

	fn create_href(&self, full_path: &str) -> String {
		join_base(&self.base, &format!("#{}", full_path))
	}

	fn external_location(&self, _current: &Arc<Route>) -> Option<String> {
		if !self.ensure_slash() {
			return None;
		}
		Some(self.hash_path())
	}

	fn listen(&self, listener: ChangeListener) {
		self.bar.on_change(listener);
	}
}

impl fmt::Debug for HashHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HashHistory")
			.field("base", &self.base)
			.field("fragment", &self.hash_path())
			.finish()
	}
}
