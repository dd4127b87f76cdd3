//! Path string helpers.

/// A raw location split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPath {
	/// Path without query or hash.
	pub path: String,
	/// Query text without the leading `?`.
	pub query: String,
	/// Hash including the leading `#`, or empty.
	pub hash: String,
}

/// Splits `path?query#hash`. The hash is cut first, so a `?` after `#`
/// belongs to the hash.
pub fn parse_path(raw: &str) -> ParsedPath {
	let (rest, hash) = match raw.find('#') {
		Some(index) => (&raw[..index], &raw[index..]),
		None => (raw, ""),
	};
	let (path, query) = match rest.find('?') {
		Some(index) => (&rest[..index], &rest[index + 1..]),
		None => (rest, ""),
	};

	ParsedPath {
		path: path.to_string(),
		query: query.to_string(),
		hash: hash.to_string(),
	}
}

/// Resolves `relative` against `base` with `.` and `..` segments.
///
/// The last segment of `base` is dropped unless `append` is set and the base
/// does not end with a slash.
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
	if relative.starts_with('/') {
		return relative.to_string();
	}
	if relative.starts_with('?') || relative.starts_with('#') {
		return format!("{}{}", base, relative);
	}

	let mut stack: Vec<&str> = base.split('/').collect();
	if !append || stack.last().is_some_and(|last| last.is_empty()) {
		stack.pop();
	}

	for segment in relative.split('/') {
		match segment {
			".." => {
				stack.pop();
			}
			"." => {}
			segment => stack.push(segment),
		}
	}

	if stack.first() != Some(&"") {
		stack.insert(0, "");
	}

	stack.join("/")
}

/// Collapses doubled slashes.
pub fn clean_path(path: &str) -> String {
	path.replace("//", "/")
}

/// Normalizes a route path relative to its parent's path.
pub fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
	let path = if strict {
		path
	} else {
		path.strip_suffix('/').unwrap_or(path)
	};
	match parent {
		_ if path.starts_with('/') => path.to_string(),
		None => path.to_string(),
		Some(parent) => clean_path(&format!("{}/{}", parent, path)),
	}
}

/// Reserved characters `decodeURI` leaves encoded.
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

/// Percent-decodes a URI the way `decodeURI` does: escapes of reserved
/// characters stay intact and invalid UTF-8 is replaced.
pub fn decode_uri(raw: &str) -> String {
	let bytes = raw.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut index = 0;

	while index < bytes.len() {
		if bytes[index] == b'%'
			&& let Some(value) = bytes
				.get(index + 1..index + 3)
				.and_then(|hex| std::str::from_utf8(hex).ok())
				.and_then(|hex| u8::from_str_radix(hex, 16).ok())
			&& !URI_RESERVED.contains(&value)
		{
			decoded.push(value);
			index += 3;
			continue;
		}
		decoded.push(bytes[index]);
		index += 1;
	}

	String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/abs", "/a/b", false, "/abs")]
	#[case("c", "/a/b", false, "/a/c")]
	#[case("c", "/a/b", true, "/a/b/c")]
	#[case("c", "/a/b/", true, "/a/b/c")]
	#[case("../c", "/a/b", false, "/c")]
	#[case("./c", "/a/b", false, "/a/c")]
	#[case("..", "/a/b/c", false, "/a")]
	#[case("?x=1", "/a", false, "/a?x=1")]
	#[case("#top", "/a", false, "/a#top")]
	#[case("c", "", false, "/c")]
	fn test_resolve_path(
		#[case] relative: &str,
		#[case] base: &str,
		#[case] append: bool,
		#[case] expected: &str,
	) {
		assert_eq!(resolve_path(relative, base, append), expected);
	}

	#[rstest]
	#[case("/a?b=1#c", "/a", "b=1", "#c")]
	#[case("/a#c?b=1", "/a", "", "#c?b=1")]
	#[case("/a", "/a", "", "")]
	#[case("?q", "", "q", "")]
	fn test_parse_path(#[case] raw: &str, #[case] path: &str, #[case] query: &str, #[case] hash: &str) {
		// Act
		let parsed = parse_path(raw);

		// Assert
		assert_eq!(parsed.path, path);
		assert_eq!(parsed.query, query);
		assert_eq!(parsed.hash, hash);
	}

	#[rstest]
	#[case("child", Some("/parent"), false, "/parent/child")]
	#[case("/abs", Some("/parent"), false, "/abs")]
	#[case("child/", Some("/parent"), false, "/parent/child")]
	#[case("child/", Some("/parent"), true, "/parent/child/")]
	#[case("", Some("/parent"), false, "/parent/")]
	#[case("root", None, false, "root")]
	#[case("/", None, false, "")]
	#[case("child", Some(""), false, "/child")]
	fn test_normalize_path(
		#[case] path: &str,
		#[case] parent: Option<&str>,
		#[case] strict: bool,
		#[case] expected: &str,
	) {
		assert_eq!(normalize_path(path, parent, strict), expected);
	}

	#[rstest]
	#[case("/caf%C3%A9", "/café")]
	#[case("/a%2Fb", "/a%2Fb")]
	#[case("/a%20b", "/a b")]
	#[case("/bad%zz", "/bad%zz")]
	fn test_decode_uri(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(decode_uri(raw), expected);
	}
}
