//! Segment encoding used when filling templates.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped in a regular segment: everything `encodeURI` escapes,
/// plus `/`, `?` and `#`.
const PRETTY: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')')
	.remove(b';')
	.remove(b':')
	.remove(b'@')
	.remove(b'&')
	.remove(b'=')
	.remove(b'+')
	.remove(b'$')
	.remove(b',');

/// Wildcard values keep their slashes.
const ASTERISK: &AsciiSet = &PRETTY.remove(b'/');

/// Encodes a parameter value for a regular key.
pub fn encode_pretty(value: &str) -> String {
	utf8_percent_encode(value, PRETTY).to_string()
}

/// Encodes a parameter value for a `*` wildcard key.
pub fn encode_asterisk(value: &str) -> String {
	utf8_percent_encode(value, ASTERISK).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("plain", "plain")]
	#[case("a b", "a%20b")]
	#[case("a/b", "a%2Fb")]
	#[case("a?b#c", "a%3Fb%23c")]
	#[case("k=v&x", "k=v&x")]
	#[case("caf\u{e9}", "caf%C3%A9")]
	fn test_encode_pretty(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(encode_pretty(input), expected);
	}

	#[rstest]
	#[case("/not/found", "/not/found")]
	#[case("/a?b", "/a%3Fb")]
	fn test_encode_asterisk(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(encode_asterisk(input), expected);
	}
}
