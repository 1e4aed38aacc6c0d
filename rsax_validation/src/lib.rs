/*!
# Character classes for markup tokenization

This is a supplementary crate for `rsax`. It holds the character
predicates the tokenizer dispatches on.

The name classes follow the XML 1.0 Name production. A colon is a valid
name character; it only gains meaning with namespace processing.
*/
use std::fmt;

pub mod selectors;

use selectors::CharSelector;

/**
Error condition from validating a name.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// The name was empty.
	EmptyName,
	/// An invalid character was encountered.
	///
	/// This variant contains the character as data.
	InvalidChar(char),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::EmptyName => f.write_str("names must not be empty"),
			Self::InvalidChar(c) => write!(f, "character U+{:04x} is not allowed", *c as u32),
		}
	}
}

impl std::error::Error for Error {}

/// Space, tab, carriage return or line feed.
#[inline]
pub fn is_whitespace(c: char) -> bool {
	selectors::CLASS_WHITESPACE.select(c)
}

/// Single or double quote.
#[inline]
pub fn is_quote(c: char) -> bool {
	selectors::CLASS_QUOTE.select(c)
}

/// Terminates an unquoted attribute value.
#[inline]
pub fn is_attrib_end(c: char) -> bool {
	c == '>' || is_whitespace(c)
}

#[inline]
pub fn is_name_start(c: char) -> bool {
	if c.is_ascii() {
		return c.is_ascii_alphabetic() || c == ':' || c == '_';
	}
	selectors::CLASS_NAME_START.select(c)
}

#[inline]
pub fn is_name_body(c: char) -> bool {
	if c.is_ascii() {
		return c.is_ascii_alphanumeric() || c == ':' || c == '_' || c == '-' || c == '.';
	}
	selectors::CLASS_NAME.select(c)
}

#[inline]
pub fn is_entity_start(c: char) -> bool {
	c == '#' || is_name_start(c)
}

#[inline]
pub fn is_entity_body(c: char) -> bool {
	c == '#' || is_name_body(c)
}

/**
Check whether a str is a valid tag or attribute name

# Example

```rust
use rsax_validation::{validate_name, Error};

assert!(validate_name("foobar").is_ok());
assert!(validate_name("foo:bar").is_ok());
assert!(matches!(validate_name("foo bar"), Err(Error::InvalidChar(' '))));
assert!(matches!(validate_name(""), Err(Error::EmptyName)));
```
*/
pub fn validate_name(s: &str) -> Result<(), Error> {
	let mut chars = s.chars();
	match chars.next() {
		None => return Err(Error::EmptyName),
		Some(c) => {
			if !is_name_start(c) {
				return Err(Error::InvalidChar(c));
			}
		}
	}
	for ch in chars {
		if !is_name_body(ch) {
			return Err(Error::InvalidChar(ch));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ascii_fast_paths_agree_with_ranges() {
		for cp in 0x0..0x80u32 {
			let ch = std::char::from_u32(cp).unwrap();
			assert_eq!(is_name_start(ch), selectors::CLASS_NAME_START.select(ch), "U+{:x}", cp);
			assert_eq!(is_name_body(ch), selectors::CLASS_NAME.select(ch), "U+{:x}", cp);
		}
	}

	#[test]
	fn whitespace_is_markup_whitespace_only() {
		assert!(is_whitespace(' '));
		assert!(is_whitespace('\t'));
		assert!(is_whitespace('\r'));
		assert!(is_whitespace('\n'));
		assert!(!is_whitespace('\u{a0}'));
		assert!(!is_whitespace('\u{b}'));
	}

	#[test]
	fn attrib_end_smoketest() {
		assert!(is_attrib_end('>'));
		assert!(is_attrib_end(' '));
		assert!(!is_attrib_end('/'));
		assert!(!is_attrib_end('"'));
	}

	#[test]
	fn name_classes_smoketest() {
		assert!(is_name_start('x'));
		assert!(is_name_start('\u{e9}'));
		assert!(!is_name_start('1'));
		assert!(!is_name_start('-'));
		assert!(is_name_body('1'));
		assert!(is_name_body('-'));
		assert!(is_name_body('\u{b7}'));
		assert!(!is_name_body('\u{d7}'));
		assert!(!is_name_body('/'));
	}

	#[test]
	fn entity_classes_smoketest() {
		assert!(is_entity_start('#'));
		assert!(is_entity_start('a'));
		assert!(!is_entity_start('1'));
		assert!(is_entity_body('1'));
		assert!(!is_entity_body(';'));
	}

	#[test]
	fn test_name_smoketest() {
		assert!(validate_name("foobar").is_ok());
		assert!(validate_name("foo:bar").is_ok());
		assert!(validate_name("").is_err());
		assert!(validate_name("1foo").is_err());
		assert!(validate_name("foo bar").is_err());
	}
}
