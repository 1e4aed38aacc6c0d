/*!
# Codepoint range tables

Sorted, disjoint tables of the character classes used by the tokenizer.
Lookups stop at the first range which starts past the char in question.
*/

/// Predicate over chars.
pub trait CharSelector {
	fn select(&self, c: char) -> bool;
}

/// Inclusive range of codepoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodepointRange(pub char, pub char);

const WHITESPACE_RANGES: &'static [CodepointRange] = &[
	CodepointRange('\t', '\n'),
	CodepointRange('\r', '\r'),
	CodepointRange(' ', ' '),
];

const QUOTE_RANGES: &'static [CodepointRange] = &[
	CodepointRange('"', '"'),
	CodepointRange('\'', '\''),
];

const NAME_START_RANGES: &'static [CodepointRange] = &[
	CodepointRange(':', ':'),
	CodepointRange('A', 'Z'),
	CodepointRange('_', '_'),
	CodepointRange('a', 'z'),
	CodepointRange('\u{c0}', '\u{d6}'),
	CodepointRange('\u{d8}', '\u{f6}'),
	CodepointRange('\u{f8}', '\u{2ff}'),
	CodepointRange('\u{370}', '\u{37d}'),
	CodepointRange('\u{37f}', '\u{1fff}'),
	CodepointRange('\u{200c}', '\u{200d}'),
	CodepointRange('\u{2070}', '\u{218f}'),
	CodepointRange('\u{2c00}', '\u{2fef}'),
	CodepointRange('\u{3001}', '\u{d7ff}'),
	CodepointRange('\u{f900}', '\u{fdcf}'),
	CodepointRange('\u{fdf0}', '\u{fffd}'),
	CodepointRange('\u{10000}', '\u{effff}'),
];

const NAME_RANGES: &'static [CodepointRange] = &[
	CodepointRange('-', '.'),
	CodepointRange('0', ':'),
	CodepointRange('A', 'Z'),
	CodepointRange('_', '_'),
	CodepointRange('a', 'z'),
	CodepointRange('\u{b7}', '\u{b7}'),
	CodepointRange('\u{c0}', '\u{d6}'),
	CodepointRange('\u{d8}', '\u{f6}'),
	CodepointRange('\u{f8}', '\u{2ff}'),
	CodepointRange('\u{300}', '\u{36f}'),
	CodepointRange('\u{370}', '\u{37d}'),
	CodepointRange('\u{37f}', '\u{1fff}'),
	CodepointRange('\u{200c}', '\u{200d}'),
	CodepointRange('\u{203f}', '\u{2040}'),
	CodepointRange('\u{2070}', '\u{218f}'),
	CodepointRange('\u{2c00}', '\u{2fef}'),
	CodepointRange('\u{3001}', '\u{d7ff}'),
	CodepointRange('\u{f900}', '\u{fdcf}'),
	CodepointRange('\u{fdf0}', '\u{fffd}'),
	CodepointRange('\u{10000}', '\u{effff}'),
];

// entity names additionally admit '#' for numeric references
const ENTITY_START_RANGES: &'static [CodepointRange] = &[
	CodepointRange('#', '#'),
	CodepointRange(':', ':'),
	CodepointRange('A', 'Z'),
	CodepointRange('_', '_'),
	CodepointRange('a', 'z'),
	CodepointRange('\u{c0}', '\u{d6}'),
	CodepointRange('\u{d8}', '\u{f6}'),
	CodepointRange('\u{f8}', '\u{2ff}'),
	CodepointRange('\u{370}', '\u{37d}'),
	CodepointRange('\u{37f}', '\u{1fff}'),
	CodepointRange('\u{200c}', '\u{200d}'),
	CodepointRange('\u{2070}', '\u{218f}'),
	CodepointRange('\u{2c00}', '\u{2fef}'),
	CodepointRange('\u{3001}', '\u{d7ff}'),
	CodepointRange('\u{f900}', '\u{fdcf}'),
	CodepointRange('\u{fdf0}', '\u{fffd}'),
	CodepointRange('\u{10000}', '\u{effff}'),
];

const ENTITY_RANGES: &'static [CodepointRange] = &[
	CodepointRange('#', '#'),
	CodepointRange('-', '.'),
	CodepointRange('0', ':'),
	CodepointRange('A', 'Z'),
	CodepointRange('_', '_'),
	CodepointRange('a', 'z'),
	CodepointRange('\u{b7}', '\u{b7}'),
	CodepointRange('\u{c0}', '\u{d6}'),
	CodepointRange('\u{d8}', '\u{f6}'),
	CodepointRange('\u{f8}', '\u{2ff}'),
	CodepointRange('\u{300}', '\u{36f}'),
	CodepointRange('\u{370}', '\u{37d}'),
	CodepointRange('\u{37f}', '\u{1fff}'),
	CodepointRange('\u{200c}', '\u{200d}'),
	CodepointRange('\u{203f}', '\u{2040}'),
	CodepointRange('\u{2070}', '\u{218f}'),
	CodepointRange('\u{2c00}', '\u{2fef}'),
	CodepointRange('\u{3001}', '\u{d7ff}'),
	CodepointRange('\u{f900}', '\u{fdcf}'),
	CodepointRange('\u{fdf0}', '\u{fffd}'),
	CodepointRange('\u{10000}', '\u{effff}'),
];

impl CodepointRange {
	pub fn contains(&self, c: char) -> bool {
		(self.0 <= c) && (c <= self.1)
	}
}

/// A character class made up of sorted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodepointRanges(pub &'static [CodepointRange]);

/// Whitespace as far as markup is concerned: space, tab, CR and LF
pub static CLASS_WHITESPACE: CodepointRanges = CodepointRanges(WHITESPACE_RANGES);

/// Attribute value delimiters
pub static CLASS_QUOTE: CodepointRanges = CodepointRanges(QUOTE_RANGES);

/// Valid first characters of tag and attribute names
pub static CLASS_NAME_START: CodepointRanges = CodepointRanges(NAME_START_RANGES);

/// Valid non-first characters of tag and attribute names
pub static CLASS_NAME: CodepointRanges = CodepointRanges(NAME_RANGES);

/// Valid first characters of an entity reference name
pub static CLASS_ENTITY_START: CodepointRanges = CodepointRanges(ENTITY_START_RANGES);

/// Valid non-first characters of an entity reference name
pub static CLASS_ENTITY: CodepointRanges = CodepointRanges(ENTITY_RANGES);

impl CharSelector for CodepointRanges {
	fn select(&self, c: char) -> bool {
		contained_in_ranges(c, self.0)
	}
}

pub fn contained_in_ranges(c: char, rs: &[CodepointRange]) -> bool {
	for r in rs {
		if c < r.0 {
			return false;
		}
		if r.contains(c) {
			return true;
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_sorted(name: &str, rs: &[CodepointRange]) {
		for pair in rs.windows(2) {
			if pair[0].1 >= pair[1].0 {
				panic!("{} is not sorted at U+{:x}", name, pair[1].0 as u32);
			}
		}
	}

	#[test]
	fn ranges_are_sorted_and_disjoint() {
		assert_sorted("WHITESPACE_RANGES", WHITESPACE_RANGES);
		assert_sorted("QUOTE_RANGES", QUOTE_RANGES);
		assert_sorted("NAME_START_RANGES", NAME_START_RANGES);
		assert_sorted("NAME_RANGES", NAME_RANGES);
		assert_sorted("ENTITY_START_RANGES", ENTITY_START_RANGES);
		assert_sorted("ENTITY_RANGES", ENTITY_RANGES);
	}

	#[test]
	fn name_start_is_subset_of_name() {
		for cp in 0x0..=0x10ffffu32 {
			if let Some(ch) = std::char::from_u32(cp) {
				if CLASS_NAME_START.select(ch) && !CLASS_NAME.select(ch) {
					panic!("U+{:x} may start a name but not continue it", cp)
				}
			}
		}
	}

	#[test]
	fn entity_classes_extend_name_classes_by_hash() {
		for cp in 0x0..=0x10ffffu32 {
			if let Some(ch) = std::char::from_u32(cp) {
				let hash = ch == '#';
				if CLASS_ENTITY_START.select(ch) != (hash || CLASS_NAME_START.select(ch)) {
					panic!("CLASS_ENTITY_START disagrees with CLASS_NAME_START about U+{:x}", cp)
				}
				if CLASS_ENTITY.select(ch) != (hash || CLASS_NAME.select(ch)) {
					panic!("CLASS_ENTITY disagrees with CLASS_NAME about U+{:x}", cp)
				}
			}
		}
	}
}
