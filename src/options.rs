/*!
# Parser configuration
*/
use crate::buffers::DEFAULT_MAX_BUFFER_LENGTH;
use crate::entities::EntityTable;

/**
Case policy for tag and attribute names of lenient parsers.

Strict parsers never fold names.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFold {
	Upper,
	Lower,
}

impl CaseFold {
	pub fn apply(&self, s: &str) -> String {
		match self {
			Self::Upper => s.to_uppercase(),
			Self::Lower => s.to_lowercase(),
		}
	}
}

impl Default for CaseFold {
	fn default() -> Self {
		Self::Upper
	}
}

/**
Options for a [`SaxParser`](crate::SaxParser).

Use the builder methods on top of the default:

```
use rsax::SaxOptions;

let opts = SaxOptions::default().strict(true).xmlns(true).trim(true);
assert!(opts.strict);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct SaxOptions {
	/// Fail on any well-formedness violation instead of recovering.
	pub strict: bool,

	/// Strip leading and trailing whitespace from text and comments.
	pub trim: bool,

	/// Collapse whitespace runs in text and comments into a single space.
	pub normalize: bool,

	/// Direction in which lenient parsers fold names.
	pub case_fold: CaseFold,

	/// Resolve namespace prefixes and emit namespace events.
	pub xmlns: bool,

	/// Parse `<script>` bodies like any other element content.
	///
	/// Strict parsers always behave as if this were set.
	pub noscript: bool,

	/// Track line, column and offset for diagnostics.
	pub position: bool,

	/// Only decode the five entities predefined by XML.
	pub strict_entities: bool,

	/// Maximum length (in bytes) of any accumulator before it is flushed
	/// or rejected.
	///
	/// Values smaller than [`MIN_BUFFER_LENGTH`](crate::buffers::MIN_BUFFER_LENGTH)
	/// are raised to it.
	pub max_buffer_length: usize,
}

impl SaxOptions {
	pub fn strict(mut self, v: bool) -> Self {
		self.strict = v;
		self
	}

	pub fn trim(mut self, v: bool) -> Self {
		self.trim = v;
		self
	}

	pub fn normalize(mut self, v: bool) -> Self {
		self.normalize = v;
		self
	}

	/// Fold names to lowercase instead of uppercase in lenient mode.
	pub fn lowercase(mut self, v: bool) -> Self {
		self.case_fold = if v { CaseFold::Lower } else { CaseFold::Upper };
		self
	}

	/// Alias of [`SaxOptions::lowercase`].
	pub fn lowercasetags(self, v: bool) -> Self {
		self.lowercase(v)
	}

	pub fn xmlns(mut self, v: bool) -> Self {
		self.xmlns = v;
		self
	}

	pub fn noscript(mut self, v: bool) -> Self {
		self.noscript = v;
		self
	}

	pub fn position(mut self, v: bool) -> Self {
		self.position = v;
		self
	}

	pub fn strict_entities(mut self, v: bool) -> Self {
		self.strict_entities = v;
		self
	}

	pub fn max_buffer_length(mut self, v: usize) -> Self {
		self.max_buffer_length = v;
		self
	}

	pub(crate) fn entity_table(&self) -> EntityTable {
		if self.strict_entities {
			EntityTable::Xml
		} else {
			EntityTable::Html
		}
	}

	/// Folding applied to names, if any.
	pub(crate) fn name_fold(&self) -> Option<CaseFold> {
		if self.strict {
			None
		} else {
			Some(self.case_fold)
		}
	}

	pub(crate) fn script_enabled(&self) -> bool {
		!self.strict && !self.noscript
	}
}

impl Default for SaxOptions {
	fn default() -> Self {
		Self {
			strict: false,
			trim: false,
			normalize: false,
			case_fold: CaseFold::Upper,
			xmlns: false,
			noscript: false,
			position: true,
			strict_entities: false,
			max_buffer_length: DEFAULT_MAX_BUFFER_LENGTH,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let opts = SaxOptions::default();
		assert!(!opts.strict);
		assert!(opts.position);
		assert_eq!(opts.case_fold, CaseFold::Upper);
		assert_eq!(opts.max_buffer_length, 64 * 1024);
		assert_eq!(opts.entity_table(), EntityTable::Html);
	}

	#[test]
	fn lowercasetags_is_an_alias() {
		assert_eq!(SaxOptions::default().lowercasetags(true).case_fold, CaseFold::Lower);
		assert_eq!(
			SaxOptions::default().lowercase(true).lowercasetags(false).case_fold,
			CaseFold::Upper
		);
	}

	#[test]
	fn strict_disables_folding_and_scripts() {
		let opts = SaxOptions::default().strict(true);
		assert_eq!(opts.name_fold(), None);
		assert!(!opts.script_enabled());
		assert!(SaxOptions::default().script_enabled());
		assert!(!SaxOptions::default().noscript(true).script_enabled());
	}

	#[test]
	fn case_fold_apply() {
		assert_eq!(CaseFold::Upper.apply("svg:Path"), "SVG:PATH");
		assert_eq!(CaseFold::Lower.apply("DIV"), "div");
	}
}
