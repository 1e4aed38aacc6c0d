/*!
# Error types

Errors fall into two classes. Violations of well-formedness
([`WFError`]) and of namespace well-formedness ([`NWFError`]) are only
raised by strict parsers; a lenient parser recovers from them. The
remaining kinds are raised regardless of strictness.
*/
use std::error;
use std::fmt;
use std::result::Result as StdResult;

use smartstring::alias::String as SmartString;

use crate::buffers::Buffer;
use crate::parser::Position;

/// Violation of a well-formedness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum WFError {
	/// Non-whitespace character data before the first tag.
	NonWhitespaceBeforeFirstTag,
	/// Non-whitespace character data outside the root element.
	TextOutsideRoot,
	/// `<` which does not start any markup.
	UnencodedLt,
	/// Doctype after a previous doctype or after the root element.
	MisplacedDoctype,
	/// `--` inside a comment which is not followed by `>`.
	MalformedComment,
	/// Character which cannot be part of a tag name.
	InvalidTagNameChar,
	/// `/` inside an opening tag which is not followed by `>`.
	SlashNotFollowedByGt,
	/// Character which cannot start or continue an attribute name.
	InvalidAttributeName,
	/// Attribute name which is not followed by `=`.
	AttributeWithoutValue,
	/// Attribute value which is not enclosed in quotes.
	UnquotedAttributeValue,
	/// Attribute directly following the closing quote of the previous one.
	NoWhitespaceBetweenAttributes,
	/// Closing tag whose name does not start with a name character.
	InvalidClosingTagName,
	/// Characters other than whitespace after the name of a closing tag.
	InvalidCharsInClosingTag,
	/// `</>`.
	EmptyCloseTag,
	/// Closing tag which implicitly closes open child elements.
	UnexpectedCloseTag,
	/// Closing tag which does not match any open element.
	UnmatchedCloseTag(SmartString),
	/// Character which cannot be part of an entity name.
	InvalidEntityNameChar,
	/// Entity reference which cannot be resolved.
	InvalidCharacterEntity,
	/// End of document while the root element is still open.
	UnclosedRootTag,
}

impl error::Error for WFError {}

impl fmt::Display for WFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::NonWhitespaceBeforeFirstTag => f.write_str("Non-whitespace before first tag."),
			Self::TextOutsideRoot => f.write_str("Text data outside of root node."),
			Self::UnencodedLt => f.write_str("Unencoded <"),
			Self::MisplacedDoctype => f.write_str("Inappropriately located doctype declaration"),
			Self::MalformedComment => f.write_str("Malformed comment"),
			Self::InvalidTagNameChar => f.write_str("Invalid character in tag name"),
			Self::SlashNotFollowedByGt => {
				f.write_str("Forward-slash in opening tag not followed by >")
			}
			Self::InvalidAttributeName => f.write_str("Invalid attribute name"),
			Self::AttributeWithoutValue => f.write_str("Attribute without value"),
			Self::UnquotedAttributeValue => f.write_str("Unquoted attribute value"),
			Self::NoWhitespaceBetweenAttributes => f.write_str("No whitespace between attributes"),
			Self::InvalidClosingTagName => f.write_str("Invalid tagname in closing tag."),
			Self::InvalidCharsInClosingTag => f.write_str("Invalid characters in closing tag"),
			Self::EmptyCloseTag => f.write_str("Weird empty close tag."),
			Self::UnexpectedCloseTag => f.write_str("Unexpected close tag"),
			Self::UnmatchedCloseTag(name) => write!(f, "Unmatched closing tag: {}", name),
			Self::InvalidEntityNameChar => f.write_str("Invalid character in entity name"),
			Self::InvalidCharacterEntity => f.write_str("Invalid character entity"),
			Self::UnclosedRootTag => f.write_str("Unclosed root tag"),
		}
	}
}

/// Violation of a namespace-well-formedness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum NWFError {
	/// Use of a prefix which is not bound in the current scope.
	///
	/// Contains the qualified name as written.
	UnboundNamespacePrefix(SmartString),

	/// Attempt to bind `xml` or `xmlns` to anything but their fixed URIs.
	ReservedNamespacePrefix {
		prefix: &'static str,
		expected: &'static str,
		actual: String,
	},
}

impl error::Error for NWFError {}

impl fmt::Display for NWFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::UnboundNamespacePrefix(name) => {
				write!(f, "Unbound namespace prefix: {:?}", name.as_str())
			}
			Self::ReservedNamespacePrefix {
				prefix,
				expected,
				actual,
			} => write!(
				f,
				"{}: prefix must be bound to {}\nActual: {}",
				prefix, expected, actual
			),
		}
	}
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
	/// Well-formedness violation; only raised in strict mode.
	NotWellFormed(WFError),
	/// Namespace well-formedness violation; only raised in strict mode.
	NotNamespaceWellFormed(NWFError),
	/// The document ended inside a construct which was not terminated.
	InvalidEof,
	/// An accumulator which cannot be flushed early outgrew the maximum
	/// buffer length.
	BufferOverflow(Buffer),
}

impl ErrorKind {
	/// True for the kinds which are raised in lenient mode, too.
	pub fn is_fatal(&self) -> bool {
		match self {
			Self::NotWellFormed(_) | Self::NotNamespaceWellFormed(_) => false,
			Self::InvalidEof | Self::BufferOverflow(_) => true,
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::NotWellFormed(e) => fmt::Display::fmt(e, f),
			Self::NotNamespaceWellFormed(e) => fmt::Display::fmt(e, f),
			Self::InvalidEof => f.write_str("Unexpected end"),
			Self::BufferOverflow(b) => write!(f, "Max buffer length exceeded: {}", b),
		}
	}
}

impl From<WFError> for ErrorKind {
	fn from(other: WFError) -> Self {
		Self::NotWellFormed(other)
	}
}

impl From<NWFError> for ErrorKind {
	fn from(other: NWFError) -> Self {
		Self::NotNamespaceWellFormed(other)
	}
}

/**
An error raised by the parser.

When position tracking is enabled, the error records where in the input
it was raised and which character was being processed.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
	kind: ErrorKind,
	position: Option<Position>,
	ch: Option<char>,
}

impl Error {
	pub(crate) fn new(kind: ErrorKind, position: Option<Position>, ch: Option<char>) -> Self {
		Self { kind, position, ch }
	}

	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	pub fn into_kind(self) -> ErrorKind {
		self.kind
	}

	/// Where the error was raised, if positions are tracked.
	pub fn position(&self) -> Option<Position> {
		self.position
	}

	/// The character being processed when the error was raised.
	pub fn ch(&self) -> Option<char> {
		self.ch
	}

	pub fn is_fatal(&self) -> bool {
		self.kind.is_fatal()
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match &self.kind {
			ErrorKind::NotWellFormed(e) => Some(e),
			ErrorKind::NotNamespaceWellFormed(e) => Some(e),
			_ => None,
		}
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&self.kind, f)?;
		if let Some(pos) = self.position {
			write!(f, "\nLine: {}\nColumn: {}\nChar: ", pos.line, pos.column)?;
			if let Some(ch) = self.ch {
				write!(f, "{}", ch)?;
			}
		}
		Ok(())
	}
}

pub type Result<T> = StdResult<T, Error>;
