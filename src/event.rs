/*!
# Events and event sinks

The parser reports everything it finds by handing [`Event`]s to the
[`EventSink`] it was constructed with. Events are owned; a sink may keep
them around for as long as it likes.
*/
use smartstring::alias::String as SmartString;

use crate::error::Error;
use crate::parser::{NamespaceName, NamespaceScope, RcPtr};

/**
Namespace-qualified form of a tag or attribute name.

Only present when the parser runs in namespace mode.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct QName {
	/// Prefix as written, empty if the name has none.
	pub prefix: SmartString,
	/// Part of the name after the prefix.
	pub local: SmartString,
	/// Namespace URI the prefix resolved to.
	///
	/// `None` for names without namespace. Unbound prefixes resolve to
	/// the prefix itself in lenient mode.
	pub uri: Option<NamespaceName>,
}

/// A single attribute of a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	pub name: SmartString,
	pub value: String,
	pub qname: Option<QName>,
}

/**
An element as seen by the parser.

The tag handed out with [`Event::OpenTagStart`] carries the name only;
[`Event::OpenTag`] carries the complete record.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
	/// Name of the element; case-folded unless the parser is strict.
	pub name: SmartString,
	/// Attributes in document order, without duplicates.
	pub attributes: Vec<Attribute>,
	pub is_self_closing: bool,
	pub qname: Option<QName>,
	pub(crate) ns: Option<RcPtr<NamespaceScope>>,
}

impl Tag {
	pub(crate) fn new(name: SmartString, ns: Option<RcPtr<NamespaceScope>>) -> Self {
		Self {
			name,
			attributes: Vec::new(),
			is_self_closing: false,
			qname: None,
			ns,
		}
	}

	/// Look up an attribute by its (case-folded) name.
	pub fn attribute(&self, name: &str) -> Option<&Attribute> {
		self.attributes.iter().find(|a| a.name == name)
	}

	/// Look up the value of an attribute by its (case-folded) name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.attribute(name).map(|a| a.value.as_str())
	}

	/// Namespace scope in effect for this element, in namespace mode.
	pub fn scope(&self) -> Option<&NamespaceScope> {
		self.ns.as_deref()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingInstruction {
	pub name: String,
	pub body: String,
}

/// A prefix binding which comes into or goes out of scope.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceBinding {
	/// The bound prefix; empty for the default namespace.
	pub prefix: SmartString,
	pub uri: NamespaceName,
}

/// Something the parser found.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	/// The parser has been (re-)initialized.
	Ready,
	/// Character data with entities decoded.
	Text(String),
	/// A `<!...>` declaration which is neither a comment, CDATA section nor
	/// doctype, without the delimiters.
	SgmlDeclaration(String),
	/// Contents of `<!DOCTYPE...>` following the keyword.
	Doctype(String),
	ProcessingInstruction(ProcessingInstruction),
	Comment(String),
	/// The name of a new element has been read; attributes follow.
	OpenTagStart(Tag),
	Attribute(Attribute),
	/// An element has been fully opened.
	OpenTag(Tag),
	/// An element has been closed; carries its name.
	CloseTag(SmartString),
	OpenCData,
	CData(String),
	CloseCData,
	OpenNamespace(NamespaceBinding),
	CloseNamespace(NamespaceBinding),
	/// Body of a `<script>` element in lenient mode.
	Script(String),
	Error(Error),
	/// The document has ended; the parser resets right after.
	End,
}

/**
# Receiver of parser events

Implemented for any `FnMut(Event)`, so a closure will do. For tests and
small documents, [`EventCollector`] simply records everything.
*/
pub trait EventSink {
	fn emit(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
	fn emit(&mut self, event: Event) {
		self(event)
	}
}

/// Sink which stores all events it receives.
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
	events: Vec<Event>,
}

impl EventCollector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Events received so far, in order.
	pub fn events(&self) -> &[Event] {
		&self.events
	}

	/// Take the events received so far.
	pub fn take_events(&mut self) -> Vec<Event> {
		std::mem::take(&mut self.events)
	}

	pub fn into_events(self) -> Vec<Event> {
		self.events
	}
}

impl EventSink for EventCollector {
	fn emit(&mut self, event: Event) {
		self.events.push(event);
	}
}
