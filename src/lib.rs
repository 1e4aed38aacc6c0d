/*!
# Incremental SAX-style markup parsing

This crate parses XML and HTML-ish markup pushed at it in arbitrary
chunks and reports what it finds as a stream of [`Event`]s.

## Features

* Push-based: feed `&str` chunks of any size; the split points never
  change the result
* Strict (XML-ish) and lenient (browser-ish) modes
* Optional namespace resolution with scoped prefix bindings
* HTML character entities in lenient mode
* `<script>` bodies passed through verbatim in lenient mode
* Bounded memory: no accumulator grows beyond a configurable limit

## Example

```
use rsax::{Event, EventCollector, SaxOptions, SaxParser};

let mut parser = SaxParser::with_options(
	SaxOptions::default().strict(true),
	EventCollector::new(),
);
parser.write("<hello who='World'>").unwrap();
parser.write("Hi &amp; bye</hello>").unwrap();
parser.close().unwrap();

let events = parser.into_sink().into_events();
assert!(events.contains(&Event::Text("Hi & bye".to_string())));
assert!(events.contains(&Event::CloseTag("hello".into())));
```

## Handling events

Anything implementing [`EventSink`] can receive events, including
closures:

```
use rsax::{Event, SaxParser};

let mut depth = 0usize;
let mut max_depth = 0usize;
let mut parser = SaxParser::new(|ev: Event| match ev {
	Event::OpenTag(_) => {
		depth += 1;
		max_depth = max_depth.max(depth);
	}
	Event::CloseTag(_) => depth -= 1,
	_ => (),
});
parser.write("<a><b><c/></b></a>").unwrap();
parser.close().unwrap();
drop(parser);
assert_eq!(max_depth, 3);
```

## Errors

Every error is reported as [`Event::Error`] and the first one of a
document is also returned from [`SaxParser::write`]. The parser then
refuses further input until [`SaxParser::resume`] is called.
*/
pub mod buffers;
pub mod context;
pub mod entities;
pub mod error;
pub mod event;
pub mod options;
pub mod parser;

#[doc(inline)]
pub use buffers::Buffer;
#[doc(inline)]
pub use context::Context;
#[doc(inline)]
pub use entities::EntityTable;
#[doc(inline)]
pub use error::{Error, ErrorKind, NWFError, Result, WFError};
#[doc(inline)]
pub use event::{
	Attribute, Event, EventCollector, EventSink, NamespaceBinding, ProcessingInstruction, QName,
	Tag,
};
#[doc(inline)]
pub use options::{CaseFold, SaxOptions};
#[doc(inline)]
pub use parser::{
	NamespaceName, NamespaceScope, Position, RcPtr, SaxParser, State, XMLNS_XML, XMLNS_XMLNS,
};

/**
Parse a complete document and return all events it produced.

The leading and trailing [`Event::Ready`] and the [`Event::End`] are
included, as are any [`Event::Error`]s. The first error, if any, is
returned alongside.

```
use rsax::{parse_str, Event, SaxOptions};

let (events, err) = parse_str(SaxOptions::default(), "<p>x</p>");
assert!(err.is_none());
assert_eq!(events[0], Event::Ready);
```
*/
pub fn parse_str(opts: SaxOptions, doc: &str) -> (Vec<Event>, Option<Error>) {
	let mut parser = SaxParser::with_options(opts, EventCollector::new());
	let mut first = parser.write(doc).err();
	if first.is_some() {
		parser.resume();
	}
	let closed = parser.close().err();
	if first.is_none() {
		first = closed;
	}
	(parser.into_sink().into_events(), first)
}
