/*!
# Incremental markup parser

[`SaxParser`] consumes text chunk by chunk and turns it into [`Event`]s.
It is a character-driven state machine: every character is dispatched on
the current [`State`] alone, so a chunk boundary can fall anywhere without
affecting the outcome.

Markup which is not well-formed is dealt with according to the
[`SaxOptions::strict`] flag. A strict parser raises an error for every
violation; a lenient one recovers the way browsers tend to do it and only
raises errors which are fatal regardless of strictness.
*/
mod namespaces;
mod tags;

use std::fmt;

use memchr::{memchr2, memchr_iter, memrchr};
use smartstring::alias::String as SmartString;

use rsax_validation::{
	is_attrib_end, is_entity_body, is_entity_start, is_name_body, is_name_start, is_quote,
	is_whitespace,
};

use crate::buffers::{Accumulators, Buffer, BufferGuard};
use crate::context::Context;
use crate::entities::{resolve_entity, EntityTable};
use crate::error::{Error, ErrorKind, Result, WFError};
use crate::event::{Event, EventSink, ProcessingInstruction, Tag};
use crate::options::{CaseFold, SaxOptions};

pub use namespaces::{NamespaceName, NamespaceScope, RcPtr, XMLNS_XML, XMLNS_XMLNS};

const LOG_TARGET: &'static str = "rsax::parser";

const CDATA_OPEN: &'static str = "[CDATA[";
const DOCTYPE_OPEN: &'static str = "DOCTYPE";

/**
Location of the parser in its input.

`offset` counts characters. `line` counts the newlines seen so far and
`column` the characters since the last one.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
	pub offset: usize,
	pub line: usize,
	pub column: usize,
}

impl Position {
	fn advance(&mut self, c: char) {
		self.offset += 1;
		if c == '\n' {
			self.line += 1;
			self.column = 0;
		} else {
			self.column += 1;
		}
	}

	fn advance_str(&mut self, s: &str) {
		let bytes = s.as_bytes();
		let nchars = s.chars().count();
		self.offset += nchars;
		match memrchr(b'\n', bytes) {
			Some(last) => {
				self.line += memchr_iter(b'\n', bytes).count();
				self.column = s[last + 1..].chars().count();
			}
			None => self.column += nchars,
		}
	}
}

impl fmt::Display for Position {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"line: {}, column: {}, offset: {}",
			self.line, self.column, self.offset
		)
	}
}

/**
Tokenizer state.

States which depend on the quote character in effect carry it along.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Nothing consumed yet; a byte order mark is skipped here.
	Begin,
	/// Leading whitespace before the first tag.
	BeginWhitespace,
	/// Character data.
	Text,
	/// `&` seen in character data.
	TextEntity,
	/// `<` seen.
	OpenWaka,
	/// `<!` seen.
	SgmlDecl,
	SgmlDeclQuoted(char),
	/// `<!DOCTYPE` seen.
	Doctype,
	DoctypeQuoted(char),
	/// Inside the internal subset, with its bracket depth.
	DoctypeDtd(u32),
	DoctypeDtdQuoted(char, u32),
	/// `<!--` seen.
	Comment,
	/// `-` seen in a comment.
	CommentEnding,
	/// `--` seen in a comment.
	CommentEnded,
	/// `<![CDATA[` seen.
	CData,
	/// `]` seen in a CDATA section.
	CDataEnding,
	/// `]]` seen in a CDATA section.
	CDataEnding2,
	/// `<?` seen.
	ProcInst,
	ProcInstBody,
	/// `?` seen in a processing instruction.
	ProcInstEnding,
	/// Reading the name of an opening tag.
	OpenTag,
	/// `/` seen in an opening tag.
	OpenTagSlash,
	/// Between attributes.
	Attrib,
	AttribName,
	AttribNameSawWhite,
	/// `=` seen after an attribute name.
	AttribValue,
	AttribValueQuoted(char),
	AttribValueClosed,
	AttribValueUnquoted,
	AttribValueEntityQuoted(char),
	AttribValueEntityUnquoted,
	/// `</` seen.
	CloseTag,
	CloseTagSawWhite,
	/// Body of a `<script>` element.
	Script,
	/// `<` seen in a script body.
	ScriptEnding,
}

/**
# Streaming SAX parser

The parser owns its [`EventSink`] and emits events into it while chunks
are [written](SaxParser::write). Construction and every reset emit
[`Event::Ready`].

```
use rsax::{Event, EventCollector, SaxOptions, SaxParser};

let mut p = SaxParser::with_options(SaxOptions::default().strict(true), EventCollector::new());
p.write("<greeting who='world'>he").unwrap();
p.write("llo</greeting>").unwrap();
p.end().unwrap();

let texts: Vec<&str> = p.sink().events().iter().filter_map(|ev| match ev {
	Event::Text(t) => Some(t.as_str()),
	_ => None,
}).collect();
assert_eq!(texts, vec!["hello"]);
```
*/
pub struct SaxParser<S: EventSink> {
	sink: S,
	opts: SaxOptions,
	ctx: RcPtr<Context>,
	table: EntityTable,
	fold: Option<CaseFold>,
	state: State,
	acc: Accumulators,
	guard: BufferGuard,
	/// Bytes consumed since the last reset; drives the buffer guard.
	consumed: usize,
	pos: Position,
	ch: Option<char>,
	/// Whitespace skipped after a `<` which may turn out to be literal.
	lt_padding: usize,
	tag: Option<Tag>,
	tags: Vec<Tag>,
	deferred: Vec<(SmartString, String)>,
	root_ns: RcPtr<NamespaceScope>,
	saw_root: bool,
	closed_root: bool,
	seen_doctype: bool,
	/// The current closing tag may still turn out to be script text.
	closing_script: bool,
	error: Option<Error>,
}

impl<S: EventSink> SaxParser<S> {
	/// Create a lenient parser with default options.
	pub fn new(sink: S) -> Self {
		Self::with_options(SaxOptions::default(), sink)
	}

	pub fn with_options(opts: SaxOptions, sink: S) -> Self {
		Self::with_context(opts, RcPtr::new(Context::new()), sink)
	}

	/// Create a parser which interns namespace URIs in a shared context.
	pub fn with_context(opts: SaxOptions, ctx: RcPtr<Context>, sink: S) -> Self {
		let root_ns = NamespaceScope::root(&ctx);
		let mut result = Self {
			sink,
			table: opts.entity_table(),
			fold: opts.name_fold(),
			guard: BufferGuard::new(opts.max_buffer_length),
			opts,
			ctx,
			state: State::Begin,
			acc: Accumulators::default(),
			consumed: 0,
			pos: Position::default(),
			ch: None,
			lt_padding: 0,
			tag: None,
			tags: Vec::new(),
			deferred: Vec::new(),
			root_ns,
			saw_root: false,
			closed_root: false,
			seen_doctype: false,
			closing_script: false,
			error: None,
		};
		result.reset();
		result
	}

	/**
	Return the parser to its initial state.

	Options, the context and the sink are kept; everything else about the
	current document, including a pending error, is forgotten. Emits
	[`Event::Ready`].
	*/
	pub fn reset(&mut self) {
		self.state = State::Begin;
		self.acc.clear();
		self.guard.reset();
		self.consumed = 0;
		self.pos = Position::default();
		self.ch = None;
		self.lt_padding = 0;
		self.tag = None;
		self.tags.clear();
		self.deferred.clear();
		self.saw_root = false;
		self.closed_root = false;
		self.seen_doctype = false;
		self.closing_script = false;
		self.error = None;
		log::debug!(target: LOG_TARGET, "parser reset");
		self.emit(Event::Ready);
	}

	/**
	Consume a chunk of input.

	An empty chunk marks the end of the document and is equivalent to
	[`SaxParser::close`].

	If an error is pending, it is returned and nothing is consumed.
	Otherwise the whole chunk is processed, even if errors are raised on
	the way: each of them is emitted as [`Event::Error`], and the first one
	is stored and returned. Call [`SaxParser::resume`] to continue after an
	error.
	*/
	pub fn write(&mut self, chunk: &str) -> Result<()> {
		if let Some(err) = self.error.as_ref() {
			return Err(err.clone());
		}
		if chunk.is_empty() {
			return self.end();
		}
		let mut rest = chunk;
		while !rest.is_empty() {
			if self.state == State::Text && self.saw_root && !self.closed_root {
				let n = self.text_run(rest);
				if n > 0 {
					rest = &rest[n..];
					continue;
				}
			}
			let mut chars = rest.chars();
			let c = match chars.next() {
				Some(c) => c,
				None => break,
			};
			rest = chars.as_str();
			self.consumed += c.len_utf8();
			self.ch = Some(c);
			if self.opts.position {
				self.pos.advance(c);
			}
			self.step(c);
			if self.guard.due(self.consumed) {
				self.check_buffers();
			}
		}
		match self.error.as_ref() {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}

	/**
	Finish the document.

	Pending text is emitted, followed by [`Event::End`], and the parser is
	[reset](SaxParser::reset). Ending inside an unterminated construct is
	an error in any mode; ending with the root element still open only in
	strict mode. The first such error is returned, but the parser is reset
	either way.
	*/
	pub fn end(&mut self) -> Result<()> {
		self.error = None;
		if self.saw_root && !self.closed_root {
			self.strict_fail(WFError::UnclosedRootTag);
		}
		match self.state {
			State::Begin | State::BeginWhitespace | State::Text => (),
			_ => self.fail(ErrorKind::InvalidEof),
		}
		self.close_text();
		let result = match self.error.take() {
			Some(err) => Err(err),
			None => Ok(()),
		};
		self.emit(Event::End);
		self.reset();
		result
	}

	/// End the document unless an error is pending, which is returned.
	pub fn close(&mut self) -> Result<()> {
		if let Some(err) = self.error.as_ref() {
			return Err(err.clone());
		}
		self.end()
	}

	/**
	Emit buffered character data, CDATA and script contents right away.

	The constructs stay open; further content is emitted as separate
	events.
	*/
	pub fn flush(&mut self) {
		self.close_text();
		if !self.acc.cdata.is_empty() {
			let data = self.acc.take(Buffer::CData);
			self.emit_node(Event::CData(data));
		}
		if !self.acc.script.is_empty() {
			let script = self.acc.take(Buffer::Script);
			self.emit_node(Event::Script(script));
		}
	}

	/// Clear the pending error so that parsing can continue.
	pub fn resume(&mut self) {
		self.error = None;
	}

	/// The pending error, if any.
	pub fn error(&self) -> Option<&Error> {
		self.error.as_ref()
	}

	pub fn state(&self) -> State {
		self.state
	}

	/// Current position, if position tracking is enabled.
	pub fn position(&self) -> Option<Position> {
		if self.opts.position {
			Some(self.pos)
		} else {
			None
		}
	}

	/// Currently open elements, innermost last.
	pub fn tags(&self) -> &[Tag] {
		&self.tags
	}

	pub fn is_strict(&self) -> bool {
		self.opts.strict
	}

	pub fn options(&self) -> &SaxOptions {
		&self.opts
	}

	pub fn context(&self) -> &RcPtr<Context> {
		&self.ctx
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn sink_mut(&mut self) -> &mut S {
		&mut self.sink
	}

	pub fn into_sink(self) -> S {
		self.sink
	}

	#[inline]
	fn emit(&mut self, ev: Event) {
		self.sink.emit(ev)
	}

	/// Emit an event for a markup construct; pending text goes first.
	fn emit_node(&mut self, ev: Event) {
		self.close_text();
		self.sink.emit(ev)
	}

	fn close_text(&mut self) {
		if self.acc.text.is_empty() {
			return;
		}
		let text = self.acc.take(Buffer::Text);
		if let Some(text) = self.text_opts(text) {
			self.emit(Event::Text(text));
		}
	}

	/// Apply trimming and normalization; `None` if nothing is left.
	fn text_opts(&self, mut s: String) -> Option<String> {
		if self.opts.trim {
			let trimmed = s.trim();
			if trimmed.len() != s.len() {
				s = trimmed.to_string();
			}
		}
		if self.opts.normalize {
			s = collapse_whitespace(&s);
		}
		if s.is_empty() {
			None
		} else {
			Some(s)
		}
	}

	fn fail(&mut self, kind: ErrorKind) {
		self.close_text();
		let position = if self.opts.position {
			Some(self.pos)
		} else {
			None
		};
		log::debug!(target: LOG_TARGET, "error at {}: {}", self.pos, kind);
		let err = Error::new(kind, position, self.ch);
		self.emit(Event::Error(err.clone()));
		if self.error.is_none() {
			self.error = Some(err);
		}
	}

	/// Raise an error in strict mode, recover silently otherwise.
	fn strict_fail<E: Into<ErrorKind>>(&mut self, e: E) {
		let kind = e.into();
		if self.opts.strict {
			self.fail(kind);
		} else {
			log::trace!(target: LOG_TARGET, "recovering at {}: {}", self.pos, kind);
		}
	}

	/**
	Fast path for character data inside the root element: append
	everything up to the next `<` or `&`, but do not run past the next
	buffer checkpoint. Returns the number of bytes consumed.
	*/
	fn text_run(&mut self, s: &str) -> usize {
		let stop = memchr2(b'<', b'&', s.as_bytes()).unwrap_or(s.len());
		if stop == 0 {
			return 0;
		}
		let mut end = stop.min(self.guard.budget(self.consumed).max(1));
		while !s.is_char_boundary(end) {
			end += 1;
		}
		let run = &s[..end];
		self.append(Buffer::Text, run);
		self.consumed += end;
		self.ch = run.chars().next_back();
		if self.opts.position {
			self.pos.advance_str(run);
		}
		if self.guard.due(self.consumed) {
			self.check_buffers();
		}
		end
	}

	fn check_buffers(&mut self) {
		for which in self.guard.oversized(&self.acc) {
			self.fail(ErrorKind::BufferOverflow(which));
			self.acc.get_mut(which).clear();
		}
		self.guard.reschedule(self.consumed, &self.acc);
	}

	/**
	Append to an accumulator.

	Text, CDATA and script data never grow past the maximum buffer
	length: whatever does not fit is preceded by emitting what has been
	collected so far. The other accumulators are left to the guard.
	*/
	fn append(&mut self, which: Buffer, mut s: &str) {
		if !which.is_flushable() {
			self.acc.get_mut(which).push_str(s);
			return;
		}
		let max = self.guard.max();
		loop {
			let room = max.saturating_sub(self.acc.get(which).len());
			if s.len() <= room {
				self.acc.get_mut(which).push_str(s);
				return;
			}
			let mut cut = room;
			while !s.is_char_boundary(cut) {
				cut -= 1;
			}
			self.acc.get_mut(which).push_str(&s[..cut]);
			s = &s[cut..];
			self.flush_early(which);
		}
	}

	fn append_char(&mut self, which: Buffer, c: char) {
		let mut buf = [0u8; 4];
		self.append(which, c.encode_utf8(&mut buf));
	}

	fn flush_early(&mut self, which: Buffer) {
		log::debug!(target: LOG_TARGET, "flushing full {} at {}", which, self.pos);
		match which {
			Buffer::CData => {
				let data = self.acc.take(Buffer::CData);
				self.emit_node(Event::CData(data));
			}
			Buffer::Script => {
				let script = self.acc.take(Buffer::Script);
				self.emit_node(Event::Script(script));
			}
			_ => self.close_text(),
		}
	}

	fn step(&mut self, c: char) {
		match self.state {
			State::Begin => {
				self.state = State::BeginWhitespace;
				if c != '\u{feff}' {
					self.lex_begin_whitespace(c);
				}
			}
			State::BeginWhitespace => self.lex_begin_whitespace(c),
			State::Text => self.lex_text(c),
			State::TextEntity
			| State::AttribValueEntityQuoted(_)
			| State::AttribValueEntityUnquoted => self.lex_entity(c),
			State::OpenWaka => self.lex_open_waka(c),
			State::SgmlDecl => self.lex_sgml_decl(c),
			State::SgmlDeclQuoted(q) => {
				self.acc.sgml_decl.push(c);
				if c == q {
					self.state = State::SgmlDecl;
				}
			}
			State::Doctype => self.lex_doctype(c),
			State::DoctypeQuoted(q) => {
				self.acc.doctype.push(c);
				if c == q {
					self.state = State::Doctype;
				}
			}
			State::DoctypeDtd(depth) => self.lex_doctype_dtd(c, depth),
			State::DoctypeDtdQuoted(q, depth) => {
				self.acc.doctype.push(c);
				if c == q {
					self.state = State::DoctypeDtd(depth);
				}
			}
			State::Comment => {
				if c == '-' {
					self.state = State::CommentEnding;
				} else {
					self.acc.comment.push(c);
				}
			}
			State::CommentEnding => {
				if c == '-' {
					self.state = State::CommentEnded;
				} else {
					self.acc.comment.push('-');
					self.acc.comment.push(c);
					self.state = State::Comment;
				}
			}
			State::CommentEnded => self.lex_comment_ended(c),
			State::CData => {
				if c == ']' {
					self.state = State::CDataEnding;
				} else {
					self.append_char(Buffer::CData, c);
				}
			}
			State::CDataEnding => {
				if c == ']' {
					self.state = State::CDataEnding2;
				} else {
					self.append_char(Buffer::CData, ']');
					self.append_char(Buffer::CData, c);
					self.state = State::CData;
				}
			}
			State::CDataEnding2 => self.lex_cdata_ending_2(c),
			State::ProcInst => {
				if c == '?' {
					self.state = State::ProcInstEnding;
				} else if is_whitespace(c) {
					self.state = State::ProcInstBody;
				} else {
					self.acc.proc_inst_name.push(c);
				}
			}
			State::ProcInstBody => {
				if self.acc.proc_inst_body.is_empty() && is_whitespace(c) {
					// leading whitespace is not part of the body
				} else if c == '?' {
					self.state = State::ProcInstEnding;
				} else {
					self.acc.proc_inst_body.push(c);
				}
			}
			State::ProcInstEnding => self.lex_proc_inst_ending(c),
			State::OpenTag => self.lex_open_tag(c),
			State::OpenTagSlash => {
				if c == '>' {
					self.open_tag(true);
					self.close_tag();
				} else {
					self.strict_fail(WFError::SlashNotFollowedByGt);
					self.state = State::Attrib;
					self.lex_attrib(c);
				}
			}
			State::Attrib => self.lex_attrib(c),
			State::AttribName => self.lex_attrib_name(c),
			State::AttribNameSawWhite => self.lex_attrib_name_saw_white(c),
			State::AttribValue => self.lex_attrib_value(c),
			State::AttribValueQuoted(q) => {
				if c == q {
					self.attrib();
					self.state = State::AttribValueClosed;
				} else if c == '&' {
					self.state = State::AttribValueEntityQuoted(q);
				} else {
					self.acc.attrib_value.push(c);
				}
			}
			State::AttribValueClosed => self.lex_attrib_value_closed(c),
			State::AttribValueUnquoted => self.lex_attrib_value_unquoted(c),
			State::CloseTag => self.lex_close_tag(c),
			State::CloseTagSawWhite => {
				if is_whitespace(c) {
					// trailing whitespace is fine
				} else if c == '>' {
					self.close_tag();
				} else {
					self.strict_fail(WFError::InvalidCharsInClosingTag);
				}
			}
			State::Script => self.lex_script(c),
			State::ScriptEnding => {
				if c == '/' {
					self.acc.tag_name.clear();
					self.closing_script = true;
					self.state = State::CloseTag;
				} else if c == '<' {
					self.append_char(Buffer::Script, '<');
				} else {
					self.append_char(Buffer::Script, '<');
					self.append_char(Buffer::Script, c);
					self.state = State::Script;
				}
			}
		}
	}

	fn open_waka(&mut self) {
		self.lt_padding = 0;
		self.state = State::OpenWaka;
	}

	fn lex_begin_whitespace(&mut self, c: char) {
		if c == '<' {
			self.open_waka();
		} else if !is_whitespace(c) {
			self.strict_fail(WFError::NonWhitespaceBeforeFirstTag);
			self.append_char(Buffer::Text, c);
			self.state = State::Text;
		}
	}

	fn lex_text(&mut self, c: char) {
		// after the root element, a lenient parser treats everything as text
		if c == '<' && !(self.saw_root && self.closed_root && !self.opts.strict) {
			self.open_waka();
			return;
		}
		if !is_whitespace(c) && (!self.saw_root || self.closed_root) {
			self.strict_fail(WFError::TextOutsideRoot);
		}
		if c == '&' {
			self.state = State::TextEntity;
		} else {
			self.append_char(Buffer::Text, c);
		}
	}

	fn lex_entity(&mut self, c: char) {
		let (resume, target) = match self.state {
			State::AttribValueEntityQuoted(q) => (State::AttribValueQuoted(q), Buffer::AttribValue),
			State::AttribValueEntityUnquoted => (State::AttribValueUnquoted, Buffer::AttribValue),
			_ => (State::Text, Buffer::Text),
		};
		if c == ';' {
			let name = self.acc.take(Buffer::Entity);
			match resolve_entity(self.table, &name) {
				Ok(ch) => self.append_char(target, ch),
				Err(invalid) => {
					self.strict_fail(WFError::InvalidCharacterEntity);
					self.append(target, &invalid.literal());
				}
			}
			self.state = resume;
			return;
		}
		let valid = if self.acc.entity.is_empty() {
			is_entity_start(c)
		} else {
			is_entity_body(c)
		};
		if valid {
			self.acc.entity.push(c);
			return;
		}
		self.strict_fail(WFError::InvalidEntityNameChar);
		let name = self.acc.take(Buffer::Entity);
		self.append_char(target, '&');
		self.append(target, &name);
		self.state = resume;
		self.step(c);
	}

	fn lex_open_waka(&mut self, c: char) {
		if c == '!' {
			self.acc.sgml_decl.clear();
			self.state = State::SgmlDecl;
		} else if is_whitespace(c) {
			self.lt_padding += 1;
		} else if is_name_start(c) {
			self.acc.tag_name.clear();
			self.acc.tag_name.push(c);
			self.state = State::OpenTag;
		} else if c == '/' {
			self.acc.tag_name.clear();
			self.state = State::CloseTag;
		} else if c == '?' {
			self.acc.proc_inst_name.clear();
			self.acc.proc_inst_body.clear();
			self.state = State::ProcInst;
		} else {
			self.strict_fail(WFError::UnencodedLt);
			self.append_char(Buffer::Text, '<');
			for _ in 0..self.lt_padding {
				self.append_char(Buffer::Text, ' ');
			}
			self.state = State::Text;
			if c == '<' || c == '&' {
				self.lex_text(c);
			} else {
				self.append_char(Buffer::Text, c);
			}
		}
	}

	fn lex_sgml_decl(&mut self, c: char) {
		self.acc.sgml_decl.push(c);
		let decl = self.acc.sgml_decl.as_str();
		if decl.eq_ignore_ascii_case(CDATA_OPEN) {
			self.acc.sgml_decl.clear();
			self.acc.cdata.clear();
			self.emit_node(Event::OpenCData);
			self.state = State::CData;
		} else if decl == "--" {
			self.acc.sgml_decl.clear();
			self.acc.comment.clear();
			self.state = State::Comment;
		} else if decl.eq_ignore_ascii_case(DOCTYPE_OPEN) {
			self.acc.sgml_decl.clear();
			self.acc.doctype.clear();
			self.state = State::Doctype;
			if self.seen_doctype || self.saw_root {
				self.strict_fail(WFError::MisplacedDoctype);
			}
		} else if c == '>' {
			self.acc.sgml_decl.pop();
			let decl = self.acc.take(Buffer::SgmlDecl);
			self.emit_node(Event::SgmlDeclaration(decl));
			self.state = State::Text;
		} else if is_quote(c) {
			self.state = State::SgmlDeclQuoted(c);
		}
	}

	fn lex_doctype(&mut self, c: char) {
		if c == '>' {
			self.state = State::Text;
			let doctype = self.acc.take(Buffer::Doctype);
			self.emit_node(Event::Doctype(doctype));
			self.seen_doctype = true;
			return;
		}
		self.acc.doctype.push(c);
		if c == '[' {
			self.state = State::DoctypeDtd(1);
		} else if is_quote(c) {
			self.state = State::DoctypeQuoted(c);
		}
	}

	fn lex_doctype_dtd(&mut self, c: char, depth: u32) {
		self.acc.doctype.push(c);
		if c == ']' {
			self.state = if depth > 1 {
				State::DoctypeDtd(depth - 1)
			} else {
				State::Doctype
			};
		} else if c == '[' {
			self.state = State::DoctypeDtd(depth.saturating_add(1));
		} else if is_quote(c) {
			self.state = State::DoctypeDtdQuoted(c, depth);
		}
	}

	fn lex_comment_ended(&mut self, c: char) {
		if c == '>' {
			let comment = self.acc.take(Buffer::Comment);
			if let Some(comment) = self.text_opts(comment) {
				self.emit_node(Event::Comment(comment));
			}
			self.state = State::Text;
			return;
		}
		self.strict_fail(WFError::MalformedComment);
		if c == '-' {
			// `--->`: the first dash belongs to the body
			self.acc.comment.push('-');
		} else {
			self.acc.comment.push_str("--");
			self.acc.comment.push(c);
			self.state = State::Comment;
		}
	}

	fn lex_cdata_ending_2(&mut self, c: char) {
		if c == '>' {
			if !self.acc.cdata.is_empty() {
				let data = self.acc.take(Buffer::CData);
				self.emit_node(Event::CData(data));
			}
			self.emit_node(Event::CloseCData);
			self.state = State::Text;
		} else if c == ']' {
			self.append_char(Buffer::CData, ']');
		} else {
			self.append(Buffer::CData, "]]");
			self.append_char(Buffer::CData, c);
			self.state = State::CData;
		}
	}

	fn lex_proc_inst_ending(&mut self, c: char) {
		if c == '>' {
			let pi = ProcessingInstruction {
				name: self.acc.take(Buffer::ProcInstName),
				body: self.acc.take(Buffer::ProcInstBody),
			};
			self.emit_node(Event::ProcessingInstruction(pi));
			self.state = State::Text;
		} else if c == '?' {
			self.acc.proc_inst_body.push('?');
		} else {
			self.acc.proc_inst_body.push('?');
			self.acc.proc_inst_body.push(c);
			self.state = State::ProcInstBody;
		}
	}

	fn lex_open_tag(&mut self, c: char) {
		if is_name_body(c) {
			self.acc.tag_name.push(c);
			return;
		}
		self.new_tag();
		if c == '>' {
			self.open_tag(false);
		} else if c == '/' {
			self.state = State::OpenTagSlash;
		} else {
			if !is_whitespace(c) {
				self.strict_fail(WFError::InvalidTagNameChar);
			}
			self.state = State::Attrib;
		}
	}

	fn start_attrib_name(&mut self, c: char) {
		self.acc.attrib_name.clear();
		self.acc.attrib_name.push(c);
		self.acc.attrib_value.clear();
		self.state = State::AttribName;
	}

	fn lex_attrib(&mut self, c: char) {
		if is_whitespace(c) {
			return;
		}
		if c == '>' {
			self.open_tag(false);
		} else if c == '/' {
			self.state = State::OpenTagSlash;
		} else if is_name_start(c) {
			self.start_attrib_name(c);
		} else {
			self.strict_fail(WFError::InvalidAttributeName);
		}
	}

	fn lex_attrib_name(&mut self, c: char) {
		if c == '=' {
			self.state = State::AttribValue;
		} else if c == '>' {
			// <option selected>
			self.strict_fail(WFError::AttributeWithoutValue);
			self.acc.attrib_value = self.acc.attrib_name.clone();
			self.attrib();
			self.open_tag(false);
		} else if is_whitespace(c) {
			self.state = State::AttribNameSawWhite;
		} else if is_name_body(c) {
			self.acc.attrib_name.push(c);
		} else {
			self.strict_fail(WFError::InvalidAttributeName);
		}
	}

	fn lex_attrib_name_saw_white(&mut self, c: char) {
		if c == '=' {
			self.state = State::AttribValue;
		} else if !is_whitespace(c) {
			self.strict_fail(WFError::AttributeWithoutValue);
			self.acc.attrib_value.clear();
			self.attrib();
			self.state = State::Attrib;
			self.lex_attrib(c);
		}
	}

	fn lex_attrib_value(&mut self, c: char) {
		if is_whitespace(c) {
			return;
		}
		if is_quote(c) {
			self.state = State::AttribValueQuoted(c);
			return;
		}
		self.strict_fail(WFError::UnquotedAttributeValue);
		if !self.opts.strict {
			log::warn!(
				target: LOG_TARGET,
				"unquoted value for attribute {:?} at {}",
				self.acc.attrib_name,
				self.pos
			);
		}
		self.state = State::AttribValueUnquoted;
		self.lex_attrib_value_unquoted(c);
	}

	fn lex_attrib_value_closed(&mut self, c: char) {
		if is_whitespace(c) {
			self.state = State::Attrib;
		} else if c == '>' {
			self.open_tag(false);
		} else if c == '/' {
			self.state = State::OpenTagSlash;
		} else if is_name_start(c) {
			self.strict_fail(WFError::NoWhitespaceBetweenAttributes);
			self.start_attrib_name(c);
		} else {
			self.strict_fail(WFError::InvalidAttributeName);
		}
	}

	fn lex_attrib_value_unquoted(&mut self, c: char) {
		if !is_attrib_end(c) {
			if c == '&' {
				self.state = State::AttribValueEntityUnquoted;
			} else {
				self.acc.attrib_value.push(c);
			}
			return;
		}
		self.attrib();
		if c == '>' {
			self.open_tag(false);
		} else {
			self.state = State::Attrib;
		}
	}

	fn lex_close_tag(&mut self, c: char) {
		if self.acc.tag_name.is_empty() {
			if is_name_start(c) {
				self.acc.tag_name.push(c);
			} else if self.closing_script {
				self.fold_into_script(c);
			} else if c == '>' {
				self.close_tag();
			} else if !is_whitespace(c) {
				self.strict_fail(WFError::InvalidClosingTagName);
			}
		} else if c == '>' {
			self.close_tag();
		} else if is_name_body(c) {
			self.acc.tag_name.push(c);
		} else if self.closing_script {
			if is_whitespace(c) && self.acc.tag_name.eq_ignore_ascii_case("script") {
				self.state = State::CloseTagSawWhite;
			} else {
				self.fold_into_script(c);
			}
		} else {
			if !is_whitespace(c) {
				self.strict_fail(WFError::InvalidClosingTagName);
			}
			self.state = State::CloseTagSawWhite;
		}
	}

	/// Put a `</...` which does not close the script back into its body.
	fn fold_into_script(&mut self, c: char) {
		let name = self.acc.take(Buffer::TagName);
		self.append(Buffer::Script, "</");
		self.append(Buffer::Script, &name);
		self.closing_script = false;
		self.state = State::Script;
		self.lex_script(c);
	}

	fn lex_script(&mut self, c: char) {
		if c == '<' {
			self.state = State::ScriptEnding;
		} else {
			self.append_char(Buffer::Script, c);
		}
	}
}

impl<S: EventSink + fmt::Debug> fmt::Debug for SaxParser<S> {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("SaxParser")
			.field("sink", &self.sink)
			.field("opts", &self.opts)
			.field("state", &self.state)
			.field("pos", &self.pos)
			.field("depth", &self.tags.len())
			.field("error", &self.error)
			.finish()
	}
}

fn collapse_whitespace(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	let mut in_ws = false;
	for c in s.chars() {
		if c.is_whitespace() {
			if !in_ws {
				out.push(' ');
				in_ws = true;
			}
		} else {
			out.push(c);
			in_ws = false;
		}
	}
	out
}
