/*!
# Accumulators and the buffer length guard

The parser collects the text of every construct it is inside of in one of a
fixed set of accumulators. To keep memory bounded on hostile or simply huge
input, none of them may grow beyond a maximum length.

Text, CDATA and script data are emitted in pieces by the parser before they
would outgrow it. The lengths of the other accumulators are checked whenever
the amount of consumed input crosses a checkpoint. The checkpoint is placed
at the earliest point at which any of them could possibly exceed the
maximum, so the check is amortized over many characters.

Lengths and the maximum are measured in UTF-8 bytes.
*/
use std::fmt;

/// Smallest maximum buffer length a parser accepts.
pub const MIN_BUFFER_LENGTH: usize = 10;

/// Maximum buffer length used unless configured otherwise.
pub const DEFAULT_MAX_BUFFER_LENGTH: usize = 64 * 1024;

/// Identifies one accumulator of the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Buffer {
	Comment,
	SgmlDecl,
	Text,
	TagName,
	Doctype,
	ProcInstName,
	ProcInstBody,
	Entity,
	AttribName,
	AttribValue,
	CData,
	Script,
}

impl Buffer {
	pub const ALL: [Buffer; 12] = [
		Buffer::Comment,
		Buffer::SgmlDecl,
		Buffer::Text,
		Buffer::TagName,
		Buffer::Doctype,
		Buffer::ProcInstName,
		Buffer::ProcInstBody,
		Buffer::Entity,
		Buffer::AttribName,
		Buffer::AttribValue,
		Buffer::CData,
		Buffer::Script,
	];

	/// Whether the contents may be emitted early instead of failing.
	///
	/// Character data, CDATA sections and script bodies may legitimately
	/// be arbitrarily long; every other accumulator holds a single token.
	pub fn is_flushable(&self) -> bool {
		matches!(self, Self::Text | Self::CData | Self::Script)
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::Comment => "comment",
			Self::SgmlDecl => "sgmlDecl",
			Self::Text => "textNode",
			Self::TagName => "tagName",
			Self::Doctype => "doctype",
			Self::ProcInstName => "procInstName",
			Self::ProcInstBody => "procInstBody",
			Self::Entity => "entity",
			Self::AttribName => "attribName",
			Self::AttribValue => "attribValue",
			Self::CData => "cdata",
			Self::Script => "script",
		}
	}
}

impl fmt::Display for Buffer {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// The parser's accumulators, addressable by [`Buffer`].
#[derive(Debug, Default, Clone)]
pub(crate) struct Accumulators {
	pub(crate) comment: String,
	pub(crate) sgml_decl: String,
	pub(crate) text: String,
	pub(crate) tag_name: String,
	pub(crate) doctype: String,
	pub(crate) proc_inst_name: String,
	pub(crate) proc_inst_body: String,
	pub(crate) entity: String,
	pub(crate) attrib_name: String,
	pub(crate) attrib_value: String,
	pub(crate) cdata: String,
	pub(crate) script: String,
}

impl Accumulators {
	pub(crate) fn get(&self, which: Buffer) -> &String {
		match which {
			Buffer::Comment => &self.comment,
			Buffer::SgmlDecl => &self.sgml_decl,
			Buffer::Text => &self.text,
			Buffer::TagName => &self.tag_name,
			Buffer::Doctype => &self.doctype,
			Buffer::ProcInstName => &self.proc_inst_name,
			Buffer::ProcInstBody => &self.proc_inst_body,
			Buffer::Entity => &self.entity,
			Buffer::AttribName => &self.attrib_name,
			Buffer::AttribValue => &self.attrib_value,
			Buffer::CData => &self.cdata,
			Buffer::Script => &self.script,
		}
	}

	pub(crate) fn get_mut(&mut self, which: Buffer) -> &mut String {
		match which {
			Buffer::Comment => &mut self.comment,
			Buffer::SgmlDecl => &mut self.sgml_decl,
			Buffer::Text => &mut self.text,
			Buffer::TagName => &mut self.tag_name,
			Buffer::Doctype => &mut self.doctype,
			Buffer::ProcInstName => &mut self.proc_inst_name,
			Buffer::ProcInstBody => &mut self.proc_inst_body,
			Buffer::Entity => &mut self.entity,
			Buffer::AttribName => &mut self.attrib_name,
			Buffer::AttribValue => &mut self.attrib_value,
			Buffer::CData => &mut self.cdata,
			Buffer::Script => &mut self.script,
		}
	}

	/// Take the contents of an accumulator, leaving it empty.
	pub(crate) fn take(&mut self, which: Buffer) -> String {
		std::mem::take(self.get_mut(which))
	}

	pub(crate) fn clear(&mut self) {
		for which in Buffer::ALL.iter() {
			self.get_mut(*which).clear();
		}
	}

	/// Length of the longest accumulator which cannot be flushed.
	pub(crate) fn longest(&self) -> usize {
		Buffer::ALL
			.iter()
			.filter(|which| !which.is_flushable())
			.map(|which| self.get(*which).len())
			.max()
			.unwrap_or(0)
	}
}

/// Decides when accumulator lengths need to be looked at.
#[derive(Debug, Clone)]
pub(crate) struct BufferGuard {
	max: usize,
	next_check: usize,
}

impl BufferGuard {
	pub(crate) fn new(max: usize) -> Self {
		let max = max.max(MIN_BUFFER_LENGTH);
		Self {
			max,
			next_check: max,
		}
	}

	pub(crate) fn max(&self) -> usize {
		self.max
	}

	pub(crate) fn reset(&mut self) {
		self.next_check = self.max;
	}

	/// Whether a check is due after `consumed` bytes of input.
	#[inline]
	pub(crate) fn due(&self, consumed: usize) -> bool {
		consumed >= self.next_check
	}

	/// Number of bytes which can be consumed before the next check.
	#[inline]
	pub(crate) fn budget(&self, consumed: usize) -> usize {
		self.next_check.saturating_sub(consumed)
	}

	/// Non-flushable accumulators longer than the maximum.
	pub(crate) fn oversized(&self, acc: &Accumulators) -> Vec<Buffer> {
		Buffer::ALL
			.iter()
			.copied()
			.filter(|which| !which.is_flushable() && acc.get(*which).len() > self.max)
			.collect()
	}

	/// Schedule the next check at the earliest point where any accumulator
	/// could outgrow the maximum.
	pub(crate) fn reschedule(&mut self, consumed: usize, acc: &Accumulators) {
		self.next_check = consumed + self.max.saturating_sub(acc.longest());
	}
}
