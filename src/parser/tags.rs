/*!
# Element bookkeeping

Opening, attributing and closing tags, including namespace resolution.

In namespace mode, attributes are held back until the opening tag is
complete: an `xmlns:p` declaration applies to every attribute of its
element, including the ones written before it.
*/
use smartstring::alias::String as SmartString;

use crate::buffers::Buffer;
use crate::error::{NWFError, WFError};
use crate::event::{Attribute, Event, EventSink, NamespaceBinding, QName, Tag};

use super::namespaces::{split_qname, NamespaceScope, RcPtr, XMLNS_XML, XMLNS_XMLNS};
use super::{SaxParser, State, LOG_TARGET};

impl<S: EventSink> SaxParser<S> {
	/// Scope of the innermost open element, or the root scope.
	fn parent_scope(&self) -> RcPtr<NamespaceScope> {
		self.tags
			.last()
			.and_then(|tag| tag.ns.clone())
			.unwrap_or_else(|| self.root_ns.clone())
	}

	/// The tag name is complete; start a new element.
	pub(super) fn new_tag(&mut self) {
		if let Some(fold) = self.fold {
			self.acc.tag_name = fold.apply(&self.acc.tag_name);
		}
		let ns = if self.opts.xmlns {
			Some(self.parent_scope())
		} else {
			None
		};
		let tag = Tag::new(self.acc.tag_name.as_str().into(), ns);
		self.deferred.clear();
		self.emit_node(Event::OpenTagStart(tag.clone()));
		self.tag = Some(tag);
	}

	/// An attribute name and value are complete.
	pub(super) fn attrib(&mut self) {
		if let Some(fold) = self.fold {
			self.acc.attrib_name = fold.apply(&self.acc.attrib_name);
		}
		let name: SmartString = self.acc.take(Buffer::AttribName).as_str().into();
		let value = self.acc.take(Buffer::AttribValue);
		let tag = match self.tag.as_mut() {
			Some(tag) => tag,
			None => return,
		};

		// first occurrence wins
		if tag.attribute(&name).is_some() || self.deferred.iter().any(|(n, _)| *n == name) {
			log::trace!(target: LOG_TARGET, "dropping duplicate attribute {:?}", name);
			return;
		}

		if !self.opts.xmlns {
			let attr = Attribute {
				name,
				value,
				qname: None,
			};
			tag.attributes.push(attr.clone());
			self.emit_node(Event::Attribute(attr));
			return;
		}

		let (prefix, local) = split_qname(&name, true);
		if prefix == "xmlns" {
			let reserved = match local {
				"xml" if value != XMLNS_XML => Some(("xml", XMLNS_XML)),
				"xmlns" if value != XMLNS_XMLNS => Some(("xmlns", XMLNS_XMLNS)),
				_ => None,
			};
			if let Some((prefix, expected)) = reserved {
				self.strict_fail(NWFError::ReservedNamespacePrefix {
					prefix,
					expected,
					actual: value.clone(),
				});
			}
			let uri = self.ctx.intern_uri(&value);
			let parent = self.parent_scope();
			if let Some(scope) = self.tag.as_mut().and_then(|tag| tag.ns.as_mut()) {
				NamespaceScope::specialize(scope, &parent).bind(local, uri);
			}
		}
		self.deferred.push((name, value));
	}

	/// The opening tag is complete.
	pub(super) fn open_tag(&mut self, self_closing: bool) {
		let mut tag = match self.tag.take() {
			Some(tag) => tag,
			None => return,
		};
		if self.opts.xmlns {
			self.resolve_tag(&mut tag);
		}
		tag.is_self_closing = self_closing;
		self.saw_root = true;
		let is_script = tag.name.eq_ignore_ascii_case("script");
		self.emit_node(Event::OpenTag(tag.clone()));
		self.tags.push(tag);
		if !self_closing {
			self.state = if is_script && self.opts.script_enabled() {
				State::Script
			} else {
				State::Text
			};
			self.acc.tag_name.clear();
		}
		self.acc.attrib_name.clear();
		self.acc.attrib_value.clear();
		self.deferred.clear();
	}

	/// Resolve the names of `tag` and its held back attributes.
	fn resolve_tag(&mut self, tag: &mut Tag) {
		let parent = self.parent_scope();
		let scope = tag.ns.clone().unwrap_or_else(|| parent.clone());

		let (prefix, local) = split_qname(&tag.name, false);
		let mut uri = scope.resolve(prefix);
		if !prefix.is_empty() && uri.is_none() {
			self.strict_fail(NWFError::UnboundNamespacePrefix(tag.name.clone()));
			uri = Some(self.ctx.intern_uri(prefix));
		}
		tag.qname = Some(QName {
			prefix: prefix.into(),
			local: local.into(),
			uri,
		});

		if !RcPtr::ptr_eq(&scope, &parent) {
			for (prefix, uri) in scope.bindings() {
				self.emit_node(Event::OpenNamespace(NamespaceBinding {
					prefix: prefix.into(),
					uri: uri.clone(),
				}));
			}
		}

		for (name, value) in std::mem::take(&mut self.deferred) {
			let (prefix, local) = split_qname(&name, true);
			let mut uri = if prefix.is_empty() {
				None
			} else {
				scope.resolve(prefix)
			};
			if !prefix.is_empty() && prefix != "xmlns" && uri.is_none() {
				self.strict_fail(NWFError::UnboundNamespacePrefix(name.clone()));
				uri = Some(self.ctx.intern_uri(prefix));
			}
			let qname = QName {
				prefix: prefix.into(),
				local: local.into(),
				uri,
			};
			let attr = Attribute {
				name,
				value,
				qname: Some(qname),
			};
			tag.attributes.push(attr.clone());
			self.emit_node(Event::Attribute(attr));
		}
	}

	/// A closing tag is complete.
	pub(super) fn close_tag(&mut self) {
		if self.acc.tag_name.is_empty() {
			self.strict_fail(WFError::EmptyCloseTag);
			self.append(Buffer::Text, "</>");
			self.state = State::Text;
			return;
		}

		if self.closing_script {
			self.closing_script = false;
			if !self.acc.tag_name.eq_ignore_ascii_case("script") {
				let name = self.acc.take(Buffer::TagName);
				self.append(Buffer::Script, "</");
				self.append(Buffer::Script, &name);
				self.append_char(Buffer::Script, '>');
				self.state = State::Script;
				return;
			}
			if !self.acc.script.is_empty() {
				let script = self.acc.take(Buffer::Script);
				self.emit_node(Event::Script(script));
			}
		}

		let written = self.acc.take(Buffer::TagName);
		let close_to: SmartString = match self.fold {
			Some(fold) => fold.apply(&written).into(),
			None => written.as_str().into(),
		};

		let mut found = None;
		for (i, open) in self.tags.iter().enumerate().rev() {
			if open.name == close_to {
				found = Some(i);
				break;
			}
		}
		let depth = match found {
			Some(depth) => depth,
			None => {
				// leave everything open and keep the markup as text
				for _ in 0..self.tags.len() {
					self.strict_fail(WFError::UnexpectedCloseTag);
				}
				self.strict_fail(WFError::UnmatchedCloseTag(written.as_str().into()));
				self.append(Buffer::Text, "</");
				self.append(Buffer::Text, &written);
				self.append_char(Buffer::Text, '>');
				self.state = State::Text;
				return;
			}
		};
		for _ in depth + 1..self.tags.len() {
			self.strict_fail(WFError::UnexpectedCloseTag);
		}

		while self.tags.len() > depth {
			let tag = match self.tags.pop() {
				Some(tag) => tag,
				None => break,
			};
			self.emit_node(Event::CloseTag(tag.name.clone()));
			if let Some(scope) = tag.ns.as_ref() {
				let parent = self.parent_scope();
				if !RcPtr::ptr_eq(scope, &parent) {
					for (prefix, uri) in scope.bindings() {
						self.emit_node(Event::CloseNamespace(NamespaceBinding {
							prefix: prefix.into(),
							uri: uri.clone(),
						}));
					}
				}
			}
		}
		if depth == 0 {
			self.closed_root = true;
		}
		self.acc.attrib_name.clear();
		self.acc.attrib_value.clear();
		self.deferred.clear();
		self.state = State::Text;
	}
}

#[cfg(test)]
mod tests {
	use crate::error::{ErrorKind, NWFError, WFError};
	use crate::event::{Event, EventCollector, NamespaceBinding};
	use crate::options::SaxOptions;
	use crate::parser::{SaxParser, XMLNS_XML, XMLNS_XMLNS};

	fn run(opts: SaxOptions, doc: &str) -> Vec<Event> {
		let mut p = SaxParser::with_options(opts, EventCollector::new());
		let _ = p.write(doc);
		let _ = p.end();
		p.into_sink()
			.into_events()
			.into_iter()
			.filter(|ev| !matches!(ev, Event::Ready | Event::End))
			.collect()
	}

	fn errors(evs: &[Event]) -> Vec<ErrorKind> {
		evs.iter()
			.filter_map(|ev| match ev {
				Event::Error(e) => Some(e.kind().clone()),
				_ => None,
			})
			.collect()
	}

	fn xmlns() -> SaxOptions {
		SaxOptions::default().strict(true).xmlns(true)
	}

	#[test]
	fn open_events_order_without_namespaces() {
		let evs = run(SaxOptions::default().strict(true), "<a x='1' y=\"2\"/>");
		let mut iter = evs.iter();
		match iter.next().unwrap() {
			Event::OpenTagStart(tag) => {
				assert_eq!(tag.name, "a");
				assert!(tag.attributes.is_empty());
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::Attribute(attr) => {
				assert_eq!(attr.name, "x");
				assert_eq!(attr.value, "1");
				assert!(attr.qname.is_none());
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::Attribute(attr) => assert_eq!(attr.name, "y"),
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::OpenTag(tag) => {
				assert!(tag.is_self_closing);
				assert_eq!(tag.get("x"), Some("1"));
				assert_eq!(tag.get("y"), Some("2"));
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::CloseTag(name) => assert_eq!(name, "a"),
			other => panic!("unexpected event: {:?}", other),
		}
		assert!(iter.next().is_none());
	}

	#[test]
	fn duplicate_attributes_keep_the_first() {
		for opts in vec![
			SaxOptions::default(),
			SaxOptions::default().strict(true),
			SaxOptions::default().strict(true).xmlns(true),
		] {
			let evs = run(opts, "<a x=\"1\" x=\"2\"></a>");
			assert!(errors(&evs).is_empty(), "{:?}", evs);
			let attrs: Vec<&Event> = evs
				.iter()
				.filter(|ev| matches!(ev, Event::Attribute(_)))
				.collect();
			assert_eq!(attrs.len(), 1);
			let tag = evs
				.iter()
				.find_map(|ev| match ev {
					Event::OpenTag(tag) => Some(tag.clone()),
					_ => None,
				})
				.unwrap();
			assert_eq!(tag.attributes.len(), 1);
			assert_eq!(tag.attributes[0].value, "1");
		}
	}

	#[test]
	fn lenient_duplicates_are_detected_after_folding() {
		let evs = run(SaxOptions::default(), "<a x=\"1\" X=\"2\"></a>");
		let tag = evs
			.iter()
			.find_map(|ev| match ev {
				Event::OpenTag(tag) => Some(tag.clone()),
				_ => None,
			})
			.unwrap();
		assert_eq!(tag.attributes.len(), 1);
		assert_eq!(tag.get("X"), Some("1"));
	}

	#[test]
	fn namespace_declarations_apply_to_earlier_attributes() {
		let evs = run(xmlns(), "<p:a p:x=\"1\" xmlns:p=\"urn:p\" y=\"2\"/>");
		assert!(errors(&evs).is_empty(), "{:?}", evs);
		let mut iter = evs.iter().skip_while(|ev| !matches!(ev, Event::OpenNamespace(_)));
		match iter.next().unwrap() {
			Event::OpenNamespace(NamespaceBinding { prefix, uri }) => {
				assert_eq!(prefix, "p");
				assert_eq!(&**uri, "urn:p");
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::Attribute(attr) => {
				assert_eq!(attr.name, "p:x");
				let qname = attr.qname.as_ref().unwrap();
				assert_eq!(qname.prefix, "p");
				assert_eq!(qname.local, "x");
				assert_eq!(qname.uri.as_deref(), Some("urn:p"));
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::Attribute(attr) => {
				assert_eq!(attr.name, "xmlns:p");
				let qname = attr.qname.as_ref().unwrap();
				assert_eq!(qname.uri.as_deref(), Some(XMLNS_XMLNS));
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::Attribute(attr) => {
				assert_eq!(attr.name, "y");
				assert!(attr.qname.as_ref().unwrap().uri.is_none());
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::OpenTag(tag) => {
				let qname = tag.qname.as_ref().unwrap();
				assert_eq!(qname.local, "a");
				assert_eq!(qname.uri.as_deref(), Some("urn:p"));
			}
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::CloseTag(name) => assert_eq!(name, "p:a"),
			other => panic!("unexpected event: {:?}", other),
		}
		match iter.next().unwrap() {
			Event::CloseNamespace(NamespaceBinding { prefix, uri }) => {
				assert_eq!(prefix, "p");
				assert_eq!(&**uri, "urn:p");
			}
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[test]
	fn default_namespace_applies_to_elements_only() {
		let evs = run(xmlns(), "<a xmlns=\"urn:d\" b=\"1\"><c/></a>");
		let tags: Vec<_> = evs
			.iter()
			.filter_map(|ev| match ev {
				Event::OpenTag(tag) => Some(tag.clone()),
				_ => None,
			})
			.collect();
		assert_eq!(tags[0].qname.as_ref().unwrap().uri.as_deref(), Some("urn:d"));
		assert_eq!(tags[1].qname.as_ref().unwrap().uri.as_deref(), Some("urn:d"));
		let b = tags[0].attribute("b").unwrap();
		assert!(b.qname.as_ref().unwrap().uri.is_none());
		let decl = tags[0].attribute("xmlns").unwrap();
		let qname = decl.qname.as_ref().unwrap();
		assert_eq!(qname.prefix, "xmlns");
		assert_eq!(qname.local, "");
	}

	#[test]
	fn xml_prefix_is_prebound() {
		let evs = run(xmlns(), "<a xml:lang=\"en\"/>");
		assert!(errors(&evs).is_empty());
		let attr = evs
			.iter()
			.find_map(|ev| match ev {
				Event::Attribute(attr) => Some(attr.clone()),
				_ => None,
			})
			.unwrap();
		assert_eq!(attr.qname.unwrap().uri.as_deref(), Some(XMLNS_XML));
	}

	#[test]
	fn unbound_prefixes() {
		let evs = run(xmlns(), "<p:a q:b=\"1\"/>");
		assert_eq!(
			errors(&evs),
			vec![
				ErrorKind::NotNamespaceWellFormed(NWFError::UnboundNamespacePrefix("p:a".into())),
				ErrorKind::NotNamespaceWellFormed(NWFError::UnboundNamespacePrefix("q:b".into())),
			]
		);

		let evs = run(SaxOptions::default().lowercase(true).xmlns(true), "<p:a q:b=\"1\"/>");
		assert!(errors(&evs).is_empty());
		let tag = evs
			.iter()
			.find_map(|ev| match ev {
				Event::OpenTag(tag) => Some(tag.clone()),
				_ => None,
			})
			.unwrap();
		assert_eq!(tag.qname.unwrap().uri.as_deref(), Some("p"));
		assert_eq!(
			tag.attributes[0].qname.as_ref().unwrap().uri.as_deref(),
			Some("q")
		);
	}

	#[test]
	fn reserved_prefixes_cannot_be_rebound() {
		let evs = run(xmlns(), "<a xmlns:xml=\"urn:x\" xmlns:xmlns=\"urn:y\"/>");
		assert_eq!(
			errors(&evs),
			vec![
				ErrorKind::NotNamespaceWellFormed(NWFError::ReservedNamespacePrefix {
					prefix: "xml",
					expected: XMLNS_XML,
					actual: "urn:x".to_string(),
				}),
				ErrorKind::NotNamespaceWellFormed(NWFError::ReservedNamespacePrefix {
					prefix: "xmlns",
					expected: XMLNS_XMLNS,
					actual: "urn:y".to_string(),
				}),
			]
		);
		let evs = run(xmlns(), &format!("<a xmlns:xml=\"{}\"/>", XMLNS_XML));
		assert!(errors(&evs).is_empty());
	}

	#[test]
	fn mismatched_close_auto_closes_in_lenient_mode() {
		let evs = run(SaxOptions::default(), "<a><b><c></a>");
		let closes: Vec<&Event> = evs
			.iter()
			.filter(|ev| matches!(ev, Event::CloseTag(_)))
			.collect();
		assert_eq!(
			closes,
			vec![
				&Event::CloseTag("C".into()),
				&Event::CloseTag("B".into()),
				&Event::CloseTag("A".into()),
			]
		);
		assert!(errors(&evs).is_empty());

		let evs = run(SaxOptions::default().strict(true), "<a><b><c></a>");
		assert_eq!(
			errors(&evs),
			vec![
				ErrorKind::NotWellFormed(WFError::UnexpectedCloseTag),
				ErrorKind::NotWellFormed(WFError::UnexpectedCloseTag),
			]
		);
	}

	#[test]
	fn unmatched_close_is_kept_as_text() {
		let mut p = SaxParser::new(EventCollector::new());
		p.write("<a>x</b>y").unwrap();
		assert_eq!(p.tags().len(), 1);
		assert_eq!(p.tags()[0].name, "A");
		p.write("</a>").unwrap();
		let evs = p.into_sink().into_events();
		assert!(evs.contains(&Event::Text("x</b>y".to_string())), "{:?}", evs);
	}

	#[test]
	fn unmatched_close_fails_in_strict_mode() {
		let evs = run(SaxOptions::default().strict(true), "<a></b></a>");
		assert_eq!(
			errors(&evs),
			vec![
				ErrorKind::NotWellFormed(WFError::UnexpectedCloseTag),
				ErrorKind::NotWellFormed(WFError::UnmatchedCloseTag("b".into())),
			]
		);
	}
}
