/*!
# Namespace scopes

Every element in namespace mode refers to a [`NamespaceScope`]. Elements
which do not declare any prefixes share the scope of their parent; an
element with `xmlns`/`xmlns:*` attributes gets a scope of its own which
points back at the parent's scope for everything it does not bind itself.
*/
#[cfg(feature = "mt")]
use std::sync::Arc;
#[cfg(not(feature = "mt"))]
use std::rc::Rc;

use smartstring::alias::String as SmartString;

use crate::context::Context;

/// Reference counted pointer; atomic if built with the `mt` feature
#[cfg(feature = "mt")]
pub type RcPtr<T> = Arc<T>;
/// Reference counted pointer; atomic if built with the `mt` feature
#[cfg(not(feature = "mt"))]
pub type RcPtr<T> = Rc<T>;

/// Shared namespace URI
pub type NamespaceName = RcPtr<str>;

/// XML core namespace URI (for the `xml:` prefix)
pub const XMLNS_XML: &'static str = "http://www.w3.org/XML/1998/namespace";
/// XML namespace URI (for the `xmlns:` prefix)
pub const XMLNS_XMLNS: &'static str = "http://www.w3.org/2000/xmlns/";

/**
# Prefix to URI bindings of one element

The bindings introduced by the element itself are kept in declaration
order; lookups fall back to the parent scope.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceScope {
	bindings: Vec<(SmartString, NamespaceName)>,
	parent: Option<RcPtr<NamespaceScope>>,
}

impl NamespaceScope {
	/// The scope above the document element, binding `xml` and `xmlns`.
	pub(crate) fn root(ctx: &Context) -> RcPtr<Self> {
		RcPtr::new(Self {
			bindings: vec![
				("xml".into(), ctx.intern_uri(XMLNS_XML)),
				("xmlns".into(), ctx.intern_uri(XMLNS_XMLNS)),
			],
			parent: None,
		})
	}

	fn child_of(parent: &RcPtr<Self>) -> Self {
		Self {
			bindings: Vec::new(),
			parent: Some(parent.clone()),
		}
	}

	/**
	Make `scope` a scope of its own if it is still shared with `parent`
	and return it for modification.
	*/
	pub(crate) fn specialize<'a>(scope: &'a mut RcPtr<Self>, parent: &RcPtr<Self>) -> &'a mut Self {
		if RcPtr::ptr_eq(scope, parent) {
			*scope = RcPtr::new(Self::child_of(parent));
		}
		RcPtr::make_mut(scope)
	}

	/// Bind a prefix, replacing an earlier binding of the same scope.
	pub(crate) fn bind(&mut self, prefix: &str, uri: NamespaceName) {
		match self.bindings.iter_mut().find(|(p, _)| p == prefix) {
			Some(slot) => slot.1 = uri,
			None => self.bindings.push((prefix.into(), uri)),
		}
	}

	/// Find the nearest binding of `prefix`, including empty ones.
	pub fn lookup(&self, prefix: &str) -> Option<&NamespaceName> {
		let mut scope = self;
		loop {
			if let Some((_, uri)) = scope.bindings.iter().find(|(p, _)| p == prefix) {
				return Some(uri);
			}
			scope = scope.parent.as_deref()?;
		}
	}

	/**
	Resolve `prefix` to a namespace URI.

	A prefix bound to the empty string (`xmlns=""`) counts as unbound.
	*/
	pub fn resolve(&self, prefix: &str) -> Option<NamespaceName> {
		match self.lookup(prefix) {
			Some(uri) if !uri.is_empty() => Some(uri.clone()),
			_ => None,
		}
	}

	/// Bindings introduced by this scope, in declaration order.
	pub fn bindings(&self) -> impl Iterator<Item = (&str, &NamespaceName)> {
		self.bindings.iter().map(|(p, uri)| (p.as_str(), uri))
	}

	pub fn parent(&self) -> Option<&RcPtr<NamespaceScope>> {
		self.parent.as_ref()
	}
}

/**
Split a name at its first colon into prefix and local part.

Names without a colon have an empty prefix. The bare attribute name
`xmlns` is a declaration of the default namespace and yields the prefix
`xmlns` with an empty local part.
*/
pub(crate) fn split_qname(name: &str, attribute: bool) -> (&str, &str) {
	if attribute && name == "xmlns" {
		return ("xmlns", "");
	}
	match name.split_once(':') {
		Some((prefix, local)) => (prefix, local),
		None => ("", name),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn uri(s: &str) -> NamespaceName {
		RcPtr::from(s)
	}

	#[test]
	fn root_scope_binds_reserved_prefixes() {
		let ctx = Context::new();
		let root = NamespaceScope::root(&ctx);
		assert_eq!(root.resolve("xml").as_deref(), Some(XMLNS_XML));
		assert_eq!(root.resolve("xmlns").as_deref(), Some(XMLNS_XMLNS));
		assert!(root.resolve("").is_none());
		assert!(root.resolve("foo").is_none());
	}

	#[test]
	fn specialize_creates_child_once() {
		let ctx = Context::new();
		let root = NamespaceScope::root(&ctx);
		let mut scope = root.clone();
		NamespaceScope::specialize(&mut scope, &root).bind("a", uri("urn:a"));
		assert!(!RcPtr::ptr_eq(&scope, &root));
		let first = RcPtr::as_ptr(&scope);
		NamespaceScope::specialize(&mut scope, &root).bind("b", uri("urn:b"));
		assert_eq!(RcPtr::as_ptr(&scope), first);
		let own: Vec<&str> = scope.bindings().map(|(p, _)| p).collect();
		assert_eq!(own, vec!["a", "b"]);
		assert!(root.resolve("a").is_none());
	}

	#[test]
	fn lookup_walks_the_chain_and_honours_shadowing() {
		let ctx = Context::new();
		let root = NamespaceScope::root(&ctx);
		let mut outer = root.clone();
		NamespaceScope::specialize(&mut outer, &root).bind("p", uri("urn:outer"));
		let mut inner = outer.clone();
		NamespaceScope::specialize(&mut inner, &outer).bind("p", uri("urn:inner"));
		let mut sibling = outer.clone();
		NamespaceScope::specialize(&mut sibling, &outer).bind("q", uri("urn:q"));

		assert_eq!(inner.resolve("p").as_deref(), Some("urn:inner"));
		assert_eq!(sibling.resolve("p").as_deref(), Some("urn:outer"));
		assert_eq!(sibling.resolve("xml").as_deref(), Some(XMLNS_XML));
		assert_eq!(outer.resolve("p").as_deref(), Some("urn:outer"));
	}

	#[test]
	fn rebinding_within_one_scope_replaces() {
		let ctx = Context::new();
		let root = NamespaceScope::root(&ctx);
		let mut scope = root.clone();
		let s = NamespaceScope::specialize(&mut scope, &root);
		s.bind("p", uri("urn:1"));
		s.bind("p", uri("urn:2"));
		assert_eq!(scope.bindings().count(), 1);
		assert_eq!(scope.resolve("p").as_deref(), Some("urn:2"));
	}

	#[test]
	fn empty_binding_undeclares() {
		let ctx = Context::new();
		let root = NamespaceScope::root(&ctx);
		let mut outer = root.clone();
		NamespaceScope::specialize(&mut outer, &root).bind("", uri("urn:default"));
		let mut inner = outer.clone();
		NamespaceScope::specialize(&mut inner, &outer).bind("", uri(""));
		assert_eq!(outer.resolve("").as_deref(), Some("urn:default"));
		assert!(inner.lookup("").is_some());
		assert!(inner.resolve("").is_none());
	}

	#[test]
	fn split_qname_variants() {
		assert_eq!(split_qname("foo", false), ("", "foo"));
		assert_eq!(split_qname("a:foo", false), ("a", "foo"));
		assert_eq!(split_qname("xmlns", false), ("", "xmlns"));
		assert_eq!(split_qname("xmlns", true), ("xmlns", ""));
		assert_eq!(split_qname("xmlns:a", true), ("xmlns", "a"));
		assert_eq!(split_qname("a:b:c", true), ("a", "b:c"));
	}
}
