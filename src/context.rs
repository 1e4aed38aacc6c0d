use std::fmt;

#[cfg(all(feature = "shared_ns", feature = "mt"))]
use std::sync::{Mutex, MutexGuard, Weak};
#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
use std::cell::{RefCell, RefMut};
#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
use std::rc::Weak;

use crate::parser::{NamespaceName, RcPtr};

#[cfg(feature = "shared_ns")]
type UriWeakSet = weak_table::WeakHashSet<Weak<str>>;

/**
# Namespace URI storage shared between parsers

Parsers in namespace mode hand out the URI of every resolved name as a
[`NamespaceName`]. Applications running many parsers over similar
documents can give them one `Context` (see
[`SaxParser::with_context`](crate::SaxParser::with_context)) so that
equal URIs end up in one allocation.

Interning only happens with the `shared_ns` feature; otherwise each URI
gets an allocation of its own and the context carries no state.

With the `mt` feature the context is `Send` and `Sync`.
*/
pub struct Context {
	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	uris: Mutex<UriWeakSet>,
	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	uris: RefCell<UriWeakSet>,
}

impl Context {
	/// Create a new context
	pub fn new() -> Context {
		Context {
			#[cfg(all(feature = "shared_ns", feature = "mt"))]
			uris: Mutex::new(UriWeakSet::new()),
			#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
			uris: RefCell::new(UriWeakSet::new()),
		}
	}

	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	fn lock_uris<'a>(&'a self) -> MutexGuard<'a, UriWeakSet> {
		// the set stays consistent even if a holder panicked
		self.uris.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	fn lock_uris<'a>(&'a self) -> RefMut<'a, UriWeakSet> {
		self.uris.borrow_mut()
	}

	/// Intern a namespace URI
	///
	/// The URI is interned in the context and a refcounted pointer is
	/// returned. When the last reference to that pointer expires, the
	/// string will be lazily removed from the internal storage.
	///
	/// To force expiry, call [`Context::release_temporaries`], although that
	/// should only rarely be necessary.
	pub fn intern_uri(&self, uri: &str) -> NamespaceName {
		#[cfg(feature = "shared_ns")]
		{
			let mut uris = self.lock_uris();
			return match uris.get(uri) {
				Some(ptr) => ptr,
				None => {
					let ptr: NamespaceName = RcPtr::from(uri);
					uris.insert(ptr.clone());
					ptr
				}
			};
		}
		#[cfg(not(feature = "shared_ns"))]
		return RcPtr::from(uri);
	}

	/// Remove all unreferenced strings from storage and shrink the storage to
	/// fit the requirements.
	pub fn release_temporaries(&self) {
		#[cfg(feature = "shared_ns")]
		{
			let mut uris = self.lock_uris();
			uris.remove_expired();
			uris.shrink_to_fit();
		}
	}

	/// Return the number of URIs interned.
	///
	/// Returns zero if built without `shared_ns`. This count includes strings
	/// which are unreferenced and which would be removed before the next
	/// reallocation.
	pub fn uris(&self) -> usize {
		#[cfg(feature = "shared_ns")]
		{
			let uris = self.lock_uris();
			uris.len()
		}
		#[cfg(not(feature = "shared_ns"))]
		0
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Context {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		let mut f = f.debug_struct("Context");
		f.field("instance", &(self as *const Context));
		#[cfg(feature = "shared_ns")]
		{
			let uris = self.lock_uris();
			f.field("uris.capacity()", &uris.capacity())
				.field("uris.len()", &uris.len());
		}
		f.finish()
	}
}
