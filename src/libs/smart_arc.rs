use std::{
	fmt::{self, Debug},
	hash::{Hash, Hasher},
	ops::Deref,
	sync::Arc,
};

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// Smart Atomic Reference Counter
///
/// Equality and hashing go through the pointer, so two handles compare equal
/// only when they share the same allocation. That is what "the same texture is
/// bound to every channel" means for uniform values.
pub struct Sarc<T: ?Sized>(pub Arc<T>);

impl<T: Sized> Sarc<T> {
	pub fn new(data: T) -> Self {
		Self(Arc::new(data))
	}
}

impl<T: ?Sized> Sarc<T> {
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	pub fn strong_count(&self) -> usize {
		Arc::strong_count(&self.0)
	}
}

impl<T: ?Sized> From<Arc<T>> for Sarc<T> {
	fn from(value: Arc<T>) -> Self {
		Self(value)
	}
}

impl<T: ?Sized> Clone for Sarc<T> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<T: ?Sized> PartialEq for Sarc<T> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl<T: ?Sized> Eq for Sarc<T> {}

impl<T: ?Sized> Hash for Sarc<T> {
	fn hash<H>(&self, hasher: &mut H)
	where
		H: Hasher,
	{
		// Thin the (possibly fat) pointer before hashing its address
		hasher.write_usize(Arc::as_ptr(&self.0) as *const () as usize);
	}
}

impl<T: ?Sized + Debug> Debug for Sarc<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Sarc").field(&&*self.0).finish()
	}
}

impl<T: ?Sized> Deref for Sarc<T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		self.0.deref()
	}
}

impl<T: ?Sized> AsRef<T> for Sarc<T> {
	fn as_ref(&self) -> &T {
		self.0.as_ref()
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/
