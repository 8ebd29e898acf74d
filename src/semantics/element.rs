//! Non-owning references between semantic elements.
//!
//! Every semantic element is owned by its [`crate::EdmModel`]. Elements point at each other
//! (a navigation property at its target type, a binding at its target entity set, a type at
//! its base) and those pointers are frequently cyclic, so they are stored as [`ElementRef`]s
//! holding a [`Weak`] reference. The model's strong references keep everything alive for as
//! long as the model is.

use std::{
    fmt,
    sync::{Arc, Weak},
};

/// A weak reference to a semantic element owned by a model.
pub struct ElementRef<T> {
    weak_ref: Weak<T>,
}

impl<T> ElementRef<T> {
    /// Create a new `ElementRef` from a strong reference
    pub fn new(strong_ref: &Arc<T>) -> Self {
        ElementRef {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Wrap an existing weak reference, e.g. one handed out by [`Arc::new_cyclic`]
    pub(crate) fn from_weak(weak_ref: Weak<T>) -> Self {
        ElementRef { weak_ref }
    }

    /// Get a strong reference to the element, returning `None` if the owning model is gone
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced element is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Check whether both references point at the same element
    #[must_use]
    pub fn ptr_eq(&self, other: &ElementRef<T>) -> bool {
        Weak::ptr_eq(&self.weak_ref, &other.weak_ref)
    }

    /// Check whether this reference points at `element`
    #[must_use]
    pub fn is(&self, element: &Arc<T>) -> bool {
        std::ptr::eq(self.weak_ref.as_ptr(), Arc::as_ptr(element))
    }
}

impl<T> Clone for ElementRef<T> {
    fn clone(&self) -> Self {
        ElementRef {
            weak_ref: Weak::clone(&self.weak_ref),
        }
    }
}

impl<T> fmt::Debug for ElementRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementRef({:p}", self.weak_ref.as_ptr())?;
        if !self.is_valid() {
            write!(f, ", dropped")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_and_identity() {
        let value = Arc::new(5_u32);
        let other = Arc::new(5_u32);
        let a = ElementRef::new(&value);
        let b = a.clone();

        assert!(a.ptr_eq(&b));
        assert!(a.is(&value));
        assert!(!a.is(&other));
        assert_eq!(a.upgrade().as_deref(), Some(&5));
    }

    #[test]
    fn test_dropped_element() {
        let value = Arc::new(String::from("gone"));
        let reference = ElementRef::new(&value);
        drop(value);

        assert!(!reference.is_valid());
        assert!(reference.upgrade().is_none());
        assert!(format!("{reference:?}").contains("dropped"));
    }
}
