#![forbid(unsafe_code)]

//! Dynamically typed property values.
//!
//! A [`Value`] is either *undefined* or a shared, reference-counted payload of
//! any `'static` type that is `Debug + PartialEq`. Cloning a `Value` is an `Rc`
//! bump; the payload itself is never copied.
//!
//! # Equality
//!
//! `Value: PartialEq` implements strict equality:
//!
//! 1. Two undefined values are equal.
//! 2. Two handles to the same allocation are equal without inspecting the
//!    payload.
//! 3. Otherwise the payloads are equal only if they have the same concrete
//!    type and that type's `PartialEq` says so.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Object-safe view of a property payload.
///
/// Implemented for every `'static + Debug + PartialEq` type; there is no need
/// to implement it by hand.
pub trait Property: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn Property) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq> Property for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Property) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

/// A property value held by a [`Store`](crate::Store).
#[derive(Clone, Default)]
pub struct Value(Option<Rc<dyn Property>>);

impl Value {
    /// Wrap a payload.
    ///
    /// Passing a `Value` returns it unchanged rather than nesting it.
    #[must_use]
    pub fn new<T: Property>(payload: T) -> Self {
        if let Some(value) = (&payload as &dyn Any).downcast_ref::<Value>() {
            return value.clone();
        }
        Self(Some(Rc::new(payload)))
    }

    /// The undefined value (what an absent property reads as).
    #[must_use]
    pub const fn undefined() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.0.is_none()
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.0.is_some()
    }

    /// Borrow the payload as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Whether the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Clone the payload out as `T`.
    #[must_use]
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Clone the payload out as `T`, falling back to `T::default()` when the
    /// value is undefined or of another type.
    #[must_use]
    pub fn get_or_default<T: Any + Clone + Default>(&self) -> T {
        self.get().unwrap_or_default()
    }

    /// Identity comparison: both undefined, or the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a.dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(payload) => fmt::Debug::fmt(payload.as_ref(), f),
            None => f.write_str("undefined"),
        }
    }
}
