//! Lenses for focused updates in do-notation.
//!
//! A [`Lens<S, T>`] pairs a getter and a setter for a field `T` inside a
//! record `S`. The lens-qualified do-notation steps
//! ([`bind_l`](crate::ReaderReaderIOResult::bind_l) and friends) use one to
//! read the field, run an effect on it and write the result back.
//!
//! A lawful lens satisfies:
//!
//! 1. `lens.set(s.clone(), lens.get(&s)) == s`
//! 2. `lens.get(&lens.set(s, t.clone())) == t`
//! 3. `lens.set(lens.set(s.clone(), t1), t2.clone()) == lens.set(s, t2)`
//!
//! ```
//! use undertow::optics::Lens;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let x = Lens::new(|p: &Point| p.x, |p: Point, x| Point { x, ..p });
//!
//! let moved = x.modify(Point { x: 1, y: 2 }, |x| x + 10);
//! assert_eq!(moved, Point { x: 11, y: 2 });
//! ```

use std::fmt;
use std::sync::Arc;

/// A getter/setter pair focusing on a `T` inside an `S`.
pub struct Lens<S, T> {
    getter: Arc<dyn Fn(&S) -> T + Send + Sync>,
    setter: Arc<dyn Fn(S, T) -> S + Send + Sync>,
}

impl<S, T> Clone for Lens<S, T> {
    fn clone(&self) -> Self {
        Lens {
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<S, T> fmt::Debug for Lens<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens")
            .field("get", &"<function>")
            .field("set", &"<function>")
            .finish()
    }
}

impl<S, T> Lens<S, T>
where
    S: 'static,
    T: 'static,
{
    /// Build a lens from a getter and a setter.
    pub fn new<G, St>(get: G, set: St) -> Self
    where
        G: Fn(&S) -> T + Send + Sync + 'static,
        St: Fn(S, T) -> S + Send + Sync + 'static,
    {
        Lens {
            getter: Arc::new(get),
            setter: Arc::new(set),
        }
    }

    /// Read the focused field.
    pub fn get(&self, source: &S) -> T {
        (self.getter)(source)
    }

    /// Replace the focused field.
    pub fn set(&self, source: S, value: T) -> S {
        (self.setter)(source, value)
    }

    /// Update the focused field with a function.
    pub fn modify<F>(&self, source: S, f: F) -> S
    where
        F: FnOnce(T) -> T,
    {
        let value = f(self.get(&source));
        self.set(source, value)
    }

    /// Focus further into the field with another lens.
    pub fn compose<U>(self, inner: Lens<T, U>) -> Lens<S, U>
    where
        U: 'static,
    {
        let outer_get = self.getter.clone();
        let outer = self;
        let inner_get = inner.clone();
        Lens::new(
            move |s: &S| inner_get.get(&outer_get(s)),
            move |s: S, u: U| {
                let field = outer.get(&s);
                let field = inner.set(field, u);
                outer.set(s, field)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Address {
        city: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct User {
        name: String,
        address: Address,
    }

    fn address() -> Lens<User, Address> {
        Lens::new(|u: &User| u.address.clone(), |u: User, address| User { address, ..u })
    }

    fn city() -> Lens<Address, String> {
        Lens::new(|a: &Address| a.city.clone(), |_: Address, city| Address { city })
    }

    fn user() -> User {
        User {
            name: "ada".into(),
            address: Address {
                city: "London".into(),
            },
        }
    }

    #[test]
    fn test_lens_laws() {
        let lens = address().compose(city());
        let s = user();

        assert_eq!(lens.set(s.clone(), lens.get(&s)), s);
        assert_eq!(lens.get(&lens.set(s.clone(), "Paris".into())), "Paris");
        assert_eq!(
            lens.set(lens.set(s.clone(), "Paris".into()), "Rome".into()),
            lens.set(s, "Rome".into())
        );
    }

    #[test]
    fn test_modify_through_composed_lens() {
        let lens = address().compose(city());
        let updated = lens.modify(user(), |c| c.to_uppercase());

        assert_eq!(updated.address.city, "LONDON");
        assert_eq!(updated.name, "ada");
    }
}
