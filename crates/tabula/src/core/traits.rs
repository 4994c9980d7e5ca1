use std::marker::PhantomData;

/// Composable boolean test over items of type `T`.
///
/// The filter stage of the list engine is built from these, and stores use
/// them to derive subsets of their cached entities.
pub trait Predicate<T>: Send + Sync {
    fn test(&self, item: &T) -> bool;

    fn and<P>(self, other: P) -> And<T, Self, P>
    where
        Self: Sized,
        P: Predicate<T>,
    {
        And {
            left: self,
            right: other,
            _phantom: PhantomData,
        }
    }
}

pub struct And<T, L, R> {
    left: L,
    right: R,
    _phantom: PhantomData<fn(&T)>,
}

impl<T, L, R> Predicate<T> for And<T, L, R>
where
    L: Predicate<T>,
    R: Predicate<T>,
{
    fn test(&self, item: &T) -> bool {
        self.left.test(item) && self.right.test(item)
    }
}

/// Wraps a closure as a `Predicate`
pub struct FnPredicate<F>(pub F);

impl<T, F> Predicate<T> for FnPredicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn test(&self, item: &T) -> bool {
        (self.0)(item)
    }
}
