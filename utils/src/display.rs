use std::fmt;

/// Display for values that only carry indices and need a context (usually
/// the owning program) to print names.
pub trait DisplayResolved<C: ?Sized> {
    fn fmt_with(&self, f: &mut fmt::Formatter, ctx: &C) -> fmt::Result;

    fn resolved<'a>(&'a self, ctx: &'a C) -> DisplayResolvedWrapper<'a, Self, C>
    where
        Self: Sized,
    {
        DisplayResolvedWrapper { inner: self, ctx }
    }
}

pub struct DisplayResolvedWrapper<'a, T: ?Sized, C: ?Sized> {
    inner: &'a T,
    ctx: &'a C,
}

impl<'a, T, C> fmt::Display for DisplayResolvedWrapper<'a, T, C>
where
    T: DisplayResolved<C> + ?Sized,
    C: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.inner.fmt_with(f, self.ctx)
    }
}
