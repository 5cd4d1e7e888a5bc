use crate::render::Page;

/// Reset an event source to its first event
pub trait Rewind {
    type Error;

    fn rewind(&mut self) -> Result<(), Self::Error>;
}

pub trait TryClone {
    type Error;

    fn try_clone(&self) -> Result<Self, Self::Error>
    where
        Self: Sized;
}

/// Output of event display pages
pub trait RenderPage {
    type Error;

    /// Add a page to the output document
    fn render(&mut self, page: &Page<'_>) -> Result<(), Self::Error>;

    /// Close the output document
    fn finish(&mut self) -> Result<(), Self::Error>;
}

impl<R: RenderPage + ?Sized> RenderPage for &mut R {
    type Error = R::Error;

    fn render(&mut self, page: &Page<'_>) -> Result<(), Self::Error> {
        (**self).render(page)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}
