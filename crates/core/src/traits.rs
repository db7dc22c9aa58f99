use crate::errors::SourceError;

/// Byte source for the dataset document.
///
/// No async in core; callers should use spawn_blocking when invoking from
/// async contexts.
pub trait QuoteSource {
    /// Return the raw dataset text.
    fn read_raw(&self) -> Result<String, SourceError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

impl<T: QuoteSource + ?Sized> QuoteSource for std::sync::Arc<T> {
    fn read_raw(&self) -> Result<String, SourceError> {
        (**self).read_raw()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
