pub use crate::types::UserFinderError;

pub type Result<T> = std::result::Result<T, UserFinderError>;

pub trait ErrorContext<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    fn with_catalog_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| UserFinderError::ConfigError(format!("{}: {}", f(), e)))
    }

    fn with_catalog_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| UserFinderError::CatalogError(format!("{}: {}", f(), e)))
    }
}
