/// Registers a [`Settable`](crate::Settable) type as a leaf field.
///
/// # Example
/// ```rust
/// use multiload::{BoxError, Config, Settable, impl_settable};
///
/// #[derive(Debug, Default)]
/// pub struct Url(String);
///
/// impl Settable for Url {
///     fn set_from_str(&mut self, raw: &str) -> Result<(), BoxError> {
///         if !raw.contains("://") {
///             return Err(format!("missing scheme in {raw}").into());
///         }
///         self.0 = raw.to_string();
///         Ok(())
///     }
///
///     fn render(&self) -> String {
///         self.0.clone()
///     }
///
///     fn is_zero(&self) -> bool {
///         self.0.is_empty()
///     }
/// }
///
/// impl_settable!(Url);
///
/// #[derive(Debug, Default, Config)]
/// pub struct Kite {
///     pub url: Url,
/// }
/// ```
#[macro_export]
macro_rules! impl_settable {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Field for $ty {
            fn node(&mut self) -> $crate::Node<'_> {
                $crate::Node::Custom(self)
            }
        }
    )+};
}

/// Builds a [`MultiLoader`](crate::MultiLoader) from a list of loaders.
///
/// ```rust
/// use multiload::{EnvironmentLoader, TagLoader, multi_loader};
///
/// let loader = multi_loader![TagLoader::new(), EnvironmentLoader::new()];
/// assert_eq!(loader.len(), 2);
/// ```
#[macro_export]
macro_rules! multi_loader {
    ($($loader:expr),* $(,)?) => {
        $crate::MultiLoader::new(::std::vec![
            $(::std::boxed::Box::new($loader) as ::std::boxed::Box<dyn $crate::Loader>),*
        ])
    };
}
