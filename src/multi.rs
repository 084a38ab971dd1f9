use crate::Loader;
use crate::error::Error;
use crate::field::Field;
use tracing::debug;

/// Runs loaders in order; later loaders overwrite what earlier ones set.
///
/// The first error stops the chain and is returned unchanged. Fields written
/// before the failure keep their new values.
#[derive(Default)]
pub struct MultiLoader {
    loaders: Vec<Box<dyn Loader>>,
}

impl MultiLoader {
    pub fn new(loaders: Vec<Box<dyn Loader>>) -> Self {
        Self { loaders }
    }

    /// Appends a loader to the end of the chain
    pub fn with(mut self, loader: impl Loader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl Loader for MultiLoader {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        for (index, loader) in self.loaders.iter().enumerate() {
            debug!(loader = index, total = self.loaders.len(), "running loader");
            loader.load(target)?;
        }
        Ok(())
    }
}
