use crate::Loader;
use crate::error::Error;
use crate::field::{Field, Leaf};
use crate::value::RawValue;
use crate::walk::{self, FieldPath, Visitor};
use tracing::{debug, trace};

/// Applies `#[config(default = ...)]` literals to fields that still hold a zero value.
///
/// # Example
/// ```rust
/// use multiload::{Config, Loader, TagLoader};
///
/// #[derive(Debug, Default, Config)]
/// pub struct Server {
///     #[config(default = 6060)]
///     pub port: i32,
/// }
///
/// let mut server = Server::default();
/// TagLoader::new().load(&mut server).unwrap();
/// assert_eq!(server.port, 6060);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagLoader;

impl TagLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Loader for TagLoader {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        let type_name = walk::root_name(target)?;
        debug!(loader = "tag", record = type_name, "applying default tags");

        let mut applier = Applier { applied: 0 };
        walk::walk(target, &mut applier)?;

        debug!(loader = "tag", record = type_name, applied = applier.applied, "done");
        Ok(())
    }
}

struct Applier {
    applied: usize,
}

impl Visitor for Applier {
    fn leaf(&mut self, path: &FieldPath, mut leaf: Leaf<'_>) -> Result<bool, Error> {
        let info = path.leaf();
        let Some(default) = info.default else {
            return Ok(false);
        };
        if !leaf.is_zero() {
            return Ok(false);
        }

        leaf.set(&RawValue::from(default))
            .map_err(|e| Error::coercion(path.dotted(), "default", default, e))?;
        trace!(field = %path.dotted(), "applied default tag");
        self.applied += 1;
        Ok(true)
    }
}
