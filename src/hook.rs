use crate::Loader;
use crate::error::Error;
use crate::field::{Config, Field, Leaf};
use crate::walk::{self, FieldPath, Visitor};
use tracing::{debug, trace};

/// Runs [`ApplyDefaults`](crate::ApplyDefaults) hooks, innermost record first.
///
/// Records opt in with `#[config(apply_defaults)]` on the struct; leaf fields
/// whose type implements the hook opt in with the same attribute on the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookLoader;

impl HookLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Loader for HookLoader {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        let type_name = walk::root_name(target)?;
        let mut runner = Runner { ran: 0 };
        walk::walk(target, &mut runner)?;

        debug!(loader = "hook", record = type_name, ran = runner.ran, "applied defaults hooks");
        Ok(())
    }
}

struct Runner {
    ran: usize,
}

impl Visitor for Runner {
    fn leaf(&mut self, _path: &FieldPath, _leaf: Leaf<'_>) -> Result<bool, Error> {
        Ok(false)
    }

    fn record_done(&mut self, path: &FieldPath, record: &mut dyn Config) -> Result<bool, Error> {
        let ran = record.apply_defaults();
        if ran {
            trace!(record = record.type_name(), field = %path.dotted(), "ran defaults hook");
            self.ran += 1;
        }
        Ok(ran)
    }
}
