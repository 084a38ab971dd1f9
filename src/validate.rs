use crate::error::Error;
use crate::field::{Field, Leaf};
use crate::walk::{self, FieldPath, Visitor};
use tracing::debug;

/// Checks a record after every loader has run
pub trait Validator {
    fn validate(&self, target: &mut dyn Field) -> Result<(), Error>;
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn validate(&self, target: &mut dyn Field) -> Result<(), Error> {
        (**self).validate(target)
    }
}

/// Rejects zero values in fields marked `#[config(required)]`.
///
/// Every violation is collected: a single one is returned as
/// [`Error::RequiredMissing`], several as [`Error::Multiple`] in field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredValidator;

impl RequiredValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for RequiredValidator {
    fn validate(&self, target: &mut dyn Field) -> Result<(), Error> {
        let type_name = walk::root_name(target)?;
        let mut checker = Checker::default();
        walk::walk(target, &mut checker)?;

        debug!(
            validator = "required",
            record = type_name,
            missing = checker.missing.len(),
            "validated required fields"
        );

        let mut missing = checker.missing;
        match missing.len() {
            0 => Ok(()),
            1 => Err(missing.remove(0)),
            _ => Err(Error::Multiple(missing)),
        }
    }
}

#[derive(Default)]
struct Checker {
    missing: Vec<Error>,
}

impl Visitor for Checker {
    fn leaf(&mut self, path: &FieldPath, leaf: Leaf<'_>) -> Result<bool, Error> {
        if path.leaf().required && leaf.is_zero() {
            self.missing.push(Error::RequiredMissing {
                path: path.dotted(),
            });
        }
        Ok(false)
    }

    fn empty_optional(&mut self, path: &FieldPath) -> Result<bool, Error> {
        if path.leaf().required {
            self.missing.push(Error::RequiredMissing {
                path: path.dotted(),
            });
        }
        Ok(false)
    }
}

/// Runs validators in order; the first failure is returned
#[derive(Default)]
pub struct MultiValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl MultiValidator {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl Validator for MultiValidator {
    fn validate(&self, target: &mut dyn Field) -> Result<(), Error> {
        for validator in &self.validators {
            validator.validate(target)?;
        }
        Ok(())
    }
}
