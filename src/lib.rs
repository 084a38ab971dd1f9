extern crate self as multiload;

pub mod builder;
pub mod docs;
pub mod environment;
pub mod error;
pub mod field;
pub mod file;
pub mod flag;
pub mod hook;
pub mod macros;
pub mod multi;
pub mod naming;
pub mod tag;
pub mod validate;
pub mod value;
pub mod walk;

// Re-export main types
pub use builder::DefaultLoader;
pub use docs::FieldDoc;
pub use environment::{EnvKey, EnvSource, EnvironmentLoader};
pub use error::{Error, ParseError, TargetError, format_errors};
pub use field::{
    ApplyDefaults, BoxError, Config, Field, FieldInfo, FieldRef, Leaf, Node, OptionalField,
    Settable,
};
pub use file::{FileLoader, Format};
pub use flag::{FlagErrorHandling, FlagLoader, FlagSpec};
pub use hook::HookLoader;
pub use multi::MultiLoader;
pub use naming::{KeyStyle, LetterCase, WordStyle};
pub use tag::TagLoader;
pub use validate::{MultiValidator, RequiredValidator, Validator};
pub use value::{RawValue, Scalar, Shape, Value};
pub use walk::{FieldPath, Visitor};

// Re-export derive macro
pub use multiload_macros::Config;

/// A source that populates the fields of a record
pub trait Loader {
    /// Populate `target` from this source. `target` must be a record, or an
    /// optional record that holds one.
    fn load(&self, target: &mut dyn Field) -> Result<(), Error>;
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        (**self).load(target)
    }
}

impl<L: Loader + ?Sized> Loader for &L {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        (**self).load(target)
    }
}
