use crate::error::{Error, ParseError};
use crate::value::{RawValue, Shape, Value};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Static metadata for one record field, generated by `#[derive(Config)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldInfo {
    /// Declared field name, used to build source keys
    pub name: &'static str,
    /// Literal from `#[config(default = ...)]`
    pub default: Option<&'static str>,
    /// Whether a zero value fails validation
    pub required: bool,
    /// Help text for the generated command-line flag
    pub flag_usage: Option<&'static str>,
    /// Children of this field are named without this field's name
    pub flatten: bool,
}

impl FieldInfo {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            required: false,
            flag_usage: None,
            flatten: false,
        }
    }
}

/// One field of a record, paired with a mutable handle into the live value
pub struct FieldRef<'a> {
    pub info: &'static FieldInfo,
    pub field: &'a mut dyn Field,
}

impl<'a> FieldRef<'a> {
    pub fn new(info: &'static FieldInfo, field: &'a mut dyn Field) -> Self {
        Self { info, field }
    }
}

/// How the walker should treat a field
pub enum Node<'a> {
    /// Coerced directly by a built-in rule
    Leaf(&'a mut dyn Value),
    /// Coerced by the type's own [`Settable`] implementation
    Custom(&'a mut dyn Settable),
    /// Recursed into field by field
    Record(&'a mut dyn Config),
    /// Possibly absent; allocated on first write
    Optional(&'a mut dyn OptionalField),
}

/// Anything that can sit in a record field
pub trait Field {
    fn node(&mut self) -> Node<'_>;
}

/// A record whose public fields are populated by loaders.
///
/// Usually implemented with `#[derive(Config)]`:
///
/// ```rust
/// use multiload::Config;
///
/// #[derive(Debug, Default, Config)]
/// pub struct Postgres {
///     #[config(default = 5432)]
///     pub port: u16,
///     #[config(required)]
///     pub hosts: Vec<String>,
/// }
/// ```
pub trait Config {
    /// Name of the record type, the default environment prefix
    fn type_name(&self) -> &'static str;

    /// Public fields in declaration order
    fn fields(&mut self) -> Vec<FieldRef<'_>>;

    /// Run the record's [`ApplyDefaults`] hooks, returning whether any ran
    fn apply_defaults(&mut self) -> bool {
        false
    }
}

/// A type that parses itself from a string and is always treated as a leaf.
///
/// Register the type as a field with [`impl_settable!`](crate::impl_settable).
pub trait Settable {
    fn set_from_str(&mut self, raw: &str) -> Result<(), BoxError>;

    fn render(&self) -> String;

    fn is_zero(&self) -> bool;
}

/// Post-load hook, run innermost record first by [`HookLoader`](crate::HookLoader)
pub trait ApplyDefaults {
    fn apply_defaults(&mut self);
}

/// A field that may hold nothing yet
pub trait OptionalField {
    fn is_none(&self) -> bool;

    /// Hands the current value to `visit`, or a fresh default that is kept only
    /// when `visit` reports a write
    fn with_slot(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Field) -> Result<bool, Error>,
    ) -> Result<bool, Error>;
}

impl<T: Field + Default> OptionalField for Option<T> {
    fn is_none(&self) -> bool {
        Option::is_none(self)
    }

    fn with_slot(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn Field) -> Result<bool, Error>,
    ) -> Result<bool, Error> {
        match self {
            Some(inner) => visit(inner),
            None => {
                let mut fresh = T::default();
                let wrote = visit(&mut fresh)?;
                if wrote {
                    *self = Some(fresh);
                }
                Ok(wrote)
            }
        }
    }
}

impl<T: Field + Default> Field for Option<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Optional(self)
    }
}

impl<T: Field + ?Sized> Field for Box<T> {
    fn node(&mut self) -> Node<'_> {
        (**self).node()
    }
}

/// A leaf reached by the walker
pub enum Leaf<'a> {
    Value(&'a mut dyn Value),
    Custom(&'a mut dyn Settable),
}

impl Leaf<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            Leaf::Value(value) => value.shape(),
            Leaf::Custom(_) => Shape::Custom,
        }
    }

    pub fn set(&mut self, raw: &RawValue) -> Result<(), ParseError> {
        match self {
            Leaf::Value(value) => value.set(raw),
            Leaf::Custom(custom) => match raw {
                RawValue::Text(text) => custom
                    .set_from_str(text)
                    .map_err(|e| ParseError::Custom(e.to_string())),
                other => Err(ParseError::Unsupported {
                    shape: Shape::Custom,
                    found: other.kind(),
                }),
            },
        }
    }

    pub fn render(&self) -> String {
        match self {
            Leaf::Value(value) => value.render(),
            Leaf::Custom(custom) => custom.render(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Leaf::Value(value) => value.is_zero(),
            Leaf::Custom(custom) => custom.is_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Url(Option<String>);

    impl Settable for Url {
        fn set_from_str(&mut self, raw: &str) -> Result<(), BoxError> {
            if !raw.contains("://") {
                return Err(format!("missing scheme in {raw}").into());
            }
            self.0 = Some(raw.to_string());
            Ok(())
        }

        fn render(&self) -> String {
            self.0.clone().unwrap_or_default()
        }

        fn is_zero(&self) -> bool {
            self.0.is_none()
        }
    }

    #[test]
    fn test_field_info_new() {
        const INFO: FieldInfo = FieldInfo::new("port");

        assert_eq!(INFO.name, "port");
        assert_eq!(INFO.default, None);
        assert!(!INFO.required);
        assert!(!INFO.flatten);
    }

    #[test]
    fn test_custom_leaf_error_is_verbatim() {
        let mut url = Url::default();
        let mut leaf = Leaf::Custom(&mut url);

        let err = leaf.set(&RawValue::from("localhost")).unwrap_err();
        assert_eq!(
            err,
            ParseError::Custom("missing scheme in localhost".to_string())
        );
        assert!(leaf.is_zero());
    }

    #[test]
    fn test_custom_leaf_set() {
        let mut url = Url::default();
        let mut leaf = Leaf::Custom(&mut url);

        leaf.set(&RawValue::from("http://127.0.0.1/kloud/kite"))
            .unwrap();
        assert_eq!(leaf.render(), "http://127.0.0.1/kloud/kite");
        assert_eq!(leaf.shape(), Shape::Custom);
    }

    #[test]
    fn test_custom_leaf_rejects_entries() {
        let mut url = Url::default();
        let mut leaf = Leaf::Custom(&mut url);

        assert!(matches!(
            leaf.set(&RawValue::Entries(Vec::new())),
            Err(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_optional_slot_kept_only_on_write() {
        let mut port: Option<u16> = None;

        let wrote = port.with_slot(&mut |_| Ok(false)).unwrap();
        assert!(!wrote);
        assert_eq!(port, None);

        let wrote = port
            .with_slot(&mut |field| match field.node() {
                Node::Leaf(value) => {
                    value.set(&RawValue::from("5432")).unwrap();
                    Ok(true)
                }
                _ => Ok(false),
            })
            .unwrap();
        assert!(wrote);
        assert_eq!(port, Some(5432));
    }

    #[test]
    fn test_box_delegates_node() {
        let mut boxed: Box<u16> = Box::new(1);
        match boxed.node() {
            Node::Leaf(value) => assert_eq!(value.render(), "1"),
            _ => panic!("Expected a leaf"),
        }
    }
}
