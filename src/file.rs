use crate::Loader;
use crate::error::Error;
use crate::field::{Field, Leaf};
use crate::value::RawValue;
use crate::walk::{self, FieldPath, Visitor};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Encoding of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from the file extension: `.toml`, `.json`, `.yaml` or `.yml`
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    fn decode(self, content: &str) -> Result<Value, String> {
        match self {
            #[cfg(feature = "toml")]
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            #[cfg(feature = "json")]
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            #[cfg(feature = "yaml")]
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            #[allow(unreachable_patterns)]
            other => Err(format!("{other:?} support is not enabled")),
        }
    }
}

/// Loads fields from a TOML, JSON or YAML file.
///
/// Tables map to records by field name. Names are matched exactly first,
/// then ignoring case, `_` and `-`, so `dbName` and `db-name` both fill `db_name`.
///
/// # Example
/// ```no_run
/// use multiload::{Config, FileLoader, Loader};
///
/// #[derive(Debug, Default, Config)]
/// pub struct Server {
///     pub name: String,
///     pub port: u16,
/// }
///
/// let mut server = Server::default();
/// FileLoader::new("config.toml").load(&mut server).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoader {
    pub path: PathBuf,
    /// Overrides detection by extension
    pub format: Option<Format>,
}

impl FileLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    fn read(&self) -> Result<Value, Error> {
        let unavailable = |reason: String| Error::SourceUnavailable {
            path: self.path.clone(),
            reason,
        };

        let format = self
            .format
            .or_else(|| Format::from_path(&self.path))
            .ok_or_else(|| unavailable("unknown file format".to_string()))?;
        let content = std::fs::read_to_string(&self.path).map_err(|e| unavailable(e.to_string()))?;

        format.decode(&content).map_err(unavailable)
    }
}

impl Loader for FileLoader {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        let type_name = walk::root_name(target)?;
        let tree = self.read()?;

        debug!(
            loader = "file",
            record = type_name,
            path = %self.path.display(),
            "loading configuration file"
        );

        let mut applier = Applier {
            tree: &tree,
            applied: 0,
        };
        walk::walk(target, &mut applier)?;

        debug!(loader = "file", record = type_name, applied = applier.applied, "done");
        Ok(())
    }
}

struct Applier<'a> {
    tree: &'a Value,
    applied: usize,
}

impl Applier<'_> {
    fn lookup(&self, path: &FieldPath) -> Option<&Value> {
        let mut node = self.tree;
        for info in path.ancestors() {
            if !info.flatten {
                node = child(node, info.name)?;
            }
        }
        child(node, path.leaf().name)
    }
}

impl Visitor for Applier<'_> {
    fn leaf(&mut self, path: &FieldPath, mut leaf: Leaf<'_>) -> Result<bool, Error> {
        let Some(raw) = self.lookup(path).and_then(to_raw) else {
            return Ok(false);
        };

        let key = path.dotted();
        leaf.set(&raw)
            .map_err(|e| Error::coercion(key.clone(), &key, &raw.to_string(), e))?;
        trace!(field = %key, "applied file value");
        self.applied += 1;
        Ok(true)
    }
}

fn child<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    let table = node.as_object()?;
    if let Some(value) = table.get(name) {
        return Some(value);
    }

    let wanted = normalize(name);
    table
        .iter()
        .find(|(key, _)| normalize(key) == wanted)
        .map(|(_, value)| value)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn to_raw(value: &Value) -> Option<RawValue> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(RawValue::List(items.iter().map(to_text).collect())),
        Value::Object(table) => Some(RawValue::Entries(
            table
                .iter()
                .map(|(key, value)| (key.clone(), to_text(value)))
                .collect(),
        )),
        scalar => Some(RawValue::Text(to_text(scalar))),
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
