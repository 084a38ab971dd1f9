use crate::Loader;
use crate::error::Error;
use crate::field::{Field, Leaf};
use crate::naming::{KeyRegistry, KeyStyle, WordStyle};
use crate::value::{RawValue, Shape};
use crate::walk::{self, FieldPath, Visitor};
use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

/// Where environment variables are read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvSource {
    /// The process environment
    #[default]
    Process,
    /// A fixed set of variables
    Vars(HashMap<String, String>),
}

/// One resolved environment variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvKey {
    pub key: String,
    /// Dotted field path, e.g. `postgres.port`
    pub path: String,
    pub shape: Shape,
}

/// Loads fields from environment variables named `PREFIX_RECORD_FIELD`.
///
/// The prefix defaults to the record's type name. Two fields that resolve to the
/// same key both read it, unless one of them is flattened, which is rejected
/// with [`Error::DuplicateKey`].
///
/// # Example
/// ```rust
/// use multiload::{Config, EnvironmentLoader, Loader};
///
/// #[derive(Debug, Default, Config)]
/// pub struct Postgres {
///     pub port: u16,
/// }
///
/// #[derive(Debug, Default, Config)]
/// pub struct Server {
///     pub postgres: Postgres,
/// }
///
/// let loader = EnvironmentLoader::new()
///     .with_prefix("Prefix")
///     .with_vars([("PREFIX_POSTGRES_PORT", "5432")]);
///
/// let mut server = Server::default();
/// loader.load(&mut server).unwrap();
/// assert_eq!(server.postgres.port, 5432);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLoader {
    pub style: KeyStyle,
    pub source: EnvSource,
    /// A `.env` file consulted for keys the source does not have
    pub dotenv: Option<PathBuf>,
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentLoader {
    pub fn new() -> Self {
        Self {
            style: KeyStyle::env(),
            source: EnvSource::Process,
            dotenv: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.style.prefix = Some(prefix.into());
        self
    }

    /// Split field names on word boundaries: `access_key`, `AccessKey` -> `ACCESS_KEY`
    pub fn with_word_split(mut self, enabled: bool) -> Self {
        self.style.words = if enabled {
            WordStyle::Split
        } else {
            WordStyle::Verbatim
        };
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.style.separator = separator.into();
        self
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.style.flatten = flatten;
        self
    }

    /// Read from `vars` instead of the process environment
    pub fn with_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.source = EnvSource::Vars(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_dotenv(mut self, path: impl AsRef<Path>) -> Self {
        self.dotenv = Some(path.as_ref().to_path_buf());
        self
    }

    /// The prefix used for a record named `type_name`
    pub fn prefix_for<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.style.explicit_prefix().unwrap_or(type_name)
    }

    /// Every variable this loader would read for `target`, in field order
    pub fn env_keys(&self, target: &mut dyn Field) -> Result<Vec<EnvKey>, Error> {
        let type_name = walk::root_name(target)?;
        let mut planner = Planner {
            style: &self.style,
            prefix: self.prefix_for(type_name),
            registry: KeyRegistry::shared(),
            keys: Vec::new(),
        };
        walk::walk(target, &mut planner)?;
        Ok(planner.keys)
    }

    fn file_vars(&self) -> Result<HashMap<String, String>, Error> {
        let Some(path) = &self.dotenv else {
            return Ok(HashMap::new());
        };

        let unavailable = |reason: String| Error::SourceUnavailable {
            path: path.clone(),
            reason,
        };

        dotenvy::from_path_iter(path)
            .map_err(|e| unavailable(e.to_string()))?
            .map(|item| item.map_err(|e| unavailable(e.to_string())))
            .collect()
    }

    fn lookup(&self, key: &str, file_vars: &HashMap<String, String>) -> Option<String> {
        let value = match &self.source {
            EnvSource::Process => env::var(key).ok(),
            EnvSource::Vars(vars) => vars.get(key).cloned(),
        };
        value.or_else(|| file_vars.get(key).cloned())
    }
}

impl Loader for EnvironmentLoader {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        let type_name = walk::root_name(target)?;
        // Resolve every key before writing anything so collisions fail fast.
        let keys = self.env_keys(target)?;
        let file_vars = self.file_vars()?;

        debug!(
            loader = "env",
            record = type_name,
            keys = keys.len(),
            "loading environment variables"
        );

        let mut applier = Applier {
            loader: self,
            prefix: self.prefix_for(type_name),
            file_vars,
            applied: 0,
        };
        walk::walk(target, &mut applier)?;

        debug!(loader = "env", record = type_name, applied = applier.applied, "done");
        Ok(())
    }
}

struct Planner<'a> {
    style: &'a KeyStyle,
    prefix: &'a str,
    registry: KeyRegistry,
    keys: Vec<EnvKey>,
}

impl Visitor for Planner<'_> {
    fn leaf(&mut self, path: &FieldPath, leaf: Leaf<'_>) -> Result<bool, Error> {
        let key = self.style.resolve_path(Some(self.prefix), path);
        let dotted = path.dotted();
        self.registry.claim(&key, &dotted, self.style.is_flattened(path))?;
        self.keys.push(EnvKey {
            key,
            path: dotted,
            shape: leaf.shape(),
        });
        Ok(false)
    }
}

struct Applier<'a> {
    loader: &'a EnvironmentLoader,
    prefix: &'a str,
    file_vars: HashMap<String, String>,
    applied: usize,
}

impl Applier<'_> {
    /// Root-level maps may also be given as `_FIELD`, without any prefix
    fn bare_map_key(&self, path: &FieldPath) -> String {
        let style = &self.loader.style;
        format!(
            "{}{}",
            style.separator,
            style.resolve(None, &[], path.leaf().name)
        )
    }
}

impl Visitor for Applier<'_> {
    fn leaf(&mut self, path: &FieldPath, mut leaf: Leaf<'_>) -> Result<bool, Error> {
        let shape = leaf.shape();
        let mut key = self.loader.style.resolve_path(Some(self.prefix), path);
        let mut value = self.loader.lookup(&key, &self.file_vars);

        if value.is_none() && shape == Shape::Mapping && path.depth() == 1 {
            key = self.bare_map_key(path);
            value = self.loader.lookup(&key, &self.file_vars);
        }

        let Some(value) = value else {
            return Ok(false);
        };
        if value.is_empty() && !shape.accepts_empty() {
            return Ok(false);
        }

        leaf.set(&RawValue::Text(value.clone()))
            .map_err(|e| Error::coercion(path.dotted(), &key, &value, e))?;
        trace!(key = %key, field = %path.dotted(), "applied environment variable");
        self.applied += 1;
        Ok(true)
    }
}
