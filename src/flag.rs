use crate::Loader;
use crate::environment::EnvironmentLoader;
use crate::error::Error;
use crate::field::{Field, Leaf};
use crate::naming::{KeyRegistry, KeyStyle, WordStyle};
use crate::value::{RawValue, Shape};
use crate::walk::{self, FieldPath, Visitor};
use clap::{Arg, ArgAction, ArgMatches, Command, error::ErrorKind};
use std::{collections::HashSet, env, fmt, sync::Arc};
use tracing::{debug, trace};

/// What the flag loader does when the arguments cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagErrorHandling {
    /// Return [`Error::Flags`] or [`Error::Help`]
    #[default]
    Return,
    /// Print the message and exit the process
    Exit,
    /// Panic with the message
    Panic,
}

/// A command-line flag generated for one leaf field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Long name, without leading dashes
    pub name: String,
    pub usage: String,
    /// Bool flags take no value: `--enabled`, or `--enabled=false`
    pub is_bool: bool,
    /// Dotted field path, e.g. `postgres.db_name`
    pub path: String,
    pub default: Option<&'static str>,
}

type UsageFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Loads fields from command-line flags named `--record-field`.
///
/// Both `--name value` and the single-dash `-name value` forms are accepted.
/// Parsing stops at the first argument that is not a flag, so subcommands and
/// positional arguments after the flags are left to the caller. A field named
/// `help` takes over `--help` from the generated help flag.
///
/// # Example
/// ```rust
/// use multiload::{Config, FlagLoader, Loader};
///
/// #[derive(Debug, Default, Config)]
/// pub struct Server {
///     pub name: String,
///     pub port: u16,
///     pub debug: bool,
/// }
///
/// let loader = FlagLoader::new().with_args(["-name", "koding", "--port=8080", "--debug"]);
///
/// let mut server = Server::default();
/// loader.load(&mut server).unwrap();
/// assert_eq!(server.name, "koding");
/// assert_eq!(server.port, 8080);
/// assert!(server.debug);
/// ```
#[derive(Clone)]
pub struct FlagLoader {
    pub style: KeyStyle,
    /// Prefix of the environment variables listed in the help output
    pub env_prefix: Option<String>,
    pub error_handling: FlagErrorHandling,
    /// Arguments to parse instead of the process arguments
    pub args: Option<Vec<String>>,
    /// Overrides the usage text of every flag; receives the field name
    pub usage_fn: Option<UsageFn>,
}

impl fmt::Debug for FlagLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagLoader")
            .field("style", &self.style)
            .field("env_prefix", &self.env_prefix)
            .field("error_handling", &self.error_handling)
            .field("args", &self.args)
            .field("usage_fn", &self.usage_fn.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Default for FlagLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagLoader {
    pub fn new() -> Self {
        Self {
            style: KeyStyle::flag(),
            env_prefix: None,
            error_handling: FlagErrorHandling::Return,
            args: None,
            usage_fn: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.style.prefix = Some(prefix.into());
        self
    }

    /// Split field names on word boundaries: `AccessKey` -> `--access-key`
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

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn with_error_handling(mut self, handling: FlagErrorHandling) -> Self {
        self.error_handling = handling;
        self
    }

    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_usage_fn(mut self, usage: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.usage_fn = Some(Arc::new(usage));
        self
    }

    /// Every flag this loader registers for `target`, in field order
    pub fn flag_specs(&self, target: &mut dyn Field) -> Result<Vec<FlagSpec>, Error> {
        walk::root_name(target)?;
        let mut planner = Planner {
            loader: self,
            registry: KeyRegistry::default(),
            specs: Vec::new(),
        };
        walk::walk(target, &mut planner)?;
        Ok(planner.specs)
    }

    fn usage(&self, path: &FieldPath) -> String {
        let info = path.leaf();
        let segment = self.style.segment(info.name);

        if let Some(usage_fn) = &self.usage_fn {
            return usage_fn(&segment);
        }
        if let Some(usage) = info.flag_usage {
            return usage.to_string();
        }
        format!("Change value of {segment}.")
    }

    fn command(
        &self,
        type_name: &'static str,
        specs: &[FlagSpec],
        target: &mut dyn Field,
    ) -> Result<Command, Error> {
        let mut command = Command::new(type_name)
            .no_binary_name(true)
            .args_override_self(true)
            .disable_version_flag(true)
            .disable_help_flag(specs.iter().any(|spec| spec.name == "help"));

        if let Some(prefix) = &self.env_prefix {
            let env = EnvironmentLoader::new()
                .with_prefix(prefix.clone())
                .with_word_split(self.style.words == WordStyle::Split);
            let keys = env
                .env_keys(target)?
                .into_iter()
                .map(|k| format!("  {}", k.key))
                .collect::<Vec<_>>()
                .join("\n");
            command = command.after_help(format!("Generated environment variables:\n{keys}"));
        }

        for spec in specs {
            let arg = Arg::new(spec.name.clone())
                .long(spec.name.clone())
                .help(spec.usage.clone())
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(String));

            let arg = if spec.is_bool {
                arg.num_args(0..=1)
                    .require_equals(true)
                    .default_missing_value("true")
            } else {
                arg.num_args(1).allow_hyphen_values(true)
            };
            command = command.arg(arg);
        }

        Ok(command)
    }

    fn parse(&self, command: Command, specs: &[FlagSpec]) -> Result<ArgMatches, Error> {
        let raw = match &self.args {
            Some(args) => args.clone(),
            None => env::args().skip(1).collect(),
        };
        let (args, rest) = normalize_args(raw, specs);
        if !rest.is_empty() {
            trace!(remaining = rest.len(), "stopped at first non-flag argument");
        }

        match command.try_get_matches_from(args) {
            Ok(matches) => Ok(matches),
            Err(err) => match self.error_handling {
                FlagErrorHandling::Exit => err.exit(),
                FlagErrorHandling::Panic => panic!("{}", err.render()),
                FlagErrorHandling::Return if err.kind() == ErrorKind::DisplayHelp => {
                    Err(Error::Help {
                        usage: err.render().to_string(),
                    })
                }
                FlagErrorHandling::Return => Err(Error::Flags {
                    message: err.render().to_string().trim_end().to_string(),
                }),
            },
        }
    }
}

impl Loader for FlagLoader {
    fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        let type_name = walk::root_name(target)?;
        let specs = self.flag_specs(target)?;
        let command = self.command(type_name, &specs, target)?;
        let matches = self.parse(command, &specs)?;

        debug!(
            loader = "flag",
            record = type_name,
            flags = specs.len(),
            "loading command-line flags"
        );

        let mut applier = Applier {
            style: &self.style,
            matches: &matches,
            applied: 0,
        };
        walk::walk(target, &mut applier)?;

        debug!(loader = "flag", record = type_name, applied = applier.applied, "done");
        Ok(())
    }
}

/// Rewrites `-name` into `--name` so single-dash long flags reach clap.
///
/// Parsing stops at the first non-flag argument or after a `--` terminator;
/// those arguments are returned separately and never parsed. Values of flags
/// that take one are left alone.
fn normalize_args(args: Vec<String>, specs: &[FlagSpec]) -> (Vec<String>, Vec<String>) {
    let takes_value: HashSet<&str> = specs
        .iter()
        .filter(|spec| !spec.is_bool)
        .map(|spec| spec.name.as_str())
        .collect();

    let mut normalized = Vec::with_capacity(args.len());
    let mut expect_value = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if expect_value {
            expect_value = false;
            normalized.push(arg);
            continue;
        }
        if arg == "--" {
            break;
        }
        if arg == "-" || !arg.starts_with('-') {
            let mut rest = vec![arg];
            rest.extend(args);
            return (normalized, rest);
        }

        let arg = match arg.strip_prefix('-') {
            Some(name) if !name.is_empty() && !name.starts_with('-') => format!("--{name}"),
            _ => arg,
        };

        if let Some(name) = arg.strip_prefix("--")
            && !name.contains('=')
        {
            expect_value = takes_value.contains(name);
        }
        normalized.push(arg);
    }

    (normalized, args.collect())
}

struct Planner<'a> {
    loader: &'a FlagLoader,
    registry: KeyRegistry,
    specs: Vec<FlagSpec>,
}

impl Visitor for Planner<'_> {
    fn leaf(&mut self, path: &FieldPath, leaf: Leaf<'_>) -> Result<bool, Error> {
        let name = self.loader.style.resolve_path(None, path);
        let dotted = path.dotted();
        let flattened = self.loader.style.is_flattened(path);
        self.registry.claim(&name, &dotted, flattened)?;

        self.specs.push(FlagSpec {
            usage: self.loader.usage(path),
            is_bool: leaf.shape() == Shape::Bool,
            default: path.leaf().default,
            path: dotted,
            name,
        });
        Ok(false)
    }
}

struct Applier<'a> {
    style: &'a KeyStyle,
    matches: &'a ArgMatches,
    applied: usize,
}

impl Visitor for Applier<'_> {
    fn leaf(&mut self, path: &FieldPath, mut leaf: Leaf<'_>) -> Result<bool, Error> {
        let name = self.style.resolve_path(None, path);
        let value = self
            .matches
            .try_get_one::<String>(&name)
            .map_err(|e| Error::Flags {
                message: e.to_string(),
            })?;

        let Some(value) = value else {
            return Ok(false);
        };

        leaf.set(&RawValue::Text(value.clone()))
            .map_err(|e| Error::coercion(path.dotted(), &name, value, e))?;
        trace!(flag = %name, field = %path.dotted(), "applied flag");
        self.applied += 1;
        Ok(true)
    }
}
