use crate::error::{Error, format_errors};
use crate::field::Field;
use crate::validate::{RequiredValidator, Validator};
use crate::{EnvironmentLoader, FileLoader, FlagLoader, Loader, TagLoader};
use std::path::Path;

/// The usual chain: tag defaults, an optional file, environment variables and
/// command-line flags, followed by required-field validation.
///
/// # Example
/// ```rust
/// use multiload::{Config, DefaultLoader, EnvironmentLoader, FlagLoader};
///
/// #[derive(Debug, Default, Config)]
/// pub struct Server {
///     #[config(default = 6060)]
///     pub port: u16,
///     #[config(required)]
///     pub name: String,
/// }
///
/// let loader = DefaultLoader::new()
///     .with_env(EnvironmentLoader::new().with_vars([("SERVER_NAME", "koding")]))
///     .with_flags(FlagLoader::new().with_args(["--port", "8080"]));
///
/// let mut server = Server::default();
/// loader.load(&mut server).unwrap();
/// loader.validate(&mut server).unwrap();
/// assert_eq!(server.port, 8080);
/// ```
pub struct DefaultLoader {
    pub tag: TagLoader,
    pub file: Option<FileLoader>,
    pub env: EnvironmentLoader,
    pub flag: FlagLoader,
    pub validator: Box<dyn Validator>,
}

impl DefaultLoader {
    pub fn new() -> Self {
        Self {
            tag: TagLoader::new(),
            file: None,
            env: EnvironmentLoader::new(),
            flag: FlagLoader::new(),
            validator: Box::new(RequiredValidator::new()),
        }
    }

    /// Like [`new`](Self::new), with a file read right after the tag defaults
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            file: Some(FileLoader::new(path)),
            ..Self::new()
        }
    }

    /// Replaces the environment loader; its prefix also labels the flag help output
    pub fn with_env(mut self, env: EnvironmentLoader) -> Self {
        if self.flag.env_prefix.is_none() {
            self.flag.env_prefix = env.style.explicit_prefix().map(str::to_string);
        }
        self.env = env;
        self
    }

    pub fn with_flags(mut self, flag: FlagLoader) -> Self {
        let env_prefix = self.flag.env_prefix.take();
        self.flag = flag;
        if self.flag.env_prefix.is_none() {
            self.flag.env_prefix = env_prefix;
        }
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    fn loaders(&self) -> Vec<&dyn Loader> {
        let mut loaders: Vec<&dyn Loader> = vec![&self.tag];
        if let Some(file) = &self.file {
            loaders.push(file);
        }
        loaders.push(&self.env);
        loaders.push(&self.flag);
        loaders
    }

    /// Runs every loader in order, stopping at the first error
    pub fn load(&self, target: &mut dyn Field) -> Result<(), Error> {
        for loader in self.loaders() {
            loader.load(target)?;
        }
        Ok(())
    }

    pub fn validate(&self, target: &mut dyn Field) -> Result<(), Error> {
        self.validator.validate(target)
    }

    /// Loads and validates `target`, panicking with a summary of every error.
    ///
    /// A `--help` request prints the usage and exits the process.
    pub fn must_load(&self, target: &mut dyn Field) {
        if let Err(err) = self.load(target) {
            fail(err);
        }
        self.must_validate(target);
    }

    /// Validates `target`, panicking with a summary of every error
    pub fn must_validate(&self, target: &mut dyn Field) {
        if let Err(err) = self.validate(target) {
            fail(err);
        }
    }
}

impl Default for DefaultLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn fail(err: Error) -> ! {
    match err {
        Error::Help { usage } => {
            println!("{usage}");
            std::process::exit(0);
        }
        Error::Multiple(errors) => panic!("{}", format_errors(&errors)),
        err => panic!("{}", format_errors(&[err])),
    }
}
