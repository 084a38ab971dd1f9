use crate::error::Error;
use crate::field::{Field, Leaf};
use crate::value::Shape;
use crate::walk::{self, FieldPath, Visitor};
use crate::{EnvironmentLoader, FlagLoader};
use std::{fs, path::Path};

/// Everything a user needs to know to set one field
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldDoc {
    /// Dotted field path
    pub path: String,
    /// Environment variable name
    pub env: String,
    /// Long flag name, without dashes
    pub flag: String,
    pub shape: Shape,
    pub required: bool,
    pub default: Option<&'static str>,
    pub usage: String,
}

/// Collects the environment variable and flag of every field of `target`
pub fn describe(
    target: &mut dyn Field,
    env: &EnvironmentLoader,
    flag: &FlagLoader,
) -> Result<Vec<FieldDoc>, Error> {
    let keys = env.env_keys(target)?;
    let specs = flag.flag_specs(target)?;
    let required = required_paths(target)?;

    Ok(keys
        .into_iter()
        .zip(specs)
        .map(|(key, spec)| FieldDoc {
            required: required.contains(&spec.path),
            path: spec.path,
            env: key.key,
            flag: spec.name,
            shape: key.shape,
            default: spec.default,
            usage: spec.usage,
        })
        .collect())
}

struct RequiredPaths(Vec<String>);

impl Visitor for RequiredPaths {
    fn leaf(&mut self, path: &FieldPath, _leaf: Leaf<'_>) -> Result<bool, Error> {
        if path.leaf().required {
            self.0.push(path.dotted());
        }
        Ok(false)
    }
}

fn required_paths(target: &mut dyn Field) -> Result<Vec<String>, Error> {
    let mut collect = RequiredPaths(Vec::new());
    walk::walk(target, &mut collect)?;
    Ok(collect.0)
}

/// Renders a markdown summary table
pub fn render_markdown(docs: &[FieldDoc]) -> String {
    let mut md = String::new();

    md.push_str("## Configuration Summary\n\n");
    md.push_str("| Field | Variable | Flag | Type | Required | Description | Default |\n");
    md.push_str("|-------|----------|------|------|----------|-------------|---------|\n");
    for doc in docs {
        let required_str = if doc.required { "Yes" } else { "No" };
        md.push_str(&format!(
            "| {} | {} | --{} | {} | {} | {} | {} |\n",
            doc.path,
            doc.env,
            doc.flag,
            doc.shape,
            required_str,
            doc.usage,
            doc.default.unwrap_or("-")
        ));
    }

    md
}

/// Write configuration documentation to a markdown file
///
/// # Example
/// ```no_run
/// use multiload::{Config, EnvironmentLoader, FlagLoader, docs};
///
/// #[derive(Debug, Default, Config)]
/// pub struct Server {
///     #[config(default = 8080, flag_usage = "Server port")]
///     pub port: u16,
/// }
///
/// let fields = docs::describe(
///     &mut Server::default(),
///     &EnvironmentLoader::new(),
///     &FlagLoader::new(),
/// )
/// .unwrap();
/// docs::write_docs("CONFIG.md", &fields).unwrap();
/// ```
pub fn write_docs(path: impl AsRef<Path>, docs: &[FieldDoc]) -> std::io::Result<()> {
    fs::write(path, render_markdown(docs))
}
