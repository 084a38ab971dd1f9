use multiload::{
    ApplyDefaults, Config, DefaultLoader, EnvironmentLoader, FlagLoader, HookLoader, Loader, docs,
};
use std::{collections::HashMap, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Config)]
pub struct Postgres {
    pub enabled: bool,
    #[config(default = 5432, flag_usage = "Postgres server port")]
    pub port: u16,
    #[config(required)]
    pub hosts: Vec<String>,
    #[config(default = "configdb")]
    pub db_name: String,
}

#[derive(Debug, Default, Config)]
#[config(apply_defaults)]
pub struct Server {
    #[config(required, flag_usage = "Name of this server")]
    pub name: String,
    #[config(default = 6060)]
    pub port: u16,
    #[config(default = "10s")]
    pub interval: Duration,
    pub labels: HashMap<String, String>,
    pub postgres: Postgres,
}

impl ApplyDefaults for Server {
    fn apply_defaults(&mut self) {
        if self.postgres.hosts.is_empty() {
            self.postgres.hosts = vec!["localhost".to_string()];
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    dotenvy::from_filename("./test.env").ok();

    match std::env::args().nth(1).as_deref() {
        Some("docs") => generate_docs(),
        Some("envs") => show_envs(),
        Some("load") => load(),
        Some(arg) => println!("unknown arg: {}. Available: docs, envs, load", arg),
        None => {
            println!("Usage: multiload-demo [command] [flags]");
            println!("Commands:");
            println!("  docs  - Generate CONFIG.md documentation");
            println!("  envs  - List the environment variables of Server");
            println!("  load  - Load Server from defaults, environment and flags");
        }
    }
}

fn load() {
    let loader = DefaultLoader::new()
        .with_flags(FlagLoader::new().with_args(std::env::args().skip(2)));
    let mut server = Server::default();

    if let Err(err) = loader
        .load(&mut server)
        .and_then(|_| HookLoader::new().load(&mut server))
    {
        eprintln!("Failed to load config:\n\t- {}", err);
        std::process::exit(2);
    }
    loader.must_validate(&mut server);

    println!("Config loaded successfully!");
    println!("{server:#?}");
}

fn show_envs() {
    match EnvironmentLoader::new().env_keys(&mut Server::default()) {
        Ok(keys) => {
            for key in keys {
                println!("{} ({})", key.key, key.shape);
            }
        }
        Err(e) => eprintln!("✗ Failed to resolve keys: {}", e),
    }
}

fn generate_docs() {
    println!("Generating documentation for Server...");
    let fields = match docs::describe(
        &mut Server::default(),
        &EnvironmentLoader::new(),
        &FlagLoader::new(),
    ) {
        Ok(fields) => fields,
        Err(e) => {
            eprintln!("✗ Failed to describe Server: {}", e);
            return;
        }
    };

    match docs::write_docs("CONFIG.md", &fields) {
        Ok(_) => println!("✓ Documentation written to CONFIG.md"),
        Err(e) => eprintln!("✗ Failed to write documentation: {}", e),
    }
}
