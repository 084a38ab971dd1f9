mod common;

use common::*;
use multiload::{BoxError, Config, Error, FlagLoader, Loader, Settable, impl_settable};
use std::collections::HashMap;

#[test]
fn test_flag() {
    let loader = FlagLoader::new().with_args(flag_args("Server", ""));
    let mut server = Server::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_server());
}

#[test]
fn test_flag_with_prefix() {
    let loader = FlagLoader::new()
        .with_prefix("Prefix")
        .with_args(flag_args("Server", "Prefix"));
    let mut server = Server::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_server());
}

#[test]
fn test_nested_flags() {
    let loader = FlagLoader::new().with_args(flag_args("NestedServer", ""));
    let mut server = NestedServer::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_nested_server());
}

#[test]
fn test_struct_separator_flags() {
    let loader = FlagLoader::new().with_separator(".").with_args([
        "--name",
        "koding",
        "--database_options.postgres.enabled",
        "--database_options.postgres.port",
        "5432",
        "--database_options.postgres.hosts",
        "192.168.2.1,192.168.2.2,192.168.2.3",
        "--database_options.postgres.db_name",
        "configdb",
        "--database_options.postgres.availability_ratio",
        "8.23",
    ]);
    let mut server = NestedServer::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_nested_server());
}

#[test]
fn test_flatten_flags() {
    let loader = FlagLoader::new()
        .with_flatten(true)
        .with_args(flag_args("FlattenedServer", ""));
    let mut server = FlattenedServer::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server.postgres, default_postgres());
}

#[test]
fn test_camel_case_flags() {
    let loader = FlagLoader::new()
        .with_word_split(true)
        .with_args(flag_args("CamelCaseServer", ""));
    let mut server = CamelCaseServer::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_camel_case_server());
}

#[test]
fn test_camel_case_and_struct_separator() {
    let loader = FlagLoader::new()
        .with_word_split(true)
        .with_separator(".")
        .with_args([
            "--name",
            "koding",
            "--database-options.postgres.enabled",
            "--database-options.postgres.port",
            "5432",
            "--database-options.postgres.hosts",
            "192.168.2.1,192.168.2.2,192.168.2.3",
            "--database-options.postgres.db-name",
            "configdb",
            "--database-options.postgres.availability-ratio",
            "8.23",
        ]);
    let mut server = NestedServer::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_nested_server());
}

#[test]
fn test_flatten_and_camel_case_flags() {
    let loader = FlagLoader::new()
        .with_flatten(true)
        .with_word_split(true)
        .with_args(flag_args("FlattenedCamelCaseServer", ""));
    let mut server = FlattenedServer::default();

    loader.load(&mut server).unwrap();
    assert_eq!(server.postgres, default_postgres());
}

#[test]
fn test_flatten_collision() {
    #[derive(Debug, Default, Config)]
    pub struct A {
        pub foo: String,
    }

    #[derive(Debug, Default, Config)]
    pub struct B {
        pub foo: String,
    }

    #[derive(Debug, Default, Config)]
    pub struct C {
        pub a: A,
        pub b: B,
    }

    let loader = FlagLoader::new()
        .with_flatten(true)
        .with_args(["--foo", "bar"]);

    match loader.load(&mut C::default()) {
        Err(Error::DuplicateKey { key, .. }) => assert_eq!(key, "foo"),
        other => panic!("Expected DuplicateKey, got {other:?}"),
    }
}

#[derive(Debug, Default, Config)]
pub struct Foobar {
    pub foobar: String,
}

#[test]
fn test_custom_usage_func() {
    const USAGE: &str = "foobar help";
    let loader = FlagLoader::new()
        .with_usage_fn(|_| USAGE.to_string())
        .with_args(Vec::<String>::new());

    loader.load(&mut Foobar::default()).unwrap();

    let specs = loader.flag_specs(&mut Foobar::default()).unwrap();
    assert_eq!(specs[0].name, "foobar");
    assert_eq!(specs[0].usage, USAGE);
}

#[test]
fn test_custom_usage_tag() {
    #[derive(Debug, Default, Config)]
    pub struct Tagged {
        #[config(flag_usage = "foobar help")]
        pub foobar: String,
    }

    let specs = FlagLoader::new()
        .flag_specs(&mut Tagged::default())
        .unwrap();
    assert_eq!(specs[0].usage, "foobar help");
}

#[derive(Debug, Default, PartialEq)]
pub struct Url(Option<String>);

impl Settable for Url {
    fn set_from_str(&mut self, raw: &str) -> Result<(), BoxError> {
        let Some((scheme, _)) = raw.split_once("://") else {
            return Err(format!("invalid url {raw}").into());
        };
        if scheme.is_empty() {
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

impl_settable!(Url);

#[derive(Debug, Default, Config)]
pub struct Endpoint {
    #[config(required)]
    pub private: Option<Box<Url>>,
    #[config(required)]
    pub public: Url,
}

#[test]
fn test_flag_value_support() {
    let loader = FlagLoader::new().with_args([
        "-private",
        "http://127.0.0.1/kloud/kite",
        "-public",
        "http://127.0.0.1/kloud/kite",
    ]);
    let mut endpoint = Endpoint::default();

    loader.load(&mut endpoint).unwrap();
    assert_eq!(
        endpoint.private.as_ref().map(|url| url.render()),
        Some("http://127.0.0.1/kloud/kite".to_string())
    );
    assert_eq!(endpoint.public.render(), "http://127.0.0.1/kloud/kite");
}

#[test]
fn test_flag_value_error_is_verbatim() {
    colored::control::set_override(false);

    let loader = FlagLoader::new().with_args(["--public", "localhost"]);
    let err = loader.load(&mut Endpoint::default()).unwrap_err();

    match &err {
        Error::Parse { source, .. } => assert_eq!(source.to_string(), "invalid url localhost"),
        other => panic!("Expected Parse error, got {other:?}"),
    }
}

#[test]
fn test_map_flag_support() {
    #[derive(Debug, Default, Config)]
    pub struct Maps {
        pub map_string_int: HashMap<String, i32>,
        pub map_string_string: HashMap<String, String>,
    }

    let loader = FlagLoader::new().with_word_split(true).with_args([
        "-map-string-int",
        "key1=1234,key2=456",
        "--map-string-string",
        "key1=val1,key2=val2",
    ]);
    let mut maps = Maps::default();

    loader.load(&mut maps).unwrap();
    assert_eq!(
        maps.map_string_int,
        HashMap::from([("key1".to_string(), 1234), ("key2".to_string(), 456)])
    );
    assert_eq!(maps.map_string_string["key2"], "val2");
}

#[test]
fn test_malformed_map_entry() {
    #[derive(Debug, Default, Config)]
    pub struct Maps {
        pub labels: HashMap<String, i32>,
    }

    let loader = FlagLoader::new().with_args(["--labels", "key1=1,key2"]);
    let err = loader.load(&mut Maps::default()).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_flag_absent_keeps_value() {
    let loader = FlagLoader::new().with_args(["--name", "koding"]);
    let mut server = default_server();
    server.name = String::new();

    loader.load(&mut server).unwrap();
    assert_eq!(server, default_server());
}

#[test]
fn test_field_named_help() {
    #[derive(Debug, Default, Config)]
    pub struct WithHelp {
        pub help: bool,
        pub name: String,
    }

    let loader = FlagLoader::new().with_args(["--name", "x"]);
    let mut with_help = WithHelp::default();
    loader.load(&mut with_help).unwrap();
    assert_eq!(with_help.name, "x");
    assert!(!with_help.help);

    let loader = FlagLoader::new().with_args(["--help"]);
    let mut with_help = WithHelp::default();
    loader.load(&mut with_help).unwrap();
    assert!(with_help.help);
}

#[derive(Debug, Default, Config)]
pub struct Plain {
    pub port: u16,
    pub name: String,
}

#[test]
fn test_parsing_stops_at_first_non_flag() {
    let loader = FlagLoader::new().with_args(["--port", "8080", "serve", "--name", "ignored"]);
    let mut plain = Plain::default();

    loader.load(&mut plain).unwrap();
    assert_eq!(plain.port, 8080);
    assert!(plain.name.is_empty());
}

#[test]
fn test_parsing_stops_after_terminator() {
    let loader = FlagLoader::new().with_args(["-port", "8080", "--", "--name", "ignored"]);
    let mut plain = Plain::default();

    loader.load(&mut plain).unwrap();
    assert_eq!(plain.port, 8080);
    assert!(plain.name.is_empty());
}

#[test]
fn test_unflattened_flag_collision_is_rejected() {
    #[derive(Debug, Default, Config)]
    pub struct Inner {
        pub port: u16,
    }

    #[derive(Debug, Default, Config)]
    pub struct Shared {
        pub postgres_port: u16,
        pub postgres: Inner,
    }

    let loader = FlagLoader::new()
        .with_word_split(true)
        .with_args(["--postgres-port", "5432"]);

    match loader.load(&mut Shared::default()) {
        Err(Error::DuplicateKey { key, .. }) => assert_eq!(key, "postgres-port"),
        other => panic!("Expected DuplicateKey, got {other:?}"),
    }
}
