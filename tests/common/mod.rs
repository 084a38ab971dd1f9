#![allow(dead_code)]

use multiload::Config;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct Server {
    #[config(required)]
    pub name: String,
    #[config(default = 6060)]
    pub port: i32,
    pub id: i64,
    pub labels: Vec<i32>,
    pub enabled: bool,
    pub users: Vec<String>,
    pub postgres: Postgres,
    unexported: String,
    pub interval: Duration,
    #[config(default = 1638551008)]
    pub epoch: u64,
    #[config(default = 1638551009)]
    pub epoch32: u32,
    #[config(default = 1638551010)]
    pub epoch64: u64,
}

/// Postgresql database related configuration
#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct Postgres {
    pub enabled: bool,
    #[config(required)]
    pub port: u16,
    #[config(required)]
    pub hosts: Vec<String>,
    #[config(default = "configdb")]
    pub db_name: String,
    pub availability_ratio: f64,
    unexported: String,
}

#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct TaggedServer {
    #[config(required)]
    pub name: String,
    #[config(flatten)]
    pub postgres: Postgres,
}

#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct Database {
    pub postgres: Postgres,
}

#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct NestedServer {
    #[config(required)]
    pub name: String,
    pub database_options: Database,
}

#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct FlattenedServer {
    pub postgres: Postgres,
}

#[derive(Debug, Default, Clone, PartialEq, Config)]
pub struct CamelCaseServer {
    #[config(name = "AccessKey")]
    pub access_key: String,
    #[config(name = "Normal")]
    pub normal: String,
    #[config(name = "DBName", default = "configdb")]
    pub db_name: String,
    #[config(name = "AvailabilityRatio")]
    pub availability_ratio: f64,
}

pub fn default_postgres() -> Postgres {
    Postgres {
        enabled: true,
        port: 5432,
        hosts: vec![
            "192.168.2.1".to_string(),
            "192.168.2.2".to_string(),
            "192.168.2.3".to_string(),
        ],
        db_name: "configdb".to_string(),
        availability_ratio: 8.23,
        unexported: String::new(),
    }
}

pub fn default_server() -> Server {
    Server {
        name: "koding".to_string(),
        port: 6060,
        id: 1234567890,
        labels: vec![123, 456],
        enabled: true,
        users: vec!["ankara".to_string(), "istanbul".to_string()],
        postgres: default_postgres(),
        unexported: String::new(),
        interval: Duration::from_secs(10),
        epoch: 1638551008,
        epoch32: 1638551009,
        epoch64: 1638551010,
    }
}

pub fn default_camel_case_server() -> CamelCaseServer {
    CamelCaseServer {
        access_key: "123456".to_string(),
        normal: "normal".to_string(),
        db_name: "configdb".to_string(),
        availability_ratio: 8.23,
    }
}

pub fn default_nested_server() -> NestedServer {
    NestedServer {
        name: "koding".to_string(),
        database_options: Database {
            postgres: default_postgres(),
        },
    }
}

/// Environment variables for `record`, each prefixed with `PREFIX_`
pub fn env_vars(record: &str, prefix: &str) -> Vec<(String, String)> {
    let vars: &[(&str, &str)] = match record {
        "Server" => &[
            ("NAME", "koding"),
            ("PORT", "6060"),
            ("ENABLED", "true"),
            ("USERS", "ankara,istanbul"),
            ("INTERVAL", "10s"),
            ("ID", "1234567890"),
            ("LABELS", "123,456"),
            ("POSTGRES_ENABLED", "true"),
            ("POSTGRES_PORT", "5432"),
            ("POSTGRES_HOSTS", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("POSTGRES_DB_NAME", "configdb"),
            ("POSTGRES_AVAILABILITY_RATIO", "8.23"),
            ("POSTGRES_FOO", "8.23,9.12,11,90"),
            ("EPOCH", "1638551008"),
            ("EPOCH32", "1638551009"),
            ("EPOCH64", "1638551010"),
        ],
        "CamelCaseServer" => &[
            ("ACCESS_KEY", "123456"),
            ("NORMAL", "normal"),
            ("DB_NAME", "configdb"),
            ("AVAILABILITY_RATIO", "8.23"),
        ],
        "TaggedServer" => &[
            ("NAME", "koding"),
            ("ENABLED", "true"),
            ("PORT", "5432"),
            ("HOSTS", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("DB_NAME", "configdb"),
            ("AVAILABILITY_RATIO", "8.23"),
            ("FOO", "8.23,9.12,11,90"),
        ],
        other => panic!("no environment fixture for {other}"),
    };

    let prefix = if prefix.is_empty() { record } else { prefix }.to_uppercase();
    vars.iter()
        .map(|(key, value)| (format!("{prefix}_{key}"), value.to_string()))
        .collect()
}

/// Command-line arguments for `record`; flags are prefixed with `prefix-` when given
pub fn flag_args(record: &str, prefix: &str) -> Vec<String> {
    let flags: &[(&str, &str)] = match record {
        "Server" => &[
            ("-name", "koding"),
            ("-port", "6060"),
            ("-enabled", ""),
            ("-users", "ankara,istanbul"),
            ("-interval", "10s"),
            ("-id", "1234567890"),
            ("-labels", "123,456"),
            ("-postgres-enabled", ""),
            ("-postgres-port", "5432"),
            ("-postgres-hosts", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("-postgres-db_name", "configdb"),
            ("-postgres-availability_ratio", "8.23"),
            ("-epoch", "1638551008"),
            ("-epoch32", "1638551009"),
            ("-epoch64", "1638551010"),
        ],
        "FlattenedServer" => &[
            ("--enabled", ""),
            ("--port", "5432"),
            ("--hosts", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("--db_name", "configdb"),
            ("--availability_ratio", "8.23"),
        ],
        "FlattenedCamelCaseServer" => &[
            ("--enabled", ""),
            ("--port", "5432"),
            ("--hosts", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("--db-name", "configdb"),
            ("--availability-ratio", "8.23"),
        ],
        "CamelCaseServer" => &[
            ("--access-key", "123456"),
            ("--normal", "normal"),
            ("--db-name", "configdb"),
            ("--availability-ratio", "8.23"),
        ],
        "NestedServer" => &[
            ("--name", "koding"),
            ("--database_options-postgres-enabled", ""),
            ("--database_options-postgres-port", "5432"),
            ("--database_options-postgres-hosts", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("--database_options-postgres-db_name", "configdb"),
            ("--database_options-postgres-availability_ratio", "8.23"),
        ],
        other => panic!("no flag fixture for {other}"),
    };

    let prefix = prefix.to_lowercase();
    let mut args = Vec::new();
    for (flag, value) in flags {
        let flag = if prefix.is_empty() {
            flag.to_string()
        } else {
            format!("-{prefix}{flag}")
        };
        args.push(flag);
        if !value.is_empty() {
            args.push(value.to_string());
        }
    }
    args
}
