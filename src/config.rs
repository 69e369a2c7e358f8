//! Configuration surface: one `Config` assembled by `clap::Parser` from CLI
//! flags and their `env`-bound fallbacks, validated once at startup before
//! any I/O (§6).

use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

#[derive(Debug, Clone, Parser)]
#[command(about = "gNMI-to-columnar telemetry processor", version)]
pub struct Config {
    /// Destination sink: `stdout` for local runs, `clickhouse` in production.
    #[arg(long, env = "OUTPUT", default_value = "stdout")]
    pub output: String,

    /// Comma-separated Kafka bootstrap broker list.
    #[arg(long, env = "KAFKA_BROKERS", value_delimiter = ',')]
    pub kafka_brokers: Vec<String>,

    #[arg(long, env = "KAFKA_TOPIC")]
    pub kafka_topic: String,

    #[arg(long, env = "KAFKA_GROUP")]
    pub kafka_group: String,

    /// `scram` or `aws-msk`.
    #[arg(long, env = "KAFKA_AUTH_TYPE", default_value = "scram")]
    pub kafka_auth_type: String,

    #[arg(long, env = "KAFKA_USER", default_value = "")]
    pub kafka_user: String,

    #[arg(long, env = "KAFKA_PASSWORD", default_value = "")]
    pub kafka_password: String,

    /// AWS region to sign MSK IAM OAUTHBEARER tokens for. Required when
    /// `KAFKA_AUTH_TYPE=aws-msk`; unused otherwise.
    #[arg(long, env = "KAFKA_AWS_REGION")]
    pub kafka_aws_region: Option<String>,

    #[arg(long, env = "KAFKA_TLS_DISABLED", action(clap::ArgAction::SetTrue))]
    pub kafka_tls_disabled: bool,

    #[arg(long, env = "CLICKHOUSE_ADDR")]
    pub clickhouse_addr: Option<String>,

    #[arg(long, env = "CLICKHOUSE_DB", default_value = "default")]
    pub clickhouse_db: String,

    #[arg(long, env = "CLICKHOUSE_USER", default_value = "default")]
    pub clickhouse_user: String,

    #[arg(long, env = "CLICKHOUSE_PASS", default_value = "")]
    pub clickhouse_pass: String,

    #[arg(long, env = "CLICKHOUSE_TLS_DISABLED", action(clap::ArgAction::SetTrue))]
    pub clickhouse_tls_disabled: bool,

    #[arg(long, env = "METRICS_ADDR", default_value = ":2112")]
    pub metrics_addr: String,

    /// Idle poll timeout before `Consumer::poll` returns an empty batch.
    #[arg(
        long,
        env = "KAFKA_IDLE_TIMEOUT",
        value_parser = humantime::parse_duration,
        default_value = "5s"
    )]
    pub kafka_idle_timeout: Duration,

    #[arg(short, long, env = "VERBOSE", action(clap::ArgAction::SetTrue))]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.output.as_str() {
            "stdout" | "clickhouse" => {}
            other => {
                return Err(ConfigError::Invalid {
                    field: "OUTPUT",
                    value: other.to_string(),
                })
            }
        }

        if self.output == "clickhouse" && self.clickhouse_addr.is_none() {
            return Err(ConfigError::Missing("CLICKHOUSE_ADDR"));
        }

        match self.kafka_auth_type.as_str() {
            "scram" | "aws-msk" => {}
            other => {
                return Err(ConfigError::Invalid {
                    field: "KAFKA_AUTH_TYPE",
                    value: other.to_string(),
                })
            }
        }

        if self.kafka_brokers.is_empty() {
            return Err(ConfigError::Missing("KAFKA_BROKERS"));
        }

        if self.kafka_auth_type == "aws-msk" && self.kafka_aws_region.is_none() {
            return Err(ConfigError::Missing("KAFKA_AWS_REGION"));
        }

        Ok(())
    }

    pub fn kafka_auth(&self) -> KafkaAuth {
        match self.kafka_auth_type.as_str() {
            "aws-msk" => KafkaAuth::AwsMskIam {
                region: self.kafka_aws_region.clone().unwrap_or_default(),
            },
            _ => KafkaAuth::Scram {
                username: self.kafka_user.clone(),
                password: self.kafka_password.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum KafkaAuth {
    None,
    Scram { username: String, password: String },
    AwsMskIam { region: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            output: "stdout".into(),
            kafka_brokers: vec!["localhost:9092".into()],
            kafka_topic: "gnmi".into(),
            kafka_group: "gnmi-writer".into(),
            kafka_auth_type: "scram".into(),
            kafka_user: "".into(),
            kafka_password: "".into(),
            kafka_aws_region: None,
            kafka_tls_disabled: false,
            clickhouse_addr: None,
            clickhouse_db: "default".into(),
            clickhouse_user: "default".into(),
            clickhouse_pass: "".into(),
            clickhouse_tls_disabled: false,
            metrics_addr: ":2112".into(),
            kafka_idle_timeout: Duration::from_secs(5),
            verbose: false,
        }
    }

    #[test]
    fn stdout_output_needs_no_clickhouse_addr() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn clickhouse_output_requires_addr() {
        let mut config = base();
        config.output = "clickhouse".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("CLICKHOUSE_ADDR"))
        ));
    }

    #[test]
    fn rejects_unknown_output() {
        let mut config = base();
        config.output = "kafka".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_empty_broker_list() {
        let mut config = base();
        config.kafka_brokers.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("KAFKA_BROKERS"))
        ));
    }

    #[test]
    fn aws_msk_auth_requires_region() {
        let mut config = base();
        config.kafka_auth_type = "aws-msk".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("KAFKA_AWS_REGION"))
        ));

        config.kafka_aws_region = Some("us-east-1".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn kafka_auth_reads_region_not_user_for_aws_msk() {
        let mut config = base();
        config.kafka_auth_type = "aws-msk".into();
        config.kafka_user = "should-be-ignored".into();
        config.kafka_aws_region = Some("eu-west-1".into());
        assert!(matches!(
            config.kafka_auth(),
            KafkaAuth::AwsMskIam { region } if region == "eu-west-1"
        ));
    }
}
