//! Error taxonomy for the processor. Each variant maps to one of the
//! categories in the error-handling design: fatal at startup (`ConfigError`),
//! or per-poll / per-update / per-batch and always caught by the control
//! loop, never propagated as a panic.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid value for {field}: {value}")]
    Invalid { field: &'static str, value: String },
    #[error("malformed embedded schema: {0}")]
    MalformedSchema(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("kafka fetch failed")]
    Fetch(#[source] rdkafka::error::KafkaError),
    #[error("failed to decode message body as a gNMI notification or subscribe response")]
    Decode(#[source] prost::DecodeError),
}

/// Distinct from [`ConsumerError`] per the error taxonomy (§7): a failed
/// commit is transient and counted separately (`commit_errors_total`) from
/// a failed fetch, even though both originate from the same Kafka client.
#[derive(Debug, thiserror::Error)]
#[error("kafka commit failed")]
pub struct CommitError(#[source] pub rdkafka::error::KafkaError);

#[derive(Debug, thiserror::Error)]
pub enum UnmarshalError {
    #[error("unknown list '{list_name}' under container '{container_name}'")]
    UnknownList {
        container_name: String,
        list_name: String,
    },
    #[error("element at path {path} is missing key attribute '{key}'")]
    MissingKey { path: String, key: String },
    #[error("no schema entry named '{0}'")]
    UnknownSchemaNode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Unmarshal(#[from] UnmarshalError),
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SinkError {
    pub message: String,
    pub retryable: bool,
    /// Index of the record within its batch that triggered the failure,
    /// when the sink can identify one.
    pub record_index: Option<usize>,
}

impl SinkError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
            record_index: None,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            record_index: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.record_index = Some(index);
        self
    }
}
