/// Where accepted export requests are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueBackend {
    /// Amazon SQS FIFO queue at the given URL.
    Sqs { queue_url: String },
    /// In-process queue, for local development.
    Memory,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the queue URL have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Queue the submit endpoint publishes to.
    pub queue: QueueBackend,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `HOST`                 | `0.0.0.0`                    |
    /// | `PORT`                 | `3000`                       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                         |
    /// | `QUEUE_BACKEND`        | `sqs` (or `memory`)          |
    /// | `CSV_QUEUE_URL`        | required when backend is sqs |
    ///
    /// Region and credentials for SQS come from the standard AWS
    /// environment (`AWS_REGION`, profile, instance role).
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let backend = std::env::var("QUEUE_BACKEND").unwrap_or_else(|_| "sqs".into());
        let queue = match backend.as_str() {
            "memory" => QueueBackend::Memory,
            "sqs" => QueueBackend::Sqs {
                queue_url: std::env::var("CSV_QUEUE_URL")
                    .expect("CSV_QUEUE_URL must be set when QUEUE_BACKEND=sqs"),
            },
            other => panic!("Unknown QUEUE_BACKEND '{other}', expected 'sqs' or 'memory'"),
        };

        Self {
            host,
            port,
            request_timeout_secs,
            queue,
        }
    }
}
