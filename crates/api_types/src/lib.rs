use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        pub timestamp: DateTime<Utc>,
    }
}

pub mod report {
    use super::*;

    /// Envelope returned by a successful cron run. HTTP 200 even when
    /// individual transactions errored; those land in `results.errors`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CronReport {
        pub success: bool,
        pub timestamp: DateTime<Utc>,
        pub job: String,
        pub results: RunResults,
        pub message: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RunResults {
        pub total: u64,
        pub updated: u64,
        pub paid: u64,
        pub expired: u64,
        pub failed: u64,
        pub unchanged: u64,
        pub errors: Vec<String>,
        pub details: Vec<TransactionDetail>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionDetail {
        pub transaction_id: String,
        pub email: Option<String>,
        pub status: String,
        pub action: String,
    }

    /// Body of a failed run (HTTP 500).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct JobFailure {
        pub success: bool,
        pub error: String,
        pub timestamp: DateTime<Utc>,
    }
}
