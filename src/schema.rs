use serde::{Deserialize, Serialize};

/// The operation a benchmark parameter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpKind {
    KeyGen,
    Sign,
    Verify,
    Encrypt,
    Decrypt,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::KeyGen => "key-gen",
            OpKind::Sign => "sign",
            OpKind::Verify => "verify",
            OpKind::Encrypt => "encrypt",
            OpKind::Decrypt => "decrypt",
        }
    }
}

/// One thing to measure. Built by the suite modules before any timing
/// starts; the harness never mutates it.
#[derive(Debug, Clone)]
pub struct BenchmarkParameter {
    pub algorithm: String,
    /// Variant label distinguishing this row ("2048-bit", "P-256", ...).
    pub variant: String,
    pub op: OpKind,
    /// Approximate security level, descriptive only ("~128-bit").
    pub security: Option<String>,
    /// Payload size per call. Present only when throughput is meaningful
    /// (symmetric ciphers); absent for fixed-size asymmetric ops.
    pub payload_bytes: Option<u64>,
    /// Free-form fields the pivots need (key bits, mode, size label).
    pub extra: serde_json::Value,
}

impl BenchmarkParameter {
    pub fn new(algorithm: &str, variant: &str, op: OpKind) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            variant: variant.to_string(),
            op,
            security: None,
            payload_bytes: None,
            extra: serde_json::Value::Null,
        }
    }

    pub fn security(mut self, label: &str) -> Self {
        self.security = Some(label.to_string());
        self
    }

    pub fn payload_bytes(mut self, bytes: u64) -> Self {
        self.payload_bytes = Some(bytes);
        self
    }

    pub fn extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }
}

/// One row of benchmark output. Created once per parameter after all
/// repetitions complete; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub algorithm: String,
    pub variant: String,
    pub op: OpKind,
    pub security: Option<String>,

    pub iterations: u64,
    /// Average wall-clock seconds per operation.
    pub avg_secs: f64,

    pub payload_bytes: Option<u64>,
    /// Derived payload ÷ duration, in MB/s (1 MB = 1 048 576 bytes).
    /// Present only when `payload_bytes` is.
    pub throughput_mb_s: Option<f64>,

    /// Peak tracked heap allocation over the timed region, when requested.
    pub peak_bytes: Option<u64>,

    pub extra: serde_json::Value,
}

/// Metadata identifying one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub profile: String,
    pub seed: u64,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

/// Raw-record report, written as JSON when requested on the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub run: RunMeta,
    pub records: Vec<ResultRecord>,
}
