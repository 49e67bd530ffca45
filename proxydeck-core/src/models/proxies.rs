use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocols the pool accepts. Anything else is a parse rejection,
/// never a permissive fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Socks4,
    Socks4a,
    Socks5,
}

impl Protocol {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            "socks4" => Some(Protocol::Socks4),
            "socks4a" => Some(Protocol::Socks4a),
            "socks5" => Some(Protocol::Socks5),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Socks4 => "socks4",
            Protocol::Socks4a => "socks4a",
            Protocol::Socks5 => "socks5",
        }
    }

    /// Port assumed when a URI omits one.
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Https => 443,
            _ => 80,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, not-yet-persisted proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxySpec {
    pub address: String,
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Original input line, kept for preview and diagnostics.
    #[serde(skip)]
    pub raw_line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyStatus {
    Active,
    Failed,
    Idle,
}

impl ProxyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyStatus::Active => "active",
            ProxyStatus::Failed => "failed",
            ProxyStatus::Idle => "idle",
        }
    }
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The remote store's persisted, metric-bearing view of a proxy.
/// Metrics are mutated only by remote-side events; the client treats
/// the whole record as read-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyRecord {
    pub id: i64,
    pub address: String,
    pub protocol: Protocol,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub status: ProxyStatus,
    #[serde(default)]
    pub requests: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub avg_response_time: u64,
    #[serde(default)]
    pub last_check: Option<String>,
}

/// Partial update for a single record. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProxyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Pagination metadata as reported by the remote store. Always replaced
/// wholesale from a response; `total`/`total_pages` depend on server-side
/// filtering and are never computed client-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of records plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyPage {
    pub proxies: Vec<ProxyRecord>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Skipped,
    Failed,
}

/// Outcome for one submitted spec. Produced exactly once, in submission
/// order, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub address: String,
    pub status: ImportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a remote-side connectivity test.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestReport {
    #[serde(default)]
    pub address: String,
    pub status: ProxyStatus,
    #[serde(default)]
    pub response_time: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Server-rendered export payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}
