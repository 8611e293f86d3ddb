//! whois-mcp — WHOIS domain, IP and ASN lookups as MCP tools.
//!
//! Queries go through one rate-limited gateway that runs the system WHOIS
//! client with an argument vector (never a shell), caps and times out the
//! subprocess, and parses the loose `key: value` response text.

pub mod availability;
pub mod config;
pub mod error;
pub mod gateway;
pub mod parser;
pub mod query;
pub mod rate_limit;
pub mod server;
pub mod tools;

pub use availability::{Availability, Confidence};
pub use config::{ClientConfig, GatewayConfig, LimitsConfig};
pub use error::{Result, WhoisError};
pub use gateway::{LookupKind, LookupResult, OutputLimits, WhoisGateway};
pub use parser::{ParsedFields, parse_response};
pub use query::{ProcessRunner, QueryFailure, QueryOutcome, QueryRunner, WhoisQuery};
pub use rate_limit::RateLimiter;
pub use server::WhoisMcpServer;
pub use tools::{ToolName, tool_definitions};
