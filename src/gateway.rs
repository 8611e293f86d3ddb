//! WhoisGateway — the single entry point for all WHOIS operations.
//!
//! Every operation validates its input, waits on the shared rate limiter,
//! runs the query, and shapes the best-effort response text into a result.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::availability::{self, Availability};
use crate::config::GatewayConfig;
use crate::parser::{ParsedFields, parse_response};
use crate::query::{ProcessRunner, QueryOutcome, QueryRunner, WhoisQuery};
use crate::rate_limit::RateLimiter;

/// Character limits applied to response text before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimits {
    /// Limit for the `raw` field of domain/IP/ASN lookups.
    pub lookup_chars: usize,
    /// Limit for `raw_whois` output.
    pub raw_chars: usize,
}

/// What a structured lookup was asked about; names the echo field in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Domain,
    Ip,
    Asn,
}

impl LookupKind {
    pub fn field_name(self) -> &'static str {
        match self {
            LookupKind::Domain => "domain",
            LookupKind::Ip => "ip",
            LookupKind::Asn => "asn",
        }
    }
}

/// Result of `lookup_domain`, `lookup_ip` and `lookup_asn`.
///
/// Serializes as `{"<kind>": target, "parsed": {...}, "raw": "..."}` plus an
/// `error` string when the invocation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub kind: LookupKind,
    pub target: String,
    pub parsed: ParsedFields,
    pub raw: String,
    pub error: Option<String>,
}

impl Serialize for LookupResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.error.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(self.kind.field_name(), &self.target)?;
        map.serialize_entry("parsed", &self.parsed)?;
        map.serialize_entry("raw", &self.raw)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}

/// Truncate to at most `max_chars` characters, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Rate-limited WHOIS operations over a `QueryRunner`.
pub struct WhoisGateway<R = ProcessRunner> {
    runner: R,
    limiter: RateLimiter,
    limits: OutputLimits,
}

impl WhoisGateway<ProcessRunner> {
    /// Build a gateway that runs the system WHOIS client described by `config`.
    ///
    /// Calls `config.validate()` first.
    pub fn from_config(config: &GatewayConfig) -> crate::Result<Self> {
        config.validate()?;
        tracing::info!(
            command = %config.client.command,
            timeout_ms = %config.client.timeout_ms,
            min_interval_ms = %config.limits.min_interval_ms,
            "whois gateway configured"
        );
        Ok(Self::new(
            ProcessRunner::from_config(&config.client),
            RateLimiter::new(config.limits.min_interval()),
            OutputLimits {
                lookup_chars: config.limits.lookup_max_chars,
                raw_chars: config.limits.raw_max_chars,
            },
        ))
    }
}

impl<R: QueryRunner> WhoisGateway<R> {
    pub fn new(runner: R, limiter: RateLimiter, limits: OutputLimits) -> Self {
        Self {
            runner,
            limiter,
            limits,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    /// Validate, throttle, run. Rejected input consumes no rate-limit slot.
    async fn execute(&self, query: WhoisQuery) -> crate::Result<QueryOutcome> {
        query.validate()?;
        self.limiter.throttle().await;
        Ok(self.runner.run(&query).await)
    }

    /// Shared body of the three structured lookups.
    pub async fn lookup(&self, kind: LookupKind, target: &str) -> crate::Result<LookupResult> {
        tracing::debug!(kind = %kind.field_name(), target = %target, "whois lookup");
        let outcome = self.execute(WhoisQuery::new(target)).await?;
        let error = outcome.failure().map(ToString::to_string);
        let raw = outcome.into_text();
        let parsed = parse_response(&raw);

        Ok(LookupResult {
            kind,
            target: target.to_string(),
            parsed,
            raw: truncate_chars(&raw, self.limits.lookup_chars),
            error,
        })
    }

    pub async fn lookup_domain(&self, domain: &str) -> crate::Result<LookupResult> {
        self.lookup(LookupKind::Domain, domain).await
    }

    pub async fn lookup_ip(&self, ip: &str) -> crate::Result<LookupResult> {
        self.lookup(LookupKind::Ip, ip).await
    }

    pub async fn lookup_asn(&self, asn: &str) -> crate::Result<LookupResult> {
        self.lookup(LookupKind::Asn, asn).await
    }

    /// Raw response text for `query`, optionally asking `server` directly.
    pub async fn raw_whois(&self, query: &str, server: Option<&str>) -> crate::Result<String> {
        tracing::debug!(query = %query, server = ?server, "raw whois");
        let outcome = self
            .execute(WhoisQuery::new(query).with_server(server.map(str::to_string)))
            .await?;
        Ok(truncate_chars(&outcome.into_text(), self.limits.raw_chars))
    }

    /// Heuristic availability verdict for `domain`.
    pub async fn check_availability(&self, domain: &str) -> crate::Result<Availability> {
        tracing::debug!(domain = %domain, "availability check");
        let outcome = self.execute(WhoisQuery::new(domain)).await?;
        let error = outcome.failure().map(ToString::to_string);
        let raw = outcome.into_text();
        let parsed = parse_response(&raw);

        let mut verdict = availability::assess(domain, &raw, &parsed);
        verdict.error = error;
        Ok(verdict)
    }
}
