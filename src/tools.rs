//! MCP tool catalogue: names, descriptions, input schemas and the typed
//! parameter structs arguments are decoded into.

use std::sync::Arc;

use rmcp::model::Tool;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::WhoisError;

/// The five tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    LookupDomain,
    LookupIp,
    LookupAsn,
    RawWhois,
    CheckAvailability,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::LookupDomain,
        ToolName::LookupIp,
        ToolName::CheckAvailability,
        ToolName::LookupAsn,
        ToolName::RawWhois,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::LookupDomain => "lookup_domain",
            ToolName::LookupIp => "lookup_ip",
            ToolName::LookupAsn => "lookup_asn",
            ToolName::RawWhois => "raw_whois",
            ToolName::CheckAvailability => "check_availability",
        }
    }

    /// Resolve a tool by its registered name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    fn description(self) -> &'static str {
        match self {
            ToolName::LookupDomain => "WHOIS lookup for a domain.",
            ToolName::LookupIp => "WHOIS lookup for an IP address.",
            ToolName::LookupAsn => "WHOIS lookup for an ASN.",
            ToolName::RawWhois => "Raw WHOIS query with optional server.",
            ToolName::CheckAvailability => {
                "Check if a domain is available (heuristic based on WHOIS response)."
            }
        }
    }

    fn input_schema(self) -> serde_json::Value {
        match self {
            ToolName::LookupDomain => single_string_schema(
                "domain",
                "Domain name (e.g. 'example.com')",
            ),
            ToolName::LookupIp => single_string_schema("ip", "IPv4 or IPv6 address"),
            ToolName::LookupAsn => single_string_schema("asn", "AS number (e.g. 'AS13335')"),
            ToolName::CheckAvailability => {
                single_string_schema("domain", "Domain name to check")
            }
            ToolName::RawWhois => serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Query string passed to the WHOIS client"
                    },
                    "whoisServer": {
                        "type": "string",
                        "description": "Specific WHOIS server to query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// The MCP tool definition advertised in `tools/list`.
    pub fn definition(self) -> Tool {
        let schema = self.input_schema();
        Tool {
            name: self.as_str().into(),
            title: None,
            description: Some(self.description().into()),
            input_schema: Arc::new(schema.as_object().cloned().unwrap_or_default()),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }
}

fn single_string_schema(field: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            field: { "type": "string", "description": description }
        },
        "required": [field]
    })
}

/// All tool definitions, in registration order.
pub fn tool_definitions() -> Vec<Tool> {
    ToolName::ALL.into_iter().map(ToolName::definition).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainParams {
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpParams {
    pub ip: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsnParams {
    pub asn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWhoisParams {
    pub query: String,
    #[serde(rename = "whoisServer", default)]
    pub whois_server: Option<String>,
}

/// Decode tool arguments into `T`. Missing arguments decode as `{}`; extra
/// keys are ignored.
pub fn decode_params<T: DeserializeOwned>(
    tool: ToolName,
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> crate::Result<T> {
    let value = serde_json::Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value)
        .map_err(|e| WhoisError::InvalidArguments(tool.as_str().to_string(), e.to_string()))
}
