//! WhoisMcpServer — rmcp ServerHandler backed by a WhoisGateway.
//!
//! Tool listing comes from the static catalogue in `tools`; tool calls are
//! routed by name, decoded into typed parameters, and answered with a single
//! text content block. All clones share one gateway (and so one rate
//! limiter), which matters for the HTTP transport where every session gets
//! its own clone.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};

use crate::error::WhoisError;
use crate::gateway::WhoisGateway;
use crate::query::{ProcessRunner, QueryRunner};
use crate::tools::{
    AsnParams, DomainParams, IpParams, RawWhoisParams, ToolName, decode_params, tool_definitions,
};

/// MCP server exposing the WHOIS tools.
pub struct WhoisMcpServer<R = ProcessRunner> {
    gateway: Arc<WhoisGateway<R>>,
}

impl<R> Clone for WhoisMcpServer<R> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<R: QueryRunner> WhoisMcpServer<R> {
    pub fn new(gateway: WhoisGateway<R>) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn gateway(&self) -> &WhoisGateway<R> {
        &self.gateway
    }

    /// Run a tool and return its text payload: pretty JSON for the
    /// structured tools, plain response text for `raw_whois`.
    pub async fn render_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> crate::Result<String> {
        let tool =
            ToolName::from_name(name).ok_or_else(|| WhoisError::UnknownTool(name.to_string()))?;

        let text = match tool {
            ToolName::LookupDomain => {
                let params: DomainParams = decode_params(tool, arguments)?;
                serde_json::to_string_pretty(&self.gateway.lookup_domain(&params.domain).await?)?
            }
            ToolName::LookupIp => {
                let params: IpParams = decode_params(tool, arguments)?;
                serde_json::to_string_pretty(&self.gateway.lookup_ip(&params.ip).await?)?
            }
            ToolName::LookupAsn => {
                let params: AsnParams = decode_params(tool, arguments)?;
                serde_json::to_string_pretty(&self.gateway.lookup_asn(&params.asn).await?)?
            }
            ToolName::CheckAvailability => {
                let params: DomainParams = decode_params(tool, arguments)?;
                serde_json::to_string_pretty(
                    &self.gateway.check_availability(&params.domain).await?,
                )?
            }
            ToolName::RawWhois => {
                let params: RawWhoisParams = decode_params(tool, arguments)?;
                self.gateway
                    .raw_whois(&params.query, params.whois_server.as_deref())
                    .await?
            }
        };

        Ok(text)
    }
}

/// Caller mistakes become invalid-params; anything else is internal.
fn to_mcp_error(err: WhoisError) -> McpError {
    if err.is_client_error() {
        McpError::invalid_params(err.to_string(), None)
    } else {
        McpError::internal_error(err.to_string(), None)
    }
}

impl<R: QueryRunner + 'static> ServerHandler for WhoisMcpServer<R> {
    /// Return server metadata: name "whois-mcp", tool capabilities enabled.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "whois-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "WHOIS lookups for domains, IP addresses and ASNs. Queries are rate limited \
                 to one per second across all tools."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: tool_definitions(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let text = self
            .render_tool(&request.name, request.arguments)
            .await
            .map_err(|e| {
                tracing::warn!(tool = %request.name, error = %e, "tool call rejected");
                to_mcp_error(e)
            })?;

        Ok(CallToolResult {
            content: vec![Content::text(text)],
            is_error: Some(false),
            structured_content: None,
            meta: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::gateway::OutputLimits;
    use crate::query::testing::CannedRunner;
    use crate::rate_limit::RateLimiter;

    fn make_server(stdout: &str) -> WhoisMcpServer<CannedRunner> {
        let gateway = WhoisGateway::new(
            CannedRunner::completed(stdout),
            RateLimiter::new(Duration::ZERO),
            OutputLimits {
                lookup_chars: 3000,
                raw_chars: 5000,
            },
        );
        WhoisMcpServer::new(gateway)
    }

    fn args(value: serde_json::Value) -> Option<serde_json::Map<String, serde_json::Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn test_get_info_server_name() {
        let server = make_server("");
        let info = server.get_info();
        assert_eq!(info.server_info.name, "whois-mcp");
        assert!(
            info.capabilities.tools.is_some(),
            "tools capability should be enabled"
        );
        assert!(info.instructions.is_some(), "instructions should be set");
    }

    #[test]
    fn test_clones_share_gateway() {
        let server = make_server("");
        let clone = server.clone();
        assert!(Arc::ptr_eq(&server.gateway, &clone.gateway));
    }

    #[tokio::test]
    async fn test_lookup_domain_renders_json() {
        let server = make_server("Domain Name: EXAMPLE.COM\nRegistrar: Example Corp\n");
        let text = server
            .render_tool("lookup_domain", args(json!({"domain": "example.com"})))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["domain"], "example.com");
        assert_eq!(value["parsed"]["Registrar"], "Example Corp");
        assert!(text.contains('\n'), "JSON should be pretty-printed");
    }

    #[tokio::test]
    async fn test_check_availability_renders_json() {
        let server = make_server("NOT FOUND\n");
        let text = server
            .render_tool("check_availability", args(json!({"domain": "example123.com"})))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "domain": "example123.com",
                "available": true,
                "confidence": "high",
                "registrar": null,
                "expiry": null
            })
        );
    }

    #[tokio::test]
    async fn test_raw_whois_renders_plain_text() {
        let server = make_server(&"y".repeat(10_000));
        let text = server
            .render_tool(
                "raw_whois",
                args(json!({"query": "example.com", "whoisServer": "whois.verisign-grs.com"})),
            )
            .await
            .unwrap();
        assert_eq!(text.len(), 5000);
        let query = server.gateway().runner().last_query().unwrap();
        assert_eq!(query.server.as_deref(), Some("whois.verisign-grs.com"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = make_server("");
        let result = server.render_tool("whois_everything", None).await;
        assert!(matches!(result, Err(WhoisError::UnknownTool(name)) if name == "whois_everything"));
    }

    #[tokio::test]
    async fn test_missing_argument_does_not_run_query() {
        let server = make_server("");
        let result = server.render_tool("lookup_ip", args(json!({}))).await;
        assert!(matches!(result, Err(WhoisError::InvalidArguments(..))));
        assert_eq!(server.gateway().runner().calls(), 0);
    }

    #[tokio::test]
    async fn test_flag_injection_rejected() {
        let server = make_server("");
        let result = server
            .render_tool("lookup_asn", args(json!({"asn": "--version"})))
            .await;
        assert!(matches!(result, Err(WhoisError::InvalidQuery(..))));
        assert_eq!(server.gateway().runner().calls(), 0);
    }

    #[test]
    fn test_error_mapping() {
        let err = to_mcp_error(WhoisError::UnknownTool("x".to_string()));
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);

        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = to_mcp_error(WhoisError::Serialization(serde_err));
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
    }
}
