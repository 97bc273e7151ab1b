use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

const DEFAULT_HOST: &str = "localhost:8000";

/// User agents that get plain text instead of HTML
const CLI_AGENTS: &[&str] = &["curl", "wget", "httpie", "fetch"];

/// Usage page: plain text for command-line clients, HTML for browsers
pub async fn usage_page(headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST);

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if is_cli_agent(user_agent) {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
            usage_text(host),
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
            usage_html(host),
        )
            .into_response()
    }
}

fn is_cli_agent(user_agent: &str) -> bool {
    let agent = user_agent.to_ascii_lowercase();
    CLI_AGENTS.iter().any(|cli| agent.contains(cli))
}

fn usage_text(host: &str) -> String {
    format!(
        r#"
EC2 on-demand prices (Linux, shared tenancy, USD per hour)

Usage:

    curl {host}/{{region}}/{{instance_type}}
    curl {host}/{{region}}
    curl {host}/all

Examples:

    - hourly on-demand price of a t3.nano instance in eu-west-1
    curl {host}/eu-west-1/t3.nano

    - hourly on-demand prices of all instance types in eu-west-1
    curl {host}/eu-west-1

    - hourly on-demand prices of all instance types in all regions
    curl {host}/all

"#
    )
}

fn usage_html(host: &str) -> String {
    let host = escape_html(host);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>EC2 On-Demand Prices</title>
</head>
<body style="font-family: courier new, courier, monospace; font-size: 18px;">
<h4>EC2 on-demand prices (Linux, shared tenancy, USD per hour)</h4>
<p>Usage:</p>
<blockquote>
<strong>
curl {host}/<span style="color: #ff0000;">{{region}}</span>/<span style="color: #ff0000;">{{instance_type}}</span><br />
curl {host}/<span style="color: #ff0000;">{{region}}</span><br />
curl {host}/<span style="color: #ff0000;">all</span><br />
</strong>
</blockquote>
<p>Examples:</p>
<blockquote>
<p>- hourly on-demand price of a t3.nano instance in eu-west-1<br />
<strong><a href="/eu-west-1/t3.nano">curl {host}/eu-west-1/t3.nano</a></strong></p>
<p>- hourly on-demand prices of all instance types in eu-west-1<br />
<strong><a href="/eu-west-1">curl {host}/eu-west-1</a></strong></p>
<p>- hourly on-demand prices of all instance types in all regions<br />
<strong><a href="/all">curl {host}/all</a></strong></p>
</blockquote>
</body>
</html>
"#
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
