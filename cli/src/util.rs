use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Header the API reads the session id from.
pub const SESSION_HEADER: &str = "X-Session-ID";

/// Per-user CLI state kept between invocations.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoredSession {
    pub session_id: String,
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", pretty(&err));
    std::process::exit(4);
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("foodstats");
    config_dir.join("session.json")
}

pub fn load_session(path: &Path) -> Option<StoredSession> {
    let data = std::fs::read_to_string(path).ok()?;
    let stored: StoredSession = serde_json::from_str(&data).ok()?;
    (!stored.session_id.is_empty()).then_some(stored)
}

pub fn save_session(path: &Path, session: &StoredSession) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

/// Resolve the session id (priority order):
/// 1. `--session-id` / FOODSTATS_SESSION_ID
/// 2. the id stored at `path`
/// 3. a fresh UUID, stored at `path` for the next run
pub fn resolve_session_id(explicit: Option<String>, path: &Path) -> Result<String, String> {
    if let Some(id) = explicit.filter(|id| !id.trim().is_empty()) {
        return Ok(id);
    }
    if let Some(stored) = load_session(path) {
        return Ok(stored.session_id);
    }

    let stored = StoredSession {
        session_id: uuid::Uuid::new_v4().to_string(),
    };
    save_session(path, &stored)
        .map_err(|e| format!("Failed to store session id at '{}': {e}", path.display()))?;
    tracing::debug!(session_id = %stored.session_id, path = %path.display(), "new session stored");
    Ok(stored.session_id)
}

/// Map an HTTP status to the CLI exit code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

/// Execute an API request within `session_id`, print the response, return the exit code.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    session_id: &str,
    body: Option<serde_json::Value>,
    query: &[(&str, &str)],
) -> i32 {
    match send(api_url, method, path, session_id, body, query).await {
        Ok((status, resp_body)) => {
            let exit_code = exit_code_for(status);
            if exit_code == 0 {
                println!("{}", pretty(&resp_body));
            } else {
                eprintln!("{}", pretty(&resp_body));
            }
            exit_code
        }
        Err(code) => code,
    }
}

/// Execute an API request and return status and body without printing.
/// Errors are already reported on stderr; the value is the exit code.
pub async fn send(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    session_id: &str,
    body: Option<serde_json::Value>,
    query: &[(&str, &str)],
) -> Result<(u16, serde_json::Value), i32> {
    let url = match build_url(api_url, path, query) {
        Ok(url) => url,
        Err(message) => {
            eprintln!("{}", pretty(&json!({"error": "cli_error", "message": message})));
            return Err(4);
        }
    };

    tracing::debug!(%method, %url, "api request");
    let mut req = client()
        .request(method, url)
        .header(SESSION_HEADER, session_id);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            let err = json!({
                "error": "connection_error",
                "message": format!("{e}"),
                "docs_hint": "Is the API server running? Check FOODSTATS_API_URL."
            });
            eprintln!("{}", pretty(&err));
            return Err(3);
        }
    };

    let status = resp.status().as_u16();
    let resp_body: serde_json::Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };
    Ok((status, resp_body))
}

fn build_url(api_url: &str, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/')))
        .map_err(|e| format!("Invalid URL: {api_url}{path}: {e}"))?;
    if !query.is_empty() {
        let mut q = url.query_pairs_mut();
        for (k, v) in query {
            q.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}
