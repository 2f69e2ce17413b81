use crate::util::{api_request, exit_error, read_json_from_file, send};

/// Analyze the session's current list, or an ingredient list read from `file`.
pub async fn run(api_url: &str, session_id: &str, file: Option<&str>) -> i32 {
    let ingredients = match file {
        Some(path) => read_json_from_file(path).unwrap_or_else(|e| exit_error(&e, None)),
        None => match send(api_url, reqwest::Method::GET, "/api/ingredients", session_id, None, &[]).await {
            Ok((200, list)) => list,
            Ok((status, body)) => {
                eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
                return crate::util::exit_code_for(status);
            }
            Err(code) => return code,
        },
    };

    if ingredients.as_array().is_some_and(|list| list.is_empty()) {
        tracing::warn!("analyzing an empty ingredient list");
    }

    api_request(
        api_url,
        reqwest::Method::POST,
        "/api/analyzenutrition",
        session_id,
        Some(ingredients),
        &[],
    )
    .await
}
