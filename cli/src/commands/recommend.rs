use serde_json::json;

use crate::util::{api_request, exit_code_for, send};

/// Ask the recommender for recipes matching `names`, or the session's
/// current ingredient names when none are given.
pub async fn run(api_url: &str, session_id: &str, names: Vec<String>) -> i32 {
    let names = if names.is_empty() {
        match send(api_url, reqwest::Method::GET, "/api/ingredients", session_id, None, &[]).await {
            Ok((200, list)) => session_names(&list),
            Ok((status, body)) => {
                eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
                return exit_code_for(status);
            }
            Err(code) => return code,
        }
    } else {
        names
    };

    api_request(
        api_url,
        reqwest::Method::POST,
        "/api/smartrecommendations",
        session_id,
        Some(json!({ "ingredients": names })),
        &[],
    )
    .await
}

fn session_names(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
