use crate::util::api_request;

pub async fn run(api_url: &str, session_id: &str) -> i32 {
    api_request(
        api_url,
        reqwest::Method::GET,
        "/api/health",
        session_id,
        None,
        &[],
    )
    .await
}
