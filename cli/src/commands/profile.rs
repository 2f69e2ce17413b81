use clap::Subcommand;
use serde_json::json;

use crate::util::api_request;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Save the session's profile (used to personalise analysis)
    Set {
        /// Age in years (1-120)
        #[arg(long)]
        age: i32,
        /// Weight in kg (20-300)
        #[arg(long)]
        weight: f64,
        /// Height in cm (100-250)
        #[arg(long)]
        height: f64,
        #[arg(long, default_value = "")]
        gender: String,
        /// e.g. sedentary, moderate, active
        #[arg(long, default_value = "")]
        activity_level: String,
        /// e.g. lose, maintain, gain
        #[arg(long, default_value = "")]
        goal: String,
        /// Dietary restriction (repeatable)
        #[arg(long = "restriction")]
        restrictions: Vec<String>,
    },
    /// Show the session's profile
    Get,
    /// Delete the session's profile
    Reset,
}

pub async fn run(api_url: &str, session_id: &str, command: ProfileCommands) -> i32 {
    match command {
        ProfileCommands::Set {
            age,
            weight,
            height,
            gender,
            activity_level,
            goal,
            restrictions,
        } => {
            let body = json!({
                "age": age,
                "weight": weight,
                "height": height,
                "gender": gender,
                "activityLevel": activity_level,
                "goal": goal,
                "dietary_restrictions": restrictions,
            });
            api_request(api_url, reqwest::Method::POST, "/api/saveprofile", session_id, Some(body), &[])
                .await
        }
        ProfileCommands::Get => {
            api_request(api_url, reqwest::Method::GET, "/api/getprofile", session_id, None, &[]).await
        }
        ProfileCommands::Reset => {
            api_request(api_url, reqwest::Method::DELETE, "/api/resetprofile", session_id, None, &[])
                .await
        }
    }
}
