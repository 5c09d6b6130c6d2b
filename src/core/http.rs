use std::time::Duration;

use reqwest::blocking::{
    Client,
    Response,
};

use crate::core::SpeechBubbleError;

pub const USER_AGENT: &str = "speechbubble/0.1 (+reqwest)";

pub fn http_client() -> Result<Client, SpeechBubbleError> {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SpeechBubbleError::Custom(format!("HTTP client build failed: {e}")))
}

/// Turns a non-2xx response into `SpeechBubbleError::Http`, handing the response back otherwise.
pub fn ensure_success(resp: Response) -> Result<Response, SpeechBubbleError> {
    let status = resp.status();
    if !status.is_success() {
        let url = resp.url().to_string();
        let body = resp.text().unwrap_or_default();
        log::debug!("HTTP {} from {}: {}", status, url, body);
        return Err(SpeechBubbleError::Http { status: status.as_u16(), url });
    }
    Ok(resp)
}
