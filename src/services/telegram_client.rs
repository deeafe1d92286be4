use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::subscriber::ChatDestination;

use super::notification_dispatcher::{Notifier, SendError};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

pub struct TelegramClient {
    client: Client,
    bot_token: String,
    api_base_url: String,
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramClient {
    pub fn new(
        bot_token: String,
        api_base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(TelegramClient {
            client,
            bot_token,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.bot_token, method)
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, destination: ChatDestination, text: &str) -> Result<(), SendError> {
        let res = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageBody {
                chat_id: destination.0,
                text,
            })
            .send()
            .await
            // reqwest errors carry the url, which carries the token
            .map_err(|e| SendError::Request(e.without_url().to_string()))?;

        let status = res.status();
        match res.json::<ApiResponse>().await {
            Ok(body) if status.is_success() && body.ok => Ok(()),
            Ok(body) => Err(SendError::Rejected {
                status: status.as_u16(),
                description: body.description.unwrap_or_default(),
            }),
            Err(e) => {
                log::error!("Error when deserializing to json: {:?}", e.without_url());
                Err(SendError::Rejected {
                    status: status.as_u16(),
                    description: "unreadable response body".to_string(),
                })
            }
        }
    }
}
