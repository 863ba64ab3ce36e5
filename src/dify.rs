use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.dify.ai/v1";

/// Sent when the query text is empty. Unreachable through the chat screen
/// (input is trimmed and checked before dispatch), kept as a defensive
/// default in the request builder.
const DEFAULT_QUERY: &str = "問題を出題してください。";

const USER_ID: &str = "test-user-001";

#[derive(Serialize)]
struct ChatRequest {
    query: String,
    inputs: ChatInputs,
    response_mode: String,
    conversation_id: String,
    user: String,
    files: Vec<String>,
}

/// The three quiz parameters, forwarded with every message so the workflow
/// can keep generating questions in the chosen scope.
#[derive(Serialize, Clone)]
pub struct ChatInputs {
    pub language: String,
    pub difficulty: String,
    pub qtype: String,
}

/// Both fields are optional: a missing `answer` is rendered as a stand-in
/// string by the caller, and `conversation_id` only appears once the server
/// has opened a conversation.
#[derive(Deserialize, Debug)]
pub struct ChatReply {
    pub answer: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Clone)]
pub struct DifyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DifyClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// One blocking (non-streaming) exchange with the chat workflow.
    /// `conversation_id` is empty until the server has assigned one.
    pub async fn send_message(
        &self,
        query: &str,
        inputs: ChatInputs,
        conversation_id: &str,
    ) -> Result<ChatReply> {
        let url = format!("{}/chat-messages", self.base_url);

        let request = build_request(query, inputs, conversation_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Dify request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply)
    }
}

fn build_request(query: &str, inputs: ChatInputs, conversation_id: &str) -> ChatRequest {
    let query = if query.is_empty() { DEFAULT_QUERY } else { query };
    ChatRequest {
        query: query.to_string(),
        inputs,
        response_mode: "blocking".to_string(),
        conversation_id: conversation_id.to_string(),
        user: USER_ID.to_string(),
        files: Vec::new(),
    }
}
