// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use analysis_contracts::{AnalysisRequest, ReasoningConfig};

use super::prompts::{user_prompt, SYSTEM_INSTRUCTION};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Reasoning service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Reasoning service returned no content")]
    MissingContent,
    #[error("Failed to parse reasoning engine output: {0}")]
    MalformedResponse(String),
    #[error("Reasoning service configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait ReasoningAdapter: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct ReasoningClient {
    config: ReasoningConfig,
    http: Client,
}

enum Provider {
    Anthropic,
    Ollama,
}

impl ReasoningClient {
    pub fn new(config: ReasoningConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    fn provider(&self) -> Provider {
        if self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama") {
            Provider::Ollama
        } else {
            Provider::Anthropic
        }
    }
}

#[async_trait]
impl ReasoningAdapter for ReasoningClient {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, GenerationError> {
        let prompt = user_prompt(request);

        let body: Value = match self.provider() {
            Provider::Anthropic => {
                let payload = json!({
                    "model": self.config.model,
                    "max_tokens": self.config.max_tokens,
                    "system": SYSTEM_INSTRUCTION,
                    "messages": [{ "role": "user", "content": prompt }],
                    "temperature": self.config.temperature,
                });
                debug!(model = %self.config.model, "Sending analysis request to Anthropic API");
                self.http
                    .post(&self.config.endpoint)
                    .header("x-api-key", &self.config.api_key)
                    .header("anthropic-version", &self.config.api_version)
                    .header("content-type", "application/json")
                    .json(&payload)
                    .send()
                    .await?
                    .json()
                    .await?
            }
            Provider::Ollama => {
                let payload = json!({
                    "model": self.config.model,
                    "prompt": format!("{SYSTEM_INSTRUCTION}\n\n{prompt}"),
                    "stream": false,
                    "options": {
                        "temperature": self.config.temperature,
                        "num_predict": self.config.max_tokens,
                    },
                });
                debug!(model = %self.config.model, "Sending analysis request to Ollama API");
                self.http
                    .post(&self.config.endpoint)
                    .header("content-type", "application/json")
                    .json(&payload)
                    .send()
                    .await?
                    .json()
                    .await?
            }
        };

        let content = match self.provider() {
            Provider::Anthropic => body
                .get("content")
                .and_then(Value::as_array)
                .and_then(|blocks| blocks.first())
                .and_then(|block| block.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string),
            Provider::Ollama => body
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        content.ok_or(GenerationError::MissingContent)
    }
}
