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

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::types::{ContractError, ContractResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub api_version: String,
}

impl ReasoningConfig {
    pub fn anthropic() -> ContractResult<Self> {
        dotenv().ok();
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ContractError::Configuration("ANTHROPIC_API_KEY environment variable not set".into())
        })?;

        Ok(Self {
            endpoint: std::env::var("ANTHROPIC_ENDPOINT")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string()),
            api_key,
            model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
            max_tokens: std::env::var("ANTHROPIC_MAX_TOKENS")
                .unwrap_or_else(|_| "8192".to_string())
                .parse()
                .unwrap_or(8192),
            temperature: std::env::var("ANTHROPIC_TEMPERATURE")
                .unwrap_or_else(|_| "0.1".to_string())
                .parse()
                .unwrap_or(0.1),
            api_version: std::env::var("ANTHROPIC_API_VERSION")
                .unwrap_or_else(|_| "2023-06-01".to_string()),
        })
    }

    pub fn ollama(model: String) -> ContractResult<Self> {
        dotenv().ok();

        Ok(Self {
            endpoint: std::env::var("OLLAMA_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:11434/api/generate".to_string()),
            api_key: String::new(),
            model,
            max_tokens: std::env::var("OLLAMA_MAX_TOKENS")
                .unwrap_or_else(|_| "8192".to_string())
                .parse()
                .unwrap_or(8192),
            temperature: std::env::var("OLLAMA_TEMPERATURE")
                .unwrap_or_else(|_| "0.1".to_string())
                .parse()
                .unwrap_or(0.1),
            api_version: String::new(),
        })
    }

    pub fn from_env() -> ContractResult<Self> {
        dotenv().ok();
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            Self::anthropic()
        } else {
            let model =
                std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.1:8b".to_string());
            Self::ollama(model)
        }
    }
}
