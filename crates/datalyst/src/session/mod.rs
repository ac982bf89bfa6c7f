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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use analysis_contracts::{AnalysisResponse, ClassifiedResult, SchemaSummary};

use crate::classify::classify;
use crate::ingest::{schema::infer_schema, Dataset};
use crate::llm::{build_request, client::ReasoningAdapter, parse_analysis_response};
use crate::sandbox::{CodeExecutor, LuaExecutor};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A question is already being processed")]
    Busy,
    #[error("Question is empty")]
    EmptyQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub response: AnalysisResponse,
    pub result: ClassifiedResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Analysis(Box<AssistantTurn>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
    pub failed: bool,
}

impl ChatMessage {
    fn user(text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::User,
            body: MessageBody::Text(text.to_string()),
            timestamp: Utc::now(),
            failed: false,
        }
    }

    fn assistant(turn: AssistantTurn) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::Assistant,
            body: MessageBody::Analysis(Box::new(turn)),
            timestamp: Utc::now(),
            failed: false,
        }
    }

    fn assistant_fault(text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::Assistant,
            body: MessageBody::Text(text),
            timestamp: Utc::now(),
            failed: true,
        }
    }
}

pub struct AnalysisSession {
    dataset: Dataset,
    schema: SchemaSummary,
    adapter: Arc<dyn ReasoningAdapter>,
    executor: LuaExecutor,
    messages: Vec<ChatMessage>,
    busy: bool,
}

impl AnalysisSession {
    pub fn new(dataset: Dataset, adapter: Arc<dyn ReasoningAdapter>, executor: LuaExecutor) -> Self {
        let schema = infer_schema(&dataset);
        info!(
            rows = schema.row_count,
            columns = schema.fields.len(),
            "Analysis session ready"
        );
        Self {
            dataset,
            schema,
            adapter,
            executor,
            messages: Vec::new(),
            busy: false,
        }
    }

    pub fn schema(&self) -> &SchemaSummary {
        &self.schema
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.busy = false;
    }

    pub async fn ask(&mut self, question: &str) -> Result<ChatMessage, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        if self.busy {
            return Err(SessionError::Busy);
        }
        self.busy = true;

        self.messages.push(ChatMessage::user(question));
        let message = self.run_turn(question).await;
        self.messages.push(message.clone());

        self.busy = false;
        Ok(message)
    }

    async fn run_turn(&self, question: &str) -> ChatMessage {
        let request = build_request(&self.schema, question);

        let raw_reply = match self.adapter.generate(&request).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(error = %error, "Reasoning collaborator call failed");
                return ChatMessage::assistant_fault(
                    "I apologize, but I encountered an error processing your request. \
                     Please try again or rephrase your question."
                        .to_string(),
                );
            }
        };

        let mut response = match parse_analysis_response(&raw_reply) {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "Collaborator reply was not a valid analysis document");
                return ChatMessage::assistant_fault(
                    "I apologize, but I could not interpret the analysis output. \
                     Please try again or rephrase your question."
                        .to_string(),
                );
            }
        };

        let result = match self.executor.run(&response.code, &self.dataset.rows) {
            Ok(raw) => classify(&raw),
            Err(fault) => {
                warn!(fault = %fault, "Generated code faulted during execution");
                response.final_summary.push_str(&format!(
                    "\n\n**Note:** I encountered an error while calculating the exact numbers: {fault}"
                ));
                ClassifiedResult::default()
            }
        };

        ChatMessage::assistant(AssistantTurn { response, result })
    }
}
