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

pub mod classify;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod report;
pub mod sandbox;
pub mod session;

pub use classify::classify;
pub use error::DatalystError;
pub use ingest::{csv::parse_csv, load_dataset, schema::infer_schema, Dataset, IngestError};
pub use llm::{
    client::{GenerationError, ReasoningAdapter, ReasoningClient},
    parse_analysis_response,
};
pub use report::{render_report, MAX_RENDER_ROWS};
pub use sandbox::{CodeExecutor, ExecutionBudget, ExecutionFault, LuaExecutor};
pub use session::{AnalysisSession, ChatMessage, MessageBody, MessageRole, SessionError};
