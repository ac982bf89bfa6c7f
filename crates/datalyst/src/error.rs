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

use thiserror::Error;

use crate::ingest::IngestError;
use crate::llm::client::GenerationError;
use crate::sandbox::ExecutionFault;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum DatalystError {
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestError),
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("Execution fault: {0}")]
    Execution(#[from] ExecutionFault),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
