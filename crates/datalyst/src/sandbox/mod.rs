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

mod executor;

pub use executor::LuaExecutor;

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use analysis_contracts::Row;

pub const INSTRUCTION_LIMIT: i64 = 50_000_000;

pub const INSTRUCTION_HOOK_INTERVAL: u32 = 10_000;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ExecutionBudget {
    pub instruction_limit: i64,
    pub hook_interval: u32,
    pub timeout: Duration,
}

impl Default for ExecutionBudget {
    fn default() -> Self {
        Self {
            instruction_limit: INSTRUCTION_LIMIT,
            hook_interval: INSTRUCTION_HOOK_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ExecutionFault {
    #[error("Code execution failed: {0}")]
    Runtime(String),
    #[error("execution timeout ({0}s limit)")]
    Timeout(u64),
    #[error("instruction limit exceeded ({0} instructions)")]
    InstructionLimit(i64),
    #[error("sandbox setup failed: {0}")]
    Setup(String),
}

pub trait CodeExecutor {
    fn run(&self, code: &str, dataset: &[Row]) -> Result<Value, ExecutionFault>;
}
