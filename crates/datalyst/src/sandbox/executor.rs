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

use mlua::{DeserializeOptions, HookTriggers, Lua, LuaSerdeExt, MultiValue, SerializeOptions, Value as LuaValue, VmState};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use analysis_contracts::Row;

use super::{CodeExecutor, ExecutionBudget, ExecutionFault};

#[derive(Debug, Clone, Default)]
pub struct LuaExecutor {
    budget: ExecutionBudget,
}

impl LuaExecutor {
    pub fn new(budget: ExecutionBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &ExecutionBudget {
        &self.budget
    }

    fn build_sandbox(&self, dataset: &[Row]) -> mlua::Result<Lua> {
        let lua = Lua::new();

        {
            let globals = lua.globals();
            for name in [
                "os", "io", "debug", "package", "require", "load", "loadfile", "dofile",
            ] {
                globals.set(name, LuaValue::Nil)?;
            }

            let print_fn = lua.create_function(|_, args: MultiValue| {
                let line = args
                    .iter()
                    .map(display_lua_value)
                    .collect::<Vec<_>>()
                    .join("\t");
                debug!(line = %line, "sandbox print");
                Ok(())
            })?;
            globals.set("print", print_fn)?;

            let options = SerializeOptions::new()
                .serialize_none_to_null(false)
                .serialize_unit_to_null(false);
            let rows = lua.to_value_with(dataset, options)?;
            globals.set("dataset", rows)?;
        }

        Ok(lua)
    }
}

impl CodeExecutor for LuaExecutor {
    fn run(&self, code: &str, dataset: &[Row]) -> Result<Value, ExecutionFault> {
        let lua = self
            .build_sandbox(dataset)
            .map_err(|e| ExecutionFault::Setup(e.to_string()))?;

        let start = Instant::now();
        let timeout = self.budget.timeout;
        let hook_interval = self.budget.hook_interval;
        let instruction_limit = self.budget.instruction_limit;
        let remaining = Arc::new(AtomicI64::new(instruction_limit));
        let timed_out = Arc::new(AtomicBool::new(false));
        let out_of_budget = Arc::new(AtomicBool::new(false));

        {
            let remaining = remaining.clone();
            let timed_out = timed_out.clone();
            let out_of_budget = out_of_budget.clone();
            lua.set_hook(
                HookTriggers::new().every_nth_instruction(hook_interval),
                move |_lua, _debug| {
                    if start.elapsed() > timeout {
                        timed_out.store(true, Ordering::Relaxed);
                        return Err(mlua::Error::RuntimeError("execution timeout".to_string()));
                    }
                    let left = remaining.fetch_sub(hook_interval as i64, Ordering::Relaxed);
                    if left <= 0 {
                        out_of_budget.store(true, Ordering::Relaxed);
                        return Err(mlua::Error::RuntimeError(
                            "instruction limit exceeded".to_string(),
                        ));
                    }
                    Ok(VmState::Continue)
                },
            );
        }

        let evaluated = lua.load(code).set_name("generated analysis").eval::<LuaValue>();
        lua.remove_hook();

        let value = match evaluated {
            Ok(value) => value,
            Err(error) => {
                if timed_out.load(Ordering::Relaxed) {
                    return Err(ExecutionFault::Timeout(timeout.as_secs()));
                }
                if out_of_budget.load(Ordering::Relaxed) {
                    return Err(ExecutionFault::InstructionLimit(instruction_limit));
                }
                return Err(ExecutionFault::Runtime(short_message(&error)));
            }
        };

        let options = DeserializeOptions::new()
            .deny_unsupported_types(false)
            .deny_recursive_tables(false);
        match lua.from_value_with::<Value>(value, options) {
            Ok(json) => {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Generated code executed");
                Ok(json)
            }
            Err(error) => {
                warn!(error = %error, "Execution result not representable; treating as empty");
                Ok(Value::Null)
            }
        }
    }
}

fn short_message(error: &mlua::Error) -> String {
    let full = error.to_string();
    let first = full
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("unknown error");
    first.trim().to_string()
}

fn display_lua_value(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => n.to_string(),
        LuaValue::String(s) => s.to_string_lossy().to_string(),
        other => format!("<{}>", other.type_name()),
    }
}
