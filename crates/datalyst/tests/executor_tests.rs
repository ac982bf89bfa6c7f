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

use std::time::Duration;

use analysis_contracts::Row;
use datalyst::{classify, CodeExecutor, ExecutionBudget, ExecutionFault, LuaExecutor};
use serde_json::{json, Value};

fn people() -> Vec<Row> {
    let rows = json!([
        {"name": "A", "age": 30},
        {"name": "B", "age": 25}
    ]);
    rows.as_array()
        .unwrap()
        .iter()
        .map(|row| row.as_object().unwrap().clone())
        .collect()
}

#[test]
fn filter_scenario_returns_matching_rows() {
    let executor = LuaExecutor::default();
    let code = r#"
        local out = {}
        for _, row in ipairs(dataset) do
            if row.age > 26 then
                out[#out + 1] = row
            end
        end
        return out
    "#;

    let raw = executor.run(code, &people()).unwrap();
    assert_eq!(raw, json!([{"name": "A", "age": 30}]));

    let result = classify(&raw);
    assert_eq!(result.table, Some(vec![json!({"name": "A", "age": 30})]));
    assert!(result.chart.is_none());
}

#[test]
fn chart_config_round_trips_through_the_sandbox() {
    let executor = LuaExecutor::default();
    let code = r#"
        return {
            chartType = "bar",
            xKey = "name",
            dataKeys = {"age"},
            data = {{name = "A", age = 30}},
        }
    "#;

    let raw = executor.run(code, &people()).unwrap();
    let result = classify(&raw);

    let chart = result.chart.expect("chart payload");
    assert_eq!(chart.chart_type, "bar");
    assert_eq!(chart.x_key, "name");
    assert_eq!(chart.data_keys, vec!["age".to_string()]);
    assert_eq!(result.table, Some(vec![json!({"name": "A", "age": 30})]));
}

#[test]
fn runtime_faults_are_contained_and_the_executor_stays_usable() {
    let executor = LuaExecutor::default();

    let fault = executor.run("error('kaput')", &people()).unwrap_err();
    assert!(matches!(fault, ExecutionFault::Runtime(_)));
    assert!(fault.to_string().contains("kaput"));

    let fault = executor.run("return nil + 1", &people()).unwrap_err();
    assert!(matches!(fault, ExecutionFault::Runtime(_)));

    let raw = executor.run("return #dataset", &people()).unwrap();
    assert_eq!(raw, json!(2));
}

#[test]
fn missing_return_yields_null() {
    let executor = LuaExecutor::default();
    let raw = executor.run("local x = 1 + 1", &people()).unwrap();
    assert_eq!(raw, Value::Null);
    assert!(classify(&raw).is_empty());
}

#[test]
fn scripts_cannot_mutate_the_shared_dataset() {
    let executor = LuaExecutor::default();
    let rows = people();

    let raw = executor
        .run("dataset[1].age = 999 return dataset[1].age", &rows)
        .unwrap();
    assert_eq!(raw, json!(999));

    assert_eq!(rows[0]["age"], json!(30));
}

#[test]
fn dangerous_globals_are_stripped() {
    let executor = LuaExecutor::default();
    let code = "return os == nil and io == nil and require == nil and load == nil";
    let raw = executor.run(code, &people()).unwrap();
    assert_eq!(raw, json!(true));
}

#[test]
fn runaway_loops_hit_the_instruction_budget() {
    let executor = LuaExecutor::new(ExecutionBudget {
        instruction_limit: 100_000,
        hook_interval: 1_000,
        timeout: Duration::from_secs(30),
    });

    let fault = executor.run("while true do end", &people()).unwrap_err();
    assert!(matches!(fault, ExecutionFault::InstructionLimit(_)));
}

#[test]
fn null_dataset_values_surface_as_nil() {
    let executor = LuaExecutor::default();
    let rows: Vec<Row> = vec![json!({"name": "A", "age": null})
        .as_object()
        .unwrap()
        .clone()];

    let raw = executor.run("return dataset[1].age == nil", &rows).unwrap();
    assert_eq!(raw, json!(true));
}
