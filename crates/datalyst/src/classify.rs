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

use serde_json::{Map, Value};
use tracing::{debug, warn};

use analysis_contracts::{ChartPayload, ClassifiedResult};

pub fn classify(raw: &Value) -> ClassifiedResult {
    match raw {
        Value::Null => ClassifiedResult::default(),
        Value::Object(object) if chart_hint(object).is_some() => classify_chart(object),
        Value::Array(rows) if !rows.is_empty() => ClassifiedResult {
            chart: None,
            table: Some(rows.clone()),
        },
        Value::Object(object) => classify_composite(object),
        _ => ClassifiedResult::default(),
    }
}

fn chart_hint(object: &Map<String, Value>) -> Option<&str> {
    object
        .get("chartType")
        .or_else(|| object.get("type"))
        .and_then(Value::as_str)
}

fn classify_chart(object: &Map<String, Value>) -> ClassifiedResult {
    let chart_type = chart_hint(object).unwrap_or_default().to_string();

    let data = match object.get("data") {
        Some(Value::Array(rows)) => rows.clone(),
        _ => {
            warn!(chart_type = %chart_type, "Chart configuration detected but data is missing or invalid");
            return ClassifiedResult::default();
        }
    };

    let x_key = match object.get("xKey").and_then(Value::as_str) {
        Some(key) => key.to_string(),
        None => {
            warn!(chart_type = %chart_type, "Chart configuration has no xKey");
            String::new()
        }
    };
    let data_keys = object
        .get("dataKeys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);

    ClassifiedResult {
        table: Some(data.clone()),
        chart: Some(ChartPayload {
            chart_type,
            x_key,
            data_keys,
            title,
            data,
        }),
    }
}

fn classify_composite(object: &Map<String, Value>) -> ClassifiedResult {
    let nested_table = object.values().find_map(|value| match value {
        Value::Array(rows) if !rows.is_empty() && rows[0].is_object() => Some(rows.clone()),
        _ => None,
    });
    if let Some(rows) = nested_table {
        return ClassifiedResult {
            chart: None,
            table: Some(rows),
        };
    }

    let flat = !object.is_empty()
        && object
            .values()
            .all(|value| !value.is_object() && !value.is_array());
    if flat {
        return ClassifiedResult {
            chart: None,
            table: Some(vec![Value::Object(object.clone())]),
        };
    }

    debug!("Composite result had no displayable table");
    ClassifiedResult::default()
}
