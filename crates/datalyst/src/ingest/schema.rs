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

use analysis_contracts::{FieldType, SchemaField, SchemaSummary};
use serde_json::Value;

use super::Dataset;

const PREVIEW_ROWS: usize = 3;

pub fn infer_schema(dataset: &Dataset) -> SchemaSummary {
    let fields = dataset
        .headers
        .iter()
        .map(|header| {
            let sample = dataset
                .rows
                .iter()
                .filter_map(|row| row.get(header))
                .find(|value| !is_absent(value))
                .cloned()
                .unwrap_or(Value::Null);
            SchemaField {
                name: header.clone(),
                field_type: FieldType::of(&sample),
                sample,
            }
        })
        .collect();

    SchemaSummary {
        fields,
        row_count: dataset.rows.len(),
        preview: dataset
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|row| Value::Object(row.clone()))
            .collect(),
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::csv::parse_csv;

    #[test]
    fn first_non_empty_value_fixes_type_and_sample() {
        let dataset = parse_csv("name,age\n,\nA,30\n").unwrap();
        let schema = infer_schema(&dataset);
        assert_eq!(schema.fields[0].field_type, FieldType::Text);
        assert_eq!(schema.fields[0].sample, "A");
        assert_eq!(schema.fields[1].field_type, FieldType::Number);
        assert_eq!(schema.fields[1].sample, serde_json::json!(30));
    }

    #[test]
    fn all_empty_column_is_unknown_with_null_sample() {
        let dataset = parse_csv("a,b\n1,\n2,\n").unwrap();
        let schema = infer_schema(&dataset);
        assert_eq!(schema.fields[1].field_type, FieldType::Unknown);
        assert_eq!(schema.fields[1].sample, Value::Null);
    }

    #[test]
    fn preview_holds_at_most_three_rows() {
        let dataset = parse_csv("a\n1\n2\n3\n4\n5\n").unwrap();
        let schema = infer_schema(&dataset);
        assert_eq!(schema.row_count, 5);
        assert_eq!(schema.preview.len(), 3);
    }
}
