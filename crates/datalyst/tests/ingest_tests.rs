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

use datalyst::{infer_schema, parse_csv, IngestError};
use serde_json::{json, Value};

#[test]
fn row_count_matches_non_empty_data_lines_and_fields_match_headers() {
    let text = "name,age,city\nA,30,Oslo\n\nB,25,Bergen\n";
    let dataset = parse_csv(text).unwrap();
    let schema = infer_schema(&dataset);

    assert_eq!(schema.row_count, 2);
    assert_eq!(schema.fields.len(), 3);
    assert_eq!(dataset.headers, vec!["name", "age", "city"]);
}

#[test]
fn trailing_comma_rows_are_truncated_to_header_length() {
    let dataset = parse_csv("a,b\n1,2,\n").unwrap();
    assert_eq!(dataset.rows.len(), 1);
    assert_eq!(dataset.rows[0].len(), 2);
    assert_eq!(dataset.rows[0]["b"], json!(2));
}

#[test]
fn rows_longer_than_the_header_are_dropped() {
    let dataset = parse_csv("a,b\n1,2\n1,2,3,4\n5,6\n").unwrap();
    assert_eq!(dataset.rows.len(), 2);
}

#[test]
fn short_rows_are_padded_with_nulls() {
    let dataset = parse_csv("a,b,c\n1,2\n").unwrap();
    assert_eq!(dataset.rows[0]["c"], Value::Null);
}

#[test]
fn quoted_commas_and_escaped_quotes_survive() {
    let dataset = parse_csv("who,said\n\"Doe, J.\",\"\"\"fine\"\"\"\n").unwrap();
    assert_eq!(dataset.rows[0]["who"], "Doe, J.");
    assert_eq!(dataset.rows[0]["said"], "\"fine\"");
}

#[test]
fn numeric_looking_values_are_coerced() {
    let dataset = parse_csv("n,f,s\n7,2.25,7a\n").unwrap();
    assert_eq!(dataset.rows[0]["n"], json!(7));
    assert_eq!(dataset.rows[0]["f"], json!(2.25));
    assert_eq!(dataset.rows[0]["s"], "7a");
}

#[test]
fn empty_file_and_header_only_are_ingestion_faults() {
    assert!(matches!(parse_csv(""), Err(IngestError::Empty)));
    assert!(matches!(parse_csv("a,b\n"), Err(IngestError::NoDataRows)));
}

#[test]
fn schema_preview_reflects_the_first_rows() {
    let dataset = parse_csv("name,age\nA,30\nB,25\n").unwrap();
    let schema = infer_schema(&dataset);
    assert_eq!(schema.preview.len(), 2);
    assert_eq!(schema.preview[0], json!({"name": "A", "age": 30}));
}
