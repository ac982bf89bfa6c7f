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

use analysis_contracts::Row;
use csv::ReaderBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Dataset, IngestError};

pub fn parse_csv(text: &str) -> Result<Dataset, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(IngestError::Empty),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::Empty);
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        let record = record?;
        let mut fields: Vec<&str> = record.iter().collect();

        if fields.iter().all(|f| f.trim().is_empty()) && fields.len() <= 1 {
            continue;
        }

        if fields.len() == headers.len() + 1 && fields[headers.len()].is_empty() {
            fields.truncate(headers.len());
        }

        if fields.len() > headers.len() {
            dropped += 1;
            continue;
        }

        let mut row = Row::new();
        for (index, header) in headers.iter().enumerate() {
            let value = match fields.get(index) {
                Some(raw) => coerce_scalar(raw.trim()),
                None => Value::Null,
            };
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    if dropped > 0 {
        warn!(dropped, "Dropped rows with more fields than the header");
    }
    if rows.is_empty() {
        return Err(IngestError::NoDataRows);
    }

    debug!(
        rows = rows.len(),
        columns = headers.len(),
        "Parsed CSV dataset"
    );
    Ok(Dataset { headers, rows })
}

fn coerce_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields_keep_commas_and_escaped_quotes() {
        let dataset = parse_csv("name,quote\n\"Smith, Jane\",\"she said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(dataset.rows[0]["name"], "Smith, Jane");
        assert_eq!(dataset.rows[0]["quote"], "she said \"hi\"");
    }

    #[test]
    fn numeric_coercion_prefers_integers() {
        let dataset = parse_csv("a,b,c\n42,3.5,007x\n").unwrap();
        assert_eq!(dataset.rows[0]["a"], serde_json::json!(42));
        assert_eq!(dataset.rows[0]["b"], serde_json::json!(3.5));
        assert_eq!(dataset.rows[0]["c"], "007x");
    }

    #[test]
    fn empty_input_is_an_ingestion_fault() {
        assert!(matches!(parse_csv("   \n  "), Err(IngestError::Empty)));
    }
}
