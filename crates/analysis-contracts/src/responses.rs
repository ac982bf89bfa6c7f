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

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Filter,
    Imputation,
    Calculation,
    Aggregation,
    Visualization,
    Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub step: u32,
    pub action_type: ActionType,
    pub description: String,
    #[serde(default)]
    pub technical_detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub thought_process: String,
    pub code: String,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
    pub final_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPayload {
    #[serde(rename = "chartType")]
    pub chart_type: String,
    #[serde(rename = "xKey")]
    pub x_key: String,
    #[serde(rename = "dataKeys")]
    pub data_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<Value>>,
}

impl ClassifiedResult {
    pub fn is_empty(&self) -> bool {
        self.chart.is_none() && self.table.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_response_parses_wire_contract() {
        let raw = r#"{
            "thought_process": "Filter rows, then aggregate.",
            "code": "return dataset",
            "audit_log": [
                {
                    "step": 1,
                    "action_type": "FILTER",
                    "description": "Kept rows with age > 26",
                    "technical_detail": "age > 26"
                }
            ],
            "final_summary": "One row matched."
        }"#;

        let response: AnalysisResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.audit_log.len(), 1);
        assert_eq!(response.audit_log[0].action_type, ActionType::Filter);
        assert_eq!(response.audit_log[0].step, 1);
    }

    #[test]
    fn audit_log_and_technical_detail_default_when_absent() {
        let raw = r#"{
            "thought_process": "t",
            "code": "return 1",
            "final_summary": "s"
        }"#;
        let response: AnalysisResponse = serde_json::from_str(raw).unwrap();
        assert!(response.audit_log.is_empty());
    }

    #[test]
    fn classified_result_defaults_to_empty() {
        let result = ClassifiedResult::default();
        assert!(result.is_empty());
    }
}
