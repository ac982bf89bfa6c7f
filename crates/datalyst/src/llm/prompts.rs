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

use std::fmt::Write as _;

use analysis_contracts::{AnalysisRequest, SchemaSummary};

pub const SYSTEM_INSTRUCTION: &str = r#"
You are an Expert Data Analyst and Audit Logger.
Your goal is to write Lua code to answer the user's question about their dataset, while maintaining a strict audit log.

### DATA CONTEXT
You will receive the dataset schema (columns, types, samples).
The actual data is available in the execution environment as a variable named `dataset`.
`dataset` is a 1-indexed array of records; each record is a table mapping column names to values. Missing values are nil.

### RULES:
1. **No Hallucinations:** Only use column names provided in the schema.
2. **Atomic Steps:** Break complex requests into logical steps.
3. **Lua Execution:** You must write valid Lua 5.4 code that processes the `dataset` array.
   - The code MUST end with a `return` statement.
   - If the result is a number or string, return it directly.
   - If the result is a table/list, return an array of records.
   - If the user asks for a plot/chart, OR if the data represents a ranking, distribution, comparison, or trend that would be better visualized, you SHOULD return a configuration table containing the processed data:
     `return { chartType = "bar"|"line"|"scatter"|"pie", xKey = "columnName", dataKeys = {"col1", "col2"}, data = processedArray, title = "Chart Title" }`
   - IMPORTANT: You MUST include the `data` field in the returned table. Do not rely on the `dataset` global being visible to the renderer.
   - Any calculated metrics (like percentages, totals) should be included as fields in the `data` records so they appear in the results table, even if not plotted.
4. **Structured Output:** You must output your response in valid JSON format.

### OUTPUT SCHEMA:
{
  "thought_process": "Brief explanation of the logic before writing code.",
  "code": "The executable Lua code string. It must end with a return statement.",
  "audit_log": [
    {
      "step": 1,
      "action_type": "FILTER | IMPUTATION | CALCULATION | AGGREGATION | VISUALIZATION | ANALYSIS",
      "description": "Human-readable description.",
      "technical_detail": "e.g., 'Filtered dataset where Age > 20'"
    }
  ],
  "final_summary": "A natural language answer to the user, summarizing the findings."
}
"#;

pub fn schema_description(schema: &SchemaSummary) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Dataset Schema:");
    let _ = writeln!(text, "Row Count: {}", schema.row_count);
    let _ = writeln!(text, "Columns:");
    for field in &schema.fields {
        let _ = writeln!(
            text,
            "- {} ({}): Sample value {}",
            field.name, field.field_type, field.sample
        );
    }
    text
}

pub fn build_request(schema: &SchemaSummary, query: &str) -> AnalysisRequest {
    AnalysisRequest::new(schema_description(schema), query)
}

pub fn user_prompt(request: &AnalysisRequest) -> String {
    format!(
        "{}\n\nUser Query: \"{}\"\n\nGenerate the analysis JSON.",
        request.schema_description, request.user_query
    )
}
