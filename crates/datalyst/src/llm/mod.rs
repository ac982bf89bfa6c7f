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

pub mod client;
pub mod prompts;

pub use client::{GenerationError, ReasoningAdapter, ReasoningClient};
pub use prompts::{build_request, schema_description, SYSTEM_INSTRUCTION};

use analysis_contracts::AnalysisResponse;
use tracing::debug;

pub fn parse_analysis_response(raw: &str) -> Result<AnalysisResponse, GenerationError> {
    let candidate = extract_json_from_response(raw)
        .ok_or_else(|| GenerationError::MalformedResponse("no JSON object found".to_string()))?;
    serde_json::from_str::<AnalysisResponse>(&candidate)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
}

fn extract_json_from_response(content: &str) -> Option<String> {
    if let Some(start) = content.find("```json") {
        if let Some(end) = content[start + 7..].find("```") {
            let json_block = &content[start + 7..start + 7 + end];
            if serde_json::from_str::<serde_json::Value>(json_block.trim()).is_ok() {
                return Some(json_block.trim().to_string());
            }
        }
    }

    if let Some(start_pos) = content.find('{') {
        let mut brace_count = 0;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, char) in content[start_pos..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match char {
                '"' => in_string = !in_string,
                '\\' if in_string => escape_next = true,
                '{' if !in_string => brace_count += 1,
                '}' if !in_string => {
                    brace_count -= 1;
                    if brace_count == 0 {
                        let json_str = &content[start_pos..start_pos + i + 1];
                        if serde_json::from_str::<serde_json::Value>(json_str).is_ok() {
                            return Some(json_str.to_string());
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    debug!("No parseable JSON object in collaborator reply");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"thought_process":"t","code":"return 1","audit_log":[],"final_summary":"s"}"#;

    #[test]
    fn parses_bare_json() {
        let response = parse_analysis_response(VALID).unwrap();
        assert_eq!(response.code, "return 1");
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("Here you go:\n```json\n{VALID}\n```\n");
        let response = parse_analysis_response(&fenced).unwrap();
        assert_eq!(response.final_summary, "s");
    }

    #[test]
    fn parses_json_with_surrounding_prose() {
        let noisy = format!("Sure thing. {VALID} Let me know if you need more.");
        assert!(parse_analysis_response(&noisy).is_ok());
    }

    #[test]
    fn malformed_reply_is_a_generation_fault() {
        let error = parse_analysis_response("not json at all").unwrap_err();
        assert!(matches!(error, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn wrong_shape_is_a_generation_fault() {
        let error = parse_analysis_response(r#"{"unexpected": true}"#).unwrap_err();
        assert!(matches!(error, GenerationError::MalformedResponse(_)));
    }
}
