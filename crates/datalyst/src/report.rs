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

use askama_escape::{escape, Html};
use chrono::Utc;
use serde_json::Value;
use std::fmt::Write as _;

use analysis_contracts::{AnalysisResponse, ClassifiedResult};

pub const MAX_RENDER_ROWS: usize = 100;

fn esc(text: &str) -> String {
    escape(text, Html).to_string()
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn table_section(rows: &[Value]) -> String {
    let headers: Vec<&String> = match rows.first().and_then(Value::as_object) {
        Some(first) => first.keys().collect(),
        None => return String::new(),
    };

    let mut html = String::new();
    let _ = write!(html, "<section><h2>Results Data</h2><table><thead><tr>");
    for header in &headers {
        let _ = write!(html, "<th>{}</th>", esc(header.as_str()));
    }
    let _ = write!(html, "</tr></thead><tbody>");
    for row in rows.iter().take(MAX_RENDER_ROWS) {
        let object = row.as_object();
        let _ = write!(html, "<tr>");
        for header in &headers {
            let value = object.and_then(|o| o.get(header.as_str()));
            let _ = write!(html, "<td>{}</td>", esc(&cell_text(value)));
        }
        let _ = write!(html, "</tr>");
    }
    let _ = write!(html, "</tbody></table>");
    if rows.len() > MAX_RENDER_ROWS {
        let _ = write!(
            html,
            "<p class=\"note\">... {} more rows not shown ...</p>",
            rows.len() - MAX_RENDER_ROWS
        );
    }
    let _ = write!(html, "</section>");
    html
}

fn audit_section(response: &AnalysisResponse) -> String {
    if response.audit_log.is_empty() {
        return String::new();
    }
    let mut html = String::new();
    let _ = write!(
        html,
        "<section><h2>Audit Log</h2><table><thead><tr>\
         <th>Step</th><th>Action</th><th>Description</th><th>Technical Detail</th>\
         </tr></thead><tbody>"
    );
    for entry in &response.audit_log {
        let action = serde_json::to_string(&entry.action_type)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            entry.step,
            esc(&action),
            esc(&entry.description),
            esc(&entry.technical_detail)
        );
    }
    let _ = write!(html, "</tbody></table></section>");
    html
}

fn chart_section(result: &ClassifiedResult) -> (String, String) {
    let chart = match &result.chart {
        Some(chart) if !chart.data.is_empty() => chart,
        _ => return (String::new(), String::new()),
    };
    let config_json = serde_json::to_string(chart)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    let section =
        "<section><h2>Visualization</h2><div id=\"chart\"></div></section>".to_string();
    let script = format!(
        r#"<script src="https://cdn.jsdelivr.net/npm/apexcharts"></script>
<script>
(function() {{
  try {{
    const config = {config_json};
    const series = config.dataKeys.map(key => ({{
      name: key,
      data: config.data.map(row => row[key])
    }}));
    const options = {{
      chart: {{ height: 400, type: config.chartType }},
      title: {{ text: config.title || undefined }},
      series: series,
      xaxis: {{ categories: config.data.map(row => row[config.xKey]) }}
    }};
    new ApexCharts(document.querySelector('#chart'), options).render();
  }} catch (e) {{
    document.querySelector('#chart').textContent = 'Chart rendering failed.';
  }}
}})();
</script>"#
    );
    (section, script)
}

pub fn render_report(
    query: &str,
    response: &AnalysisResponse,
    result: &ClassifiedResult,
    analyst: &str,
) -> String {
    let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let (chart_html, chart_script) = chart_section(result);
    let table_html = result
        .table
        .as_deref()
        .map(table_section)
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Analysis Report</title>
<style>
body {{ font-family: -apple-system, "Segoe UI", sans-serif; margin: 2rem auto; max-width: 960px; color: #1f2937; }}
h1 {{ font-size: 1.5rem; }}
h2 {{ font-size: 1.1rem; border-bottom: 1px solid #e5e7eb; padding-bottom: 0.3rem; }}
section {{ margin: 1.5rem 0; }}
table {{ border-collapse: collapse; width: 100%; font-size: 0.85rem; }}
th, td {{ border: 1px solid #e5e7eb; padding: 0.35rem 0.6rem; text-align: left; }}
th {{ background: #f9fafb; }}
pre {{ background: #111827; color: #f9fafb; padding: 1rem; border-radius: 6px; overflow-x: auto; }}
.meta, .note {{ color: #6b7280; font-size: 0.85rem; }}
blockquote {{ border-left: 3px solid #6366f1; margin: 0; padding-left: 1rem; color: #374151; }}
</style>
</head>
<body>
<h1>Analysis Report</h1>
<p class="meta">Generated {generated_at} &bull; Analyst: {analyst}</p>
<section><h2>Question</h2><blockquote>{query}</blockquote></section>
<section><h2>Summary</h2><p>{summary}</p></section>
{chart_html}
{table_html}
<section><h2>Reasoning</h2><p>{thought}</p></section>
<section><h2>Generated Code</h2><pre><code>{code}</code></pre></section>
{audit_html}
{chart_script}
</body>
</html>
"#,
        analyst = esc(analyst),
        query = esc(query),
        summary = esc(&response.final_summary),
        thought = esc(&response.thought_process),
        code = esc(&response.code),
        audit_html = audit_section(response),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_contracts::{ActionType, AuditEntry, ChartPayload};
    use serde_json::json;

    fn sample_response() -> AnalysisResponse {
        AnalysisResponse {
            thought_process: "Filter <then> aggregate".into(),
            code: "return dataset".into(),
            audit_log: vec![AuditEntry {
                step: 1,
                action_type: ActionType::Aggregation,
                description: "Grouped by name".into(),
                technical_detail: "group & sum".into(),
            }],
            final_summary: "Done".into(),
        }
    }

    #[test]
    fn interpolated_text_is_html_escaped() {
        let report = render_report(
            "<script>alert(1)</script>",
            &sample_response(),
            &ClassifiedResult::default(),
            "jane",
        );
        assert!(!report.contains("<script>alert(1)</script>"));
        assert!(report.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(report.contains("Filter &lt;then&gt; aggregate"));
        assert!(report.contains("group &amp; sum"));
    }

    #[test]
    fn table_rows_are_capped_with_a_note() {
        let rows: Vec<_> = (0..150).map(|i| json!({"n": i})).collect();
        let result = ClassifiedResult {
            chart: None,
            table: Some(rows),
        };
        let mut response = sample_response();
        response.audit_log.clear();
        let report = render_report("q", &response, &result, "jane");
        assert!(report.contains("... 50 more rows not shown ..."));
        assert_eq!(report.matches("<tr><td>").count(), MAX_RENDER_ROWS);
    }

    #[test]
    fn chart_payload_is_embedded_as_json() {
        let result = ClassifiedResult {
            chart: Some(ChartPayload {
                chart_type: "bar".into(),
                x_key: "name".into(),
                data_keys: vec!["age".into()],
                title: None,
                data: vec![json!({"name": "A", "age": 30})],
            }),
            table: None,
        };
        let report = render_report("q", &sample_response(), &result, "jane");
        assert!(report.contains("\"chartType\":\"bar\""));
        assert!(report.contains("apexcharts"));
    }

    #[test]
    fn chart_json_cannot_break_out_of_the_script_block() {
        let result = ClassifiedResult {
            chart: Some(ChartPayload {
                chart_type: "bar".into(),
                x_key: "name".into(),
                data_keys: vec!["age".into()],
                title: Some("</script><script>alert(1)".into()),
                data: vec![json!({"name": "</script>", "age": 30})],
            }),
            table: None,
        };
        let report = render_report("q", &sample_response(), &result, "jane");
        assert!(!report.contains("</script><script>alert(1)"));
        assert!(report.contains("<\\/script>"));
    }
}
