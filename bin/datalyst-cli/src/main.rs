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

use anyhow::{bail, Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use analysis_contracts::ReasoningConfig;
use datalyst::session::{AssistantTurn, MessageBody, MessageRole};
use datalyst::{
    load_dataset, render_report, AnalysisSession, ExecutionBudget, LuaExecutor, ReasoningClient,
    MAX_RENDER_ROWS,
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => bail!("usage: datalyst-cli <dataset.csv>"),
    };
    let analyst = std::env::var("USER").unwrap_or_else(|_| "analyst".to_string());

    let dataset = load_dataset(&path).with_context(|| format!("loading {path}"))?;

    let config = ReasoningConfig::from_env()?;
    info!(model = %config.model, "Reasoning collaborator configured");
    let client = Arc::new(ReasoningClient::new(config));

    let mut session =
        AnalysisSession::new(dataset, client, LuaExecutor::new(ExecutionBudget::default()));

    println!("Dataset ready.");
    print_schema(&session);
    println!(
        "\nAsk a question about the data. Commands: :schema, :export, :quit\n"
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            ":quit" | ":exit" => break,
            ":schema" => {
                print_schema(&session);
                continue;
            }
            ":export" => {
                export_last_turn(&session, &analyst)?;
                continue;
            }
            _ => {}
        }

        println!("Analyzing data and writing code...");
        match session.ask(input).await {
            Ok(message) => print_message(&message.body, message.failed),
            Err(error) => eprintln!("{error}"),
        }
    }

    Ok(())
}

fn print_schema(session: &AnalysisSession) {
    let schema = session.schema();
    println!(
        "{} rows, {} columns:",
        schema.row_count,
        schema.fields.len()
    );
    for field in &schema.fields {
        println!("  {:<24} {}", field.name, field.field_type);
    }
}

fn print_message(body: &MessageBody, failed: bool) {
    match body {
        MessageBody::Text(text) => {
            if failed {
                eprintln!("\n{text}\n");
            } else {
                println!("\n{text}\n");
            }
        }
        MessageBody::Analysis(turn) => print_turn(turn),
    }
}

fn print_turn(turn: &AssistantTurn) {
    println!("\n-- Reasoning --------------------------------------------------");
    println!("{}", turn.response.thought_process);
    println!("\n-- Generated Code ---------------------------------------------");
    println!("{}", turn.response.code);

    if let Some(rows) = &turn.result.table {
        println!("\n-- Result Data ({} rows) ---------------------------------", rows.len());
        print_table(rows);
    }
    if let Some(chart) = &turn.result.chart {
        println!(
            "\n[{} chart over '{}'; use :export to render it]",
            chart.chart_type, chart.x_key
        );
    }

    if !turn.response.audit_log.is_empty() {
        println!("\n-- Audit Log --------------------------------------------------");
        for entry in &turn.response.audit_log {
            println!(
                "  {:>2}. [{:?}] {} ({})",
                entry.step, entry.action_type, entry.description, entry.technical_detail
            );
        }
    }

    println!("\n{}\n", turn.response.final_summary);
}

fn print_table(rows: &[Value]) {
    let headers: Vec<&String> = match rows.first().and_then(Value::as_object) {
        Some(first) => first.keys().collect(),
        None => return,
    };
    println!("  {}", headers.iter().map(|h| h.as_str()).collect::<Vec<_>>().join(" | "));

    for row in rows.iter().take(MAX_RENDER_ROWS) {
        let cells: Vec<String> = headers
            .iter()
            .map(|header| match row.get(header.as_str()) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        println!("  {}", cells.join(" | "));
    }
    if rows.len() > MAX_RENDER_ROWS {
        println!("  ... {} more rows (full data included in export)", rows.len() - MAX_RENDER_ROWS);
    }
}

fn export_last_turn(session: &AnalysisSession, analyst: &str) -> Result<()> {
    let messages = session.messages();
    let last_turn = messages.iter().enumerate().rev().find_map(|(i, m)| {
        if m.role == MessageRole::Assistant {
            if let MessageBody::Analysis(turn) = &m.body {
                return Some((i, turn.as_ref()));
            }
        }
        None
    });

    let Some((index, turn)) = last_turn else {
        eprintln!("Nothing to export yet.");
        return Ok(());
    };

    let query = messages[..index]
        .iter()
        .rev()
        .find_map(|m| match (&m.role, &m.body) {
            (MessageRole::User, MessageBody::Text(text)) => Some(text.as_str()),
            _ => None,
        })
        .unwrap_or("");

    let report = render_report(query, &turn.response, &turn.result, analyst);
    let file_name = format!("analysis_report_{}.html", chrono::Utc::now().timestamp());
    std::fs::write(&file_name, report)?;
    println!("Report written to {file_name}");
    Ok(())
}
