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

pub mod csv;
pub mod schema;

use analysis_contracts::Row;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File is empty")]
    Empty,
    #[error("No data rows found after the header")]
    NoDataRows,
    #[error("CSV parsing error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn load_dataset(path: impl AsRef<std::path::Path>) -> Result<Dataset, IngestError> {
    let text = std::fs::read_to_string(path)?;
    csv::parse_csv(&text)
}
