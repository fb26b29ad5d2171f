//! Console rendering for listings.
//!
//! Every renderer returns a `String` so commands print once and tests can
//! inspect the text. Table columns are padded before colouring, so ANSI codes
//! never skew the alignment.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;

use crate::inventory::ApiDetail;
use crate::models::{Api, Backend};

const SEPARATOR: &str = "------------------------------------------------------------";

/// How listings are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Aligned columns, one row per entity
    #[default]
    Table,
    /// One labelled block per entity
    List,
}

struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        let _ = writeln!(out, "{}", line(self.headers.clone()).bright_magenta());
        for row in &self.rows {
            let _ = writeln!(out, "{}", line(row.iter().map(String::as_str).collect()));
        }
        out
    }
}

fn label(text: &str) -> ColoredString {
    format!("{text} : ").bright_black()
}

/// Colour an HTTP method by verb.
#[must_use]
pub fn colored_method(method: &str) -> ColoredString {
    match method.to_ascii_uppercase().as_str() {
        "GET" => method.bright_blue(),
        "POST" => method.bright_green(),
        "PUT" => method.bright_yellow(),
        "DELETE" => method.bright_red(),
        "PATCH" => method.bright_cyan(),
        _ => method.bright_black(),
    }
}

/// Backends as a table or as labelled blocks.
#[must_use]
pub fn render_backends(backends: &[Backend], mode: OutputMode) -> String {
    if backends.is_empty() {
        return format!("{}\n", "Not Found".bright_blue());
    }

    match mode {
        OutputMode::Table => {
            let mut table = Table::new(vec!["No.", "NAME", "BackendURL", "Protocol"]);
            for (i, backend) in backends.iter().enumerate() {
                table.push(vec![
                    (i + 1).to_string(),
                    backend.name.clone(),
                    backend.url.clone(),
                    backend.protocol.to_string(),
                ]);
            }
            table.render()
        }
        OutputMode::List => {
            let mut out = String::new();
            for (i, backend) in backends.iter().enumerate() {
                let _ = writeln!(out, "{}{}", label("No"), i + 1);
                let _ = writeln!(out, "{}{}", label("BACKEND NAME"), backend.name);
                let _ = writeln!(out, "{}{}", label("BACKEND URL"), backend.url);
                let _ = writeln!(out, "{}{}", label("BACKEND PROTOCOL"), backend.protocol);
                let _ = writeln!(out, "{SEPARATOR}");
            }
            out
        }
    }
}

/// APIs as listed, without enrichment.
#[must_use]
pub fn render_api_table(apis: &[Api]) -> String {
    if apis.is_empty() {
        return format!("{}\n", "Not Found".bright_blue());
    }

    let mut table = Table::new(vec!["No.", "NAME", "DisplayName", "Protocol(s)", "Path", "BackendURL"]);
    for (i, api) in apis.iter().enumerate() {
        table.push(vec![
            (i + 1).to_string(),
            api.name.clone(),
            api.display_name.clone(),
            api.protocols.join(" "),
            api.path.clone(),
            api.service_url.clone(),
        ]);
    }
    table.render()
}

/// Enriched APIs, one block each with their operations.
#[must_use]
pub fn render_api_details(details: &[&ApiDetail]) -> String {
    if details.is_empty() {
        return format!("{}\n", "Not Found".bright_blue());
    }

    let mut out = String::new();
    for (i, detail) in details.iter().enumerate() {
        let api = &detail.api;
        let _ = writeln!(out, "{}{}", label("No"), i + 1);
        let _ = writeln!(out, "{}{}", label("API NAME"), api.name);
        let _ = writeln!(out, "{}{}", label("API DISPLAY NAME"), api.display_name);
        let _ = writeln!(out, "{}{}", label("PROTOCOL(s)"), api.protocols.join(" "));
        let _ = writeln!(out, "{}{}", label("PATH"), api.path);
        let _ = writeln!(out, "{}{}", label("BACKEND URL"), api.service_url);
        let _ = writeln!(out, "{}{}", label("BACKEND POLICY ID"), detail.backend_policy_id);
        let _ = writeln!(out, "{}{}", label("BACKEND POLICY URL"), detail.backend_policy_url);
        let _ = writeln!(out, "{}", label("OPERATIONS"));
        for (n, op) in detail.operations.iter().enumerate() {
            let _ = writeln!(out, "  {} {} {} {}", n + 1, colored_method(&op.method), op.name, op.url_template);
        }
        let _ = writeln!(out, "{SEPARATOR}");
    }
    out
}
