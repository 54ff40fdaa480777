//! Typed decoder for the platform CLI's human-readable output.
//!
//! All knowledge of the text formats lives here. Two shapes are understood:
//!
//! - key-value blocks (`Key: value` per line), used by `get` commands
//! - whitespace-aligned tables with a header row, used by `list` commands
//!
//! A value of `-` means "no value" in both. A required field that is
//! missing is a `ProvisionError::ParseMismatch`, never an empty default.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::ProvisionError;
use crate::domain::snapshot::{
    GroupSnapshot, LoadBalancerSnapshot, NodeSnapshot, ProjectSnapshot, RuleSnapshot,
    ServiceSnapshot,
};

static HEADER_GAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"\s{2,}|\t").expect("valid regex")
});

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?").expect("valid regex")
});

const NONE_MARKER: &str = "-";

fn mismatch(command: &str, field: &str) -> ProvisionError {
    ProvisionError::ParseMismatch {
        command: command.to_string(),
        field: field.to_string(),
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn present(value: &str) -> Option<&str> {
    let v = value.trim();
    (!v.is_empty() && v != NONE_MARKER).then_some(v)
}

// ── Key-value blocks ──────────────────────────────────────────────────────────

/// Parsed `Key: value` output of one command.
#[derive(Debug)]
pub struct KeyValues<'a> {
    command: &'a str,
    fields: HashMap<String, String>,
}

impl<'a> KeyValues<'a> {
    /// Lines without a `:` are ignored; the first occurrence of a key wins.
    #[must_use]
    pub fn parse(command: &'a str, text: &str) -> Self {
        let mut fields = HashMap::new();
        for line in text.lines() {
            if let Some((key, value)) = line.split_once(':') {
                fields
                    .entry(normalize_key(key))
                    .or_insert_with(|| value.trim().to_string());
            }
        }
        Self { command, fields }
    }

    #[must_use]
    pub fn optional(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .and_then(|v| present(v))
            .map(str::to_string)
    }

    /// # Errors
    ///
    /// Returns `ParseMismatch` if the field is absent or `-`.
    pub fn required(&self, field: &str) -> Result<String, ProvisionError> {
        self.optional(field)
            .ok_or_else(|| mismatch(self.command, field))
    }
}

// ── Tables ────────────────────────────────────────────────────────────────────

/// Parsed tabular output of one `list` command.
#[derive(Debug)]
pub struct Table<'a> {
    command: &'a str,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl<'a> Table<'a> {
    /// The first non-blank line is the header. In an aligned header, column
    /// names are separated by two or more spaces (or a tab), so a name like
    /// `PUBLIC URL` stays one column; a header with only single spaces
    /// splits on whitespace. Rows split on whitespace and the last column
    /// keeps the rest of the line, embedded spaces included.
    #[must_use]
    pub fn parse(command: &'a str, text: &str) -> Self {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let headers = lines.next().map(split_header).unwrap_or_default();
        let rows = lines.map(|l| split_row(l, headers.len())).collect();
        Self {
            command,
            headers,
            rows,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// # Errors
    ///
    /// Returns `ParseMismatch` if the header has no such column.
    pub fn column(&self, name: &str) -> Result<usize, ProvisionError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| mismatch(self.command, name))
    }

    /// Cell value of `row` at `col`, `None` when blank, `-`, or missing.
    #[must_use]
    pub fn cell(row: &[String], col: usize) -> Option<&str> {
        row.get(col).and_then(|v| present(v))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

fn split_header(line: &str) -> Vec<String> {
    let line = line.trim();
    if HEADER_GAP_RE.is_match(line) {
        HEADER_GAP_RE.split(line).map(normalize_key).collect()
    } else {
        line.split_whitespace().map(normalize_key).collect()
    }
}

fn split_row(line: &str, columns: usize) -> Vec<String> {
    let mut cells = Vec::with_capacity(columns);
    let mut rest = line.trim();
    while cells.len() + 1 < columns && !rest.is_empty() {
        match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => {
                cells.push(head.to_string());
                rest = tail.trim_start();
            }
            None => {
                cells.push(rest.to_string());
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        cells.push(rest.to_string());
    }
    cells
}

// ── Typed decoders ────────────────────────────────────────────────────────────

/// Extract the first `X.Y.Z` version from `version` output.
///
/// # Errors
///
/// Returns `ParseMismatch` if no semver-looking token is present.
pub fn decode_version(command: &str, text: &str) -> Result<semver::Version, ProvisionError> {
    VERSION_RE
        .find(text)
        .and_then(|m| semver::Version::parse(m.as_str()).ok())
        .ok_or_else(|| mismatch(command, "version"))
}

/// # Errors
///
/// Returns `ParseMismatch` if a required field is missing or malformed.
pub fn decode_project(command: &str, text: &str) -> Result<ProjectSnapshot, ProvisionError> {
    let kv = KeyValues::parse(command, text);
    let available = kv
        .required("available")?
        .parse::<u32>()
        .map_err(|_| mismatch(command, "available"))?;
    Ok(ProjectSnapshot {
        name: kv.required("name")?,
        uuid: kv.required("uuid")?,
        status: kv.required("status")?,
        available,
    })
}

/// # Errors
///
/// Returns `ParseMismatch` if a required field is missing.
pub fn decode_service(command: &str, text: &str) -> Result<ServiceSnapshot, ProvisionError> {
    let kv = KeyValues::parse(command, text);
    let groups = kv
        .optional("groups")
        .map(|g| {
            g.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(ServiceSnapshot {
        name: kv.required("name")?,
        image: kv.required("image")?,
        memory: kv.required("memory")?,
        cpu: kv.required("cpu")?,
        groups,
        status: kv.required("status")?,
        url: kv.optional("url"),
    })
}

/// # Errors
///
/// Returns `ParseMismatch` if the table lacks a `KEY` or `VALUE` column.
pub fn decode_env(command: &str, text: &str) -> Result<BTreeMap<String, String>, ProvisionError> {
    let table = Table::parse(command, text);
    if table.is_empty() {
        return Ok(BTreeMap::new());
    }
    let key = table.column("key")?;
    let value = table.column("value")?;
    Ok(table
        .rows()
        .filter_map(|row| {
            Table::cell(row, key).map(|k| {
                (
                    k.to_string(),
                    Table::cell(row, value).unwrap_or_default().to_string(),
                )
            })
        })
        .collect())
}

/// # Errors
///
/// Returns `ParseMismatch` if the table lacks a `NAME` column.
pub fn decode_groups(command: &str, text: &str) -> Result<Vec<GroupSnapshot>, ProvisionError> {
    let table = Table::parse(command, text);
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let name = table.column("name")?;
    Ok(table
        .rows()
        .filter_map(|row| Table::cell(row, name))
        .map(|n| GroupSnapshot {
            name: n.to_string(),
        })
        .collect())
}

/// # Errors
///
/// Returns `ParseMismatch` if a required column is missing.
pub fn decode_nodes(command: &str, text: &str) -> Result<Vec<NodeSnapshot>, ProvisionError> {
    let table = Table::parse(command, text);
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let (name, address, group) = (
        table.column("name")?,
        table.column("address")?,
        table.column("group")?,
    );
    Ok(table
        .rows()
        .filter_map(|row| {
            Table::cell(row, name).map(|n| NodeSnapshot {
                name: n.to_string(),
                address: Table::cell(row, address).unwrap_or_default().to_string(),
                group: Table::cell(row, group).unwrap_or_default().to_string(),
            })
        })
        .collect())
}

/// # Errors
///
/// Returns `ParseMismatch` if a required column is missing.
pub fn decode_rules(command: &str, text: &str) -> Result<Vec<RuleSnapshot>, ProvisionError> {
    let table = Table::parse(command, text);
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let (name, protocol, port, source) = (
        table.column("name")?,
        table.column("protocol")?,
        table.column("port")?,
        table.column("source")?,
    );
    Ok(table
        .rows()
        .filter_map(|row| {
            Table::cell(row, name).map(|n| RuleSnapshot {
                name: n.to_string(),
                protocol: Table::cell(row, protocol).unwrap_or_default().to_string(),
                port: Table::cell(row, port).unwrap_or_default().to_string(),
                source: Table::cell(row, source).unwrap_or_default().to_string(),
            })
        })
        .collect())
}

/// # Errors
///
/// Returns `ParseMismatch` if a required column is missing.
pub fn decode_load_balancers(
    command: &str,
    text: &str,
) -> Result<Vec<LoadBalancerSnapshot>, ProvisionError> {
    let table = Table::parse(command, text);
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let (name, service, port, url) = (
        table.column("name")?,
        table.column("service")?,
        table.column("port")?,
        table.column("url")?,
    );
    Ok(table
        .rows()
        .filter_map(|row| {
            Table::cell(row, name).map(|n| LoadBalancerSnapshot {
                name: n.to_string(),
                service: Table::cell(row, service).unwrap_or_default().to_string(),
                port: Table::cell(row, port).unwrap_or_default().to_string(),
                url: Table::cell(row, url).map(str::to_string),
            })
        })
        .collect())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
