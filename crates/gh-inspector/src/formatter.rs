//! Rendering scored repositories as table, JSON or CSV

use chrono::{DateTime, Utc};
use repo_metrics::RepositoryAttributes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    JsonCompact,
    Csv,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Table,
        OutputFormat::Json,
        OutputFormat::JsonCompact,
        OutputFormat::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::JsonCompact => "json-compact",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFormat(pub String);

impl fmt::Display for UnsupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported format: {} (expected table, json, json-compact or csv)",
            self.0
        )
    }
}

impl std::error::Error for UnsupportedFormat {}

impl FromStr for OutputFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| UnsupportedFormat(s.to_string()))
    }
}

impl Serialize for OutputFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One display row per scored repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub repository: String,
    pub score: f64,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub open_prs: u64,
    pub last_commit: String,
    pub language: String,
    pub ci_cd: String,
    pub license: String,
    pub description: String,
    pub archived: String,
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "Yes" } else { "No" };
    text.to_string()
}

impl Record {
    /// Flatten attributes, with commit age measured from `now`
    pub fn from_attributes(attrs: &RepositoryAttributes, now: DateTime<Utc>) -> Self {
        let last_commit = attrs
            .days_since_last_commit(now)
            .map(|days| format!("{} days ago", days))
            .unwrap_or_else(|| "N/A".to_string());

        let language = if attrs.primary_language.is_empty() {
            "N/A".to_string()
        } else {
            attrs.primary_language.clone()
        };

        Self {
            repository: attrs.full_name(),
            score: attrs.score.unwrap_or_default(),
            stars: attrs.stars,
            forks: attrs.forks,
            open_issues: attrs.open_issues,
            open_prs: attrs.open_prs,
            last_commit,
            language,
            ci_cd: yes_no(attrs.has_cicd),
            license: yes_no(attrs.has_license),
            description: attrs.description.clone(),
            archived: yes_no(attrs.is_archived),
        }
    }
}

/// Render records in `format`. Text formats end with a newline.
pub fn format_records(records: &[Record], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::Csv => Ok(render_csv(records)),
        OutputFormat::Json => serde_json::to_string_pretty(records).map(|s| s + "\n"),
        OutputFormat::JsonCompact => serde_json::to_string(records).map(|s| s + "\n"),
    }
}

const TABLE_HEADERS: [&str; 10] = [
    "REPOSITORY",
    "SCORE",
    "STARS",
    "FORKS",
    "OPEN ISSUES",
    "OPEN PRS",
    "LAST COMMIT",
    "LANGUAGE",
    "CI/CD",
    "LICENSE",
];

const TABLE_PADDING: usize = 3;

fn render_table(records: &[Record]) -> String {
    let rows: Vec<[String; 10]> = records
        .iter()
        .map(|r| {
            [
                r.repository.clone(),
                format!("{:.1}", r.score),
                r.stars.to_string(),
                r.forks.to_string(),
                r.open_issues.to_string(),
                r.open_prs.to_string(),
                r.last_commit.clone(),
                r.language.clone(),
                r.ci_cd.clone(),
                r.license.clone(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separators = TABLE_HEADERS.map(|h| "-".repeat(h.len()));
    let mut out = String::new();
    push_row(&mut out, &TABLE_HEADERS, &widths);
    push_row(&mut out, &separators, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let last = cells.len().saturating_sub(1);
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let cell = cell.as_ref();
        out.push_str(cell);
        if i < last {
            let pad = width - cell.chars().count() + TABLE_PADDING;
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
    out.push('\n');
}

const CSV_HEADERS: [&str; 12] = [
    "Repository",
    "Score",
    "Stars",
    "Forks",
    "Open Issues",
    "Open PRs",
    "Last Commit",
    "Language",
    "CI/CD",
    "License",
    "Description",
    "Archived",
];

fn render_csv(records: &[Record]) -> String {
    let mut out = String::new();
    push_csv_line(&mut out, CSV_HEADERS.iter().map(|h| h.to_string()));
    for r in records {
        push_csv_line(
            &mut out,
            [
                r.repository.clone(),
                format!("{:.1}", r.score),
                r.stars.to_string(),
                r.forks.to_string(),
                r.open_issues.to_string(),
                r.open_prs.to_string(),
                r.last_commit.clone(),
                r.language.clone(),
                r.ci_cd.clone(),
                r.license.clone(),
                r.description.clone(),
                r.archived.clone(),
            ],
        );
    }
    out
}

fn push_csv_line(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let escaped: Vec<String> = fields.into_iter().map(|f| csv_field(&f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) || field.starts_with(' ') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
