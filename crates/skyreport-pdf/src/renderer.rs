//! Report renderer: combined report in, PDF file out.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value as JsonValue;
use skyreport_core::CombinedReport;
use thiserror::Error;

// A4 portrait, single Helvetica text column.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
const MAX_VALUE_CHARS: usize = 100;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF build failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer timed out")]
    Timeout,
}

/// Renderer collaborator interface.
///
/// The orchestrator only depends on this seam; the lopdf implementation
/// below is the default collaborator, swapped out in tests.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &CombinedReport, output_path: &Path) -> Result<(), RenderError>;
}

/// Default renderer: plain-text report pages built with lopdf.
#[derive(Debug, Default, Clone)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for PdfRenderer {
    fn render(&self, report: &CombinedReport, output_path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lines = report_lines(report);
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        });

        let mut kids: Vec<Object> = Vec::new();
        for chunk in lines.chunks(LINES_PER_PAGE) {
            let content = page_content(chunk);
            let encoded = content.encode()?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Contents" => Object::Reference(content_id),
                "Resources" => Object::Reference(resources_id),
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc.save(output_path)?;
        Ok(())
    }
}

fn page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(sanitize_line(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Helvetica with no encoding dictionary only covers printable ASCII.
fn sanitize_line(line: &str) -> String {
    line.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { '?' })
        .collect()
}

fn report_lines(report: &CombinedReport) -> Vec<String> {
    let mut lines = vec![
        report.location.to_uppercase(),
        String::new(),
        format!("Date: {}", report.date),
        format!("Drone: {}", report.drone_id),
        format!("Video: {}", report.video_link),
        format!("Violations: {}", report.violations.len()),
        String::new(),
    ];

    for (index, violation) in report.violations.iter().enumerate() {
        lines.push(format!("Violation {}", index + 1));
        match violation {
            JsonValue::Object(fields) => {
                for (key, value) in fields {
                    lines.push(format!("  {}: {}", key, compact_value(value)));
                }
            }
            other => lines.push(format!("  {}", compact_value(other))),
        }
        lines.push(String::new());
    }

    lines
}

/// Single-line rendering of an opaque violation field, truncated for layout.
fn compact_value(value: &JsonValue) -> String {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_VALUE_CHARS {
        let truncated: String = text.chars().take(MAX_VALUE_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skyreport_core::models::REPORT_LOCATION;
    use tempfile::tempdir;

    fn report(violations: Vec<JsonValue>) -> CombinedReport {
        CombinedReport {
            location: REPORT_LOCATION.to_string(),
            date: "2026-08-30".to_string(),
            drone_id: "SITE_A".to_string(),
            video_link: "https://example.com/run.mp4".to_string(),
            violations,
        }
    }

    #[test]
    fn renders_a_loadable_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SITE_A.pdf");

        PdfRenderer::new()
            .render(&report(vec![json!({"kind": "ppe", "severity": "high"})]), &path)
            .expect("render");

        let doc = Document::load(&path).expect("rendered PDF loads");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn many_violations_paginate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        let violations = (0..120)
            .map(|i| json!({"id": i, "kind": "speeding"}))
            .collect();

        PdfRenderer::new().render(&report(violations), &path).expect("render");

        let doc = Document::load(&path).expect("rendered PDF loads");
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        PdfRenderer::new().render(&report(vec![]), &path).expect("render");
        assert!(path.exists());
    }

    #[test]
    fn sanitize_replaces_non_ascii() {
        assert_eq!(sanitize_line("héllo (ok)"), "h?llo (ok)");
    }

    #[test]
    fn compact_value_truncates_long_text() {
        let long = "x".repeat(500);
        let rendered = compact_value(&json!(long));
        assert!(rendered.ends_with("..."));
        assert!(rendered.chars().count() <= MAX_VALUE_CHARS + 3);
    }
}
