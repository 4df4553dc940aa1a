//! Table rendering: turn a cell grid plus formatting options into a Word
//! document with a title, metadata block, table and generation footer.
//!
//! Document structure: centered heading, centered italic metadata paragraph
//! (source and range), the table itself, then a right-aligned italic
//! timestamp footer.

use std::path::Path;

use crate::config::Settings;
use crate::docx;
use crate::error::{ConvertError, Result};
use crate::extract::CellGrid;

/// Formatting options for a single render, immutable per run.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Word table style name, resolved by the document writer
    pub style: String,
    pub auto_fit: bool,
    pub center: bool,
    /// Bold + shade the first row
    pub header_row: bool,
    /// Document heading text
    pub title: String,
    /// Metadata description (source path and range), newline-separated lines
    pub source: String,
}

impl RenderOptions {
    /// Build render options from settings for the given source file.
    pub fn from_settings(settings: &Settings, title: String, source: &Path) -> RenderOptions {
        RenderOptions {
            style: settings.table_style.clone(),
            auto_fit: settings.auto_fit,
            center: settings.center_table,
            header_row: settings.first_row_is_header,
            title,
            source: format!(
                "Source: {}\nRange: {}",
                source.display(),
                settings.range_description()
            ),
        }
    }
}

/// Fixed light-gray shade applied to header-row cells
const HEADER_FILL: &str = "D3D3D3";

/// Render the grid to a `.docx` document at `output_path`.
///
/// Fails with `EmptyData` before any file is touched if the grid has zero
/// rows or columns. The style name must be one the document writer defines.
pub fn render(grid: &CellGrid, output_path: &Path, options: &RenderOptions) -> Result<()> {
    if grid.is_empty() {
        return Err(ConvertError::EmptyData);
    }

    let style_id = docx::table_style_id(&options.style)?;

    let mut body = String::new();
    push_heading(&mut body, &options.title);
    push_metadata(&mut body, &options.source);
    body.push_str("<w:p/>");
    push_table(&mut body, grid, style_id, options);
    push_footer(&mut body);

    docx::save_package(output_path, &body)
}

fn push_heading(body: &mut String, title: &str) {
    body.push_str(&format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        docx::escape(title)
    ));
}

fn push_metadata(body: &mut String, source: &str) {
    body.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#);
    let lines: Vec<&str> = source.split('\n').collect();
    for (i, line) in lines.iter().enumerate() {
        body.push_str(&format!(
            r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{}</w:t>"#,
            docx::escape(line)
        ));
        if i + 1 < lines.len() {
            body.push_str("<w:br/>");
        }
        body.push_str("</w:r>");
    }
    body.push_str("</w:p>");
}

fn push_table(body: &mut String, grid: &CellGrid, style_id: &str, options: &RenderOptions) {
    body.push_str("<w:tbl><w:tblPr>");
    body.push_str(&format!(r#"<w:tblStyle w:val="{}"/>"#, style_id));
    if options.auto_fit {
        body.push_str(r#"<w:tblW w:w="0" w:type="auto"/><w:tblLayout w:type="autofit"/>"#);
    }
    if options.center {
        body.push_str(r#"<w:jc w:val="center"/>"#);
    }
    body.push_str("</w:tblPr><w:tblGrid>");
    for _ in 0..grid.col_count() {
        body.push_str("<w:gridCol/>");
    }
    body.push_str("</w:tblGrid>");

    for (row_idx, row) in grid.rows().iter().enumerate() {
        let is_header = options.header_row && row_idx == 0;
        body.push_str("<w:tr>");
        for cell in row {
            push_cell(body, cell, is_header);
        }
        body.push_str("</w:tr>");
    }
    body.push_str("</w:tbl>");
}

fn push_cell(body: &mut String, text: &str, is_header: bool) {
    body.push_str("<w:tc>");
    if is_header {
        body.push_str(&format!(
            r#"<w:tcPr><w:shd w:val="clear" w:color="auto" w:fill="{}"/></w:tcPr>"#,
            HEADER_FILL
        ));
    }
    let run_props = if is_header { "<w:rPr><w:b/></w:rPr>" } else { "" };
    body.push_str(&format!(
        r#"<w:p><w:r>{}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        run_props,
        docx::escape(text)
    ));
    body.push_str("</w:tc>");
}

fn push_footer(body: &mut String) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    body.push_str(&format!(
        r#"<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">Generated on: {}</w:t></w:r></w:p>"#,
        timestamp
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample_grid() -> CellGrid {
        CellGrid::from_rows(vec![
            vec!["Name".to_string(), "Total".to_string()],
            vec!["Widgets".to_string(), "42".to_string()],
        ])
    }

    fn sample_options(header_row: bool) -> RenderOptions {
        RenderOptions {
            style: "Table Grid".to_string(),
            auto_fit: true,
            center: true,
            header_row,
            title: "Quarterly".to_string(),
            source: "Source: data.xlsx\nRange: Rows 1-2, Columns A-B".to_string(),
        }
    }

    fn document_xml(path: &Path) -> String {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut part = archive.by_name("word/document.xml").unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_empty_grid_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let err = render(&CellGrid::default(), &path, &sample_options(true)).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyData));
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_style_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let mut options = sample_options(true);
        options.style = "Light Shading".to_string();
        let err = render(&sample_grid(), &path, &options).unwrap_err();
        assert!(matches!(err, ConvertError::StyleNotFound { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_header_row_bold_and_shaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        render(&sample_grid(), &path, &sample_options(true)).unwrap();
        let xml = document_xml(&path);
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"w:fill="D3D3D3""#));
        // exactly the header row's cells are bold
        assert_eq!(xml.matches("<w:b/>").count(), 2);
    }

    #[test]
    fn test_no_header_flag_never_bolds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        render(&sample_grid(), &path, &sample_options(false)).unwrap();
        let xml = document_xml(&path);
        assert!(!xml.contains("<w:b/>"));
        assert!(!xml.contains(r#"w:fill="D3D3D3""#));
    }

    #[test]
    fn test_table_shape_and_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        render(&sample_grid(), &path, &sample_options(true)).unwrap();
        let xml = document_xml(&path);
        assert_eq!(xml.matches("<w:tr>").count(), 2);
        assert_eq!(xml.matches("<w:gridCol/>").count(), 2);
        assert!(xml.contains(r#"<w:tblStyle w:val="TableGrid"/>"#));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(r#"<w:tblLayout w:type="autofit"/>"#));
        assert!(xml.contains("Generated on: "));
        assert!(xml.contains("Widgets"));
    }

    #[test]
    fn test_cell_text_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let grid = CellGrid::from_rows(vec![vec!["a & b < c".to_string()]]);
        render(&grid, &path, &sample_options(false)).unwrap();
        let xml = document_xml(&path);
        assert!(xml.contains("a &amp; b &lt; c"));
    }
}
