use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use docx_rs::{Docx, Paragraph, Run};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::{error::AppError, models::AnswerResult};

pub const EXPORT_FILE_PREFIX: &str = "physics_solutions_";

const DOCUMENT_TITLE: &str = "Physics Solutions";

// US Letter, with a uniform margin. All sizes in millimetres except font
// sizes, which are points.
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            other => Err(AppError::UnsupportedExportFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Renders the results into `<dir>/physics_solutions_<YYYYMMDDHHMMSS>.<ext>`
/// and returns the bare filename. Same-second exports collide; last writer
/// wins.
pub fn write_document(
    results: &[AnswerResult],
    format: ExportFormat,
    dir: &Path,
) -> Result<String, AppError> {
    fs::create_dir_all(dir)?;

    let filename = export_filename(format);
    let path = dir.join(&filename);

    match format {
        ExportFormat::Pdf => write_pdf(results, &path)?,
        ExportFormat::Docx => write_docx(results, &path)?,
    }

    tracing::info!(file = %path.display(), count = results.len(), "Document exported");

    Ok(filename)
}

fn export_filename(format: ExportFormat) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    format!("{EXPORT_FILE_PREFIX}{timestamp}.{}", format.extension())
}

fn token_summary(result: &AnswerResult) -> String {
    format!(
        "Prompt Tokens: {} | Completion Tokens: {} | Total Tokens: {}",
        result.token_usage.prompt_tokens,
        result.token_usage.completion_tokens,
        result.token_usage.total_tokens
    )
}

// ---------------------------------------------------------------------------
// PDF rendering
// ---------------------------------------------------------------------------

/// Cursor over the current page: wraps text to the printable width and
/// starts a fresh page when the bottom margin is reached.
struct PdfWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PdfWriter<'_> {
    fn paragraph(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        for line in wrap_text(text, max_chars(size)) {
            self.line(&line, size, font);
        }
    }

    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        // Rough leading: font size in points converted to mm plus a gap.
        let leading = size * 0.5;
        if self.y - leading < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.layer.use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= leading;
    }

    fn spacer(&mut self, mm: f32) {
        self.y -= mm;
    }
}

fn write_pdf(results: &[AnswerResult], path: &Path) -> Result<(), AppError> {
    let (doc, page, layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Export(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Export(e.to_string()))?;

    let mut writer = PdfWriter {
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT_MM - MARGIN_MM,
        doc: &doc,
    };

    writer.paragraph(DOCUMENT_TITLE, 18.0, &bold);
    writer.spacer(6.0);

    for (i, result) in results.iter().enumerate() {
        writer.paragraph(&format!("Question {}:", i + 1), 14.0, &bold);
        writer.paragraph(&result.question, 11.0, &regular);
        writer.spacer(4.0);

        writer.paragraph("Solution:", 12.0, &bold);
        for line in result.answer.lines() {
            if line.trim().is_empty() {
                // Blank answer lines become vertical space, not empty text.
                writer.spacer(3.0);
            } else {
                writer.paragraph(line, 11.0, &regular);
            }
        }

        writer.spacer(4.0);
        writer.paragraph("Token Usage:", 12.0, &bold);
        writer.paragraph(&token_summary(result), 11.0, &regular);
        writer.spacer(8.0);
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| AppError::Export(e.to_string()))?;

    Ok(())
}

/// Greedy word wrap. Words longer than the limit are kept whole on their own
/// line rather than split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Printable characters per line for the built-in Helvetica at `size` pt,
/// assuming an average glyph advance of ~0.5 em.
fn max_chars(size: f32) -> usize {
    let avg_char_mm = size * 0.5 * 0.3528;
    ((PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / avg_char_mm) as usize
}

// ---------------------------------------------------------------------------
// DOCX rendering
// ---------------------------------------------------------------------------

fn write_docx(results: &[AnswerResult], path: &Path) -> Result<(), AppError> {
    let mut docx = Docx::new().add_paragraph(heading(DOCUMENT_TITLE, 48));

    for (i, result) in results.iter().enumerate() {
        docx = docx
            .add_paragraph(heading(&format!("Question {}:", i + 1), 32))
            .add_paragraph(body(&result.question))
            .add_paragraph(heading("Solution:", 28));

        for line in result.answer.lines() {
            if !line.trim().is_empty() {
                docx = docx.add_paragraph(body(line));
            }
        }

        docx = docx
            .add_paragraph(heading("Token Usage:", 24))
            .add_paragraph(body(&token_summary(result)));
    }

    let file = File::create(path)?;
    docx.build()
        .pack(file)
        .map_err(|e| AppError::Export(e.to_string()))?;

    Ok(())
}

// Sizes are half-points, docx convention.
fn heading(text: &str, size: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold().size(size))
}

fn body(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}
