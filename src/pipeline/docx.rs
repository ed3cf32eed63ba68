//! Reflowable rendering: blocks → `.docx` via `docx-rs`.
//!
//! The word processor handles line breaking and pagination, so each block maps
//! to one paragraph. Heading and list styles are declared in the package so
//! the output opens with named styles ("Heading 1", "List Bullet 2", ...)
//! that editors can restyle.

use crate::error::LegalDocsError;
use crate::pipeline::normalize::Block;
use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, SpecialIndentType, Start, Style, StyleType,
};
use std::path::Path;
use tracing::debug;

const MAX_HEADING_LEVEL: usize = 4;
const MAX_BULLET_LEVEL: usize = 2;
const BULLET_NUMBERING_ID: usize = 1;

/// Heading sizes in half-points for levels 1..=4.
const HEADING_HALF_POINTS: [usize; MAX_HEADING_LEVEL] = [32, 26, 24, 22];

/// Style id used for a heading block.
pub fn heading_style(level: usize) -> String {
    format!("Heading{}", level.clamp(1, MAX_HEADING_LEVEL))
}

/// Style id used for a bullet block.
pub fn bullet_style(indent: usize) -> &'static str {
    match indent.min(MAX_BULLET_LEVEL) {
        0 => "ListBullet",
        1 => "ListBullet2",
        _ => "ListBullet3",
    }
}

fn declare_styles(mut docx: Docx) -> Docx {
    for (idx, half_points) in HEADING_HALF_POINTS.iter().enumerate() {
        let level = idx + 1;
        docx = docx.add_style(
            Style::new(heading_style(level), StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(*half_points)
                .bold(),
        );
    }

    let mut bullets = AbstractNumbering::new(BULLET_NUMBERING_ID);
    for level in 0..=MAX_BULLET_LEVEL {
        let name = match level {
            0 => "List Bullet".to_string(),
            n => format!("List Bullet {}", n + 1),
        };
        docx = docx.add_style(Style::new(bullet_style(level), StyleType::Paragraph).name(name));

        let left = 720 * (level as i32 + 1);
        bullets = bullets.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new("bullet"),
                LevelText::new("\u{2022}"),
                LevelJc::new("left"),
            )
            .indent(Some(left), Some(SpecialIndentType::Hanging(360)), None, None),
        );
    }

    docx.add_abstract_numbering(bullets)
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID))
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn block_paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Blank => Paragraph::new(),
        Block::Heading { level, text } => text_paragraph(text).style(&heading_style(*level)),
        Block::Bullet { text, indent } => text_paragraph(text)
            .style(bullet_style(*indent))
            .numbering(
                NumberingId::new(BULLET_NUMBERING_ID),
                IndentLevel::new((*indent).min(MAX_BULLET_LEVEL)),
            ),
        Block::Paragraph { text } => text_paragraph(text),
    }
}

/// Write `blocks` as a Word document to `output_path`.
pub fn render_flow(blocks: &[Block], output_path: &Path) -> Result<(), LegalDocsError> {
    let docx = blocks
        .iter()
        .fold(declare_styles(Docx::new()), |docx, block| docx.add_paragraph(block_paragraph(block)));

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LegalDocsError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;
    }
    let file = std::fs::File::create(output_path).map_err(|e| LegalDocsError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    docx.build()
        .pack(file)
        .map_err(|e| LegalDocsError::DocxWriteFailed {
            path: output_path.to_path_buf(),
            detail: e.to_string(),
        })?;

    debug!("Wrote {} ({} paragraphs)", output_path.display(), blocks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;

    #[test]
    fn test_heading_style_caps_at_four() {
        assert_eq!(heading_style(1), "Heading1");
        assert_eq!(heading_style(4), "Heading4");
        assert_eq!(heading_style(7), "Heading4");
    }

    #[test]
    fn test_bullet_style_caps_at_third_level() {
        assert_eq!(bullet_style(0), "ListBullet");
        assert_eq!(bullet_style(1), "ListBullet2");
        assert_eq!(bullet_style(2), "ListBullet3");
        assert_eq!(bullet_style(9), "ListBullet3");
    }

    #[test]
    fn test_render_flow_writes_zip_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/terms.docx");
        let blocks = normalize("# Terms\nThis is a paragraph.\n- First point\n  - Nested point\n---\n## Section Two");
        render_flow(&blocks, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 100);
        assert!(bytes.starts_with(b"PK"), "docx is a zip archive");
    }

    #[test]
    fn test_render_flow_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        render_flow(&[], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_render_flow_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the output file.
        let path = dir.path().join("taken.docx");
        std::fs::create_dir(&path).unwrap();
        let err = render_flow(&[Block::Blank], &path).unwrap_err();
        assert!(matches!(err, LegalDocsError::OutputWriteFailed { .. }), "got: {err}");
    }
}
