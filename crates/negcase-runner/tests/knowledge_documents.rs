//! Knowledge folders holding PDF and Word documents.

use std::path::Path;

use docx_rs::{Docx, Paragraph, Run};
use negcase_runner::{ChunkedKnowledgeBase, KnowledgeBase};

const PDF_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tokens.pdf");

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });
    let file = std::fs::File::create(path).unwrap();
    docx.build().pack(file).unwrap();
}

#[test]
fn pdf_text_is_extracted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(PDF_FIXTURE, dir.path().join("auth.pdf")).unwrap();

    let kb = ChunkedKnowledgeBase::load(dir.path(), 1000, 200, 3).unwrap();
    assert_eq!(kb.len(), 1);
    let hit = kb.query("hourly");
    assert!(hit[0].contains("=== Document: auth.pdf ==="));
    assert!(hit[0].to_lowercase().contains("hourly"));
}

#[test]
fn docx_paragraphs_are_extracted() {
    let dir = tempfile::tempdir().unwrap();
    write_docx(
        &dir.path().join("users.docx"),
        &["USR-001 means the name is missing.", "Names are mandatory."],
    );

    let kb = ChunkedKnowledgeBase::load(dir.path(), 1000, 200, 3).unwrap();
    let hit = kb.query("mandatory");
    assert!(hit[0].contains("=== Document: users.docx ==="));
    assert!(hit[0].contains("USR-001 means the name is missing.\nNames are mandatory."));
}

#[test]
fn mixed_folder_loads_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(PDF_FIXTURE, dir.path().join("b.pdf")).unwrap();
    write_docx(&dir.path().join("a.docx"), &["Word first."]);
    std::fs::write(dir.path().join("c.txt"), "Plain last.").unwrap();

    let kb = ChunkedKnowledgeBase::load(dir.path(), 10_000, 0, 1).unwrap();
    let all = kb.query("");
    let a = all[0].find("a.docx").unwrap();
    let b = all[0].find("b.pdf").unwrap();
    let c = all[0].find("c.txt").unwrap();
    assert!(a < b && b < c);
}
