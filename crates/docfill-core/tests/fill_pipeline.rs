//! End-to-end tests for the fill pipeline
//!
//! Each test lays out a working directory with `templates/` and `config/`,
//! then drives discovery, selection, form filling and generation.

use std::fs;
use std::path::Path;

use docfill_core::{
    DocfillError, FieldModel, FieldValueSet, FormRenderer, FormState, Session, Settings,
};
use docfill_ooxml::test_utils::{extract_document_xml, extract_file, DocxBuilder};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

fn write_template(cwd: &Path, base: &str, docx: &[u8], metadata: &str) {
    let templates = cwd.join("templates");
    let config = cwd.join("config");
    fs::create_dir_all(&templates).unwrap();
    fs::create_dir_all(&config).unwrap();
    fs::write(templates.join(format!("{}.docx", base)), docx).unwrap();
    fs::write(config.join(format!("{}.json", base)), metadata).unwrap();
}

fn session(cwd: &Path) -> Session {
    Session::discover(Settings::discover(cwd).unwrap(), cwd)
}

fn text_fields(ids: &[(&str, bool)]) -> String {
    let fields: Vec<String> = ids
        .iter()
        .map(|(id, required)| {
            format!(
                r#""{id}": {{ "label": "{id} label", "type": "text", "required": {required} }}"#
            )
        })
        .collect();
    format!(r#"{{ "fields": {{ {} }} }}"#, fields.join(", "))
}

// =============================================================================
// Field model
// =============================================================================

#[test]
fn test_merge_across_templates() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("x").build();
    write_template(cwd.path(), "a", &docx, &text_fields(&[("x", false), ("y", false)]));
    write_template(cwd.path(), "b", &docx, &text_fields(&[("y", false), ("z", false)]));

    let selection = session(cwd.path()).select(&["a", "b"]).unwrap();
    let ids: Vec<&str> = selection.model().iter().map(|d| d.id.as_str()).collect();

    assert_eq!(ids, vec!["x", "y", "z"]);
    assert_eq!(selection.form().len(), 3);
}

// =============================================================================
// Substitution
// =============================================================================

#[test]
fn test_no_match_leaves_parts_untouched() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new()
        .paragraph("Nothing to replace here")
        .header("<w:p><w:r><w:t>Header text</w:t></w:r></w:p>")
        .footer("<w:p><w:r><w:t>Footer text</w:t></w:r></w:p>")
        .build();
    write_template(cwd.path(), "plain", &docx, &text_fields(&[("[absent]", false)]));

    let session = session(cwd.path());
    let mut selection = session.select(&["plain"]).unwrap();
    selection.form_mut().set("[absent]", "value").unwrap();
    let values = selection.proceed_to_generation().unwrap();

    let report = selection
        .generate(&values, &session.output_dir(), &mut ())
        .unwrap();
    let (_, output) = report.succeeded().next().unwrap();
    let written = fs::read(output).unwrap();

    for part in ["word/document.xml", "word/header1.xml", "word/footer1.xml"] {
        assert_eq!(
            extract_file(&written, part),
            extract_file(&docx, part),
            "{} changed",
            part
        );
    }
}

#[test]
fn test_three_occurrences_in_one_paragraph() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("[n] and [n] and [n]").build();
    write_template(cwd.path(), "rep", &docx, &text_fields(&[("[n]", true)]));

    let session = session(cwd.path());
    let mut selection = session.select(&["rep"]).unwrap();
    selection.form_mut().set("[n]", "Ana").unwrap();
    let values = selection.proceed_to_generation().unwrap();
    let report = selection
        .generate(&values, &session.output_dir(), &mut ())
        .unwrap();

    let (_, output) = report.succeeded().next().unwrap();
    let xml = extract_document_xml(&fs::read(output).unwrap());
    assert!(xml.contains("Ana and Ana and Ana"));
    assert!(!xml.contains("[n]"));
}

#[test]
fn test_tables_headers_and_footers_are_filled() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new()
        .body(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Course: [course]</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        )
        .header("<w:p><w:r><w:t>[course] header</w:t></w:r></w:p>")
        .footer("<w:p><w:r><w:t>Page of [course]</w:t></w:r></w:p>")
        .build();
    write_template(cwd.path(), "t", &docx, &text_fields(&[("[course]", true)]));

    let session = session(cwd.path());
    let mut selection = session.select(&["t.docx"]).unwrap();
    selection.form_mut().set("[course]", "Physics").unwrap();
    let values = selection.proceed_to_generation().unwrap();
    let report = selection
        .generate(&values, &session.output_dir(), &mut ())
        .unwrap();

    let written = fs::read(report.succeeded().next().unwrap().1).unwrap();
    assert!(extract_document_xml(&written).contains("Course: Physics"));
    assert!(extract_file(&written, "word/header1.xml")
        .unwrap()
        .contains("Physics header"));
    assert!(extract_file(&written, "word/footer1.xml")
        .unwrap()
        .contains("Page of Physics"));
}

#[test]
fn test_multiline_field_keeps_line_breaks() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("Summary: [Resumo]").build();
    write_template(
        cwd.path(),
        "report",
        &docx,
        r#"{ "campos": { "[Resumo]": { "rotulo": "Resumo", "obrigatorio": true } } }"#,
    );

    let session = session(cwd.path());
    let mut selection = session.select(&["report"]).unwrap();
    selection
        .form_mut()
        .set("[Resumo]", "\nFirst finding.\nSecond finding.\n")
        .unwrap();
    let values = selection.proceed_to_generation().unwrap();
    let report = selection
        .generate(&values, &session.output_dir(), &mut ())
        .unwrap();

    let xml = extract_document_xml(&fs::read(report.succeeded().next().unwrap().1).unwrap());
    assert!(xml.contains(
        r#"<w:t xml:space="preserve">Summary: First finding.</w:t><w:br/><w:t xml:space="preserve">Second finding.</w:t>"#
    ));
}

// =============================================================================
// Value files
// =============================================================================

#[test]
fn test_value_file_round_trip_with_dates() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("[name] [when] [shift]").build();
    write_template(
        cwd.path(),
        "form",
        &docx,
        r#"{ "fields": {
            "[name]": { "label": "Name", "required": true },
            "[when]": { "label": "When", "type": "date", "required": true },
            "[shift]": { "label": "Shift", "type": "choice", "options": ["Day", "Night"] }
        } }"#,
    );
    let session = session(cwd.path());
    let path = cwd.path().join("saved.json");

    let mut first = session.select(&["form"]).unwrap();
    first.form_mut().set("[name]", "Łucja Ñúñez").unwrap();
    first.form_mut().set("[when]", "7/11/2024").unwrap();
    first.form_mut().set("[shift]", "Night").unwrap();
    first.save_values(&path).unwrap();

    let mut second = session.select(&["form"]).unwrap();
    second.load_values(&path).unwrap();

    assert_eq!(
        second.proceed_to_generation().unwrap(),
        first.proceed_to_generation().unwrap()
    );
    assert_eq!(
        second.form().input("[when]").unwrap().date_components(),
        Some(("07", "11", "2024"))
    );
    assert_eq!(
        second.form().input("[when]").unwrap().date_components(),
        first.form().input("[when]").unwrap().date_components()
    );
    assert!(fs::read_to_string(&path).unwrap().contains("Łucja Ñúñez"));
}

// =============================================================================
// Validation
// =============================================================================

struct FillOnly(&'static str, &'static str);

impl FormRenderer for FillOnly {
    fn fill(&mut self, _model: &FieldModel, form: &mut FormState) -> docfill_core::Result<()> {
        form.set(self.0, self.1).map(|_| ())
    }
}

#[test]
fn test_required_gating_lists_blank_labels() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("[a] [b]").build();
    write_template(cwd.path(), "g", &docx, &text_fields(&[("[a]", true), ("[b]", false)]));

    let session = session(cwd.path());
    let mut selection = session.select(&["g"]).unwrap();

    match selection.proceed_to_generation() {
        Err(DocfillError::MissingRequired { labels }) => assert_eq!(labels, vec!["[a] label"]),
        other => panic!("Expected missing required, got {:?}", other),
    }

    selection.fill_form(&mut FillOnly("[a]", "filled")).unwrap();
    let values: FieldValueSet = selection.proceed_to_generation().unwrap();
    assert_eq!(values.get("[a]"), Some("filled"));
    assert_eq!(values.get("[b]"), Some(""));
}

// =============================================================================
// Output naming
// =============================================================================

#[test]
fn test_student_name_names_output_without_config() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("Aluno: [nome do aluno]").build();
    write_template(
        cwd.path(),
        "ata",
        &docx,
        r#"{ "campos": { "[nome do aluno]": { "rotulo": "Nome do aluno", "tipo": "texto" } } }"#,
    );

    let session = session(cwd.path());
    let mut selection = session.select(&["ata"]).unwrap();
    selection.form_mut().set("[nome do aluno]", "Maria Souza").unwrap();
    let values = selection.proceed_to_generation().unwrap();
    let report = selection
        .generate(&values, &session.output_dir(), &mut ())
        .unwrap();

    assert_eq!(
        report.succeeded().next().unwrap().1,
        cwd.path().join("output/ata_Maria_Souza.docx")
    );
}

#[test]
fn test_timestamp_names_never_collide() {
    let cwd = TempDir::new().unwrap();
    let docx = DocxBuilder::new().paragraph("[k]").build();
    write_template(cwd.path(), "doc", &docx, &text_fields(&[("[k]", false)]));
    fs::write(
        cwd.path().join("docfill.toml"),
        "[generation]\nkey_field = \"[k]\"\n",
    )
    .unwrap();

    let session = session(cwd.path());
    let selection = session.select(&["doc"]).unwrap();
    let values = selection.proceed_to_generation().unwrap();
    assert_eq!(values.get("[k]"), Some(""));

    let out = session.output_dir();
    let first = selection.generate(&values, &out, &mut ()).unwrap();
    let second = selection.generate(&values, &out, &mut ()).unwrap();

    let first = first.succeeded().next().unwrap().1.to_path_buf();
    let second = second.succeeded().next().unwrap().1.to_path_buf();
    assert_ne!(first, second);
    assert!(first.exists() && second.exists());
    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("doc_") && name.ends_with(".docx"));
}
