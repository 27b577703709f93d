use std::fs;

use assert_matches::assert_matches;
use callsheet_maker::pdf::{discover_templates, seed_templates, Section};
use callsheet_maker::{
    export_call_sheet, render_call_sheet, CallSheet, CallSheetError, CastMember, CrewMember,
    Template, TemplateError, ValidationError,
};
use chrono::{NaiveDate, NaiveTime};
use lopdf::{Document, Object};
use tempfile::TempDir;

fn sheet() -> CallSheet {
    let mut sheet = CallSheet::new("Night Shift", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    sheet.cast_members.push(CastMember {
        name: "Dana Reyes".into(),
        role: "Detective Hale".into(),
        call_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        notes: None,
    });
    sheet
}

fn content_of(doc: &Document) -> String {
    doc.get_pages()
        .into_values()
        .map(|page_id| String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned())
        .collect()
}

#[test]
fn export_writes_a_readable_pdf() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("exports").join("night-shift.pdf");

    let written = export_call_sheet(&sheet(), &Template::default(), &target).unwrap();
    assert_eq!(written, target);

    let bytes = fs::read(&target).unwrap();
    assert!(!bytes.is_empty());
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    assert!(content_of(&doc).contains("(NIGHT SHIFT)"));
}

#[test]
fn missing_required_field_produces_no_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("blank.pdf");
    let mut blank = sheet();
    blank.production_name = "  ".into();

    assert_matches!(
        export_call_sheet(&blank, &Template::default(), &target),
        Err(CallSheetError::Validation(ValidationError::Required(_)))
    );
    assert!(!target.exists());

    let mut template = Template::default();
    template.required_fields.push("home_base_address".into());
    assert_matches!(
        export_call_sheet(&sheet(), &template, &target),
        Err(CallSheetError::Template(TemplateError::MissingField(field))) if field == "home_base_address"
    );
    assert!(!target.exists());
}

#[test]
fn unknown_placeholders_are_rejected() {
    let mut template = Template::default();
    template.title_lines.push("Directed by {director}".into());
    assert_matches!(
        render_call_sheet(&sheet(), &template),
        Err(CallSheetError::Template(TemplateError::UnknownField(field))) if field == "director"
    );
}

#[test]
fn long_crew_rosters_continue_on_later_pages() {
    let mut sheet = sheet();
    for idx in 0..150 {
        sheet.crew_members.push(CrewMember {
            name: format!("Crew Member {idx}"),
            position: "Grip".into(),
            department: if idx % 2 == 0 { "Grip" } else { "Electric" }.into(),
            call_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            notes: None,
        });
    }

    let doc = Document::load_mem(&render_call_sheet(&sheet, &Template::default()).unwrap()).unwrap();
    assert!(doc.get_pages().len() >= 3);
    let text = content_of(&doc);
    assert!(text.contains("(Crew Member 149)"));
    assert!(text.find("(ELECTRIC)").unwrap() < text.find("(GRIP)").unwrap());
}

#[test]
fn logo_is_embedded_as_an_image() {
    let dir = TempDir::new().unwrap();
    let logo = dir.path().join("logo.png");
    image::RgbImage::from_pixel(8, 4, image::Rgb([200, 30, 30]))
        .save(&logo)
        .unwrap();
    let mut sheet = sheet();
    sheet.logo_path = Some(logo);

    let doc = Document::load_mem(&render_call_sheet(&sheet, &Template::default()).unwrap()).unwrap();
    let has_image = doc.objects.values().any(|object| match object {
        Object::Stream(stream) => {
            matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
        }
        _ => false,
    });
    assert!(has_image);
}

#[test]
fn templates_on_disk_change_the_layout() {
    let dir = TempDir::new().unwrap();
    seed_templates(dir.path()).unwrap();
    let mut cast_only = Template::default();
    cast_only.name = "cast-only".into();
    cast_only.sections = vec![Section::Cast];
    fs::write(
        dir.path().join("cast-only.json"),
        serde_json::to_string_pretty(&cast_only).unwrap(),
    )
    .unwrap();

    let templates = discover_templates(dir.path());
    let loaded = templates.iter().find(|t| t.name == "cast-only").unwrap();
    let doc = Document::load_mem(&render_call_sheet(&sheet(), loaded).unwrap()).unwrap();
    let text = content_of(&doc);
    assert!(text.contains("(Detective Hale)"));
    assert!(!text.contains("(CREW:)"));
}

#[test]
fn export_under_a_regular_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("exports");
    fs::write(&blocker, b"not a directory").unwrap();
    let target = blocker.join("night-shift.pdf");

    assert_matches!(
        export_call_sheet(&sheet(), &Template::default(), &target),
        Err(CallSheetError::Io { path, .. }) if path == blocker
    );
    assert!(!target.exists());
    assert_eq!(fs::read(&blocker).unwrap(), b"not a directory");
}
