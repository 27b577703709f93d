use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{CallSheetError, RenderError, Result};
use crate::models::CallSheet;

use super::layout::{PageWriter, RasterImage, Run};
use super::template::{Section, Template};

/// Gap after each block, in points (a quarter inch).
const BLOCK_GAP: f32 = 18.0;
/// Smaller gap between a heading and the general call line.
const LINE_GAP: f32 = 7.0;

/// Render a call sheet into PDF bytes. Nothing touches the filesystem except
/// reading the logo, so a failure here leaves no partial output behind.
pub fn render_call_sheet(sheet: &CallSheet, template: &Template) -> Result<Vec<u8>> {
    sheet.validate()?;
    template.check_required(sheet)?;

    let title = template.title(sheet)?;
    let general_call = template.general_call_line(sheet)?;
    let fonts = &template.fonts;

    let mut writer = PageWriter::new(&template.page, title.join(" - "));

    if let Some(logo_path) = &sheet.logo_path {
        match load_logo(logo_path) {
            Ok(image) => {
                let (width, height) =
                    fit_box(&image, template.logo.width, template.logo.height);
                writer.image_right(image, width, height);
                writer.spacer(BLOCK_GAP);
            }
            Err(err) => warn!(error = %err, "skipping logo"),
        }
    }

    for line in &title {
        writer.paragraph(&[Run::bold(line.clone())], fonts.title);
    }
    writer.spacer(BLOCK_GAP);

    writer.paragraph(&[Run::bold(general_call)], fonts.subheading);
    writer.spacer(LINE_GAP);

    for section in &template.sections {
        match section {
            Section::HomeBase => home_base(&mut writer, sheet, template),
            Section::FilmingLocations => filming_locations(&mut writer, sheet, template),
            Section::Cast => cast(&mut writer, sheet, template),
            Section::CastNotes => cast_notes(&mut writer, sheet, template),
            Section::Crew => crew(&mut writer, sheet, template),
            Section::CrewNotes => crew_notes(&mut writer, sheet, template),
            Section::Contacts => contacts(&mut writer, sheet, template),
            Section::ProductionNotes => production_notes(&mut writer, sheet, template),
        }
    }

    Ok(writer.finish()?)
}

/// Render and write the PDF to `path`, creating parent directories as needed.
pub fn export_call_sheet(sheet: &CallSheet, template: &Template, path: &Path) -> Result<PathBuf> {
    let bytes = render_call_sheet(sheet, template)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| CallSheetError::io(parent, err))?;
    }
    fs::write(path, &bytes).map_err(|err| CallSheetError::io(path, err))?;

    info!(
        production = %sheet.production_name,
        template = %template.name,
        path = %path.display(),
        bytes = bytes.len(),
        "exported call sheet"
    );
    Ok(path.to_path_buf())
}

/// Write a throwaway PDF to the temp directory and hand it to the system
/// viewer.
pub fn preview_call_sheet(sheet: &CallSheet, template: &Template) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("{}-preview.pdf", sheet.suggested_name()));
    export_call_sheet(sheet, template, &path)?;
    open::that(&path).map_err(|err| CallSheetError::io(&path, err))?;
    Ok(path)
}

fn load_logo(path: &Path) -> std::result::Result<RasterImage, RenderError> {
    let decoded = image::open(path).map_err(|source| RenderError::Logo {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    Ok(RasterImage {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    })
}

/// Scale an image to fit inside `max_width` x `max_height`, keeping its
/// aspect ratio.
fn fit_box(image: &RasterImage, max_width: f32, max_height: f32) -> (f32, f32) {
    if image.width == 0 || image.height == 0 {
        return (max_width, max_height);
    }
    let scale = (max_width / image.width as f32).min(max_height / image.height as f32);
    (image.width as f32 * scale, image.height as f32 * scale)
}

fn heading(writer: &mut PageWriter, text: &str, size: f32) {
    writer.paragraph(&[Run::bold(text)], size);
    writer.spacer(LINE_GAP / 2.0);
}

fn optional_note(runs: &mut Vec<Run>, notes: Option<&String>) {
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        runs.push(Run::italic(format!("\nNotes: {}", notes.trim())));
    }
}

fn home_base(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    let Some(base) = &sheet.home_base else {
        return;
    };
    let mut runs = vec![
        Run::bold("HOME BASE:\n"),
        Run::regular(format!("{}\n{}", base.name, base.address)),
    ];
    optional_note(&mut runs, base.notes.as_ref());
    writer.paragraph(&runs, template.fonts.body);
    writer.spacer(BLOCK_GAP);
}

fn filming_locations(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    if sheet.filming_locations.is_empty() {
        return;
    }
    heading(writer, "FILMING LOCATIONS:", template.fonts.subheading);
    for (idx, location) in sheet.filming_locations.iter().enumerate() {
        let mut runs = vec![
            Run::bold(format!("Location {}: {}\n", idx + 1, location.name)),
            Run::regular(location.address.clone()),
        ];
        optional_note(&mut runs, location.notes.as_ref());
        writer.paragraph(&runs, template.fonts.body);
        writer.spacer(LINE_GAP / 2.0);
    }
    writer.spacer(BLOCK_GAP);
}

fn cast(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    if sheet.cast_members.is_empty() {
        return;
    }
    heading(writer, "CAST:", template.fonts.heading);
    let rows: Vec<Vec<String>> = sheet
        .cast_by_call_time()
        .into_iter()
        .map(|member| {
            vec![
                member.name.clone(),
                member.role.clone(),
                member.call_time.format("%I:%M %p").to_string(),
            ]
        })
        .collect();
    writer.table(
        &template.columns.cast,
        &["Name", "Role", "Call Time"],
        &rows,
        template.fonts.body,
    );
    writer.spacer(BLOCK_GAP);
}

fn cast_notes(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    let noted: Vec<_> = sheet
        .cast_members
        .iter()
        .filter_map(|member| {
            member
                .notes
                .as_ref()
                .filter(|n| !n.trim().is_empty())
                .map(|notes| (member, notes))
        })
        .collect();
    if noted.is_empty() {
        return;
    }
    heading(writer, "CAST NOTES:", template.fonts.subheading);
    for (member, notes) in noted {
        writer.paragraph(
            &[
                Run::bold(format!("{member}:")),
                Run::regular(notes.trim()),
            ],
            template.fonts.body,
        );
    }
    writer.spacer(BLOCK_GAP);
}

fn crew(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    if sheet.crew_members.is_empty() {
        return;
    }
    heading(writer, "CREW:", template.fonts.heading);
    for department in sheet.departments() {
        heading(writer, &department.to_uppercase(), template.fonts.subheading);
        let rows: Vec<Vec<String>> = sheet
            .crew_in_department(&department)
            .into_iter()
            .map(|member| {
                vec![
                    member.name.clone(),
                    member.position.clone(),
                    member.call_time.format("%I:%M %p").to_string(),
                ]
            })
            .collect();
        writer.table(
            &template.columns.crew,
            &["Name", "Position", "Call Time"],
            &rows,
            template.fonts.body,
        );
        writer.spacer(BLOCK_GAP);
    }
}

fn crew_notes(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    let noted: Vec<_> = sheet
        .crew_members
        .iter()
        .filter_map(|member| {
            member
                .notes
                .as_ref()
                .filter(|n| !n.trim().is_empty())
                .map(|notes| (member, notes))
        })
        .collect();
    if noted.is_empty() {
        return;
    }
    heading(writer, "CREW NOTES:", template.fonts.subheading);
    for (member, notes) in noted {
        writer.paragraph(
            &[
                Run::bold(format!("{member}:")),
                Run::regular(notes.trim()),
            ],
            template.fonts.body,
        );
    }
    writer.spacer(BLOCK_GAP);
}

fn contacts(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    if sheet.contacts.is_empty() {
        return;
    }
    heading(writer, "CONTACTS:", template.fonts.heading);
    let rows: Vec<Vec<String>> = sheet
        .contacts
        .iter()
        .map(|contact| {
            vec![
                contact.name.clone(),
                contact.role.clone(),
                contact.phone.clone().unwrap_or_default(),
                contact.email.clone().unwrap_or_default(),
            ]
        })
        .collect();
    writer.table(
        &template.columns.contacts,
        &["Name", "Role", "Phone", "Email"],
        &rows,
        template.fonts.body,
    );
    writer.spacer(BLOCK_GAP);
}

fn production_notes(writer: &mut PageWriter, sheet: &CallSheet, template: &Template) {
    let notes: Vec<String> = sheet
        .notes
        .iter()
        .map(|note| note.trim().to_string())
        .filter(|note| !note.is_empty())
        .collect();
    if notes.is_empty() {
        return;
    }
    heading(writer, "PRODUCTION NOTES:", template.fonts.subheading);
    writer.bullets(&notes, template.fonts.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TemplateError, ValidationError};
    use crate::models::{CastMember, CrewMember, Location};
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use lopdf::Document;
    use tempfile::TempDir;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn full_sheet() -> CallSheet {
        let mut sheet = CallSheet::new("Night Shift", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        sheet.home_base = Some(Location {
            name: "Lot B".into(),
            address: "1 Studio Way".into(),
            notes: Some("Park behind stage 4".into()),
        });
        sheet.cast_members.push(CastMember {
            name: "Dana Reyes".into(),
            role: "Detective Hale".into(),
            call_time: at(9, 15),
            notes: Some("Wardrobe fitting first".into()),
        });
        sheet.crew_members.push(CrewMember {
            name: "Sam Ortiz".into(),
            position: "Gaffer".into(),
            department: "Electric".into(),
            call_time: at(6, 30),
            notes: None,
        });
        sheet.notes.push("Closed set after 14:00".into());
        sheet
    }

    fn page_text(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let mut text = String::new();
        for page_id in doc.get_pages().into_values() {
            text.push_str(&String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()));
        }
        text
    }

    #[test]
    fn renders_sections_in_template_order() {
        let bytes = render_call_sheet(&full_sheet(), &Template::default()).unwrap();
        let text = page_text(&bytes);

        for needle in [
            "(NIGHT SHIFT)",
            "(CALL SHEET - Sunday, October 18, 2026)",
            "(GENERAL CALL TIME: 07:00 AM)",
            "(HOME BASE:)",
            "(Detective Hale)",
            "(09:15 AM)",
            "(ELECTRIC)",
            "(06:30 AM)",
            "(PRODUCTION NOTES:)",
        ] {
            assert!(text.contains(needle), "missing {needle}");
        }
        assert!(text.find("(CAST:)").unwrap() < text.find("(CREW:)").unwrap());
    }

    #[test]
    fn template_controls_which_sections_print() {
        let mut template = Template::default();
        template.sections = vec![Section::Crew];
        let text = page_text(&render_call_sheet(&full_sheet(), &template).unwrap());
        assert!(text.contains("(CREW:)"));
        assert!(!text.contains("(CAST:)"));
        assert!(!text.contains("(HOME BASE:)"));
    }

    #[test]
    fn missing_production_name_is_a_validation_error() {
        let mut sheet = full_sheet();
        sheet.production_name.clear();
        assert_matches!(
            render_call_sheet(&sheet, &Template::default()),
            Err(CallSheetError::Validation(ValidationError::Required("Production name")))
        );
    }

    #[test]
    fn template_required_fields_are_enforced() {
        let mut template = Template::default();
        template.required_fields.push("home_base_name".into());
        let mut sheet = full_sheet();
        sheet.home_base = None;
        assert_matches!(
            render_call_sheet(&sheet, &template),
            Err(CallSheetError::Template(TemplateError::MissingField(_)))
        );
    }

    #[test]
    fn unreadable_logo_is_skipped() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("logo.png");
        fs::write(&logo, b"not a png").unwrap();
        let mut sheet = full_sheet();
        sheet.logo_path = Some(logo);

        let bytes = render_call_sheet(&sheet, &Template::default()).unwrap();
        assert!(page_text(&bytes).contains("(NIGHT SHIFT)"));
    }

    #[test]
    fn export_failure_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("sheet.pdf");
        let sheet = CallSheet::new("", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());

        assert!(export_call_sheet(&sheet, &Template::default(), &target).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn logo_is_scaled_into_its_box() {
        let image = RasterImage {
            width: 400,
            height: 100,
            rgb: Vec::new(),
        };
        assert_eq!(fit_box(&image, 108.0, 72.0), (108.0, 27.0));
    }
}
