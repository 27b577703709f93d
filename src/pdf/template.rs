//! Templates describe the page geometry, the header text, and which sections
//! appear in what order. They are plain JSON files under
//! `resources/templates/`; the `standard` layout is also built in so a fresh
//! install can export before any resources exist.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::TemplateError;
use crate::models::CallSheet;

/// Name of the built-in template, also used as its file stem when seeded.
pub const STANDARD_TEMPLATE: &str = "standard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    /// Points (1/72 inch).
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSizes {
    pub title: f32,
    pub heading: f32,
    pub subheading: f32,
    pub body: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnWidths {
    /// Name, role, call time.
    pub cast: Vec<f32>,
    /// Name, position, call time.
    pub crew: Vec<f32>,
    /// Name, role, phone, email.
    pub contacts: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoBox {
    pub width: f32,
    pub height: f32,
}

/// Body sections a template can place, in the order listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    HomeBase,
    FilmingLocations,
    Cast,
    CastNotes,
    Crew,
    CrewNotes,
    Contacts,
    ProductionNotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub page: PageSetup,
    pub fonts: FontSizes,
    /// Header lines, each with `{field}` placeholders.
    pub title_lines: Vec<String>,
    pub general_call: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
    pub sections: Vec<Section>,
    pub columns: ColumnWidths,
    pub logo: LogoBox,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            name: STANDARD_TEMPLATE.to_string(),
            description: "US Letter call sheet with cast, crew by department, and contacts"
                .to_string(),
            page: PageSetup {
                width: 612.0,
                height: 792.0,
                margin: 36.0,
            },
            fonts: FontSizes {
                title: 16.0,
                heading: 14.0,
                subheading: 12.0,
                body: 10.0,
            },
            title_lines: vec![
                "{production_name_upper}".to_string(),
                "CALL SHEET - {production_date_long}".to_string(),
            ],
            general_call: "GENERAL CALL TIME: {general_call_time}".to_string(),
            required_fields: vec![
                "production_name".to_string(),
                "production_date".to_string(),
                "general_call_time".to_string(),
            ],
            sections: vec![
                Section::HomeBase,
                Section::FilmingLocations,
                Section::Cast,
                Section::CastNotes,
                Section::Crew,
                Section::CrewNotes,
                Section::Contacts,
                Section::ProductionNotes,
            ],
            columns: ColumnWidths {
                cast: vec![180.0, 180.0, 72.0],
                crew: vec![144.0, 216.0, 72.0],
                contacts: vec![144.0, 144.0, 108.0, 144.0],
            },
            logo: LogoBox {
                width: 108.0,
                height: 72.0,
            },
        }
    }
}

impl Template {
    /// Read one template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let raw = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Width available to body text.
    pub fn text_width(&self) -> f32 {
        self.page.width - 2.0 * self.page.margin
    }

    /// Fail with `MissingField` for the first required field that has no
    /// value on this call sheet.
    pub fn check_required(&self, sheet: &CallSheet) -> Result<(), TemplateError> {
        for field in &self.required_fields {
            let value = field_value(sheet, field)?;
            if value.trim().is_empty() {
                return Err(TemplateError::MissingField(field.clone()));
            }
        }
        Ok(())
    }

    /// Header lines with record fields substituted.
    pub fn title(&self, sheet: &CallSheet) -> Result<Vec<String>, TemplateError> {
        self.title_lines
            .iter()
            .map(|line| substitute(line, sheet))
            .collect()
    }

    pub fn general_call_line(&self, sheet: &CallSheet) -> Result<String, TemplateError> {
        substitute(&self.general_call, sheet)
    }
}

/// Resolve a placeholder name against a call sheet. Optional data that is
/// absent resolves to an empty string; unknown names are an error.
pub fn field_value(sheet: &CallSheet, field: &str) -> Result<String, TemplateError> {
    let value = match field {
        "production_name" => sheet.production_name.trim().to_string(),
        "production_name_upper" => sheet.production_name.trim().to_uppercase(),
        "production_date" => sheet.production_date.format("%Y-%m-%d").to_string(),
        "production_date_long" => sheet.production_date.format("%A, %B %d, %Y").to_string(),
        "general_call_time" => sheet.general_call_time.format("%I:%M %p").to_string(),
        "home_base_name" => sheet
            .home_base
            .as_ref()
            .map(|base| base.name.clone())
            .unwrap_or_default(),
        "home_base_address" => sheet
            .home_base
            .as_ref()
            .map(|base| base.address.clone())
            .unwrap_or_default(),
        "cast_count" => sheet.cast_members.len().to_string(),
        "crew_count" => sheet.crew_members.len().to_string(),
        other => return Err(TemplateError::UnknownField(other.to_string())),
    };
    Ok(value)
}

/// Replace every `{field}` in `text`. `{{` and `}}` produce literal braces.
pub fn substitute(text: &str, sheet: &CallSheet) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    field.push(inner);
                }
                if !closed {
                    return Err(TemplateError::Unclosed(text.to_string()));
                }
                out.push_str(&field_value(sheet, field.trim())?);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Write the built-in template into `dir` unless a file with its name exists.
/// Returns the path of the seeded (or already present) file.
pub fn seed_templates(dir: &Path) -> Result<PathBuf, TemplateError> {
    let path = dir.join(format!("{STANDARD_TEMPLATE}.json"));
    if path.exists() {
        return Ok(path);
    }

    let write = || -> std::io::Result<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(&Template::default())?;
        fs::write(&path, json)
    };
    write().map_err(|source| TemplateError::Read {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), "seeded built-in template");
    Ok(path)
}

/// Load every `*.json` template in `dir`, sorted by name. Broken files are
/// logged and skipped. The built-in template is included when no file
/// provides it.
pub fn discover_templates(dir: &Path) -> Vec<Template> {
    let mut templates = Vec::new();

    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }
                match Template::load(&path) {
                    Ok(template) => {
                        debug!(name = %template.name, path = %path.display(), "loaded template");
                        templates.push(template);
                    }
                    Err(err) => warn!(error = %err, "skipping template"),
                }
            }
        }
        Err(err) => debug!(dir = %dir.display(), error = %err, "no template directory"),
    }

    if !templates.iter().any(|t| t.name == STANDARD_TEMPLATE) {
        templates.push(Template::default());
    }
    templates.sort_by(|a, b| a.name.cmp(&b.name));
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::TempDir;

    fn sheet() -> CallSheet {
        let mut sheet = CallSheet::new("Night Shift", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        sheet.general_call_time = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        sheet
    }

    #[test]
    fn shipped_resource_matches_builtin() {
        let shipped: Template =
            serde_json::from_str(include_str!("../../resources/templates/standard.json")).unwrap();
        assert_eq!(shipped, Template::default());
    }

    #[test]
    fn substitutes_record_fields() {
        let template = Template::default();
        assert_eq!(
            template.title(&sheet()).unwrap(),
            vec!["NIGHT SHIFT", "CALL SHEET - Monday, January 05, 2026"]
        );
        assert_eq!(
            template.general_call_line(&sheet()).unwrap(),
            "GENERAL CALL TIME: 02:30 PM"
        );
    }

    #[test]
    fn braces_escape_and_optional_fields_resolve_empty() {
        let mut sheet = sheet();
        assert_eq!(
            substitute("{{base}} {home_base_name}!", &sheet).unwrap(),
            "{base} !"
        );
        sheet.home_base = Some(Location {
            name: "Lot B".into(),
            address: "1 Studio Way".into(),
            notes: None,
        });
        assert_eq!(substitute("{ home_base_name }", &sheet).unwrap(), "Lot B");
    }

    #[test]
    fn bad_placeholders_are_rejected() {
        assert_matches!(
            substitute("{director}", &sheet()),
            Err(TemplateError::UnknownField(field)) if field == "director"
        );
        assert_matches!(
            substitute("CALL {production_name", &sheet()),
            Err(TemplateError::Unclosed(_))
        );
    }

    #[test]
    fn required_fields_must_have_values() {
        let mut template = Template::default();
        template.required_fields.push("home_base_address".into());
        assert_matches!(
            template.check_required(&sheet()),
            Err(TemplateError::MissingField(field)) if field == "home_base_address"
        );
    }

    #[test]
    fn discovery_seeds_and_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        let seeded = seed_templates(dir.path()).unwrap();
        assert!(seeded.exists());

        let mut compact = Template::default();
        compact.name = "compact".into();
        compact.sections = vec![Section::Cast, Section::Crew];
        fs::write(
            dir.path().join("compact.json"),
            serde_json::to_string(&compact).unwrap(),
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let names: Vec<String> = discover_templates(dir.path())
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["compact", "standard"]);
    }

    #[test]
    fn discovery_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let templates = discover_templates(&dir.path().join("missing"));
        assert_eq!(templates, vec![Template::default()]);
    }
}
