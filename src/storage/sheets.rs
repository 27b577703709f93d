use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{CallSheetError, Result};
use crate::models::{CallSheet, MAX_FILMING_LOCATIONS};

use super::names::sheet_name;
use super::store::{CallSheetStore, SHEET_EXTENSION};

/// Validate and write a call sheet, returning the path of the file written.
/// The JSON goes to a sibling temporary file first and is renamed into place so
/// a failed write never truncates an existing record.
pub fn save_call_sheet(store: &CallSheetStore, name: &str, sheet: &CallSheet) -> Result<PathBuf> {
    let name = sheet_name(name)?;
    sheet.validate()?;

    let path = store.path_for(&name);
    let tmp_path = store.root().join(format!(".{name}.{SHEET_EXTENSION}.tmp"));

    let json = serde_json::to_vec_pretty(sheet).map_err(|source| CallSheetError::Encode {
        name: name.clone(),
        source,
    })?;

    write_file(&tmp_path, &json).map_err(|err| CallSheetError::io(&tmp_path, err))?;
    if let Err(err) = fs::rename(&tmp_path, &path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CallSheetError::io(&path, err));
    }

    info!(name = %name, path = %path.display(), "saved call sheet");
    Ok(path)
}

fn write_file(path: &std::path::Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Read a call sheet back from disk. Sheets written by hand with more than the
/// supported number of filming locations keep the first ones.
pub fn load_call_sheet(store: &CallSheetStore, name: &str) -> Result<CallSheet> {
    let name = sheet_name(name)?;
    let path = store.path_for(&name);

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(CallSheetError::NotFound(name));
        }
        Err(err) => return Err(CallSheetError::io(&path, err)),
    };

    let mut sheet: CallSheet =
        serde_json::from_slice(&bytes).map_err(|source| CallSheetError::Corrupt {
            name: name.clone(),
            source,
        })?;

    if sheet.filming_locations.len() > MAX_FILMING_LOCATIONS {
        warn!(
            name = %name,
            count = sheet.filming_locations.len(),
            "call sheet has too many filming locations; keeping the first {MAX_FILMING_LOCATIONS}"
        );
        sheet.filming_locations.truncate(MAX_FILMING_LOCATIONS);
    }

    info!(name = %name, "loaded call sheet");
    Ok(sheet)
}

/// Identifiers of every persisted call sheet, sorted case-insensitively. Files
/// without the JSON extension, dot-files (including in-flight temporaries) and
/// stems that would not round-trip through `sheet_name` are skipped.
pub fn list_call_sheets(store: &CallSheetStore) -> Result<Vec<String>> {
    let root = store.root();
    let entries = fs::read_dir(root).map_err(|err| CallSheetError::io(root, err))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| CallSheetError::io(root, err))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(SHEET_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            match sheet_name(stem) {
                Ok(name) if name == stem => names.push(name),
                _ => warn!(path = %path.display(), "skipping call sheet with an unusable name"),
            }
        }
    }

    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    Ok(names)
}

/// Remove the file backing a call sheet. There is no soft-delete: the record
/// is gone once this returns.
pub fn delete_call_sheet(store: &CallSheetStore, name: &str) -> Result<()> {
    let name = sheet_name(name)?;
    let path = store.path_for(&name);

    match fs::remove_file(&path) {
        Ok(()) => {
            info!(name = %name, "deleted call sheet");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Err(CallSheetError::NotFound(name)),
        Err(err) => Err(CallSheetError::io(&path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::Location;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store() -> (TempDir, CallSheetStore) {
        let dir = TempDir::new().unwrap();
        let store = CallSheetStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    fn sheet(name: &str) -> CallSheet {
        CallSheet::new(name, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    #[test]
    fn save_rejects_invalid_sheet_without_writing() {
        let (_dir, store) = store();
        let err = save_call_sheet(&store, "blank", &sheet("  ")).unwrap_err();
        assert_matches!(
            err,
            CallSheetError::Validation(ValidationError::Required("Production name"))
        );
        assert!(list_call_sheets(&store).unwrap().is_empty());
    }

    #[test]
    fn save_overwrites_existing_record() {
        let (_dir, store) = store();
        save_call_sheet(&store, "day-1", &sheet("First")).unwrap();
        save_call_sheet(&store, "day-1", &sheet("Second")).unwrap();

        assert_eq!(list_call_sheets(&store).unwrap(), vec!["day-1"]);
        assert_eq!(
            load_call_sheet(&store, "day-1").unwrap().production_name,
            "Second"
        );
    }

    #[test]
    fn load_reports_corrupt_files() {
        let (_dir, store) = store();
        fs::write(store.path_for("broken"), b"{ not json").unwrap();
        assert_matches!(
            load_call_sheet(&store, "broken"),
            Err(CallSheetError::Corrupt { name, .. }) if name == "broken"
        );
    }

    #[test]
    fn load_truncates_extra_filming_locations() {
        let (_dir, store) = store();
        let mut value = serde_json::to_value(sheet("Show")).unwrap();
        let locations: Vec<Location> = (0..5)
            .map(|idx| Location {
                name: format!("Loc {idx}"),
                address: "Somewhere".into(),
                notes: None,
            })
            .collect();
        value["filming_locations"] = serde_json::to_value(locations).unwrap();
        fs::write(store.path_for("crowded"), value.to_string()).unwrap();

        let loaded = load_call_sheet(&store, "crowded").unwrap();
        assert_eq!(loaded.filming_locations.len(), MAX_FILMING_LOCATIONS);
        assert_eq!(loaded.filming_locations[2].name, "Loc 2");
    }

    #[test]
    fn list_skips_foreign_and_temporary_files() {
        let (_dir, store) = store();
        save_call_sheet(&store, "b-day", &sheet("B")).unwrap();
        save_call_sheet(&store, "A-day", &sheet("A")).unwrap();
        fs::write(store.root().join("readme.txt"), b"hi").unwrap();
        fs::write(store.root().join(".half.json.tmp"), b"{").unwrap();
        fs::create_dir(store.root().join("nested.json")).unwrap();

        assert_eq!(list_call_sheets(&store).unwrap(), vec!["A-day", "b-day"]);
    }

    #[test]
    fn every_listed_name_can_be_loaded_and_deleted() {
        let (_dir, store) = store();
        assert_matches!(
            save_call_sheet(&store, "week.json.json", &sheet("Week")),
            Err(CallSheetError::Validation(ValidationError::InvalidName(_)))
        );
        save_call_sheet(&store, "week", &sheet("Week")).unwrap();
        let json = serde_json::to_vec(&sheet("Stray")).unwrap();
        for stray in ["week.json.json", " padded .json", "c:drive.json"] {
            fs::write(store.root().join(stray), &json).unwrap();
        }

        let names = list_call_sheets(&store).unwrap();
        assert_eq!(names, vec!["week"]);
        for name in &names {
            load_call_sheet(&store, name).unwrap();
            delete_call_sheet(&store, name).unwrap();
        }
    }

    #[test]
    fn delete_missing_sheet_is_not_found() {
        let (_dir, store) = store();
        assert_matches!(
            delete_call_sheet(&store, "ghost"),
            Err(CallSheetError::NotFound(name)) if name == "ghost"
        );
    }

    #[test]
    fn exists_tracks_saved_sheets() {
        let (_dir, store) = store();
        assert!(!store.exists("day-1"));
        save_call_sheet(&store, "day-1.json", &sheet("Show")).unwrap();
        assert!(store.exists("day-1"));
        assert!(!store.exists("../day-1"));
    }
}
