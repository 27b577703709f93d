use std::path::PathBuf;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::ValidationError;
use crate::models::{
    parse_date, parse_time, CallSheet, CastMember, Contact, CrewMember, Location, DATE_FORMAT,
    TIME_FORMAT,
};
use crate::storage::sheet_name;

/// One labelled input inside a modal form.
#[derive(Clone)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) required: bool,
}

impl FormField {
    fn required(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            required: true,
        }
    }

    fn optional(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            required: false,
        }
    }
}

/// Modal form state: the fields, which one has focus, the last validation
/// error, and optional autocomplete for one field.
#[derive(Clone, Default)]
pub(crate) struct Form {
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
    /// Field index that offers suggestions, with its candidate list.
    suggest_field: Option<usize>,
    candidates: Vec<String>,
    suggestion: Option<String>,
    autocomplete_disabled: bool,
}

impl Form {
    fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Production details: name, date, general call, logo.
    pub(crate) fn production(sheet: &CallSheet) -> Self {
        Self::new(vec![
            FormField::required("Production name", sheet.production_name.clone()),
            FormField::required(
                "Date (YYYY-MM-DD)",
                sheet.production_date.format(DATE_FORMAT).to_string(),
            ),
            FormField::required(
                "General call (HH:MM)",
                sheet.general_call_time.format(TIME_FORMAT).to_string(),
            ),
            FormField::optional(
                "Logo path",
                sheet
                    .logo_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        ])
    }

    pub(crate) fn location(location: Option<&Location>) -> Self {
        Self::new(vec![
            FormField::required("Name", location.map(|l| l.name.clone()).unwrap_or_default()),
            FormField::required(
                "Address",
                location.map(|l| l.address.clone()).unwrap_or_default(),
            ),
            FormField::optional(
                "Notes",
                location.and_then(|l| l.notes.clone()).unwrap_or_default(),
            ),
        ])
    }

    pub(crate) fn cast(member: Option<&CastMember>) -> Self {
        Self::new(vec![
            FormField::required("Name", member.map(|m| m.name.clone()).unwrap_or_default()),
            FormField::required("Role", member.map(|m| m.role.clone()).unwrap_or_default()),
            FormField::required(
                "Call time (HH:MM)",
                member
                    .map(|m| m.call_time.format(TIME_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            FormField::optional(
                "Notes",
                member.and_then(|m| m.notes.clone()).unwrap_or_default(),
            ),
        ])
    }

    /// Crew form; the department field autocompletes from `departments`.
    pub(crate) fn crew(member: Option<&CrewMember>, departments: Vec<String>) -> Self {
        let mut form = Self::new(vec![
            FormField::required("Name", member.map(|m| m.name.clone()).unwrap_or_default()),
            FormField::required(
                "Position",
                member.map(|m| m.position.clone()).unwrap_or_default(),
            ),
            FormField::required(
                "Department",
                member.map(|m| m.department.clone()).unwrap_or_default(),
            ),
            FormField::required(
                "Call time (HH:MM)",
                member
                    .map(|m| m.call_time.format(TIME_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            FormField::optional(
                "Notes",
                member.and_then(|m| m.notes.clone()).unwrap_or_default(),
            ),
        ]);
        form.suggest_field = Some(2);
        form.candidates = departments;
        form
    }

    pub(crate) fn contact(contact: Option<&Contact>) -> Self {
        Self::new(vec![
            FormField::required("Name", contact.map(|c| c.name.clone()).unwrap_or_default()),
            FormField::optional("Role", contact.map(|c| c.role.clone()).unwrap_or_default()),
            FormField::optional(
                "Phone",
                contact.and_then(|c| c.phone.clone()).unwrap_or_default(),
            ),
            FormField::optional(
                "Email",
                contact.and_then(|c| c.email.clone()).unwrap_or_default(),
            ),
        ])
    }

    pub(crate) fn note(note: Option<&str>) -> Self {
        Self::new(vec![FormField::required(
            "Note",
            note.unwrap_or_default().to_string(),
        )])
    }

    pub(crate) fn save_as(suggested: String) -> Self {
        Self::new(vec![FormField::required("Name", suggested)])
    }

    pub(crate) fn export(default_path: PathBuf) -> Self {
        Self::new(vec![FormField::required(
            "PDF path",
            default_path.display().to_string(),
        )])
    }

    /// Move focus forward, wrapping around.
    pub(crate) fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + 1) % self.fields.len();
        }
        self.suggestion = None;
    }

    pub(crate) fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + self.fields.len() - 1) % self.fields.len();
        }
        self.suggestion = None;
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let Some(field) = self.fields.get_mut(self.active) else {
            return false;
        };
        field.value.push(ch);
        if self.suggest_field == Some(self.active) {
            self.autocomplete_disabled = false;
        }
        self.update_suggestion();
        true
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
        }
        if self.suggest_field == Some(self.active) {
            self.autocomplete_disabled = false;
        }
        self.update_suggestion();
    }

    /// Raw value of the field with this label.
    pub(crate) fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }

    /// Character length of the field at `idx`, used for cursor placement.
    pub(crate) fn value_len(&self, idx: usize) -> usize {
        self.fields
            .get(idx)
            .map(|field| field.value.chars().count())
            .unwrap_or(0)
    }

    fn required(&self, label: &'static str) -> Result<String, ValidationError> {
        let value = self.value(label).trim();
        if value.is_empty() {
            Err(ValidationError::Required(label))
        } else {
            Ok(value.to_string())
        }
    }

    fn optional(&self, label: &str) -> Option<String> {
        let value = self.value(label).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Write the production fields back onto the sheet.
    pub(crate) fn apply_production(&self, sheet: &mut CallSheet) -> Result<(), ValidationError> {
        let name = self.required("Production name")?;
        let date = parse_date("Date", &self.required("Date (YYYY-MM-DD)")?)?;
        let call = parse_time("General call", &self.required("General call (HH:MM)")?)?;
        sheet.production_name = name;
        sheet.production_date = date;
        sheet.general_call_time = call;
        sheet.logo_path = self.optional("Logo path").map(PathBuf::from);
        Ok(())
    }

    pub(crate) fn parse_location(&self) -> Result<Location, ValidationError> {
        Ok(Location {
            name: self.required("Name")?,
            address: self.required("Address")?,
            notes: self.optional("Notes"),
        })
    }

    pub(crate) fn parse_cast(&self) -> Result<CastMember, ValidationError> {
        Ok(CastMember {
            name: self.required("Name")?,
            role: self.required("Role")?,
            call_time: parse_time("Call time", &self.required("Call time (HH:MM)")?)?,
            notes: self.optional("Notes"),
        })
    }

    pub(crate) fn parse_crew(&self) -> Result<CrewMember, ValidationError> {
        Ok(CrewMember {
            name: self.required("Name")?,
            position: self.required("Position")?,
            department: self.required("Department")?,
            call_time: parse_time("Call time", &self.required("Call time (HH:MM)")?)?,
            notes: self.optional("Notes"),
        })
    }

    pub(crate) fn parse_contact(&self) -> Result<Contact, ValidationError> {
        Ok(Contact {
            name: self.required("Name")?,
            role: self.optional("Role").unwrap_or_default(),
            phone: self.optional("Phone"),
            email: self.optional("Email"),
        })
    }

    pub(crate) fn parse_note(&self) -> Result<String, ValidationError> {
        self.required("Note")
    }

    pub(crate) fn parse_name(&self) -> Result<String, ValidationError> {
        sheet_name(&self.required("Name")?)
    }

    pub(crate) fn parse_path(&self) -> Result<PathBuf, ValidationError> {
        Ok(PathBuf::from(self.required("PDF path")?))
    }

    /// Refresh the ghosted suggestion for the autocomplete field.
    fn update_suggestion(&mut self) {
        self.suggestion = None;
        if self.suggest_field != Some(self.active) || self.autocomplete_disabled {
            return;
        }
        let current = &self.fields[self.active].value;
        if current.chars().count() < 2 {
            return;
        }
        let current_lower = current.to_lowercase();
        self.suggestion = self
            .candidates
            .iter()
            .find(|candidate| {
                let lower = candidate.to_lowercase();
                lower.starts_with(&current_lower) && lower != current_lower
            })
            .cloned();
    }

    /// Apply the suggested value, marking autocomplete as satisfied.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        match (self.suggestion.take(), self.suggest_field) {
            (Some(candidate), Some(idx)) if idx == self.active => {
                self.fields[idx].value = candidate;
                self.autocomplete_disabled = true;
                true
            }
            _ => false,
        }
    }

    /// Dismiss the current suggestion for the rest of this interaction.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.suggestion.take().is_some() {
            self.autocomplete_disabled = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.suggestion.is_some()
    }

    /// Remaining characters of the suggestion, shown ghosted after the input.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = self.fields.get(self.active)?.value.chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        (!suffix.is_empty()).then_some(suffix)
    }

    /// Render one field as a styled line.
    pub(crate) fn build_line(&self, idx: usize) -> Line<'static> {
        let field = &self.fields[idx];
        let is_active = idx == self.active;

        let display = if field.value.is_empty() {
            if field.required { "<required>" } else { "<optional>" }.to_string()
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ];
        if is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }
}

/// Choices offered when leaving an editor with unsaved changes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LeaveChoice {
    Save,
    Discard,
    Cancel,
}

/// Tracks the user's choice when leaving the editor with unsaved changes.
pub(crate) struct ConfirmLeave {
    pub(crate) exit_app: bool,
    pub(crate) selection: LeaveChoice,
}

impl ConfirmLeave {
    /// Create a confirmation dialog with the initial selection on "Save".
    pub(crate) fn new(exit_app: bool) -> Self {
        Self {
            exit_app,
            selection: LeaveChoice::Save,
        }
    }

    /// Move the selection forward (Save → Discard → Cancel).
    pub(crate) fn next(&mut self) {
        self.selection = match self.selection {
            LeaveChoice::Save => LeaveChoice::Discard,
            LeaveChoice::Discard => LeaveChoice::Cancel,
            LeaveChoice::Cancel => LeaveChoice::Save,
        };
    }

    /// Move the selection backward (Save ← Discard ← Cancel).
    pub(crate) fn previous(&mut self) {
        self.selection = match self.selection {
            LeaveChoice::Save => LeaveChoice::Cancel,
            LeaveChoice::Discard => LeaveChoice::Save,
            LeaveChoice::Cancel => LeaveChoice::Discard,
        };
    }

    /// Labels rendered on the dialog buttons.
    pub(crate) fn labels(&self) -> [&'static str; 3] {
        if self.exit_app {
            ["Save & Quit", "Discard & Quit", "Cancel"]
        } else {
            ["Save & Leave", "Discard & Leave", "Cancel"]
        }
    }

    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            LeaveChoice::Save => 0,
            LeaveChoice::Discard => 1,
            LeaveChoice::Cancel => 2,
        }
    }
}

/// State for confirming removal of one entry from the open call sheet.
pub(crate) struct ConfirmRemove {
    pub(crate) index: usize,
    pub(crate) label: String,
}

/// State for confirming deletion of a saved call sheet file.
pub(crate) struct ConfirmDeleteSheet {
    pub(crate) name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn type_text(form: &mut Form, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn production_form_round_trips_sheet_fields() {
        let sheet = CallSheet::new("Night Shift", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        let form = Form::production(&sheet);
        assert_eq!(form.value("Date (YYYY-MM-DD)"), "2026-10-18");
        assert_eq!(form.value("General call (HH:MM)"), "07:00");

        let mut copy = CallSheet::default();
        form.apply_production(&mut copy).unwrap();
        assert_eq!(copy, sheet);
    }

    #[test]
    fn invalid_time_leaves_sheet_untouched() {
        let sheet = CallSheet::new("Night Shift", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        let mut form = Form::production(&sheet);
        form.active = 2;
        form.backspace();
        form.backspace();
        type_text(&mut form, "99");

        let mut target = sheet.clone();
        target.production_name = "Other".into();
        assert!(matches!(
            form.apply_production(&mut target),
            Err(ValidationError::Format { field: "General call", .. })
        ));
        assert_eq!(target.production_name, "Other");
    }

    #[test]
    fn cast_form_requires_role() {
        let mut form = Form::cast(None);
        type_text(&mut form, "Dana");
        assert_eq!(form.parse_cast(), Err(ValidationError::Required("Role")));

        form.next_field();
        type_text(&mut form, "Hale");
        form.next_field();
        type_text(&mut form, "09:15");
        let member = form.parse_cast().unwrap();
        assert_eq!(member.call_time, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(member.notes, None);
    }

    #[test]
    fn department_autocomplete_suggests_and_accepts() {
        let mut form = Form::crew(None, vec!["Camera".into(), "Electric".into()]);
        form.active = 2;
        type_text(&mut form, "el");
        assert!(form.has_active_suggestion());
        assert_eq!(form.suggestion_suffix().as_deref(), Some("ectric"));

        assert!(form.accept_suggestion());
        assert_eq!(form.value("Department"), "Electric");
        assert!(!form.has_active_suggestion());
    }

    #[test]
    fn cancelled_autocomplete_stays_quiet_until_next_edit() {
        let mut form = Form::crew(None, vec!["Camera".into()]);
        form.active = 2;
        type_text(&mut form, "Ca");
        assert!(form.cancel_autocomplete());
        assert!(!form.has_active_suggestion());

        form.backspace();
        type_text(&mut form, "a");
        assert!(form.has_active_suggestion());
    }

    #[test]
    fn save_as_rejects_path_like_names() {
        let mut form = Form::save_as(String::new());
        type_text(&mut form, "../oops");
        assert_eq!(
            form.parse_name(),
            Err(ValidationError::InvalidName("../oops".into()))
        );
    }

    #[test]
    fn leave_dialog_cycles_choices() {
        let mut confirm = ConfirmLeave::new(true);
        assert_eq!(confirm.labels()[0], "Save & Quit");
        confirm.previous();
        assert_eq!(confirm.selection, LeaveChoice::Cancel);
        confirm.next();
        confirm.next();
        assert_eq!(confirm.selected_index(), 1);
    }
}
