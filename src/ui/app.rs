use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::info;

use crate::config::AppConfig;
use crate::error::ValidationError;
use crate::models::{CallSheet, DATE_FORMAT, MAX_FILMING_LOCATIONS, TIME_FORMAT};
use crate::pdf::{export_call_sheet, preview_call_sheet, Template};
use crate::storage::{
    delete_call_sheet, list_call_sheets, load_call_sheet, save_call_sheet, CallSheetStore,
};

use super::forms::{ConfirmDeleteSheet, ConfirmLeave, ConfirmRemove, Form, LeaveChoice};
use super::helpers::{centered_rect, key_hints, surface_error};
use super::screens::{EditorScreen, EditorTab, LibraryScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the tab bar above the editor body.
const TAB_BAR_HEIGHT: u16 = 3;

enum Screen {
    Library,
    Editor(EditorScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    Editing { target: FormTarget, form: Form },
    ConfirmRemove(ConfirmRemove),
    ConfirmDeleteSheet(ConfirmDeleteSheet),
    ConfirmLeave(ConfirmLeave),
}

/// What a submitted form writes to. `None` indexes mean "append".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormTarget {
    Production,
    HomeBase,
    FilmingLocation(Option<usize>),
    Cast(Option<usize>),
    Crew(Option<usize>),
    Contact(Option<usize>),
    Note(Option<usize>),
    SaveAs { then: AfterSave },
    Export,
}

impl FormTarget {
    fn title(self) -> &'static str {
        match self {
            FormTarget::Production => "Production Details",
            FormTarget::HomeBase => "Home Base",
            FormTarget::FilmingLocation(None) => "Add Filming Location",
            FormTarget::FilmingLocation(Some(_)) => "Edit Filming Location",
            FormTarget::Cast(None) => "Add Cast Member",
            FormTarget::Cast(Some(_)) => "Edit Cast Member",
            FormTarget::Crew(None) => "Add Crew Member",
            FormTarget::Crew(Some(_)) => "Edit Crew Member",
            FormTarget::Contact(None) => "Add Contact",
            FormTarget::Contact(Some(_)) => "Edit Contact",
            FormTarget::Note(None) => "Add Note",
            FormTarget::Note(Some(_)) => "Edit Note",
            FormTarget::SaveAs { .. } => "Save Call Sheet As",
            FormTarget::Export => "Export PDF",
        }
    }
}

/// Where to go once a save succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterSave {
    Stay,
    Leave,
    Quit,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    config: AppConfig,
    store: CallSheetStore,
    templates: Vec<Template>,
    template_idx: usize,
    library: LibraryScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl App {
    /// Build the app around an opened store. An empty template list falls
    /// back to the built-in layout.
    pub fn new(config: AppConfig, store: CallSheetStore, mut templates: Vec<Template>) -> Result<Self> {
        if templates.is_empty() {
            templates.push(Template::default());
        }
        let names = list_call_sheets(&store).context("failed to list call sheets")?;
        let count = names.len();
        let mut app = Self {
            config,
            store,
            templates,
            template_idx: 0,
            library: LibraryScreen::new(names),
            screen: Screen::Library,
            mode: Mode::Normal,
            status: None,
            last_export: None,
        };
        app.set_status(
            format!("{count} call sheet(s) in {}", app.store.root().display()),
            StatusKind::Info,
        );
        Ok(app)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal if matches!(self.screen, Screen::Library) => {
                self.handle_library_key(code, &mut exit)?
            }
            Mode::Normal => self.handle_editor_key(code, &mut exit)?,
            Mode::Editing { target, form } => self.handle_form_key(code, target, form, &mut exit)?,
            Mode::ConfirmRemove(confirm) => self.handle_confirm_remove(code, confirm),
            Mode::ConfirmDeleteSheet(confirm) => self.handle_confirm_delete_sheet(code, confirm),
            Mode::ConfirmLeave(confirm) => self.handle_confirm_leave(code, confirm, &mut exit)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Ctrl shortcuts: save, export, preview. Only active in the editor when
    /// no dialog is open.
    pub(crate) fn handle_ctrl(&mut self, ch: char) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) || !matches!(self.screen, Screen::Editor(_)) {
            return Ok(());
        }

        match ch.to_ascii_lowercase() {
            's' => {
                let mut exit = false;
                match self.save_current(AfterSave::Stay, &mut exit) {
                    Ok(mode) => self.mode = mode,
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            'e' => self.mode = self.export_form(),
            'p' => self.preview(),
            _ => {}
        }
        Ok(())
    }

    fn handle_library_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up | KeyCode::Char('k') => self.library.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.library.move_selection(1),
            KeyCode::Enter | KeyCode::Char('e') => self.open_selected(),
            KeyCode::Char('+') | KeyCode::Char('n') => {
                self.screen = Screen::Editor(EditorScreen::new(CallSheet::default(), None));
                self.set_status(
                    "New call sheet. Press Enter to fill in the production details.",
                    StatusKind::Info,
                );
            }
            KeyCode::Char('-') | KeyCode::Delete => match self.library.current() {
                Some(name) => {
                    return Ok(Mode::ConfirmDeleteSheet(ConfirmDeleteSheet {
                        name: name.to_string(),
                    }))
                }
                None => self.set_status("No call sheet selected.", StatusKind::Error),
            },
            KeyCode::Char('r') => {
                self.refresh_library(None)?;
                self.set_status("Library refreshed.", StatusKind::Info);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_editor_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Editor(editor) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Esc => {
                if editor.dirty {
                    return Ok(Mode::ConfirmLeave(ConfirmLeave::new(false)));
                }
                self.close_editor()?;
            }
            KeyCode::Char('q') => {
                if editor.dirty {
                    return Ok(Mode::ConfirmLeave(ConfirmLeave::new(true)));
                }
                *exit = true;
            }
            KeyCode::Left | KeyCode::BackTab => editor.switch_tab(-1),
            KeyCode::Right | KeyCode::Tab => editor.switch_tab(1),
            KeyCode::Up | KeyCode::Char('k') => editor.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => editor.move_selection(1),
            KeyCode::Enter | KeyCode::Char('e') => return Ok(self.edit_selected()),
            KeyCode::Char('+') | KeyCode::Char('a') => return Ok(self.add_entry()),
            KeyCode::Char('-') | KeyCode::Delete => return Ok(self.confirm_remove()),
            KeyCode::Char('f') if editor.tab == EditorTab::Crew => {
                editor.cycle_crew_filter();
                let message = format!("Showing {}.", editor.crew_filter_label());
                self.set_status(message, StatusKind::Info);
            }
            KeyCode::Char('t') => self.cycle_template(),
            KeyCode::Char('o') => self.open_last_export(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form_key(
        &mut self,
        code: KeyCode,
        target: FormTarget,
        mut form: Form,
        exit: &mut bool,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                if form.cancel_autocomplete() {
                    return Ok(Mode::Editing { target, form });
                }
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => {
                if !form.accept_suggestion() {
                    form.next_field();
                }
            }
            KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
            }
            KeyCode::Enter => match self.submit_form(target, &form, exit) {
                Ok(mode) => return Ok(mode),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Editing { target, form })
    }

    fn handle_confirm_remove(&mut self, code: KeyCode, confirm: ConfirmRemove) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.perform_remove(&confirm);
                Mode::Normal
            }
            _ => Mode::ConfirmRemove(confirm),
        }
    }

    fn handle_confirm_delete_sheet(&mut self, code: KeyCode, confirm: ConfirmDeleteSheet) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = delete_call_sheet(&self.store, &confirm.name)
                    .with_context(|| format!("failed to delete '{}'", confirm.name))
                    .and_then(|()| self.refresh_library(None));
                match result {
                    Ok(()) => {
                        self.set_status(format!("Deleted '{}'.", confirm.name), StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmDeleteSheet(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDeleteSheet(confirm),
        }
    }

    fn handle_confirm_leave(
        &mut self,
        code: KeyCode,
        mut confirm: ConfirmLeave,
        exit: &mut bool,
    ) -> Result<Mode> {
        match code {
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => confirm.previous(),
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => confirm.next(),
            KeyCode::Esc => {
                self.set_status("Still editing.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                let then = if confirm.exit_app {
                    AfterSave::Quit
                } else {
                    AfterSave::Leave
                };
                match confirm.selection {
                    LeaveChoice::Save => match self.save_current(then, exit) {
                        Ok(mode) => return Ok(mode),
                        Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                    },
                    LeaveChoice::Discard => {
                        if confirm.exit_app {
                            *exit = true;
                        } else {
                            self.close_editor()?;
                            self.set_status("Changes discarded.", StatusKind::Info);
                        }
                        return Ok(Mode::Normal);
                    }
                    LeaveChoice::Cancel => {
                        self.set_status("Still editing.", StatusKind::Info);
                        return Ok(Mode::Normal);
                    }
                }
            }
            _ => {}
        }
        Ok(Mode::ConfirmLeave(confirm))
    }

    /// Open the form for the highlighted row of the current tab.
    fn edit_selected(&mut self) -> Mode {
        let Some(editor) = self.editor() else {
            return Mode::Normal;
        };
        let sheet = &editor.sheet;
        let idx = editor.selected;

        let opened = match editor.tab {
            EditorTab::Production => Some((FormTarget::Production, Form::production(sheet))),
            EditorTab::Locations if idx == 0 => Some((
                FormTarget::HomeBase,
                Form::location(sheet.home_base.as_ref()),
            )),
            EditorTab::Locations => sheet
                .filming_locations
                .get(idx - 1)
                .map(|loc| (FormTarget::FilmingLocation(Some(idx - 1)), Form::location(Some(loc)))),
            EditorTab::Cast => sheet
                .cast_members
                .get(idx)
                .map(|member| (FormTarget::Cast(Some(idx)), Form::cast(Some(member)))),
            EditorTab::Crew => editor.selected_crew().map(|real| {
                (
                    FormTarget::Crew(Some(real)),
                    Form::crew(Some(&sheet.crew_members[real]), sheet.departments()),
                )
            }),
            EditorTab::Contacts => sheet
                .contacts
                .get(idx)
                .map(|contact| (FormTarget::Contact(Some(idx)), Form::contact(Some(contact)))),
            EditorTab::Notes => sheet
                .notes
                .get(idx)
                .map(|note| (FormTarget::Note(Some(idx)), Form::note(Some(note)))),
        };

        match opened {
            Some((target, form)) => Mode::Editing { target, form },
            None => {
                self.set_status("Nothing selected. Press '+' to add.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    /// Open an empty form for a new entry on the current tab.
    fn add_entry(&mut self) -> Mode {
        let Some(editor) = self.editor() else {
            return Mode::Normal;
        };
        let sheet = &editor.sheet;

        let (target, form) = match editor.tab {
            EditorTab::Production => (FormTarget::Production, Form::production(sheet)),
            EditorTab::Locations => {
                if sheet.filming_locations.len() >= MAX_FILMING_LOCATIONS {
                    let err = ValidationError::TooManyLocations {
                        max: MAX_FILMING_LOCATIONS,
                    };
                    self.set_status(err.to_string(), StatusKind::Error);
                    return Mode::Normal;
                }
                (FormTarget::FilmingLocation(None), Form::location(None))
            }
            EditorTab::Cast => (FormTarget::Cast(None), Form::cast(None)),
            EditorTab::Crew => (FormTarget::Crew(None), Form::crew(None, sheet.departments())),
            EditorTab::Contacts => (FormTarget::Contact(None), Form::contact(None)),
            EditorTab::Notes => (FormTarget::Note(None), Form::note(None)),
        };
        Mode::Editing { target, form }
    }

    fn confirm_remove(&mut self) -> Mode {
        let Some(editor) = self.editor() else {
            return Mode::Normal;
        };
        let sheet = &editor.sheet;
        let idx = editor.selected;

        let mut index = idx;
        let label = match editor.tab {
            EditorTab::Production => None,
            EditorTab::Locations if idx == 0 => sheet
                .home_base
                .as_ref()
                .map(|base| format!("home base {}", base.name)),
            EditorTab::Locations => sheet
                .filming_locations
                .get(idx - 1)
                .map(|loc| format!("filming location {}", loc.name)),
            EditorTab::Cast => sheet.cast_members.get(idx).map(ToString::to_string),
            EditorTab::Crew => editor.selected_crew().map(|real| {
                index = real;
                sheet.crew_members[real].to_string()
            }),
            EditorTab::Contacts => sheet.contacts.get(idx).map(|c| c.name.clone()),
            EditorTab::Notes => sheet.notes.get(idx).map(|note| format!("note \"{note}\"")),
        };

        match label {
            Some(label) => Mode::ConfirmRemove(ConfirmRemove { index, label }),
            None => {
                self.set_status("Nothing to remove here.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn perform_remove(&mut self, confirm: &ConfirmRemove) {
        let Some(editor) = self.editor_mut() else {
            return;
        };
        let sheet = &mut editor.sheet;
        let idx = confirm.index;

        let removed = match editor.tab {
            EditorTab::Production => false,
            EditorTab::Locations if idx == 0 => sheet.home_base.take().is_some(),
            EditorTab::Locations => remove_at(&mut sheet.filming_locations, idx - 1),
            EditorTab::Cast => remove_at(&mut sheet.cast_members, idx),
            EditorTab::Crew => remove_at(&mut sheet.crew_members, idx),
            EditorTab::Contacts => remove_at(&mut sheet.contacts, idx),
            EditorTab::Notes => remove_at(&mut sheet.notes, idx),
        };

        if removed {
            editor.dirty = true;
            editor.ensure_in_bounds();
            self.set_status(format!("Removed {}.", confirm.label), StatusKind::Info);
        }
    }

    /// Apply a submitted form. Errors leave the record untouched and keep the
    /// form open.
    fn submit_form(&mut self, target: FormTarget, form: &Form, exit: &mut bool) -> Result<Mode> {
        match target {
            FormTarget::SaveAs { then } => {
                let name = form.parse_name()?;
                return self.save_as(name, then, exit);
            }
            FormTarget::Export => {
                let path = form.parse_path()?;
                self.export_to(&path)?;
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        let Some(editor) = self.editor_mut() else {
            return Ok(Mode::Normal);
        };
        let sheet = &mut editor.sheet;

        let message = match target {
            FormTarget::Production => {
                form.apply_production(sheet)?;
                "Production details updated."
            }
            FormTarget::HomeBase => {
                sheet.home_base = Some(form.parse_location()?);
                "Home base updated."
            }
            FormTarget::FilmingLocation(None) => {
                sheet.add_filming_location(form.parse_location()?)?;
                editor.selected = sheet.filming_locations.len();
                "Filming location added."
            }
            FormTarget::FilmingLocation(Some(idx)) => {
                upsert(&mut sheet.filming_locations, Some(idx), form.parse_location()?);
                "Filming location updated."
            }
            FormTarget::Cast(idx) => {
                editor.selected = upsert(&mut sheet.cast_members, idx, form.parse_cast()?);
                "Cast member saved."
            }
            FormTarget::Crew(idx) => {
                let saved = upsert(&mut sheet.crew_members, idx, form.parse_crew()?);
                editor.select_crew(saved);
                "Crew member saved."
            }
            FormTarget::Contact(idx) => {
                editor.selected = upsert(&mut sheet.contacts, idx, form.parse_contact()?);
                "Contact saved."
            }
            FormTarget::Note(idx) => {
                editor.selected = upsert(&mut sheet.notes, idx, form.parse_note()?);
                "Note saved."
            }
            FormTarget::SaveAs { .. } | FormTarget::Export => return Ok(Mode::Normal),
        };

        editor.dirty = true;
        editor.ensure_in_bounds();
        self.set_status(message, StatusKind::Info);
        Ok(Mode::Normal)
    }

    /// Save under the current name, or ask for one on the first save.
    fn save_current(&mut self, then: AfterSave, exit: &mut bool) -> Result<Mode> {
        let Some(editor) = self.editor() else {
            return Ok(Mode::Normal);
        };
        match editor.name.clone() {
            Some(name) => self.save_as(name, then, exit),
            None => Ok(Mode::Editing {
                target: FormTarget::SaveAs { then },
                form: Form::save_as(editor.sheet.suggested_name()),
            }),
        }
    }

    fn save_as(&mut self, name: String, then: AfterSave, exit: &mut bool) -> Result<Mode> {
        let Screen::Editor(editor) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        if editor.name.as_deref() != Some(name.as_str()) && self.store.exists(&name) {
            bail!("A call sheet named '{name}' already exists.");
        }

        let path = save_call_sheet(&self.store, &name, &editor.sheet)
            .with_context(|| format!("failed to save '{name}'"))?;
        editor.name = Some(name.clone());
        editor.dirty = false;

        self.refresh_library(Some(&name))?;
        self.set_status(format!("Saved {}", path.display()), StatusKind::Info);

        match then {
            AfterSave::Stay => {}
            AfterSave::Leave => self.close_editor()?,
            AfterSave::Quit => *exit = true,
        }
        Ok(Mode::Normal)
    }

    fn export_form(&self) -> Mode {
        let Some(editor) = self.editor() else {
            return Mode::Normal;
        };
        let stem = editor
            .name
            .clone()
            .unwrap_or_else(|| editor.sheet.suggested_name());
        Mode::Editing {
            target: FormTarget::Export,
            form: Form::export(self.config.export_path(&stem)),
        }
    }

    fn export_to(&mut self, path: &Path) -> Result<()> {
        let Some(editor) = self.editor() else {
            return Ok(());
        };
        let written = export_call_sheet(&editor.sheet, self.template(), path)
            .with_context(|| format!("failed to export {}", path.display()))?;
        self.set_status(
            format!("Exported {} (press 'o' to open).", written.display()),
            StatusKind::Info,
        );
        self.last_export = Some(written);
        Ok(())
    }

    fn preview(&mut self) {
        let Some(editor) = self.editor() else {
            return;
        };
        match preview_call_sheet(&editor.sheet, self.template()).context("failed to preview") {
            Ok(path) => self.set_status(
                format!("Preview opened from {}", path.display()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_last_export(&mut self) {
        let Some(path) = self.last_export.clone() else {
            self.set_status("Nothing exported yet. Press Ctrl-E first.", StatusKind::Error);
            return;
        };
        match open_path(&path) {
            Ok(()) => self.set_status(format!("Opened {}", path.display()), StatusKind::Info),
            Err(err) => self.set_status(
                format!("Could not open {}: {err}", path.display()),
                StatusKind::Error,
            ),
        }
    }

    fn cycle_template(&mut self) {
        self.template_idx = (self.template_idx + 1) % self.templates.len();
        let template = self.template();
        let message = if template.description.is_empty() {
            format!("Template: {}", template.name)
        } else {
            format!("Template: {} ({})", template.name, template.description)
        };
        self.set_status(message, StatusKind::Info);
    }

    fn open_selected(&mut self) {
        let Some(name) = self.library.current().map(str::to_string) else {
            self.set_status("No call sheet selected.", StatusKind::Error);
            return;
        };
        match load_call_sheet(&self.store, &name).with_context(|| format!("failed to open '{name}'")) {
            Ok(sheet) => {
                info!(name = %name, "opened call sheet in editor");
                self.screen = Screen::Editor(EditorScreen::new(sheet, Some(name.clone())));
                self.set_status(format!("Opened '{name}'."), StatusKind::Info);
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn close_editor(&mut self) -> Result<()> {
        let previous = mem::replace(&mut self.screen, Screen::Library);
        let focus = match &previous {
            Screen::Editor(editor) => editor.name.clone(),
            Screen::Library => None,
        };
        self.refresh_library(focus.as_deref())
    }

    fn refresh_library(&mut self, focus: Option<&str>) -> Result<()> {
        let names = list_call_sheets(&self.store).context("failed to list call sheets")?;
        self.library.set_names(names, focus);
        Ok(())
    }

    fn editor(&self) -> Option<&EditorScreen> {
        match &self.screen {
            Screen::Editor(editor) => Some(editor),
            Screen::Library => None,
        }
    }

    fn editor_mut(&mut self) -> Option<&mut EditorScreen> {
        match &mut self.screen {
            Screen::Editor(editor) => Some(editor),
            Screen::Library => None,
        }
    }

    fn template(&self) -> &Template {
        &self.templates[self.template_idx]
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Library => self.draw_library(frame, content_area),
            Screen::Editor(editor) => self.draw_editor(frame, content_area, editor),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Editing { target, form } => self.draw_form(frame, area, *target, form),
            Mode::ConfirmRemove(confirm) => self.draw_confirm(
                frame,
                area,
                "Confirm Removal",
                vec![Line::from(format!("Remove {}?", confirm.label))],
            ),
            Mode::ConfirmDeleteSheet(confirm) => self.draw_confirm(
                frame,
                area,
                "Confirm Deletion",
                vec![
                    Line::from(format!("Delete call sheet '{}'?", confirm.name)),
                    Line::from("The saved file is removed from disk."),
                ],
            ),
            Mode::ConfirmLeave(confirm) => self.draw_confirm_leave(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_library(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Call Sheets ({})", self.library.names.len());
        if self.library.names.is_empty() {
            let message = Paragraph::new("No call sheets yet. Press '+' to create one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .library
            .names
            .iter()
            .map(|name| ListItem::new(name.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.library.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_editor(&self, frame: &mut Frame, area: Rect, editor: &EditorScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(TAB_BAR_HEIGHT), Constraint::Min(0)])
            .split(area);

        let titles: Vec<&str> = EditorTab::ALL.iter().map(|tab| tab.title()).collect();
        let tabs = Tabs::new(titles)
            .select(editor.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(editor.title())
                    .title(Line::from(format!("template: {}", self.template().name)).right_aligned()),
            );
        frame.render_widget(tabs, chunks[0]);

        let body = chunks[1];
        let block_title = match editor.tab {
            EditorTab::Crew => format!("Crew ({})", editor.crew_filter_label()),
            tab => tab.title().to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(block_title);

        if editor.tab == EditorTab::Production {
            let sheet = &editor.sheet;
            let lines = vec![
                Line::from(format!("Production: {}", sheet.production_name)),
                Line::from(format!("Date: {}", sheet.production_date.format(DATE_FORMAT))),
                Line::from(format!(
                    "General call: {}",
                    sheet.general_call_time.format(TIME_FORMAT)
                )),
                Line::from(format!(
                    "Logo: {}",
                    sheet
                        .logo_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "none".to_string())
                )),
                Line::from(""),
                Line::from(format!(
                    "{} location(s), {} cast, {} crew in {} department(s), {} contact(s), {} note(s)",
                    sheet.filming_locations.len(),
                    sheet.cast_members.len(),
                    sheet.crew_members.len(),
                    sheet.departments().len(),
                    sheet.contacts.len(),
                    sheet.notes.len()
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Enter to edit the production details.",
                    Style::default().fg(Color::Gray),
                )),
            ];
            let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, body);
            return;
        }

        let rows = editor.rows();
        if rows.is_empty() {
            let message = Paragraph::new("Nothing here yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, body);
            return;
        }

        let items: Vec<ListItem> = rows.into_iter().map(ListItem::new).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(editor.selected));
        frame.render_stateful_widget(list, body, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::Editing { .. }) => key_hints(&[
                ("Enter", "Save"),
                ("Tab", "Next / Accept suggestion"),
                ("↑↓", "Move"),
                ("Esc", "Cancel"),
            ]),
            (_, Mode::ConfirmRemove(_)) | (_, Mode::ConfirmDeleteSheet(_)) => {
                key_hints(&[("Y", "Confirm"), ("N", "Cancel")])
            }
            (_, Mode::ConfirmLeave(_)) => key_hints(&[
                ("←→", "Choose"),
                ("Enter", "Select"),
                ("Esc", "Keep editing"),
            ]),
            (Screen::Library, Mode::Normal) => key_hints(&[
                ("↑↓", "Select"),
                ("Enter", "Open"),
                ("+", "New"),
                ("-", "Delete"),
                ("r", "Refresh"),
                ("q", "Quit"),
            ]),
            (Screen::Editor(editor), Mode::Normal) if editor.tab == EditorTab::Crew => key_hints(&[
                ("←→", "Tabs"),
                ("Enter", "Edit"),
                ("+", "Add"),
                ("-", "Remove"),
                ("f", "Department"),
                ("^S", "Save"),
                ("^E", "Export"),
                ("^P", "Preview"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ]),
            (Screen::Editor(_), Mode::Normal) => key_hints(&[
                ("←→", "Tabs"),
                ("Enter", "Edit"),
                ("+", "Add"),
                ("-", "Remove"),
                ("^S", "Save"),
                ("^E", "Export"),
                ("^P", "Preview"),
                ("t", "Template"),
                ("o", "Open PDF"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ]),
        }
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, target: FormTarget, form: &Form) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(target.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len()).map(|idx| form.build_line(idx)).collect();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if form.has_active_suggestion() {
            lines.push(Line::from(Span::styled(
                "Tab to accept the suggestion • Esc to dismiss it",
                Style::default().fg(Color::Gray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to move • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if let Some(field) = form.fields.get(form.active) {
            let prefix = field.label.chars().count() as u16 + 2;
            let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
            let cursor_y = inner.y + form.active as u16;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), cursor_y));
        }
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_leave(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmLeave) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Unsaved Changes")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let title = self
            .editor()
            .map(EditorScreen::title)
            .unwrap_or_default();
        let selected = confirm.selected_index();
        let mut buttons = Vec::new();
        for (idx, label) in confirm.labels().iter().enumerate() {
            let style = if idx == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            buttons.push(Span::styled(format!(" {label} "), style));
            buttons.push(Span::raw("  "));
        }

        let lines = vec![
            Line::from(format!("{title} has unsaved changes.")),
            Line::from(""),
            Line::from(buttons),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

/// Replace the item at `index`, or append when `index` is `None` or out of
/// range. Returns the position the item ended up at.
fn upsert<T>(items: &mut Vec<T>, index: Option<usize>, item: T) -> usize {
    match index.and_then(|idx| items.get_mut(idx).map(|slot| (idx, slot))) {
        Some((idx, slot)) => {
            *slot = item;
            idx
        }
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) -> bool {
    if index < items.len() {
        items.remove(index);
        true
    } else {
        false
    }
}
