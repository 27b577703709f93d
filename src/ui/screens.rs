use crate::models::{CallSheet, TIME_FORMAT};

/// Saved call sheets shown on the start screen.
pub(crate) struct LibraryScreen {
    pub(crate) names: Vec<String>,
    pub(crate) selected: usize,
}

impl LibraryScreen {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let mut screen = Self { names, selected: 0 };
        screen.ensure_in_bounds();
        screen
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.names.get(self.selected).map(String::as_str)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.names.len(), offset);
    }

    /// Replace the list, keeping focus on `focus` when it is still present.
    pub(crate) fn set_names(&mut self, names: Vec<String>, focus: Option<&str>) {
        self.names = names;
        if let Some(idx) = focus.and_then(|name| self.names.iter().position(|n| n == name)) {
            self.selected = idx;
        }
        self.ensure_in_bounds();
    }

    fn ensure_in_bounds(&mut self) {
        if self.names.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.names.len() {
            self.selected = self.names.len() - 1;
        }
    }
}

/// Sections of the editor, switched with the arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditorTab {
    Production,
    Locations,
    Cast,
    Crew,
    Contacts,
    Notes,
}

impl EditorTab {
    pub(crate) const ALL: [EditorTab; 6] = [
        EditorTab::Production,
        EditorTab::Locations,
        EditorTab::Cast,
        EditorTab::Crew,
        EditorTab::Contacts,
        EditorTab::Notes,
    ];

    pub(crate) fn title(self) -> &'static str {
        match self {
            EditorTab::Production => "Production",
            EditorTab::Locations => "Locations",
            EditorTab::Cast => "Cast",
            EditorTab::Crew => "Crew",
            EditorTab::Contacts => "Contacts",
            EditorTab::Notes => "Notes",
        }
    }

    pub(crate) fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub(crate) fn offset(self, offset: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let idx = (self.index() as isize + offset).rem_euclid(len);
        Self::ALL[idx as usize]
    }
}

/// The call sheet being edited plus where it will be saved.
pub(crate) struct EditorScreen {
    pub(crate) sheet: CallSheet,
    /// Storage name; `None` until the first save.
    pub(crate) name: Option<String>,
    pub(crate) tab: EditorTab,
    pub(crate) selected: usize,
    pub(crate) dirty: bool,
    /// Department shown on the crew tab; `None` lists every department.
    pub(crate) crew_filter: Option<String>,
}

impl EditorScreen {
    pub(crate) fn new(sheet: CallSheet, name: Option<String>) -> Self {
        Self {
            sheet,
            name,
            tab: EditorTab::Production,
            selected: 0,
            dirty: false,
            crew_filter: None,
        }
    }

    pub(crate) fn switch_tab(&mut self, offset: isize) {
        self.tab = self.tab.offset(offset);
        self.selected = 0;
    }

    /// Number of selectable rows on the current tab. The locations tab lists
    /// the home base first, then each filming location.
    pub(crate) fn row_count(&self) -> usize {
        match self.tab {
            EditorTab::Production => 1,
            EditorTab::Locations => 1 + self.sheet.filming_locations.len(),
            EditorTab::Cast => self.sheet.cast_members.len(),
            EditorTab::Crew => self.visible_crew().len(),
            EditorTab::Contacts => self.sheet.contacts.len(),
            EditorTab::Notes => self.sheet.notes.len(),
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.row_count(), offset);
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if let Some(department) = &self.crew_filter {
            if !self.sheet.crew_members.iter().any(|m| &m.department == department) {
                self.crew_filter = None;
            }
        }
        let rows = self.row_count();
        if rows == 0 {
            self.selected = 0;
        } else if self.selected >= rows {
            self.selected = rows - 1;
        }
    }

    /// Indices into `crew_members` that pass the department filter.
    pub(crate) fn visible_crew(&self) -> Vec<usize> {
        self.sheet
            .crew_members
            .iter()
            .enumerate()
            .filter(|(_, member)| {
                self.crew_filter
                    .as_ref()
                    .map_or(true, |department| &member.department == department)
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Position in `crew_members` of the highlighted crew row.
    pub(crate) fn selected_crew(&self) -> Option<usize> {
        self.visible_crew().get(self.selected).copied()
    }

    /// Highlight a crew member by storage index, dropping the filter when it
    /// would hide them.
    pub(crate) fn select_crew(&mut self, index: usize) {
        if !self.visible_crew().contains(&index) {
            self.crew_filter = None;
        }
        self.selected = self
            .visible_crew()
            .iter()
            .position(|idx| *idx == index)
            .unwrap_or(0);
    }

    /// Step through "all departments" and then each department in order.
    pub(crate) fn cycle_crew_filter(&mut self) {
        let departments = self.sheet.departments();
        let next = match &self.crew_filter {
            None => departments.first().cloned(),
            Some(current) => departments
                .iter()
                .position(|d| d == current)
                .and_then(|pos| departments.get(pos + 1).cloned()),
        };
        self.crew_filter = next;
        self.selected = 0;
    }

    pub(crate) fn crew_filter_label(&self) -> &str {
        self.crew_filter.as_deref().unwrap_or("All Departments")
    }

    pub(crate) fn title(&self) -> String {
        let name = self.name.as_deref().unwrap_or("unsaved");
        let marker = if self.dirty { " *" } else { "" };
        let production = self.sheet.production_name.trim();
        if production.is_empty() {
            format!("New call sheet ({name}){marker}")
        } else {
            format!("{production} ({name}){marker}")
        }
    }

    /// Text rows for the current tab, in the same order as `selected`.
    pub(crate) fn rows(&self) -> Vec<String> {
        let sheet = &self.sheet;
        match self.tab {
            EditorTab::Production => vec![format!(
                "{} | {} | general call {}{}",
                if sheet.production_name.trim().is_empty() {
                    "<no name>"
                } else {
                    sheet.production_name.as_str()
                },
                sheet.production_date.format("%Y-%m-%d"),
                sheet.general_call_time.format(TIME_FORMAT),
                sheet
                    .logo_path
                    .as_ref()
                    .map(|p| format!(" | logo {}", p.display()))
                    .unwrap_or_default(),
            )],
            EditorTab::Locations => {
                let mut rows = vec![match &sheet.home_base {
                    Some(base) => format!("Home base: {} - {}", base.name, base.address),
                    None => "Home base: <not set>".to_string(),
                }];
                rows.extend(
                    sheet
                        .filming_locations
                        .iter()
                        .enumerate()
                        .map(|(idx, loc)| format!("Location {}: {} - {}", idx + 1, loc.name, loc.address)),
                );
                rows
            }
            EditorTab::Cast => sheet
                .cast_members
                .iter()
                .map(|m| format!("{} {m}", m.call_time.format(TIME_FORMAT)))
                .collect(),
            EditorTab::Crew => self
                .visible_crew()
                .into_iter()
                .map(|idx| &sheet.crew_members[idx])
                .map(|m| format!("{} [{}] {m}", m.call_time.format(TIME_FORMAT), m.department))
                .collect(),
            EditorTab::Contacts => sheet
                .contacts
                .iter()
                .map(|c| {
                    let mut row = c.name.clone();
                    if !c.role.is_empty() {
                        row.push_str(&format!(" ({})", c.role));
                    }
                    for detail in [&c.phone, &c.email].into_iter().flatten() {
                        row.push_str(&format!(" | {detail}"));
                    }
                    row
                })
                .collect(),
            EditorTab::Notes => sheet.notes.iter().map(|n| format!("• {n}")).collect(),
        }
    }
}

fn step(current: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + offset).clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrewMember, Location};
    use chrono::NaiveTime;
    use chrono::NaiveDate;

    fn editor() -> EditorScreen {
        let sheet = CallSheet::new("Night Shift", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        EditorScreen::new(sheet, None)
    }

    #[test]
    fn tabs_wrap_in_both_directions() {
        assert_eq!(EditorTab::Production.offset(-1), EditorTab::Notes);
        assert_eq!(EditorTab::Notes.offset(1), EditorTab::Production);
        assert_eq!(EditorTab::Cast.offset(2), EditorTab::Contacts);
    }

    #[test]
    fn locations_tab_lists_home_base_first() {
        let mut screen = editor();
        screen.switch_tab(1);
        assert_eq!(screen.rows(), vec!["Home base: <not set>"]);

        screen
            .sheet
            .add_filming_location(Location {
                name: "Pier 4".into(),
                address: "4 Harbor Rd".into(),
                notes: None,
            })
            .unwrap();
        assert_eq!(screen.row_count(), 2);
        assert_eq!(screen.rows()[1], "Location 1: Pier 4 - 4 Harbor Rd");
    }

    #[test]
    fn selection_is_clamped() {
        let mut screen = editor();
        screen.tab = EditorTab::Notes;
        screen.sheet.notes = vec!["Rain cover".into(), "Parking".into()];
        screen.move_selection(5);
        assert_eq!(screen.selected, 1);
        screen.sheet.notes.pop();
        screen.ensure_in_bounds();
        assert_eq!(screen.selected, 0);
        screen.move_selection(-3);
        assert_eq!(screen.selected, 0);
    }

    fn crew(name: &str, department: &str) -> CrewMember {
        CrewMember {
            name: name.into(),
            position: "Tech".into(),
            department: department.into(),
            call_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn crew_filter_cycles_through_departments() {
        let mut screen = editor();
        screen.tab = EditorTab::Crew;
        screen.sheet.crew_members = vec![
            crew("Ari", "Sound"),
            crew("Bo", "Camera"),
            crew("Cy", "Sound"),
        ];
        assert_eq!(screen.row_count(), 3);
        assert_eq!(screen.crew_filter_label(), "All Departments");

        screen.cycle_crew_filter();
        assert_eq!(screen.crew_filter_label(), "Camera");
        assert_eq!(screen.visible_crew(), vec![1]);

        screen.cycle_crew_filter();
        assert_eq!(screen.visible_crew(), vec![0, 2]);
        screen.move_selection(1);
        assert_eq!(screen.selected_crew(), Some(2));
        assert_eq!(screen.rows(), vec!["07:00 [Sound] Ari (Tech)", "07:00 [Sound] Cy (Tech)"]);

        screen.cycle_crew_filter();
        assert_eq!(screen.crew_filter, None);
        assert_eq!(screen.row_count(), 3);
    }

    #[test]
    fn filter_resets_when_its_department_empties() {
        let mut screen = editor();
        screen.tab = EditorTab::Crew;
        screen.sheet.crew_members = vec![crew("Ari", "Sound"), crew("Bo", "Camera")];
        screen.crew_filter = Some("Camera".into());
        screen.sheet.crew_members.remove(1);
        screen.ensure_in_bounds();
        assert_eq!(screen.crew_filter, None);

        screen.crew_filter = Some("Sound".into());
        screen.sheet.crew_members.push(crew("Bo", "Camera"));
        screen.select_crew(1);
        assert_eq!(screen.crew_filter, None);
        assert_eq!(screen.selected, 1);
    }

    #[test]
    fn title_marks_unsaved_changes() {
        let mut screen = editor();
        assert_eq!(screen.title(), "Night Shift (unsaved)");
        screen.name = Some("night-shift".into());
        screen.dirty = true;
        assert_eq!(screen.title(), "Night Shift (night-shift) *");
    }

    #[test]
    fn library_keeps_focus_after_refresh() {
        let mut library = LibraryScreen::new(vec!["a".into(), "b".into()]);
        library.set_names(vec!["a".into(), "b".into(), "c".into()], Some("c"));
        assert_eq!(library.current(), Some("c"));
        library.set_names(vec!["a".into()], None);
        assert_eq!(library.current(), Some("a"));
    }
}
