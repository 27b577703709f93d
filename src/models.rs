//! Domain models for a production day's call sheet. Storage serializes these
//! as-is and the PDF layer reads them; the helpers cover grouping crew by
//! department and ordering cast by call time.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on filming locations per call sheet. The printed layout has room
/// for three numbered locations beneath the home base.
pub const MAX_FILMING_LOCATIONS: usize = 3;

/// Persisted date format (`2026-10-18`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Persisted time format, 24h (`07:30`).
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A named place with a street address. Used for both the home base and the
/// filming locations.
pub struct Location {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    /// Character played.
    pub role: String,
    #[serde(with = "time_format")]
    pub call_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    /// Job title within the department ("Gaffer", "1st AC").
    pub position: String,
    /// Grouping key on the printed sheet ("Camera", "Electric").
    pub department: String,
    #[serde(with = "time_format")]
    pub call_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Someone to reach on the day (producer, location manager, medic).
pub struct Contact {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Everything printed on one call sheet.
pub struct CallSheet {
    pub production_name: String,
    #[serde(with = "date_format")]
    pub production_date: NaiveDate,
    #[serde(with = "time_format")]
    pub general_call_time: NaiveTime,
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
    #[serde(default)]
    pub home_base: Option<Location>,
    #[serde(default)]
    pub filming_locations: Vec<Location>,
    #[serde(default)]
    pub cast_members: Vec<CastMember>,
    #[serde(default)]
    pub crew_members: Vec<CrewMember>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    /// General notes and announcements, one entry per bullet.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Default for CallSheet {
    fn default() -> Self {
        Self::new("", Local::now().date_naive())
    }
}

impl CallSheet {
    /// Blank call sheet for the given day with the customary 07:00 general call.
    pub fn new(production_name: impl Into<String>, production_date: NaiveDate) -> Self {
        Self {
            production_name: production_name.into(),
            production_date,
            general_call_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            logo_path: None,
            home_base: None,
            filming_locations: Vec::new(),
            cast_members: Vec::new(),
            crew_members: Vec::new(),
            contacts: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Append a filming location unless the sheet is already full.
    pub fn add_filming_location(&mut self, location: Location) -> Result<(), ValidationError> {
        if self.filming_locations.len() >= MAX_FILMING_LOCATIONS {
            return Err(ValidationError::TooManyLocations {
                max: MAX_FILMING_LOCATIONS,
            });
        }
        self.filming_locations.push(location);
        Ok(())
    }

    /// Distinct crew departments in alphabetical order.
    pub fn departments(&self) -> Vec<String> {
        self.crew_members
            .iter()
            .map(|crew| crew.department.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Crew in one department, earliest call first. The sort is stable so
    /// entries sharing a call time keep their entry order.
    pub fn crew_in_department(&self, department: &str) -> Vec<&CrewMember> {
        let mut crew: Vec<&CrewMember> = self
            .crew_members
            .iter()
            .filter(|crew| crew.department == department)
            .collect();
        crew.sort_by_key(|crew| crew.call_time);
        crew
    }

    /// Cast ordered by call time.
    pub fn cast_by_call_time(&self) -> Vec<&CastMember> {
        let mut cast: Vec<&CastMember> = self.cast_members.iter().collect();
        cast.sort_by_key(|member| member.call_time);
        cast
    }

    /// Field-presence checks shared by save and export.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.production_name.trim().is_empty() {
            return Err(ValidationError::Required("Production name"));
        }
        if self.filming_locations.len() > MAX_FILMING_LOCATIONS {
            return Err(ValidationError::TooManyLocations {
                max: MAX_FILMING_LOCATIONS,
            });
        }
        if let Some(base) = &self.home_base {
            base.validate()?;
        }
        for location in &self.filming_locations {
            location.validate()?;
        }
        for member in &self.cast_members {
            require(&member.name, "Cast name")?;
            require(&member.role, "Cast role")?;
        }
        for member in &self.crew_members {
            require(&member.name, "Crew name")?;
            require(&member.position, "Crew position")?;
            require(&member.department, "Crew department")?;
        }
        for contact in &self.contacts {
            require(&contact.name, "Contact name")?;
        }
        Ok(())
    }

    /// Identifier suggested the first time a sheet is saved, e.g.
    /// `night-shift_2026-10-18`.
    pub fn suggested_name(&self) -> String {
        let mut slug = String::new();
        for ch in self.production_name.trim().chars() {
            if ch.is_alphanumeric() {
                slug.extend(ch.to_lowercase());
            } else if !slug.ends_with('-') && !slug.is_empty() {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');
        let date = self.production_date.format(DATE_FORMAT);
        if slug.is_empty() {
            format!("call-sheet_{date}")
        } else {
            format!("{slug}_{date}")
        }
    }
}

impl Location {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "Location name")?;
        require(&self.address, "Location address")
    }
}

impl fmt::Display for CastMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}

impl fmt::Display for CrewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.position)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` string typed into a form.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ValidationError::Format {
        field,
        expected: "a date like 2026-10-18",
        value: raw.trim().to_string(),
    })
}

/// Parse an `HH:MM` string typed into a form. Single-digit hours (`7:30`) are
/// accepted.
pub fn parse_time(field: &'static str, raw: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(|_| ValidationError::Format {
        field,
        expected: "a 24h time like 07:30",
        value: raw.trim().to_string(),
    })
}

/// Serde adapter storing `NaiveDate` as `YYYY-MM-DD`.
pub(crate) mod date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(de::Error::custom)
    }
}

/// Serde adapter storing `NaiveTime` as `HH:MM`.
pub(crate) mod time_format {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(de::Error::custom)
    }
}
