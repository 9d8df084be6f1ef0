//! Incident records
//!
//! An [`IncidentRecord`] is one logged equipment issue keyed by `equipment_id`.
//! The wire form matches the service: whys and solution travel as strings (blank
//! meaning absent), the date as `YYYY-MM-DD`, labels case-insensitively.

use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Unknown label for a closed vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        ///
        /// Labels outside the known set are kept verbatim in `Unknown`, so a
        /// record read from the service is written back unchanged.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown(String),
        }

        impl $name {
            /// Known labels, in order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unknown(raw) => raw,
                }
            }

            /// Case-insensitive exact label match against the known set
            pub fn from_label(s: &str) -> Option<Self> {
                let s = s.trim();
                Self::ALL.iter().find(|v| v.as_str().eq_ignore_ascii_case(s)).cloned()
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Unknown(_))
            }

            /// Strict parse for user input: only known labels are accepted
            pub fn parse_known(s: &str) -> std::result::Result<Self, ParseLabelError> {
                Self::from_label(s).ok_or_else(|| Self::parse_error(s))
            }

            fn parse_error(s: &str) -> ParseLabelError {
                ParseLabelError {
                    kind: $kind,
                    value: s.to_string(),
                    expected: Self::ALL
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            }
        }

        /// Known labels normalise to their canonical spelling; anything else
        /// non-blank is kept as `Unknown`
        impl FromStr for $name {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(Self::parse_error(s));
                }
                Ok(Self::from_label(s).unwrap_or_else(|| $name::Unknown(s.to_string())))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

labelled_enum! {
    /// Equipment class
    EquipmentType, "equipment type" {
        Motor => "Motor",
        Pump => "Pump",
        Conveyor => "Conveyor",
        Compressor => "Compressor",
        Generator => "Generator",
        Other => "Other",
    }
}

labelled_enum! {
    /// Owning department
    Department, "department" {
        Production => "Production",
        Maintenance => "Maintenance",
        Quality => "Quality",
        Engineering => "Engineering",
        Operations => "Operations",
    }
}

labelled_enum! {
    /// Ordinal impact classification
    Severity, "severity" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

/// Optional text that travels as a possibly-blank string
pub(crate) mod blank {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}

/// `YYYY-MM-DD`, also accepting a datetime with that prefix
mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        let prefix = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(prefix, FORMAT).map_err(de::Error::custom)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Ordered 5-Why causal chain plus the resulting solution
///
/// Gaps (e.g. `why3` set while `why2` is empty) are accepted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiveWhy {
    #[serde(default, with = "blank")]
    pub why1: Option<String>,
    #[serde(default, with = "blank")]
    pub why2: Option<String>,
    #[serde(default, with = "blank")]
    pub why3: Option<String>,
    #[serde(default, with = "blank")]
    pub why4: Option<String>,
    #[serde(default, with = "blank")]
    pub why5: Option<String>,
    #[serde(default, with = "blank")]
    pub solution: Option<String>,
}

impl FiveWhy {
    /// Whys in causal order
    pub fn whys(&self) -> [Option<&str>; 5] {
        [
            self.why1.as_deref(),
            self.why2.as_deref(),
            self.why3.as_deref(),
            self.why4.as_deref(),
            self.why5.as_deref(),
        ]
    }

    /// Number of filled whys
    pub fn depth(&self) -> usize {
        self.whys().iter().filter(|w| w.is_some()).count()
    }

    /// Whether an empty why precedes a filled one
    pub fn has_gaps(&self) -> bool {
        let whys = self.whys();
        let last_filled = whys.iter().rposition(|w| w.is_some());
        match last_filled {
            Some(last) => whys[..last].iter().any(|w| w.is_none()),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0 && self.solution.is_none()
    }
}

/// One logged equipment issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub department: Department,
    #[serde(default)]
    pub severity: Severity,
    pub issue: String,
    pub root_cause: String,
    #[serde(flatten)]
    pub chain: FiveWhy,
    #[serde(default = "today", with = "iso_date")]
    pub date_reported: NaiveDate,
}

impl IncidentRecord {
    /// New record with `Medium` severity, reported today, and no causal chain
    pub fn new(
        equipment_id: impl Into<String>,
        equipment_type: EquipmentType,
        department: Department,
        issue: impl Into<String>,
        root_cause: impl Into<String>,
    ) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            equipment_type,
            department,
            severity: Severity::default(),
            issue: issue.into(),
            root_cause: root_cause.into(),
            chain: FiveWhy::default(),
            date_reported: today(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_chain(mut self, chain: FiveWhy) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date_reported = date;
        self
    }

    /// Check required text fields before submitting
    pub fn validate(&self) -> Result<()> {
        require_text("equipment_id", &self.equipment_id)?;
        require_text("equipment_type", self.equipment_type.as_str())?;
        require_text("department", self.department.as_str())?;
        require_text("issue", &self.issue)?;
        require_text("root_cause", &self.root_cause)?;
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Partial update; absent fields are left as they are on the service
///
/// The key is not part of a patch, so `equipment_id` cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<EquipmentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_reported: Option<NaiveDate>,
}

impl RecordPatch {
    /// Patch that overwrites every mutable field with `record`'s values
    pub fn from_record(record: &IncidentRecord) -> Self {
        let text = |v: &Option<String>| Some(v.clone().unwrap_or_default());
        Self {
            equipment_type: Some(record.equipment_type.clone()),
            department: Some(record.department.clone()),
            severity: Some(record.severity.clone()),
            issue: Some(record.issue.clone()),
            root_cause: Some(record.root_cause.clone()),
            why1: text(&record.chain.why1),
            why2: text(&record.chain.why2),
            why3: text(&record.chain.why3),
            why4: text(&record.chain.why4),
            why5: text(&record.chain.why5),
            solution: text(&record.chain.solution),
            date_reported: Some(record.date_reported),
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject empty patches and blank required fields
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }
        if let Some(issue) = &self.issue {
            require_text("issue", issue)?;
        }
        if let Some(root_cause) = &self.root_cause {
            require_text("root_cause", root_cause)?;
        }
        Ok(())
    }

    /// Result of applying this patch to `record`, as the service would
    pub fn apply_to(&self, record: &IncidentRecord) -> IncidentRecord {
        let mut out = record.clone();
        let set_text = |slot: &mut Option<String>, value: &Option<String>| {
            if let Some(v) = value {
                *slot = Some(v.clone()).filter(|s| !s.trim().is_empty());
            }
        };

        if let Some(v) = &self.equipment_type {
            out.equipment_type = v.clone();
        }
        if let Some(v) = &self.department {
            out.department = v.clone();
        }
        if let Some(v) = &self.severity {
            out.severity = v.clone();
        }
        if let Some(v) = &self.issue {
            out.issue = v.clone();
        }
        if let Some(v) = &self.root_cause {
            out.root_cause = v.clone();
        }
        set_text(&mut out.chain.why1, &self.why1);
        set_text(&mut out.chain.why2, &self.why2);
        set_text(&mut out.chain.why3, &self.why3);
        set_text(&mut out.chain.why4, &self.why4);
        set_text(&mut out.chain.why5, &self.why5);
        set_text(&mut out.chain.solution, &self.solution);
        if let Some(v) = self.date_reported {
            out.date_reported = v;
        }
        out
    }
}
