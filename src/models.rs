use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use std::{fmt, str::FromStr};

use crate::validation::ValidationErrors;

/// Binary choice used by the room/garden selectors.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    pub fn as_str(self) -> &'static str {
        match self {
            Choice::Yes => "Yes",
            Choice::No => "No",
        }
    }

    pub fn is_yes(self) -> bool {
        self == Choice::Yes
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Choice::Yes),
            "No" => Ok(Choice::No),
            other => Err(format!("expected \"Yes\" or \"No\", got {:?}", other)),
        }
    }
}

/// The ten named fields of a specification record, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecField {
    TotalArea,
    Bedrooms,
    Bathrooms,
    Floors,
    Kitchen,
    LivingRoom,
    StudyRoom,
    Balconies,
    CeilingHeight,
    Garden,
}

impl SpecField {
    pub const COUNT: usize = 10;

    pub const ALL: [SpecField; SpecField::COUNT] = [
        SpecField::TotalArea,
        SpecField::Bedrooms,
        SpecField::Bathrooms,
        SpecField::Floors,
        SpecField::Kitchen,
        SpecField::LivingRoom,
        SpecField::StudyRoom,
        SpecField::Balconies,
        SpecField::CeilingHeight,
        SpecField::Garden,
    ];

    /// Wire name, as used in JSON bodies and URL paths.
    pub fn as_str(self) -> &'static str {
        match self {
            SpecField::TotalArea => "totalArea",
            SpecField::Bedrooms => "bedrooms",
            SpecField::Bathrooms => "bathrooms",
            SpecField::Floors => "floors",
            SpecField::Kitchen => "kitchen",
            SpecField::LivingRoom => "livingRoom",
            SpecField::StudyRoom => "studyRoom",
            SpecField::Balconies => "balconies",
            SpecField::CeilingHeight => "ceilingHeight",
            SpecField::Garden => "garden",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown specification field: {}", s))
    }
}

/// The fixed ten-field description of the desired home.
///
/// Numeric-looking fields are kept as raw text: validation and prompt
/// construction both work from exactly what the user typed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeSpecifications {
    pub total_area: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub floors: String,
    pub kitchen: Choice,
    pub living_room: Choice,
    pub study_room: Choice,
    pub balconies: String,
    pub ceiling_height: String,
    pub garden: Choice,
}

impl Default for HomeSpecifications {
    fn default() -> Self {
        Self {
            total_area: "1200".into(),
            bedrooms: "2".into(),
            bathrooms: "2".into(),
            floors: "1".into(),
            kitchen: Choice::Yes,
            living_room: Choice::Yes,
            study_room: Choice::No,
            balconies: "1".into(),
            ceiling_height: "10".into(),
            garden: Choice::No,
        }
    }
}

impl HomeSpecifications {
    pub fn get(&self, field: SpecField) -> &str {
        match field {
            SpecField::TotalArea => &self.total_area,
            SpecField::Bedrooms => &self.bedrooms,
            SpecField::Bathrooms => &self.bathrooms,
            SpecField::Floors => &self.floors,
            SpecField::Kitchen => self.kitchen.as_str(),
            SpecField::LivingRoom => self.living_room.as_str(),
            SpecField::StudyRoom => self.study_room.as_str(),
            SpecField::Balconies => &self.balconies,
            SpecField::CeilingHeight => &self.ceiling_height,
            SpecField::Garden => self.garden.as_str(),
        }
    }

    /// Sets one field from its raw form value. Choice fields only take "Yes"/"No".
    pub fn set(&mut self, field: SpecField, value: String) -> Result<(), String> {
        match field {
            SpecField::TotalArea => self.total_area = value,
            SpecField::Bedrooms => self.bedrooms = value,
            SpecField::Bathrooms => self.bathrooms = value,
            SpecField::Floors => self.floors = value,
            SpecField::Balconies => self.balconies = value,
            SpecField::CeilingHeight => self.ceiling_height = value,
            SpecField::Kitchen => self.kitchen = value.parse()?,
            SpecField::LivingRoom => self.living_room = value.parse()?,
            SpecField::StudyRoom => self.study_room = value.parse()?,
            SpecField::Garden => self.garden = value.parse()?,
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Inputs of a single generation call. Not retained once the call completes.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    #[serde(default)]
    pub vision: String,
    pub specifications: HomeSpecifications,
    #[serde(default)]
    pub other_features: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LayoutResponse {
    pub image: String,
}

/// What the display area currently shows.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LayoutSlot {
    #[default]
    Empty,
    /// A `data:` URI for the generated plan.
    Image(String),
    /// Caption shown in place of the image after a failed attempt.
    Fallback(String),
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub vision: String,
    pub other_features: String,
    pub specifications: HomeSpecifications,
    pub errors: ValidationErrors,
    pub has_errors: bool,
    pub theme: Theme,
    pub layout: LayoutSlot,
    pub error: Option<String>,
    pub loading: bool,
    pub can_generate: bool,
    pub api_key_set: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: ValidationErrors,
    pub has_errors: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FieldUpdate {
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextUpdate {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ThemeUpdate {
    pub theme: Theme,
}
