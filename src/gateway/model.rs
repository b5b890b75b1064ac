//! Entity records exchanged with the registration service, and the drafts the
//! client sends to create them. Field names are camelCase on the wire.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Longest accepted name/club text, matching the service's column width.
pub const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distance {
    FiveK,
    TenK,
    HalfMarathon,
    Marathon,
}

impl Distance {
    pub const ALL: [Distance; 4] = [Distance::FiveK, Distance::TenK, Distance::HalfMarathon, Distance::Marathon];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Distance::FiveK => "FiveK",
            Distance::TenK => "TenK",
            Distance::HalfMarathon => "HalfMarathon",
            Distance::Marathon => "Marathon",
        }
    }

    /// Human label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            Distance::FiveK => "5K",
            Distance::TenK => "10K",
            Distance::HalfMarathon => "Half Marathon",
            Distance::Marathon => "Marathon",
        }
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Distance {
    type Err = AppError;
    /// Accepts wire names and labels, ignoring case, spaces and dashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "fivek" | "5k" => Ok(Distance::FiveK),
            "tenk" | "10k" => Ok(Distance::TenK),
            "halfmarathon" => Ok(Distance::HalfMarathon),
            "marathon" => Ok(Distance::Marathon),
            _ => Err(AppError::user("unknown_distance".to_string(), format!("unknown distance '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub id: String,
    pub name: String,
    pub distance: Distance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceDraft {
    pub name: String,
    pub distance: Distance,
}

impl RaceDraft {
    pub fn new(name: impl Into<String>, distance: Distance) -> Self {
        Self { name: name.into(), distance }
    }

    pub fn validate(&self) -> AppResult<()> {
        required_text("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    /// May be empty when the service only returns the joined `race`.
    #[serde(default)]
    pub race_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<Race>,
}

impl Application {
    /// Referenced race id, from `raceId` or the joined race.
    pub fn race_ref(&self) -> Option<&str> {
        if !self.race_id.is_empty() {
            return Some(self.race_id.as_str());
        }
        self.race.as_ref().map(|r| r.id.as_str())
    }

    pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub race_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
}

impl ApplicationDraft {
    pub fn validate(&self) -> AppResult<()> {
        if self.race_id.trim().is_empty() {
            return Err(AppError::user("race_required", "an application must reference a race"));
        }
        required_text("firstName", &self.first_name)?;
        required_text("lastName", &self.last_name)?;
        if let Some(club) = &self.club {
            max_len("club", club)?;
        }
        Ok(())
    }
}

fn required_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::user(format!("{}_required", field), format!("{} is required", field)));
    }
    max_len(field, value)
}

fn max_len(field: &str, value: &str) -> AppResult<()> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::user(
            format!("{}_too_long", field),
            format!("{} must be at most {} characters", field, MAX_TEXT_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_parses_names_and_labels() {
        assert_eq!("Marathon".parse::<Distance>().unwrap(), Distance::Marathon);
        assert_eq!("half marathon".parse::<Distance>().unwrap(), Distance::HalfMarathon);
        assert_eq!("5k".parse::<Distance>().unwrap(), Distance::FiveK);
        assert_eq!("TenK".parse::<Distance>().unwrap(), Distance::TenK);
        assert!("ultra".parse::<Distance>().is_err());
        for d in Distance::ALL {
            assert_eq!(d.label().parse::<Distance>().unwrap(), d);
        }
    }

    #[test]
    fn race_uses_wire_names() {
        let r = Race { id: "1".into(), name: "Zagreb Marathon".into(), distance: Distance::HalfMarathon };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["distance"], "HalfMarathon");
    }

    #[test]
    fn application_wire_shape_is_camel_case() {
        let d = ApplicationDraft { race_id: "r1".into(), first_name: "Ana".into(), last_name: "Horvat".into(), club: None };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["raceId"], "r1");
        assert_eq!(v["firstName"], "Ana");
        assert!(v.get("club").is_none());
    }

    #[test]
    fn application_accepts_joined_race() {
        let v = serde_json::json!({
            "id": "a1", "firstName": "Ana", "lastName": "Horvat", "club": null,
            "race": {"id": "r9", "name": "Plitvice Trail Run", "distance": "TenK"}
        });
        let a: Application = serde_json::from_value(v).unwrap();
        assert_eq!(a.race_ref(), Some("r9"));
        assert_eq!(a.full_name(), "Ana Horvat");
    }

    #[test]
    fn draft_validation() {
        assert!(RaceDraft::new("  ", Distance::FiveK).validate().is_err());
        assert!(RaceDraft::new("x".repeat(256), Distance::FiveK).validate().is_err());
        assert!(RaceDraft::new("x".repeat(255), Distance::FiveK).validate().is_ok());

        let mut a = ApplicationDraft { race_id: "r".into(), first_name: "A".into(), last_name: "B".into(), club: Some("AK Sljeme".into()) };
        assert!(a.validate().is_ok());
        a.club = Some("c".repeat(300));
        assert_eq!(a.validate().unwrap_err().code_str(), "club_too_long");
        a.club = None;
        a.race_id = String::new();
        assert_eq!(a.validate().unwrap_err().code_str(), "race_required");
    }
}
