//! Wire format of the pointage service

use crate::core::sync::types::{StandardPointage, TerrainPointage};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout expected by the service
const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

mod wire_timestamp {
    use super::WIRE_TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(WIRE_TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NaiveDateTime>::deserialize(deserializer)
    }
}

/// One badge pointage as sent downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStandardPointage {
    pub matricule: Option<i64>,
    #[serde(with = "wire_timestamp")]
    pub heure_pointage: Option<NaiveDateTime>,
}

/// One terrain pointage as sent downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTerrainPointage {
    #[serde(with = "wire_timestamp")]
    pub heure_pointage: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPointageRequest {
    pub pointages: Vec<WireStandardPointage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainPointageRequest {
    pub pointages: Vec<WireTerrainPointage>,
}

impl From<&[StandardPointage]> for StandardPointageRequest {
    fn from(records: &[StandardPointage]) -> Self {
        Self {
            pointages: records
                .iter()
                .map(|r| WireStandardPointage {
                    matricule: r.badge_id,
                    heure_pointage: r.timestamp,
                })
                .collect(),
        }
    }
}

impl From<&[TerrainPointage]> for TerrainPointageRequest {
    fn from(records: &[TerrainPointage]) -> Self {
        Self {
            pointages: records
                .iter()
                .map(|r| WireTerrainPointage {
                    heure_pointage: r.timestamp,
                    latitude: r.latitude,
                    longitude: r.longitude,
                })
                .collect(),
        }
    }
}
