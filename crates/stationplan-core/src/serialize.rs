//! Persistence records and binary snapshots of a station.
//!
//! Records are plain serde values referring to catalog entities by name, so
//! they stay valid across catalog rebuilds. Any external serializer can
//! write them. Binary snapshots wrap a record in a versioned header and
//! encode it with `bitcode`. Nothing here touches the filesystem.

use crate::config::SettingsConfig;
use serde::{Deserialize, Serialize};

/// Leading tag of every snapshot.
pub const SNAPSHOT_TAG: [u8; 4] = *b"STPL";

/// Layout revision of [`StationRecord`] inside a snapshot. Only snapshots
/// of exactly this revision are read.
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(String),
    #[error("not a station snapshot: {0}")]
    Malformed(String),
    #[error("not a station snapshot: tag {0:?}")]
    ForeignTag([u8; 4]),
    #[error("snapshot version {found} cannot be read, expected {SNAPSHOT_VERSION}")]
    Version { found: u16 },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Equipment mounted on one connection of a placed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub connection: String,
    pub equipment: String,
}

/// One placed module group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedModuleRecord {
    pub module: String,
    pub count: u32,
    pub method: String,
    #[serde(default)]
    pub equipment: Vec<EquipmentRecord>,
}

/// Everything needed to rebuild a station against a catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub modules: Vec<PlacedModuleRecord>,
    #[serde(default)]
    pub settings: SettingsConfig,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct Envelope<R> {
    tag: [u8; 4],
    version: u16,
    record: R,
}

impl<R> Envelope<R> {
    fn check(&self) -> Result<(), SnapshotError> {
        if self.tag != SNAPSHOT_TAG {
            return Err(SnapshotError::ForeignTag(self.tag));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: self.version,
            });
        }
        Ok(())
    }
}

pub fn encode_snapshot(record: &StationRecord) -> Result<Vec<u8>, SnapshotError> {
    let envelope = Envelope {
        tag: SNAPSHOT_TAG,
        version: SNAPSHOT_VERSION,
        record,
    };
    bitcode::serialize(&envelope).map_err(|e| SnapshotError::Encode(e.to_string()))
}

fn open_envelope(data: &[u8]) -> Result<Envelope<StationRecord>, SnapshotError> {
    bitcode::deserialize(data).map_err(|e| SnapshotError::Malformed(e.to_string()))
}

/// Decode a snapshot written by [`encode_snapshot`] at the current version.
pub fn decode_snapshot(data: &[u8]) -> Result<StationRecord, SnapshotError> {
    let envelope = open_envelope(data)?;
    envelope.check()?;
    Ok(envelope.record)
}

/// Version a snapshot was written at, without checking it against
/// [`SNAPSHOT_VERSION`].
pub fn snapshot_version(data: &[u8]) -> Result<u16, SnapshotError> {
    let envelope = open_envelope(data)?;
    if envelope.tag != SNAPSHOT_TAG {
        return Err(SnapshotError::ForeignTag(envelope.tag));
    }
    Ok(envelope.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StationRecord {
        StationRecord {
            modules: vec![
                PlacedModuleRecord {
                    module: "prod_energycells".to_string(),
                    count: 3,
                    method: "default".to_string(),
                    equipment: vec![],
                },
                PlacedModuleRecord {
                    module: "def_platform".to_string(),
                    count: 1,
                    method: "default".to_string(),
                    equipment: vec![EquipmentRecord {
                        connection: "con_shield_01".to_string(),
                        equipment: "shield_s".to_string(),
                    }],
                },
            ],
            settings: SettingsConfig {
                workforce_ratio: 0.5,
                sunlight: 80.0,
            },
        }
    }

    fn encode_as(tag: [u8; 4], version: u16) -> Vec<u8> {
        bitcode::serialize(&Envelope {
            tag,
            version,
            record: record(),
        })
        .unwrap()
    }

    #[test]
    fn snapshot_preserves_record() {
        let data = encode_snapshot(&record()).unwrap();
        assert_eq!(decode_snapshot(&data).unwrap(), record());
        assert_eq!(snapshot_version(&data).unwrap(), SNAPSHOT_VERSION);
    }

    #[test]
    fn other_tags_are_rejected() {
        let data = encode_as(*b"SAVE", SNAPSHOT_VERSION);
        assert!(matches!(
            decode_snapshot(&data),
            Err(SnapshotError::ForeignTag(tag)) if &tag == b"SAVE"
        ));
        assert!(snapshot_version(&data).is_err());
    }

    #[test]
    fn other_versions_are_rejected() {
        for version in [0, SNAPSHOT_VERSION + 1] {
            let data = encode_as(SNAPSHOT_TAG, version);
            assert!(matches!(
                decode_snapshot(&data),
                Err(SnapshotError::Version { found }) if found == version
            ));
            assert_eq!(snapshot_version(&data).unwrap(), version);
        }
    }

    #[test]
    fn truncated_data_is_malformed() {
        let data = encode_snapshot(&record()).unwrap();
        assert!(matches!(
            decode_snapshot(&data[..data.len() / 2]),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            decode_snapshot(&[]),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn record_reads_from_json_without_equipment() {
        let json = r#"{
            "modules": [{ "module": "prod_energycells", "count": 2, "method": "default" }]
        }"#;
        let parsed: StationRecord = serde_json::from_str(json).unwrap();
        assert!(parsed.modules[0].equipment.is_empty());
        assert_eq!(parsed.settings, SettingsConfig::default());
    }
}
