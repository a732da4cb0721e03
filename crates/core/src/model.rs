//! Inventory data model
//!
//! Wire format is camelCase JSON, matching what the sync client submits.
//! Timestamps serialize as RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Detected memory module generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemoryType {
    Ddr2,
    Ddr3,
    Ddr4,
    Ddr5,
    /// Could not be determined (also absorbs unrecognized wire values)
    #[default]
    Unknown,
}

impl MemoryType {
    /// Parse from the stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DDR2" => Some(Self::Ddr2),
            "DDR3" => Some(Self::Ddr3),
            "DDR4" => Some(Self::Ddr4),
            "DDR5" => Some(Self::Ddr5),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Convert to the stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ddr2 => "DDR2",
            Self::Ddr3 => "DDR3",
            Self::Ddr4 => "DDR4",
            Self::Ddr5 => "DDR5",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for MemoryType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MemoryType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s).unwrap_or(Self::Unknown))
    }
}

/// One detected GPU adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuAdapter {
    pub name: String,
    /// Formatted VRAM size (e.g. "8.00 GB"), when the adapter reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vram: Option<String>,
}

impl GpuAdapter {
    /// Sentinel entry used when no adapter could be detected
    pub fn unknown() -> Self {
        Self {
            name: "Unknown GPU".to_string(),
            vram: None,
        }
    }
}

/// One detected storage device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDevice {
    pub model: String,
    /// Formatted capacity (e.g. "512.00 GB")
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

impl StorageDevice {
    /// Sentinel entry used when no device could be detected
    pub fn unknown() -> Self {
        Self {
            model: "Unknown".to_string(),
            size: "Unknown".to_string(),
            manufacturer: None,
        }
    }
}

/// One point-in-time capture of machine inventory attributes
///
/// Every field defaults so a sparse client payload deserializes; required
/// fields are enforced by [`NewInventoryRecord::validate`], not by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventorySnapshot {
    pub hostname: String,
    pub os: String,
    pub os_version: String,
    pub cpu: String,
    pub cpu_cores: i64,
    pub total_memory: String,
    pub free_memory: String,
    pub memory_type: MemoryType,
    pub platform: String,
    pub arch: String,
    pub username: String,
    /// Detected adapters; the key must be present, the list may be empty
    pub gpu: Option<Vec<GpuAdapter>>,
    /// Detected devices; the key must be present, the list may be empty
    pub storage: Option<Vec<StorageDevice>>,
    /// When the snapshot was collected
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
}

impl Default for InventorySnapshot {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            os: String::new(),
            os_version: String::new(),
            cpu: String::new(),
            cpu_cores: 0,
            total_memory: String::new(),
            free_memory: String::new(),
            memory_type: MemoryType::Unknown,
            platform: String::new(),
            arch: String::new(),
            username: String::new(),
            gpu: None,
            storage: None,
            captured_at: Utc::now(),
        }
    }
}

impl InventorySnapshot {
    /// Apply the non-empty-collection invariant
    ///
    /// Empty (but present) gpu/storage lists get a single sentinel entry and
    /// cpu_cores is clamped to at least 1. This is the only place sentinel
    /// substitution happens; absence of the keys themselves is rejected
    /// earlier by [`NewInventoryRecord::validate`].
    pub fn normalized(mut self) -> Self {
        self.gpu = match self.gpu {
            Some(gpu) if !gpu.is_empty() => Some(gpu),
            _ => Some(vec![GpuAdapter::unknown()]),
        };
        self.storage = match self.storage {
            Some(storage) if !storage.is_empty() => Some(storage),
            _ => Some(vec![StorageDevice::unknown()]),
        };
        if self.cpu_cores < 1 {
            self.cpu_cores = 1;
        }
        self
    }
}

/// Write-side input: a snapshot plus the identity it belongs to
#[derive(Debug, Clone)]
pub struct NewInventoryRecord {
    /// Identity-provider user id; one stored record per user
    pub user_id: String,
    /// Human display name from the identity provider, if known
    pub full_name: Option<String>,
    pub snapshot: InventorySnapshot,
}

impl NewInventoryRecord {
    /// Check required fields before any write is attempted
    ///
    /// The gpu and storage keys must be present as sequences; an empty
    /// sequence passes here and is sentinel-filled later.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(StoreError::validation("userId required"));
        }
        let s = &self.snapshot;
        if s.hostname.is_empty()
            || s.os.is_empty()
            || s.cpu.is_empty()
            || s.username.is_empty()
            || s.gpu.is_none()
            || s.storage.is_none()
        {
            return Err(StoreError::validation("missing required fields"));
        }
        Ok(())
    }
}

/// Stored inventory record: one row per user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub user_id: String,
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub snapshot: InventorySnapshot,
    /// Set on first insert, preserved across updates
    pub created_at: DateTime<Utc>,
    /// Set on every write
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> InventorySnapshot {
        InventorySnapshot {
            hostname: "devbox".into(),
            os: "Linux".into(),
            os_version: "6.8".into(),
            cpu: "Ryzen 7 5800X".into(),
            cpu_cores: 8,
            total_memory: "32.00 GB".into(),
            free_memory: "20.00 GB".into(),
            memory_type: MemoryType::Ddr4,
            platform: "linux".into(),
            arch: "x86_64".into(),
            username: "alice".into(),
            gpu: Some(vec![GpuAdapter {
                name: "Radeon RX 6700".into(),
                vram: Some("12.00 GB".into()),
            }]),
            storage: Some(vec![StorageDevice {
                model: "Samsung 980".into(),
                size: "1.00 TB".into(),
                manufacturer: Some("Samsung".into()),
            }]),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn memory_type_round_trip() {
        for (s, mt) in [
            ("DDR2", MemoryType::Ddr2),
            ("DDR3", MemoryType::Ddr3),
            ("DDR4", MemoryType::Ddr4),
            ("DDR5", MemoryType::Ddr5),
            ("Unknown", MemoryType::Unknown),
        ] {
            assert_eq!(MemoryType::parse(s), Some(mt));
            assert_eq!(mt.as_str(), s);
        }
        assert_eq!(MemoryType::parse("DDR6"), None);
    }

    #[test]
    fn memory_type_unrecognized_wire_value_is_unknown() {
        let mt: MemoryType = serde_json::from_str("\"LPDDR5\"").unwrap();
        assert_eq!(mt, MemoryType::Unknown);
    }

    #[test]
    fn snapshot_deserializes_sparse_payload() {
        let s: InventorySnapshot =
            serde_json::from_str(r#"{"hostname":"h","os":"Linux","cpu":"i7","username":"u"}"#)
                .unwrap();
        assert_eq!(s.hostname, "h");
        assert_eq!(s.os_version, "");
        assert_eq!(s.memory_type, MemoryType::Unknown);
        // Absent keys are distinguishable from present-but-empty lists.
        assert!(s.gpu.is_none());
        assert!(s.storage.is_none());
    }

    #[test]
    fn snapshot_wire_names_are_camel_case() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert!(json.get("osVersion").is_some());
        assert!(json.get("cpuCores").is_some());
        assert!(json.get("timestamp").is_some());
        assert!(json.get("captured_at").is_none());
    }

    #[test]
    fn normalized_fills_sentinels() {
        let mut s = snapshot();
        s.gpu = Some(Vec::new());
        s.storage = Some(Vec::new());
        s.cpu_cores = 0;
        let s = s.normalized();
        assert_eq!(s.gpu, Some(vec![GpuAdapter::unknown()]));
        assert_eq!(s.storage, Some(vec![StorageDevice::unknown()]));
        assert_eq!(s.cpu_cores, 1);
    }

    #[test]
    fn normalized_keeps_real_entries() {
        let s = snapshot().normalized();
        let gpu = s.gpu.unwrap();
        assert_eq!(gpu.len(), 1);
        assert_eq!(gpu[0].name, "Radeon RX 6700");
    }

    #[test]
    fn validate_rejects_empty_user_id() {
        let record = NewInventoryRecord {
            user_id: "  ".into(),
            full_name: None,
            snapshot: snapshot(),
        };
        let err = record.validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "userId required"));
    }

    #[test]
    fn validate_rejects_missing_required_fields() {
        let mut s = snapshot();
        s.hostname.clear();
        let record = NewInventoryRecord {
            user_id: "user_1".into(),
            full_name: None,
            snapshot: s,
        };
        let err = record.validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "missing required fields"));
    }

    #[test]
    fn validate_rejects_absent_gpu_and_storage_keys() {
        let mut s = snapshot();
        s.gpu = None;
        let record = NewInventoryRecord {
            user_id: "user_1".into(),
            full_name: None,
            snapshot: s,
        };
        let err = record.validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "missing required fields"));

        let mut s = snapshot();
        s.storage = None;
        let record = NewInventoryRecord {
            user_id: "user_1".into(),
            full_name: None,
            snapshot: s,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn validate_accepts_empty_gpu_and_storage_lists() {
        let mut s = snapshot();
        s.gpu = Some(Vec::new());
        s.storage = Some(Vec::new());
        let record = NewInventoryRecord {
            user_id: "user_1".into(),
            full_name: None,
            snapshot: s,
        };
        assert!(record.validate().is_ok());
    }

    #[test]
    fn validate_accepts_complete_record() {
        let record = NewInventoryRecord {
            user_id: "user_1".into(),
            full_name: Some("Alice".into()),
            snapshot: snapshot(),
        };
        assert!(record.validate().is_ok());
    }
}
