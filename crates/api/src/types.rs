//! Request/response types
//!
//! Wire format is camelCase JSON, matching the sync client.

use serde::{Deserialize, Serialize};

use fleetsnap_core::{InventoryRecord, InventorySnapshot, NewInventoryRecord};

/// Inventory submission (POST /api/pc-info)
///
/// Every field defaults so required-field checks produce the store's
/// validation errors rather than serde rejections.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInventoryRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub snapshot: InventorySnapshot,
}

impl SubmitInventoryRequest {
    /// Convert into the store's write-side input
    pub fn into_record(self) -> NewInventoryRecord {
        NewInventoryRecord {
            user_id: self.user_id,
            full_name: self.full_name,
            snapshot: self.snapshot,
        }
    }
}

/// Submission response (201)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInventoryResponse {
    pub message: String,
    pub user_id: String,
}

/// Export response (GET /api/pc-info?all=true)
#[derive(Debug, Serialize)]
pub struct ListInventoryResponse {
    pub data: Vec<InventoryRecord>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_request_parses_full_payload() {
        let body = json!({
            "userId": "user_1",
            "fullName": "Alice",
            "hostname": "devbox",
            "os": "Linux",
            "osVersion": "6.8",
            "cpu": "Ryzen 7",
            "cpuCores": 8,
            "totalMemory": "32.00 GB",
            "freeMemory": "20.00 GB",
            "memoryType": "DDR4",
            "platform": "linux",
            "arch": "x86_64",
            "username": "alice",
            "gpu": [{"name": "RX 6700", "vram": "12.00 GB"}],
            "storage": [{"model": "980", "size": "1.00 TB"}]
        });

        let req: SubmitInventoryRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.user_id, "user_1");
        assert_eq!(req.full_name.as_deref(), Some("Alice"));
        assert_eq!(req.snapshot.cpu_cores, 8);
        assert_eq!(req.snapshot.gpu.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn submit_request_tolerates_missing_fields() {
        let req: SubmitInventoryRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.user_id.is_empty());
        assert!(req.into_record().validate().is_err());
    }
}
