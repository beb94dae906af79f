//! Snapshot Records
//!
//! Point-in-time reads of orders, drivers and trucks as returned by the
//! snapshot sources. The engine only ever reads these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::sources::SourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub client_name: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSnapshot {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub full_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub license_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckState {
    Available,
    Assigned,
    InMaintenance,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckSnapshot {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub plate: String,
    pub model: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub operational_state: TruckState,
    #[serde(default)]
    pub next_maintenance: Option<DateTime<Utc>>,
}

/// Everything fetched for one pass. `None` means the source failed, which
/// is distinct from a source that answered with an empty list.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    pub orders: Option<Vec<OrderSnapshot>>,
    pub drivers: Option<Vec<DriverSnapshot>>,
    pub trucks: Option<Vec<TruckSnapshot>>,
}

impl Snapshots {
    pub fn is_empty(&self) -> bool {
        self.orders.is_none() && self.drivers.is_none() && self.trucks.is_none()
    }

    /// Whether the given source answered this pass.
    pub fn has(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Orders => self.orders.is_some(),
            SourceKind::Drivers => self.drivers.is_some(),
            SourceKind::Trucks => self.trucks.is_some(),
        }
    }
}

fn default_active() -> bool {
    true
}

// The backend hands out numeric ids for some collections and string ids
// for others.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
