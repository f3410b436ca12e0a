// Wire types for the lookup API.
//
// Field names follow the appliance's camelCase JSON. Anything the core
// does not interpret stays in `extra` so the scanner can log it verbatim.

use serde::{Deserialize, Serialize};

/// One entry of `GET /api/1.0/lookup/1`: a node on the appliance bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDevice {
    pub node_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// Absent on nodes that expose no control functions.
    #[serde(default)]
    pub functions: Option<Vec<FunctionDescriptor>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A control function hosted by a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub fct_id: u32,
    /// Domain discriminator. Negative values mark placeholder entries.
    pub fct_type: i32,
    #[serde(default)]
    pub name: String,
    /// Disabled flag; locked functions are ignored by discovery.
    #[serde(default)]
    pub lock: bool,
}

/// One entry of `GET /api/1.0/lookup/1/<node>/<fct>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorGroup {
    pub id: u32,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `PUT /api/1.0/datapoint`.
#[derive(Debug, Clone, Serialize)]
pub struct DatapointWrite<'a> {
    #[serde(rename = "OID")]
    pub oid: &'a str,
    pub value: &'a str,
}
