// ── OID addressing ──
//
// Every readable point on the appliance lives at a six-segment path
// `/1/<node>/<fct>/<category>/<point>/<instance>`. Node and function paths
// are the prefixes of that shape. All types here render to the exact
// strings the lookup API expects.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Leading segment shared by every path in the lookup tree.
pub const ROOT_SEGMENT: u32 = 1;

/// A path failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path {input:?}: {reason}")]
pub struct OidError {
    pub input: String,
    pub reason: &'static str,
}

impl OidError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

// ── NodePath ────────────────────────────────────────────────────────

/// `/1/<node>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    pub node_id: u32,
}

impl NodePath {
    pub const fn new(node_id: u32) -> Self {
        Self { node_id }
    }

    pub const fn function(self, fct_id: u32) -> FunctionPath {
        FunctionPath {
            node_id: self.node_id,
            fct_id,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{ROOT_SEGMENT}/{}", self.node_id)
    }
}

// ── FunctionPath ────────────────────────────────────────────────────

/// `/1/<node>/<fct>`: the prefix shared by every point of one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionPath {
    pub node_id: u32,
    pub fct_id: u32,
}

impl FunctionPath {
    pub const fn node(self) -> NodePath {
        NodePath::new(self.node_id)
    }

    /// Full OID of `address` under this function.
    pub fn point(self, address: PointAddress) -> Oid {
        Oid::new(self, address)
    }

    /// `/1/<node>/<fct>/<category>`, the sensor listing of one category.
    pub fn sensors(self, category: u32) -> String {
        format!("{self}/{category}")
    }

    /// The point address rendered relative to the node: `/<fct>/<c>/<p>/<i>`.
    pub fn relative(self, address: PointAddress) -> String {
        format!("/{}{address}", self.fct_id)
    }
}

impl fmt::Display for FunctionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{ROOT_SEGMENT}/{}/{}", self.node_id, self.fct_id)
    }
}

impl FromStr for FunctionPath {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [root, node_id, fct_id] = parse_segments::<3>(s)?;
        if root != ROOT_SEGMENT {
            return Err(OidError::new(s, "path must start with /1"));
        }
        Ok(Self { node_id, fct_id })
    }
}

impl Serialize for FunctionPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FunctionPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── PointAddress ────────────────────────────────────────────────────

/// `/<category>/<point>/<instance>`, a point relative to its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointAddress {
    pub category: u32,
    pub point: u32,
    pub instance: u32,
}

impl PointAddress {
    pub const fn new(category: u32, point: u32, instance: u32) -> Self {
        Self {
            category,
            point,
            instance,
        }
    }
}

impl fmt::Display for PointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.category, self.point, self.instance)
    }
}

impl FromStr for PointAddress {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [category, point, instance] = parse_segments::<3>(s)?;
        Ok(Self::new(category, point, instance))
    }
}

// ── Oid ─────────────────────────────────────────────────────────────

/// A fully qualified point: `/1/<node>/<fct>/<category>/<point>/<instance>`.
///
/// Equality, hashing and ordering are those of the rendered string, so an
/// `Oid` can be looked up in maps by `&str`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Oid {
    path: String,
    function: FunctionPath,
    address: PointAddress,
}

impl Oid {
    pub fn new(function: FunctionPath, address: PointAddress) -> Self {
        Self {
            path: format!("{function}{address}"),
            function,
            address,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub const fn function(&self) -> FunctionPath {
        self.function
    }

    pub const fn address(&self) -> PointAddress {
        self.address
    }

    pub const fn node_id(&self) -> u32 {
        self.function.node_id
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [root, node_id, fct_id, category, point, instance] = parse_segments::<6>(s)?;
        if root != ROOT_SEGMENT {
            return Err(OidError::new(s, "path must start with /1"));
        }
        Ok(Self::new(
            NodePath::new(node_id).function(fct_id),
            PointAddress::new(category, point, instance),
        ))
    }
}

impl TryFrom<String> for Oid {
    type Error = OidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.path
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl Borrow<str> for Oid {
    fn borrow(&self) -> &str {
        &self.path
    }
}

impl PartialEq for Oid {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Oid {}

impl Hash for Oid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Stable identifier from a host and a path: `.` and `/` become `-`.
///
/// `slug("192.168.1.20", "/1/7")` is `"192-168-1-20-1-7"`.
pub fn slug(host: &str, path: &str) -> String {
    format!("{host}{path}").replace(['.', '/'], "-")
}

/// Parse `/a/b/...` into exactly `N` canonical decimal segments.
///
/// Leading zeros are rejected so that parse-then-render is the identity.
fn parse_segments<const N: usize>(s: &str) -> Result<[u32; N], OidError> {
    let Some(rest) = s.strip_prefix('/') else {
        return Err(OidError::new(s, "path must start with '/'"));
    };

    let mut out = [0_u32; N];
    let mut count = 0;
    for segment in rest.split('/') {
        if count == N {
            return Err(OidError::new(s, "too many segments"));
        }
        if segment.is_empty() {
            return Err(OidError::new(s, "empty segment"));
        }
        if !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OidError::new(s, "segments must be decimal integers"));
        }
        if segment.len() > 1 && segment.starts_with('0') {
            return Err(OidError::new(s, "segments must not have leading zeros"));
        }
        let value = segment
            .parse()
            .map_err(|_| OidError::new(s, "segment out of range"))?;
        if let Some(slot) = out.get_mut(count) {
            *slot = value;
        }
        count += 1;
    }

    if count == N {
        Ok(out)
    } else {
        Err(OidError::new(s, "too few segments"))
    }
}
