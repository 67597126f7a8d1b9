//! Classification dimension tables (commodity, country, NAICS, district, ...).
//!
//! Each table is a simple surrogate-id -> code/description mapping, populated
//! once at ingestion time and read-only during aggregation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Commodity,
    Country,
    Naics,
    District,
    Sitc,
    Unit,
}

impl DimensionKind {
    /// Conventional file stem of the lookup table (`<stem>.csv`).
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Commodity => "commodity",
            Self::Country => "country",
            Self::Naics => "naics",
            Self::District => "district",
            Self::Sitc => "sitc",
            Self::Unit => "unit",
        }
    }

    /// Output column holding the surrogate id.
    #[must_use]
    pub const fn id_column(self) -> &'static str {
        match self {
            Self::Commodity => "hts_id",
            Self::Country => "country_id",
            Self::Naics => "naics_id",
            Self::District => "district_id",
            Self::Sitc => "sitc_id",
            Self::Unit => "unit_id",
        }
    }

    /// Output column holding the human-readable code.
    #[must_use]
    pub const fn code_column(self) -> &'static str {
        match self {
            Self::Commodity => "hts_code",
            Self::Country => "cty_code",
            Self::Naics => "naics_code",
            Self::District => "district_code",
            Self::Sitc => "sitc_code",
            Self::Unit => "unit_code",
        }
    }

    /// Output column holding the description, for tables that project one.
    #[must_use]
    pub const fn description_column(self) -> Option<&'static str> {
        match self {
            Self::Country => Some("country_name"),
            Self::District => Some("district_desc"),
            Self::Commodity | Self::Naics | Self::Sitc | Self::Unit => None,
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Commodity,
            Self::Country,
            Self::Naics,
            Self::District,
            Self::Sitc,
            Self::Unit,
        ]
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionEntry {
    pub id: i32,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl DimensionEntry {
    #[must_use]
    pub fn new(id: i32, code: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            id,
            code: code.into(),
            description: description.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionTable {
    kind: DimensionKind,
    entries: BTreeMap<i32, DimensionEntry>,
}

impl DimensionTable {
    #[must_use]
    pub fn new(kind: DimensionKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_entries(kind: DimensionKind, entries: impl IntoIterator<Item = DimensionEntry>) -> Self {
        let mut table = Self::new(kind);
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    /// Inserts an entry, replacing any previous entry with the same id.
    pub fn insert(&mut self, entry: DimensionEntry) {
        self.entries.insert(entry.id, entry);
    }

    #[must_use]
    pub const fn kind(&self) -> DimensionKind {
        self.kind
    }

    #[must_use]
    pub fn get(&self, id: i32) -> Option<&DimensionEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn code(&self, id: i32) -> Option<&str> {
        self.get(id).map(|e| e.code.as_str())
    }

    /// Ids of every entry whose code starts with `prefix`.
    #[must_use]
    pub fn ids_with_prefix(&self, prefix: &str) -> BTreeSet<i32> {
        self.entries
            .values()
            .filter(|e| e.code.starts_with(prefix))
            .map(|e| e.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All lookup tables available to one aggregation call.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    tables: HashMap<DimensionKind, DimensionTable>,
}

impl ReferenceData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, table: DimensionTable) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: DimensionTable) {
        self.tables.insert(table.kind(), table);
    }

    #[must_use]
    pub fn table(&self, kind: DimensionKind) -> Option<&DimensionTable> {
        self.tables.get(&kind)
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<DimensionKind> {
        let mut kinds: Vec<_> = self.tables.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
