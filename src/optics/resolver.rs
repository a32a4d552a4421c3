use std::collections::HashMap;

use super::group::{default_group_name, GroupSnapshot, OpticsGroup, OptionalColumns};
use crate::labels::BLOCK_OPTICS;
use crate::model::{Acquisition, SetKind};
use crate::star::{SchemaError, Table, TableRow};

/// Identity of an optics group on the write path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    /// Explicit group name carried by the record
    Named(String),
    /// Voltage, spherical aberration and amplitude contrast by bit pattern
    Fingerprint(u64, u64, u64),
}

impl GroupKey {
    fn of(acquisition: &Acquisition) -> Self {
        match &acquisition.optics_group_name {
            Some(name) => GroupKey::Named(name.clone()),
            None => GroupKey::Fingerprint(
                acquisition.voltage.to_bits(),
                acquisition.spherical_aberration.to_bits(),
                acquisition.amplitude_contrast.to_bits(),
            ),
        }
    }
}

/// Optics groups collected during one write pass
///
/// Ids are assigned in first-seen order starting at 1. A group's values are
/// taken from the first record that introduces it.
#[derive(Debug, Default)]
pub struct OpticsGroups {
    groups: Vec<OpticsGroup>,
    index: HashMap<GroupKey, u32>,
}

impl OpticsGroups {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Group id for a record, creating the group on first sight.
    ///
    /// Generated names share the namespace of explicit names: a record
    /// named like an earlier generated group joins it, and a generated name
    /// already taken explicitly moves on to the next free number.
    pub fn resolve(&mut self, acquisition: &Acquisition, snapshot: &GroupSnapshot) -> u32 {
        let key = GroupKey::of(acquisition);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }

        let id = self.groups.len() as u32 + 1;
        let name = match &acquisition.optics_group_name {
            Some(name) => name.clone(),
            None => self.free_group_name(id),
        };
        log::debug!("New optics group {} ({})", id, name);

        self.index.insert(GroupKey::Named(name.clone()), id);
        self.index.insert(key, id);
        self.groups
            .push(OpticsGroup::new(id, name, acquisition, snapshot));
        id
    }

    fn free_group_name(&self, id: u32) -> String {
        (id..)
            .map(default_group_name)
            .find(|name| !self.index.contains_key(&GroupKey::Named(name.clone())))
            .unwrap_or_else(|| default_group_name(id))
    }

    /// Group by id
    pub fn get(&self, id: u32) -> Option<&OpticsGroup> {
        id.checked_sub(1)
            .and_then(|i| self.groups.get(i as usize))
    }

    /// Groups in id order
    pub fn groups(&self) -> &[OpticsGroup] {
        &self.groups
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group has been seen yet
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Build the `optics` table.
    ///
    /// Optional columns are included when any group carries them.
    pub fn to_table(&self, kind: SetKind) -> Result<Table, SchemaError> {
        let optional = OptionalColumns::union(&self.groups);
        let mut table = Table::new(BLOCK_OPTICS);
        for group in &self.groups {
            table.add_row(&group.to_row(kind, optional))?;
        }
        Ok(table)
    }
}

/// Optics groups parsed from an `optics` block, indexed by id
#[derive(Debug, Clone, Default)]
pub struct OpticsTable {
    groups: HashMap<i64, OpticsGroup>,
}

impl OpticsTable {
    /// Index every row of an `optics` table
    pub fn from_table(table: &Table) -> Result<Self, SchemaError> {
        let groups = table
            .iter()
            .map(OpticsGroup::from_row)
            .map(|group| group.map(|g| (i64::from(g.id), g)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { groups })
    }

    /// Group by id
    pub fn lookup(&self, id: i64) -> Result<&OpticsGroup, SchemaError> {
        self.groups
            .get(&id)
            .ok_or(SchemaError::UnknownOpticsGroup(id))
    }

    /// Group referenced by a data row; rows without the column use group 1
    pub fn lookup_row(&self, row: &TableRow) -> Result<&OpticsGroup, SchemaError> {
        let id = row.get_i64_or(crate::labels::OPTICS_GROUP, 1)?;
        self.lookup(id)
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the table defines no group
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
