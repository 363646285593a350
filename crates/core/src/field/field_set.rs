//! Named collection of independent particle fields
//!
//! A scene typically runs several effects at once (snow in the room, embers at the
//! portal). The set owns them, keeps them in insertion order and advances them together.
//! Fields never read each other's state, so [`FieldSet::update_all`] steps them in
//! parallel.

use super::ParticleField;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Particle fields addressed by name.
///
/// # Example
///
/// ```
/// use particle_field_core::{FieldConfig, FieldSet, ParticleField};
///
/// let mut set = FieldSet::new();
/// set.insert("snow", ParticleField::new(FieldConfig::snow().with_seed(1)));
/// set.insert("nether", ParticleField::new(FieldConfig::nether().with_seed(2)));
///
/// set.update_all(0.016);
///
/// assert_eq!(set.total_particles(), 600);
/// assert!(set.get("nether").is_some());
/// ```
#[derive(Debug, Default)]
pub struct FieldSet {
    fields: Vec<(String, ParticleField)>,
    index: FxHashMap<String, usize>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field under `name`, returning the field it replaced if the name was taken.
    ///
    /// A replaced field keeps its position in the iteration order.
    pub fn insert(&mut self, name: impl Into<String>, field: ParticleField) -> Option<ParticleField> {
        let name = name.into();
        if let Some(&slot) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.fields[slot].1, field));
        }

        debug!("Adding particle field '{name}' ({} particles)", field.count());
        self.index.insert(name.clone(), self.fields.len());
        self.fields.push((name, field));
        None
    }

    /// Remove and return the field called `name`.
    ///
    /// The last field moves into the freed slot.
    pub fn remove(&mut self, name: &str) -> Option<ParticleField> {
        let slot = self.index.remove(name)?;
        let (_, field) = self.fields.swap_remove(slot);
        if let Some((moved, _)) = self.fields.get(slot) {
            self.index.insert(moved.clone(), slot);
        }
        debug!("Removed particle field '{name}'");
        Some(field)
    }

    pub fn get(&self, name: &str) -> Option<&ParticleField> {
        self.index.get(name).map(|&slot| &self.fields[slot].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParticleField> {
        self.index.get(name).map(|&slot| &mut self.fields[slot].1)
    }

    /// Advance every field by `dt`, in parallel.
    pub fn update_all(&mut self, dt: f32) {
        self.fields
            .par_iter_mut()
            .for_each(|(_, field)| field.update(dt));
    }

    /// Names and fields in iteration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParticleField)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Particle count summed over every field
    pub fn total_particles(&self) -> usize {
        self.fields.iter().map(|(_, field)| field.count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldConfig;

    fn field(count: usize, seed: u64) -> ParticleField {
        ParticleField::new(FieldConfig::snow().with_count(count).with_seed(seed))
    }

    #[test]
    fn test_insert_replaces_existing_name_in_place() {
        let mut set = FieldSet::new();
        assert!(set.insert("a", field(1, 1)).is_none());
        assert!(set.insert("b", field(2, 2)).is_none());

        let old = set.insert("a", field(3, 3)).expect("name was taken");
        assert_eq!(old.count(), 1);

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(set.get("a").map(ParticleField::count), Some(3));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_keeps_lookup_consistent() {
        let mut set = FieldSet::new();
        set.insert("a", field(1, 1));
        set.insert("b", field(2, 2));
        set.insert("c", field(3, 3));

        let removed = set.remove("a").expect("present");
        assert_eq!(removed.count(), 1);
        assert!(set.remove("a").is_none());

        assert_eq!(set.get("b").map(ParticleField::count), Some(2));
        assert_eq!(set.get("c").map(ParticleField::count), Some(3));
        assert_eq!(set.total_particles(), 5);
    }

    #[test]
    fn test_update_all_matches_sequential_updates() {
        let mut set = FieldSet::new();
        set.insert("snow", ParticleField::new(FieldConfig::snow().with_seed(21)));
        set.insert("nether", ParticleField::new(FieldConfig::nether().with_seed(22)));

        let mut snow = ParticleField::new(FieldConfig::snow().with_seed(21));
        let mut nether = ParticleField::new(FieldConfig::nether().with_seed(22));

        for _ in 0..200 {
            set.update_all(0.05);
            snow.update(0.05);
            nether.update(0.05);
        }

        assert_eq!(set.get("snow").map(ParticleField::positions), Some(snow.positions()));
        assert_eq!(
            set.get("nether").map(ParticleField::positions),
            Some(nether.positions())
        );
    }

    #[test]
    fn test_get_mut_edits_the_stored_field() {
        let mut set = FieldSet::new();
        set.insert("snow", field(4, 4));

        if let Some(snow) = set.get_mut("snow") {
            snow.mark_uploaded();
        }

        assert_eq!(set.get("snow").map(ParticleField::needs_upload), Some(false));
        assert!(set.get_mut("missing").is_none());
        assert!(!set.is_empty());
    }
}
