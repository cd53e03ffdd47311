// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena of eagerly decoded records
//!
//! Every record of the DATA section is decoded once and stored in a flat
//! vector. Lookups go through integer slots: id to slot, type to slots in
//! file order, and object to the property relations that define it.

use crate::scanner::RawRecord;
use crate::tokenizer::parse_entity;
use ifc_takeoff_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use rustc_hash::FxHashMap;
use std::sync::Arc;

type Slot = u32;

/// Decoded records with lookup indices
#[derive(Default)]
pub struct EntityArena {
    records: Vec<Arc<DecodedEntity>>,
    slots: FxHashMap<u32, Slot>,
    by_type: FxHashMap<IfcType, Vec<Slot>>,
    /// Object id -> slots of `IfcRelDefinesByProperties` naming it
    defined_by: FxHashMap<u32, Vec<Slot>>,
    skipped: usize,
}

impl EntityArena {
    /// Decode every record, skipping the malformed ones
    pub fn decode<'a>(records: impl IntoIterator<Item = RawRecord<'a>>) -> Self {
        let mut arena = Self::default();
        for record in records {
            match parse_entity(record.text) {
                Ok(entity) => arena.insert(entity),
                Err(err) => {
                    log::debug!("[Parser] Skipping record at byte {}: {}", record.offset, err);
                    arena.skipped += 1;
                }
            }
        }
        arena.index_relations();
        arena
    }

    /// Add one decoded record; a repeated id keeps the first definition
    fn insert(&mut self, entity: DecodedEntity) {
        if self.slots.contains_key(&entity.id.0) {
            log::debug!("[Parser] Duplicate definition of {}, keeping the first", entity.id);
            self.skipped += 1;
            return;
        }
        let slot = self.records.len() as Slot;
        self.slots.insert(entity.id.0, slot);
        self.by_type
            .entry(entity.ifc_type.clone())
            .or_default()
            .push(slot);
        self.records.push(Arc::new(entity));
    }

    fn index_relations(&mut self) {
        let Some(relations) = self.by_type.get(&IfcType::IfcRelDefinesByProperties) else {
            return;
        };
        for &slot in relations {
            // RelatedObjects at 4
            let Some(objects) = self.records[slot as usize].get_refs(4) else {
                continue;
            };
            for object in objects {
                let entry = self.defined_by.entry(object.0).or_default();
                if entry.last() != Some(&slot) {
                    entry.push(slot);
                }
            }
        }
    }

    /// Number of decoded records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that failed to decode or repeated an id
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn at(&self, slot: Slot) -> Arc<DecodedEntity> {
        Arc::clone(&self.records[slot as usize])
    }
}

impl EntityResolver for EntityArena {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.slots.get(&id.0).map(|&slot| self.at(slot))
    }

    fn ids_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId> {
        self.by_type
            .get(ifc_type)
            .map(|slots| {
                slots
                    .iter()
                    .map(|&slot| self.records[slot as usize].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn all_ids(&self) -> Vec<EntityId> {
        self.records.iter().map(|r| r.id).collect()
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.by_type
            .get(ifc_type)
            .map(|slots| slots.iter().map(|&slot| self.at(slot)).collect())
            .unwrap_or_default()
    }

    fn defined_by(&self, id: EntityId) -> Vec<Arc<DecodedEntity>> {
        self.defined_by
            .get(&id.0)
            .map(|slots| slots.iter().map(|&slot| self.at(slot)).collect())
            .unwrap_or_default()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.by_type.get(ifc_type).map_or(0, Vec::len)
    }

    fn entity_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::EntityScanner;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCSLAB('g1',$,'Slab A',$,$,$,$,$,$);
#11=IFCSLAB('g2',$,'Slab B',$,$,$,$,$,$);
#12=IFCWALL('g3',$,'Wall',$,$,$,$,$);
#13=IFCWALL(broken;
#10=IFCBEAM('dup',$,$,$,$,$,$,$);
#20=IFCPROPERTYSET('p1',$,'Pset_A',$,());
#21=IFCPROPERTYSET('p2',$,'Pset_B',$,());
#30=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#10,#12),#20);
#31=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#21);
ENDSEC;
END-ISO-10303-21;
"#;

    fn arena() -> EntityArena {
        EntityArena::decode(EntityScanner::new(TEST_IFC).unwrap())
    }

    #[test]
    fn test_decode_skips_malformed_and_duplicates() {
        let arena = arena();
        assert_eq!(arena.len(), 7);
        assert_eq!(arena.skipped(), 2);
        assert_eq!(arena.get(EntityId(10)).unwrap().ifc_type, IfcType::IfcSlab);
        assert!(arena.get(EntityId(13)).is_none());
    }

    #[test]
    fn test_type_index_keeps_file_order() {
        let arena = arena();
        assert_eq!(
            arena.ids_by_type(&IfcType::IfcSlab),
            vec![EntityId(10), EntityId(11)]
        );
        assert_eq!(arena.count_by_type(&IfcType::IfcBeam), 0);
    }

    #[test]
    fn test_defined_by_index() {
        let arena = arena();
        let rels: Vec<EntityId> = arena.defined_by(EntityId(10)).iter().map(|r| r.id).collect();
        assert_eq!(rels, vec![EntityId(30), EntityId(31)]);
        assert_eq!(arena.defined_by(EntityId(12)).len(), 1);
        assert!(arena.defined_by(EntityId(11)).is_empty());
    }
}
