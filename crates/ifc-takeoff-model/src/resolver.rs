// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity lookup and reference resolution

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Read access to decoded records
///
/// Lookups never fail loudly: a missing id or a dangling reference is `None`
/// (or an empty list), and the caller decides what that means.
///
/// # Example
///
/// ```ignore
/// use ifc_takeoff_model::{EntityResolver, IfcType};
///
/// fn storey_names(resolver: &dyn EntityResolver) -> Vec<String> {
///     resolver
///         .entities_by_type(&IfcType::IfcBuildingStorey)
///         .iter()
///         .filter_map(|s| s.get_string(2).map(str::to_string))
///         .collect()
/// }
/// ```
pub trait EntityResolver: Send + Sync {
    /// Get entity by ID
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Ids of every entity of `ifc_type`, in file order
    fn ids_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId>;

    /// All entity ids, in file order
    fn all_ids(&self) -> Vec<EntityId>;

    /// Resolve an attribute that holds an entity reference
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Resolve every reference in a list attribute, skipping dangling ones
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every entity of `ifc_type`, in file order
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.ids_by_type(ifc_type)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// `IfcRelDefinesByProperties` relations whose RelatedObjects include `id`,
    /// in file order
    ///
    /// The default implementation scans every relation. Arena-backed
    /// resolvers override it with a prebuilt inverse index.
    fn defined_by(&self, id: EntityId) -> Vec<Arc<DecodedEntity>> {
        self.entities_by_type(&IfcType::IfcRelDefinesByProperties)
            .into_iter()
            .filter(|rel| {
                rel.get_refs(4)
                    .is_some_and(|objects| objects.contains(&id))
            })
            .collect()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.ids_by_type(ifc_type).len()
    }

    fn entity_count(&self) -> usize {
        self.all_ids().len()
    }
}

/// Extension methods for EntityResolver
pub trait EntityResolverExt: EntityResolver {
    fn exists(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Get entity or return error
    fn get_or_err(&self, id: EntityId) -> crate::Result<Arc<DecodedEntity>> {
        self.get(id).ok_or(crate::ParseError::EntityNotFound(id))
    }

    /// Follow the reference held at `index` of `entity`
    fn follow(&self, entity: &DecodedEntity, index: usize) -> Option<Arc<DecodedEntity>> {
        entity.get(index).and_then(|attr| self.resolve_ref(attr))
    }

    /// Follow every reference in the list held at `index` of `entity`
    fn follow_list(&self, entity: &DecodedEntity, index: usize) -> Vec<Arc<DecodedEntity>> {
        entity
            .get(index)
            .map(|attr| self.resolve_ref_list(attr))
            .unwrap_or_default()
    }
}

impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}
