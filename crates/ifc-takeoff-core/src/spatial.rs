// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hierarchy: project names, storeys and element membership

use ifc_takeoff_model::{
    DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType, Storey,
};
use rustc_hash::FxHashMap;

/// Storeys sorted by elevation plus an element to storey map
#[derive(Clone, Debug, Default)]
pub struct SpatialHierarchy {
    pub project_name: String,
    pub site_name: String,
    pub building_name: String,
    pub storeys: Vec<Storey>,
    element_storey: FxHashMap<EntityId, usize>,
}

impl SpatialHierarchy {
    /// Discover the hierarchy of a decoded model
    ///
    /// Elevations are converted to meters with `unit_scale`.
    pub fn build(resolver: &dyn EntityResolver, unit_scale: f64) -> Self {
        let mut storeys: Vec<Storey> = resolver
            .entities_by_type(&IfcType::IfcBuildingStorey)
            .iter()
            .map(|storey| Storey {
                id: storey.id,
                name: display_name(storey, 7).unwrap_or_else(|| format!("Storey {}", storey.id)),
                // Elevation at 9
                elevation: storey.get_float(9).unwrap_or(0.0) * unit_scale,
                element_ids: Vec::new(),
            })
            .collect();
        // stable: equal elevations keep file order
        storeys.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));

        let mut hierarchy = Self {
            project_name: first_name(resolver, &IfcType::IfcProject, 5, "Unnamed Project"),
            site_name: first_name(resolver, &IfcType::IfcSite, 7, "Unnamed Site"),
            building_name: first_name(resolver, &IfcType::IfcBuilding, 7, "Unnamed Building"),
            storeys,
            element_storey: FxHashMap::default(),
        };
        hierarchy.assign_contained(resolver);
        hierarchy.assign_aggregated(resolver);

        log::debug!(
            "[Spatial] {} storeys, {} assigned elements",
            hierarchy.storeys.len(),
            hierarchy.element_storey.len()
        );
        hierarchy
    }

    fn storey_index(&self, id: EntityId) -> Option<usize> {
        self.storeys.iter().position(|s| s.id == id)
    }

    fn assign(&mut self, element: EntityId, storey: usize) {
        if !self.element_storey.contains_key(&element) {
            self.element_storey.insert(element, storey);
            self.storeys[storey].element_ids.push(element);
        }
    }

    /// IfcRelContainedInSpatialStructure: RelatedElements (4), RelatingStructure (5)
    fn assign_contained(&mut self, resolver: &dyn EntityResolver) {
        for relation in resolver.entities_by_type(&IfcType::IfcRelContainedInSpatialStructure) {
            let Some(storey) = relation.get_ref(5).and_then(|id| self.storey_index(id)) else {
                continue;
            };
            for element in resolver.follow_list(&relation, 4) {
                if element.ifc_type.is_element() {
                    self.assign(element.id, storey);
                }
            }
        }
    }

    /// IfcRelAggregates: RelatingObject (4), RelatedObjects (5)
    fn assign_aggregated(&mut self, resolver: &dyn EntityResolver) {
        for relation in resolver.entities_by_type(&IfcType::IfcRelAggregates) {
            let Some(parent) = relation.get_ref(4) else {
                continue;
            };
            let storey = self
                .storey_index(parent)
                .or_else(|| self.element_storey.get(&parent).copied());
            let Some(storey) = storey else {
                continue;
            };
            for child in resolver.follow_list(&relation, 5) {
                if child.ifc_type.is_element() {
                    self.assign(child.id, storey);
                }
            }
        }
    }

    /// Storey an element was assigned to
    pub fn storey_of(&self, element: EntityId) -> Option<EntityId> {
        self.element_storey
            .get(&element)
            .map(|&index| self.storeys[index].id)
    }

    pub fn assigned_count(&self) -> usize {
        self.element_storey.len()
    }
}

/// Name (2), falling back to LongName at `long_name_index`
fn display_name(entity: &DecodedEntity, long_name_index: usize) -> Option<String> {
    [2, long_name_index]
        .iter()
        .filter_map(|&i| entity.get_string(i))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_name(
    resolver: &dyn EntityResolver,
    ifc_type: &IfcType,
    long_name_index: usize,
    placeholder: &str,
) -> String {
    resolver
        .entities_by_type(ifc_type)
        .first()
        .and_then(|entity| display_name(entity, long_name_index))
        .unwrap_or_else(|| placeholder.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_takeoff_model::IfcModel;
    use ifc_takeoff_parser::StepModel;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('p',$,$,$,$,'Long Project',$,$,$);
#2=IFCSITE('s',$,'Site A',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#5=IFCBUILDINGSTOREY('l2',$,'Level 2',$,$,$,$,$,.ELEMENT.,3000.);
#6=IFCBUILDINGSTOREY('l0',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#7=IFCBUILDINGSTOREY('b1',$,'Basement',$,$,$,$,$,.ELEMENT.,-3000.);
#8=IFCBUILDINGSTOREY('l0b',$,$,$,$,$,$,'Mezzanine',.ELEMENT.,0.);
#9=IFCBUILDINGSTOREY('x',$,'Roof',$,$,$,$,$,.ELEMENT.,$);
#20=IFCWALL('w1',$,'W1',$,$,$,$,$,$);
#21=IFCWALL('w2',$,'W2',$,$,$,$,$,$);
#22=IFCSTAIR('st',$,'Stair',$,$,$,$,$,$);
#23=IFCSTAIRFLIGHT('sf',$,'Flight',$,$,$,$,$,$,$,$,$);
#24=IFCSLAB('sl',$,'Loose',$,$,$,$,$,$);
#25=IFCSPACE('sp',$,'Room',$,$,$,$,$,$,$,$);
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('c1',$,$,$,(#20,#22,#99),#6);
#31=IFCRELCONTAINEDINSPATIALSTRUCTURE('c2',$,$,$,(#20,#21),#5);
#32=IFCRELAGGREGATES('a1',$,$,$,#22,(#23));
#33=IFCRELAGGREGATES('a2',$,$,$,#7,(#21,#25));
#34=IFCRELCONTAINEDINSPATIALSTRUCTURE('c3',$,$,$,(#24),#2);
ENDSEC;
END-ISO-10303-21;
"#;

    fn hierarchy() -> SpatialHierarchy {
        let model = StepModel::parse(TEST_IFC).unwrap();
        SpatialHierarchy::build(model.resolver(), 0.001)
    }

    #[test]
    fn test_storeys_sorted_stably() {
        let h = hierarchy();
        let names: Vec<&str> = h.storeys.iter().map(|s| s.name.as_str()).collect();
        // Ground, Mezzanine and Roof all sit at 0 and keep file order
        assert_eq!(names, vec!["Basement", "Ground", "Mezzanine", "Roof", "Level 2"]);
        assert_eq!(h.storeys[0].elevation, -3.0);
        assert_eq!(h.storeys[4].elevation, 3.0);
    }

    #[test]
    fn test_containment_first_wins() {
        let h = hierarchy();
        assert_eq!(h.storey_of(EntityId(20)), Some(EntityId(6)));
        assert_eq!(h.storey_of(EntityId(21)), Some(EntityId(5)));
        let total: usize = h.storeys.iter().map(|s| s.element_ids.len()).sum();
        assert_eq!(total, h.assigned_count());
    }

    #[test]
    fn test_aggregation_follows_parent() {
        let h = hierarchy();
        // flight inherits the stair's storey
        assert_eq!(h.storey_of(EntityId(23)), Some(EntityId(6)));
        // wall 2 was already contained, the space is not an element
        assert!(h.storeys[0].element_ids.is_empty());
    }

    #[test]
    fn test_unassigned_elements() {
        let h = hierarchy();
        // contained in a site, not a storey
        assert_eq!(h.storey_of(EntityId(24)), None);
        assert_eq!(h.storey_of(EntityId(99)), None);
    }

    #[test]
    fn test_names_and_placeholders() {
        let h = hierarchy();
        assert_eq!(h.project_name, "Long Project");
        assert_eq!(h.site_name, "Site A");
        assert_eq!(h.building_name, "Unnamed Building");
    }
}
