// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storey filter

use ifc_takeoff_model::{BuildingModel, EntityId, Mesh};
use rustc_hash::FxHashSet;

/// Selected storey; `None` shows every element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreyFilter {
    selected: Option<EntityId>,
}

impl StoreyFilter {
    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Select a storey; unknown ids select everything
    pub fn select(&mut self, storey: Option<EntityId>, model: &BuildingModel) {
        self.selected = model.selected_storey(storey).map(|s| s.id);
    }

    pub fn show_all(&mut self) {
        self.selected = None;
    }

    /// Step through the storeys by elevation, passing through "all"
    pub fn cycle(&mut self, model: &BuildingModel, forward: bool) {
        let count = model.storeys.len();
        if count == 0 {
            self.selected = None;
            return;
        }
        // position 0 is "all", storeys follow
        let position = self
            .selected
            .and_then(|id| model.storeys.iter().position(|s| s.id == id))
            .map_or(0, |i| i + 1);
        let next = if forward {
            (position + 1) % (count + 1)
        } else {
            (position + count) % (count + 1)
        };
        self.selected = next.checked_sub(1).map(|i| model.storeys[i].id);
    }

    /// Display name of the selection
    pub fn label(&self, model: &BuildingModel) -> String {
        self.selected
            .and_then(|id| model.storey(id))
            .map_or_else(|| "All storeys".to_string(), |s| s.name.clone())
    }

    /// Meshes of the selected storey's elements
    pub fn visible_meshes<'a>(&self, model: &BuildingModel, meshes: &'a [Mesh]) -> Vec<&'a Mesh> {
        let Some(storey) = model.selected_storey(self.selected) else {
            return meshes.iter().collect();
        };
        let members: FxHashSet<EntityId> = storey.element_ids.iter().copied().collect();
        meshes
            .iter()
            .filter(|m| members.contains(&m.element_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_takeoff_model::Storey;

    fn storey(id: u32, name: &str, elevation: f64, elements: &[u32]) -> Storey {
        Storey {
            id: EntityId(id),
            name: name.into(),
            elevation,
            element_ids: elements.iter().map(|&e| EntityId(e)).collect(),
        }
    }

    fn model() -> BuildingModel {
        BuildingModel {
            project_name: "P".into(),
            site_name: "S".into(),
            building_name: "B".into(),
            schema: "IFC4".into(),
            length_unit_scale: 1.0,
            storeys: vec![
                storey(1, "Ground", 0.0, &[10, 11]),
                storey(2, "Empty", 3.0, &[]),
                storey(3, "Roof", 6.0, &[12]),
            ],
            elements: Vec::new(),
            gross_floor_area: None,
            total_volume: None,
            perimeter: None,
        }
    }

    fn mesh(id: u32) -> Mesh {
        Mesh {
            element_id: EntityId(id),
            ..Default::default()
        }
    }

    #[test]
    fn test_cycle_forward_and_back() {
        let model = model();
        let mut filter = StoreyFilter::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            filter.cycle(&model, true);
            seen.push(filter.selected());
        }
        assert_eq!(
            seen,
            vec![Some(EntityId(1)), Some(EntityId(2)), Some(EntityId(3)), None]
        );
        filter.cycle(&model, false);
        assert_eq!(filter.selected(), Some(EntityId(3)));
        assert_eq!(filter.label(&model), "Roof");
    }

    #[test]
    fn test_visible_meshes() {
        let model = model();
        let meshes = vec![mesh(10), mesh(11), mesh(11), mesh(12), mesh(99)];
        let mut filter = StoreyFilter::default();
        assert_eq!(filter.visible_meshes(&model, &meshes).len(), 5);

        filter.select(Some(EntityId(1)), &model);
        assert_eq!(filter.visible_meshes(&model, &meshes).len(), 3);

        filter.select(Some(EntityId(2)), &model);
        assert!(filter.visible_meshes(&model, &meshes).is_empty());

        filter.select(Some(EntityId(42)), &model);
        assert_eq!(filter.selected(), None);
        assert_eq!(filter.label(&model), "All storeys");
    }

    #[test]
    fn test_cycle_without_storeys() {
        let mut model = model();
        model.storeys.clear();
        let mut filter = StoreyFilter::default();
        filter.cycle(&model, true);
        assert_eq!(filter.selected(), None);
    }
}
