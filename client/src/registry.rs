use std::collections::HashMap;

use thiserror::Error;

/// Handle of one drawable layer on the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub usize);

pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("region {0:?} was never registered")]
    NotFound(String),
}

/// One selectable region. `selected` is only written by the highlight controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFeature {
    /// Every surface layer drawn for this region. Regions split across several
    /// dataset features (islands, exclaves) own more than one.
    pub layers: Vec<LayerId>,
    pub baseline: Rgb,
    pub(crate) selected: bool,
}

impl RegionFeature {
    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

/// Name-keyed record of every region drawn on the map.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: HashMap<String, RegionFeature>,
    order: Vec<String>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one layer for `name`. The first registration fixes the
    /// baseline color; later ones only add layers.
    pub fn register(&mut self, name: &str, layer: LayerId, baseline: Rgb) {
        if let Some(feature) = self.features.get_mut(name) {
            feature.layers.push(layer);
            return;
        }
        self.order.push(name.to_owned());
        self.features.insert(
            name.to_owned(),
            RegionFeature {
                layers: vec![layer],
                baseline,
                selected: false,
            },
        );
    }

    pub fn get(&self, name: &str) -> Result<&RegionFeature, RegistryError> {
        self.features
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Result<&mut RegionFeature, RegistryError> {
        self.features
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    /// Region names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names of every region currently marked selected.
    pub fn selected_names(&self) -> Vec<&str> {
        self.names()
            .filter(|name| self.features.get(*name).is_some_and(RegionFeature::is_selected))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_registered_handle_and_baseline() {
        let mut registry = FeatureRegistry::new();
        registry.register("Lazio", LayerId(3), (31, 119, 180));

        let feature = registry.get("Lazio").expect("Lazio registered");
        assert_eq!(feature.layers, vec![LayerId(3)]);
        assert_eq!(feature.baseline, (31, 119, 180));
        assert!(!feature.is_selected());
    }

    #[test]
    fn get_unknown_region_is_not_found() {
        let registry = FeatureRegistry::new();
        assert_eq!(
            registry.get("Atlantide"),
            Err(RegistryError::NotFound("Atlantide".to_string()))
        );
    }

    #[test]
    fn repeated_registration_adds_layers_and_keeps_first_baseline() {
        let mut registry = FeatureRegistry::new();
        registry.register("Sicilia", LayerId(0), (214, 39, 40));
        registry.register("Sicilia", LayerId(1), (148, 103, 189));

        let feature = registry.get("Sicilia").expect("Sicilia registered");
        assert_eq!(feature.layers, vec![LayerId(0), LayerId(1)]);
        assert_eq!(feature.baseline, (214, 39, 40));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_follow_registration_order() {
        let mut registry = FeatureRegistry::new();
        for (idx, name) in ["Piemonte", "Lombardia", "Veneto"].into_iter().enumerate() {
            registry.register(name, LayerId(idx), (0, 0, 0));
        }
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["Piemonte", "Lombardia", "Veneto"]);
    }
}
