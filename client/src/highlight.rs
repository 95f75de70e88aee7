use regioni_shared::{Geometry, darken_percent};

use crate::registry::{FeatureRegistry, LayerId, RegistryError, Rgb};

/// Default darkening: one full `darker` step.
pub const DEFAULT_DARKEN_PERCENT: f64 = 100.0;

/// Drawing surface holding one fill-colored layer per region geometry.
pub trait MapSurface {
    fn add_layer(&mut self, name: &str, geometry: &Geometry, fill: Rgb) -> LayerId;
    fn set_fill(&mut self, layer: LayerId, fill: Rgb);
}

/// Applies and reverts hover/selection fills. Selection styling always wins
/// over hover styling.
#[derive(Debug, Clone, Copy)]
pub struct HighlightController {
    darken_percent: f64,
}

impl Default for HighlightController {
    fn default() -> Self {
        Self::new(DEFAULT_DARKEN_PERCENT)
    }
}

impl HighlightController {
    pub fn new(darken_percent: f64) -> Self {
        Self { darken_percent }
    }

    pub fn highlight_color(&self, baseline: Rgb) -> Rgb {
        darken_percent(baseline, self.darken_percent)
    }

    pub fn apply_hover<S: MapSurface>(
        &self,
        registry: &FeatureRegistry,
        surface: &mut S,
        name: &str,
    ) -> Result<(), RegistryError> {
        let feature = registry.get(name)?;
        if feature.selected {
            return Ok(());
        }
        paint(surface, &feature.layers, self.highlight_color(feature.baseline));
        Ok(())
    }

    pub fn clear_hover<S: MapSurface>(
        &self,
        registry: &FeatureRegistry,
        surface: &mut S,
        name: &str,
    ) -> Result<(), RegistryError> {
        let feature = registry.get(name)?;
        if feature.selected {
            return Ok(());
        }
        paint(surface, &feature.layers, feature.baseline);
        Ok(())
    }

    pub fn apply_selected<S: MapSurface>(
        &self,
        registry: &mut FeatureRegistry,
        surface: &mut S,
        name: &str,
    ) -> Result<(), RegistryError> {
        let feature = registry.get_mut(name)?;
        paint(surface, &feature.layers, self.highlight_color(feature.baseline));
        feature.selected = true;
        Ok(())
    }

    pub fn clear_selected<S: MapSurface>(
        &self,
        registry: &mut FeatureRegistry,
        surface: &mut S,
        name: &str,
    ) -> Result<(), RegistryError> {
        let feature = registry.get_mut(name)?;
        paint(surface, &feature.layers, feature.baseline);
        feature.selected = false;
        Ok(())
    }
}

fn paint<S: MapSurface>(surface: &mut S, layers: &[LayerId], fill: Rgb) {
    for &layer in layers {
        surface.set_fill(layer, fill);
    }
}
