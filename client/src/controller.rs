use regioni_shared::{FeatureCollection, category10};

use crate::fetch::{InfoPipeline, InfoService};
use crate::highlight::{HighlightController, MapSurface};
use crate::panel::{PanelSink, render_general};
use crate::registry::{FeatureRegistry, RegistryError};
use crate::selection::SelectionTracker;

/// Application-level owner of the map's interactive state.
///
/// Every UI event goes through here: styling is updated synchronously first,
/// and only then is a lookup dispatched.
pub struct MapController<S, I, P> {
    registry: FeatureRegistry,
    surface: S,
    highlight: HighlightController,
    selection: SelectionTracker,
    pipeline: InfoPipeline<I, P>,
    general: String,
    hovered: Option<String>,
}

impl<S, I, P> MapController<S, I, P>
where
    S: MapSurface,
    I: InfoService + 'static,
    P: PanelSink + 'static,
{
    pub fn new(surface: S, pipeline: InfoPipeline<I, P>, general: impl Into<String>) -> Self {
        Self {
            registry: FeatureRegistry::new(),
            surface,
            highlight: HighlightController::default(),
            selection: SelectionTracker::new(),
            pipeline,
            general: general.into(),
            hovered: None,
        }
    }

    pub fn with_highlight(mut self, highlight: HighlightController) -> Self {
        self.highlight = highlight;
        self
    }

    /// Draw and register every named feature, coloring by position in the
    /// dataset. Skipped features still consume a palette slot. Returns the
    /// number of layers added.
    pub fn load(&mut self, collection: &FeatureCollection, region_key: &str) -> usize {
        let mut added = 0;
        for (index, name, geometry) in collection.named_features(region_key) {
            let baseline = self
                .registry
                .get(name)
                .map(|feature| feature.baseline)
                .unwrap_or_else(|_| category10(index));
            let layer = self.surface.add_layer(name, geometry, baseline);
            self.registry.register(name, layer, baseline);
            added += 1;
        }
        added
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.current()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Paint the general content into the panel.
    pub fn show_general(&self) {
        self.pipeline.panel().show(render_general(&self.general));
    }

    /// Replace the general content; repainted only while nothing is selected.
    pub fn set_general(&mut self, content: impl Into<String>) {
        self.general = content.into();
        if self.selection.current().is_none() {
            self.show_general();
        }
    }

    /// Pointer now over `target` (or over no region).
    pub fn hover(&mut self, target: Option<&str>) {
        if self.hovered.as_deref() == target {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            report(self.highlight.clear_hover(&self.registry, &mut self.surface, &previous));
        }
        if let Some(name) = target {
            report(self.highlight.apply_hover(&self.registry, &mut self.surface, name));
            self.hovered = Some(name.to_owned());
        }
    }

    /// Click on a region: restyle, then look it up.
    pub fn click(&mut self, name: &str) {
        let selected =
            self.selection
                .select(name, &mut self.registry, &mut self.surface, &self.highlight);
        if let Err(e) = selected {
            log::error!("ignoring click: {e}");
            return;
        }
        log::debug!("selected region {name}");
        self.pipeline.fetch(name);
    }

    /// Click outside the map or on its background.
    pub fn revert(&mut self) {
        let reverted = self
            .selection
            .revert(&mut self.registry, &mut self.surface, &self.highlight);
        match reverted {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => log::error!("{e}"),
        }
        self.pipeline.invalidate();
        self.show_general();
    }
}

fn report(result: Result<(), RegistryError>) {
    if let Err(e) = result {
        log::error!("{e}");
    }
}
