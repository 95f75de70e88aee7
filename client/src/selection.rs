use crate::highlight::{HighlightController, MapSurface};
use crate::registry::{FeatureRegistry, RegistryError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    NoSelection,
    Selected(String),
}

/// Single source of truth for which region, if any, is selected.
///
/// Holds the region by name only; styling lives in the [`FeatureRegistry`] and
/// is changed exclusively through the [`HighlightController`].
#[derive(Debug, Default)]
pub struct SelectionTracker {
    state: SelectionState,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn current(&self) -> Option<&str> {
        match self.state() {
            SelectionState::NoSelection => None,
            SelectionState::Selected(name) => Some(name),
        }
    }

    /// Select `name`, un-styling the previous selection first.
    ///
    /// Clicking the already-selected region runs the full transition again
    /// (clear then re-apply); callers re-issue the fetch as well.
    pub fn select<S: MapSurface>(
        &mut self,
        name: &str,
        registry: &mut FeatureRegistry,
        surface: &mut S,
        highlight: &HighlightController,
    ) -> Result<(), RegistryError> {
        // Reject unknown names before touching the current selection.
        registry.get(name)?;

        if let SelectionState::Selected(previous) = &self.state {
            highlight.clear_selected(registry, surface, previous)?;
        }
        highlight.apply_selected(registry, surface, name)?;
        self.state = SelectionState::Selected(name.to_owned());
        Ok(())
    }

    /// Clear the selection. Returns `false` when nothing was selected, in
    /// which case nothing is touched.
    pub fn revert<S: MapSurface>(
        &mut self,
        registry: &mut FeatureRegistry,
        surface: &mut S,
        highlight: &HighlightController,
    ) -> Result<bool, RegistryError> {
        let SelectionState::Selected(previous) = std::mem::take(&mut self.state) else {
            return Ok(false);
        };
        highlight.clear_selected(registry, surface, &previous)?;
        Ok(true)
    }
}
