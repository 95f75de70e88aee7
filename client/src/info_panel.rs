use leptos::prelude::*;
use thiserror::Error;
use web_sys::Document;

use crate::panel::{PanelSink, PanelView, RETRY_LABEL};

pub const PANEL_ID: &str = "info-box";
pub const GENERAL_ID: &str = "general-info";
pub const TEMPLATE_ID: &str = "region-template";
pub const NAME_SLOT_ID: &str = "region-name-placeholder";
pub const BODY_SLOT_ID: &str = "region-info-placeholder";

/// Shown in place of the region card when it cannot be built.
pub const RENDER_FALLBACK: &str = "Failed to load region information.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("page element #{0} is missing")]
    MissingElement(&'static str),
}

/// Slots of the page's `#region-template`, carried over as CSS classes on
/// the rendered card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTemplate {
    name_class: String,
    body_class: String,
}

impl RegionTemplate {
    /// `class_of(id)` yields the class list of the element with that id, or
    /// `None` when the page lacks it.
    pub fn from_slots(class_of: impl Fn(&str) -> Option<String>) -> Result<Self, RenderError> {
        class_of(TEMPLATE_ID).ok_or(RenderError::MissingElement(TEMPLATE_ID))?;
        let name_class = class_of(NAME_SLOT_ID).ok_or(RenderError::MissingElement(NAME_SLOT_ID))?;
        let body_class = class_of(BODY_SLOT_ID).ok_or(RenderError::MissingElement(BODY_SLOT_ID))?;
        Ok(Self {
            name_class,
            body_class,
        })
    }

    pub fn locate(document: &Document) -> Result<Self, RenderError> {
        Self::from_slots(|id| document.get_element_by_id(id).map(|el| el.class_name()))
    }
}

/// What the panel puts on screen for one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelContent {
    General(Vec<String>),
    Card {
        name: String,
        name_class: String,
        body: String,
        body_class: String,
        retry: bool,
    },
    Fallback,
}

pub fn panel_content(view: &PanelView, template: &Result<RegionTemplate, RenderError>) -> PanelContent {
    let Some(name) = view.region_name() else {
        return PanelContent::General(paragraphs(view.body_text()));
    };
    let template = match template {
        Ok(template) => template,
        Err(e) => {
            log::error!("failed to render panel: {e}");
            return PanelContent::Fallback;
        }
    };
    PanelContent::Card {
        name: name.to_owned(),
        name_class: template.name_class.clone(),
        body: view.body_text().to_owned(),
        body_class: join_classes(&template.body_class, view.state_class()),
        retry: view.retry().is_some(),
    }
}

fn join_classes(base: &str, state: &str) -> String {
    if base.trim().is_empty() {
        state.to_owned()
    } else {
        format!("{} {state}", base.trim())
    }
}

/// Blank-line separated blocks, whitespace collapsed.
pub fn paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|block| !block.is_empty())
        .collect()
}

/// Text of the page's `#general-info` block, one paragraph per child element.
pub fn general_text(document: &Document) -> Result<String, RenderError> {
    let block = document
        .get_element_by_id(GENERAL_ID)
        .ok_or(RenderError::MissingElement(GENERAL_ID))?;

    let mut blocks = Vec::new();
    let mut child = block.first_element_child();
    while let Some(el) = child {
        if let Some(text) = el.text_content() {
            blocks.push(text);
        }
        child = el.next_element_sibling();
    }
    if blocks.is_empty() {
        blocks.extend(block.text_content());
    }
    Ok(blocks.join("\n\n"))
}

/// Panel sink backed by a signal the `InfoPanel` component renders.
#[derive(Debug, Clone, Copy)]
pub struct SignalPanel {
    content: RwSignal<PanelView, LocalStorage>,
}

impl SignalPanel {
    pub fn new() -> Self {
        Self {
            content: RwSignal::new_local(PanelView::General(String::new())),
        }
    }
}

impl Default for SignalPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelSink for SignalPanel {
    fn show(&self, view: PanelView) {
        self.content.set(view);
    }
}

#[component]
pub fn InfoPanel(panel: SignalPanel, template: Result<RegionTemplate, RenderError>) -> impl IntoView {
    let content = panel.content;

    // The retry action is read at click time so the view holds no closure
    // over it.
    let on_retry = move |_: leptos::ev::MouseEvent| {
        if let Some(action) = content.with_untracked(|view| view.retry().cloned()) {
            log::debug!("retrying lookup for {}", action.region());
            action.invoke();
        }
    };

    move || match panel_content(&content.get(), &template) {
        PanelContent::General(blocks) => view! {
            <div class="general">
                {blocks.into_iter().map(|block| view! { <p>{block}</p> }).collect_view()}
            </div>
        }
        .into_any(),
        PanelContent::Card {
            name,
            name_class,
            body,
            body_class,
            retry,
        } => view! {
            <div class="region-card">
                <h2 class=name_class>{name}</h2>
                <p class=body_class>{body}</p>
                {retry.then(|| view! {
                    <button class="retry-button" on:click=on_retry>{RETRY_LABEL}</button>
                })}
            </div>
        }
        .into_any(),
        PanelContent::Fallback => view! { <p class="error">{RENDER_FALLBACK}</p> }.into_any(),
    }
}
