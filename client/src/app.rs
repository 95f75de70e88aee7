use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use regioni_shared::{DEFAULT_REGION_KEY, FeatureCollection, GENERAL_INFO_PATH, GeneralInfo};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::canvas::{CanvasSurface, MapCanvas};
use crate::controller::MapController;
use crate::fetch::{HttpInfoService, InfoPipeline, Spawner, StaleResponsePolicy};
use crate::highlight::{DEFAULT_DARKEN_PERCENT, HighlightController};
use crate::info_panel::{self, PANEL_ID, SignalPanel};

pub type AppController = MapController<CanvasSurface, HttpInfoService, SignalPanel>;

pub const DEFAULT_DATASET_PATH: &str = "/data/limits_IT_regions.geojson";
const MAP_CONTAINER_ID: &str = "map-container";
const MAP_LOGO_ID: &str = "map-logo";
const RESIZE_DEBOUNCE_MS: u32 = 100;
const DEFAULT_GENERAL: &str = "Select a region to learn more about it.";

/// Page-level settings read from `data-*` attributes on the mount element.
#[derive(Debug, Clone, PartialEq)]
pub struct BootConfig {
    pub dataset_path: String,
    pub region_key: String,
    pub darken_percent: f64,
    pub stale_policy: StaleResponsePolicy,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            dataset_path: DEFAULT_DATASET_PATH.to_string(),
            region_key: DEFAULT_REGION_KEY.to_string(),
            darken_percent: DEFAULT_DARKEN_PERCENT,
            stale_policy: StaleResponsePolicy::default(),
        }
    }
}

impl BootConfig {
    /// Unset, blank or unparsable attributes keep their defaults.
    pub fn from_attributes(attribute: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |name: &str| {
            attribute(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            dataset_path: value("data-geojson-path").unwrap_or(defaults.dataset_path),
            region_key: value("data-region-key").unwrap_or(defaults.region_key),
            darken_percent: value("data-darken-percent")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.darken_percent),
            stale_policy: match value("data-stale-responses").as_deref() {
                Some("latest-issue") => StaleResponsePolicy::LatestIssueWins,
                Some("last-completion") => StaleResponsePolicy::LastCompletionWins,
                _ => defaults.stale_policy,
            },
        }
    }

    pub fn from_element(element: &web_sys::Element) -> Self {
        Self::from_attributes(|name| element.get_attribute(name))
    }
}

struct DocumentClickBinding {
    document: web_sys::Document,
    handler: Closure<dyn Fn(web_sys::MouseEvent)>,
}

impl Drop for DocumentClickBinding {
    fn drop(&mut self) {
        let _ = self
            .document
            .remove_event_listener_with_callback("click", self.handler.as_ref().unchecked_ref());
    }
}

struct ResizeBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

impl Drop for ResizeBinding {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static DOCUMENT_CLICK_BINDING: RefCell<Option<DocumentClickBinding>> = const { RefCell::new(None) };
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Assemble the controller around the info panel's signal.
pub fn build_controller(
    document: &web_sys::Document,
    config: &BootConfig,
    panel: SignalPanel,
) -> Rc<RefCell<AppController>> {
    let general = info_panel::general_text(document).unwrap_or_else(|e| {
        log::warn!("{e}; using built-in introduction");
        DEFAULT_GENERAL.to_string()
    });
    let spawner: Spawner = Rc::new(|future: LocalBoxFuture<'static, ()>| {
        wasm_bindgen_futures::spawn_local(future)
    });
    let pipeline = InfoPipeline::new(Rc::new(HttpInfoService::default()), Rc::new(panel), spawner)
        .with_policy(config.stale_policy);
    let controller = MapController::new(CanvasSurface::new(), pipeline, general)
        .with_highlight(HighlightController::new(config.darken_percent));
    Rc::new(RefCell::new(controller))
}

#[component]
pub fn App(controller: Rc<RefCell<AppController>>, config: BootConfig) -> impl IntoView {
    controller.borrow().show_general();

    load_dataset(controller.clone(), config);
    load_general_info(controller.clone());
    bind_document_click(controller.clone());
    bind_window_resize(controller.clone());

    view! { <MapCanvas controller=controller /> }
}

fn load_dataset(controller: Rc<RefCell<AppController>>, config: BootConfig) {
    wasm_bindgen_futures::spawn_local(async move {
        let collection = match fetch_dataset(&config.dataset_path).await {
            Ok(collection) => collection,
            Err(e) => {
                log::error!("failed to load {}: {e}", config.dataset_path);
                return;
            }
        };
        let mut controller = controller.borrow_mut();
        let layers = controller.load(&collection, &config.region_key);
        if controller.registry().is_empty() {
            log::warn!(
                "no feature in {} has a {:?} property",
                config.dataset_path,
                config.region_key
            );
        }
        controller.surface_mut().refresh();
        log::info!(
            "loaded {} regions ({layers} layers) from {}",
            controller.registry().len(),
            config.dataset_path
        );
    });
}

async fn fetch_dataset(path: &str) -> Result<FeatureCollection, String> {
    let resp = gloo_net::http::Request::get(path)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<FeatureCollection>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// The server always answers with some introduction; on transport failure the
/// page's own general content stays.
fn load_general_info(controller: Rc<RefCell<AppController>>) {
    wasm_bindgen_futures::spawn_local(async move {
        match fetch_general_info().await {
            Ok(general) => controller.borrow_mut().set_general(general.info),
            Err(e) => log::warn!("general introduction unavailable: {e}"),
        }
    });
}

async fn fetch_general_info() -> Result<GeneralInfo, String> {
    let resp = gloo_net::http::Request::get(GENERAL_INFO_PATH)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<GeneralInfo>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Clicks outside both the map and the panel, or on the logo, revert.
fn bind_document_click(controller: Rc<RefCell<AppController>>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    let lookup = document.clone();
    let handler = Closure::<dyn Fn(web_sys::MouseEvent)>::new(move |e: web_sys::MouseEvent| {
        let Some(target) = e.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok()) else {
            return;
        };
        // Targets detached by a panel repaint were inside the panel.
        if !target.is_connected() {
            return;
        }
        let inside = |id: &str| {
            lookup
                .get_element_by_id(id)
                .is_some_and(|el| el.contains(Some(&target)))
        };
        if inside(MAP_LOGO_ID) || (!inside(MAP_CONTAINER_ID) && !inside(PANEL_ID)) {
            let mut controller = controller.borrow_mut();
            if let Some(name) = controller.selected() {
                log::debug!("deselecting {name}");
            }
            controller.revert();
        }
    });

    if document
        .add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
        .is_ok()
    {
        DOCUMENT_CLICK_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(DocumentClickBinding { document, handler });
        });
    }
}

/// Refit the map once the window stops resizing.
fn bind_window_resize(controller: Rc<RefCell<AppController>>) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let pending: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
    let handler = Closure::<dyn Fn()>::new(move || {
        let controller = controller.clone();
        // Dropping the previous timeout cancels it.
        *pending.borrow_mut() = Some(Timeout::new(RESIZE_DEBOUNCE_MS, move || {
            controller.borrow_mut().surface_mut().resize();
        }));
    });

    if window
        .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
        .is_ok()
    {
        RESIZE_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(ResizeBinding { window, handler });
        });
    }
}
