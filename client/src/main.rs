mod app;
mod canvas;
mod colors;
mod console;
mod controller;
mod fetch;
mod highlight;
mod info_panel;
mod panel;
mod registry;
mod selection;
mod spatial;
#[cfg(test)]
mod testing;
mod viewport;

use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    console::init();
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        return;
    };
    let panel_host = document
        .get_element_by_id(info_panel::PANEL_ID)
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| {
            log::error!("{}", info_panel::RenderError::MissingElement(info_panel::PANEL_ID));
            document.body()
        });
    let Some(panel_host) = panel_host else {
        return;
    };

    let config = app::BootConfig::from_element(&target);
    let panel = info_panel::SignalPanel::new();
    let template = info_panel::RegionTemplate::locate(&document);
    if let Err(e) = &template {
        log::error!("region details cannot be shown: {e}");
    }
    let controller = app::build_controller(&document, &config, panel);

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop any previous mount so its listeners stop driving the old controller.
        let _old = slot.borrow_mut().take();
        let panel_handle = mount_to(panel_host, move || {
            view! { <info_panel::InfoPanel panel=panel template=template /> }
        });
        let map_handle = mount_to(target, move || view! { <app::App controller=controller config=config /> });
        *slot.borrow_mut() = Some(Box::new((panel_handle, map_handle)));
    });
}
