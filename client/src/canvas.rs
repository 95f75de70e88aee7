use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use regioni_shared::Geometry;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent};

use crate::app::AppController;
use crate::colors::rgba_css;
use crate::highlight::MapSurface;
use crate::registry::{LayerId, Rgb};
use crate::spatial::{ProjectedShape, SpatialGrid, world_bounds};
use crate::viewport::Viewport;

const FILL_OPACITY: f64 = 0.7;
const BORDER_COLOR: &str = "black";
const BORDER_WIDTH: f64 = 0.5;

/// Canvas 2D rendition of the region layers.
///
/// Layers are drawn in insertion order, so a later layer covers an earlier one
/// wherever they overlap; hit-testing follows the same order.
#[derive(Default)]
pub struct CanvasSurface {
    shapes: Vec<ProjectedShape>,
    fills: Vec<Rgb>,
    grid: SpatialGrid,
    grid_dirty: bool,
    viewport: Viewport,
    css_size: (f64, f64),
    canvas: Option<HtmlCanvasElement>,
    ctx: Option<CanvasRenderingContext2d>,
}

impl CanvasSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a mounted canvas element and paint what is already loaded.
    pub fn attach(&mut self, canvas: HtmlCanvasElement) -> Result<(), String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| format!("canvas context request failed: {e:?}"))?
            .ok_or_else(|| "canvas has no 2d context".to_string())?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "2d context has an unexpected type".to_string())?;
        self.canvas = Some(canvas);
        self.ctx = Some(ctx);
        self.resize();
        Ok(())
    }

    /// Match the backing store to the element's CSS size, refit and repaint.
    pub fn resize(&mut self) {
        let Some(canvas) = &self.canvas else {
            return;
        };
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
            .max(1.0);
        let css_w = f64::from(canvas.client_width().max(0));
        let css_h = f64::from(canvas.client_height().max(0));
        canvas.set_width((css_w * dpr).round() as u32);
        canvas.set_height((css_h * dpr).round() as u32);
        if let Some(ctx) = &self.ctx {
            // Resizing resets the context transform.
            ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
        }
        self.css_size = (css_w, css_h);
        self.refresh();
    }

    /// Fit the view to every loaded layer and repaint.
    pub fn refresh(&mut self) {
        if let Some(bounds) = world_bounds(&self.shapes) {
            let (w, h) = self.css_size;
            self.viewport.fit_bounds(bounds, w, h);
        }
        self.redraw();
    }

    /// Name of the region drawn at canvas-local CSS pixel coordinates.
    pub fn region_at(&mut self, sx: f64, sy: f64) -> Option<String> {
        if self.grid_dirty {
            self.grid = SpatialGrid::build(&self.shapes);
            self.grid_dirty = false;
        }
        let (wx, wy) = self.viewport.screen_to_world(sx, sy);
        self.grid
            .find_at(&self.shapes, wx, wy)
            .map(|idx| self.shapes[idx].name.clone())
    }

    pub fn set_pointer_cursor(&self, interactive: bool) {
        let Some(canvas) = &self.canvas else {
            return;
        };
        let cursor = if interactive { "pointer" } else { "default" };
        web_sys::HtmlElement::style(canvas)
            .set_property("cursor", cursor)
            .ok();
    }

    fn redraw(&self) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        let (w, h) = self.css_size;
        ctx.clear_rect(0.0, 0.0, w, h);
        ctx.set_line_width(BORDER_WIDTH);
        ctx.set_stroke_style_str(BORDER_COLOR);

        for (shape, &(r, g, b)) in self.shapes.iter().zip(&self.fills) {
            ctx.set_fill_style_str(&rgba_css(r, g, b, FILL_OPACITY));
            ctx.begin_path();
            for ring in shape.polygons.iter().flatten() {
                for (i, &(wx, wy)) in ring.iter().enumerate() {
                    let (sx, sy) = self.viewport.world_to_screen(wx, wy);
                    if i == 0 {
                        ctx.move_to(sx, sy);
                    } else {
                        ctx.line_to(sx, sy);
                    }
                }
                ctx.close_path();
            }
            // Even-odd keeps holes open.
            ctx.fill_with_canvas_winding_rule(web_sys::CanvasWindingRule::Evenodd);
            ctx.stroke();
        }
    }
}

impl MapSurface for CanvasSurface {
    fn add_layer(&mut self, name: &str, geometry: &Geometry, fill: Rgb) -> LayerId {
        self.shapes.push(ProjectedShape::from_geometry(name, geometry));
        self.fills.push(fill);
        self.grid_dirty = true;
        LayerId(self.shapes.len() - 1)
    }

    fn set_fill(&mut self, layer: LayerId, fill: Rgb) {
        let Some(slot) = self.fills.get_mut(layer.0) else {
            log::warn!("fill for unknown layer {}", layer.0);
            return;
        };
        if *slot != fill {
            *slot = fill;
            self.redraw();
        }
    }
}

/// Map canvas wired to the controller: hover tracks the pointer, clicks on a
/// region select it and clicks on empty map revert.
#[component]
pub fn MapCanvas(controller: Rc<RefCell<AppController>>) -> impl IntoView {
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    Effect::new({
        let controller = controller.clone();
        move || {
            let Some(canvas) = canvas_ref.get() else {
                return;
            };
            if let Err(e) = controller.borrow_mut().surface_mut().attach(canvas) {
                log::error!("map canvas unavailable: {e}");
            }
        }
    });

    let on_pointer_move = {
        let controller = controller.clone();
        move |e: PointerEvent| {
            let (x, y) = (f64::from(e.offset_x()), f64::from(e.offset_y()));
            let hit = controller.borrow_mut().surface_mut().region_at(x, y);
            let mut controller = controller.borrow_mut();
            if controller.hovered() != hit.as_deref() {
                controller.surface().set_pointer_cursor(hit.is_some());
                controller.hover(hit.as_deref());
            }
        }
    };

    let on_pointer_leave = {
        let controller = controller.clone();
        move |_: PointerEvent| {
            let mut controller = controller.borrow_mut();
            controller.surface().set_pointer_cursor(false);
            controller.hover(None);
        }
    };

    let on_click = move |e: MouseEvent| {
        let (x, y) = (f64::from(e.offset_x()), f64::from(e.offset_y()));
        let hit = controller.borrow_mut().surface_mut().region_at(x, y);
        match hit {
            Some(name) => controller.borrow_mut().click(&name),
            None => controller.borrow_mut().revert(),
        }
    };

    view! {
        <canvas
            node_ref=canvas_ref
            class="region-map"
            style="display: block; width: 100%; height: 100%; touch-action: manipulation;"
            on:pointermove=on_pointer_move
            on:pointerleave=on_pointer_leave
            on:click=on_click
        />
    }
}
