use std::cell::RefCell; // RAF id + closure storage
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, Request, RequestInit, RequestMode,
    Response,
};
use yew::prelude::*;

mod color;
mod layout;
mod model;
mod render;
mod state;
mod transition;
mod util;

use model::{RawNode, Tree};
use render::{HEIGHT, Layer, MARGIN_TOP, Viewport, WIDTH, header_title, label_font_size, lerp_rect};
use state::HeatmapState;
use util::{clog, format_number};

const DATA_PATH: &str = "data.json";

/// Fetches and parses the market document. The only fallible startup
/// step; any failure here aborts initialization.
async fn fetch_market(path: &str) -> Result<RawNode, String> {
    let window = web_sys::window().ok_or("no global `window` exists")?;
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::SameOrigin);
    let request = Request::new_with_str_and_init(path, &opts)
        .map_err(|e| format!("bad request for {path}: {e:?}"))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("fetch {path}: {e:?}"))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| format!("fetch {path}: not a Response"))?;
    if !response.ok() {
        return Err(format!("fetch {path}: HTTP {}", response.status()));
    }
    let body = JsFuture::from(
        response
            .text()
            .map_err(|e| format!("fetch {path}: {e:?}"))?,
    )
    .await
    .map_err(|e| format!("read {path}: {e:?}"))?;
    let body = body
        .as_string()
        .ok_or_else(|| format!("read {path}: body is not text"))?;
    serde_json::from_str(&body).map_err(|e| format!("parse {path}: {e}"))
}

/// Paints one rendered level, interpolating every rectangle between its
/// projections under the outgoing and incoming viewports.
fn draw_layer(
    ctx: &CanvasRenderingContext2d,
    layer: &Layer,
    from: &Viewport,
    to: &Viewport,
    t: f64,
    label_alpha: f64,
) {
    for cell in &layer.cells {
        let r = lerp_rect(from.project(cell.rect), to.project(cell.rect), t);
        ctx.set_fill_style_str(cell.color);
        ctx.fill_rect(r.x, MARGIN_TOP + r.y, r.dx, r.dy);
        ctx.set_stroke_style_str("#ffffff");
        ctx.set_line_width(1.0);
        ctx.stroke_rect(r.x, MARGIN_TOP + r.y, r.dx, r.dy);
    }
    // heavier outline around each direct-child group
    ctx.set_stroke_style_str("#ffffff");
    ctx.set_line_width(2.0);
    for label in &layer.labels {
        let r = lerp_rect(from.project(label.rect), to.project(label.rect), t);
        ctx.stroke_rect(r.x, MARGIN_TOP + r.y, r.dx, r.dy);
    }
    if label_alpha <= 0.0 {
        return;
    }
    ctx.set_global_alpha(label_alpha);
    ctx.set_fill_style_str("#ffffff");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for label in &layer.labels {
        let r0 = from.project(label.rect);
        let r1 = to.project(label.rect);
        let len = label.text.chars().count();
        let size0 = label_font_size(r0.dx, r0.dy, len);
        let size1 = label_font_size(r1.dx, r1.dy, len);
        let size = size0 + (size1 - size0) * t;
        if size < 1.0 {
            continue;
        }
        let r = lerp_rect(r0, r1, t);
        ctx.set_font(&format!("{}px sans-serif", size.round()));
        let _ = ctx.fill_text(&label.text, r.x + r.dx / 2.0, MARGIN_TOP + r.y + r.dy / 2.0);
    }
    ctx.set_global_alpha(1.0);
}

fn draw_frame(ctx: &CanvasRenderingContext2d, st: &HeatmapState) {
    ctx.set_fill_style_str("#ffffff");
    ctx.fill_rect(0.0, 0.0, WIDTH, MARGIN_TOP + HEIGHT);

    // header band, colored by the zoom target's rate
    let target = st.tree.get(st.target);
    ctx.set_fill_style_str(color::rate_color(target.rate.unwrap_or(f64::NAN)));
    ctx.fill_rect(0.0, 0.0, WIDTH, MARGIN_TOP);
    ctx.set_fill_style_str("#ffffff");
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.set_font("16px sans-serif");
    let _ = ctx.fill_text(&header_title(&st.tree, st.target), 6.0, 6.0);

    match st.transition.progress() {
        None => draw_layer(ctx, &st.layer, &st.viewport, &st.viewport, 1.0, 1.0),
        Some(t) => {
            // both levels animate under the same interpolation; the old
            // level's labels fade out while the new level's fade in, and
            // the deeper level stacks on top
            let mut layers: Vec<(&Layer, f64)> = Vec::new();
            if let Some(old) = &st.old_layer {
                layers.push((old, 1.0 - t));
            }
            layers.push((&st.layer, t));
            layers.sort_by_key(|(layer, _)| layer.depth);
            for (layer, alpha) in layers {
                draw_layer(ctx, layer, &st.old_viewport, &st.viewport, t, alpha);
            }
        }
    }
}

fn show_tooltip(el: &HtmlElement, name: &str, value: f64, rate: Option<f64>, x: f64, y: f64) {
    let rate = rate.map(|r| r.to_string()).unwrap_or_default();
    el.set_inner_html(&format!(
        "<h3>{}</h3><table><tr><td>{}</td><td> ({}%)</td></tr></table>",
        name,
        format_number(value),
        rate
    ));
    let style = el.style();
    let _ = style.set_property("transition", "opacity 0.2s");
    let _ = style.set_property("left", &format!("{}px", x + 20.0));
    let _ = style.set_property("top", &format!("{}px", y - 60.0));
    let _ = style.set_property("opacity", "1");
}

fn hide_tooltip(el: &HtmlElement) {
    let style = el.style();
    let _ = style.set_property("transition", "opacity 0.5s");
    let _ = style.set_property("opacity", "0");
}

#[derive(Properties, PartialEq, Clone)]
struct HeatmapProps {
    pub tree: Tree,
}

#[function_component(HeatmapView)]
fn heatmap_view(props: &HeatmapProps) -> Html {
    let canvas_ref = use_node_ref();
    let tooltip_ref = use_node_ref();
    let state = use_mut_ref({
        let tree = props.tree.clone();
        move || HeatmapState::new(tree)
    });

    {
        let canvas_ref = canvas_ref.clone();
        let tooltip_ref = tooltip_ref.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window().expect("no global `window` exists");
            let canvas: HtmlCanvasElement = canvas_ref
                .cast::<HtmlCanvasElement>()
                .expect("canvas_ref not attached to a canvas element");
            canvas.set_width(WIDTH as u32);
            canvas.set_height((MARGIN_TOP + HEIGHT) as u32);
            let tooltip: HtmlElement = tooltip_ref
                .cast::<HtmlElement>()
                .expect("tooltip_ref not attached to an element");

            // Click: drill into a child, or back out via the header band.
            let click_cb = {
                let state = state.clone();
                let tooltip = tooltip.clone();
                Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                    let mut st = state.borrow_mut();
                    st.click(e.offset_x() as f64, e.offset_y() as f64);
                    drop(st);
                    hide_tooltip(&tooltip);
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("click", click_cb.as_ref().unchecked_ref())
                .unwrap();

            // Hover: tooltip near the cursor for the hovered entry.
            let mousemove_cb = {
                let state = state.clone();
                let tooltip = tooltip.clone();
                Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                    let x = e.offset_x() as f64;
                    let y = e.offset_y() as f64;
                    let st = state.borrow();
                    match st.hover(x, y) {
                        Some(id) => {
                            let node = st.tree.get(id);
                            show_tooltip(&tooltip, &node.name, node.value, node.rate, x, y);
                        }
                        None => hide_tooltip(&tooltip),
                    }
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                )
                .unwrap();

            let mouseout_cb = {
                let tooltip = tooltip.clone();
                Closure::wrap(Box::new(move |_e: web_sys::MouseEvent| {
                    hide_tooltip(&tooltip);
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("mouseout", mouseout_cb.as_ref().unchecked_ref())
                .unwrap();

            // Animation frame loop: advance the transition clock, repaint.
            let raf_id = Rc::new(RefCell::new(None));
            let last_frame = Rc::new(RefCell::new(js_sys::Date::now()));
            let closure_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> =
                Rc::new(RefCell::new(None));
            {
                let raf_id_loop = raf_id.clone();
                let closure_cell_loop = closure_cell.clone();
                let state_loop = state.clone();
                let canvas_loop = canvas.clone();
                let window_loop = window.clone();
                let last_frame_loop = last_frame.clone();
                *closure_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                    let now = js_sys::Date::now();
                    let dt = now - *last_frame_loop.borrow();
                    *last_frame_loop.borrow_mut() = now;
                    state_loop.borrow_mut().advance(dt);
                    if let Some(ctx) = canvas_loop
                        .get_context("2d")
                        .ok()
                        .flatten()
                        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
                    {
                        draw_frame(&ctx, &state_loop.borrow());
                    }
                    // schedule next frame
                    if let Ok(id) = window_loop.request_animation_frame(
                        closure_cell_loop
                            .borrow()
                            .as_ref()
                            .unwrap()
                            .as_ref()
                            .unchecked_ref(),
                    ) {
                        *raf_id_loop.borrow_mut() = Some(id);
                    }
                }) as Box<dyn FnMut()>));
                // kick off
                if let Ok(id) = window.request_animation_frame(
                    closure_cell
                        .borrow()
                        .as_ref()
                        .unwrap()
                        .as_ref()
                        .unchecked_ref(),
                ) {
                    *raf_id.borrow_mut() = Some(id);
                }
            }

            // Cleanup for all listeners and the frame loop.
            let window_cleanup = window.clone();
            move || {
                let _ = canvas
                    .remove_event_listener_with_callback("click", click_cb.as_ref().unchecked_ref());
                let _ = canvas.remove_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "mouseout",
                    mouseout_cb.as_ref().unchecked_ref(),
                );
                if let Some(id) = *raf_id.borrow() {
                    let _ = window_cleanup.cancel_animation_frame(id);
                }
                // keep closures alive until here so they aren't dropped early
                let _keep_alive = (&click_cb, &mousemove_cb, &mouseout_cb, &closure_cell);
            }
        });
    }

    html! {
        <div id="heatmap" style="position:relative; width:1100px; height:700px;">
            <canvas ref={canvas_ref.clone()} style="display:block;"></canvas>
            <div
                ref={tooltip_ref.clone()}
                id="tooltip"
                style="position:absolute; left:0; top:0; pointer-events:none; opacity:0; background:rgba(22,27,34,0.92); color:#fff; border:1px solid #30363d; border-radius:6px; padding:4px 10px;"
            ></div>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let market = use_state(|| None::<Result<Tree, String>>);

    {
        let market = market.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match fetch_market(DATA_PATH).await {
                    Ok(raw) => {
                        let tree = Tree::from_raw(&raw);
                        clog(&format!("loaded {DATA_PATH}: {} nodes", tree.len()));
                        market.set(Some(Ok(tree)));
                    }
                    Err(e) => {
                        web_sys::console::error_1(&JsValue::from_str(&e));
                        market.set(Some(Err(e)));
                    }
                }
            });
            || ()
        });
    }

    html! {
        <div id="root">
            {
                match &*market {
                    Some(Ok(tree)) => html! { <HeatmapView tree={tree.clone()} /> },
                    // a load failure is fatal: nothing is rendered
                    Some(Err(_)) => html! {},
                    None => html! { <div id="heatmap"></div> },
                }
            }
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
