//! Browser host for the member cloud.
//!
//! Finds the team section on the page, builds a [`CloudCore`], and drives it
//! from `requestAnimationFrame` and pointer events. Every [`Action`] the core
//! returns is written to the member images here; the host holds no cloud
//! state of its own beyond the element handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement, MouseEvent, TouchEvent};

use crate::config::CloudConfig;
use crate::consts::{DRAGGING_CLASS, NOMINAL_FRAME_MS, RELEASE_TRANSITION, SNAPPING_CLASS};
use crate::engine::{Action, CloudCore};
use crate::geom::Rect;
use crate::input::PointerSample;
use crate::member::{MemberId, MemberStyle, MotionKind, Ring};
use crate::roster::Roster;

const SECTION_SELECTOR: &str = ".team-section";
const CLOUD_SELECTOR: &str = ".team-members-cloud";
const FRAME_SELECTOR: &str = ".team-container";
const CONFIG_ATTRIBUTE: &str = "data-cloud-config";

/// Errors raised while mounting the cloud or writing to the page.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("missing element `{0}`")]
    MissingElement(&'static str),
    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for CloudError {
    fn from(value: JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<CloudError> for JsValue {
    fn from(err: CloudError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

type SharedHost = Rc<RefCell<Host>>;

/// Page handles plus the core they mirror.
struct Host {
    core: CloudCore,
    document: Document,
    /// Element the member images live in; positions are relative to its center.
    cloud: Element,
    /// Element whose client rectangle centers the proximity effect.
    frame: Element,
    elements: HashMap<MemberId, HtmlElement>,
    last_frame_ms: Option<f64>,
}

/// Entry point: installs logging and mounts the cloud if the page has one.
///
/// # Errors
///
/// Fails with the message of the [`CloudError`] raised by [`mount`].
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    mount().map_err(JsValue::from)
}

/// Mount the cloud into the current document. A page without a team section
/// is left untouched.
///
/// # Errors
///
/// Returns [`CloudError::MissingElement`] without a window or document, and
/// [`CloudError::Js`] when a DOM query or listener registration throws.
pub fn mount() -> Result<(), CloudError> {
    let window = web_sys::window().ok_or(CloudError::MissingElement("window"))?;
    let document = window.document().ok_or(CloudError::MissingElement("document"))?;

    let (Some(section), Some(cloud)) = (
        document.query_selector(SECTION_SELECTOR)?,
        document.query_selector(CLOUD_SELECTOR)?,
    ) else {
        log::debug!("no team section on this page");
        return Ok(());
    };
    let frame = document.query_selector(FRAME_SELECTOR)?.unwrap_or_else(|| cloud.clone());

    let config = read_config(&cloud);
    let seed = js_sys::Math::random().to_bits() ^ js_sys::Date::now().to_bits();
    let core = CloudCore::new(config, Roster::default(), StdRng::seed_from_u64(seed));

    let host = Rc::new(RefCell::new(Host {
        core,
        document: document.clone(),
        cloud,
        frame,
        elements: HashMap::new(),
        last_frame_ms: None,
    }));

    let actions = host.borrow_mut().core.init();
    if actions.is_empty() {
        return Ok(());
    }
    apply(&host, actions);

    bind_document(&host, &document)?;
    bind_window(&host, &window)?;
    bind_section(&host, &section)?;
    start_frame_loop(host)?;
    log::info!("team cloud mounted");
    Ok(())
}

/// Config from the optional JSON attribute on the cloud element. Invalid
/// documents fall back to the defaults.
fn read_config(cloud: &Element) -> CloudConfig {
    let Some(json) = cloud.get_attribute(CONFIG_ATTRIBUTE) else {
        return CloudConfig::default();
    };
    match CloudConfig::from_json(&json) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring {CONFIG_ATTRIBUTE}: {err}");
            CloudConfig::default()
        }
    }
}

// =============================================================
// Applying actions
// =============================================================

/// Write `actions` to the page. A failed write is logged and the rest still
/// apply.
fn apply(host: &SharedHost, actions: Vec<Action>) {
    for action in actions {
        let result = match action {
            Action::MemberCreated { id, src, ring, shake_offset_s } => create_member(host, id, &src, ring, shake_offset_s),
            other => host.borrow_mut().apply(&other),
        };
        if let Err(err) = result {
            log::warn!("cloud update failed: {err}");
        }
    }
}

fn create_member(host: &SharedHost, id: MemberId, src: &str, ring: Ring, shake_offset_s: f64) -> Result<(), CloudError> {
    let element = {
        let mut h = host.borrow_mut();
        let element: HtmlElement = h
            .document
            .create_element("img")?
            .dyn_into()
            .map_err(|_| CloudError::Js("created img is not an HtmlElement".into()))?;
        element.set_attribute("src", src)?;
        element.set_class_name(&ring.css_class());
        element.style().set_property("animation-delay", &format!("-{shake_offset_s}s"))?;
        h.cloud.append_child(&element)?;
        h.elements.insert(id, element.clone());
        element
    };
    bind_member(host, id, &element)
}

impl Host {
    fn element(&self, id: MemberId) -> Result<&HtmlElement, CloudError> {
        self.elements.get(&id).ok_or(CloudError::MissingElement("member image"))
    }

    fn apply(&mut self, action: &Action) -> Result<(), CloudError> {
        match action {
            Action::ClearContainer => {
                self.cloud.set_inner_html("");
                self.elements.clear();
            }
            Action::MemberCreated { .. } => {}
            Action::Move { id, position } => {
                let style = self.element(*id)?.style();
                style.set_property("left", &format!("calc(50% + {}px)", position.x))?;
                style.set_property("top", &format!("calc(50% + {}px)", position.y))?;
            }
            Action::Reveal { id } => {
                self.element(*id)?.style().set_property("opacity", "1")?;
            }
            Action::Restyle { id, style } => write_style(self.element(*id)?, style)?,
            Action::MotionChanged { id, motion } => {
                let element = self.element(*id)?;
                let classes = element.class_list();
                match motion {
                    MotionKind::Dragging => {
                        classes.add_1(DRAGGING_CLASS)?;
                        element.style().set_property("transition", "none")?;
                    }
                    MotionKind::Snapping => {
                        classes.remove_1(DRAGGING_CLASS)?;
                        classes.add_1(SNAPPING_CLASS)?;
                        element.style().set_property("transition", RELEASE_TRANSITION)?;
                    }
                    MotionKind::Orbiting => classes.remove_1(SNAPPING_CLASS)?,
                }
            }
        }
        Ok(())
    }

    fn frame_rect(&self) -> Rect {
        let r = self.frame.get_bounding_client_rect();
        Rect::new(r.left(), r.top(), r.width(), r.height())
    }
}

fn write_style(element: &HtmlElement, style: &MemberStyle) -> Result<(), CloudError> {
    let css = element.style();
    css.set_property("translate", &format!("{}px {}px", style.shift.x, style.shift.y))?;
    css.set_property("scale", &style.scale.to_string())?;
    match style.z_index {
        Some(z) => css.set_property("z-index", &z.to_string())?,
        None => {
            css.remove_property("z-index")?;
        }
    }
    if style.pointer_cursor {
        css.set_property("cursor", "pointer")?;
    } else {
        css.remove_property("cursor")?;
    }
    Ok(())
}

// =============================================================
// Event wiring
// =============================================================

fn mouse_sample(event: &MouseEvent) -> PointerSample {
    PointerSample::mouse(f64::from(event.client_x()), f64::from(event.client_y()))
}

fn touch_sample(event: &TouchEvent) -> Option<PointerSample> {
    let touch = event.touches().get(0)?;
    Some(PointerSample::touch(f64::from(touch.client_x()), f64::from(touch.client_y())))
}

/// Register `callback` with `passive: false` so it may cancel scrolling.
fn listen_active(target: &EventTarget, event: &str, callback: &JsValue) -> Result<(), CloudError> {
    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    target.add_event_listener_with_callback_and_add_event_listener_options(event, callback.unchecked_ref(), &options)?;
    Ok(())
}

fn bind_member(host: &SharedHost, id: MemberId, element: &HtmlElement) -> Result<(), CloudError> {
    let h = Rc::clone(host);
    let on_mouse_down = Closure::wrap(Box::new(move |e: MouseEvent| {
        e.prevent_default();
        let actions = h.borrow_mut().core.on_pointer_down(id, mouse_sample(&e));
        apply(&h, actions);
    }) as Box<dyn FnMut(MouseEvent)>);
    element.add_event_listener_with_callback("mousedown", on_mouse_down.as_ref().unchecked_ref())?;
    on_mouse_down.forget();

    let h = Rc::clone(host);
    let on_touch_start = Closure::wrap(Box::new(move |e: TouchEvent| {
        e.prevent_default();
        let Some(sample) = touch_sample(&e) else {
            return;
        };
        let actions = h.borrow_mut().core.on_pointer_down(id, sample);
        apply(&h, actions);
    }) as Box<dyn FnMut(TouchEvent)>);
    listen_active(element, "touchstart", on_touch_start.as_ref())?;
    on_touch_start.forget();
    Ok(())
}

/// Releases the current drag; used for every pointer-up style event.
fn release_closure(host: &SharedHost, cancel: bool) -> Closure<dyn FnMut(Event)> {
    let h = Rc::clone(host);
    Closure::wrap(Box::new(move |_e: Event| {
        let actions = {
            let mut h = h.borrow_mut();
            if cancel { h.core.on_pointer_cancel() } else { h.core.on_pointer_up() }
        };
        apply(&h, actions);
    }) as Box<dyn FnMut(Event)>)
}

fn bind_document(host: &SharedHost, document: &Document) -> Result<(), CloudError> {
    let h = Rc::clone(host);
    let on_mouse_move = Closure::wrap(Box::new(move |e: MouseEvent| {
        let actions = {
            let mut h = h.borrow_mut();
            if h.core.dragging().is_none() {
                return;
            }
            h.core.on_pointer_move(mouse_sample(&e))
        };
        e.prevent_default();
        apply(&h, actions);
    }) as Box<dyn FnMut(MouseEvent)>);
    document.add_event_listener_with_callback("mousemove", on_mouse_move.as_ref().unchecked_ref())?;
    on_mouse_move.forget();

    let h = Rc::clone(host);
    let on_touch_move = Closure::wrap(Box::new(move |e: TouchEvent| {
        let actions = {
            let mut h = h.borrow_mut();
            if h.core.dragging().is_none() {
                return;
            }
            let Some(sample) = touch_sample(&e) else {
                return;
            };
            h.core.on_pointer_move(sample)
        };
        e.prevent_default();
        apply(&h, actions);
    }) as Box<dyn FnMut(TouchEvent)>);
    listen_active(document, "touchmove", on_touch_move.as_ref())?;
    on_touch_move.forget();

    for (event, cancel) in [("mouseup", false), ("touchend", false), ("touchcancel", true)] {
        let release = release_closure(host, cancel);
        document.add_event_listener_with_callback(event, release.as_ref().unchecked_ref())?;
        release.forget();
    }
    Ok(())
}

fn bind_window(host: &SharedHost, window: &web_sys::Window) -> Result<(), CloudError> {
    // Catches releases outside the document, such as over browser chrome.
    let release = release_closure(host, false);
    window.add_event_listener_with_callback("mouseup", release.as_ref().unchecked_ref())?;
    release.forget();
    Ok(())
}

fn bind_section(host: &SharedHost, section: &Element) -> Result<(), CloudError> {
    let h = Rc::clone(host);
    let on_hover = Closure::wrap(Box::new(move |e: MouseEvent| {
        let actions = {
            let mut h = h.borrow_mut();
            let rect = h.frame_rect();
            h.core.on_hover(mouse_sample(&e), rect)
        };
        apply(&h, actions);
    }) as Box<dyn FnMut(MouseEvent)>);
    section.add_event_listener_with_callback("mousemove", on_hover.as_ref().unchecked_ref())?;
    on_hover.forget();
    Ok(())
}

// =============================================================
// Frame loop
// =============================================================

fn start_frame_loop(host: SharedHost) -> Result<(), CloudError> {
    let window = web_sys::window().ok_or(CloudError::MissingElement("window"))?;
    let holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let holder_for_cb = Rc::clone(&holder);

    let cb = Closure::wrap(Box::new(move |ts: f64| {
        let actions = {
            let mut h = host.borrow_mut();
            let elapsed = h.last_frame_ms.map_or(NOMINAL_FRAME_MS, |last| ts - last);
            h.last_frame_ms = Some(ts);
            h.core.tick(elapsed)
        };
        apply(&host, actions);

        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(cb) = holder_for_cb.borrow().as_ref() {
            if window.request_animation_frame(cb.as_ref().unchecked_ref()).is_err() {
                log::warn!("requestAnimationFrame failed; cloud animation stopped");
            }
        }
    }) as Box<dyn FnMut(f64)>);

    window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    *holder.borrow_mut() = Some(cb);
    Ok(())
}
