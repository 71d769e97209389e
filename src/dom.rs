//! Small web-sys helpers shared by the placement engine and the instance
//! controller: RAII event listeners, change-event dispatch and deferred focus.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsValue;
use zoon::eprintln;

/// Name of the bubbling selection-change event dispatched on the host element.
pub const CHANGE_EVENT: &str = "calendar:change";

pub fn window() -> Option<web_sys::Window> {
    web_sys::window()
}

pub fn document() -> Option<web_sys::Document> {
    window().and_then(|window| window.document())
}

/// Layout viewport size in CSS pixels.
pub fn viewport_size() -> Option<(f64, f64)> {
    let window = window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some((width, height))
}

/// A DOM event listener that detaches itself when dropped.
///
/// Placement re-tracking and dismissal listeners are scoped to "panel open";
/// owning them through this guard guarantees release on every exit path
/// (close, unmount, drop of the owning task).
pub struct EventListenerGuard {
    target: web_sys::EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
    capture: bool,
}

impl EventListenerGuard {
    pub fn new(
        target: &web_sys::EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        Self::with_capture(target, event, false, handler)
    }

    /// Capturing listener; `"scroll"` does not bubble, so re-tracking scrolls
    /// at any depth needs the capture phase.
    pub fn capturing(
        target: &web_sys::EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        Self::with_capture(target, event, true, handler)
    }

    fn with_capture(
        target: &web_sys::EventTarget,
        event: &'static str,
        capture: bool,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
        let attached = if capture {
            target.add_event_listener_with_callback_and_bool(
                event,
                callback.as_ref().unchecked_ref(),
                true,
            )
        } else {
            target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        };
        if attached.is_err() {
            eprintln!("[calendar-widget] failed to attach '{event}' listener");
        }
        Self {
            target: target.clone(),
            event,
            callback,
            capture,
        }
    }
}

impl Drop for EventListenerGuard {
    fn drop(&mut self) {
        let _ = if self.capture {
            self.target.remove_event_listener_with_callback_and_bool(
                self.event,
                self.callback.as_ref().unchecked_ref(),
                true,
            )
        } else {
            self.target
                .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        };
    }
}

/// Dispatches the bubbling `calendar:change` event on the host element with
/// `detail = { dateISO, date? }`; `date` is absent when the selection was
/// cleared.
pub fn dispatch_change(host: &web_sys::Element, date_iso: Option<&str>, date: Option<&js_sys::Date>) {
    let detail = js_sys::Object::new();
    let iso_value = match date_iso {
        Some(iso) => JsValue::from_str(iso),
        None => JsValue::NULL,
    };
    let _ = js_sys::Reflect::set(&detail, &JsValue::from_str("dateISO"), &iso_value);
    if let Some(date) = date {
        let _ = js_sys::Reflect::set(&detail, &JsValue::from_str("date"), date.as_ref());
    }
    let init = web_sys::CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(detail.as_ref());
    if let Ok(event) = web_sys::CustomEvent::new_with_event_init_dict(CHANGE_EVENT, &init) {
        let _ = host.dispatch_event(&event);
    }
}

/// Focuses `element` on the next animation frame, after the current render
/// commit has been painted.
pub fn focus_after_render(element: web_sys::HtmlElement) {
    let Some(window) = window() else { return };
    let closure = Closure::once(move || {
        let _ = element.focus();
    });
    if window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .is_ok()
    {
        closure.forget();
    }
}
