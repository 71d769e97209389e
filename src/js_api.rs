//! The JS-facing surface: `window.CalendarWidget` with
//! `{ mount, unmount, getDate, setDate, open, close }`.
//!
//! Installation is all-or-nothing: without a browser window and document the
//! module logs one diagnostic and installs nothing, so the page never sees a
//! half-initialized API.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::{Closure, wasm_bindgen};
use zoon::UnwrapThrowExt;
use zoon::eprintln;

use crate::dom;
use crate::error::WidgetError;
use crate::instance;
use crate::picker::PickerOptions;

const API_GLOBAL: &str = "CalendarWidget";

#[wasm_bindgen(start)]
pub fn start() {
    install();
}

/// Resolves a JS target value: an element is used as-is, a string is treated
/// as a selector against the document.
fn resolve_target(value: &JsValue) -> Result<web_sys::Element, WidgetError> {
    if let Some(selector) = value.as_string() {
        let document = dom::document().ok_or(WidgetError::DocumentUnavailable)?;
        return document
            .query_selector(&selector)
            .ok()
            .flatten()
            .ok_or(WidgetError::TargetNotFound(selector));
    }
    value
        .clone()
        .dyn_into::<web_sys::Element>()
        .map_err(|_| WidgetError::TargetNotFound("expected a DOM element or a selector string".to_owned()))
}

fn options_from_js(value: &JsValue) -> PickerOptions {
    let mut options = PickerOptions::default();
    if !value.is_object() {
        return options;
    }
    let string_field = |name: &str| -> Option<String> {
        js_sys::Reflect::get(value, &JsValue::from_str(name))
            .ok()
            .and_then(|field| field.as_string())
    };
    options.initial_date = string_field("initialDate");
    if let Some(locale) = string_field("locale") {
        options.locale = locale;
    }
    if let Some(input_format) = string_field("inputFormat") {
        options.input_format = input_format;
    }
    options
}

fn js_error(error: &WidgetError) -> JsValue {
    js_sys::Error::new(&format!("[calendar-widget] {error}")).into()
}

/// Target resolution failures are usage errors on every API method: thrown,
/// not swallowed.
fn resolve_or_throw(target: &JsValue) -> web_sys::Element {
    resolve_target(target).unwrap_or_else(|error| wasm_bindgen::throw_val(js_error(&error)))
}

fn set_method(api: &js_sys::Object, name: &str, method: &JsValue) {
    js_sys::Reflect::set(api, &JsValue::from_str(name), method).unwrap_throw();
}

/// Builds `window.CalendarWidget`. Returns `false` (and installs nothing)
/// when the host lacks a window or document.
pub fn install() -> bool {
    let Some(window) = dom::window() else {
        eprintln!("[calendar-widget] no browser window; API not installed");
        return false;
    };
    if window.document().is_none() {
        eprintln!("[calendar-widget] no document; API not installed");
        return false;
    }

    let api = js_sys::Object::new();

    let mount = Closure::wrap(Box::new(|target: JsValue, options: JsValue| {
        let host = resolve_or_throw(&target);
        if let Err(error) = instance::mount(&host, options_from_js(&options)) {
            wasm_bindgen::throw_val(js_error(&error));
        }
    }) as Box<dyn Fn(JsValue, JsValue)>);
    set_method(&api, "mount", mount.as_ref());
    mount.forget();

    let unmount = Closure::wrap(Box::new(|target: JsValue| {
        instance::unmount(&resolve_or_throw(&target));
    }) as Box<dyn Fn(JsValue)>);
    set_method(&api, "unmount", unmount.as_ref());
    unmount.forget();

    let open = Closure::wrap(Box::new(|target: JsValue| {
        instance::open(&resolve_or_throw(&target));
    }) as Box<dyn Fn(JsValue)>);
    set_method(&api, "open", open.as_ref());
    open.forget();

    let close = Closure::wrap(Box::new(|target: JsValue| {
        instance::close(&resolve_or_throw(&target));
    }) as Box<dyn Fn(JsValue)>);
    set_method(&api, "close", close.as_ref());
    close.forget();

    let set_date = Closure::wrap(Box::new(|target: JsValue, iso: JsValue| {
        let host = resolve_or_throw(&target);
        let iso = iso.as_string();
        if let Err(error) = instance::set_date(&host, iso.as_deref()) {
            wasm_bindgen::throw_val(js_error(&error));
        }
    }) as Box<dyn Fn(JsValue, JsValue)>);
    set_method(&api, "setDate", set_date.as_ref());
    set_date.forget();

    let get_date = Closure::wrap(Box::new(|target: JsValue| -> JsValue {
        match instance::get_date(&resolve_or_throw(&target)) {
            Some(iso) => JsValue::from_str(&iso),
            None => JsValue::NULL,
        }
    }) as Box<dyn Fn(JsValue) -> JsValue>);
    set_method(&api, "getDate", get_date.as_ref());
    get_date.forget();

    js_sys::Reflect::set(&window, &JsValue::from_str(API_GLOBAL), &api).unwrap_throw();
    true
}
