//! Per-host-element instance lifecycle and the process-wide registry.
//!
//! Each `mount` creates two dedicated render containers (field under the
//! host, panel under `document.body`), builds the picker state, registers
//! its control capabilities, and records everything keyed by a fresh
//! instance id stamped on the host element. Entries are created by `mount`
//! and released exactly by `unmount`; nothing is leaked implicitly. The
//! registry is touched only on the UI thread, so a `thread_local!` map is
//! the whole locking story.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ulid::Ulid;
use zoon::UnwrapThrowExt;
use zoon::start_app;

use crate::date_model::{CalendarDay, parse_iso_local, to_iso_date};
use crate::dom;
use crate::error::WidgetError;
use crate::picker::{DatePicker, PickerControls, PickerOptions};

/// Attribute stamped on a mounted host element, holding its instance id.
pub const INSTANCE_ID_ATTRIBUTE: &str = "data-calendar-widget-id";

const FIELD_CONTAINER_CLASS: &str = "calendar-widget-host";
const PANEL_CONTAINER_CLASS: &str = "calendar-widget-panel-host";

struct InstanceRecord {
    host: web_sys::Element,
    field_container: web_sys::Element,
    panel_container: web_sys::Element,
    /// Last committed selection as canonical ISO, readable synchronously
    /// without touching the render tree.
    last_iso: Rc<RefCell<Option<String>>>,
    controls: Rc<PickerControls>,
    /// Keeps the reactive state and its open-panel subscription watcher
    /// alive for the instance's lifetime.
    _picker: DatePicker,
}

thread_local! {
    static INSTANCES: RefCell<BTreeMap<String, InstanceRecord>> = RefCell::new(BTreeMap::new());
}

fn instance_id(host: &web_sys::Element) -> Option<String> {
    host.get_attribute(INSTANCE_ID_ATTRIBUTE)
}

fn is_mounted(host: &web_sys::Element) -> bool {
    instance_id(host)
        .map(|id| INSTANCES.with(|instances| instances.borrow().contains_key(&id)))
        .unwrap_or(false)
}

/// Clones the handles needed by a control call, without holding the registry
/// borrow while user-visible effects (event dispatch) run.
fn control_handles(
    host: &web_sys::Element,
) -> Option<(Rc<PickerControls>, Rc<RefCell<Option<String>>>, web_sys::Element)> {
    let id = instance_id(host)?;
    INSTANCES.with(|instances| {
        instances.borrow().get(&id).map(|record| {
            (
                record.controls.clone(),
                record.last_iso.clone(),
                record.host.clone(),
            )
        })
    })
}

/// Updates the cached ISO value and dispatches `calendar:change`. The cache
/// is written first so a listener querying `get_date` sees the new value.
fn emit_change(
    last_iso: &Rc<RefCell<Option<String>>>,
    host: &web_sys::Element,
    day: Option<CalendarDay>,
) {
    let iso = day.map(to_iso_date);
    *last_iso.borrow_mut() = iso.clone();
    dom::dispatch_change(host, iso.as_deref(), day.map(CalendarDay::to_js).as_ref());
}

/// Mounts a picker under `host`. A second mount on an already-mounted host
/// is a no-op, tolerating redundant setup calls.
pub fn mount(host: &web_sys::Element, options: PickerOptions) -> Result<(), WidgetError> {
    if is_mounted(host) {
        return Ok(());
    }
    let document = dom::document().ok_or(WidgetError::DocumentUnavailable)?;
    let body = document.body().ok_or(WidgetError::DocumentUnavailable)?;

    let id = Ulid::new().to_string();
    let field_container_id = format!("calendar-widget-field-{id}");
    let panel_container_id = format!("calendar-widget-panel-{id}");

    let field_container = document.create_element("div").unwrap_throw();
    field_container.set_id(&field_container_id);
    field_container.set_class_name(FIELD_CONTAINER_CLASS);
    host.append_child(&field_container).unwrap_throw();

    let panel_container = document.create_element("div").unwrap_throw();
    panel_container.set_id(&panel_container_id);
    panel_container.set_class_name(PANEL_CONTAINER_CLASS);
    body.append_child(&panel_container).unwrap_throw();

    let last_iso = Rc::new(RefCell::new(
        options
            .initial_date
            .as_deref()
            .and_then(parse_iso_local)
            .map(to_iso_date),
    ));

    let picker = DatePicker::new(options, {
        let last_iso = last_iso.clone();
        let host = host.clone();
        move |day| emit_change(&last_iso, &host, day)
    });
    let controls = Rc::new(PickerControls::default());
    picker.register_controls(&controls);

    host.set_attribute(INSTANCE_ID_ATTRIBUTE, &id).unwrap_throw();

    start_app(field_container_id.as_str(), {
        let picker = picker.clone();
        move || picker.field_root()
    });
    start_app(panel_container_id.as_str(), {
        let picker = picker.clone();
        move || picker.panel_root()
    });

    INSTANCES.with(|instances| {
        instances.borrow_mut().insert(
            id,
            InstanceRecord {
                host: host.clone(),
                field_container,
                panel_container,
                last_iso,
                controls,
                _picker: picker,
            },
        );
    });
    Ok(())
}

/// Tears the instance down and removes its containers. No-op when `host` has
/// no mounted instance.
pub fn unmount(host: &web_sys::Element) {
    let Some(id) = instance_id(host) else {
        return;
    };
    let Some(record) = INSTANCES.with(|instances| instances.borrow_mut().remove(&id)) else {
        return;
    };
    record.field_container.remove();
    record.panel_container.remove();
    let _ = record.host.remove_attribute(INSTANCE_ID_ATTRIBUTE);
    // Dropping the record drops the picker state, its subscription watcher
    // and any still-attached open-panel listeners.
}

/// Imperatively opens (or closes, with `false` via [`close`]) the panel.
/// No-op when not mounted.
pub fn open(host: &web_sys::Element) {
    if let Some((controls, ..)) = control_handles(host) {
        controls.set_open(true);
    }
}

/// Imperatively closes the panel. No-op when not mounted.
pub fn close(host: &web_sys::Element) {
    if let Some((controls, ..)) = control_handles(host) {
        controls.set_open(false);
    }
}

/// Replaces the selection (`None` clears it) and emits the same change
/// notification a user-driven pick would. A malformed ISO string degrades to
/// a cleared selection. Fails when `host` is not mounted.
pub fn set_date(host: &web_sys::Element, iso: Option<&str>) -> Result<(), WidgetError> {
    let Some((controls, last_iso, host)) = control_handles(host) else {
        return Err(WidgetError::NotMounted);
    };
    let day = iso.and_then(parse_iso_local);
    controls.set_selected(day);
    emit_change(&last_iso, &host, day);
    Ok(())
}

/// The last committed selection as ISO, or `None` when nothing is selected
/// or `host` is not mounted. Safe to call at any time, including mid-render:
/// it only reads the cache.
pub fn get_date(host: &web_sys::Element) -> Option<String> {
    let id = instance_id(host)?;
    INSTANCES.with(|instances| {
        instances
            .borrow()
            .get(&id)
            .and_then(|record| record.last_iso.borrow().clone())
    })
}
