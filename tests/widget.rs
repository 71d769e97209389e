//! Browser lifecycle tests: mount/unmount, imperative controls, change
//! notifications and instance isolation. Run with
//! `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use zoon::Timer;

use calendar_widget::date_model::{self, CalendarDay, to_iso_date};
use calendar_widget::dom::{CHANGE_EVENT, EventListenerGuard};
use calendar_widget::instance::INSTANCE_ID_ATTRIBUTE;
use calendar_widget::{PickerOptions, close, get_date, mount, open, set_date, unmount};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn test_host() -> web_sys::Element {
    let host = document().create_element("div").unwrap();
    document().body().unwrap().append_child(&host).unwrap();
    host
}

fn options_with_initial(initial: &str) -> PickerOptions {
    PickerOptions {
        initial_date: Some(initial.to_owned()),
        ..PickerOptions::default()
    }
}

/// The body-side portal container of the instance mounted on `host`.
fn panel_container(host: &web_sys::Element) -> web_sys::Element {
    let id = host.get_attribute(INSTANCE_ID_ATTRIBUTE).unwrap();
    document()
        .get_element_by_id(&format!("calendar-widget-panel-{id}"))
        .unwrap()
}

fn panel_day_button(host: &web_sys::Element, day: CalendarDay) -> Option<web_sys::Element> {
    panel_container(host)
        .query_selector(&format!("button[aria-label='Select {}']", to_iso_date(day)))
        .unwrap()
}

fn panel_is_open(host: &web_sys::Element) -> bool {
    panel_container(host)
        .query_selector("[role='dialog']")
        .unwrap()
        .is_some()
}

/// Collects `calendar:change` details as `(dateISO, getDate-at-dispatch)`
/// pairs, which also checks the cache-before-dispatch ordering guarantee.
fn change_log(host: &web_sys::Element) -> (EventListenerGuard, Rc<RefCell<Vec<(Option<String>, Option<String>)>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let guard = EventListenerGuard::new(host.as_ref(), CHANGE_EVENT, {
        let log = log.clone();
        let host = host.clone();
        move |event| {
            let detail = event.unchecked_ref::<web_sys::CustomEvent>().detail();
            let iso = js_sys::Reflect::get(&detail, &JsValue::from_str("dateISO"))
                .ok()
                .and_then(|value| value.as_string());
            log.borrow_mut().push((iso, get_date(&host)));
        }
    });
    (guard, log)
}

#[wasm_bindgen_test]
fn mount_seeds_selection_and_unmount_clears() {
    let host = test_host();
    mount(&host, options_with_initial("2025-01-15")).unwrap();
    assert_eq!(get_date(&host), Some("2025-01-15".to_owned()));

    unmount(&host);
    assert_eq!(get_date(&host), None);
    assert!(set_date(&host, Some("2025-01-16")).is_err());
    assert_eq!(host.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn mount_is_idempotent() {
    let host = test_host();
    mount(&host, options_with_initial("2025-01-15")).unwrap();
    mount(&host, options_with_initial("1999-12-31")).unwrap();
    assert_eq!(host.child_element_count(), 1);
    // The second mount changed nothing.
    assert_eq!(get_date(&host), Some("2025-01-15".to_owned()));
    unmount(&host);
}

#[wasm_bindgen_test]
fn invalid_initial_date_starts_empty() {
    let host = test_host();
    mount(&host, options_with_initial("not a date")).unwrap();
    assert_eq!(get_date(&host), None);
    unmount(&host);
}

#[wasm_bindgen_test]
fn set_date_updates_cache_and_emits_change() {
    let host = test_host();
    mount(&host, PickerOptions::default()).unwrap();
    let (_guard, log) = change_log(&host);

    set_date(&host, Some("2025-03-07")).unwrap();
    set_date(&host, None).unwrap();
    // Malformed input degrades to a cleared selection, not an error.
    set_date(&host, Some("definitely not ISO %%%")).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 3);
    // Each event carried the new value, and getDate already agreed with it
    // when the listener ran.
    assert_eq!(log[0], (Some("2025-03-07".to_owned()), Some("2025-03-07".to_owned())));
    assert_eq!(log[1], (None, None));
    assert_eq!(log[2], (None, None));
    drop(log);
    unmount(&host);
}

#[wasm_bindgen_test]
async fn open_close_drive_the_panel() {
    let host = test_host();
    mount(&host, options_with_initial("2025-03-07")).unwrap();

    open(&host);
    Timer::sleep(100).await;
    assert!(panel_is_open(&host));

    close(&host);
    Timer::sleep(100).await;
    assert!(!panel_is_open(&host));
    unmount(&host);
}

#[wasm_bindgen_test]
async fn day_pick_commits_selection_closes_and_notifies() {
    let host = test_host();
    mount(&host, PickerOptions::default()).unwrap();
    let (_guard, log) = change_log(&host);

    open(&host);
    Timer::sleep(100).await;

    let today = date_model::today();
    let picked = CalendarDay::new(today.year, today.month, 10);
    let button = panel_day_button(&host, picked).expect("day 10 is in the view month");
    button.unchecked_ref::<web_sys::HtmlElement>().click();
    Timer::sleep(100).await;

    let expected = to_iso_date(picked);
    assert_eq!(get_date(&host), Some(expected.clone()));
    assert!(!panel_is_open(&host));
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0.as_deref(), Some(expected.as_str()));
    drop(log);
    unmount(&host);
}

#[wasm_bindgen_test]
async fn escape_closes_panel() {
    let host = test_host();
    mount(&host, PickerOptions::default()).unwrap();
    open(&host);
    Timer::sleep(100).await;
    assert!(panel_is_open(&host));

    let init = web_sys::KeyboardEventInit::new();
    init.set_key("Escape");
    let escape =
        web_sys::KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    document().dispatch_event(&escape).unwrap();
    Timer::sleep(100).await;
    assert!(!panel_is_open(&host));
    unmount(&host);
}

#[wasm_bindgen_test]
async fn outside_pointerdown_closes_panel() {
    let host = test_host();
    mount(&host, PickerOptions::default()).unwrap();
    open(&host);
    Timer::sleep(100).await;
    assert!(panel_is_open(&host));

    let pointer_down = web_sys::Event::new("pointerdown").unwrap();
    document().dispatch_event(&pointer_down).unwrap();
    Timer::sleep(100).await;
    assert!(!panel_is_open(&host));
    unmount(&host);
}

#[wasm_bindgen_test]
async fn two_instances_are_isolated() {
    let host_a = test_host();
    let host_b = test_host();
    mount(&host_a, options_with_initial("2025-01-15")).unwrap();
    mount(&host_b, options_with_initial("2024-06-01")).unwrap();

    open(&host_a);
    Timer::sleep(100).await;
    assert!(panel_is_open(&host_a));
    assert!(!panel_is_open(&host_b));

    unmount(&host_a);
    assert_eq!(get_date(&host_a), None);
    assert_eq!(get_date(&host_b), Some("2024-06-01".to_owned()));
    unmount(&host_b);
}

#[wasm_bindgen_test]
async fn field_displays_formatted_selection() {
    let host = test_host();
    mount(
        &host,
        PickerOptions {
            initial_date: Some("2025-03-07".to_owned()),
            input_format: "MMM d, yyyy".to_owned(),
            ..PickerOptions::default()
        },
    )
    .unwrap();
    Timer::sleep(100).await;

    let input = host
        .query_selector("input")
        .unwrap()
        .expect("field input rendered");
    assert_eq!(
        input.unchecked_ref::<web_sys::HtmlInputElement>().value(),
        "Mar 7, 2025"
    );
    unmount(&host);
}
