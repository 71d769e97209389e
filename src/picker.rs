//! The interactive surface: a read-only field that toggles a floating month
//! panel, composed from the date model and the placement engine.
//!
//! All reactive state of one picker lives in [`DatePicker`]: a clonable
//! bundle of `Mutable`s plus the droppable task that scopes the open-panel
//! subscriptions. The field and the panel are two Zoon roots over the same
//! bundle — the panel root sits in a dedicated `document.body` container so
//! fixed positioning and stacking are unaffected by the host's ancestors,
//! while staying on the same state graph as the field.

use std::cell::RefCell;
use std::rc::Rc;

use zoon::{map_ref, *};

use crate::date_model::{
    self, CalendarDay, YearMonth, build_month_grid, format_display, month_label, parse_iso_local,
    to_iso_date, weekday_abbrevs,
};
use crate::dom;
use crate::placement::{self, OpenSubscriptions, PlacementContext};

const FIELD_PLACEHOLDER: &str = "Select date";

/// Options accepted by `mount`.
#[derive(Debug, Clone)]
pub struct PickerOptions {
    /// Initial selection as an ISO `YYYY-MM-DD` string. Absent or invalid
    /// means no selection; the field starts empty.
    pub initial_date: Option<String>,
    /// BCP 47 locale for month and weekday names.
    pub locale: String,
    /// Display pattern for the field, see [`format_display`].
    pub input_format: String,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            initial_date: None,
            locale: "en-US".to_owned(),
            input_format: "yyyy-MM-dd".to_owned(),
        }
    }
}

pub(crate) struct ControlHandles {
    pub set_open: Box<dyn Fn(bool)>,
    pub set_selected: Box<dyn Fn(Option<CalendarDay>)>,
}

/// Capability slot bridging the imperative API to the reactive state.
///
/// The widget publishes its control callbacks here once, when it is built for
/// its mount; every later imperative call routes through them. Calls made
/// before registration are safe no-ops.
#[derive(Default)]
pub struct PickerControls {
    handles: RefCell<Option<ControlHandles>>,
}

impl PickerControls {
    pub fn set_open(&self, open: bool) {
        if let Some(handles) = &*self.handles.borrow() {
            (handles.set_open)(open);
        }
    }

    pub fn set_selected(&self, day: Option<CalendarDay>) {
        if let Some(handles) = &*self.handles.borrow() {
            (handles.set_selected)(day);
        }
    }

    pub(crate) fn register(&self, handles: ControlHandles) {
        *self.handles.borrow_mut() = Some(handles);
    }
}

/// Reactive state and views of one mounted picker.
#[derive(Clone)]
pub struct DatePicker {
    /// Committed selection; `None` is a valid state distinct from "today".
    selected: Mutable<Option<CalendarDay>>,
    /// Month the panel is navigated to, independent of the selection.
    view_month: Mutable<YearMonth>,
    open: Mutable<bool>,
    today: CalendarDay,
    locale: Rc<String>,
    input_format: Rc<String>,
    on_change: Rc<dyn Fn(Option<CalendarDay>)>,
    placement: PlacementContext,
    _open_subscriptions_task: Rc<TaskHandle>,
}

impl DatePicker {
    /// Builds the state bundle. `on_change` fires for every committed
    /// selection change driven from the UI (day pick).
    pub fn new(options: PickerOptions, on_change: impl Fn(Option<CalendarDay>) + 'static) -> Self {
        let initial = options.initial_date.as_deref().and_then(parse_iso_local);
        let today = date_model::today();
        let selected = Mutable::new(initial);
        let view_month = Mutable::new(YearMonth::of(initial.unwrap_or(today)));
        let open = Mutable::new(false);
        let placement = PlacementContext::new();

        // While the panel is open, a scoped listener set keeps the position
        // tracking the anchor and handles dismissal. The set is (re)created on
        // every open and dropped on close; dropping this task on unmount
        // drops a still-attached set with it.
        let open_subscriptions: Rc<RefCell<Option<OpenSubscriptions>>> =
            Rc::new(RefCell::new(None));
        let _open_subscriptions_task = Rc::new(Task::start_droppable(open.signal().for_each_sync({
            let placement = placement.clone();
            let open = open.clone();
            move |is_open| {
                if is_open {
                    let on_dismiss = {
                        let open = open.clone();
                        move || open.set_neq(false)
                    };
                    *open_subscriptions.borrow_mut() =
                        Some(OpenSubscriptions::attach(placement.clone(), on_dismiss));
                } else {
                    open_subscriptions.borrow_mut().take();
                }
            }
        })));

        Self {
            selected,
            view_month,
            open,
            today,
            locale: Rc::new(options.locale),
            input_format: Rc::new(options.input_format),
            on_change: Rc::new(on_change),
            placement,
            _open_subscriptions_task,
        }
    }

    /// Publishes the control callbacks into the instance's capability slot.
    pub fn register_controls(&self, controls: &PickerControls) {
        let set_open = {
            let this = self.clone();
            Box::new(move |flag: bool| {
                if flag && !this.open.get() {
                    this.placement.recompute();
                }
                this.open.set_neq(flag);
            })
        };
        let set_selected = {
            let selected = self.selected.clone();
            let view_month = self.view_month.clone();
            Box::new(move |day: Option<CalendarDay>| {
                selected.set_neq(day);
                if let Some(day) = day {
                    view_month.set_neq(YearMonth::of(day));
                }
            })
        };
        controls.register(ControlHandles {
            set_open,
            set_selected,
        });
    }

    fn toggle_open(&self) {
        let next = !self.open.get();
        if next {
            // Position from the current anchor rectangle before the panel
            // renders, so its first paint is not at a stale location.
            self.placement.recompute();
        }
        self.open.set_neq(next);
    }

    fn select_day(&self, day: CalendarDay) {
        self.selected.set_neq(Some(day));
        // The view month stays wherever the user navigated.
        self.open.set_neq(false);
        (self.on_change)(Some(day));
        if let Some(anchor) = self.placement.anchor_element() {
            dom::focus_after_render(anchor);
        }
    }

    fn formatted_selection_signal(&self) -> impl Signal<Item = String> + use<> {
        let locale = self.locale.clone();
        let input_format = self.input_format.clone();
        self.selected.signal().map(move |selected| match selected {
            Some(day) => format_display(day, &input_format, &locale),
            None => String::new(),
        })
    }

    /// The field root, rendered into the host-side container.
    pub fn field_root(&self) -> impl Element + use<> {
        let this = self.clone();
        let placement = self.placement.clone();
        let open = self.open.clone();
        TextInput::new()
            .s(Width::exact(180))
            .s(Padding::new().x(10).y(8))
            .s(RoundedCorners::all(10))
            .s(Borders::all(Border::new().color(color!("#d1d5db")).width(1)))
            .s(Background::new().color(color!("#ffffff")))
            .s(Font::new().size(14).color(color!("#111827")))
            .s(Cursor::new(CursorIcon::Pointer))
            .label_hidden("date")
            .placeholder(Placeholder::new(FIELD_PLACEHOLDER))
            .text_signal(self.formatted_selection_signal())
            .update_raw_el(move |raw_el| {
                raw_el
                    .attr("readonly", "")
                    .attr("aria-haspopup", "dialog")
                    .attr_signal(
                        "aria-expanded",
                        open.signal().map_bool(|| "true", || "false"),
                    )
                    .event_handler(move |_: events::Click| this.toggle_open())
                    .after_insert(move |element| placement.set_anchor(element))
            })
    }

    /// The panel root, rendered into the body-side portal container. Empty
    /// while closed.
    pub fn panel_root(&self) -> impl Element + use<> {
        let this = self.clone();
        El::new().child_signal(
            self.open
                .signal()
                .map(move |is_open| is_open.then(|| this.panel())),
        )
    }

    fn panel(&self) -> impl Element + use<> {
        let placement = self.placement.clone();
        let placement_for_remove = self.placement.clone();
        let position = self.placement.position();
        let left_signal = position.signal().map(|position| format!("{}px", position.left));
        let top_signal = position.signal().map(|position| format!("{}px", position.top));
        Column::new()
            .s(Width::exact(placement::PANEL_WIDTH as u32))
            .s(RoundedCorners::all(12))
            .s(Borders::all(Border::new().color(color!("#e5e7eb")).width(1)))
            .s(Background::new().color(color!("#ffffff")))
            .s(Shadows::new([
                Shadow::new()
                    .color(color!("rgba(0, 0, 0, 0.08)"))
                    .y(10)
                    .blur(30),
            ]))
            .s(Clip::both())
            .update_raw_el(move |raw_el| {
                raw_el
                    .attr("role", "dialog")
                    .style("position", "fixed")
                    .style("z-index", "999999")
                    .style_signal("left", left_signal)
                    .style_signal("top", top_signal)
                    .after_insert(move |element| {
                        placement.set_panel(element);
                        // First paint used the estimated height; correct with
                        // the measured one.
                        placement.measure_panel();
                    })
            })
            .item(self.panel_header())
            .item(self.weekday_header())
            .item(self.day_grid())
            .after_remove(move |_| placement_for_remove.clear_panel())
    }

    fn panel_header(&self) -> impl Element + use<> {
        let locale = self.locale.clone();
        Row::new()
            .s(Width::fill())
            .s(Align::new().center_y())
            .s(Padding::new().x(12).y(10))
            .s(Borders::new().bottom(Border::new().color(color!("#e5e7eb")).width(1)))
            .item(
                El::new()
                    .s(Align::new().left())
                    .child(self.nav_button("Previous month", "‹", -1)),
            )
            .item(
                El::new()
                    .s(Align::new().center_x())
                    .s(Font::new().size(14).weight(FontWeight::SemiBold))
                    .child_signal(
                        self.view_month
                            .signal()
                            .map(move |view| month_label(&locale, view)),
                    ),
            )
            .item(
                El::new()
                    .s(Align::new().right())
                    .child(self.nav_button("Next month", "›", 1)),
            )
    }

    fn nav_button(&self, label: &'static str, glyph: &'static str, months: i32) -> impl Element + use<> {
        let hovered = Mutable::new(false);
        let view_month = self.view_month.clone();
        Button::new()
            .s(Width::exact(32))
            .s(Height::exact(32))
            .s(RoundedCorners::all(8))
            .s(Font::new().size(18).color(color!("#111827")))
            .s(Background::new().color_signal(
                hovered
                    .signal()
                    .map_bool(|| color!("#f3f4f6"), || color!("rgba(0, 0, 0, 0)")),
            ))
            .label(El::new().s(Align::center()).child(glyph))
            .on_hovered_change(move |is_hovered| hovered.set_neq(is_hovered))
            .on_press(move || view_month.update(|view| view.shifted(months)))
            .update_raw_el(move |raw_el| raw_el.attr("aria-label", label))
    }

    fn weekday_header(&self) -> impl Element + use<> {
        let labels: Vec<RawElOrText> = weekday_abbrevs(&self.locale)
            .into_iter()
            .map(|name| {
                El::new()
                    .s(Width::fill())
                    .update_raw_el(|raw_el| raw_el.style("text-align", "center"))
                    .child(name)
                    .unify()
            })
            .collect();
        Row::new()
            .s(Width::fill())
            .s(Padding::new().x(8).top(6).bottom(2))
            .s(Font::new().size(11).color(color!("#9ca3af")))
            .update_raw_el(|raw_el| {
                raw_el
                    .style("text-transform", "uppercase")
                    .style("letter-spacing", "0.4px")
            })
            .items(labels)
    }

    fn day_grid(&self) -> impl Element + use<> {
        let this = self.clone();
        Column::new()
            .s(Width::fill())
            .s(Padding::new().x(8).top(4).bottom(10))
            .s(Gap::new().y(2))
            .items_signal_vec(
                self.view_month
                    .signal()
                    .map(move |view| {
                        // Built fresh from the view month on every change.
                        let grid = build_month_grid(view.year, view.month);
                        grid.chunks(7)
                            .map(|week| this.week_row(week))
                            .collect::<Vec<_>>()
                    })
                    .to_signal_vec(),
            )
    }

    fn week_row(&self, week: &[Option<CalendarDay>]) -> impl Element + use<> {
        let cells: Vec<RawElOrText> = week
            .iter()
            .map(|cell| match cell {
                Some(day) => self.day_cell(*day).unify(),
                None => El::new().s(Width::fill()).s(Height::exact(36)).unify(),
            })
            .collect();
        Row::new().s(Width::fill()).s(Gap::new().x(2)).items(cells)
    }

    fn day_cell(&self, day: CalendarDay) -> impl Element + use<> {
        let this = self.clone();
        let hovered = Mutable::new(false);
        let is_today = day == self.today;
        let is_selected = self
            .selected
            .signal()
            .map(move |selected| selected == Some(day))
            .broadcast();
        Button::new()
            .s(Width::fill())
            .s(Height::exact(36))
            .s(RoundedCorners::all(10))
            .s(Font::new().size(13).color_signal(
                is_selected
                    .signal()
                    .map_bool(|| color!("#ffffff"), || color!("#111827")),
            ))
            .s(Background::new().color_signal(map_ref! {
                let selected = is_selected.signal(),
                let hovered = hovered.signal() =>
                if *selected {
                    color!("#111827")
                } else if *hovered {
                    color!("#f3f4f6")
                } else {
                    color!("rgba(0, 0, 0, 0)")
                }
            }))
            .label(El::new().s(Align::center()).child(day.day.to_string()))
            .on_hovered_change(move |is_hovered| hovered.set_neq(is_hovered))
            .on_press(move || this.select_day(day))
            .update_raw_el(move |raw_el| {
                let raw_el = raw_el
                    .attr("aria-label", &format!("Select {}", to_iso_date(day)))
                    .attr_signal(
                        "aria-pressed",
                        is_selected.signal().map_bool(|| "true", || "false"),
                    );
                if is_today {
                    raw_el
                        .style("outline", "2px solid #111827")
                        .style("outline-offset", "-2px")
                } else {
                    raw_el
                }
            })
    }
}
