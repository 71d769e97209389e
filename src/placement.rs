//! Floating-panel placement: pure viewport math plus the live subscriptions
//! that keep an open panel tracking its anchor.
//!
//! The pure half (`resolve_placement`) is the whole positioning policy: clamp
//! horizontally into the viewport, place below the anchor, flip above only
//! when below overflows *and* there is room above. The live half
//! (`OpenSubscriptions`) re-runs that policy on scroll/resize/visual-viewport
//! changes and owns the outside-pointerdown/Escape dismissal listeners, all
//! as drop-released guards scoped to "panel open".

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use zoon::Mutable;

use crate::dom::{self, EventListenerGuard};

/// Fixed panel width in CSS pixels.
pub const PANEL_WIDTH: f64 = 280.0;
/// Height assumed for the very first computation, before the panel has been
/// measured. The post-insert measurement corrects the position.
pub const ESTIMATED_PANEL_HEIGHT: f64 = 360.0;
/// Minimum distance kept between the panel and the viewport edges.
pub const VIEWPORT_MARGIN: f64 = 12.0;
/// Gap between the anchor and the panel.
pub const ANCHOR_OFFSET: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementSide {
    Below,
    Above,
}

/// Viewport-fixed panel coordinates. Recomputed, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPlacement {
    pub left: f64,
    pub top: f64,
    pub side: PlacementSide,
}

/// Anchor bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Computes where the panel goes for the given anchor and viewport.
///
/// Horizontal: the left edge is clamped into
/// `[VIEWPORT_MARGIN, viewport_width - PANEL_WIDTH - VIEWPORT_MARGIN]`; when
/// the viewport is narrower than panel plus margins the panel overflows to
/// the right (accepted degenerate case). Vertical: below the anchor by
/// default; flipped above only when below would overflow the bottom *and*
/// the panel fully fits above — otherwise bottom overflow is preferred over
/// flipping into insufficient space.
pub fn resolve_placement(
    anchor: AnchorRect,
    panel_height: f64,
    viewport_width: f64,
    viewport_height: f64,
) -> PanelPlacement {
    let max_left = viewport_width - PANEL_WIDTH - VIEWPORT_MARGIN;
    let left = anchor.left.min(max_left).max(VIEWPORT_MARGIN);

    let below_top = anchor.bottom() + ANCHOR_OFFSET;
    let above_top = anchor.top - panel_height - ANCHOR_OFFSET;
    let overflows_bottom = below_top + panel_height > viewport_height - VIEWPORT_MARGIN;
    if overflows_bottom && above_top >= VIEWPORT_MARGIN {
        PanelPlacement {
            left,
            top: above_top,
            side: PlacementSide::Above,
        }
    } else {
        PanelPlacement {
            left,
            top: below_top,
            side: PlacementSide::Below,
        }
    }
}

/// Shared placement state of one picker instance: the anchor and panel
/// elements as they come and go, the current position, and the last measured
/// panel height.
#[derive(Clone)]
pub struct PlacementContext {
    anchor: Rc<RefCell<Option<web_sys::HtmlElement>>>,
    panel: Rc<RefCell<Option<web_sys::HtmlElement>>>,
    position: Mutable<PanelPlacement>,
    measured_height: Rc<Cell<Option<f64>>>,
}

impl Default for PlacementContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementContext {
    pub fn new() -> Self {
        Self {
            anchor: Rc::new(RefCell::new(None)),
            panel: Rc::new(RefCell::new(None)),
            position: Mutable::new(PanelPlacement {
                left: VIEWPORT_MARGIN,
                top: 0.0,
                side: PlacementSide::Below,
            }),
            measured_height: Rc::new(Cell::new(None)),
        }
    }

    pub fn set_anchor(&self, element: impl AsRef<web_sys::HtmlElement>) {
        *self.anchor.borrow_mut() = Some(element.as_ref().clone());
    }

    pub fn set_panel(&self, element: impl AsRef<web_sys::HtmlElement>) {
        *self.panel.borrow_mut() = Some(element.as_ref().clone());
    }

    /// Forgets the panel element after it left the DOM. The measured height
    /// is kept; panel content is a fixed 6-row grid, so the next open can
    /// position correctly before its first paint.
    pub fn clear_panel(&self) {
        self.panel.borrow_mut().take();
    }

    pub fn anchor_element(&self) -> Option<web_sys::HtmlElement> {
        self.anchor.borrow().clone()
    }

    pub fn position(&self) -> Mutable<PanelPlacement> {
        self.position.clone()
    }

    /// Reads the panel's real height and repositions with it.
    pub fn measure_panel(&self) {
        let height = self
            .panel
            .borrow()
            .as_ref()
            .map(|panel| panel.get_bounding_client_rect().height());
        if let Some(height) = height {
            if height > 0.0 {
                self.measured_height.set(Some(height));
            }
        }
        self.recompute();
    }

    /// Recomputes the position from the current anchor rectangle and the
    /// measured (or estimated) panel height. A no-op before the anchor has
    /// been inserted.
    pub fn recompute(&self) {
        let Some(anchor) = self.anchor.borrow().clone() else {
            return;
        };
        let Some((viewport_width, viewport_height)) = dom::viewport_size() else {
            return;
        };
        let rect = anchor.get_bounding_client_rect();
        let anchor_rect = AnchorRect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        };
        let panel_height = self.measured_height.get().unwrap_or(ESTIMATED_PANEL_HEIGHT);
        self.position.set_neq(resolve_placement(
            anchor_rect,
            panel_height,
            viewport_width,
            viewport_height,
        ));
    }

    /// Whether the event's target sits inside the anchor or the panel.
    fn hit_inside(&self, event: &web_sys::Event) -> bool {
        let Some(target) = event
            .target()
            .and_then(|target| target.dyn_into::<web_sys::Node>().ok())
        else {
            return false;
        };
        let contains = |slot: &RefCell<Option<web_sys::HtmlElement>>| {
            slot.borrow()
                .as_ref()
                .is_some_and(|element| element.contains(Some(&target)))
        };
        contains(&self.anchor) || contains(&self.panel)
    }
}

/// Everything that has to stay alive while the panel is open: re-layout
/// listeners and the dismissal pair. Dropping the value detaches all of them.
pub struct OpenSubscriptions {
    _guards: Vec<EventListenerGuard>,
}

impl OpenSubscriptions {
    /// Attaches the listener set and immediately positions the panel.
    /// `on_dismiss` fires on a pointer-down outside both the anchor and the
    /// panel, and on Escape.
    pub fn attach(context: PlacementContext, on_dismiss: impl Fn() + 'static) -> Self {
        let mut guards = Vec::with_capacity(6);
        let Some(window) = dom::window() else {
            return Self { _guards: guards };
        };
        let Some(document) = dom::document() else {
            return Self { _guards: guards };
        };

        let recompute = {
            let context = context.clone();
            move |_: web_sys::Event| context.recompute()
        };
        // Capture phase so scrolls of any ancestor, not just the window, are seen.
        guards.push(EventListenerGuard::capturing(
            window.as_ref(),
            "scroll",
            recompute.clone(),
        ));
        guards.push(EventListenerGuard::new(
            window.as_ref(),
            "resize",
            recompute.clone(),
        ));
        // On-screen keyboards and pinch-zoom move the visual viewport without
        // firing window resize.
        if let Some(visual_viewport) = window.visual_viewport() {
            guards.push(EventListenerGuard::new(
                visual_viewport.as_ref(),
                "resize",
                recompute.clone(),
            ));
            guards.push(EventListenerGuard::new(
                visual_viewport.as_ref(),
                "scroll",
                recompute,
            ));
        }

        let on_dismiss = Rc::new(on_dismiss);
        guards.push(EventListenerGuard::new(document.as_ref(), "pointerdown", {
            let context = context.clone();
            let on_dismiss = on_dismiss.clone();
            move |event| {
                if !context.hit_inside(&event) {
                    on_dismiss();
                }
            }
        }));
        guards.push(EventListenerGuard::new(document.as_ref(), "keydown", {
            move |event| {
                let is_escape = event
                    .dyn_ref::<web_sys::KeyboardEvent>()
                    .is_some_and(|event| event.key() == "Escape");
                if is_escape {
                    on_dismiss();
                }
            }
        }));

        context.recompute();
        Self { _guards: guards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: (f64, f64) = (1024.0, 800.0);

    fn anchor(left: f64, top: f64) -> AnchorRect {
        AnchorRect {
            left,
            top,
            width: 200.0,
            height: 40.0,
        }
    }

    #[test]
    fn places_below_by_default() {
        let placement = resolve_placement(anchor(40.0, 100.0), 360.0, VIEWPORT.0, VIEWPORT.1);
        assert_eq!(placement.side, PlacementSide::Below);
        assert_eq!(placement.top, 148.0);
        assert_eq!(placement.left, 40.0);
    }

    #[test]
    fn flips_above_when_bottom_overflows_and_room_above() {
        // Anchor bottom at 700: 708 + 360 > 788 overflows, 660 - 368 = 292 fits.
        let placement = resolve_placement(anchor(40.0, 660.0), 360.0, VIEWPORT.0, VIEWPORT.1);
        assert_eq!(placement.side, PlacementSide::Above);
        assert_eq!(placement.top, 292.0);
    }

    #[test]
    fn keeps_below_when_above_lacks_room() {
        // Overflows below, but above would start at -268: stay below and
        // accept the bottom overflow.
        let placement = resolve_placement(anchor(40.0, 100.0), 360.0, 1024.0, 400.0);
        assert_eq!(placement.side, PlacementSide::Below);
        assert_eq!(placement.top, 148.0);
    }

    #[test]
    fn clamps_left_edge_into_viewport() {
        let hugging_left = resolve_placement(anchor(2.0, 100.0), 360.0, VIEWPORT.0, VIEWPORT.1);
        assert_eq!(hugging_left.left, VIEWPORT_MARGIN);

        let hugging_right = resolve_placement(anchor(900.0, 100.0), 360.0, VIEWPORT.0, VIEWPORT.1);
        assert_eq!(hugging_right.left, 1024.0 - PANEL_WIDTH - VIEWPORT_MARGIN);
    }

    #[test]
    fn narrow_viewport_overflows_right() {
        // Viewport narrower than panel + margins: pinned to the left margin.
        let placement = resolve_placement(anchor(40.0, 100.0), 360.0, 200.0, 800.0);
        assert_eq!(placement.left, VIEWPORT_MARGIN);
    }
}
