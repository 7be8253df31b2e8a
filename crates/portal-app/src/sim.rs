//! In-process host simulation.
//!
//! Each simulated native window is a [`SimWindow`] driven by a host task
//! that drains its [`HostEndpoint`], feeds a [`HostWindowListener`] and
//! reports its own geometry changes back, the way a native host reports
//! move and resize events.

use std::sync::{Arc, Mutex};

use portal_common::{DisplayInfo, FrameId, Point, Rect, RectPatch, Size};
use portal_config::PortalConfig;
use portal_layout::{
    Anchor, AxisRestriction, BoundsCondition, BoundsCorrectionStrategy, Offset, OffsetPatch,
    OffsetSpec, PositionSpec, ReplacedParameters, Unit, WindowPositionProps,
};
use portal_sync::{
    lock, ContentSource, Debouncer, HostEndpoint, HostInfoResponder, HostWindowListener,
    LocalBridge, Message, OverlayTracker, PortalSpec, PortalWindow, SystemProbe,
    WindowController, WindowInfoSet, WindowStore,
};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const MAIN_WINDOW: &str = "main_window";
pub const TOOLTIP_WINDOW: &str = "tooltip_window";

const MAIN_BOUNDS: Rect = Rect::new(200, 200, 800, 600);
const TOOLTIP_CONTENT: Size = Size {
    width: 320,
    height: 180,
};
const GAP: f64 = 8.0;

#[derive(Debug, Clone, Copy)]
struct SimState {
    bounds: Rect,
    zoom: f64,
    visible: bool,
    focused: bool,
}

/// Native window stand-in; clones share one state.
#[derive(Clone)]
pub struct SimWindow {
    state: Arc<Mutex<SimState>>,
}

impl SimWindow {
    fn new(bounds: Rect) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                bounds,
                zoom: 1.0,
                visible: false,
                focused: false,
            })),
        }
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }
}

impl WindowController for SimWindow {
    fn bounds(&self) -> Rect {
        lock(&self.state).bounds
    }

    fn zoom_factor(&self) -> f64 {
        lock(&self.state).zoom
    }

    fn is_focused(&self) -> bool {
        lock(&self.state).focused
    }

    fn media_source_id(&self) -> String {
        "window:0:0".into()
    }

    fn set_bounds(&mut self, bounds: RectPatch, _animate: bool) {
        let mut state = lock(&self.state);
        state.bounds = bounds.resolve(state.bounds);
    }

    fn show(&mut self) {
        let mut state = lock(&self.state);
        state.visible = true;
        state.focused = true;
    }

    fn show_inactive(&mut self) {
        lock(&self.state).visible = true;
    }

    fn hide(&mut self) {
        let mut state = lock(&self.state);
        state.visible = false;
        state.focused = false;
    }

    fn blur(&mut self) {
        lock(&self.state).focused = false;
    }

    fn set_zoom(&mut self, zoom: f64) {
        lock(&self.state).zoom = zoom;
    }
}

/// Two side-by-side displays with a fixed cursor.
pub struct SimDisplays;

impl SystemProbe for SimDisplays {
    fn displays(&self) -> Vec<DisplayInfo> {
        vec![
            DisplayInfo {
                id: 1,
                bounds: Rect::new(0, 0, 1920, 1080),
            },
            DisplayInfo {
                id: 2,
                bounds: Rect::new(1920, 0, 1280, 1024),
            },
        ]
    }

    fn primary_display_id(&self) -> u32 {
        1
    }

    fn cursor_position(&self) -> Point {
        Point { x: 600, y: 500 }
    }
}

/// Handle to one running host task.
pub struct SimHost {
    window: SimWindow,
    moved: mpsc::UnboundedSender<()>,
}

impl SimHost {
    /// Spawn the host side of one window. With `answer_info` the host also
    /// serves display, mouse and system requests from this window.
    pub fn spawn(
        mut endpoint: HostEndpoint,
        frame_id: FrameId,
        bounds: Rect,
        tracker: OverlayTracker,
        answer_info: bool,
    ) -> Self {
        let window = SimWindow::new(bounds);
        let probe = Arc::new(SimDisplays);
        let mut listener = HostWindowListener::new(
            frame_id,
            window.clone(),
            Arc::clone(&probe),
            endpoint.emitter(),
        )
        .with_overlay_tracker(tracker, endpoint.emitter());
        let responder = answer_info.then(|| HostInfoResponder::new(probe, endpoint.emitter()));
        let (moved, mut moves) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = endpoint.recv() => {
                        let Some(message) = message else { break };
                        if listener.handle(&message) {
                            if let Message::SetWindowInfo(set) = &message {
                                if set.bounds.is_some() || set.zoom.is_some() {
                                    listener.notify_changed();
                                }
                            }
                        } else if let Some(responder) = &responder {
                            responder.handle(&message);
                        }
                    }
                    Some(()) = moves.recv() => listener.notify_changed(),
                    else => break,
                }
            }
            debug!(frame_id = %listener.frame_id(), "host task finished");
        });

        Self { window, moved }
    }

    pub fn bounds(&self) -> Rect {
        self.window.bounds()
    }

    pub fn is_visible(&self) -> bool {
        self.window.is_visible()
    }

    /// The user moved the window.
    pub fn move_to(&self, bounds: Rect) {
        self.window.clone().set_bounds(RectPatch::from(bounds), false);
        if self.moved.send(()).is_err() {
            warn!("host task is gone, move not reported");
        }
    }
}

struct StaticContent(Size);

impl ContentSource for StaticContent {
    fn content_size(&self) -> Option<Size> {
        Some(self.0)
    }
}

/// Right of the parent with a gap; flips to its left when that runs off
/// the display, and is pulled back in as a last resort.
pub fn tooltip_position() -> WindowPositionProps {
    let flip = ReplacedParameters {
        position: None,
        offsets: Some(OffsetPatch {
            horizontal: Some(vec![
                Offset::new(Unit::OwnWindowSize, -1.0),
                Offset::pixels(-GAP),
            ]),
            vertical: None,
        }),
    };
    WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![Offset::new(Unit::ParentWindowSize, 1.0), Offset::pixels(GAP)],
            vertical: vec![],
        },
    )
    .with_strategy(
        BoundsCorrectionStrategy::replace(flip)
            .only(AxisRestriction::HorizontalBounds)
            .when(BoundsCondition::HorizontalOutOfBounds),
    )
    .with_strategy(BoundsCorrectionStrategy::subtract_excess())
}

/// Where the tooltip ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub settled: Rect,
    pub after_drag: Rect,
    pub visible: bool,
}

/// Open a tooltip next to the main window, let it settle, then drag the
/// main window right by `drag_by` pixels and let the tooltip follow.
pub async fn run(config: &PortalConfig, drag_by: i32) -> portal_common::Result<Outcome> {
    let timings = config.sync_timings();
    let store = WindowStore::new(timings);
    let debouncer = Debouncer::new();
    let tracker = OverlayTracker::new(Debouncer::new(), timings.overlay_quiet);

    let (main_bridge, main_endpoint) = LocalBridge::pair(Some(MAIN_WINDOW.into()));
    let main = SimHost::spawn(
        main_endpoint,
        MAIN_WINDOW.into(),
        MAIN_BOUNDS,
        tracker.clone(),
        true,
    );
    if let Err(e) = store.init(MAIN_WINDOW.into(), main_bridge.shared()).await {
        warn!(error = %e, "store init task failed");
    }

    let (tooltip_bridge, tooltip_endpoint) = LocalBridge::pair(Some(TOOLTIP_WINDOW.into()));
    let tooltip = SimHost::spawn(
        tooltip_endpoint,
        TOOLTIP_WINDOW.into(),
        Rect::new(0, 0, 1, 1),
        tracker,
        false,
    );

    let mut spec = PortalSpec::new(TOOLTIP_WINDOW.into(), MAIN_WINDOW.into(), tooltip_position());
    spec.initial_message = WindowInfoSet {
        title: Some("Tooltip".into()),
        skip_taskbar: Some(true),
        focusable: Some(false),
        always_on_top: Some(true),
        ..Default::default()
    };
    let portal = PortalWindow::open(
        &store,
        &debouncer,
        tooltip_bridge.shared(),
        spec,
        Arc::new(StaticContent(TOOLTIP_CONTENT)),
    )?;
    portal.notify_content_changed();

    let settle = timings.grace_delay + timings.first_show_wait + timings.reposition_wait * 10;
    sleep(settle).await;
    if portal.fit_to_display() {
        sleep(timings.reposition_wait).await;
    }
    let settled = tooltip.bounds();
    info!(?settled, "tooltip settled");

    let dragged = Rect::new(
        MAIN_BOUNDS.x.saturating_add(drag_by),
        MAIN_BOUNDS.y,
        MAIN_BOUNDS.width,
        MAIN_BOUNDS.height,
    );
    info!(?dragged, "dragging main window");
    main.move_to(dragged);
    sleep(timings.reposition_wait * 10).await;

    let outcome = Outcome {
        settled,
        after_drag: tooltip.bounds(),
        visible: tooltip.is_visible(),
    };
    portal.close();
    Ok(outcome)
}
