use std::sync::{Arc, Mutex};

use portal_common::{DisplayInfo, Point, Rect, RectPatch, Size, SyncError};
use portal_config::SyncTimings;
use portal_layout::{Anchor, Offset, OffsetSpec, PositionSpec, Unit, WindowPositionProps};
use tokio::time::{sleep, Duration};

use super::*;
use crate::host::{HostWindowListener, SystemProbe, WindowController};
use crate::local::{HostEndpoint, LocalBridge};

const DISPLAY: DisplayInfo = DisplayInfo {
    id: 1,
    bounds: Rect::new(0, 0, 1920, 1080),
};

struct FixedWindow {
    bounds: Rect,
    zoom: f64,
}

impl WindowController for FixedWindow {
    fn bounds(&self) -> Rect {
        self.bounds
    }
    fn zoom_factor(&self) -> f64 {
        self.zoom
    }
    fn is_focused(&self) -> bool {
        false
    }
    fn media_source_id(&self) -> String {
        "window:3:0".into()
    }
}

struct OneDisplay;

impl SystemProbe for OneDisplay {
    fn displays(&self) -> Vec<DisplayInfo> {
        vec![DISPLAY]
    }
    fn primary_display_id(&self) -> u32 {
        DISPLAY.id
    }
    fn cursor_position(&self) -> Point {
        Point { x: 0, y: 0 }
    }
}

struct FixedContent(Size);

impl ContentSource for FixedContent {
    fn content_size(&self) -> Option<Size> {
        Some(self.0)
    }
}

fn spawn_host(
    mut endpoint: HostEndpoint,
    window: FixedWindow,
    frame: &str,
) -> Arc<Mutex<Vec<Message>>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);
    let mut listener =
        HostWindowListener::new(frame.into(), window, Arc::new(OneDisplay), endpoint.emitter());
    tokio::spawn(async move {
        while let Some(message) = endpoint.recv().await {
            log.lock().unwrap().push(message.clone());
            listener.handle(&message);
        }
    });
    received
}

fn right_of_parent() -> WindowPositionProps {
    WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![Offset::new(Unit::ParentWindowSize, 1.0)],
            vertical: vec![],
        },
    )
}

fn tooltip_spec() -> PortalSpec {
    let mut spec =
        PortalSpec::new("tooltip_window".into(), "main_window".into(), right_of_parent());
    spec.initial_message.title = Some("Tooltip".into());
    spec
}

fn content() -> Arc<dyn ContentSource> {
    Arc::new(FixedContent(Size {
        width: 200,
        height: 120,
    }))
}

fn sets(received: &Mutex<Vec<Message>>) -> Vec<WindowInfoSet> {
    received
        .lock()
        .unwrap()
        .iter()
        .filter_map(|m| match m {
            Message::SetWindowInfo(set) => Some(set.clone()),
            _ => None,
        })
        .collect()
}

struct Scene {
    store: WindowStore,
    tooltip: Arc<Mutex<Vec<Message>>>,
    bridge: Arc<LocalBridge>,
}

/// Parent at (100, 100, 250, 350) and a tooltip window whose zoom is
/// `zoom`, both answered by live hosts.
fn scene(zoom: f64) -> Scene {
    scene_with(SyncTimings::default(), zoom)
}

fn scene_with(timings: SyncTimings, zoom: f64) -> Scene {
    let store = WindowStore::new(timings);

    let (main, main_host) = LocalBridge::pair(Some("main_window".into()));
    let parent = FixedWindow {
        bounds: Rect::new(100, 100, 250, 350),
        zoom: 1.0,
    };
    spawn_host(main_host, parent, "main_window");
    drop(store.subscribe_window("main_window".into(), main.shared(), false));

    let (bridge, tooltip_host) = LocalBridge::pair(Some("tooltip_window".into()));
    let window = FixedWindow {
        bounds: Rect::new(0, 0, 10, 10),
        zoom,
    };
    let tooltip = spawn_host(tooltip_host, window, "tooltip_window");
    Scene {
        store,
        tooltip,
        bridge,
    }
}

#[tokio::test(start_paused = true)]
async fn open_sends_initial_message_once_window_answers() {
    let scene = scene(1.0);
    let _portal = PortalWindow::open(
        &scene.store,
        &Debouncer::new(),
        scene.bridge.shared(),
        tooltip_spec(),
        content(),
    )
    .unwrap();

    sleep(Duration::from_millis(900)).await;
    assert!(sets(&scene.tooltip).iter().all(|s| s.title.is_none()));

    sleep(Duration::from_millis(200)).await;
    let initial: Vec<WindowInfoSet> = sets(&scene.tooltip)
        .into_iter()
        .filter(|s| s.title.is_some())
        .collect();
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].zoom, Some(1.0));
    assert_eq!(initial[0].frame_id, FrameId::from("tooltip_window"));
    assert!(initial[0].once_id.as_deref().is_some_and(|id| id.starts_with("id_")));
}

#[tokio::test(start_paused = true)]
async fn first_show_follows_initial_delay() {
    let store = WindowStore::new(SyncTimings::default());
    let (bridge, mut host) = LocalBridge::pair(Some("tooltip_window".into()));
    let _portal =
        PortalWindow::open(&store, &Debouncer::new(), bridge.shared(), tooltip_spec(), content())
            .unwrap();

    sleep(Duration::from_millis(199)).await;
    assert_eq!(host.try_recv(), None);

    sleep(Duration::from_millis(2)).await;
    let Some(Message::SetWindowInfo(set)) = host.try_recv() else {
        panic!("expected the first show");
    };
    assert_eq!(
        set.visibility,
        Some(Visibility {
            show: true,
            focus: Some(false),
            blur: None,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn hide_cancels_pending_first_show() {
    let store = WindowStore::new(SyncTimings::default());
    let (bridge, mut host) = LocalBridge::pair(Some("tooltip_window".into()));
    let portal =
        PortalWindow::open(&store, &Debouncer::new(), bridge.shared(), tooltip_spec(), content())
            .unwrap();

    portal.hide();
    let Some(Message::SetWindowInfo(set)) = host.try_recv() else {
        panic!("expected a hide");
    };
    assert_eq!(set.visibility.map(|v| v.show), Some(false));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(host.try_recv(), None);
}

#[tokio::test(start_paused = true)]
async fn finished_overlaying_shows_window_again() {
    let store = WindowStore::new(SyncTimings::default());
    let (bridge, mut host) = LocalBridge::pair(Some("tooltip_window".into()));
    let _portal =
        PortalWindow::open(&store, &Debouncer::new(), bridge.shared(), tooltip_spec(), content())
            .unwrap();
    sleep(Duration::from_millis(300)).await;
    while host.try_recv().is_some() {}

    host.emit(Message::FinishedOverlaying);
    let Some(Message::SetWindowInfo(set)) = host.try_recv() else {
        panic!("expected a show");
    };
    assert_eq!(set.visibility.map(|v| v.show), Some(true));
}

#[tokio::test(start_paused = true)]
async fn content_change_resizes_and_positions_next_to_parent() {
    let scene = scene(1.0);
    let portal = PortalWindow::open(
        &scene.store,
        &Debouncer::new(),
        scene.bridge.shared(),
        tooltip_spec(),
        content(),
    )
    .unwrap();
    sleep(Duration::from_secs(2)).await;

    portal.notify_content_changed();
    sleep(Duration::from_millis(10)).await;

    let last = sets(&scene.tooltip)
        .into_iter()
        .filter_map(|s| s.bounds)
        .last()
        .unwrap();
    assert_eq!(
        last,
        RectPatch {
            x: Some(350),
            y: Some(100),
            width: Some(200),
            height: Some(120),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn size_is_scaled_by_zoom() {
    let scene = scene(1.5);
    let portal = PortalWindow::open(
        &scene.store,
        &Debouncer::new(),
        scene.bridge.shared(),
        tooltip_spec(),
        content(),
    )
    .unwrap();
    sleep(Duration::from_secs(2)).await;

    portal.notify_content_changed();
    sleep(Duration::from_millis(10)).await;

    let last = sets(&scene.tooltip)
        .into_iter()
        .filter_map(|s| s.bounds)
        .last()
        .unwrap();
    assert_eq!((last.width, last.height), (Some(300), Some(180)));
}

/// Both windows report their geometry at 1s, which counts as the first
/// content update. The parent then moves at 1.3s; returns the bounds
/// sent for that move.
async fn bounds_after_parent_move(timings: SyncTimings) -> RectPatch {
    let scene = scene_with(timings, 1.0);
    let portal = PortalWindow::open(
        &scene.store,
        &Debouncer::new(),
        scene.bridge.shared(),
        tooltip_spec(),
        content(),
    )
    .unwrap();
    sleep(Duration::from_millis(1300)).await;

    let before = sets(&scene.tooltip).len();
    portal.request_update(UpdateReasons {
        parent_window: true,
        ..Default::default()
    });
    sleep(Duration::from_millis(10)).await;

    let sent = sets(&scene.tooltip);
    assert_eq!(sent.len(), before + 1);
    sent[before].bounds.unwrap()
}

#[tokio::test(start_paused = true)]
async fn parent_move_right_after_first_content_also_resizes() {
    let bounds = bounds_after_parent_move(SyncTimings::default()).await;
    assert_eq!(bounds.width, Some(200));
    assert_eq!(bounds.x, Some(350));
}

#[tokio::test(start_paused = true)]
async fn first_dom_settle_comes_from_timings() {
    let timings = SyncTimings {
        first_dom_settle: Duration::from_millis(50),
        ..SyncTimings::default()
    };
    let bounds = bounds_after_parent_move(timings).await;
    assert_eq!(bounds.width, None);
    assert_eq!(bounds.height, None);
    assert_eq!((bounds.x, bounds.y), (Some(350), Some(100)));
}

#[tokio::test(start_paused = true)]
async fn fit_to_display_shrinks_oversized_window() {
    let store = WindowStore::new(SyncTimings::default());
    let (bridge, host) = LocalBridge::pair(Some("tooltip_window".into()));
    let window = FixedWindow {
        bounds: Rect::new(-10, 0, 2500, 100),
        zoom: 1.0,
    };
    let received = spawn_host(host, window, "tooltip_window");
    let portal =
        PortalWindow::open(&store, &Debouncer::new(), bridge.shared(), tooltip_spec(), content())
            .unwrap();
    assert!(!portal.fit_to_display());

    sleep(Duration::from_secs(2)).await;
    assert!(portal.fit_to_display());
    sleep(Duration::from_millis(10)).await;
    let last = sets(&received)
        .into_iter()
        .filter_map(|s| s.bounds)
        .last()
        .unwrap();
    assert_eq!(
        last,
        RectPatch {
            x: Some(0),
            y: None,
            width: Some(1920),
            height: None,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn fit_to_display_leaves_fitting_window_alone() {
    let scene = scene(1.0);
    let portal = PortalWindow::open(
        &scene.store,
        &Debouncer::new(),
        scene.bridge.shared(),
        tooltip_spec(),
        content(),
    )
    .unwrap();
    sleep(Duration::from_secs(2)).await;
    assert!(!portal.fit_to_display());
}

#[tokio::test]
async fn opening_closed_window_fails() {
    let store = WindowStore::new(SyncTimings::default());
    let (bridge, host) = LocalBridge::pair(Some("tooltip_window".into()));
    host.close();
    let opened =
        PortalWindow::open(&store, &Debouncer::new(), bridge.shared(), tooltip_spec(), content());
    let err = opened.err().unwrap();
    assert_eq!(err, SyncError::WindowClosed("tooltip_window".into()));
}

#[test]
fn reasons_accumulate_until_handled() {
    let mut queued = UpdateReasons::default();
    queued.merge(UpdateReasons {
        dom: true,
        ..Default::default()
    });
    queued.merge(UpdateReasons {
        parent_window: true,
        ..Default::default()
    });
    let handled = queued;
    queued.merge(UpdateReasons {
        manual_reference: true,
        ..Default::default()
    });
    queued.clear(handled);
    assert_eq!(
        queued,
        UpdateReasons {
            manual_reference: true,
            ..Default::default()
        }
    );
}
