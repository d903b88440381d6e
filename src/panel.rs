//! Panel lifecycle: mounting the sidebar view into the host layout and
//! reversibly patching the host's content region so both share the window.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::layout::NodeId;

pub const PANEL_WIDTH: u32 = 280;
pub const STARTUP_DELAY: Duration = Duration::from_millis(1000);

/// Inline overrides applied to the authoritative content region.
pub const CONTENT_PATCH: [(&str, &str); 3] = [
    ("width", "auto"),
    ("flex", "1 1 auto"),
    ("min-width", "0"),
];

pub fn wrapper_style(width: u32) -> String {
    format!(
        "width: {width}px; flex: 0 0 {width}px; display: flex; flex-direction: column; \
         background: var(--bs-body-bg, #1e1e1e); \
         border-right: 1px solid var(--bs-border-color, #333); \
         box-shadow: 2px 0 10px rgba(0,0,0,0.3); z-index: 999"
    )
}

/// Style block turning the host root into a horizontal flex row and letting
/// its content child grow into the remaining space.
pub fn layout_css(root: &str) -> String {
    format!(
        "{root} {{\n\
         \x20   display: flex !important;\n\
         \x20   flex-direction: row !important;\n\
         \x20   width: 100vw !important;\n\
         \x20   height: 100vh !important;\n\
         \x20   overflow: hidden !important;\n\
         }}\n\
         {root} > .content,\n\
         {root} > [class*=\"content\"] {{\n\
         \x20   flex: 1 1 auto !important;\n\
         \x20   width: 0 !important;\n\
         \x20   max-width: 100% !important;\n\
         \x20   min-width: 0 !important;\n\
         }}\n"
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    Hidden,
    Visible,
}

/// A live view created by the rendering surface.
#[derive(Debug, PartialEq, Eq)]
pub struct ViewHandle {
    id: u64,
}

impl ViewHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Creates and destroys the panel's view.
pub trait PanelSurface {
    fn attach(&mut self) -> ViewHandle;
    fn detach(&mut self, view: ViewHandle);
}

/// Surface for hosts that render elsewhere; only tracks live views.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_id: u64,
    attached: HashSet<u64>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }
}

impl PanelSurface for HeadlessSurface {
    fn attach(&mut self) -> ViewHandle {
        self.next_id += 1;
        self.attached.insert(self.next_id);
        ViewHandle::new(self.next_id)
    }

    fn detach(&mut self, view: ViewHandle) {
        self.attached.remove(&view.id());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRegion {
    pub node: NodeId,
    pub depth: usize,
}

/// Inline style of a region as it was before patching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSnapshot {
    pub node: NodeId,
    pub css_text: String,
}

/// Structural access to the host layout.
pub trait LayoutAdapter {
    fn locate_root(&self) -> Option<NodeId>;
    fn locate_content_regions(&self, root: NodeId) -> Vec<ContentRegion>;
    /// Wraps the view in a fixed-width container inserted as the root's
    /// first child. Returns the container.
    fn insert_panel(&mut self, root: NodeId, view: &ViewHandle, width: u32) -> NodeId;
    fn remove_panel(&mut self, wrapper: NodeId);
    fn inject_style(&mut self, root: NodeId) -> NodeId;
    fn remove_style(&mut self, style: NodeId);
    fn patch(&mut self, regions: &[NodeId]) -> Vec<RegionSnapshot>;
    fn restore(&mut self, snapshots: &[RegionSnapshot]);
}

/// The deepest candidate wins; among equals the later one in document order.
pub fn authoritative_region(regions: &[ContentRegion]) -> Option<NodeId> {
    regions
        .iter()
        .enumerate()
        .max_by_key(|(i, r)| (r.depth, *i))
        .map(|(_, r)| r.node)
}

/// What the panel needs to operate on from the outside (toolbar, the
/// sidebar's own close button).
pub trait PanelControl {
    fn state(&self) -> PanelState;
    fn show(&mut self) -> PanelState;
    fn hide(&mut self) -> PanelState;

    fn is_visible(&self) -> bool {
        self.state() == PanelState::Visible
    }

    fn toggle(&mut self) -> PanelState {
        match self.state() {
            PanelState::Visible => self.hide(),
            PanelState::Hidden => self.show(),
        }
    }
}

struct Mounted {
    view: ViewHandle,
    wrapper: NodeId,
    style: NodeId,
    patched: Vec<RegionSnapshot>,
}

pub struct PanelManager<L, S> {
    layout: L,
    surface: S,
    config: Arc<dyn ConfigStore>,
    width: u32,
    mounted: Option<Mounted>,
}

impl<L: LayoutAdapter, S: PanelSurface> PanelManager<L, S> {
    pub fn new(layout: L, surface: S, config: Arc<dyn ConfigStore>) -> Self {
        Self {
            layout,
            surface,
            config,
            width: PANEL_WIDTH,
            mounted: None,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Shows the panel unless visibility was explicitly persisted as false.
    pub fn initialize(&mut self) -> PanelState {
        let persisted = self.config.sidebar_settings().sidebar_visible;
        if persisted != Some(false) {
            return self.show();
        }
        self.state()
    }

    fn mount(&mut self) -> Option<Mounted> {
        let Some(root) = self.layout.locate_root() else {
            warn!("host root element not found, panel not mounted");
            return None;
        };

        let view = self.surface.attach();
        let wrapper = self.layout.insert_panel(root, &view, self.width);
        let style = self.layout.inject_style(root);

        let regions = self.layout.locate_content_regions(root);
        let patched = match authoritative_region(&regions) {
            Some(node) => self.layout.patch(&[node]),
            None => {
                debug!("no content region found, host content left unpatched");
                Vec::new()
            }
        };

        Some(Mounted {
            view,
            wrapper,
            style,
            patched,
        })
    }

    fn unmount(&mut self, mounted: Mounted) {
        self.layout.restore(&mounted.patched);
        self.layout.remove_style(mounted.style);
        self.surface.detach(mounted.view);
        self.layout.remove_panel(mounted.wrapper);
    }

    fn persist_visible(&self, visible: bool) {
        self.config
            .update_sidebar_settings(&mut |s| s.sidebar_visible = Some(visible));
        self.config.save();
    }
}

impl<L: LayoutAdapter, S: PanelSurface> PanelControl for PanelManager<L, S> {
    fn state(&self) -> PanelState {
        if self.mounted.is_some() {
            PanelState::Visible
        } else {
            PanelState::Hidden
        }
    }

    fn show(&mut self) -> PanelState {
        if self.mounted.is_some() {
            return PanelState::Visible;
        }
        let Some(mounted) = self.mount() else {
            return PanelState::Hidden;
        };
        self.mounted = Some(mounted);
        self.persist_visible(true);
        info!("sidebar shown");
        PanelState::Visible
    }

    fn hide(&mut self) -> PanelState {
        let Some(mounted) = self.mounted.take() else {
            return PanelState::Hidden;
        };
        self.unmount(mounted);
        self.persist_visible(false);
        info!("sidebar hidden");
        PanelState::Hidden
    }
}

/// Startup hook: waits for the host to settle, then applies the persisted
/// visibility.
pub async fn initialize_after_ready<L: LayoutAdapter, S: PanelSurface>(
    manager: &mut PanelManager<L, S>,
    delay: Duration,
) -> PanelState {
    tokio::time::sleep(delay).await;
    manager.initialize()
}
