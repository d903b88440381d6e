//! Side panel for browsing, organizing and launching SSH connection profiles
//! inside a host terminal application.

pub mod async_config;
pub mod collapse;
pub mod config;
pub mod debounce;
pub mod host;
pub mod layout;
pub mod logger;
pub mod model;
pub mod organizer;
pub mod panel;
pub mod sidebar;
pub mod toolbar;

pub use config::{ConfigStore, FileConfigStore, HostConfig, MemoryConfigStore, SidebarSettings};
pub use model::{GroupId, PinSet, Profile};
pub use organizer::{SortMode, ViewModel};
pub use panel::{PanelControl, PanelManager, PanelState};
pub use sidebar::{ContextAction, Sidebar};
