use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

pub const REFRESH_DEBOUNCE: Duration = Duration::from_millis(300);

/// External change notifications that may require a sidebar refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    ConfigChanged,
    ProfilesChanged,
    TabsChanged,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub notices: Vec<Notice>,
}

impl Batch {
    /// Config or profile changes need a full regroup; tab changes alone only
    /// touch active markers.
    pub fn needs_full_refresh(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n, Notice::ConfigChanged | Notice::ProfilesChanged))
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

/// Waits for the next notice, then keeps absorbing notices until `window`
/// passes without a new one. Returns `None` once the channel is closed and
/// drained.
pub async fn next_batch(rx: &mut UnboundedReceiver<Notice>, window: Duration) -> Option<Batch> {
    let first = rx.recv().await?;
    let mut batch = Batch {
        notices: vec![first],
    };
    loop {
        match timeout(window, rx.recv()).await {
            Ok(Some(notice)) => batch.notices.push(notice),
            // Closed: hand out what we have; the next call returns None.
            Ok(None) => return Some(batch),
            Err(_) => return Some(batch),
        }
    }
}
