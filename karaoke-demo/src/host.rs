use karaoke_core::{Host, LineStatus, RenderedLineId};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, info};

/// A headless surface that records element ids and logs what is mounted.
pub struct LogHost {
    elements: Mutex<HashSet<String>>,
}

impl LogHost {
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            elements: Mutex::new(HashSet::from([container_id.into()])),
        }
    }
}

impl Host for LogHost {
    fn has_element(&self, id: &str) -> bool {
        self.elements
            .lock()
            .is_ok_and(|elements| elements.contains(id))
    }

    fn inject_stylesheet(&self, id: &str, css: &str) {
        if let Ok(mut elements) = self.elements.lock() {
            elements.insert(id.to_string());
        }
        info!("Injected stylesheet #{} ({} bytes)", id, css.len());
    }

    fn mount(&self, container_id: &str, markup: &str) {
        debug!("Mounted into #{}:\n{}", container_id, markup);
    }

    fn append_line(&self, container_id: &str, markup: &str) {
        debug!("#{} += {}", container_id, markup);
    }

    fn add_class(&self, id: &str, class: &str) {
        debug!("#{} classList += {}", id, class);
    }

    fn set_line_status(&self, line: RenderedLineId, status: LineStatus) {
        debug!("{} -> {:?}", line, status);
    }

    fn remove_line(&self, line: RenderedLineId) {
        debug!("{} removed", line);
    }
}
