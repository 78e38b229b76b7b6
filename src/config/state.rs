// Application state module
// Shared state handed to every connection and request

use std::sync::Arc;

use super::types::Config;
use crate::handler::FileResolver;
use crate::storage::FileEntry;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub resolver: Arc<FileResolver>,
}

impl AppState {
    pub fn new(config: Config, root: Arc<dyn FileEntry>) -> Self {
        Self {
            config,
            resolver: Arc::new(FileResolver::new(root)),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryEntry;

    #[test]
    fn test_access_log_follows_config() {
        let root: Arc<dyn FileEntry> = Arc::new(MemoryEntry::file("a.txt", "a"));

        let state = AppState::new(Config::default(), Arc::clone(&root));
        assert!(state.access_log_enabled());

        let mut config = Config::default();
        config.logging.access_log = false;
        assert!(!AppState::new(config, root).access_log_enabled());
    }
}
