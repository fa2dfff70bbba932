use crate::client::instance_repository::InstanceRepository;
use crate::config::Config;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub instances: Arc<dyn InstanceRepository>,
    pub config: Arc<Config>,
    /// Render-cycle counter for tree builds. Each tree request claims the
    /// next generation; a build whose generation is no longer current is
    /// discarded instead of merged.
    pub tree_generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(instances: Arc<dyn InstanceRepository>, config: Arc<Config>) -> Self {
        AppState {
            instances,
            config,
            tree_generation: Arc::new(AtomicU64::new(0)),
        }
    }
}
