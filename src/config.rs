use serde::{Deserialize, Serialize};

/// Kernel configuration.
/// Keeps the time model and stepping knobs small and explicit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Clock origin in seconds (`None` = start at zero).
    pub initial_time: Option<f64>,

    /// Fire periodic timers for every period a large delta crossed.
    /// If `false`, a periodic fires once per update and catches up on
    /// subsequent updates.
    pub periodic_catch_up: bool,

    /// Max completed heads a sequence pops within one step
    /// (`None` = 64). Bounds synchronous pop-and-advance cascades.
    pub max_sequence_skip: Option<usize>,
}

impl KernelConfig {
    pub(crate) const DEFAULT_SEQUENCE_SKIP: usize = 64;
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            initial_time: None,
            periodic_catch_up: false,
            max_sequence_skip: None,
        }
    }
}
