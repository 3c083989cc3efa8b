pub mod bias;
pub mod entry;
pub mod features;
pub mod whales;

pub use bias::{classify, BiasCall, BiasThresholds, BiasWeights};
pub use entry::plan_entry;
pub use features::compute_features;
pub use whales::extract_whales;
