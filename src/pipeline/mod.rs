pub mod aggregator;
pub mod events;
pub mod orchestrator;
pub mod state;
pub mod tasks;

pub use aggregator::{CoverageAccumulator, ResultAggregator, SharedMap, Slot};
pub use events::RunEvent;
pub use orchestrator::{untested_packages, Orchestrator};
pub use state::{project_name, RunConfig};
pub use tasks::{for_each_bounded, TaskGroup};
