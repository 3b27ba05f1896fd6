pub mod acquisition;
pub mod monitor;
pub mod store;

pub use acquisition::Acquisition;
pub use monitor::{DashboardState, Monitor};
pub use store::ReadingStore;
