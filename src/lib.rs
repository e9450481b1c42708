pub mod config;
pub mod locator;
pub mod navigator;
pub mod notify;
pub mod poller;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use navigator::FormNavigator;
pub use poller::{Poller, ShiftSource};
pub use report::ReportEntry;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
