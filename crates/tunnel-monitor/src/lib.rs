//! Live tunnel dashboard and logging setup.

mod dashboard;
mod input;
mod logging;
mod state;

pub use dashboard::{Dashboard, DashboardAction};
pub use input::{Field, FormOutcome, RouteForm};
pub use logging::{setup_file_logging, setup_logging, LOG_FILE_NAME};
pub use state::{DashboardState, Notice, NoticeLevel};
