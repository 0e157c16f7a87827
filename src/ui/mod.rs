pub mod output;
pub mod progress;
pub mod signals;

pub use output::{OutputFormatter, OutputMode};
pub use progress::{finish_progress_with_summary, update_file_progress, ProgressManager};
pub use signals::GracefulShutdown;
