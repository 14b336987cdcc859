pub mod cli;
pub mod export;
pub mod report;

pub use cli::{Cli, Commands, RunArgs};
pub use export::RunReport;
pub use report::{ReportError, Reporter};
