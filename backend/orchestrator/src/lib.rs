pub mod error;
pub mod orchestrator;
pub mod session;
pub mod ticker;

pub use error::{ExportError, SubmitError};
pub use orchestrator::{export_file_name, CheckOrchestrator, OrchestratorConfig, ReportExport, SubmitOutcome};
pub use session::{CheckSession, Refused, SessionError, SessionSnapshot, Tick};
pub use ticker::TickerSettings;
