pub mod aggregate;
pub mod error;
pub mod event;
pub mod intake;
pub mod messages;
pub mod report;
pub mod traits;
pub mod types;
pub mod wire;

pub use aggregate::aggregate;
pub use error::{CheckError, ErrorKind};
pub use event::{CheckEvent, CheckEventKind, CheckState, Phase};
pub use intake::{AcceptedArtifact, IntakeRejection, IntakeSource, UploadSlot};
pub use messages::{format_currency, FailureStage, Locale};
pub use report::{Amount, CheckReport, ExtractResult, Finding, Ingredient, PenaltyLine, ProductInfo, Severity};
pub use traits::CheckService;
pub use types::{Artifact, MediaType, MAX_ARTIFACT_BYTES};
