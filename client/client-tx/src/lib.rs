pub mod compute_budget;
pub mod config;
pub mod errors;
pub mod message;
pub mod oracle;
pub mod pipeline;
pub mod priority_fee;
pub mod signer;
pub mod sponsor;
pub mod submit;

pub use config::{ConfirmationConfig, PipelineConfig};
pub use errors::{OnChainFailure, ProgramErrorTable, SigningError, SubmitError, SubmitResult};
pub use pipeline::{BuiltTransaction, PipelineClient, SubmitRequest, TransactionPipeline};
pub use priority_fee::{Percentile, PriorityFeePolicy};
pub use signer::{LocalSigner, RemoteSigner, RemoteSignerConfig, TransactionSigner};
pub use sponsor::{SponsorConfig, SponsorSubmitter};
pub use submit::SubmissionOutcome;
