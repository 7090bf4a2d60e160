pub use lander_client_api::errors;
pub use lander_client_api::execution;

pub mod api {
    pub use lander_client_api::{base, exts, Client};
}

pub mod sys {
    pub use lander_client_sys::*;
}

pub mod tx {
    pub use lander_client_tx::*;
}

pub use lander_client_tx::{
    PipelineConfig, PriorityFeePolicy, SubmitError, SubmitRequest, TransactionPipeline,
};
