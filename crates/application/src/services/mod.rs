//! Application services - Mediation stages and their composition

mod admission_controller;
mod dispatcher;
mod fault_injector;
mod pipeline;

pub use admission_controller::{
    AdmissionConfig, AdmissionController, AdmissionDecision, AdmissionOutcome, StoreFailureMode,
};
pub use dispatcher::Dispatcher;
pub use fault_injector::{
    FaultInjector, FaultOutcome, INJECTED_ERROR_STATUS, RandomSource, ThreadRandom,
};
pub use pipeline::{
    AdmissionStage, FaultStage, GatewayPipeline, PipelineDecision, PipelineStage, Rejection,
    StageOutcome,
};
