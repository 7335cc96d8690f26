//! Pipeline composer - Fixed sequence of mediation stages
//!
//! The dispatcher selects the backend binding first, then every route runs
//! the same stage list (fault injection, then admission) before the request
//! is forwarded. The pipeline is assembled once and holds no mutable state
//! of its own.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{DecisionKind, RouteBinding};
use thiserror::Error;

use super::admission_controller::{AdmissionController, AdmissionOutcome};
use super::dispatcher::Dispatcher;
use super::fault_injector::{FaultInjector, FaultOutcome};
use crate::ports::DecisionSinkPort;
use crate::request_context::RequestContext;

/// Why a stage terminated a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No tenant was resolved for the request
    #[error("tenant not found")]
    MissingTenant,

    /// Tenant quota exhausted for the current window
    #[error("rate limit exceeded")]
    RateLimited {
        /// Window limit
        limit: u32,
        /// Requests counted in the window
        used: u32,
    },

    /// Synthetic failure injected by the fault policy
    #[error("service unavailable")]
    ServiceUnavailable,

    /// Counter store failed and admission fails closed
    #[error("counter store unavailable")]
    CounterStoreUnavailable,

    /// No binding matched the path
    #[error("route not found")]
    RouteNotFound,
}

/// Result of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Hand the request to the next stage
    Continue,
    /// Terminate with an error outcome
    Reject(Rejection),
    /// Terminate without writing any response
    Drop,
}

/// One step of the mediation chain
#[async_trait]
pub trait PipelineStage: Send + Sync + std::fmt::Debug {
    /// Stable stage name
    fn name(&self) -> &'static str;

    /// Whether this stage may terminate a request
    ///
    /// A stage answering `false` must only ever return
    /// [`StageOutcome::Continue`].
    fn can_short_circuit(&self) -> bool {
        true
    }

    /// Evaluate the request; must emit at least one decision event
    async fn evaluate(&self, ctx: &RequestContext) -> StageOutcome;
}

/// Stage applying the process-wide fault policy
#[derive(Debug)]
pub struct FaultStage {
    injector: Arc<FaultInjector>,
}

impl FaultStage {
    /// Wrap an injector
    pub const fn new(injector: Arc<FaultInjector>) -> Self {
        Self { injector }
    }
}

#[async_trait]
impl PipelineStage for FaultStage {
    fn name(&self) -> &'static str {
        "fault_injection"
    }

    async fn evaluate(&self, ctx: &RequestContext) -> StageOutcome {
        match self.injector.evaluate(ctx).await {
            FaultOutcome::Pass => StageOutcome::Continue,
            FaultOutcome::Fail { .. } => StageOutcome::Reject(Rejection::ServiceUnavailable),
            FaultOutcome::Drop => StageOutcome::Drop,
        }
    }
}

/// Stage enforcing the tenant's admission quota
///
/// Refuses requests without a resolved tenant before the controller is
/// consulted.
#[derive(Debug)]
pub struct AdmissionStage {
    controller: Arc<AdmissionController>,
    sink: Arc<dyn DecisionSinkPort>,
}

impl AdmissionStage {
    /// Wrap a controller
    pub fn new(controller: Arc<AdmissionController>, sink: Arc<dyn DecisionSinkPort>) -> Self {
        Self { controller, sink }
    }
}

#[async_trait]
impl PipelineStage for AdmissionStage {
    fn name(&self) -> &'static str {
        "admission"
    }

    async fn evaluate(&self, ctx: &RequestContext) -> StageOutcome {
        let Some(tenant) = ctx.tenant() else {
            self.sink.emit(ctx.event(DecisionKind::Block, "tenant not found"));
            return StageOutcome::Reject(Rejection::MissingTenant);
        };

        let decision = self.controller.admit(ctx, tenant).await;
        match (decision.allowed, decision.outcome) {
            (true, _) => StageOutcome::Continue,
            (false, AdmissionOutcome::StoreUnavailable) => {
                StageOutcome::Reject(Rejection::CounterStoreUnavailable)
            },
            (false, _) => StageOutcome::Reject(Rejection::RateLimited {
                limit: decision.limit,
                used: decision.used,
            }),
        }
    }
}

/// Final verdict for a request
#[derive(Debug)]
pub enum PipelineDecision<'a, H> {
    /// Forward to the bound handler
    Forward(&'a RouteBinding<H>),
    /// Answer with an error outcome
    Reject(Rejection),
    /// Write nothing
    Drop,
}

/// The assembled mediation chain
#[derive(Debug)]
pub struct GatewayPipeline<H> {
    dispatcher: Dispatcher<H>,
    stages: Vec<Arc<dyn PipelineStage>>,
}

impl<H> GatewayPipeline<H> {
    /// Assemble the standard chain: fault injection, then admission
    pub fn new(
        dispatcher: Dispatcher<H>,
        fault: Arc<FaultInjector>,
        admission: Arc<AdmissionController>,
        sink: Arc<dyn DecisionSinkPort>,
    ) -> Self {
        Self::with_stages(
            dispatcher,
            vec![
                Arc::new(FaultStage::new(fault)),
                Arc::new(AdmissionStage::new(admission, sink)),
            ],
        )
    }

    /// Assemble a chain from explicit stages, evaluated in order
    pub const fn with_stages(dispatcher: Dispatcher<H>, stages: Vec<Arc<dyn PipelineStage>>) -> Self {
        Self { dispatcher, stages }
    }

    /// Names of the stages in evaluation order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// The route table
    pub const fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    /// Run the chain for one request
    ///
    /// Stages after the first terminating one are never evaluated.
    pub async fn handle(&self, ctx: &RequestContext) -> PipelineDecision<'_, H> {
        let Some(binding) = self.dispatcher.route(ctx) else {
            return PipelineDecision::Reject(Rejection::RouteNotFound);
        };

        for stage in &self.stages {
            match stage.evaluate(ctx).await {
                StageOutcome::Continue => {},
                StageOutcome::Reject(rejection) => {
                    debug_assert!(
                        stage.can_short_circuit(),
                        "stage {} rejected but declares it never terminates",
                        stage.name()
                    );
                    tracing::debug!(stage = stage.name(), %rejection, "Request rejected");
                    return PipelineDecision::Reject(rejection);
                },
                StageOutcome::Drop => {
                    debug_assert!(
                        stage.can_short_circuit(),
                        "stage {} dropped but declares it never terminates",
                        stage.name()
                    );
                    tracing::debug!(stage = stage.name(), "Request dropped");
                    return PipelineDecision::Drop;
                },
            }
        }

        PipelineDecision::Forward(binding)
    }
}
