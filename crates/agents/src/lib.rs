//! Wire contracts and the HTTP client for the agent service.
//!
//! Agent responses cross a trust boundary: payloads arrive as raw JSON and
//! are converted into the typed suggestion union exactly once, here. The
//! engine talks to the service through the client traits so tests can swap
//! in local fakes.

pub mod client;
pub mod contracts;

pub use client::{HttpAgentClient, MatchingClient, OrchestrationClient, ServiceConfig};
pub use contracts::{
    OpenLineDto, OrchestrateRequest, OrchestrateResponse, OrchestrationContext, SuggestionDto,
};
