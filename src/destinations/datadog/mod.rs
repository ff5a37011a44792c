//! Datadog destinations
//!
//! Two transports share one builder: [`api`] submits every entry directly to
//! the logs intake over HTTP, [`agent`] relays it to a local agent over TCP.
//! Both are fire-and-forget with a single attempt per entry.

mod agent;
mod api;
mod options;

pub use agent::AgentShipper;
pub use api::{intake_url, ApiShipper, API_KEY_HEADER};
pub use options::{
    agent, api, AgentFormat, DatadogBuilder, DatadogConfig, API_KEY_VAR, DEFAULT_FLUSH_TIMEOUT,
    DEFAULT_SITE, EU, SITE_VAR, US,
};
