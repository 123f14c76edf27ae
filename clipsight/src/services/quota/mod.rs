//! Request admission: per-tier daily quotas and the sensitive-action limiter.
//!
//! The admission check is the gate every analysis request passes before it
//! reaches business logic. Identity resolution and the decision types live in
//! `clipsight-core`; this module owns the counter stores and the orchestrator.
//!
//! Policy note: the quota layer fails open. A broken counter backend degrades
//! to "allow and log", never to a denied request, because the quota is a soft
//! usage cap and not a billing-accurate meter.

pub mod anonymous;
pub mod profile;
pub mod service;
pub mod window;


pub use service::AdmissionService;
