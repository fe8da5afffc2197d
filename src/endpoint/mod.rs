//! Endpoint resolution for an intermittently available inference server.
//!
//! The server may run on the local machine, behind a tunnel published
//! through a remote registry document, or behind a static fallback domain.
//! [`resolver::EndpointResolver`] probes the candidates in that priority
//! order and caches the first reachable one for the rest of the process.

pub mod probe;
pub mod registry;
pub mod resolver;

pub use probe::Prober;
pub use registry::{RegistryClient, RegistryError, ServerIdCell, ServerStatus};
pub use resolver::{
    EndpointResolver, EndpointSource, Resolution, ResolveError, ResolvedEndpoint, ResolverOptions,
    ServerNotice,
};
