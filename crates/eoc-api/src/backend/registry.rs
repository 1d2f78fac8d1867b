use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::{Backend, v2, v3};
use crate::client::SessionClient;
use crate::error::BackendFailure;

type Constructor = Box<dyn Fn() -> Arc<dyn Backend> + Send + Sync>;

/// Ordered list of backend constructors tried during negotiation.
///
/// The default registry holds the built-in dialects, oldest firmware
/// first. Each [`SessionClient`] can carry its own registry.
pub struct Registry {
    entries: Vec<Constructor>,
}

/// Outcome of a successful negotiation.
#[derive(Debug)]
pub struct Negotiated {
    pub backend: Arc<dyn Backend>,
    /// Backends tried (and rejected) before the winner.
    pub failures: Vec<BackendFailure>,
}

impl Registry {
    /// An empty registry. Negotiation against it always fails.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a backend constructor; later registrations are tried later.
    pub fn register<F>(&mut self, constructor: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Backend> + Send + Sync + 'static,
    {
        self.entries.push(Box::new(constructor));
        self
    }

    /// Try every backend's login in order and return the first one that
    /// succeeds. On total failure every rejection is returned.
    pub async fn negotiate(
        &self,
        client: &SessionClient,
    ) -> Result<Negotiated, Vec<BackendFailure>> {
        let mut failures = Vec::new();

        for constructor in &self.entries {
            let backend = constructor();
            debug!(backend = backend.name(), "trying backend");

            match backend.login(client).await {
                Ok(()) => return Ok(Negotiated { backend, failures }),
                Err(err) => {
                    info!(backend = backend.name(), error = %err, "backend rejected");
                    failures.push(BackendFailure {
                        backend: backend.name(),
                        error: Box::new(err),
                    });
                }
            }
        }

        Err(failures)
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(|| Arc::new(v2::V2))
            .register(|| Arc::new(v3::V3));
        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
