//! Swappable schema holder.
//!
//! `LiveSchema` keeps the current [`ResolvedTypeGraph`] behind an `ArcSwap`
//! so readers never block. A rebuild synthesizes a complete new graph from a
//! registry; when that fails the previous graph stays in place.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use tracing::{info, warn};
use typeweave_core::registry::with_registry;
use typeweave_core::{MetadataRegistry, TypeName};

use super::{ResolvedTypeGraph, SchemaSynthesizer};
use crate::config::SchemaConfig;
use crate::error::GraphQLError;

/// State of the live schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// No schema has been built yet.
    Uninitialized,
    /// The latest build succeeded.
    Ready,
    /// The latest build failed. A previously built schema may still be served.
    Failed,
}

#[derive(Clone)]
pub struct LiveSchema {
    graph: Arc<ArcSwapOption<ResolvedTypeGraph>>,
    synthesizer: Arc<SchemaSynthesizer>,
    resolver_classes: Arc<Vec<TypeName>>,
    state: Arc<RwLock<SchemaState>>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl LiveSchema {
    #[must_use]
    pub fn new(synthesizer: SchemaSynthesizer, resolver_classes: Vec<TypeName>) -> Self {
        Self {
            graph: Arc::new(ArcSwapOption::empty()),
            synthesizer: Arc::new(synthesizer),
            resolver_classes: Arc::new(resolver_classes),
            state: Arc::new(RwLock::new(SchemaState::Uninitialized)),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_config(config: &SchemaConfig, resolver_classes: Vec<TypeName>) -> Self {
        Self::new(
            SchemaSynthesizer::new(config.to_schema_builder_config()),
            resolver_classes,
        )
    }

    pub fn state(&self) -> SchemaState {
        *self.state.read()
    }

    /// Message of the latest failed build, cleared by a successful one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// The graph currently served, if any.
    pub fn current(&self) -> Option<Arc<ResolvedTypeGraph>> {
        self.graph.load_full()
    }

    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaUnavailable` if no build has succeeded.
    pub fn get(&self) -> Result<Arc<ResolvedTypeGraph>, GraphQLError> {
        self.current().ok_or(GraphQLError::SchemaUnavailable)
    }

    /// Synthesizes a new graph from `registry` and swaps it in.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaBuildFailed` with every problem found; the
    /// previously served graph is kept.
    pub fn rebuild(&self, registry: &MetadataRegistry) -> Result<Arc<ResolvedTypeGraph>, GraphQLError> {
        info!(generation = registry.generation(), "Rebuilding schema");
        match self.synthesizer.synthesize(registry, &self.resolver_classes) {
            Ok(graph) => {
                let graph = Arc::new(graph);
                self.graph.store(Some(Arc::clone(&graph)));
                *self.state.write() = SchemaState::Ready;
                *self.last_error.write() = None;
                info!("Schema rebuilt successfully");
                Ok(graph)
            }
            Err(e) => {
                let error_msg = e.to_string();
                warn!(
                    error = %error_msg,
                    problems = e.problems().len(),
                    keeps_previous = self.graph.load().is_some(),
                    "Failed to rebuild schema"
                );
                *self.state.write() = SchemaState::Failed;
                *self.last_error.write() = Some(error_msg);
                Err(GraphQLError::SchemaBuildFailed(e))
            }
        }
    }

    /// [`rebuild`](Self::rebuild) from the process-wide registry.
    pub fn rebuild_global(&self) -> Result<Arc<ResolvedTypeGraph>, GraphQLError> {
        with_registry(|registry| self.rebuild(registry))
    }

    /// Executes a request against the current graph.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaUnavailable` if no build has succeeded.
    pub async fn execute(
        &self,
        request: impl Into<async_graphql::Request>,
    ) -> Result<async_graphql::Response, GraphQLError> {
        let graph = self.get()?;
        Ok(graph.execute(request).await)
    }
}

impl std::fmt::Debug for LiveSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSchema")
            .field("state", &self.state())
            .field("resolver_classes", &self.resolver_classes)
            .finish()
    }
}
