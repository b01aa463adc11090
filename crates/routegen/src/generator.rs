//! The generation pipeline.
//!
//! ```text
//! registrations ─▶ build endpoints (parallel) ─▶ stable order ─▶ partition
//!                                                                  │
//!            unit ◀─ render registrations ◀─ render thunks (parallel)
//! ```

use crate::cache::{endpoint_key, fingerprint, thunk_key, BuildResult, CacheStats, GenerationCache};
use crate::output::GenerationOutput;
use rayon::prelude::*;
use routegen_codegen::{partition, stable_order, EmitOptions, Emitter, ThunkGroup};
use routegen_config::{GeneratorConfig, InvalidEndpointPolicy};
use routegen_core::{
    Diagnostic, Endpoint, MetadataProvider, RawRegistration, RoutegenResult, Severity,
    SignatureProvider, TypeCatalog,
};
use routegen_resolve::{CapabilityCache, EndpointBuilder};
use routegen_telemetry::metrics;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Runs generation passes and keeps the incremental cache between them.
///
/// # Example
///
/// ```
/// use routegen::{Generator, GeneratorConfig, SourceProvider};
///
/// let source = r#"
///     #[route(get, "/todos/{id}")]
///     async fn get_todo(id: i32) -> String { todo!() }
/// "#;
/// let provider = SourceProvider::parse(source, "todos.rs").unwrap();
///
/// let mut generator = Generator::new(GeneratorConfig::default()).unwrap();
/// let output = generator.generate(&provider).unwrap();
///
/// assert!(!output.has_errors());
/// assert!(output.units[0].content.contains("map_get_get_todo"));
/// ```
pub struct Generator {
    config: GeneratorConfig,
    emitter: Emitter,
    providers: Vec<Arc<dyn MetadataProvider>>,
    cache: GenerationCache,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("providers", &providers)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Generator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `RoutegenError::Codegen` if the configured runtime crate is
    /// not a Rust path.
    pub fn new(config: GeneratorConfig) -> RoutegenResult<Self> {
        let emitter = Emitter::new(&EmitOptions {
            runtime_path: config.output.runtime_crate.clone(),
            stub_invalid: config.emit.invalid_endpoints == InvalidEndpointPolicy::Stub,
        })?;
        metrics::describe_metrics();
        Ok(Self {
            config,
            emitter,
            providers: Vec::new(),
            cache: GenerationCache::new(),
        })
    }

    /// Registers a metadata provider, invoked once per built endpoint.
    #[must_use]
    pub fn with_metadata_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The incremental cache.
    #[must_use]
    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }

    /// Drops all cached endpoints and thunks.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Runs one pass over a snapshot of registrations.
    ///
    /// Problems with individual registrations are reported as diagnostics
    /// in the output; an `Err` means the pass itself could not complete.
    ///
    /// # Errors
    ///
    /// Returns `RoutegenError::Codegen` if rendering fails.
    #[instrument(skip_all, fields(registrations = provider.registrations().len()))]
    pub fn generate(&mut self, provider: &dyn SignatureProvider) -> RoutegenResult<GenerationOutput> {
        let mut stats = CacheStats::default();

        let built = self.build_endpoints(provider.registrations(), provider.catalog(), &mut stats);
        let mut endpoints = Vec::with_capacity(built.len());
        let mut dropped = Vec::new();
        for result in built {
            match result {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(diagnostic) => {
                    warn!(location = %diagnostic.location, "{}", diagnostic.message);
                    dropped.push(diagnostic);
                }
            }
        }
        if !self.config.emit.emit_hints {
            for endpoint in &mut endpoints {
                endpoint.diagnostics.retain(|d| d.severity != Severity::Hint);
            }
        }

        let endpoints = into_stable_order(endpoints);
        let groups = partition(&endpoints)?;
        debug!(endpoints = endpoints.len(), groups = groups.len(), "endpoints partitioned");

        let thunks = self.render_thunks(&endpoints, &groups, &mut stats)?;
        let unit = self
            .emitter
            .render_unit(&self.config.output.unit_name, &endpoints, &groups, &thunks)?;
        if self.config.cache.enabled {
            self.cache.finish_pass();
        }

        let mut diagnostics: Vec<Diagnostic> = endpoints
            .iter()
            .flat_map(|e| e.diagnostics.iter().cloned())
            .chain(dropped.iter().cloned())
            .collect();
        diagnostics.sort();

        let emitted = groups.iter().map(|g| g.members.len()).sum();
        let invalid = endpoints.iter().filter(|e| e.has_errors()).count();
        metrics::record_endpoints(emitted, invalid, dropped.len());
        metrics::record_thunk_groups(groups.len());
        for diagnostic in &diagnostics {
            metrics::record_diagnostic(diagnostic.kind.code(), severity_label(diagnostic.severity));
        }
        info!(
            emitted,
            invalid,
            dropped = dropped.len(),
            thunks = groups.len(),
            endpoint_hits = stats.endpoint_hits,
            endpoint_misses = stats.endpoint_misses,
            thunk_hits = stats.thunk_hits,
            thunk_misses = stats.thunk_misses,
            "generation finished"
        );

        Ok(GenerationOutput {
            diagnostics,
            units: vec![unit],
            endpoints,
            groups,
            cache_stats: stats,
        })
    }

    fn build_endpoints(
        &mut self,
        registrations: &[RawRegistration],
        catalog: &TypeCatalog,
        stats: &mut CacheStats,
    ) -> Vec<BuildResult> {
        let caching = self.config.cache.enabled;
        let context = if caching {
            let providers: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
            fingerprint(&(fingerprint(catalog), providers))
        } else {
            String::new()
        };
        let keys: Vec<Option<String>> = registrations
            .iter()
            .map(|r| caching.then(|| endpoint_key(r, &context)))
            .collect();

        let capabilities = CapabilityCache::new(catalog);
        let builder = EndpointBuilder::new(&capabilities, &self.providers);
        let cache = &self.cache;
        let build = |(registration, key): (&RawRegistration, &Option<String>)| {
            match key.as_deref().and_then(|k| cache.endpoint(k)) {
                Some(hit) => (hit.clone(), true),
                None => (builder.build(registration), false),
            }
        };
        let results: Vec<(BuildResult, bool)> = if self.config.emit.parallel {
            registrations.par_iter().zip(keys.par_iter()).map(build).collect()
        } else {
            registrations.iter().zip(keys.iter()).map(build).collect()
        };
        debug!(
            registrations = registrations.len(),
            types = capabilities.len(),
            "endpoints built"
        );

        let mut built = Vec::with_capacity(results.len());
        for ((result, hit), key) in results.into_iter().zip(keys) {
            if let Some(key) = key {
                if hit {
                    self.cache.touch_endpoint(&key);
                } else {
                    self.cache.store_endpoint(key, result.clone());
                }
                metrics::record_cache_lookup("endpoint", hit);
            }
            if hit {
                stats.endpoint_hits += 1;
            } else {
                stats.endpoint_misses += 1;
            }
            built.push(result);
        }
        built
    }

    fn render_thunks(
        &mut self,
        endpoints: &[Endpoint],
        groups: &[ThunkGroup],
        stats: &mut CacheStats,
    ) -> RoutegenResult<Vec<String>> {
        let caching = self.config.cache.enabled;
        let runtime = &self.config.output.runtime_crate;
        let keys: Vec<Option<String>> = groups
            .iter()
            .map(|g| caching.then(|| thunk_key(g.key.as_str(), runtime)))
            .collect();

        let cache = &self.cache;
        let emitter = &self.emitter;
        let render = |(group, key): (&ThunkGroup, &Option<String>)| {
            match key.as_deref().and_then(|k| cache.thunk(k)) {
                Some(hit) => Ok((hit.clone(), true)),
                None => emitter
                    .render_thunk(&group.key, &endpoints[group.representative])
                    .map(|text| (text, false)),
            }
        };
        let rendered: Vec<(String, bool)> = if self.config.emit.parallel {
            groups
                .par_iter()
                .zip(keys.par_iter())
                .map(render)
                .collect::<RoutegenResult<_>>()?
        } else {
            groups
                .iter()
                .zip(keys.iter())
                .map(render)
                .collect::<RoutegenResult<_>>()?
        };

        let mut thunks = Vec::with_capacity(rendered.len());
        for ((text, hit), key) in rendered.into_iter().zip(keys) {
            if let Some(key) = key {
                if hit {
                    self.cache.touch_thunk(&key);
                } else {
                    self.cache.store_thunk(key, text.clone());
                }
                metrics::record_cache_lookup("thunk", hit);
            }
            if hit {
                stats.thunk_hits += 1;
            } else {
                stats.thunk_misses += 1;
            }
            thunks.push(text);
        }
        Ok(thunks)
    }
}

fn into_stable_order(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let order = stable_order(&endpoints);
    let mut slots: Vec<Option<Endpoint>> = endpoints.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

const fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Hint => "hint",
    }
}
