//! Policy-driven disposition.

use super::{DispositionStrategy, GroupContext};
use crate::actions::{Counters, Resolver};
use crate::policy::PolicyEngine;
use crate::report::Reporter;
use crate::scanner::{FsMetadata, MetadataAccessor};

/// Classifies each group with a [`PolicyEngine`] and applies the result
/// with a [`Resolver`].
#[derive(Debug, Clone)]
pub struct AutoStrategy<M = FsMetadata> {
    engine: PolicyEngine<M>,
    resolver: Resolver,
}

impl<M: MetadataAccessor> AutoStrategy<M> {
    /// Create the strategy.
    #[must_use]
    pub fn new(engine: PolicyEngine<M>, resolver: Resolver) -> Self {
        Self { engine, resolver }
    }
}

impl<M: MetadataAccessor> DispositionStrategy for AutoStrategy<M> {
    fn name(&self) -> &'static str {
        "automatic"
    }

    fn dispose(
        &mut self,
        ctx: GroupContext<'_>,
        reporter: &dyn Reporter,
        counters: &mut Counters,
    ) -> usize {
        let classification = self.engine.classify(ctx.group);
        log::debug!(
            "Group {}: keeping {}, removing {}",
            ctx.group.key(),
            classification.kept.len(),
            classification.removed.len()
        );

        let issues = classification.issues.len();
        let failures = self.resolver.apply(&classification, reporter, counters);
        issues + failures.len()
    }
}
