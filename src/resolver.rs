use std::path::{Path, PathBuf};

use crate::alias::{AliasRule, ImporterSide};
use crate::lookup::{ModuleId, ModuleLookup};

/// One resolution question: a specifier as written in source, plus the
/// module asking for it when known.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub specifier: &'a str,
    pub importer: Option<&'a Path>,
}

/// Answer to a [`ResolveRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A static rule rewrote the specifier to a fixed path. The path is not
    /// confirmed to exist; the host loads it as if the author had written
    /// it directly.
    Rewritten(PathBuf),
    /// A contextual rule produced a candidate and the lookup confirmed it.
    Resolved(ModuleId),
    /// No rule matched, or the candidate was not found. The host falls
    /// through to its default resolution chain; this is not an error.
    Unresolved,
}

/// Rewrite engine for one project: a validated rule table, the root all
/// relative paths hang off, and the package names the host should dedupe
/// while a link is active.
#[derive(Debug, Clone)]
pub struct AliasEngine {
    root: PathBuf,
    rules: Vec<AliasRule>,
    dedupe: Vec<String>,
}

impl AliasEngine {
    pub fn new(root: impl Into<PathBuf>, rules: Vec<AliasRule>, dedupe: Vec<String>) -> Self {
        Self {
            root: root.into(),
            rules,
            dedupe,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Package names to force a single copy of while the link is active.
    pub fn dedupe(&self) -> &[String] {
        &self.dedupe
    }

    /// Whether a specifier names a deduped package or a subpath of one.
    pub fn is_deduped(&self, specifier: &str) -> bool {
        self.dedupe.iter().any(|name| {
            specifier == name
                || specifier
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// First rule whose pattern matches, in declaration order.
    pub fn find_rule(&self, specifier: &str) -> Option<&AliasRule> {
        self.rules.iter().find(|rule| rule.matches(specifier))
    }

    /// Resolve one request against the rule table.
    pub fn resolve(&self, request: ResolveRequest<'_>, lookup: &dyn ModuleLookup) -> Resolution {
        let Some(rule) = self.find_rule(request.specifier) else {
            return Resolution::Unresolved;
        };
        log::debug!(
            "`{}` matched `{}`",
            request.specifier,
            rule.pattern().source()
        );
        self.apply(rule, request, lookup)
    }

    /// Apply one rule to a request. The caller has already matched the
    /// rule's pattern against the specifier; hosts that run their own
    /// matching pass the winning rule straight in.
    pub fn apply(
        &self,
        rule: &AliasRule,
        request: ResolveRequest<'_>,
        lookup: &dyn ModuleLookup,
    ) -> Resolution {
        match rule {
            AliasRule::Static(rule) => {
                let target = candidate_path(&self.root, &rule.replacement, "");
                log::debug!("static rewrite to {}", target.display());
                Resolution::Rewritten(target)
            }
            AliasRule::Contextual(rule) => {
                let side = rule.classify(request.importer);
                let base = rule.base_for(side);
                let residual = rule.residual(request.specifier);
                let candidate = candidate_path(&self.root, base, &residual);
                log::debug!("{}, candidate {}", side.label(), candidate.display());
                match lookup.resolve(&candidate, request.importer) {
                    Some(id) => Resolution::Resolved(id),
                    None => Resolution::Unresolved,
                }
            }
        }
    }

    /// Importer side a contextual rule would see for this request, for
    /// reporting. `None` when the matching rule is static or absent.
    pub fn side_for(&self, request: ResolveRequest<'_>) -> Option<ImporterSide> {
        match self.find_rule(request.specifier)? {
            AliasRule::Static(_) => None,
            AliasRule::Contextual(rule) => Some(rule.classify(request.importer)),
        }
    }
}

/// Join root, base, and residual, collapsing `.` segments. `..` segments
/// are kept as written so the candidate stays inside the mapped folder
/// layout rather than being resolved against the real filesystem here.
fn candidate_path(root: &Path, base: &str, residual: &str) -> PathBuf {
    let mut joined = root.join(base);
    if !residual.is_empty() {
        joined = joined.join(residual);
    }
    joined.components().collect()
}
