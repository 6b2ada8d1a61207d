use std::borrow::Cow;
use std::path::Path;

use regex::Regex;

use crate::env::{Environment, StaticAliasPolicy};
use crate::error::RelinkError;

/// Matcher tested against an import specifier.
///
/// Both forms are spelled out in the declaration (`find` for an exact
/// prefix, `findRegex` for a regular expression); nothing is inferred from
/// the string shape.
#[derive(Debug, Clone)]
pub enum Pattern {
    Prefix(String),
    Regex(Regex),
}

impl Pattern {
    pub fn matches(&self, specifier: &str) -> bool {
        match self {
            Self::Prefix(prefix) => specifier.starts_with(prefix.as_str()),
            Self::Regex(regex) => regex.is_match(specifier),
        }
    }

    /// Source form, for rule listings and error messages.
    pub fn source(&self) -> &str {
        match self {
            Self::Prefix(prefix) => prefix,
            Self::Regex(regex) => regex.as_str(),
        }
    }
}

/// Which side of a package link an importing module lives on.
///
/// Computed once per resolution from the importer path and passed around as
/// a value; base-directory selection matches on this instead of re-checking
/// the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterSide {
    /// The importer is a file of the linked package itself.
    LinkedPackage,
    /// The importer belongs to the consuming application, or is unknown.
    ConsumingApp,
}

impl ImporterSide {
    /// Human-facing label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::LinkedPackage => "linked side",
            Self::ConsumingApp => "app side",
        }
    }
}

/// One alias declaration as authored in configuration, before validation.
///
/// A declaration carrying none of the three contextual fields describes a
/// static rule; carrying all three makes it contextual; anything in between
/// is rejected when rules are built.
#[derive(Debug, Clone, Default)]
pub struct AliasDecl {
    pub find: Option<String>,
    pub find_regex: Option<String>,
    pub replacement: String,
    pub folder_name: Option<String>,
    pub local_path: Option<String>,
    pub external_path: Option<String>,
    /// Exempts this alias from production filtering.
    pub in_production: bool,
}

/// Fixed rewrite resolved against the configuration root. The importer
/// never affects the result.
#[derive(Debug, Clone)]
pub struct StaticRule {
    pub pattern: Pattern,
    pub replacement: String,
}

/// Linked-package rewrite whose base directory depends on which side of the
/// link the importer lives.
#[derive(Debug, Clone)]
pub struct ContextualRule {
    pub pattern: Pattern,
    /// Alias marker stripped from the specifier to obtain the residual.
    pub replacement: String,
    /// Importer paths containing this substring are classified as inside
    /// the linked package.
    pub folder_name: String,
    /// Base directory when the importer is on the application side.
    pub local_path: String,
    /// Base directory when the importer is inside the linked package.
    pub external_path: String,
}

impl ContextualRule {
    /// Classify the importer. A missing importer counts as application-side,
    /// matching how an entry point with no importer behaves.
    pub fn classify(&self, importer: Option<&Path>) -> ImporterSide {
        let Some(importer) = importer else {
            return ImporterSide::ConsumingApp;
        };
        let text = importer.to_string_lossy();
        let normalized: Cow<'_, str> = if cfg!(windows) {
            Cow::Owned(text.replace('\\', "/"))
        } else {
            text
        };
        if normalized.contains(&self.folder_name) {
            ImporterSide::LinkedPackage
        } else {
            ImporterSide::ConsumingApp
        }
    }

    /// Base directory for one side of the link.
    pub fn base_for(&self, side: ImporterSide) -> &str {
        match side {
            ImporterSide::LinkedPackage => &self.external_path,
            ImporterSide::ConsumingApp => &self.local_path,
        }
    }

    /// Strip the alias marker from a specifier, keeping only the part after
    /// it. Only the first occurrence is removed.
    pub fn residual(&self, specifier: &str) -> String {
        specifier.replacen(&self.replacement, "", 1)
    }
}

/// A validated rewrite rule.
#[derive(Debug, Clone)]
pub enum AliasRule {
    Static(StaticRule),
    Contextual(ContextualRule),
}

impl AliasRule {
    pub fn pattern(&self) -> &Pattern {
        match self {
            Self::Static(rule) => &rule.pattern,
            Self::Contextual(rule) => &rule.pattern,
        }
    }

    pub fn matches(&self, specifier: &str) -> bool {
        self.pattern().matches(specifier)
    }

    pub fn is_contextual(&self) -> bool {
        matches!(self, Self::Contextual(_))
    }
}

impl AliasDecl {
    /// Identifier used in error messages when the matcher itself is the
    /// problem or absent.
    fn display_find(&self) -> &str {
        self.find
            .as_deref()
            .or(self.find_regex.as_deref())
            .unwrap_or(&self.replacement)
    }

    fn pattern(&self) -> Result<Pattern, RelinkError> {
        match (&self.find, &self.find_regex) {
            (Some(_), Some(_)) => Err(RelinkError::InvalidAlias {
                find: self.display_find().to_string(),
                reason: "declares both `find` and `findRegex`; use one".to_string(),
            }),
            (None, None) => Err(RelinkError::InvalidAlias {
                find: self.display_find().to_string(),
                reason: "declares neither `find` nor `findRegex`".to_string(),
            }),
            (Some(prefix), None) => Ok(Pattern::Prefix(prefix.clone())),
            (None, Some(source)) => {
                Regex::new(source)
                    .map(Pattern::Regex)
                    .map_err(|source| RelinkError::InvalidPattern {
                        find: self.display_find().to_string(),
                        source,
                    })
            }
        }
    }

    /// Validate this declaration into a rule.
    ///
    /// Partial contextual declarations are the silent-misroute hazard: a
    /// rule with a `folderName` but no `externalPath` would route imports
    /// somewhere unintended at resolve time. An empty `folderName` is the
    /// same hazard in disguise, since every importer path contains the
    /// empty string. Both are rejected here, before any resolution
    /// happens.
    pub fn to_rule(&self) -> Result<AliasRule, RelinkError> {
        let pattern = self.pattern()?;

        let contextual_fields = [
            ("folderName", self.folder_name.as_deref()),
            ("localPath", self.local_path.as_deref()),
            ("externalPath", self.external_path.as_deref()),
        ];
        let empty: Vec<&str> = contextual_fields
            .iter()
            .filter(|(_, value)| matches!(value, Some(v) if v.is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !empty.is_empty() {
            return Err(RelinkError::InvalidAlias {
                find: self.display_find().to_string(),
                reason: format!(
                    "contextual alias declares an empty {}; \
                     folderName/localPath/externalPath must be non-empty",
                    empty.join(" and ")
                ),
            });
        }
        let present = contextual_fields
            .iter()
            .filter(|(_, value)| value.is_some())
            .count();

        match present {
            0 => Ok(AliasRule::Static(StaticRule {
                pattern,
                replacement: self.replacement.clone(),
            })),
            3 => Ok(AliasRule::Contextual(ContextualRule {
                pattern,
                replacement: self.replacement.clone(),
                folder_name: self.folder_name.clone().unwrap_or_default(),
                local_path: self.local_path.clone().unwrap_or_default(),
                external_path: self.external_path.clone().unwrap_or_default(),
            })),
            _ => {
                let missing: Vec<&str> = contextual_fields
                    .iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                Err(RelinkError::InvalidAlias {
                    find: self.display_find().to_string(),
                    reason: format!(
                        "contextual alias is missing {}; declare all of \
                         folderName/localPath/externalPath or none",
                        missing.join(" and ")
                    ),
                })
            }
        }
    }

    fn active_in(&self, rule: &AliasRule, env: &Environment, policy: StaticAliasPolicy) -> bool {
        if self.in_production {
            return true;
        }
        match rule {
            AliasRule::Static(_) => policy.keeps_static(env),
            AliasRule::Contextual(_) => env.linked_packages_enabled(),
        }
    }
}

/// Normalize declarations into validated rules for one environment.
///
/// Every declaration is validated, including ones the environment filters
/// out: a broken alias should fail the build it is declared in, not the
/// first development build that happens to activate it. Filtered rules are
/// absent from the output, not disabled; declaration order is preserved.
pub fn build_rules(
    decls: &[AliasDecl],
    env: &Environment,
    policy: StaticAliasPolicy,
) -> Result<Vec<AliasRule>, RelinkError> {
    let mut rules = Vec::new();
    for decl in decls {
        let rule = decl.to_rule()?;
        if decl.active_in(&rule, env, policy) {
            rules.push(rule);
        } else {
            log::debug!(
                "alias `{}` inactive in {} environment",
                rule.pattern().source(),
                env.tag()
            );
        }
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contextual_decl() -> AliasDecl {
        AliasDecl {
            find_regex: Some("^@/".to_string()),
            replacement: "@/".to_string(),
            folder_name: Some("liftoff/ui".to_string()),
            local_path: Some("./resources/js".to_string()),
            external_path: Some("../liftoff-ui/src".to_string()),
            ..AliasDecl::default()
        }
    }

    fn static_decl() -> AliasDecl {
        AliasDecl {
            find: Some("@hardimpact/liftoff-ui".to_string()),
            replacement: "../liftoff-ui/index.ts".to_string(),
            ..AliasDecl::default()
        }
    }

    // --- Pattern ---

    #[test]
    fn prefix_pattern_matches_start_only() {
        let pattern = Pattern::Prefix("@/".to_string());
        assert!(pattern.matches("@/composables/useX"));
        assert!(!pattern.matches("x@/y"));
        assert!(!pattern.matches("vue"));
    }

    #[test]
    fn regex_pattern_honors_anchors() {
        let pattern = Pattern::Regex(Regex::new("^@/").unwrap());
        assert!(pattern.matches("@/composables/useX"));
        assert!(!pattern.matches("deep/@/nope"));
    }

    #[test]
    fn unanchored_regex_matches_anywhere() {
        let pattern = Pattern::Regex(Regex::new("icons").unwrap());
        assert!(pattern.matches("~icons/mdi/home"));
        assert!(pattern.matches("virtual:icons"));
    }

    // --- Declaration validation ---

    #[test]
    fn decl_without_contextual_fields_is_static() {
        let rule = static_decl().to_rule().unwrap();
        assert!(matches!(rule, AliasRule::Static(_)));
    }

    #[test]
    fn decl_with_all_contextual_fields_is_contextual() {
        let rule = contextual_decl().to_rule().unwrap();
        assert!(rule.is_contextual());
    }

    #[test]
    fn partial_contextual_decl_is_rejected() {
        let mut decl = contextual_decl();
        decl.external_path = None;
        let err = decl.to_rule().unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("externalPath"),
            "error should name the missing field: {message}"
        );
    }

    #[test]
    fn partial_contextual_names_every_missing_field() {
        let decl = AliasDecl {
            find_regex: Some("^@/".to_string()),
            replacement: "@/".to_string(),
            folder_name: Some("liftoff/ui".to_string()),
            ..AliasDecl::default()
        };
        let message = decl.to_rule().unwrap_err().to_string();
        assert!(message.contains("localPath") && message.contains("externalPath"));
    }

    #[test]
    fn empty_folder_name_is_rejected() {
        // Every path contains "", so this rule would put every importer on
        // the linked side. It must never reach classification.
        let mut decl = contextual_decl();
        decl.folder_name = Some(String::new());
        let message = decl.to_rule().unwrap_err().to_string();
        assert!(
            message.contains("folderName") && message.contains("empty"),
            "error should name the empty field: {message}"
        );
    }

    #[test]
    fn empty_contextual_paths_are_rejected() {
        let mut decl = contextual_decl();
        decl.local_path = Some(String::new());
        decl.external_path = Some(String::new());
        let message = decl.to_rule().unwrap_err().to_string();
        assert!(message.contains("localPath") && message.contains("externalPath"));
    }

    #[test]
    fn decl_with_both_matcher_forms_is_rejected() {
        let mut decl = static_decl();
        decl.find_regex = Some("^@".to_string());
        assert!(decl.to_rule().is_err());
    }

    #[test]
    fn decl_with_no_matcher_is_rejected() {
        let decl = AliasDecl {
            replacement: "./src".to_string(),
            ..AliasDecl::default()
        };
        assert!(decl.to_rule().is_err());
    }

    #[test]
    fn invalid_regex_is_rejected_eagerly() {
        let decl = AliasDecl {
            find_regex: Some("^@[/".to_string()),
            replacement: "@/".to_string(),
            ..AliasDecl::default()
        };
        assert!(matches!(
            decl.to_rule(),
            Err(RelinkError::InvalidPattern { .. })
        ));
    }

    // --- Classification ---

    #[test]
    fn importer_inside_linked_folder_is_linked_side() {
        let AliasRule::Contextual(rule) = contextual_decl().to_rule().unwrap() else {
            panic!("expected contextual rule");
        };
        let importer = Path::new("/project/liftoff/ui/components/Button.vue");
        assert_eq!(rule.classify(Some(importer)), ImporterSide::LinkedPackage);
    }

    #[test]
    fn importer_outside_linked_folder_is_app_side() {
        let AliasRule::Contextual(rule) = contextual_decl().to_rule().unwrap() else {
            panic!("expected contextual rule");
        };
        let importer = Path::new("/project/resources/js/pages/Home.vue");
        assert_eq!(rule.classify(Some(importer)), ImporterSide::ConsumingApp);
    }

    #[test]
    fn missing_importer_is_app_side() {
        let AliasRule::Contextual(rule) = contextual_decl().to_rule().unwrap() else {
            panic!("expected contextual rule");
        };
        assert_eq!(rule.classify(None), ImporterSide::ConsumingApp);
    }

    #[test]
    fn base_selection_follows_side() {
        let AliasRule::Contextual(rule) = contextual_decl().to_rule().unwrap() else {
            panic!("expected contextual rule");
        };
        assert_eq!(rule.base_for(ImporterSide::LinkedPackage), "../liftoff-ui/src");
        assert_eq!(rule.base_for(ImporterSide::ConsumingApp), "./resources/js");
    }

    #[test]
    fn residual_strips_marker_once() {
        let AliasRule::Contextual(rule) = contextual_decl().to_rule().unwrap() else {
            panic!("expected contextual rule");
        };
        assert_eq!(rule.residual("@/composables/useX"), "composables/useX");
        assert_eq!(rule.residual("@/pages/@/odd"), "pages/@/odd");
        assert_eq!(rule.residual("@/"), "");
    }

    // --- Environment filtering ---

    #[test]
    fn production_omits_contextual_rules_entirely() {
        let decls = vec![contextual_decl(), static_decl()];
        let rules = build_rules(
            &decls,
            &Environment::Production,
            StaticAliasPolicy::Always,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
        assert!(!rules[0].is_contextual());
    }

    #[test]
    fn development_keeps_all_rules_in_declared_order() {
        let decls = vec![contextual_decl(), static_decl()];
        let rules = build_rules(
            &decls,
            &Environment::Development,
            StaticAliasPolicy::Always,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules[0].is_contextual());
        assert!(!rules[1].is_contextual());
    }

    #[test]
    fn follow_environment_policy_empties_table_in_production() {
        let decls = vec![contextual_decl(), static_decl()];
        let rules = build_rules(
            &decls,
            &Environment::Production,
            StaticAliasPolicy::FollowEnvironment,
        )
        .unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn unknown_environment_keeps_linked_package_rules() {
        let decls = vec![contextual_decl()];
        let rules = build_rules(
            &decls,
            &Environment::Other("staging".into()),
            StaticAliasPolicy::Always,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn in_production_flag_exempts_an_alias_from_filtering() {
        let mut decl = contextual_decl();
        decl.in_production = true;
        let rules = build_rules(
            &[decl],
            &Environment::Production,
            StaticAliasPolicy::FollowEnvironment,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn filtered_declarations_are_still_validated() {
        let mut broken = contextual_decl();
        broken.local_path = None;
        // Production would filter this rule out, but a broken declaration
        // must fail the build it is declared in.
        let result = build_rules(
            &[broken],
            &Environment::Production,
            StaticAliasPolicy::Always,
        );
        assert!(result.is_err());
    }
}
