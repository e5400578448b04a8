//! WAF injection into the conventional route policies
//!
//! The device requires that once any rule of an endpoint policy makes a WAF
//! decision, every rule of that policy does. Rules named by the exposure feed
//! get a WAF enable action; every other rule of the same policy gets an
//! explicit disable, and a trailing catch-all rule drops unmatched requests
//! with WAF disabled.

use std::collections::BTreeSet;

use tracing::debug;

use bigip_common::resource::{Exposure, ExposureRecord};

use super::{DeclarationBuilder, Diagnostic, SynthesisContext, SynthesisStage};
use crate::declaration::{as3_name, Action, Application, EndpointPolicy, PolicyName, Rule};

/// Name of the trailing catch-all rule
pub const WAF_DISABLE_RULE: &str = "openshift_route_waf_disable";

fn waf_disable_rule() -> Rule {
    Rule::new(
        WAF_DISABLE_RULE,
        vec![Action::drop_request(), Action::waf_disable()],
    )
}

/// Policies an exposure dispatches to, in order
fn targets(exposure: &Exposure) -> &'static [PolicyName] {
    match exposure {
        Exposure::Https => &[PolicyName::Secure],
        Exposure::HttpAndHttps => &[PolicyName::Secure, PolicyName::Insecure],
        Exposure::Http => &[PolicyName::Insecure],
        Exposure::Unsupported(_) => &[],
    }
}

/// Host + path an exposure record refers to.
///
/// A record names either a rule or the full URI a rule was generated for. A
/// rule found by name lends its URI, so one record reaches the matching rule
/// of the other targeted policy as well. Only the targeted policies are
/// searched; a rule outside them never lends its URI.
fn resolve_uri(
    app: &Application,
    record: &ExposureRecord,
    targets: &[PolicyName],
) -> Option<String> {
    let name = as3_name(&record.rule);
    let rules = || {
        targets
            .iter()
            .filter_map(|&p| app.endpoint_policy(p))
            .flat_map(|p| p.rules.iter())
    };

    if rules().any(|r| r.full_uri.as_deref() == Some(record.rule.as_str())) {
        return Some(record.rule.clone());
    }
    rules()
        .filter(|r| r.name == name)
        .find_map(|r| r.full_uri.clone())
}

fn enable_on_rule(
    policy: &mut EndpointPolicy,
    name: PolicyName,
    record: &ExposureRecord,
    full_uri: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let rule_name = as3_name(&record.rule);
    let Some(rule) = policy.find_rule_mut(&rule_name, full_uri) else {
        diagnostics.push(Diagnostic::MissingRule {
            policy: name,
            rule: rule_name,
        });
        return;
    };

    if rule.has_waf_decision() {
        diagnostics.push(Diagnostic::DuplicateWafDecision {
            policy: name,
            rule: rule.name.clone(),
        });
        return;
    }

    rule.actions.push(Action::waf_enable(record.waf_policy.as_deref()));
    debug!(policy = %name, rule = %rule.name, "enabled WAF on rule");
}

fn finalize(policy: &mut EndpointPolicy) {
    if !policy.has_rule(WAF_DISABLE_RULE) {
        policy.rules.push(waf_disable_rule());
    }
    for rule in policy.rules.iter_mut().filter(|r| !r.has_waf_decision()) {
        rule.actions.push(Action::waf_disable());
    }
}

/// Apply the exposure feed to the shared application.
///
/// Returns the diagnostics raised. A policy is touched when it exists and at
/// least one record dispatched to it, even if the named rule was missing;
/// untouched policies are left as they were.
pub fn inject_waf(app: &mut Application, records: &[ExposureRecord]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut touched = BTreeSet::new();

    for record in records {
        if let Exposure::Unsupported(value) = &record.exposure {
            diagnostics.push(Diagnostic::UnsupportedExposure {
                rule: record.rule.clone(),
                exposure: value.clone(),
            });
            continue;
        }

        let policies = targets(&record.exposure);
        let full_uri = resolve_uri(app, record, policies);
        for &name in policies {
            if let Some(policy) = app.endpoint_policy_mut(name) {
                touched.insert(name);
                enable_on_rule(policy, name, record, full_uri.as_deref(), &mut diagnostics);
            }
        }
    }

    for name in touched {
        if let Some(policy) = app.endpoint_policy_mut(name) {
            finalize(policy);
            debug!(policy = %name, rules = policy.rules.len(), "finalized WAF policy");
        }
    }

    diagnostics
}

/// Adds WAF decisions to the secure and insecure route policies
pub struct WafStage;

impl SynthesisStage for WafStage {
    fn name(&self) -> &str {
        "waf"
    }

    fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder) {
        if ctx.snapshot.exposures.is_empty() {
            return;
        }
        let diagnostics = inject_waf(builder.app_mut(), &ctx.snapshot.exposures);
        for diagnostic in diagnostics {
            builder.diagnose(diagnostic);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{ActionKind, As3Object};

    fn app_with(policies: &[(PolicyName, &[&str])]) -> Application {
        let mut app = Application::new();
        for (name, rules) in policies {
            let rules = rules
                .iter()
                .map(|r| Rule::new(*r, vec![Action::forward(format!("{r}_pool"))]))
                .collect();
            app.insert(
                name.as_str(),
                As3Object::EndpointPolicy(EndpointPolicy::new("first-match", rules)),
            );
        }
        app
    }

    fn policy(app: &Application, name: PolicyName) -> &EndpointPolicy {
        app.endpoint_policy(name).expect("policy present")
    }

    fn rule<'a>(policy: &'a EndpointPolicy, name: &str) -> &'a Rule {
        policy
            .rules
            .iter()
            .find(|r| r.name == name)
            .expect("rule present")
    }

    fn waf_enabled(rule: &Rule) -> Option<bool> {
        rule.actions
            .iter()
            .find(|a| a.kind == ActionKind::Waf)
            .and_then(|a| a.enabled)
    }

    fn record(rule: &str, exposure: &str) -> ExposureRecord {
        ExposureRecord::new(rule, Exposure::from(exposure.to_string()))
    }

    #[test]
    fn http_and_https_enables_matching_rule_in_both_policies() {
        let mut app = Application::new();
        app.insert(
            PolicyName::Secure.as_str(),
            As3Object::EndpointPolicy(EndpointPolicy::new(
                "first-match",
                vec![Rule::new("r1", vec![]).with_full_uri("shop.example.com/")],
            )),
        );
        app.insert(
            PolicyName::Insecure.as_str(),
            As3Object::EndpointPolicy(EndpointPolicy::new(
                "first-match",
                vec![Rule::new("r2", vec![]).with_full_uri("shop.example.com/")],
            )),
        );

        let diagnostics = inject_waf(&mut app, &[record("r1", "https-and-http")]);
        assert!(diagnostics.is_empty());

        for (name, rule_name) in [(PolicyName::Secure, "r1"), (PolicyName::Insecure, "r2")] {
            let policy = policy(&app, name);
            assert_eq!(policy.rules.len(), 2);
            assert_eq!(waf_enabled(rule(policy, rule_name)), Some(true));
            let trailing = &policy.rules[1];
            assert_eq!(trailing.name, WAF_DISABLE_RULE);
            assert_eq!(
                trailing.actions,
                vec![Action::drop_request(), Action::waf_disable()]
            );
        }
    }

    #[test]
    fn record_may_name_full_uri() {
        let mut app = Application::new();
        app.insert(
            PolicyName::Insecure.as_str(),
            As3Object::EndpointPolicy(EndpointPolicy::new(
                "first-match",
                vec![
                    Rule::new("blog", vec![]).with_full_uri("blog.example.com/"),
                    Rule::new("shop", vec![]).with_full_uri("shop.example.com/"),
                ],
            )),
        );
        let diagnostics = inject_waf(&mut app, &[record("shop.example.com/", "http")]);
        assert!(diagnostics.is_empty());

        let insecure = policy(&app, PolicyName::Insecure);
        assert_eq!(waf_enabled(rule(insecure, "shop")), Some(true));
        assert_eq!(waf_enabled(rule(insecure, "blog")), Some(false));
    }

    #[test]
    fn https_record_ignores_rules_outside_the_secure_policy() {
        let mut app = Application::new();
        app.insert(
            PolicyName::Secure.as_str(),
            As3Object::EndpointPolicy(EndpointPolicy::new(
                "first-match",
                vec![Rule::new("tls_shop", vec![]).with_full_uri("shop.example.com/")],
            )),
        );
        app.insert(
            PolicyName::Insecure.as_str(),
            As3Object::EndpointPolicy(EndpointPolicy::new(
                "first-match",
                vec![Rule::new("plain_shop", vec![]).with_full_uri("shop.example.com/")],
            )),
        );
        let before = policy(&app, PolicyName::Insecure).clone();

        let diagnostics = inject_waf(&mut app, &[record("plain_shop", "https")]);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingRule {
                policy: PolicyName::Secure,
                rule: "plain_shop".to_string(),
            }]
        );
        let secure = policy(&app, PolicyName::Secure);
        assert_eq!(waf_enabled(rule(secure, "tls_shop")), Some(false));
        assert_eq!(policy(&app, PolicyName::Insecure), &before);
    }

    #[test]
    fn fallthrough_without_matching_rule_reports_missing() {
        let mut app = app_with(&[
            (PolicyName::Secure, &["r1"]),
            (PolicyName::Insecure, &["r2"]),
        ]);
        let diagnostics = inject_waf(&mut app, &[record("r1", "http-and-https")]);

        let secure = policy(&app, PolicyName::Secure);
        assert_eq!(secure.rules.len(), 2);
        assert_eq!(waf_enabled(rule(secure, "r1")), Some(true));
        assert_eq!(secure.rules[1].name, WAF_DISABLE_RULE);

        // r1 is not in the insecure policy, but the policy is still touched.
        let insecure = policy(&app, PolicyName::Insecure);
        assert_eq!(insecure.rules.len(), 2);
        assert_eq!(waf_enabled(rule(insecure, "r2")), Some(false));
        assert_eq!(insecure.rules[1].name, WAF_DISABLE_RULE);

        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingRule {
                policy: PolicyName::Insecure,
                rule: "r1".to_string(),
            }]
        );
    }

    #[test]
    fn https_touches_only_secure_policy() {
        let mut app = app_with(&[
            (PolicyName::Secure, &["r1", "r3"]),
            (PolicyName::Insecure, &["r2"]),
        ]);
        let before = policy(&app, PolicyName::Insecure).clone();
        inject_waf(&mut app, &[record("r1", "https")]);

        assert_eq!(policy(&app, PolicyName::Insecure), &before);
        let secure = policy(&app, PolicyName::Secure);
        assert_eq!(waf_enabled(rule(secure, "r1")), Some(true));
        assert_eq!(waf_enabled(rule(secure, "r3")), Some(false));
    }

    #[test]
    fn http_touches_only_insecure_policy() {
        let mut app = app_with(&[
            (PolicyName::Secure, &["r1"]),
            (PolicyName::Insecure, &["r2"]),
        ]);
        let before = policy(&app, PolicyName::Secure).clone();
        inject_waf(&mut app, &[record("r2", "http")]);

        assert_eq!(policy(&app, PolicyName::Secure), &before);
        assert_eq!(
            waf_enabled(rule(policy(&app, PolicyName::Insecure), "r2")),
            Some(true)
        );
    }

    #[test]
    fn every_rule_of_touched_policy_has_one_waf_action() {
        let mut app = app_with(&[(PolicyName::Secure, &["a", "b", "c"])]);
        inject_waf(&mut app, &[record("b", "https"), record("b", "https")]);

        for rule in &policy(&app, PolicyName::Secure).rules {
            assert_eq!(rule.waf_action_count(), 1, "rule {}", rule.name);
        }
    }

    #[test]
    fn second_enable_is_reported() {
        let mut app = app_with(&[(PolicyName::Secure, &["a"])]);
        let diagnostics = inject_waf(&mut app, &[record("a", "https"), record("a", "https")]);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::DuplicateWafDecision {
                policy: PolicyName::Secure,
                rule: "a".to_string(),
            }]
        );
    }

    #[test]
    fn trailing_rule_is_last_and_drops_requests() {
        let mut app = app_with(&[(PolicyName::Secure, &["a", "b"])]);
        inject_waf(&mut app, &[record("a", "https"), record("b", "https")]);

        let secure = policy(&app, PolicyName::Secure);
        let last = secure.rules.last().expect("rules");
        assert_eq!(last.name, WAF_DISABLE_RULE);
        assert_eq!(last.actions, vec![Action::drop_request(), Action::waf_disable()]);
        assert_eq!(
            secure.rules.iter().filter(|r| r.name == WAF_DISABLE_RULE).count(),
            1
        );
    }

    #[test]
    fn rerun_does_not_grow_policy() {
        let mut app = app_with(&[
            (PolicyName::Secure, &["r1"]),
            (PolicyName::Insecure, &["r2"]),
        ]);
        let records = [record("r1", "http-and-https")];
        inject_waf(&mut app, &records);
        let after_first = app.clone();

        inject_waf(&mut app, &[]);
        assert_eq!(app, after_first);

        inject_waf(&mut app, &records);
        for name in [PolicyName::Secure, PolicyName::Insecure] {
            assert_eq!(
                policy(&app, name).rules.len(),
                policy(&after_first, name).rules.len()
            );
        }
    }

    #[test]
    fn missing_rule_creates_nothing() {
        let mut app = app_with(&[(PolicyName::Secure, &["r1"])]);
        let diagnostics = inject_waf(&mut app, &[record("ghost", "https")]);

        let secure = policy(&app, PolicyName::Secure);
        assert!(!secure.has_rule("ghost"));
        assert_eq!(waf_enabled(rule(secure, "r1")), Some(false));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn absent_policies_are_not_created() {
        let mut app = Application::new();
        let diagnostics = inject_waf(&mut app, &[record("r1", "http-and-https")]);
        assert!(app.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn fallthrough_reaches_insecure_without_secure_policy() {
        let mut app = app_with(&[(PolicyName::Insecure, &["r1"])]);
        inject_waf(&mut app, &[record("r1", "http-and-https")]);

        assert!(app.endpoint_policy(PolicyName::Secure).is_none());
        assert_eq!(
            waf_enabled(rule(policy(&app, PolicyName::Insecure), "r1")),
            Some(true)
        );
    }

    #[test]
    fn unsupported_exposure_is_ignored() {
        let mut app = app_with(&[(PolicyName::Secure, &["r1"])]);
        let before = app.clone();
        let diagnostics = inject_waf(&mut app, &[record("r1", "gopher")]);

        assert_eq!(app, before);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnsupportedExposure {
                rule: "r1".to_string(),
                exposure: "gopher".to_string(),
            }]
        );
    }

    #[test]
    fn waf_policy_reference_is_carried() {
        let mut app = app_with(&[(PolicyName::Secure, &["r1"])]);
        let rec = record("r1", "https").with_waf_policy("/Common/linux-high");
        inject_waf(&mut app, &[rec]);

        let r1 = rule(policy(&app, PolicyName::Secure), "r1");
        let waf = r1.actions.iter().find(|a| a.is_waf()).expect("waf action");
        assert_eq!(
            waf.policy.as_ref().map(|p| p.bigip.as_str()),
            Some("/Common/linux-high")
        );
    }

    #[test]
    fn record_rule_names_are_normalized() {
        let mut app = app_with(&[(PolicyName::Secure, &["shop_route_web"])]);
        let diagnostics = inject_waf(&mut app, &[record("shop-route.web", "https")]);
        assert!(diagnostics.is_empty());
        assert_eq!(
            waf_enabled(rule(policy(&app, PolicyName::Secure), "shop_route_web")),
            Some(true)
        );
    }
}
