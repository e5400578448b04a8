//! AS3 Endpoint_Policy objects: ordered L7 rules and their actions

use serde::Serialize;

use bigip_common::resource::{ActionSpec, ConditionSpec, MatchOperand, MatchTarget, RuleSpec};

use super::{as3_name, ResourcePointer};

/// The two conventional route policies shared by all frontends
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PolicyName {
    /// Policy attached to HTTPS virtuals
    Secure,
    /// Policy attached to HTTP virtuals
    Insecure,
}

impl PolicyName {
    /// Object name in the shared application
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secure => "openshift_secure_routes",
            Self::Insecure => "openshift_insecure_routes",
        }
    }
}

impl std::fmt::Display for PolicyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AS3 action types used by this controller
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Forward to a pool
    Forward,
    /// Enable/disable WAF enforcement
    Waf,
    /// Drop the request
    Drop,
    /// Redirect the client
    HttpRedirect,
}

/// Pool selection for forward actions
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ActionSelect {
    /// Pool to forward to
    pub pool: UseRef,
}

/// `{ "use": "<name>" }` reference to an object in the same application
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UseRef {
    /// Referenced object name
    #[serde(rename = "use")]
    pub target: String,
}

impl UseRef {
    /// Reference the named object
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// One declarative effect of a rule
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action type
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Event that triggers the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Pool selection (forward)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<ActionSelect>,
    /// WAF policy (waf)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<ResourcePointer>,
    /// WAF on/off (waf)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Redirect target (httpRedirect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Action {
    fn of(kind: ActionKind) -> Self {
        Self {
            kind,
            event: None,
            select: None,
            policy: None,
            enabled: None,
            location: None,
        }
    }

    /// Forward matching requests to a pool
    pub fn forward(pool: impl Into<String>) -> Self {
        Self {
            event: Some("request".to_string()),
            select: Some(ActionSelect {
                pool: UseRef::new(pool),
            }),
            ..Self::of(ActionKind::Forward)
        }
    }

    /// Enable WAF, optionally naming the policy to enforce
    pub fn waf_enable(policy: Option<&str>) -> Self {
        Self {
            policy: policy.map(ResourcePointer::new),
            enabled: Some(true),
            ..Self::of(ActionKind::Waf)
        }
    }

    /// Explicitly disable WAF
    pub fn waf_disable() -> Self {
        Self {
            enabled: Some(false),
            ..Self::of(ActionKind::Waf)
        }
    }

    /// Drop the request
    pub fn drop_request() -> Self {
        Self {
            event: Some("request".to_string()),
            ..Self::of(ActionKind::Drop)
        }
    }

    /// Redirect the client
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            event: Some("request".to_string()),
            location: Some(location.into()),
            ..Self::of(ActionKind::HttpRedirect)
        }
    }

    /// Whether this action is a WAF decision
    pub fn is_waf(&self) -> bool {
        self.kind == ActionKind::Waf
    }
}

impl From<&ActionSpec> for Action {
    fn from(spec: &ActionSpec) -> Self {
        match spec {
            ActionSpec::Forward { pool } => Action::forward(as3_name(pool)),
            ActionSpec::Reset => Action::drop_request(),
            ActionSpec::HttpRedirect { location } => Action::redirect(location.clone()),
        }
    }
}

/// String comparison inside a condition
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CompareString {
    /// `equals` or `starts-with`
    pub operand: String,
    /// Values compared against
    pub values: Vec<String>,
}

/// One request match condition
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Condition {
    /// `httpHeader` or `httpUri`
    #[serde(rename = "type")]
    pub kind: String,
    /// Header name (httpHeader)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Event the condition is evaluated on
    pub event: String,
    /// Whole-value comparison (httpHeader)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<CompareString>,
    /// Path comparison (httpUri)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<CompareString>,
}

impl From<&ConditionSpec> for Condition {
    fn from(spec: &ConditionSpec) -> Self {
        let compare = CompareString {
            operand: match spec.operand {
                MatchOperand::Equals => "equals",
                MatchOperand::StartsWith => "starts-with",
            }
            .to_string(),
            values: spec.values.clone(),
        };
        match spec.target {
            MatchTarget::Host => Condition {
                kind: "httpHeader".to_string(),
                name: Some("host".to_string()),
                event: "request".to_string(),
                all: Some(compare),
                path: None,
            },
            MatchTarget::Path => Condition {
                kind: "httpUri".to_string(),
                name: None,
                event: "request".to_string(),
                all: None,
                path: Some(compare),
            },
        }
    }
}

/// One ordered match/action unit
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Rule {
    /// Rule name, unique within its policy
    pub name: String,
    /// Conditions (all must match)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Actions, in order
    pub actions: Vec<Action>,
    /// Host + path the rule was generated for; not part of the AS3 document
    #[serde(skip)]
    pub full_uri: Option<String>,
}

impl Rule {
    /// Create a rule without conditions
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            actions,
            full_uri: None,
        }
    }

    /// Record the host + path the rule serves
    pub fn with_full_uri(mut self, uri: impl Into<String>) -> Self {
        self.full_uri = Some(uri.into());
        self
    }

    /// Whether any action already makes a WAF decision
    pub fn has_waf_decision(&self) -> bool {
        self.actions.iter().any(Action::is_waf)
    }

    /// Number of WAF actions on the rule
    pub fn waf_action_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_waf()).count()
    }
}

impl From<&RuleSpec> for Rule {
    fn from(spec: &RuleSpec) -> Self {
        Self {
            name: as3_name(&spec.name),
            conditions: spec.conditions.iter().map(Condition::from).collect(),
            actions: spec.actions.iter().map(Action::from).collect(),
            full_uri: spec.full_uri.clone(),
        }
    }
}

/// AS3 Endpoint_Policy
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EndpointPolicy {
    class: &'static str,
    /// Rule matching strategy
    pub strategy: String,
    /// Ordered rules
    pub rules: Vec<Rule>,
}

impl EndpointPolicy {
    /// Create a policy with the given rules
    pub fn new(strategy: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            class: "Endpoint_Policy",
            strategy: strategy.into(),
            rules,
        }
    }

    /// Find a rule by name
    pub fn rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.name == name)
    }

    /// Find a rule by name, falling back to the host + path it serves
    pub fn find_rule_mut(&mut self, name: &str, full_uri: Option<&str>) -> Option<&mut Rule> {
        let index = self.rules.iter().position(|r| r.name == name).or_else(|| {
            let uri = full_uri?;
            self.rules
                .iter()
                .position(|r| r.full_uri.as_deref() == Some(uri))
        })?;
        self.rules.get_mut(index)
    }

    /// Whether a rule with this name exists
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    /// Append rules whose names are not already present, keeping order
    pub fn merge_rules(&mut self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            if !self.has_rule(&rule.name) {
                self.rules.push(rule);
            }
        }
    }
}
