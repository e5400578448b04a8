//! End-to-end synthesis tests
//!
//! Drive the full pipeline from a YAML snapshot and inspect the rendered JSON.

use bigip_ctlr::as3::pipeline::WAF_DISABLE_RULE;
use bigip_ctlr::{Diagnostic, ResourceSnapshot, SynthesisConfig};
use serde_json::Value;

const SNAPSHOT: &str = r#"
resources:
  shop-route:
    metaData:
      resourceType: route
      routeProfiles:
        - name: shop-route
          namespace: web
          context: clientside
          reference: /Common/clientssl
    virtual:
      name: shop-route
      port: 443
      virtualAddress: 10.1.1.1
      poolName: web-shop-80
      policies: [openshift_secure_routes]
    pools:
      - name: web-shop-80
        servicePort: 8080
        members:
          - address: 10.244.0.5
            port: 8080
    policies:
      - name: openshift_secure_routes
        rules:
          - name: r1
            fullUri: shop.example.com/
            conditions:
              - target: host
                values: [shop.example.com]
            actions:
              - type: forward
                pool: web-shop-80
  shop-http-route:
    metaData:
      resourceType: route
    virtual:
      name: shop-http-route
      port: 80
      virtualAddress: 10.1.1.1
      poolName: web-shop-80
      policies: [openshift_insecure_routes]
    policies:
      - name: openshift_insecure_routes
        rules:
          - name: r2
            fullUri: shop.example.com/
            conditions:
              - target: host
                values: [shop.example.com]
            actions:
              - type: forward
                pool: web-shop-80
          - name: blog
            fullUri: blog.example.com/
            actions:
              - type: forward
                pool: web-shop-80
  api-ingress:
    metaData:
      resourceType: ingress
    virtual:
      name: api-ingress
      port: 80
      profiles:
        - name: clientssl
          partition: Common
          context: clientside
        - name: serverssl
          partition: Common
          context: serverside
  redis-ts:
    metaData:
      resourceType: transportServer
    virtual:
      name: redis-ts
      protocol: tcp
      port: 6379
exposures:
  - rule: r1
    exposure: http-and-https
"#;

fn render(config: &SynthesisConfig, snapshot: &str) -> (Value, Vec<Diagnostic>) {
    let snapshot = ResourceSnapshot::from_yaml(snapshot).expect("snapshot should parse");
    let assembled =
        bigip_ctlr::render_snapshot(config, &snapshot, None).expect("render should succeed");
    let json = assembled.to_json().expect("declaration should serialize");
    (json, assembled.diagnostics)
}

fn shared(json: &Value) -> &Value {
    &json["declaration"]["k8s"]["Shared"]
}

fn rule_names(policy: &Value) -> Vec<String> {
    policy["rules"]
        .as_array()
        .expect("rules array")
        .iter()
        .map(|r| r["name"].as_str().expect("rule name").to_string())
        .collect()
}

fn waf_actions(rule: &Value) -> Vec<&Value> {
    rule["actions"]
        .as_array()
        .expect("actions array")
        .iter()
        .filter(|a| a["type"] == "waf")
        .collect()
}

#[test]
fn waf_example_scenario() {
    let (json, diagnostics) = render(&SynthesisConfig::for_partition("k8s"), SNAPSHOT);
    let app = shared(&json);

    let secure = &app["openshift_secure_routes"];
    assert_eq!(rule_names(secure), vec!["r1", WAF_DISABLE_RULE]);
    let r1 = &secure["rules"][0];
    assert_eq!(waf_actions(r1).len(), 1);
    assert_eq!(waf_actions(r1)[0]["enabled"], true);

    // Same host and path in the insecure policy: the record falls through to r2.
    let insecure = &app["openshift_insecure_routes"];
    assert_eq!(rule_names(insecure), vec!["r2", "blog", WAF_DISABLE_RULE]);
    let r2 = &insecure["rules"][0];
    assert_eq!(waf_actions(r2).len(), 1);
    assert_eq!(waf_actions(r2)[0]["enabled"], true);
    let blog = &insecure["rules"][1];
    assert_eq!(waf_actions(blog).len(), 1);
    assert_eq!(waf_actions(blog)[0]["enabled"], false);

    let trailing = &insecure["rules"][2]["actions"];
    assert_eq!(trailing[0]["type"], "drop");
    assert_eq!(trailing[0]["event"], "request");
    assert_eq!(trailing[1]["type"], "waf");
    assert_eq!(trailing[1]["enabled"], false);

    assert!(!diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::MissingRule { .. })));
}

#[test]
fn tls_associations_upgrade_both_resource_kinds() {
    let (json, _) = render(&SynthesisConfig::for_partition("k8s"), SNAPSHOT);
    let app = shared(&json);

    let shop = &app["shop_route"];
    assert_eq!(shop["class"], "Service_HTTPS");
    assert_eq!(shop["serverTLS"][0]["bigip"], "/Common/clientssl");
    assert_eq!(shop["redirect80"], false);

    let api = &app["api_ingress"];
    assert_eq!(api["class"], "Service_HTTPS");
    assert_eq!(api["serverTLS"][0]["bigip"], "/Common/clientssl");
    assert_eq!(api["clientTLS"]["bigip"], "/Common/serverssl");

    let plain = &app["shop_http_route"];
    assert_eq!(plain["class"], "Service_HTTP");
    assert!(plain.get("serverTLS").is_none());
}

#[test]
fn unsupported_kind_is_reported_not_upgraded() {
    let (json, diagnostics) = render(&SynthesisConfig::for_partition("k8s"), SNAPSHOT);
    assert_eq!(shared(&json)["redis_ts"]["class"], "Service_TCP");
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::UnsupportedResourceKind { frontend, .. } if frontend == "redis-ts"
    )));
}

#[test]
fn envelope_and_controls() {
    let mut config = SynthesisConfig::for_partition("k8s");
    config.user_agent = "bigip-ctlr-test".to_string();
    let (json, _) = render(&config, SNAPSHOT);

    assert_eq!(json["class"], "AS3");
    assert_eq!(json["action"], "deploy");
    assert_eq!(json["declaration"]["class"], "ADC");
    assert_eq!(json["declaration"]["schemaVersion"], "3.52.0");
    assert_eq!(json["declaration"]["controls"]["userAgent"], "bigip-ctlr-test");
    assert_eq!(json["declaration"]["k8s"]["class"], "Tenant");
    assert_eq!(shared(&json)["class"], "Application");
}

#[test]
fn rendering_is_deterministic() {
    let config = SynthesisConfig::for_partition("k8s");
    let snapshot = ResourceSnapshot::from_yaml(SNAPSHOT).expect("snapshot");
    let first = bigip_ctlr::render_snapshot(&config, &snapshot, None)
        .expect("render")
        .render()
        .expect("json");
    let second = bigip_ctlr::render_snapshot(&config, &snapshot, None)
        .expect("render")
        .render()
        .expect("json");
    assert_eq!(first, second);
}

#[test]
fn override_is_suppressed_for_blank_partition() {
    use k8s_openapi::api::core::v1::ConfigMap;
    use std::collections::BTreeMap;

    let mut cm = ConfigMap::default();
    cm.data = Some(BTreeMap::from([(
        "template".to_string(),
        r#"{"declaration": {"extra": {"class": "Tenant"}}}"#.to_string(),
    )]));
    let snapshot = ResourceSnapshot::from_yaml(SNAPSHOT).expect("snapshot");

    let blank = SynthesisConfig::for_partition("");
    let assembled = bigip_ctlr::render_snapshot(&blank, &snapshot, Some(&cm)).expect("render");
    assert!(assembled.override_data.is_empty());
    assert!(assembled
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::OverrideSuppressed { .. })));
    let json = assembled.to_json().expect("json");
    assert!(json["declaration"].get("extra").is_none());

    let scoped = SynthesisConfig::for_partition("k8s");
    let assembled = bigip_ctlr::render_snapshot(&scoped, &snapshot, Some(&cm)).expect("render");
    let json = assembled.to_json().expect("json");
    assert_eq!(json["declaration"]["extra"]["class"], "Tenant");
}

#[test]
fn common_partition_is_rejected() {
    let snapshot = ResourceSnapshot::default();
    let err = bigip_ctlr::render_snapshot(&SynthesisConfig::for_partition("Common"), &snapshot, None)
        .expect_err("Common is not a tenant");
    assert_eq!(err.field(), Some("partition"));
}

#[test]
fn unknown_resource_kind_does_not_sink_the_pass() {
    let snapshot = r#"
resources:
  shop-route:
    metaData:
      resourceType: route
      routeProfiles:
        - name: shop-route
          namespace: web
          context: clientside
          reference: /Common/clientssl
    virtual:
      name: shop-route
      port: 443
  gw:
    metaData:
      resourceType: gatewayRoute
    virtual:
      name: gw
      port: 80
"#;
    let (json, diagnostics) = render(&SynthesisConfig::for_partition("k8s"), snapshot);
    let app = shared(&json);

    assert_eq!(app["shop_route"]["class"], "Service_HTTPS");
    assert_eq!(app["gw"]["class"], "Service_HTTP");
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::UnsupportedResourceKind { frontend, kind }
            if frontend == "gw" && kind.to_string() == "gatewayRoute"
    )));
}

#[test]
fn custom_profile_sharing_the_frontend_name_keeps_the_listener() {
    let snapshot = r#"
resources:
  shop-route:
    metaData:
      resourceType: route
    virtual:
      name: shop-route
      port: 80
customProfiles:
  - name: shop-route
    frontend: shop-route
    partition: k8s
    context: clientside
    cert: CERT
    key: KEY
"#;
    let (json, diagnostics) = render(&SynthesisConfig::for_partition("k8s"), snapshot);

    assert_eq!(shared(&json)["shop_route"]["class"], "Service_HTTP");
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::NameConflict { name, existing: "Service", .. } if name == "shop_route"
    )));
}
