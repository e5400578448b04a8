//! Base resources: one Service per frontend plus its pools, monitors and policies

use tracing::{debug, trace};

use bigip_common::resource::{ListenerProtocol, PolicySpec, ResourceConfig};

use super::{DeclarationBuilder, SynthesisContext, SynthesisStage};
use crate::declaration::{
    as3_name, Application, As3Object, EndpointPolicy, IRuleRef, Monitor, Pool, Rule, Service,
    ServiceClass,
};

/// Build the Service object for a frontend
pub(crate) fn build_service(config: &ResourceConfig) -> Service {
    let vs = &config.virtual_server;
    let class = match vs.protocol {
        ListenerProtocol::Http => ServiceClass::Http,
        ListenerProtocol::Tcp => ServiceClass::Tcp,
        ListenerProtocol::Udp => ServiceClass::Udp,
    };

    let mut svc = Service::new(class, vs.port);
    svc.virtual_addresses = vs.virtual_address.iter().cloned().collect();
    svc.pool = vs.pool_name.as_deref().map(as3_name);
    svc.snat = vs.snat.clone();
    svc.irules = vs.irules.iter().map(|r| IRuleRef::from_entry(r)).collect();
    svc.policy_endpoint = vs.policies.iter().map(|p| as3_name(p)).collect();
    svc
}

/// Add a policy, or merge its rules into an existing policy of the same name
fn merge_policy(app: &mut Application, spec: &PolicySpec) {
    let name = as3_name(&spec.name);
    let rules: Vec<Rule> = spec.rules.iter().map(Rule::from).collect();

    match app.policy_by_name_mut(&name) {
        Some(existing) => existing.merge_rules(rules),
        None => {
            app.insert(
                name,
                As3Object::EndpointPolicy(EndpointPolicy::new(spec.strategy.clone(), rules)),
            );
        }
    }
}

/// Populates Services, pools, monitors and endpoint policies
pub struct ResourceStage;

impl SynthesisStage for ResourceStage {
    fn name(&self) -> &str {
        "resources"
    }

    fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder) {
        for (frontend, config) in ctx.snapshot.resources.iter() {
            if !config.meta_data.active || !config.virtual_server.enabled {
                trace!(frontend, "skipping disabled frontend");
                continue;
            }

            let app = builder.app_mut();
            app.insert(as3_name(frontend), As3Object::Service(build_service(config)));

            // Pools and monitors can be shared between frontends; first one wins.
            for pool in &config.pools {
                let name = as3_name(&pool.name);
                if !app.contains(&name) {
                    app.insert(name, As3Object::Pool(Pool::from(pool)));
                }
            }
            for monitor in &config.monitors {
                let name = as3_name(&monitor.name);
                if !app.contains(&name) {
                    app.insert(name, As3Object::Monitor(Monitor::from(monitor)));
                }
            }
            for policy in &config.policies {
                merge_policy(app, policy);
            }

            debug!(
                frontend,
                kind = %config.kind(),
                pools = config.pools.len(),
                policies = config.policies.len(),
                "declared frontend"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::PolicyName;
    use crate::pipeline::test_support;

    const ROUTES: &str = r#"
resources:
  shop-route:
    metaData:
      resourceType: route
    virtual:
      name: shop-route
      port: 80
      virtualAddress: 10.1.1.1
      poolName: web-shop-80
      snat: auto
      irules: [/Common/_sys_https_redirect, ab-deploy]
      policies: [openshift_insecure_routes]
    pools:
      - name: web-shop-80
        servicePort: 8080
        members:
          - address: 10.244.0.5
            port: 8080
        monitors: [web-shop-80-http]
    monitors:
      - name: web-shop-80-http
        kind: http
    policies:
      - name: openshift_insecure_routes
        rules:
          - name: shop-rule
            conditions:
              - target: host
                values: [shop.example.com]
            actions:
              - type: forward
                pool: web-shop-80
  cart-route:
    metaData:
      resourceType: route
    virtual:
      name: cart-route
      port: 80
      poolName: web-shop-80
      policies: [openshift_insecure_routes]
    pools:
      - name: web-shop-80
        servicePort: 8080
    policies:
      - name: openshift_insecure_routes
        rules:
          - name: shop-rule
            actions:
              - type: reset
          - name: cart-rule
            actions:
              - type: forward
                pool: web-shop-80
  redis:
    metaData:
      resourceType: transportServer
    virtual:
      name: redis
      protocol: tcp
      port: 6379
  paused:
    metaData:
      resourceType: route
      active: false
    virtual:
      name: paused
      port: 80
"#;

    fn run_stage() -> DeclarationBuilder {
        let snapshot = test_support::snapshot(ROUTES);
        let config = test_support::config();
        let ctx = SynthesisContext {
            snapshot: &snapshot,
            config: &config,
        };
        let mut builder = DeclarationBuilder::new(&config);
        ResourceStage.run(&ctx, &mut builder);
        builder
    }

    #[test]
    fn service_per_active_frontend() {
        let builder = run_stage();
        let app = builder.app();

        let shop = app.service("shop_route").expect("shop service");
        assert_eq!(shop.class, ServiceClass::Http);
        assert_eq!(shop.virtual_addresses, vec!["10.1.1.1"]);
        assert_eq!(shop.pool.as_deref(), Some("web_shop_80"));
        assert_eq!(shop.snat.as_deref(), Some("auto"));
        assert_eq!(shop.policy_endpoint, vec![PolicyName::Insecure.as_str()]);
        assert_eq!(shop.irules.len(), 2);

        assert_eq!(app.service("redis").expect("redis").class, ServiceClass::Tcp);
        assert!(app.service("paused").is_none());
    }

    #[test]
    fn shared_policies_merge_rules_by_name() {
        let builder = run_stage();
        let policy = builder
            .app()
            .endpoint_policy(PolicyName::Insecure)
            .expect("insecure policy");

        let names: Vec<&str> = policy.rules.iter().map(|r| r.name.as_str()).collect();
        // cart-route sorts first, so its version of shop-rule is kept.
        assert_eq!(names, vec!["shop_rule", "cart_rule"]);
        assert_eq!(policy.strategy, "first-match");
    }

    #[test]
    fn pools_and_monitors_are_declared_once() {
        let builder = run_stage();
        let app = builder.app();
        assert!(matches!(app.get("web_shop_80"), Some(As3Object::Pool(_))));
        assert!(matches!(app.get("web_shop_80_http"), Some(As3Object::Monitor(_))));
        // shop_route, cart_route, redis, pool, monitor, policy
        assert_eq!(app.len(), 6);
    }
}
