use std::sync::Arc;

use waypoint_cache::RedisIndexCache;
use waypoint_core::{
    DomainRedirect, Priority, RedirectKind, RedirectRequest, RegexRedirect, Rule,
};
use waypoint_redirector::{RedirectResolver, Redirector, RuleService};
use waypoint_storage::InMemoryRuleStore;
use waypoint_test_infra::redis::RedisServer;

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn write_is_visible_through_another_connection() {
    let server = RedisServer::new().await.expect("start redis");

    let domains = Arc::new(InMemoryRuleStore::<DomainRedirect>::new());
    let paths = Arc::new(InMemoryRuleStore::<RegexRedirect>::new());

    // Writer and reader share the store but talk to Redis separately,
    // the way two gateway processes would.
    let writer_cache = Arc::new(RedisIndexCache::new(server.connection().await.unwrap()));
    let reader_cache = Arc::new(RedisIndexCache::new(server.connection().await.unwrap()));

    let service = RuleService::domains(Arc::clone(&domains), writer_cache);
    let resolver = RedirectResolver::from_stores(Arc::clone(&domains), paths, reader_cache);

    let request = RedirectRequest::builder()
        .host("a.example.com")
        .path("/x")
        .build();
    assert!(resolver.resolve(&request).await.unwrap().is_none());

    let saved = service
        .save(DomainRedirect::new("a.example.com", "b.example.com", RedirectKind::Permanent))
        .await
        .unwrap();

    let decision = resolver.resolve(&request).await.unwrap().unwrap();
    assert_eq!(decision.location, "http://b.example.com/x");

    service.delete(saved.id().unwrap()).await.unwrap();
    assert!(resolver.resolve(&request).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn compiled_rules_survive_a_round_trip() {
    let server = RedisServer::new().await.expect("start redis");
    let cache = Arc::new(RedisIndexCache::new(server.connection().await.unwrap()));

    let domains = Arc::new(InMemoryRuleStore::<DomainRedirect>::new());
    let paths = Arc::new(InMemoryRuleStore::<RegexRedirect>::new());

    let service = RuleService::regex_rules(Arc::clone(&paths), Arc::clone(&cache));
    service
        .save(
            RegexRedirect::new("^/old/", "/new/", RedirectKind::Temporary)
                .with_priority(Priority::new(10).unwrap()),
        )
        .await
        .unwrap();

    let resolver = RedirectResolver::from_stores(domains, paths, cache);
    let decision = resolver.resolve_path("/old/page").await.unwrap().unwrap();
    assert_eq!(decision.location, "/new/");
    assert_eq!(decision.kind, RedirectKind::Temporary);
}
