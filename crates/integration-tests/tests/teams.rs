//! Integration tests for the team cache.
//!
//! Covers offline creation, the single-load guard, fallback to the cached
//! copy, idempotent deletes and owner changes while a request is in flight.

use std::sync::Arc;
use std::time::Duration;

use hr_feedback_client::{
    KeyValueStore, StoreError, SyncReport, SyncStatus, TeamStore, WritePolicy,
};
use hr_feedback_core::{AdminId, ResourceId};
use hr_feedback_integration_tests::TestContext;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn team_store(ctx: &TestContext, policy: WritePolicy) -> TeamStore {
    TeamStore::new(Arc::new(ctx.api()), ctx.local_store(), policy)
}

#[tokio::test]
async fn test_offline_create_is_cached_under_admin_key() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    let team = store
        .create_team("Core", vec!["x@y.com".to_string()])
        .await
        .expect("create should fall back to a local copy");

    assert!(team.id.as_str().starts_with("temp_team_"));
    assert_eq!(store.sync_status(&team.id), Some(SyncStatus::LocalOnly));
    let cached = ctx.cached("hrTeams_a1").expect("cache written");
    assert_eq!(cached[0]["_id"], json!(team.id.as_str()));
    assert_eq!(cached[0]["members"], json!(["x@y.com"]));
    assert!(ctx.cached("hrTeams").is_none());
}

#[tokio::test]
async fn test_create_sends_owner_and_members() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .and(body_partial_json(json!({
            "owner": "a1",
            "name": "Core",
            "members": ["x@y.com"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "team": "t42" })))
        .expect(1)
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    let team = store
        .create_team("Core", vec!["x@y.com".to_string()])
        .await
        .expect("create failed");

    assert_eq!(team.id.as_str(), "t42");
    assert_eq!(store.sync_status(&team.id), Some(SyncStatus::Synced));
}

#[tokio::test]
async fn test_concurrent_loads_issue_one_request() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/_getTeamsByOwner"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "teams": [{ "_id": "t1", "name": "Core", "members": [] }] }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    tokio::join!(store.load_from_backend(), store.load_from_backend());

    assert_eq!(store.teams().len(), 1);
    assert!(store.is_loaded());
}

#[tokio::test]
async fn test_backend_failure_falls_back_to_cache() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/_getTeamsByOwner"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.server)
        .await;
    let cached = json!([{ "_id": "t9", "name": "Cached", "members": ["a@b.c"] }]);
    ctx.local_store()
        .set("hrTeams_a1", &cached.to_string())
        .expect("seed cache");
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    store.load_from_backend().await;

    let teams = store.teams();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].name, "Cached");
    assert!(store.is_loaded());
}

#[tokio::test]
async fn test_corrupt_cache_and_failed_backend_yield_empty_list() {
    let ctx = TestContext::start().await;
    ctx.local_store()
        .set("hrTeams_a1", "[{\"_id\": ")
        .expect("seed cache");
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    store.load_from_backend().await;

    assert!(store.teams().is_empty());
    assert!(store.is_loaded());
}

/// Two creates in flight at once: each response writes the whole list to
/// the cache, so whichever lands last still carries both teams. The list
/// follows response order, not call order.
#[tokio::test]
async fn test_interleaved_creates_keep_both_teams() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .and(body_partial_json(json!({ "name": "Slow" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "team": "t1" }))
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .and(body_partial_json(json!({ "name": "Fast" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "team": "t2" }))
                .set_delay(Duration::from_millis(25)),
        )
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    let (slow, fast) = tokio::join!(
        store.create_team("Slow", vec![]),
        store.create_team("Fast", vec![])
    );

    assert_eq!(slow.expect("slow create").id.as_str(), "t1");
    assert_eq!(fast.expect("fast create").id.as_str(), "t2");
    let names: Vec<String> = store.teams().into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["Fast", "Slow"]);
    let cached = ctx.cached("hrTeams_a1").expect("cached");
    assert_eq!(cached[0]["_id"], json!("t2"));
    assert_eq!(cached[1]["_id"], json!("t1"));
}

#[tokio::test]
async fn test_deleting_twice_sends_one_request() {
    let ctx = TestContext::start().await;
    ctx.mount_teams("a1", json!([{ "_id": "t1", "name": "Core", "members": [] }]))
        .await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/deleteTeam"))
        .and(body_partial_json(json!({ "team": "t1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));
    store.load_from_backend().await;
    let id = ResourceId::new("t1");

    store.delete_team(&id).await.expect("first delete failed");
    store.delete_team(&id).await.expect("second delete failed");

    assert!(store.teams().is_empty());
    assert_eq!(ctx.cached("hrTeams_a1"), Some(json!([])));
}

#[tokio::test]
async fn test_owner_change_mid_load_discards_response() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/_getTeamsByOwner"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "teams": [{ "_id": "t1", "name": "A's", "members": [] }] }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    tokio::join!(store.load_from_backend(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set_owner(Some(AdminId::new("b2")));
    });

    assert!(store.teams().is_empty());
    assert_eq!(store.owner(), Some(AdminId::new("b2")));
    assert!(ctx.cached("hrTeams_a1").is_none());
    assert!(ctx.cached("hrTeams_b2").is_none());
}

#[tokio::test]
async fn test_owner_change_mid_create_is_reported() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "team": "t1" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));

    let (result, ()) = tokio::join!(store.create_team("Late", vec![]), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set_owner(Some(AdminId::new("b2")));
    });

    assert!(matches!(result, Err(StoreError::OwnerChanged { .. })));
    assert!(store.teams().is_empty());
}

#[tokio::test]
async fn test_optimistic_rename_survives_backend_failure_until_sync() {
    let ctx = TestContext::start().await;
    ctx.mount_teams("a1", json!([{ "_id": "t1", "name": "Old", "members": [] }]))
        .await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/updateTeam"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/updateTeam"))
        .and(body_partial_json(json!({ "team": "t1", "name": "New" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));
    store.load_from_backend().await;
    let id = ResourceId::new("t1");

    let mut team = store.get_team_by_id(&id).expect("team loaded");
    team.name = "New".to_string();
    store.update_team(team).await.expect("optimistic update never fails");

    assert_eq!(store.sync_status(&id), Some(SyncStatus::Unsynced));
    assert_eq!(ctx.cached("hrTeams_a1").expect("cached")[0]["name"], json!("New"));

    let report = store.sync_pending().await.expect("sync failed");
    assert_eq!(report, SyncReport { synced: 1, failed: 0, replaced: vec![] });
    assert_eq!(store.sync_status(&id), Some(SyncStatus::Synced));
}

#[tokio::test]
async fn test_sync_pending_swaps_temp_id_for_backend_id() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "team": "t7" })))
        .mount(&ctx.server)
        .await;
    let store = team_store(&ctx, WritePolicy::Optimistic);
    store.set_owner(Some(AdminId::new("a1")));
    let offline = store.create_team("Offline", vec![]).await.expect("create");

    let report = store.sync_pending().await.expect("sync failed");

    assert_eq!(
        report,
        SyncReport {
            synced: 1,
            failed: 0,
            replaced: vec![(offline.id.clone(), ResourceId::new("t7"))],
        }
    );
    assert!(store.get_team_by_id(&offline.id).is_none());
    let synced = store
        .get_team_by_id(&ResourceId::new("t7"))
        .expect("backend id applied");
    assert_eq!(synced.name, "Offline");
    assert_eq!(ctx.cached("hrTeams_a1").expect("cached")[0]["_id"], json!("t7"));
}

#[tokio::test]
async fn test_stores_in_two_tabs_share_admin_cache() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/api/OrgGraph/createTeam"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;
    let first = team_store(&ctx, WritePolicy::Optimistic);
    first.set_owner(Some(AdminId::new("a1")));
    first.create_team("Offline", vec![]).await.expect("create");

    let second = team_store(&ctx, WritePolicy::Optimistic);
    second.set_owner(Some(AdminId::new("a1")));
    second.load_from_local_storage();
    let other = team_store(&ctx, WritePolicy::Optimistic);
    other.set_owner(Some(AdminId::new("b2")));
    other.load_from_local_storage();

    assert_eq!(second.teams(), first.teams());
    assert!(other.teams().is_empty());
}
