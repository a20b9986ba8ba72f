//! End-to-end flows: one installation creating and swiping, and a second
//! installation joining from a copy of the session catalog.

use async_trait::async_trait;
use matcher_core::durability::{Durability, Snapshot};
use matcher_core::{
    CandidateListing, CandidateProvider, Location, MatchingContext, MemoryStorage,
    ParticipantId, PortResult, Role, SessionRequest,
};
use std::sync::Arc;

struct ThreeRestaurants;

#[async_trait]
impl CandidateProvider for ThreeRestaurants {
    async fn search(
        &self,
        location: Location,
        _radius_m: f64,
        limit: usize,
    ) -> PortResult<Vec<CandidateListing>> {
        Ok(["R1", "R2", "R3"]
            .iter()
            .take(limit)
            .map(|name| CandidateListing {
                external_id: format!("place-{}", name),
                name: name.to_string(),
                address: format!("{} Street", name),
                location,
                rating: Some(4.0),
                photo_refs: Some(vec![format!("photo-{}", name)]),
            })
            .collect())
    }
}

fn request() -> SessionRequest {
    SessionRequest::new(Location::new(-122.4, 37.8).unwrap(), 1000.0)
}

#[tokio::test]
async fn only_candidates_liked_on_both_sides_match() {
    let mut ctx = MatchingContext::open(Arc::new(MemoryStorage::new())).await;
    ctx.start_session(request(), &ThreeRestaurants, 5)
        .await
        .unwrap();

    let ids: Vec<_> = ctx.active_candidates().iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 3);
    let (r1, r2, r3) = (ids[0], ids[1], ids[2]);

    ctx.record_swipe(r1, true);
    ctx.record_swipe(r2, false);
    let matches = ctx.apply_counterpart_swipes([(r1, true), (r3, true)]);

    assert_eq!(matches, vec![r1]);
    assert_eq!(ctx.reconcile(), vec![r1]);
    let matched: Vec<_> = ctx
        .matched_candidates()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(matched, vec!["R1".to_string()]);
}

#[tokio::test]
async fn a_second_installation_joins_from_a_copied_catalog() {
    let alice_storage = MemoryStorage::new();
    let mut alice = MatchingContext::open(Arc::new(alice_storage.clone())).await;
    let code = alice
        .start_session(request(), &ThreeRestaurants, 5)
        .await
        .unwrap();

    // Bob's installation holds a copy of the catalog under his own identity.
    let bob_id = ParticipantId::new();
    let bob_storage = MemoryStorage::new();
    Durability::new(Arc::new(bob_storage.clone()))
        .save(&Snapshot {
            sessions: alice.sessions().map(|s| (s.id.clone(), s.clone())).collect(),
            identity: Some(bob_id),
        })
        .await
        .unwrap();
    let mut bob = MatchingContext::open(Arc::new(bob_storage.clone())).await;
    assert_eq!(bob.identity(), bob_id);

    let joined = bob.join_by_code(code.as_str()).await.unwrap();
    assert_eq!(joined, code);
    assert_eq!(bob.role(), Some(Role::Joiner));
    let alice_ids: Vec<_> = alice.active_candidates().iter().map(|c| c.id).collect();
    let bob_ids: Vec<_> = bob.active_candidates().iter().map(|c| c.id).collect();
    assert_eq!(bob_ids, alice_ids);

    // Alice swipes locally and receives Bob's ledger through the integration point.
    let bob_ledger = {
        bob.record_swipe(alice_ids[0], true);
        bob.record_swipe(alice_ids[2], true);
        bob.local_swipes().clone()
    };
    alice.record_swipe(alice_ids[0], true);
    alice.record_swipe(alice_ids[1], true);
    let matches = alice.apply_counterpart_swipes(bob_ledger.iter());
    assert_eq!(matches, vec![alice_ids[0]]);

    // Bob's join is durable for his installation.
    let mut reopened = MatchingContext::open(Arc::new(bob_storage)).await;
    assert!(reopened.ensure_loaded(&code).await);
    let session = reopened.session(&code).unwrap();
    assert_eq!(session.initiator_id, alice.identity());
    assert_eq!(session.joiner_ids, vec![bob_id]);

    // Selecting the session again on Alice's side keeps her initiator role.
    assert_eq!(
        alice.select_active_session(&code).await.unwrap(),
        Some(Role::Initiator)
    );
    assert!(alice.matches().is_empty());
}
