mod common;

use common::{
    LoudPingHandler, Ping, PingHandler, Pinged, Pong, Unhandled, loud_ping_handler, ping_handler,
};
use courier::{
    BoxError, CancellationToken, Candidate, ContractShape, Lifetime, Mediator, MediatorError,
    NotificationHandler, RegistrationConfig, RequestHandler, TypeKey,
    testing::{FailingHandler, Journal, StaticResponder, TestError},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[tokio::test]
async fn single_handler_is_invoked_once() {
    let journal = Journal::new();
    let mediator = Mediator::builder().candidate(ping_handler(&journal)).build();

    let pong = mediator.send(&Ping(1), &CancellationToken::new()).await.unwrap();

    assert_eq!(pong, Pong(2));
    assert_eq!(journal.entries(), ["ping"]);
}

#[tokio::test]
async fn last_candidate_in_scan_order_wins() {
    let journal = Journal::new();
    let cancel = CancellationToken::new();

    let mediator = Mediator::builder()
        .candidate(ping_handler(&journal))
        .candidate(loud_ping_handler(&journal))
        .build();
    assert_eq!(mediator.send(&Ping(2), &cancel).await.unwrap(), Pong(200));

    let reversed = Mediator::builder()
        .candidate(loud_ping_handler(&journal))
        .candidate(ping_handler(&journal))
        .build();
    assert_eq!(reversed.send(&Ping(2), &cancel).await.unwrap(), Pong(3));

    // Only the winner ran each time.
    assert_eq!(journal.entries(), ["loud", "ping"]);
}

#[tokio::test]
async fn winner_is_stable_across_builds() {
    let journal = Journal::new();
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        let (mediator, registry) = Mediator::builder()
            .candidate(ping_handler(&journal))
            .candidate(loud_ping_handler(&journal))
            .build_with_registry();
        let registrations = registry.registrations(&ContractShape::request_handler::<Ping>());
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].key(), &TypeKey::of::<LoudPingHandler>());
        assert_eq!(mediator.send(&Ping(1), &cancel).await.unwrap(), Pong(100));
    }
}

#[tokio::test]
async fn keep_all_resolves_the_last_registration() {
    let journal = Journal::new();
    let (mediator, registry) = Mediator::builder()
        .config(RegistrationConfig::default().keep_all(true))
        .candidate(loud_ping_handler(&journal))
        .candidate(ping_handler(&journal))
        .build_with_registry();

    let shape = ContractShape::request_handler::<Ping>();
    let keys: Vec<_> = registry.registrations(&shape).iter().map(|r| r.key().clone()).collect();
    assert_eq!(keys, [TypeKey::of::<LoudPingHandler>(), TypeKey::of::<PingHandler>()]);

    let pong = mediator.send(&Ping(4), &CancellationToken::new()).await.unwrap();
    assert_eq!(pong, Pong(5));
}

#[tokio::test]
async fn missing_handler_names_the_request() {
    let mediator = Mediator::builder().build();

    let err = mediator
        .send(&Unhandled, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        MediatorError::HandlerNotFound { request, contract } => {
            assert!(request.ends_with("Unhandled"), "{request}");
            assert!(contract.starts_with("RequestHandler<"), "{contract}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn handler_errors_are_returned_unchanged() {
    let mediator = Mediator::builder()
        .candidate(Candidate::new(|| FailingHandler::new("boom")).request_handler::<Ping>())
        .build();

    let err = mediator.send(&Ping(1), &CancellationToken::new()).await.unwrap_err();

    let MediatorError::Handler(source) = err else {
        panic!("expected a handler error, got {err}");
    };
    assert_eq!(source.downcast_ref::<TestError>(), Some(&TestError("boom".into())));
}

#[tokio::test]
async fn constructor_failures_are_construction_errors() {
    let mediator = Mediator::builder()
        .candidate(
            Candidate::<StaticResponder<Ping>>::try_new(|| Err("pool exhausted".into()))
                .request_handler::<Ping>(),
        )
        .build();

    let err = mediator.send(&Ping(1), &CancellationToken::new()).await.unwrap_err();

    match err {
        MediatorError::HandlerConstruction { handler, source } => {
            assert!(handler.contains("StaticResponder"), "{handler}");
            assert_eq!(source.to_string(), "pool exhausted");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn transient_handlers_are_built_per_send() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let mediator = Mediator::builder()
        .candidate(
            Candidate::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                StaticResponder::<Ping>::new(Pong(7))
            })
            .request_handler::<Ping>(),
        )
        .build();

    let cancel = CancellationToken::new();
    mediator.send(&Ping(0), &cancel).await.unwrap();
    mediator.send(&Ping(0), &cancel).await.unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn singleton_handlers_are_built_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let mediator = Mediator::builder()
        .config(RegistrationConfig::default().with_lifetime(Lifetime::Singleton))
        .candidate(
            Candidate::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                StaticResponder::<Ping>::new(Pong(7))
            })
            .request_handler::<Ping>(),
        )
        .build();

    let cancel = CancellationToken::new();
    for _ in 0..3 {
        assert_eq!(mediator.send(&Ping(0), &cancel).await.unwrap(), Pong(7));
    }

    assert_eq!(built.load(Ordering::SeqCst), 1);
}

/// Answers pings and counts notifications with one instance.
struct Relay {
    seen: AtomicUsize,
}

impl RequestHandler<Ping> for Relay {
    async fn handle(&self, ping: &Ping, _: &CancellationToken) -> Result<Pong, BoxError> {
        Ok(Pong(ping.0 + self.seen.load(Ordering::SeqCst) as u32))
    }
}

impl NotificationHandler<Pinged> for Relay {
    async fn handle(&self, _: &Pinged, _: &CancellationToken) -> Result<(), BoxError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn singletons_are_shared_across_contracts() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let mediator = Mediator::builder()
        .config(RegistrationConfig::default().with_lifetime(Lifetime::Singleton))
        .candidate(
            Candidate::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Relay {
                    seen: AtomicUsize::new(0),
                }
            })
            .request_handler::<Ping>()
            .notification_handler::<Pinged>(),
        )
        .build();

    let cancel = CancellationToken::new();
    assert_eq!(mediator.send(&Ping(1), &cancel).await.unwrap(), Pong(1));
    mediator.publish(&Pinged(1), &cancel).await.unwrap();
    assert_eq!(mediator.send(&Ping(1), &cancel).await.unwrap(), Pong(2));

    assert_eq!(built.load(Ordering::SeqCst), 1);
}
