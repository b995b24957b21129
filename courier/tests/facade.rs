mod common;

use common::{FirstListener, Ping, Pinged, Pong, SecondListener, Unhandled, ping_handler};
use courier::{
    AnyNotification, AnyRequest, CancellationToken, ContractShape, HandlerRegistry, Instance,
    Mediator, MediatorError, Publisher, Registration, RegistryBuilder, ResolveError, Sender,
    ServiceProvider, ServiceRegistrar, TypeKey, testing::Journal,
};
use std::sync::Arc;

async fn ask(sender: &impl Sender, n: u32) -> Result<Pong, MediatorError> {
    sender.send(&Ping(n), &CancellationToken::new()).await
}

async fn announce(publisher: &impl Publisher, n: u32) -> Result<(), MediatorError> {
    publisher.publish(&Pinged(n), &CancellationToken::new()).await
}

#[tokio::test]
async fn sender_and_publisher_split_the_facade() {
    let journal = Journal::new();
    let mediator = Mediator::builder()
        .candidate(ping_handler(&journal))
        .candidate(FirstListener::candidate(&journal))
        .build();

    assert_eq!(ask(&mediator, 1).await.unwrap(), Pong(2));
    announce(&mediator, 1).await.unwrap();

    assert_eq!(journal.entries(), ["ping", "first"]);
}

#[tokio::test]
async fn clones_share_the_registry() {
    let journal = Journal::new();
    let mediator = Mediator::builder().candidate(ping_handler(&journal)).build();
    let clone = mediator.clone();

    assert!(Arc::ptr_eq(mediator.provider(), clone.provider()));
    assert_eq!(clone.send(&Ping(1), &CancellationToken::new()).await.unwrap(), Pong(2));
}

#[tokio::test]
async fn requests_can_be_sent_without_their_static_type() {
    let journal = Journal::new();
    let mediator = Mediator::builder().candidate(ping_handler(&journal)).build();
    let cancel = CancellationToken::new();
    let requests: Vec<Box<dyn AnyRequest>> = vec![Box::new(Ping(1)), Box::new(Ping(5))];

    let mut responses = Vec::new();
    for request in &requests {
        assert_eq!(request.contract(), ContractShape::request_handler::<Ping>());
        let response = mediator.send_dyn(request.as_ref(), &cancel).await.unwrap();
        responses.push(*response.downcast::<Pong>().unwrap());
    }

    assert_eq!(responses, [Pong(2), Pong(6)]);
}

#[tokio::test]
async fn loosely_typed_send_reports_missing_handlers() {
    let mediator = Mediator::builder().build();

    let err = mediator
        .send_dyn(&Unhandled, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn notifications_can_be_published_without_their_static_type() {
    let journal = Journal::new();
    let mediator = Mediator::builder()
        .candidate(FirstListener::candidate(&journal))
        .candidate(SecondListener::candidate(&journal))
        .build();
    let notification: Box<dyn AnyNotification> = Box::new(Pinged(3));

    assert!(notification.notification_type().ends_with("Pinged"));
    mediator
        .publish_dyn(notification.as_ref(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(journal.entries(), ["first", "second"]);
}

#[tokio::test]
async fn mediator_runs_over_a_hand_filled_registry() {
    let journal = Journal::new();
    let mut registry = HandlerRegistry::new();
    RegistryBuilder::new()
        .candidate(ping_handler(&journal))
        .register_into(&mut registry);
    registry.add(
        ContractShape::notification_handler::<Pinged>(),
        Registration::transient(Arc::new(FirstListener::candidate(&journal))),
    );

    let mediator = Mediator::new(Arc::new(registry));
    let cancel = CancellationToken::new();
    mediator.send(&Ping(1), &cancel).await.unwrap();
    mediator.publish(&Pinged(1), &cancel).await.unwrap();

    assert_eq!(journal.entries(), ["ping", "first"]);
}

/// A provider whose container is broken.
struct Unavailable;

impl ServiceProvider for Unavailable {
    fn resolve(&self, _service: &ContractShape) -> Result<Option<Instance>, ResolveError> {
        Err(ResolveError::Construction {
            implementation: TypeKey::named("Database"),
            source: "connection refused".into(),
        })
    }

    fn resolve_all(&self, _service: &ContractShape) -> Result<Vec<Instance>, ResolveError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn provider_failures_are_construction_errors() {
    let mediator = Mediator::new(Arc::new(Unavailable));

    let err = mediator.send(&Ping(1), &CancellationToken::new()).await.unwrap_err();

    match err {
        MediatorError::HandlerConstruction { handler, source } => {
            assert_eq!(handler, "Database");
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Fan-out lookups see no handlers at all.
    mediator.publish(&Pinged(1), &CancellationToken::new()).await.unwrap();
}
