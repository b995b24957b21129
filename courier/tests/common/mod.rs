#![allow(dead_code)]

use courier::{
    BoxError, CancellationToken, Candidate, Message, Notification, NotificationHandler, Request,
    RequestHandler, TypeDescriptor, testing::Journal,
};

// ============================================================================
// Test Message Types
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Ping(pub u32);

impl Message for Ping {}
impl Request for Ping {
    type Response = Pong;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pong(pub u32);

/// A request nothing handles.
#[derive(Clone, Debug)]
pub struct Unhandled;

impl Message for Unhandled {}
impl Request for Unhandled {
    type Response = ();
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pinged(pub u32);

impl Message for Pinged {}
impl Notification for Pinged {}

/// A notification nothing listens to.
#[derive(Clone, Debug)]
pub struct Ignored;

impl Message for Ignored {}
impl Notification for Ignored {}

// ============================================================================
// Test Handlers
// ============================================================================

/// Answers `Ping(n)` with `Pong(n + 1)` and records `"ping"`.
pub struct PingHandler {
    pub journal: Journal,
}

impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, ping: &Ping, _cancel: &CancellationToken) -> Result<Pong, BoxError> {
        self.journal.record("ping");
        Ok(Pong(ping.0 + 1))
    }
}

/// Answers `Ping(n)` with `Pong(n * 100)` and records `"loud"`.
pub struct LoudPingHandler {
    pub journal: Journal,
}

impl RequestHandler<Ping> for LoudPingHandler {
    async fn handle(&self, ping: &Ping, _cancel: &CancellationToken) -> Result<Pong, BoxError> {
        self.journal.record("loud");
        Ok(Pong(ping.0 * 100))
    }
}

pub fn ping_handler(journal: &Journal) -> TypeDescriptor {
    let journal = journal.clone();
    Candidate::new(move || PingHandler {
        journal: journal.clone(),
    })
    .request_handler::<Ping>()
    .into_descriptor()
}

pub fn loud_ping_handler(journal: &Journal) -> TypeDescriptor {
    let journal = journal.clone();
    Candidate::new(move || LoudPingHandler {
        journal: journal.clone(),
    })
    .request_handler::<Ping>()
    .into_descriptor()
}

// Listener types must be distinct: fan-out registration keeps one entry per
// implementation type.
macro_rules! listeners {
    ($($name:ident => $label:literal),* $(,)?) => {
        $(
            pub struct $name {
                pub journal: Journal,
            }

            impl NotificationHandler<Pinged> for $name {
                async fn handle(&self, _: &Pinged, _: &CancellationToken) -> Result<(), BoxError> {
                    self.journal.record($label);
                    Ok(())
                }
            }

            impl $name {
                pub fn candidate(journal: &Journal) -> TypeDescriptor {
                    let journal = journal.clone();
                    Candidate::new(move || $name { journal: journal.clone() })
                        .notification_handler::<Pinged>()
                        .into_descriptor()
                }
            }
        )*
    };
}

listeners! {
    FirstListener => "first",
    SecondListener => "second",
    ThirdListener => "third",
}
