use crate::email::composer::EmailComposer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Holds the injected `TextGenerator`; swap it to run against a fake.
    pub composer: EmailComposer,
}
