/// Notifications for observers of the lifecycle state, e.g. a UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    ProposalsChanged,
    SessionsChanged,
    RequestsChanged,
}
