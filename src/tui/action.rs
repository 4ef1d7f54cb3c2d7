// Outcomes of key handling that the main loop reacts to.
use crate::model::EventId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Created(EventId),
    Updated(EventId),
    Deleted(EventId),
}
