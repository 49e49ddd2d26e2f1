//! Client-side synchronization between the user form and the backend
//! collection endpoint.

pub mod gateway;
pub mod store;
pub mod types;
pub mod view;

pub use self::gateway::{ErrorKind, Gateway, HttpGateway, TransportError};
pub use self::store::{CollectionStore, LoadOutcome, StoreState, SubmitOutcome};
pub use self::types::{Draft, DraftError, User, UserId};
