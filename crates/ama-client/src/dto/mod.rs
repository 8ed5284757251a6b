//! Wire types of the AMA REST API

mod requests;
mod responses;

pub use requests::{CreateMessageRequest, CreateRoomRequest};
pub use responses::{CreatedResponse, ReactionCountResponse, RoomMessageResponse};
