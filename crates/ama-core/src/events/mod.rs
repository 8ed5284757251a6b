//! Room events pushed by the server

mod room_event;

pub use room_event::RoomEvent;
