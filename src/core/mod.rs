pub mod decision;
pub mod events;
pub mod routing;
pub mod signature;
pub mod tts;
