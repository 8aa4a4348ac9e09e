pub mod config;
pub mod constants;
pub mod error;
pub mod explosion;
pub mod frame;
pub mod gesture;
pub mod music;
pub mod scene;
pub mod shapes;
pub mod state;
pub mod status;
pub mod tier;
pub mod tween;

pub use config::*;
pub use constants::*;
pub use error::TreeError;
pub use explosion::*;
pub use frame::*;
pub use gesture::*;
pub use music::*;
pub use scene::*;
pub use shapes::*;
pub use state::*;
pub use status::*;
pub use tier::*;
pub use tween::*;
