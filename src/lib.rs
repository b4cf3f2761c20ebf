pub mod arena;
pub mod bot;
pub mod game;
pub mod search;

pub use arena::*;
pub use bot::*;
pub use game::*;
pub use search::*;
