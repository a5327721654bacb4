pub mod state;
pub mod time;

pub use state::State;
pub use time::Time;
