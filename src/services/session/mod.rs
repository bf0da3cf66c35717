pub mod controller;
pub mod factory;
pub mod navigator;
pub mod state;
pub mod update;


pub use controller::SessionController;
pub use factory::build_session;
pub use navigator::{LogNavigator, NavigationError, Navigator};
pub use state::{SessionSnapshot, SessionState};
