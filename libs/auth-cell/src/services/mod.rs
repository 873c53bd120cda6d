pub mod session;

pub use session::AuthService;
