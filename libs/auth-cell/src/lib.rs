pub mod guard;
pub mod handlers;
pub mod router;
pub mod services;

pub use guard::{
    can_activate, landing_path, protect, GuardDecision, RouteAccess, RouteGuard,
    ACCESS_DENIED_PATH, LOGIN_PATH,
};
pub use router::auth_routes;
pub use services::AuthService;
