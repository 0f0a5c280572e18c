pub mod routes;
pub mod websocket;

pub use routes::create_router;
pub use websocket::AppState;
