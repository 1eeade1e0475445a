//! Middleware for authentication and request tracking

// Token claims and extraction
pub mod token;

// JWT identity middleware
pub mod jwt;

pub mod request_tracking;

pub use jwt::{JwtAuth, INVALID_TOKEN_MESSAGE};
pub use token::{Claims, TokenValidator};

pub use request_tracking::{
    process_time, request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    PROCESS_TIME_HEADER, REQUEST_ID_HEADER, SENSITIVE_HEADERS,
};
