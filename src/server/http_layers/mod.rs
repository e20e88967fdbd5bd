mod requests_logging;
mod security_gate;
mod security_headers;

pub use requests_logging::{log_requests, RequestsLoggingLevel, REQUEST_ID_HEADER};
pub use security_gate::{
    client_identifier, rate_limited_response, security_gate, unauthorized_response,
    WWW_AUTHENTICATE_VALUE,
};
pub use security_headers::{cors_layer, security_header_layers, SECURITY_HEADERS};
