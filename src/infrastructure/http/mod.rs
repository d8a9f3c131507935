//! Outbound HTTP used to check link liveness.

pub mod http_link_validator;

pub use http_link_validator::{
    DEFAULT_USER_AGENT, HttpLinkValidator, HttpValidatorConfig, ProbeError,
};
