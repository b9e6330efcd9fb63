// Error codes returned to API clients by the mTLS gateway executors

pub mod mtls {
    pub const CERTIFICATE_MISSING: &str = "MTLS_4001";
    pub const CERTIFICATE_INVALID: &str = "MTLS_4002";
    pub const CERTIFICATE_EXPIRED: &str = "MTLS_4003";
    pub const CERTIFICATE_REVOKED: &str = "MTLS_4004";
}

pub mod tpp {
    pub const ROLE_INVALID: &str = "TPP_4031";
    pub const VALIDATION_SERVICE_UNAVAILABLE: &str = "TPP_5031";
}

pub mod http {
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}
