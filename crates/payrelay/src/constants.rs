/// Status reported for transactions that have not received a callback yet.
pub const PENDING_STATUS: &str = "PENDING";

/// Separator between the digest and the salt index in the `x-verify` header.
pub const SIGNATURE_SEPARATOR: &str = "###";

/// Header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "x-verify";

/// Endpoint path the provider mixes into the signature by default.
pub const DEFAULT_SIGNATURE_PATH: &str = "/pg/v1/status";

/// Default route the provider posts callbacks to.
pub const DEFAULT_CALLBACK_PATH: &str = "/phonepe/callback";

/// Name of the body/form field carrying the base64 response blob.
pub const RESPONSE_FIELD: &str = "response";
