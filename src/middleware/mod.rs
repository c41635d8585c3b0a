// Middleware for resilient service calls

pub mod credential_pool;

pub use credential_pool::CredentialPool;
