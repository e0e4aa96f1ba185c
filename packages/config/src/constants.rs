// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across cloudlens

// Backend API
pub const CLOUDLENS_API_URL: &str = "CLOUDLENS_API_URL";
pub const CLOUDLENS_HTTP_TIMEOUT_SECS: &str = "CLOUDLENS_HTTP_TIMEOUT_SECS";

// Identity Provider (Microsoft Entra ID)
pub const CLOUDLENS_CLIENT_ID: &str = "CLOUDLENS_CLIENT_ID";
pub const CLOUDLENS_TENANT_ID: &str = "CLOUDLENS_TENANT_ID";
pub const CLOUDLENS_REDIRECT_PORT: &str = "CLOUDLENS_REDIRECT_PORT";
pub const CLOUDLENS_API_SCOPES: &str = "CLOUDLENS_API_SCOPES";
pub const CLOUDLENS_TOKEN_EXPIRY_BUFFER_SECS: &str = "CLOUDLENS_TOKEN_EXPIRY_BUFFER_SECS";

// Snapshot Cache
pub const CLOUDLENS_DATA_DIR: &str = "CLOUDLENS_DATA_DIR";
pub const CLOUDLENS_RETENTION_DAYS: &str = "CLOUDLENS_RETENTION_DAYS";
pub const CLOUDLENS_MAX_CACHE_ENTRIES: &str = "CLOUDLENS_MAX_CACHE_ENTRIES";

// Summary Service
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";

// Defaults
pub const DEFAULT_API_URL: &str = "http://localhost:7071/api";
pub const DEFAULT_TENANT_ID: &str = "common";
pub const DEFAULT_REDIRECT_PORT: u16 = 3737;
pub const DEFAULT_RETENTION_DAYS: u64 = 365;
pub const DEFAULT_TOKEN_EXPIRY_BUFFER_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DATA_DIR_NAME: &str = ".cloudlens";
pub const DATABASE_FILE_NAME: &str = "cloudlens.db";
