pub const ROUTE_ROOT: &str = "/";
pub const ROUTE_HEALTHZ: &str = "/healthz";
pub const ROUTE_QUOTES: &str = "/quotes";
pub const ROUTE_QUOTES_RANDOM: &str = "/quotes/random";
pub const ROUTE_QUOTES_CATEGORIES: &str = "/quotes/categories";
pub const ROUTE_QUOTES_AUTHORS: &str = "/quotes/authors";
pub const ROUTE_QUOTE_BY_ID: &str = "/quotes/:id";
pub const ROUTE_QUOTES_BY_CATEGORY: &str = "/quotes/category/:category";
pub const ROUTE_QUOTES_BY_AUTHOR: &str = "/quotes/author/:author";
pub const ROUTE_ADMIN_CACHE: &str = "/admin/cache";
pub const ROUTE_ADMIN_CACHE_INVALIDATE: &str = "/admin/cache/invalidate";
pub const ROUTE_ADMIN_INTEGRITY: &str = "/admin/integrity";

pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CODE_INVALID_QUERY_PARAMETER: &str = "INVALID_QUERY_PARAMETER";
