pub const AUCTIONS: &str = "auctions";
pub const CONFIG_VERSIONS: &str = "config_versions";

// Secondary index trees
pub const AUCTIONS_ACTIVE_BY_CREATED_AT: &str = "auctions_active_by_created_at";
