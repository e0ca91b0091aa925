pub const PROFILES: &str = "profiles";
pub const META: &str = "meta";
