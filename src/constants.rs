/// 会话闲置多久后被回收（分钟）
pub const DEFAULT_SESSION_TTL_MINS: u64 = 120;

/// 后台回收闲置会话的间隔（秒）
pub const SESSION_PRUNE_INTERVAL_SECS: u64 = 300;

/// 档案 id 最大长度
pub const MAX_PROFILE_ID_LEN: usize = 64;

/// 导入档案时请求体上限
pub const MAX_IMPORT_BODY_BYTES: usize = 4 * 1024 * 1024;

pub const DEFAULT_CATALOG_PATH: &str = "./data/questions.json";
