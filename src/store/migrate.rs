use crate::quiz::profile::ProfileSnapshot;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_normalize_profiles", m002_normalize_profiles),
    ]
}

/// 执行所有未应用的数据库迁移。
///
/// - 每个迁移必须幂等：func() 成功但 set_version() 之前崩溃时会重跑。
/// - 版本号在每个迁移成功后立即持久化。
/// - 仅向前：set_version 拒绝降级。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("stored version has {} bytes, expected 4", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rewrites readable profiles in the current schema. Unreadable ones are left
/// alone; loading resets them.
fn m002_normalize_profiles(store: &Store) -> Result<(), StoreError> {
    let mut rewritten = 0usize;
    for entry in store.profiles.iter() {
        let (key, value) = entry?;
        match ProfileSnapshot::decode(&value) {
            Ok(snapshot) => {
                store.profiles.insert(key, Store::serialize(&snapshot)?)?;
                rewritten += 1;
            }
            Err(e) => {
                tracing::warn!(
                    key = %String::from_utf8_lossy(&key),
                    error = %e,
                    "Skipping unreadable profile during migration"
                );
            }
        }
    }
    tracing::info!(rewritten, "Profiles normalized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn downgrade_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db2");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }

    #[test]
    fn old_profiles_are_upgraded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db3");
        let store = Store::open(path.to_str().unwrap()).unwrap();
        store
            .profiles
            .insert("old", br#"{"version":1,"tagStats":{"reading":{"correct":2,"miss":0}}}"#.as_ref())
            .unwrap();
        store.profiles.insert("junk", b"{{{".as_ref()).unwrap();

        run(&store).unwrap();

        let raw = store.profiles.get("old").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["tagStats"].as_object().unwrap().len(), 11);
        assert_eq!(json["tagStats"]["reading"]["correct"], 2);
        assert_eq!(store.profiles.get("junk").unwrap().unwrap().as_ref(), b"{{{");
    }
}
