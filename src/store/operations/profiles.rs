use chrono::NaiveDate;

use crate::quiz::engine::ProfileRepository;
use crate::quiz::profile::ProfileSnapshot;
use crate::store::keys;
use crate::store::{Store, StoreError};

impl Store {
    /// `None` when nothing is stored. Unreadable blobs surface as errors here;
    /// [`ProfileRepository::load_profile`] decides to fall back.
    pub fn get_profile(&self, profile_id: &str) -> Result<Option<ProfileSnapshot>, StoreError> {
        let key = keys::profile_key(profile_id)?;
        match self.profiles.get(key.as_bytes())? {
            Some(raw) => ProfileSnapshot::decode(&raw)
                .map(Some)
                .map_err(|e| StoreError::Validation(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn put_profile(&self, profile_id: &str, snapshot: &ProfileSnapshot) -> Result<(), StoreError> {
        let key = keys::profile_key(profile_id)?;
        self.profiles
            .insert(key.as_bytes(), Self::serialize(snapshot)?)?;
        self.profiles.flush()?;
        Ok(())
    }

    pub fn remove_profile(&self, profile_id: &str) -> Result<bool, StoreError> {
        let key = keys::profile_key(profile_id)?;
        Ok(self.profiles.remove(key.as_bytes())?.is_some())
    }

    pub fn count_profiles(&self) -> usize {
        self.profiles.len()
    }
}

impl ProfileRepository for Store {
    fn load_profile(&self, profile_id: &str, today: NaiveDate) -> Result<ProfileSnapshot, StoreError> {
        let key = keys::profile_key(profile_id)?;
        let Some(raw) = self.profiles.get(key.as_bytes())? else {
            return Ok(ProfileSnapshot::fresh(today));
        };
        match ProfileSnapshot::decode(&raw) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                tracing::warn!(profile_id, error = %e, "Stored profile unreadable, starting fresh");
                Ok(ProfileSnapshot::fresh(today))
            }
        }
    }

    fn save_profile(&self, profile_id: &str, snapshot: &ProfileSnapshot) -> Result<(), StoreError> {
        self.put_profile(profile_id, snapshot)
    }

    fn delete_profile(&self, profile_id: &str) -> Result<(), StoreError> {
        self.remove_profile(profile_id).map(|_| ())
    }
}
