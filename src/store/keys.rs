use crate::constants::MAX_PROFILE_ID_LEN as MAX_KEY_COMPONENT_LEN;
use crate::store::StoreError;

fn validate_component(entity: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{entity} key must not be empty")));
    }
    if value.len() > MAX_KEY_COMPONENT_LEN {
        return Err(StoreError::Validation(format!(
            "{entity} key exceeds {MAX_KEY_COMPONENT_LEN} bytes"
        )));
    }
    if value.contains(':') {
        return Err(StoreError::Validation(format!("{entity} key must not contain ':'")));
    }
    Ok(())
}

pub fn profile_key(profile_id: &str) -> Result<String, StoreError> {
    validate_component("profile", profile_id)?;
    Ok(profile_id.to_string())
}
