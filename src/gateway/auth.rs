use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::error::GatewayError;
use crate::storage::ConfigStorage;

/// Validates the shared-secret header against the credential store. No side
/// effects; the comparison runs in constant time.
pub struct AuthGate {
    config: Arc<ConfigStorage>,
}

impl AuthGate {
    pub fn new(config: Arc<ConfigStorage>) -> Self {
        Self { config }
    }

    pub fn verify(&self, provided: Option<&str>) -> Result<(), GatewayError> {
        let provided = provided
            .filter(|value| !value.is_empty())
            .ok_or(GatewayError::MissingCredential)?;

        let expected = self.config.auth_key().map_err(GatewayError::Internal)?;

        if constant_time_eq(provided, &expected) {
            Ok(())
        } else {
            Err(GatewayError::InvalidCredential)
        }
    }
}

/// Constant-time string comparison. Both inputs are padded to a common
/// length so neither content nor length leaks through timing.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let max_len = std::cmp::max(a.len(), b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];

    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::Database;
    use tempfile::tempdir;

    fn setup() -> (AuthGate, Arc<ConfigStorage>, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        let config = Arc::new(ConfigStorage::new(db).unwrap());
        (AuthGate::new(config.clone()), config, temp_dir)
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let (gate, _config, _temp_dir) = setup();

        assert!(matches!(
            gate.verify(None),
            Err(GatewayError::MissingCredential)
        ));
        assert!(matches!(
            gate.verify(Some("")),
            Err(GatewayError::MissingCredential)
        ));
    }

    #[test]
    fn test_wrong_key_is_forbidden() {
        let (gate, _config, _temp_dir) = setup();

        assert!(matches!(
            gate.verify(Some("whk_definitely_wrong")),
            Err(GatewayError::InvalidCredential)
        ));
    }

    #[test]
    fn test_correct_key_passes() {
        let (gate, config, _temp_dir) = setup();

        let key = config.auth_key().unwrap();
        assert!(gate.verify(Some(&key)).is_ok());
    }

    #[test]
    fn test_rotated_key_invalidates_old_one() {
        let (gate, config, _temp_dir) = setup();

        let old = config.auth_key().unwrap();
        let new = config.rotate_auth_key().unwrap();

        assert!(matches!(
            gate.verify(Some(&old)),
            Err(GatewayError::InvalidCredential)
        ));
        assert!(gate.verify(Some(&new)).is_ok());
    }

    #[test]
    fn test_constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("", "abc"));
        assert!(constant_time_eq("", ""));
    }
}
