//! Id and timestamp helpers used when constructing canonical entities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a fresh correlation/entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The current UTC instant, used for every `*_time` field in the data model.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_new_id_is_uuid() {
        let id = new_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
