use chrono::Utc;
use crossbeam::atomic::AtomicCell;
use rand::{thread_rng, Rng};

use crate::{Fields, PrimaryKey};

static LAST_ID: AtomicCell<PrimaryKey> = AtomicCell::new(0);

/// Returns a new 32 character hex token made from 16 random bytes
pub fn session_token() -> String {
    let bytes: [u8; 16] = thread_rng().gen();

    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Returns a time-based id, the current unix time in milliseconds.
/// Ids handed out by this process are strictly increasing, so records created
/// within the same millisecond still get distinct ids.
pub fn time_based_id() -> PrimaryKey {
    let now = Utc::now().timestamp_millis().max(0) as PrimaryKey;

    loop {
        let last = LAST_ID.load();
        let next = now.max(last + 1);

        if LAST_ID.compare_exchange(last, next).is_ok() {
            return next;
        }
    }
}

/// Copies every field of `patch` over `target`, except the id
pub fn shallow_merge(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        if key == "id" {
            continue;
        }

        target.insert(key, value);
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_session_token_format() {
        let first = session_token();
        let second = session_token();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second, "tokens should not repeat");
    }

    #[test]
    fn test_time_based_ids_increase() {
        let ids: Vec<_> = (0..100).map(|_| time_based_id()).collect();

        assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "ids created in a burst should be strictly increasing"
        );
        assert!(ids[0] > 1_600_000_000_000, "ids should be unix millis");
    }

    #[test]
    fn test_shallow_merge() {
        let mut target = json!({ "id": 1, "title": "Old", "content": "Body" })
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({ "id": 99, "title": "New" })
            .as_object()
            .cloned()
            .unwrap();

        shallow_merge(&mut target, patch);

        assert_eq!(target["id"], 1, "id should never be overwritten");
        assert_eq!(target["title"], "New");
        assert_eq!(target["content"], "Body");
    }
}
