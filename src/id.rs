// Record identity

use eyre::{Result, eyre};

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Millisecond-timestamp ids that never repeat
///
/// Hands out the wall clock when it has moved past the last id, otherwise
/// `last + 1`. Seeded with the largest id already stored so a reopened
/// store cannot reuse one. Fails once `i64::MAX` has been handed out.
#[derive(Debug, Clone)]
pub struct IdSource {
    last: i64,
}

impl IdSource {
    pub fn new(floor: i64) -> Self {
        Self { last: floor }
    }

    pub fn next_id(&mut self) -> Result<i64> {
        let floor = self
            .last
            .checked_add(1)
            .ok_or_else(|| eyre!("Todo id space exhausted (last id {})", self.last))?;
        let id = now_ms().max(floor);
        self.last = id;
        Ok(id)
    }

    pub fn last(&self) -> i64 {
        self.last
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut ids = IdSource::default();
        let mut prev = ids.next_id().unwrap();
        for _ in 0..1000 {
            let id = ids.next_id().unwrap();
            assert!(id > prev);
            prev = id;
        }
    }

    #[test]
    fn test_floor_in_the_future() {
        let floor = now_ms() + 60_000;
        let mut ids = IdSource::new(floor);
        assert_eq!(ids.next_id().unwrap(), floor + 1);
        assert_eq!(ids.next_id().unwrap(), floor + 2);
        assert_eq!(ids.last(), floor + 2);
    }

    #[test]
    fn test_exhausted_at_max() {
        let mut ids = IdSource::new(i64::MAX - 1);
        assert_eq!(ids.next_id().unwrap(), i64::MAX);
        assert!(ids.next_id().is_err());
        assert_eq!(ids.last(), i64::MAX);
    }
}
