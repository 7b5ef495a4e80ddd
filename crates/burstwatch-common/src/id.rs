use snowflake::SnowflakeIdBucket;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Largest machine or node id a Snowflake id can carry (five bits each).
pub const MAX_WORKER_ID: i32 = 31;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("Id: {field} must be in 0..=31, got {value}")]
    OutOfRange { field: &'static str, value: i32 },
}

/// Checks a machine/node pair without building a generator.
pub fn check_worker_ids(machine_id: i32, node_id: i32) -> Result<(), IdError> {
    for (field, value) in [("machine_id", machine_id), ("node_id", node_id)] {
        if !(0..=MAX_WORKER_ID).contains(&value) {
            return Err(IdError::OutOfRange { field, value });
        }
    }
    Ok(())
}

/// Snowflake source for alert ids.
///
/// Each detector owns one, so two processes only collide if they were
/// given the same `machine_id`/`node_id` pair.
///
/// # Examples
///
/// ```
/// use burstwatch_common::id::AlertIds;
///
/// let ids = AlertIds::new(3, 7).unwrap();
/// assert_ne!(ids.next_id(), ids.next_id());
/// assert!(AlertIds::new(32, 0).is_err());
/// ```
pub struct AlertIds {
    machine_id: i32,
    node_id: i32,
    bucket: Mutex<SnowflakeIdBucket>,
}

impl AlertIds {
    pub fn new(machine_id: i32, node_id: i32) -> Result<Self, IdError> {
        check_worker_ids(machine_id, node_id)?;
        Ok(Self {
            machine_id,
            node_id,
            bucket: Mutex::new(SnowflakeIdBucket::new(machine_id, node_id)),
        })
    }

    pub fn machine_id(&self) -> i32 {
        self.machine_id
    }

    pub fn node_id(&self) -> i32 {
        self.node_id
    }

    /// Next id as a decimal string.
    pub fn next_id(&self) -> String {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.get_id().to_string()
    }
}

impl Default for AlertIds {
    fn default() -> Self {
        Self {
            machine_id: 1,
            node_id: 1,
            bucket: Mutex::new(SnowflakeIdBucket::new(1, 1)),
        }
    }
}

impl fmt::Debug for AlertIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertIds")
            .field("machine_id", &self.machine_id)
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_stay_unique_across_threads() {
        let ids = AlertIds::new(2, 9).unwrap();

        let all: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..250).map(|_| ids.next_id()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(unique.len(), 1_000);
        assert!(all.iter().all(|id| id.parse::<i64>().is_ok()));
    }

    #[test]
    fn worker_ids_outside_five_bits_are_refused() {
        assert_eq!(
            AlertIds::new(0, -1).unwrap_err(),
            IdError::OutOfRange {
                field: "node_id",
                value: -1
            }
        );
        let err = check_worker_ids(32, 0).unwrap_err();
        assert!(err.to_string().contains("machine_id"), "{err}");
        assert!(check_worker_ids(0, MAX_WORKER_ID).is_ok());
    }

    #[test]
    fn default_generator_uses_worker_one() {
        let ids = AlertIds::default();
        assert_eq!((ids.machine_id(), ids.node_id()), (1, 1));
        assert!(format!("{ids:?}").contains("machine_id: 1"));
    }
}
