//! Fortune records and sampled batches

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Fortune record from database
///
/// Rows are seeded out-of-band and never modified by this service.
#[derive(Debug, Clone, FromRow)]
pub struct Fortune {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub content: String,
}

/// Result of one sampling call, in draw order.
#[derive(Debug, Clone)]
pub struct FortuneBatch {
    /// Always equal to `items.len()`
    pub count: usize,
    pub items: Vec<Fortune>,
}

impl From<Vec<Fortune>> for FortuneBatch {
    fn from(items: Vec<Fortune>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fortune(content: &str) -> Fortune {
        let now = Utc::now();
        Fortune {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            content: content.to_owned(),
        }
    }

    #[test]
    fn count_tracks_items() {
        let batch = FortuneBatch::from(vec![fortune("a"), fortune("b"), fortune("c")]);
        assert_eq!(batch.count, 3);
        assert_eq!(batch.items.len(), 3);
        assert_eq!(batch.items[0].content, "a");
    }

    #[test]
    fn empty_batch() {
        let batch = FortuneBatch::from(Vec::new());
        assert_eq!(batch.count, 0);
        assert!(batch.items.is_empty());
    }
}
