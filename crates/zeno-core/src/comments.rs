//! Append-only comment log.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use zeno_types::{Comment, NewComment};

use crate::kv::KvStore;
use crate::{Result, ZenoError};

const COMMENTS_KEY: &str = "comments";

#[derive(Clone)]
pub struct Comments {
    kv: Arc<dyn KvStore>,
}

impl Comments {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Append a comment. A blank name or message is rejected and nothing
    /// is written.
    pub async fn add(&self, submission: NewComment, ip: String) -> Result<Comment> {
        if submission.name.trim().is_empty() {
            return Err(ZenoError::Validation("name is required".into()));
        }
        if submission.message.trim().is_empty() {
            return Err(ZenoError::Validation("message is required".into()));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            tool_id: submission.tool_id,
            name: submission.name,
            message: submission.message,
            priority: submission.priority,
            timestamp: Utc::now(),
            ip,
        };
        self.kv
            .rpush(COMMENTS_KEY, &serde_json::to_string(&comment)?)
            .await?;
        Ok(comment)
    }

    /// Comments in submission order, optionally for one tool. Records that
    /// no longer parse are skipped.
    pub async fn list(&self, tool_id: Option<Uuid>) -> Result<Vec<Comment>> {
        let raw = self.kv.lrange(COMMENTS_KEY, 0, -1).await?;
        Ok(raw
            .iter()
            .filter_map(|line| serde_json::from_str::<Comment>(line).ok())
            .filter(|c| tool_id.is_none_or(|id| c.tool_id == id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn comments() -> Comments {
        Comments::new(Arc::new(MemoryKv::new()))
    }

    fn submission(name: &str, message: &str) -> NewComment {
        NewComment {
            tool_id: Uuid::new_v4(),
            name: name.into(),
            message: message.into(),
            priority: "normal".into(),
        }
    }

    #[tokio::test]
    async fn add_and_list() {
        let comments = comments();
        let added = comments
            .add(submission("ada", "works great"), "10.0.0.1".into())
            .await
            .unwrap();
        assert_eq!(added.ip, "10.0.0.1");

        let listed = comments.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, added.id);

        let filtered = comments.list(Some(added.tool_id)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(comments
            .list(Some(Uuid::new_v4()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn blank_fields_rejected_without_append() {
        let comments = comments();

        let err = comments
            .add(submission("  ", "msg"), "ip".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ZenoError::Validation(_)));

        let err = comments
            .add(submission("ada", ""), "ip".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ZenoError::Validation(_)));

        assert!(comments.list(None).await.unwrap().is_empty());
    }
}
