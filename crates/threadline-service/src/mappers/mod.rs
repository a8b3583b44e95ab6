//! Request-to-entity mappers.

use crate::dto::{CreateCommentRequest, CreatePostRequest};
use chrono::SubsecRound;
use threadline_core::{NewComment, NewPost};

impl From<CreatePostRequest> for NewPost {
    fn from(request: CreatePostRequest) -> Self {
        let post = NewPost::new(
            request.title,
            request.content,
            request.author,
            request.comments_enabled,
        );
        match request.created_at {
            // the store keeps microseconds
            Some(created_at) => post.created_at(created_at.trunc_subsecs(6)),
            None => post,
        }
    }
}

impl From<CreateCommentRequest> for NewComment {
    fn from(request: CreateCommentRequest) -> Self {
        NewComment::new(
            request.post_id,
            request.parent_id,
            request.author,
            request.content,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_created_at_is_kept_when_given() {
        let created_at = Utc.with_ymd_and_hms(2023, 5, 6, 7, 8, 9).unwrap();
        let request = CreatePostRequest {
            title: "t".to_string(),
            content: "c".to_string(),
            author: "a".to_string(),
            comments_enabled: false,
            created_at: Some(created_at),
        };
        let post = NewPost::from(request);
        assert_eq!(post.created_at, created_at);
        assert!(!post.comments_enabled);
    }

    #[test]
    fn test_created_at_defaults_to_now() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let request = CreatePostRequest {
            title: "t".to_string(),
            content: "c".to_string(),
            author: "a".to_string(),
            comments_enabled: true,
            created_at: None,
        };
        assert!(NewPost::from(request).created_at >= before);
    }
}
