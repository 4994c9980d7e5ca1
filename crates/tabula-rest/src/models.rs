use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use tabula_core::{Resource, Validate, ValidationErrors};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 150;

fn default_true() -> bool {
    true
}

fn check_not_empty(errors: &mut ValidationErrors, field: &str, value: &str) {
    errors.check(!value.is_empty(), field, &format!("{} must not be empty", field));
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    errors.check(EMAIL_RE.is_match(value), "email", "invalid email format");
}

fn check_age(errors: &mut ValidationErrors, age: i64) {
    errors.check(age >= MIN_AGE, "age", "age must be at least 1");
    errors.check(age <= MAX_AGE, "age", "age must be at most 150");
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub age: i64,

    pub city: String,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Create / full-update payload for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub age: i64,
    pub city: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Default for UserDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: None,
            age: 0,
            city: String::new(),
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for UserDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_empty(&mut errors, "name", &self.name);
        check_email(&mut errors, &self.email);
        check_age(&mut errors, self.age);
        check_not_empty(&mut errors, "city", &self.city);
        errors.into_result()
    }
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_not_empty(&mut errors, "name", name);
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(age) = self.age {
            check_age(&mut errors, age);
        }
        if let Some(city) = &self.city {
            check_not_empty(&mut errors, "city", city);
        }
        errors.into_result()
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_draft().validate()
    }
}

impl Resource for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    fn entity_name() -> &'static str {
        "users"
    }

    fn short_name() -> &'static str {
        "user"
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn to_draft(&self) -> UserDraft {
        UserDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            age: self.age,
            city: self.city.clone(),
            is_active: self.is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,

    pub title: String,

    pub content: String,

    pub user_id: i64,

    #[serde(default)]
    pub status: PostStatus,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub user_id: i64,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn status(status: PostStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Validate for PostDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_empty(&mut errors, "title", &self.title);
        check_not_empty(&mut errors, "content", &self.content);
        errors.into_result()
    }
}

impl Validate for PostPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            check_not_empty(&mut errors, "title", title);
        }
        if let Some(content) = &self.content {
            check_not_empty(&mut errors, "content", content);
        }
        errors.into_result()
    }
}

impl Validate for Post {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_draft().validate()
    }
}

impl Resource for Post {
    type Draft = PostDraft;
    type Patch = PostPatch;

    fn entity_name() -> &'static str {
        "posts"
    }

    fn short_name() -> &'static str {
        "post"
    }

    fn id_fields() -> Vec<(&'static str, &'static str)> {
        vec![("id", "post"), ("userId", "user")]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            user_id: self.user_id,
            status: self.status,
            tags: self.tags.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,

    pub content: String,

    /// Post the comment belongs to
    pub post_id: i64,

    /// Author
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub content: String,
    pub post_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl Validate for CommentDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_empty(&mut errors, "content", &self.content);
        errors.into_result()
    }
}

impl Validate for CommentPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(content) = &self.content {
            check_not_empty(&mut errors, "content", content);
        }
        errors.into_result()
    }
}

impl Validate for Comment {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_draft().validate()
    }
}

impl Resource for Comment {
    type Draft = CommentDraft;
    type Patch = CommentPatch;

    fn entity_name() -> &'static str {
        "comments"
    }

    fn short_name() -> &'static str {
        "comment"
    }

    fn id_fields() -> Vec<(&'static str, &'static str)> {
        vec![("id", "comment"), ("postId", "post"), ("userId", "user")]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn to_draft(&self) -> CommentDraft {
        CommentDraft {
            content: self.content.clone(),
            post_id: self.post_id,
            user_id: self.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_draft() -> UserDraft {
        UserDraft {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: None,
            age: 30,
            city: "Taipei".into(),
            is_active: true,
        }
    }

    #[test]
    fn test_user_defaults_and_wire_names() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "name": "A", "email": "a@b.co", "age": 20, "city": "Tainan"
        }))
        .unwrap();
        assert!(user.is_active);
        assert_eq!(user.phone, None);

        let wire = serde_json::to_value(&user).unwrap();
        assert_eq!(wire["isActive"], json!(true));
        assert!(wire.get("phone").is_none());
    }

    #[test]
    fn test_user_draft_validation() {
        assert!(user_draft().validate().is_ok());

        let bad = UserDraft {
            name: String::new(),
            email: "not-an-email".into(),
            age: 151,
            ..user_draft()
        };
        let errors = bad.validate().unwrap_err().field_map();
        assert_eq!(errors["name"], "name must not be empty");
        assert_eq!(errors["email"], "invalid email format");
        assert_eq!(errors["age"], "age must be at most 150");
        assert!(!errors.contains_key("city"));

        let young = UserDraft {
            age: 0,
            ..user_draft()
        };
        assert_eq!(
            young.validate().unwrap_err().field_map()["age"],
            "age must be at least 1"
        );
    }

    #[test]
    fn test_default_user_draft_is_active_but_invalid() {
        let draft = UserDraft::default();
        assert!(draft.is_active);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(UserPatch::default().validate().is_ok());
        let patch = UserPatch {
            email: Some("nope".into()),
            ..UserPatch::default()
        };
        assert_eq!(patch.validate().unwrap_err().len(), 1);

        let wire = serde_json::to_value(PostPatch::status(PostStatus::Archived)).unwrap();
        assert_eq!(wire, json!({"status": "archived"}));
    }

    #[test]
    fn test_post_defaults() {
        let post: Post = serde_json::from_value(json!({
            "id": 3, "title": "Hello", "content": "World", "userId": 1
        }))
        .unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.tags.is_empty());

        let bad: Result<Post, _> = serde_json::from_value(json!({
            "id": 3, "title": "Hello", "content": "World", "userId": 1, "status": "deleted"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_comment_validation() {
        let draft = CommentDraft {
            content: String::new(),
            post_id: 1,
            user_id: 2,
        };
        assert_eq!(
            draft.validate().unwrap_err().summary(),
            "content: content must not be empty"
        );
    }
}
