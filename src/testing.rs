//! In-memory stores used by unit and router tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, ProfileUpdate, User},
    },
    categories::repo::{Category, CategoryStore},
    comments::repo::{Comment, CommentStore},
    posts::{
        repo::PostStore,
        repo_types::{Post, PostContent, PostFilter},
    },
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    categories: Vec<Category>,
    posts: Vec<Post>,
    post_categories: Vec<(Uuid, Uuid)>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_next_read: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next user lookup fail as if the database were unreachable.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Flips role flags the way an operator would directly in the database.
    pub fn set_flags(&self, id: Uuid, verified: bool, admin: bool, test_user: bool) {
        let mut inner = self.lock();
        if let Some(u) = inner.users.iter_mut().find(|u| u.id == id) {
            u.verified = verified;
            u.admin = admin;
            u.test_user = test_user;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_read(&self) -> anyhow::Result<()> {
        if self.fail_next_read.swap(false, Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.check_read()?;
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| same_text(&u.email, email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.check_read()?;
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<User> {
        let mut inner = self.lock();
        anyhow::ensure!(
            !inner.users.iter().any(|u| same_text(&u.email, &user.email)),
            "duplicate key value violates unique constraint \"users_email_lower_idx\""
        );
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            verified: false,
            admin: false,
            test_user: false,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let mut inner = self.lock();
        let Some(u) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.username {
            u.username = v;
        }
        if let Some(v) = changes.first_name {
            u.first_name = v;
        }
        if let Some(v) = changes.last_name {
            u.last_name = v;
        }
        u.updated_at = OffsetDateTime::now_utc();
        Ok(Some(u.clone()))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Category>> {
        let mut rows = self.lock().categories.clone();
        rows.sort_by_key(|c| c.name.to_lowercase());
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        Ok(self.lock().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|c| same_text(&c.name, name))
            .cloned())
    }

    async fn insert(&self, name: &str) -> anyhow::Result<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.lock().categories.push(category.clone());
        Ok(category)
    }

    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let inner = self.lock();
        let mut rows: Vec<Category> = inner
            .categories
            .iter()
            .filter(|c| inner.post_categories.contains(&(post_id, c.id)))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.name.to_lowercase());
        Ok(rows)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_public(&self, filter: PostFilter) -> anyhow::Result<Vec<Post>> {
        let inner = self.lock();
        let mut rows: Vec<Post> = inner
            .posts
            .iter()
            .filter(|p| !p.privacy)
            .filter(|p| {
                filter
                    .category_id
                    .map_or(true, |c| inner.post_categories.contains(&(p.id, c)))
            })
            .filter(|p| filter.tag.as_ref().map_or(true, |t| p.tags.contains(t)))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.title.to_lowercase());
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> anyhow::Result<Option<Post>> {
        Ok(self
            .lock()
            .posts
            .iter()
            .find(|p| same_text(&p.title, title))
            .cloned())
    }

    async fn insert(&self, author_id: Uuid, content: PostContent) -> anyhow::Result<Post> {
        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            title: content.title,
            body: content.body,
            tags: content.tags,
            image_link: content.image_link,
            image_owner: content.image_owner,
            image_source: content.image_source,
            privacy: content.privacy,
            created_at: now,
            updated_at: now,
        };
        self.lock().posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: Uuid, content: PostContent) -> anyhow::Result<Option<Post>> {
        let mut inner = self.lock();
        let Some(p) = inner.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        p.title = content.title;
        p.body = content.body;
        p.tags = content.tags;
        p.image_link = content.image_link;
        p.image_owner = content.image_owner;
        p.image_source = content.image_source;
        p.privacy = content.privacy;
        p.updated_at = OffsetDateTime::now_utc();
        Ok(Some(p.clone()))
    }

    async fn set_privacy(&self, id: Uuid, privacy: bool) -> anyhow::Result<Option<Post>> {
        let mut inner = self.lock();
        let Some(p) = inner.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        p.privacy = privacy;
        p.updated_at = OffsetDateTime::now_utc();
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.lock();
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        inner.post_categories.retain(|(p, _)| *p != id);
        inner.comments.retain(|c| c.post_id != id);
        Ok(inner.posts.len() != before)
    }

    async fn attach_category(&self, post_id: Uuid, category_id: Uuid) -> anyhow::Result<()> {
        let mut inner = self.lock();
        if !inner.post_categories.contains(&(post_id, category_id)) {
            inner.post_categories.push((post_id, category_id));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn list_visible(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && !c.hidden)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.lock().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_content(
        &self,
        post_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Option<Comment>> {
        Ok(self
            .lock()
            .comments
            .iter()
            .find(|c| c.post_id == post_id && !c.hidden && same_text(&c.content, content))
            .cloned())
    }

    async fn insert(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            content: content.to_string(),
            likes: 0,
            hidden: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.lock().comments.push(comment.clone());
        Ok(comment)
    }

    async fn like(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let mut inner = self.lock();
        let Some(c) = inner.comments.iter_mut().find(|c| c.id == id && !c.hidden) else {
            return Ok(None);
        };
        c.likes += 1;
        Ok(Some(c.clone()))
    }

    async fn hide(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.lock();
        let Some(c) = inner.comments.iter_mut().find(|c| c.id == id && !c.hidden) else {
            return Ok(false);
        };
        c.hidden = true;
        Ok(true)
    }
}
