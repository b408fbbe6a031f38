//! Cache Key Module
//!
//! Closed registry of the canonical cache keys shared by every caller.

use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

const ONE_MINUTE_MS: u64 = 60 * 1000;

// == Key Category ==
/// Every logical resource the cache may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    FeedPosts,
    ExplorePosts,
    RecentUsers,
    UserProfile,
    UserPosts,
    Notifications,
    SearchUsers,
    SearchPosts,
}

impl KeyCategory {
    pub const ALL: [KeyCategory; 8] = [
        KeyCategory::FeedPosts,
        KeyCategory::ExplorePosts,
        KeyCategory::RecentUsers,
        KeyCategory::UserProfile,
        KeyCategory::UserPosts,
        KeyCategory::Notifications,
        KeyCategory::SearchUsers,
        KeyCategory::SearchPosts,
    ];

    /// Fixed part of the key. Parametrized categories append their parameter.
    pub const fn stem(self) -> &'static str {
        match self {
            KeyCategory::FeedPosts => "feed_posts",
            KeyCategory::ExplorePosts => "explore_posts",
            KeyCategory::RecentUsers => "recent_users",
            KeyCategory::UserProfile => "user_profile_",
            KeyCategory::UserPosts => "user_posts_",
            KeyCategory::Notifications => "notifications_",
            KeyCategory::SearchUsers => "search_users_",
            KeyCategory::SearchPosts => "search_posts_",
        }
    }

    /// Whether keys of this category carry a parameter.
    pub const fn is_parametrized(self) -> bool {
        !matches!(
            self,
            KeyCategory::FeedPosts | KeyCategory::ExplorePosts | KeyCategory::RecentUsers
        )
    }

    /// TTL the web client uses for this category, None = cache default.
    pub const fn default_ttl_ms(self) -> Option<u64> {
        match self {
            KeyCategory::FeedPosts => Some(ONE_MINUTE_MS),
            KeyCategory::ExplorePosts => Some(5 * ONE_MINUTE_MS),
            KeyCategory::RecentUsers => Some(10 * ONE_MINUTE_MS),
            KeyCategory::SearchUsers | KeyCategory::SearchPosts => Some(2 * ONE_MINUTE_MS),
            KeyCategory::UserProfile | KeyCategory::UserPosts | KeyCategory::Notifications => {
                None
            }
        }
    }
}

// == Cache Key ==
/// A canonical cache key.
///
/// Only built through the per-category constructors or by parsing a string
/// that matches a category, so two callers naming the same resource always
/// land on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: KeyCategory,
    rendered: String,
}

impl CacheKey {
    fn fixed(category: KeyCategory) -> Self {
        Self {
            category,
            rendered: category.stem().to_string(),
        }
    }

    fn with_param(category: KeyCategory, param: &str) -> Self {
        Self {
            category,
            rendered: format!("{}{}", category.stem(), param),
        }
    }

    pub fn feed_posts() -> Self {
        Self::fixed(KeyCategory::FeedPosts)
    }

    pub fn explore_posts() -> Self {
        Self::fixed(KeyCategory::ExplorePosts)
    }

    pub fn recent_users() -> Self {
        Self::fixed(KeyCategory::RecentUsers)
    }

    pub fn user_profile(user_id: &str) -> Self {
        Self::with_param(KeyCategory::UserProfile, user_id)
    }

    pub fn user_posts(user_id: &str) -> Self {
        Self::with_param(KeyCategory::UserPosts, user_id)
    }

    pub fn notifications(user_id: &str) -> Self {
        Self::with_param(KeyCategory::Notifications, user_id)
    }

    /// Search keys are case-insensitive: the query is lowercased.
    pub fn search_users(query: &str) -> Self {
        Self::with_param(KeyCategory::SearchUsers, &query.to_lowercase())
    }

    pub fn search_posts(query: &str) -> Self {
        Self::with_param(KeyCategory::SearchPosts, &query.to_lowercase())
    }

    pub fn category(&self) -> KeyCategory {
        self.category
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.rendered
    }
}

impl FromStr for CacheKey {
    type Err = KeyError;

    /// Recognizes a rendered key. Search parameters are lowercased like the
    /// builders do; other parameters are kept verbatim, including empty ones.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        for category in KeyCategory::ALL {
            let stem = category.stem();
            if !category.is_parametrized() {
                if raw == stem {
                    return Ok(Self::fixed(category));
                }
                continue;
            }
            if raw == stem.trim_end_matches('_') {
                return Err(KeyError::MissingParameter(raw.to_string()));
            }
            if let Some(param) = raw.strip_prefix(stem) {
                return Ok(match category {
                    KeyCategory::SearchUsers => Self::search_users(param),
                    KeyCategory::SearchPosts => Self::search_posts(param),
                    _ => Self::with_param(category, param),
                });
            }
        }
        Err(KeyError::UnknownCategory(raw.to_string()))
    }
}
