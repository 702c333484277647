//! Who else is looking at the canvas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub id: UserId,
    pub name: String,
    /// File name of the profile picture, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// How to draw one presence avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub user_id: UserId,
    /// Tooltip text.
    pub title: String,
    pub image_url: Option<String>,
    /// Uppercase first letter of the name, used without a picture.
    pub initial: Option<char>,
}

impl Avatar {
    pub fn for_user(user: &ActiveUser) -> Self {
        let image_url = user
            .profile_picture
            .as_deref()
            .filter(|file| !file.is_empty())
            .map(|file| format!("/settings/profile-picture/{file}"));
        let initial = if image_url.is_some() {
            None
        } else {
            user.name.chars().next().and_then(|c| c.to_uppercase().next())
        };
        Self {
            user_id: user.id,
            title: user.name.clone(),
            image_url,
            initial,
        }
    }
}

/// Roster of remote users, in join order. The local user is never listed.
#[derive(Debug, Clone)]
pub struct Presence {
    local_user: UserId,
    users: Vec<ActiveUser>,
}

impl Presence {
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            users: Vec::new(),
        }
    }

    /// Add or refresh a user. Returns false for the local user.
    pub fn add(&mut self, user: ActiveUser) -> bool {
        if user.id == self.local_user {
            return false;
        }
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
        true
    }

    pub fn remove(&mut self, user_id: UserId) -> Option<ActiveUser> {
        let index = self.users.iter().position(|u| u.id == user_id)?;
        Some(self.users.remove(index))
    }

    pub fn users(&self) -> &[ActiveUser] {
        &self.users
    }

    pub fn avatars(&self) -> Vec<Avatar> {
        self.users.iter().map(Avatar::for_user).collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str, picture: Option<&str>) -> ActiveUser {
        ActiveUser {
            id: UserId(id),
            name: name.to_string(),
            profile_picture: picture.map(str::to_string),
        }
    }

    #[test]
    fn test_local_user_excluded() {
        let mut presence = Presence::new(UserId(1));
        assert!(!presence.add(user(1, "me", None)));
        assert!(presence.add(user(2, "alice", None)));
        assert_eq!(presence.len(), 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut presence = Presence::new(UserId(1));
        presence.add(user(2, "alice", None));
        presence.add(user(2, "Alice", Some("a.png")));
        assert_eq!(presence.len(), 1);
        assert_eq!(presence.users()[0].name, "Alice");
        assert!(presence.remove(UserId(2)).is_some());
        assert!(presence.remove(UserId(2)).is_none());
        assert!(presence.is_empty());
    }

    #[test]
    fn test_avatars() {
        let mut presence = Presence::new(UserId(1));
        presence.add(user(2, "bob", None));
        presence.add(user(3, "carol", Some("c.jpg")));
        let avatars = presence.avatars();
        assert_eq!(avatars[0].initial, Some('B'));
        assert_eq!(avatars[0].image_url, None);
        assert_eq!(avatars[1].image_url.as_deref(), Some("/settings/profile-picture/c.jpg"));
        assert_eq!(avatars[1].initial, None);
        assert_eq!(avatars[1].title, "carol");
    }

    #[test]
    fn test_user_json() {
        let user: ActiveUser =
            serde_json::from_str(r#"{"id": 4, "name": "dan", "profilePicture": "d.png"}"#).unwrap();
        assert_eq!(user.id, UserId(4));
        assert_eq!(user.profile_picture.as_deref(), Some("d.png"));
    }
}
