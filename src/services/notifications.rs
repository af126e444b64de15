// services/notifications.rs - notification storage and realtime delivery
//
// Every notification is stored first and then pushed to the owner's user
// room when somebody is listening there. Delivery is best-effort.

use serde_json::Value;

use crate::auth::Role;
use crate::database::{timestamp, Collection, Record, Store, StoreError};
use crate::filter::Filter;
use crate::realtime::{RoomHub, ServerMessage};

/// School events that produce notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    NewAssignment,
    AttendanceAlert,
    SchoolAnnouncement,
    SubscriptionExpiring,
    NewStudent,
    NewTeacher,
}

/// Who receives an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every user of the school
    School,
    /// Users of the school with this role
    Role(Role),
    /// The single user named by `studentId` in the event data
    Student,
}

impl NotificationEvent {
    pub fn audience(&self) -> Audience {
        match self {
            NotificationEvent::NewAssignment => Audience::Role(Role::Student),
            NotificationEvent::AttendanceAlert => Audience::Student,
            NotificationEvent::SchoolAnnouncement => Audience::School,
            NotificationEvent::SubscriptionExpiring
            | NotificationEvent::NewStudent
            | NotificationEvent::NewTeacher => Audience::Role(Role::SchoolAdmin),
        }
    }

    /// Render title, message, type and priority from the event data
    pub fn template(&self, data: &Value) -> Record {
        let text = |key: &str, fallback: &str| -> String {
            match data.get(key) {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => fallback.to_string(),
            }
        };

        let (title, message, kind, priority) = match self {
            NotificationEvent::NewAssignment => (
                "New Assignment Posted",
                format!(
                    "A new assignment \"{}\" has been posted in {}",
                    text("title", "Untitled"),
                    text("className", "your class")
                ),
                "assignment",
                "medium",
            ),
            NotificationEvent::AttendanceAlert => (
                "Attendance Alert",
                format!(
                    "Your attendance is currently at {}%. Please improve attendance.",
                    text("percentage", "-")
                ),
                "alert",
                "high",
            ),
            NotificationEvent::SchoolAnnouncement => {
                ("School Announcement", text("message", ""), "announcement", "medium")
            }
            NotificationEvent::SubscriptionExpiring => (
                "Subscription Expiring",
                format!(
                    "Your subscription will expire on {}. Please renew to continue using School Nexus.",
                    text("expiryDate", "soon")
                ),
                "billing",
                "high",
            ),
            NotificationEvent::NewStudent => (
                "New Student Enrolled",
                format!(
                    "{} has been enrolled in Grade {}",
                    display_name(data),
                    text("grade", "-")
                ),
                "enrollment",
                "low",
            ),
            NotificationEvent::NewTeacher => (
                "New Teacher Joined",
                format!(
                    "{} has joined the {} department",
                    display_name(data),
                    text("department", "teaching")
                ),
                "staff",
                "low",
            ),
        };

        Record::new()
            .with("title", title)
            .with("message", message)
            .with("type", kind)
            .with("priority", priority)
    }
}

/// `name`, else `firstName lastName`
fn display_name(data: &Value) -> String {
    if let Some(name) = data.get("name").and_then(Value::as_str) {
        return name.to_string();
    }
    let parts: Vec<&str> = ["firstName", "lastName"]
        .iter()
        .filter_map(|k| data.get(*k).and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        "A new member".to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Store,
    hub: RoomHub,
}

impl NotificationService {
    pub fn new(store: Store, hub: RoomHub) -> Self {
        Self { store, hub }
    }

    /// Store an unread notification and push it to the owner's room
    pub async fn create(&self, mut data: Record) -> Record {
        data.set("isRead", false);
        let notification = self.store.create(Collection::Notifications, data).await;

        if let Some(user_id) = notification.user_id() {
            let room = RoomHub::user_room(user_id);
            if self.hub.has_subscribers(&room) {
                self.hub
                    .publish(&room, None, ServerMessage::NewNotification(notification.clone().into_map()));
            }
        }
        notification
    }

    /// One notification per user of the school
    pub async fn send_to_school(&self, school_id: &str, data: Record) -> Vec<Record> {
        let users = self.store.users_by_school(school_id).await;
        self.fan_out(school_id, users, data).await
    }

    /// One notification per user of the school with the given role
    pub async fn send_to_role(&self, school_id: &str, role: Role, data: Record) -> Vec<Record> {
        let filter = Filter::new().eq("schoolId", school_id).eq("role", role.as_str());
        let users = self.store.find(Collection::Users, &filter).await;
        self.fan_out(school_id, users, data).await
    }

    async fn fan_out(&self, school_id: &str, users: Vec<Record>, data: Record) -> Vec<Record> {
        let mut sent = Vec::with_capacity(users.len());
        for user in users {
            let Some(user_id) = user.id() else { continue };
            let mut notification = data.clone();
            notification.set("schoolId", school_id).set("userId", user_id);
            sent.push(self.create(notification).await);
        }
        sent
    }

    /// Render an event template and deliver it to the event's audience
    pub async fn send_event(&self, event: NotificationEvent, data: &Value, school_id: &str) -> Vec<Record> {
        let notification = event.template(data);
        let sent = match event.audience() {
            Audience::School => self.send_to_school(school_id, notification).await,
            Audience::Role(role) => self.send_to_role(school_id, role, notification).await,
            Audience::Student => match data.get("studentId").and_then(Value::as_str) {
                Some(user_id) => {
                    let mut notification = notification;
                    notification.set("schoolId", school_id).set("userId", user_id);
                    vec![self.create(notification).await]
                }
                None => {
                    tracing::warn!(?event, "event without studentId, nothing sent");
                    Vec::new()
                }
            },
        };
        tracing::debug!(?event, school_id, recipients = sent.len(), "event notification sent");
        sent
    }

    /// Mark read; a second call leaves `readAt` untouched
    pub async fn mark_read(&self, id: &str, user_id: &str) -> Result<Record, StoreError> {
        let notification = self.owned(id, user_id).await?;
        if notification.get("isRead") == Some(&Value::Bool(true)) {
            return Ok(notification);
        }
        let patch = Record::new().with("isRead", true).with("readAt", timestamp());
        self.store.update(Collection::Notifications, id, patch).await
    }

    /// Mark every unread notification of the user (optionally in one school)
    pub async fn mark_all_read(&self, user_id: &str, school_id: Option<&str>) -> Result<usize, StoreError> {
        let filter = Filter::new()
            .eq("userId", user_id)
            .eq("isRead", false)
            .eq_opt("schoolId", school_id);
        let unread = self.store.find(Collection::Notifications, &filter).await;
        for notification in &unread {
            if let Some(id) = notification.id() {
                self.mark_read(id, user_id).await?;
            }
        }
        Ok(unread.len())
    }

    /// Unread notifications, newest first
    pub async fn unread(&self, user_id: &str) -> Vec<Record> {
        let filter = Filter::new().eq("userId", user_id).eq("isRead", false);
        newest_first(self.store.find(Collection::Notifications, &filter).await)
    }

    /// All notifications of the user, newest first
    pub async fn for_user(&self, user_id: &str, school_id: Option<&str>) -> Vec<Record> {
        let filter = Filter::new().eq("userId", user_id).eq_opt("schoolId", school_id);
        newest_first(self.store.find(Collection::Notifications, &filter).await)
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<Record, StoreError> {
        self.owned(id, user_id).await?;
        self.store.delete(Collection::Notifications, id).await
    }

    /// Someone else's notification looks exactly like a missing one
    async fn owned(&self, id: &str, user_id: &str) -> Result<Record, StoreError> {
        self.store
            .find_by_id(Collection::Notifications, id)
            .await
            .filter(|n| n.user_id() == Some(user_id))
            .ok_or_else(|| StoreError::NotFound {
                collection: Collection::Notifications.name().to_string(),
                id: id.to_string(),
            })
    }
}

fn newest_first(mut records: Vec<Record>) -> Vec<Record> {
    records.reverse();
    records
}
