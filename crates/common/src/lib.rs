// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! exchanged between browser/API clients and the auth demo server.
//! This module defines the request and response bodies of the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sessionId";

/// Form body of `POST /login` and `POST /signup`
///
/// Missing fields deserialize as empty strings so that a truncated form is
/// handled as a failed login rather than a rejected request.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// A stopwatch-style timer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    /// Store-assigned identifier
    pub id: String,
    /// When the timer was started (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    /// When the timer was stopped
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end: Option<DateTime<Utc>>,
    /// Whether the timer is still running
    pub is_active: bool,
    /// Milliseconds between `start` and `end` once stopped
    #[serde(default)]
    pub duration: Option<i64>,
    pub description: String,
}

impl Timer {
    /// Stop a running timer at `now`. Stopped timers are left untouched.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.end = Some(now);
        self.duration = Some((now - self.start).num_milliseconds());
    }
}

/// Body of `POST /api/timers`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewTimer {
    #[serde(default)]
    pub description: String,
}

/// Query string of `GET /api/timers`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimerQuery {
    /// Only the literal `"true"` selects running timers
    pub is_active: Option<String>,
}

impl TimerQuery {
    pub fn wants_active(&self) -> bool {
        self.is_active.as_deref() == Some("true")
    }
}

/// Response of `POST /api/add-book`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooksCount {
    pub books: i64,
}

/// A record managed by the generic `/api/users` CRUD router
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub country: Option<String>,
}

/// The writable subset of a [`Profile`]
///
/// Unknown body fields are dropped during deserialization, which is how
/// the CRUD router whitelists what a client may set.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.country.is_none()
    }

    /// Overwrite the fields of `profile` that are set here
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(age) = self.age {
            profile.age = Some(age);
        }
        if let Some(country) = &self.country {
            profile.country = Some(country.clone());
        }
    }

    pub fn into_profile(self, id: String) -> Profile {
        Profile {
            id,
            name: self.name,
            age: self.age,
            country: self.country,
        }
    }
}

/// Equality filter for `GET /api/users`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFilter {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub country: Option<String>,
}

impl ProfileFilter {
    pub fn matches(&self, profile: &Profile) -> bool {
        if self.name.is_some() && self.name != profile.name {
            return false;
        }
        if self.age.is_some() && self.age != profile.age {
            return false;
        }
        if self.country.is_some() && self.country != profile.country {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timer_serializes_camel_case_millis() {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let timer = Timer {
            id: "t1".to_string(),
            start,
            end: None,
            is_active: true,
            duration: None,
            description: "Timer 1".to_string(),
        };
        let json = serde_json::to_value(&timer).unwrap();
        assert_eq!(json["start"], 1_000);
        assert_eq!(json["isActive"], true);
        assert!(json["end"].is_null());
    }

    #[test]
    fn stopping_records_duration_once() {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let mut timer = Timer {
            id: "t1".to_string(),
            start,
            end: None,
            is_active: true,
            duration: None,
            description: String::new(),
        };
        timer.stop(Utc.timestamp_millis_opt(3_500).unwrap());
        assert!(!timer.is_active);
        assert_eq!(timer.duration, Some(2_500));

        timer.stop(Utc.timestamp_millis_opt(9_000).unwrap());
        assert_eq!(timer.duration, Some(2_500));
    }

    #[test]
    fn timer_query_only_accepts_literal_true() {
        let q = |v: Option<&str>| TimerQuery {
            is_active: v.map(str::to_string),
        };
        assert!(q(Some("true")).wants_active());
        assert!(!q(Some("TRUE")).wants_active());
        assert!(!q(Some("1")).wants_active());
        assert!(!q(None).wants_active());
    }

    #[test]
    fn profile_fields_ignore_unknown_keys() {
        let fields: ProfileFields =
            serde_json::from_str(r#"{"name":"Ann","age":30,"role":"admin"}"#).unwrap();
        assert_eq!(fields.name.as_deref(), Some("Ann"));
        assert_eq!(fields.age, Some(30));
        assert_eq!(fields.country, None);
    }

    #[test]
    fn filter_matches_only_set_fields() {
        let profile = ProfileFields {
            name: Some("Ann".into()),
            age: Some(30),
            country: Some("NZ".into()),
        }
        .into_profile("1".into());

        assert!(ProfileFilter::default().matches(&profile));
        assert!(ProfileFilter {
            country: Some("NZ".into()),
            ..Default::default()
        }
        .matches(&profile));
        assert!(!ProfileFilter {
            age: Some(31),
            ..Default::default()
        }
        .matches(&profile));
    }
}
