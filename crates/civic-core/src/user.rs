//! User identity records.
//!
//! Credentials are stored and compared as plaintext. This mirrors the
//! behaviour of the browser client the store replicates with and must not be
//! carried into a production deployment without hashing.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

// ─── Role ────────────────────────────────────────────────────────────────────

/// Which front end a user signs into.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Citizen,
  Official,
}

// ─── Location ────────────────────────────────────────────────────────────────

/// Administrative location of a user plus a reference coordinate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
  #[serde(default)]
  pub country:     String,
  #[serde(default)]
  pub state:       String,
  #[serde(default)]
  pub district:    String,
  #[serde(default)]
  pub coordinates: GeoPoint,
}

// ─── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub name:        String,
  pub email:       String,
  pub phone:       String,
  #[serde(default)]
  pub national_id: String,
  pub password:    String,
  #[serde(default)]
  pub avatar:      Option<String>,
  pub role:        Role,
  #[serde(default)]
  pub location:    UserLocation,
}

impl User {
  /// Whether `identifier` names this user by any of its contact identifiers.
  pub fn is_identified_by(&self, identifier: &str) -> bool {
    self.email == identifier
      || self.phone == identifier
      || (!self.national_id.is_empty() && self.national_id == identifier)
  }

  /// Login predicate: identifier, role and exact credential must all match.
  pub fn accepts_login(&self, identifier: &str, password: &str, role: Role) -> bool {
    self.role == role && self.password == password && self.is_identified_by(identifier)
  }
}

/// Registration form data. The email and role are derived by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub name:        String,
  pub phone:       String,
  #[serde(default)]
  pub national_id: String,
  pub password:    String,
  #[serde(default)]
  pub avatar:      Option<String>,
  #[serde(default)]
  pub location:    UserLocation,
}

impl NewUser {
  /// Domain used for the email address synthesised at registration.
  pub const DERIVED_EMAIL_DOMAIN: &'static str = "citizen.civicconnect.local";

  /// Build the citizen [`User`] this registration describes.
  pub fn into_citizen(self) -> User {
    let email = format!("{}@{}", self.phone, Self::DERIVED_EMAIL_DOMAIN);
    User {
      name: self.name,
      email,
      phone: self.phone,
      national_id: self.national_id,
      password: self.password,
      avatar: self.avatar,
      role: Role::Citizen,
      location: self.location,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn alice() -> User {
    User {
      name:        "Alice".into(),
      email:       "a@x.com".into(),
      phone:       "555".into(),
      national_id: "AAA111".into(),
      password:    "hunter2".into(),
      avatar:      None,
      role:        Role::Citizen,
      location:    UserLocation::default(),
    }
  }

  #[test]
  fn any_identifier_matches() {
    let u = alice();
    assert!(u.accepts_login("a@x.com", "hunter2", Role::Citizen));
    assert!(u.accepts_login("555", "hunter2", Role::Citizen));
    assert!(u.accepts_login("AAA111", "hunter2", Role::Citizen));
    assert!(!u.accepts_login("556", "hunter2", Role::Citizen));
  }

  #[test]
  fn empty_national_id_never_matches() {
    let mut u = alice();
    u.national_id.clear();
    assert!(!u.accepts_login("", "hunter2", Role::Citizen));
  }

  #[test]
  fn role_and_password_must_match() {
    let u = alice();
    assert!(!u.accepts_login("555", "hunter2", Role::Official));
    assert!(!u.accepts_login("555", "HUNTER2", Role::Citizen));
  }

  #[test]
  fn registration_derives_email_and_role() {
    let user = NewUser {
      name: "Bob".into(),
      phone: "9000".into(),
      password: "pw".into(),
      ..NewUser::default()
    }
    .into_citizen();
    assert_eq!(user.email, "9000@citizen.civicconnect.local");
    assert_eq!(user.role, Role::Citizen);
  }

  #[test]
  fn role_round_trips_through_strings() {
    assert_eq!("official".parse::<Role>().unwrap(), Role::Official);
    assert_eq!(Role::Citizen.to_string(), "citizen");
  }
}
