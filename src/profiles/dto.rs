use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

use super::repo::Profile;

/// Incoming profile payload. Every non-photo field is required; partial
/// updates are not supported, so an omitted field fails validation instead
/// of silently clearing the column.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub phonenumber: Option<String>,
    pub img: Option<String>,
}

/// The validated full field set.
#[derive(Debug, Clone)]
pub struct ProfileFields {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub dob: String,
    pub gender: String,
    pub phonenumber: String,
}

impl ProfileRequest {
    /// Check the payload up front, before any business logic runs. Returns
    /// the field set plus the optional photo and optional target user.
    pub fn validate(self) -> Result<(ProfileFields, Option<String>, Option<Uuid>), ApiError> {
        let fields = ProfileFields {
            username: require("username", self.username)?,
            firstname: require("firstname", self.firstname)?,
            lastname: require("lastname", self.lastname)?,
            dob: require("dob", self.dob)?,
            gender: require("gender", self.gender)?,
            phonenumber: require("phonenumber", self.phonenumber)?,
        };
        Ok((fields, self.img, self.user_id))
    }
}

fn require(name: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::InvalidInput(format!("{name} is required"))),
    }
}

/// Profile as returned to clients. The photo may be inlined as a data URI
/// and the owner email attached on single-profile reads.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub dob: String,
    pub gender: String,
    pub phonenumber: String,
    pub profile_photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            username: p.username,
            firstname: p.firstname,
            lastname: p.lastname,
            dob: p.dob,
            gender: p.gender,
            phonenumber: p.phonenumber,
            profile_photo: p.profile_photo,
            email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> ProfileRequest {
        ProfileRequest {
            user_id: None,
            username: Some("alice".into()),
            firstname: Some("Alice".into()),
            lastname: Some("Doe".into()),
            dob: Some("1990-04-01".into()),
            gender: Some("female".into()),
            phonenumber: Some("0700000000".into()),
            img: None,
        }
    }

    #[test]
    fn full_payload_validates() {
        let (fields, img, target) = full_request().validate().unwrap();
        assert_eq!(fields.username, "alice");
        assert_eq!(fields.phonenumber, "0700000000");
        assert!(img.is_none());
        assert!(target.is_none());
    }

    #[test]
    fn missing_field_is_rejected_up_front() {
        let request = ProfileRequest {
            dob: None,
            ..full_request()
        };
        let err = request.validate().unwrap_err();
        match err {
            ApiError::InvalidInput(msg) => assert_eq!(msg, "dob is required"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn blank_field_is_rejected_like_a_missing_one() {
        let request = ProfileRequest {
            gender: Some("   ".into()),
            ..full_request()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn photo_and_target_pass_through() {
        let request = ProfileRequest {
            user_id: Some(Uuid::new_v4()),
            img: Some("data:image/png;base64,AAAA".into()),
            ..full_request()
        };
        let (_, img, target) = request.validate().unwrap();
        assert!(img.is_some());
        assert!(target.is_some());
    }

    #[test]
    fn email_is_omitted_from_json_when_absent() {
        let response = ProfileResponse {
            id: 1,
            user_id: Uuid::new_v4(),
            username: "alice".into(),
            firstname: "Alice".into(),
            lastname: "Doe".into(),
            dob: "1990-04-01".into(),
            gender: "female".into(),
            phonenumber: "0700000000".into(),
            profile_photo: "no_profile_photo.png".into(),
            email: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("email"));
    }
}
