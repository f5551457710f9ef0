use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::dto::ProfileFields;

/// Profile record in the database, one row per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: Uuid,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub dob: String,
    pub gender: String,
    pub phonenumber: String,
    pub profile_photo: String,
}

impl Profile {
    /// Insert the profile row. Username, phone number and the one-per-user
    /// rule are all enforced by unique constraints.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        f: &ProfileFields,
        photo: &str,
    ) -> sqlx::Result<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, username, firstname, lastname, dob, gender, phonenumber, profile_photo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, username, firstname, lastname, dob, gender, phonenumber, profile_photo
            "#,
        )
        .bind(user_id)
        .bind(&f.username)
        .bind(&f.firstname)
        .bind(&f.lastname)
        .bind(&f.dob)
        .bind(&f.gender)
        .bind(&f.phonenumber)
        .bind(photo)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, username, firstname, lastname, dob, gender, phonenumber, profile_photo
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Profile>> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, username, firstname, lastname, dob, gender, phonenumber, profile_photo
            FROM profiles
            ORDER BY id ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Overwrite the full field set; there are no partial updates.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        f: &ProfileFields,
        photo: &str,
    ) -> sqlx::Result<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET username = $2, firstname = $3, lastname = $4, dob = $5,
                gender = $6, phonenumber = $7, profile_photo = $8
            WHERE user_id = $1
            RETURNING id, user_id, username, firstname, lastname, dob, gender, phonenumber, profile_photo
            "#,
        )
        .bind(user_id)
        .bind(&f.username)
        .bind(&f.firstname)
        .bind(&f.lastname)
        .bind(&f.dob)
        .bind(&f.gender)
        .bind(&f.phonenumber)
        .bind(photo)
        .fetch_one(db)
        .await
    }

    pub async fn username_exists(db: &PgPool, username: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM profiles WHERE username = $1)"#,
        )
        .bind(username)
        .fetch_one(db)
        .await
    }

    pub async fn phonenumber_exists(db: &PgPool, phonenumber: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM profiles WHERE phonenumber = $1)"#,
        )
        .bind(phonenumber)
        .fetch_one(db)
        .await
    }
}
