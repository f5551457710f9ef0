use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Path recorded when no photo has been uploaded. The file itself is shared
/// and never unlinked.
pub const PLACEHOLDER: &str = "no_profile_photo.png";

/// Map a declared data-URI media type to a file extension.
fn ext_for_media_type(prefix: &str) -> Option<&'static str> {
    match prefix {
        "data:image/png;base64" => Some("png"),
        "data:image/jpg;base64" => Some("jpg"),
        "data:image/jpeg;base64" => Some("jpeg"),
        _ => None,
    }
}

/// Split a data URI into its allow-listed extension and base64 payload.
fn parse_data_uri(raw: &str) -> Result<(&'static str, &str), ApiError> {
    let (prefix, payload) = raw
        .split_once(',')
        .ok_or_else(|| ApiError::InvalidInput("malformed image data".into()))?;
    let ext = ext_for_media_type(prefix)
        .ok_or_else(|| ApiError::InvalidInput("unsupported image type".into()))?;
    Ok((ext, payload))
}

/// Photo file name for a user. Deterministic, so a later upload with the
/// same extension overwrites in place and the user-to-file relation is
/// recoverable without a database lookup.
fn photo_name(user_id: Uuid, ext: &str) -> String {
    format!("{user_id}.{ext}")
}

/// Validate, decode and persist an uploaded photo. Returns the stored name.
pub async fn store(state: &AppState, user_id: Uuid, raw: &str) -> Result<String, ApiError> {
    let (ext, payload) = parse_data_uri(raw)?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| ApiError::InvalidInput("invalid image encoding".into()))?;
    let name = photo_name(user_id, ext);
    state.photos.put(&name, Bytes::from(bytes)).await?;
    Ok(name)
}

/// Best-effort unlink of a stored photo.
pub async fn discard(state: &AppState, name: &str) {
    if name == PLACEHOLDER {
        return;
    }
    if let Err(e) = state.photos.delete(name).await {
        warn!(error = %e, %name, "failed to remove stored photo");
    }
}

/// Read a stored photo back as an inline data URI. Falls back to the stored
/// name when the file cannot be read.
pub async fn as_data_uri(state: &AppState, name: &str) -> String {
    if name == PLACEHOLDER {
        return name.to_string();
    }
    match state.photos.get(name).await {
        Ok(bytes) => {
            let ext = name.rsplit('.').next().unwrap_or("png");
            format!("data:image/{ext};base64,{}", BASE64.encode(&bytes))
        }
        Err(e) => {
            warn!(error = %e, %name, "failed to read stored photo");
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn stored_path(state: &AppState, name: &str) -> PathBuf {
        PathBuf::from(&state.config.upload_path).join(name)
    }

    fn png_data_uri() -> String {
        format!("data:image/png;base64,{}", BASE64.encode(b"png-bytes"))
    }

    #[test]
    fn media_type_allow_list() {
        assert_eq!(ext_for_media_type("data:image/png;base64"), Some("png"));
        assert_eq!(ext_for_media_type("data:image/jpg;base64"), Some("jpg"));
        assert_eq!(ext_for_media_type("data:image/jpeg;base64"), Some("jpeg"));
        assert_eq!(ext_for_media_type("data:image/gif;base64"), None);
        assert_eq!(ext_for_media_type("data:text/html;base64"), None);
    }

    #[test]
    fn parse_rejects_payload_without_comma() {
        assert!(parse_data_uri("data:image/png;base64").is_err());
    }

    #[tokio::test]
    async fn store_writes_the_decoded_bytes() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let name = store(&state, user_id, &png_data_uri()).await.unwrap();
        assert_eq!(name, format!("{user_id}.png"));
        assert_eq!(
            std::fs::read(stored_path(&state, &name)).unwrap(),
            b"png-bytes"
        );
    }

    #[tokio::test]
    async fn store_rejects_disallowed_media_type_and_writes_nothing() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let raw = format!("data:image/gif;base64,{}", BASE64.encode(b"gif-bytes"));
        let err = store(&state, user_id, &raw).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        for ext in ["png", "jpg", "jpeg", "gif"] {
            assert!(!stored_path(&state, &format!("{user_id}.{ext}")).exists());
        }
    }

    #[tokio::test]
    async fn store_rejects_undecodable_base64() {
        let state = AppState::fake();
        let err = store(&state, Uuid::new_v4(), "data:image/png;base64,@@@@")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn discard_removes_the_file_but_spares_the_placeholder() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let name = store(&state, user_id, &png_data_uri()).await.unwrap();
        assert!(stored_path(&state, &name).exists());

        discard(&state, &name).await;
        assert!(!stored_path(&state, &name).exists());

        // Never touches the shared placeholder.
        discard(&state, PLACEHOLDER).await;
    }

    #[tokio::test]
    async fn data_uri_roundtrip_and_placeholder_passthrough() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let name = store(&state, user_id, &png_data_uri()).await.unwrap();

        let uri = as_data_uri(&state, &name).await;
        assert_eq!(uri, png_data_uri());

        assert_eq!(as_data_uri(&state, PLACEHOLDER).await, PLACEHOLDER);
    }
}
