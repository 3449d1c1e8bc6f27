use axum::{routing::post, Json, Router};
use serde::Serialize;
use tracing::{debug, instrument};

use super::ImageSelection;
use crate::{
    auth::Session,
    error::AppResult,
    forms::{MultipartForm, Validator},
    state::AppState,
};

pub fn image_routes() -> Router<AppState> {
    Router::new().route("/images/preview", post(preview_image))
}

#[derive(Debug, Serialize)]
pub struct ImagePreview {
    /// `null` when the input was cleared.
    pub preview: Option<String>,
}

/// Called whenever a form's image input changes. Nothing is uploaded.
#[instrument(skip(session, form), fields(user_id = %session.user_id))]
pub async fn preview_image(
    session: Session,
    mut form: MultipartForm,
) -> AppResult<Json<ImagePreview>> {
    let mut v = Validator::default();
    form.check_image(&mut v);
    v.finish()?;

    let mut selection = ImageSelection::default();
    selection.select(form.image.take());
    let preview = selection.preview();
    debug!(user_id = %session.user_id, cleared = preview.is_none(), "image preview");
    Ok(Json(ImagePreview { preview }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::{
        auth::claims::SessionProfile,
        testing::{multipart_request, Part, TestEnv},
    };

    #[tokio::test]
    async fn picked_file_comes_back_as_data_url_without_upload() {
        let env = TestEnv::new();
        let (_, token) = env
            .user_with_token("a@b.co", "pw", SessionProfile::default())
            .await;
        let (status, body) = env
            .send(multipart_request(
                Method::POST,
                "/api/v1/images/preview",
                Some(&token),
                &[Part::File("image", "hi.png", "image/png", b"hi")],
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["preview"], "data:image/png;base64,aGk=");
        assert!(env.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn cleared_input_has_no_preview() {
        let env = TestEnv::new();
        let (_, token) = env
            .user_with_token("a@b.co", "pw", SessionProfile::default())
            .await;
        let (status, body) = env
            .send(multipart_request(
                Method::POST,
                "/api/v1/images/preview",
                Some(&token),
                &[Part::File("image", "", "application/octet-stream", b"")],
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["preview"].is_null());
    }

    #[tokio::test]
    async fn non_image_is_a_field_error() {
        let env = TestEnv::new();
        let (_, token) = env
            .user_with_token("a@b.co", "pw", SessionProfile::default())
            .await;
        let (status, body) = env
            .send(multipart_request(
                Method::POST,
                "/api/v1/images/preview",
                Some(&token),
                &[Part::File("image", "notes.txt", "text/plain", b"hello")],
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "image");
    }
}
