//! Shared plumbing for the form endpoints: the in-flight submission gate,
//! field validation and multipart decoding.

use std::{collections::HashMap, str::FromStr, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};
use dashmap::{mapref::entry::Entry, DashMap};
use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, Date};
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult, FieldError},
    images::{services::is_image, SelectedImage},
};

/// Where a successful food or profile form sends the user.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Login,
    Register,
    AddFood,
    EditFood,
    EditProfile,
}

impl FormKind {
    pub fn submit_label(self, submitting: bool) -> &'static str {
        use FormKind::*;
        match (self, submitting) {
            (Login, false) => "Login",
            (Login, true) => "Logging in...",
            (Register, false) => "Register",
            (Register, true) => "Registering...",
            (AddFood, false) => "Add Food",
            (EditFood | EditProfile, false) => "Save Changes",
            (AddFood | EditFood | EditProfile, true) => "Saving...",
        }
    }
}

type GateKey = (FormKind, String);

/// Tracks which form instances have a submission in flight.
#[derive(Clone, Default)]
pub struct SubmitGate {
    in_flight: Arc<DashMap<GateKey, ()>>,
}

impl SubmitGate {
    /// Marks the form instance busy until the returned guard is dropped.
    pub fn begin(&self, kind: FormKind, owner: impl Into<String>) -> AppResult<Submission> {
        let key = (kind, owner.into());
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => {
                warn!(form = ?kind, owner = %key.1, "submission already in flight");
                Err(AppError::SubmissionInFlight(kind.submit_label(true)))
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                debug!(form = ?kind, owner = %key.1, "submission started");
                Ok(Submission {
                    in_flight: self.in_flight.clone(),
                    key,
                })
            }
        }
    }

    #[cfg(test)]
    pub fn is_submitting(&self, kind: FormKind, owner: &str) -> bool {
        self.in_flight.contains_key(&(kind, owner.to_string()))
    }
}

#[must_use]
pub struct Submission {
    in_flight: Arc<DashMap<GateKey, ()>>,
    key: GateKey,
}

impl Drop for Submission {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Collects field errors; nothing reaches a store until `finish` says so.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn reject(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    /// Whitespace-only counts as missing.
    pub fn required<'a>(&mut self, field: &'static str, value: Option<&'a str>) -> Option<&'a str> {
        match value {
            Some(v) if !is_blank(v) => Some(v),
            _ => {
                self.reject(field, "required");
                None
            }
        }
    }

    /// Required, well-formed, returned normalized.
    pub fn email(&mut self, field: &'static str, value: Option<&str>) -> Option<String> {
        let email = normalize_email(self.required(field, value)?);
        if is_valid_email(&email) {
            Some(email)
        } else {
            self.reject(field, "invalid email");
            None
        }
    }

    pub fn date(&mut self, field: &'static str, value: Option<&str>) -> Option<Date> {
        let raw = self.required(field, value)?;
        match Date::parse(raw, format_description!("[year]-[month]-[day]")) {
            Ok(d) => Some(d),
            Err(_) => {
                self.reject(field, "expected YYYY-MM-DD");
                None
            }
        }
    }

    pub fn choice<T: FromStr>(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        message: &'static str,
    ) -> Option<T> {
        let raw = self.required(field, value)?;
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.reject(field, message);
                None
            }
        }
    }

    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Text fields plus the optional `image` file of a multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub image: Option<SelectedImage>,
    image_not_an_image: bool,
}

impl MultipartForm {
    pub const IMAGE_FIELD: &'static str = "image";

    pub async fn read(mut mp: Multipart) -> AppResult<Self> {
        let mut form = MultipartForm::default();
        while let Some(field) = mp.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == Self::IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(malformed)?;
                // An untouched file input still sends an empty part.
                if file_name.is_empty() && body.is_empty() {
                    continue;
                }
                if !is_image(&content_type) {
                    form.image_not_an_image = true;
                    continue;
                }
                form.image = Some(SelectedImage {
                    file_name,
                    content_type,
                    body,
                });
            } else {
                let value = field.text().await.map_err(malformed)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn check_image(&self, v: &mut Validator) {
        if self.image_not_an_image {
            v.reject(Self::IMAGE_FIELD, "must be an image");
        }
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mp = Multipart::from_request(req, state).await?;
        Self::read(mp).await
    }
}

fn malformed<E: std::fmt::Display>(e: E) -> AppError {
    warn!(error = %e, "malformed multipart body");
    AppError::Validation(vec![FieldError {
        field: "body",
        message: "malformed form data",
    }])
}
