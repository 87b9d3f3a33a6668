//! `reqwest` implementation of the scheduling API.
//!
//! Mirrors the browser client: the bearer token lives behind a shared lock so
//! the session store can attach or detach it, and every non-2xx response is
//! mapped into `ApiError` with the backend's `message` when present.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::{Arc, PoisonError, RwLock};

use gobarber::ApiError;
use gobarber::api::{self, AvailabilityQuery, SchedulingApi};
use gobarber::models::{
    AppointmentRequest, AvailabilitySlot, AvatarUpload, ProfileUpdate, Provider, SessionResponse, SignInCredentials,
    UserProfile,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

#[derive(Clone, Debug)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ReqwestApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), token: Arc::new(RwLock::new(None)) }
    }

    fn url(&self, path: &str) -> String {
        api::endpoint(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner).clone();
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn transport(e: impl std::fmt::Display) -> ApiError {
    ApiError::Transport(e.to_string())
}

/// Send and fail on non-2xx.
async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
    let resp = builder.send().await.map_err(transport)?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::from_response(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let resp = send(builder).await?;
    resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
}

impl SchedulingApi for ReqwestApi {
    fn set_auth_token(&self, token: Option<&str>) {
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = token.map(ToOwned::to_owned);
    }

    async fn create_session(&self, credentials: &SignInCredentials) -> Result<SessionResponse, ApiError> {
        decode(self.request(Method::POST, api::SESSIONS_PATH).json(credentials)).await
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ApiError> {
        decode(self.request(Method::GET, api::PROVIDERS_PATH)).await
    }

    async fn day_availability(&self, query: &AvailabilityQuery) -> Result<Vec<AvailabilitySlot>, ApiError> {
        decode(self.request(Method::GET, &query.path()).query(&query.params())).await
    }

    async fn create_appointment(&self, request: &AppointmentRequest) -> Result<(), ApiError> {
        send(self.request(Method::POST, api::APPOINTMENTS_PATH).json(request)).await?;
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        decode(self.request(Method::PUT, api::PROFILE_PATH).json(update)).await
    }

    async fn update_avatar(&self, upload: &AvatarUpload) -> Result<UserProfile, ApiError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(transport)?;
        let form = Form::new().part(api::AVATAR_FIELD, part);
        decode(self.request(Method::PATCH, api::AVATAR_PATH).multipart(form)).await
    }
}
