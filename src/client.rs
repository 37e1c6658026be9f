//! HTTP client for the school server's assignment endpoints.
//!
//! Every state-mutating call is a POST carrying the page's anti-forgery
//! token; the server replies with an HTML fragment for the matching
//! container. The client performs no retries and never reorders requests;
//! ordering is the registry's job.

use std::time::Duration;

use url::Url;

use crate::fragment;

pub const CSRF_HEADER: &str = "X-CSRFToken";
const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    BadBaseUrl(#[from] url::ParseError),
    #[error("invalid identifier {0:?}")]
    InvalidId(String),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("fragment rejected: {0}")]
    Fragment(#[from] fragment::FragmentError),
}

impl ClientError {
    /// Stable discriminator carried on container error events.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::BadBaseUrl(_) => "config",
            ClientError::InvalidId(_) => "bad_id",
            ClientError::Http(_) => "network",
            ClientError::Status { .. } => "status",
            ClientError::Fragment(_) => "fragment",
        }
    }
}

/// Sections the shared panel can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    AssignTeacher,
    AssignClass,
    AssignSubject,
}

impl Section {
    pub fn parse(raw: &str) -> Option<Section> {
        match raw {
            "assign_teacher" => Some(Section::AssignTeacher),
            "assign_class" => Some(Section::AssignClass),
            "assign_subject" => Some(Section::AssignSubject),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Section::AssignTeacher => "school/assign-teacher/",
            Section::AssignClass => "school/assign-class/",
            Section::AssignSubject => "school/assign-subject/",
        }
    }
}

/// Ids become path segments, so they are validated up front instead of
/// letting a malformed DOM attribute turn into a bogus URL.
fn validate_id(id: &str) -> Result<&str, ClientError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(id)
    } else {
        Err(ClientError::InvalidId(id.to_string()))
    }
}

pub fn assign_subject_path(teacher_id: &str, subject_id: &str) -> Result<String, ClientError> {
    Ok(format!(
        "school/assign-subject/{}/{}/",
        validate_id(teacher_id)?,
        validate_id(subject_id)?
    ))
}

pub fn assign_class_path(teacher_id: &str, class_id: &str) -> Result<String, ClientError> {
    Ok(format!(
        "school/assign-class/{}/{}/",
        validate_id(teacher_id)?,
        validate_id(class_id)?
    ))
}

pub fn remove_subject_path(teacher_id: &str, subject_id: &str) -> Result<String, ClientError> {
    Ok(format!(
        "school/remove-subject/{}/{}/",
        validate_id(teacher_id)?,
        validate_id(subject_id)?
    ))
}

pub fn remove_class_path(teacher_id: &str, class_id: &str) -> Result<String, ClientError> {
    Ok(format!(
        "school/remove-class/{}/{}/",
        validate_id(teacher_id)?,
        validate_id(class_id)?
    ))
}

pub struct SchoolClient {
    http: reqwest::Client,
    base: Url,
    csrf_token: String,
}

impl SchoolClient {
    pub fn new(base_url: &str, csrf_token: &str) -> Result<SchoolClient, ClientError> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(SchoolClient {
            http,
            base,
            csrf_token: csrf_token.to_string(),
        })
    }

    pub async fn assign_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<String, ClientError> {
        self.post_fragment(&assign_subject_path(teacher_id, subject_id)?)
            .await
    }

    pub async fn assign_class(
        &self,
        teacher_id: &str,
        class_id: &str,
    ) -> Result<String, ClientError> {
        self.post_fragment(&assign_class_path(teacher_id, class_id)?)
            .await
    }

    pub async fn remove_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<String, ClientError> {
        self.post_fragment(&remove_subject_path(teacher_id, subject_id)?)
            .await
    }

    pub async fn remove_class(
        &self,
        teacher_id: &str,
        class_id: &str,
    ) -> Result<String, ClientError> {
        self.post_fragment(&remove_class_path(teacher_id, class_id)?)
            .await
    }

    pub async fn load_section(&self, section: Section) -> Result<String, ClientError> {
        let path = section.path();
        let url = self.base.join(path)?;
        let resp = self
            .http
            .get(url)
            .header(REQUESTED_WITH_HEADER, "XMLHttpRequest")
            .send()
            .await?;
        self.fragment_from(resp, path).await
    }

    async fn post_fragment(&self, path: &str) -> Result<String, ClientError> {
        let url = self.base.join(path)?;
        let resp = self
            .http
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .send()
            .await?;
        self.fragment_from(resp, path).await
    }

    async fn fragment_from(
        &self,
        resp: reqwest::Response,
        path: &str,
    ) -> Result<String, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        let body = resp.text().await?;
        Ok(fragment::scrub(&body)?)
    }
}
