use std::io::Cursor;

use rocket::{
    http::{ContentType, Status},
    response::{self, Flash, Redirect, Responder},
    Request, Response,
};
use thiserror::Error;

use crate::{api::ApiError, authentication, templates::TemplateError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("An error occured whilst rendering")]
    TeraRendering(#[from] tera::Error),
    #[error("Could not load templates: {0}")]
    Template(#[from] TemplateError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("The template renderer is not available.")]
    TemplateNotFound,
    #[error("The backend client is not configured.")]
    BackendNotFound,
    #[error("You need to be logged in to see this page.")]
    UserNotLoggedIn,
    #[error("Can not {action} a {resource} that is {status}.")]
    TransitionNotAllowed {
        resource: &'static str,
        action: &'static str,
        status: &'static str,
    },
    #[error("Unknown action '{0}'.")]
    UnknownAction(String),
}

pub trait ErrorResponder {
    fn response(&self) -> (Status, String);
}

impl ErrorResponder for Error {
    fn response(&self) -> (Status, String) {
        (
            match self {
                Error::TeraRendering(_)
                | Error::Template(_)
                | Error::TemplateNotFound
                | Error::BackendNotFound => Status::InternalServerError,
                Error::UserNotLoggedIn => Status::Unauthorized,
                Error::TransitionNotAllowed { .. } => Status::Conflict,
                Error::UnknownAction(_) => Status::NotFound,
                Error::Api(api) => return api.response(),
            },
            self.to_string(),
        )
    }
}

impl ErrorResponder for ApiError {
    fn response(&self) -> (Status, String) {
        (
            match self {
                ApiError::Unauthorized => Status::Unauthorized,
                ApiError::Rejected { status, .. } => {
                    Status::from_code(*status).unwrap_or(Status::BadGateway)
                }
                ApiError::Transport(_) | ApiError::Decode(_) => Status::BadGateway,
            },
            self.to_string(),
        )
    }
}

impl Error {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Api(ApiError::Unauthorized) | Error::UserNotLoggedIn)
    }
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        if self.is_session_expired() {
            authentication::forget(request.cookies());
            return Flash::error(Redirect::to(uri!("/account/login")), self.to_string())
                .respond_to(request);
        }

        let (status, body) = self.response();
        Response::build()
            .status(status)
            .header(ContentType::Plain)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
