pub use http::StatusCode;
use kube::Error;

/// Exposes the HTTP status of a failed API call, if there was one.
pub trait HttpStatusCode {
    fn status_code(&self) -> Option<StatusCode>;

    fn is_status_code(&self, status_code: StatusCode) -> bool {
        self.status_code()
            .map(|some| some == status_code)
            .unwrap_or_default()
    }

    /// `true` when the API server rejected a create because the object already exists.
    fn is_conflict(&self) -> bool {
        self.is_status_code(StatusCode::CONFLICT)
    }
}

impl HttpStatusCode for kube::Error {
    fn status_code(&self) -> Option<StatusCode> {
        if let Error::Api(error_response) = self {
            StatusCode::from_u16(error_response.code).ok()
        } else {
            None
        }
    }
}

impl<T, E> HttpStatusCode for std::result::Result<T, E>
where
    E: HttpStatusCode,
{
    fn status_code(&self) -> Option<StatusCode> {
        self.as_ref().err().and_then(|e| e.status_code())
    }
}

/// Converts a `404` into `Ok(None)` so teardown can treat missing objects as already gone.
pub trait AllowNotFound<T, E> {
    fn allow_not_found(self) -> std::result::Result<Option<T>, E>;
}

impl<T, E> AllowNotFound<T, E> for std::result::Result<T, E>
where
    E: HttpStatusCode,
{
    fn allow_not_found(self) -> std::result::Result<Option<T>, E> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_status_code(StatusCode::NOT_FOUND) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
