use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    InvalidSelector(String),

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Connection level failures: refused, timed out, DNS, broken body stream.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Reqwest(_) | Error::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_not_transport() {
        let err = Error::Status {
            url: "https://example.org/works/1".into(),
            status: 503,
        };
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            "Request to https://example.org/works/1 returned status 503"
        );
    }

    #[test]
    fn io_is_transport() {
        let err = Error::from(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(err.is_transport());
    }
}
