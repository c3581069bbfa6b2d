//! Registry transport: the wire-level contract and its HTTP implementation.
//!
//! The naming authority's metadata API is four logical operations over an
//! identifier string and a string→string map (get, create, partial update,
//! delete), plus a login that establishes the session privileged calls ride
//! on. [`RegistryTransport`] captures that contract so the state machine and
//! orchestrator can be exercised against an in-memory mock; see
//! [`HttpRegistryTransport`] for the production EZID-style implementation.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use url::Url;

use super::error::{RegistryError, RegistryResult};
use crate::anvl::{self, MetadataMap};
use crate::config::RegistryConfig;

/// Tagged result of a metadata fetch.
///
/// The protocol can usually distinguish "identifier absent" from "registry
/// broken"; the tag preserves that distinction for the call sites that need
/// it (`lookup` treats both as empty, `already_exists` treats them very
/// differently). `get_metadata` re-conflates the two at its public surface.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The identifier exists; its current metadata.
    Found(MetadataMap),
    /// The registry answered and the identifier does not exist.
    NotFound,
    /// The registry could not be consulted; the identifier may or may not
    /// exist.
    Transient(String),
}

/// Wire-level contract with the naming authority.
pub trait RegistryTransport: Send + Sync {
    /// Establish the authenticated session used by privileged calls.
    fn login(&mut self, username: &str, password: &str) -> RegistryResult<()>;

    /// Fetch current metadata for an identifier. Unprivileged.
    fn fetch(&self, identifier: &str) -> FetchOutcome;

    /// Create an identifier with initial metadata. Not idempotent: the
    /// registry rejects a second create for the same identifier. Returns the
    /// registry's confirmation string.
    fn create(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<String>;

    /// Partial metadata update: only supplied keys are touched.
    fn update(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<()>;

    /// Hard-delete an identifier. The registry enforces that only
    /// `_status: reserved` identifiers may be deleted.
    fn delete(&self, identifier: &str) -> RegistryResult<()>;
}

enum SessionAuth {
    /// Session cookie captured from the login response.
    Cookie(String),
    /// Login succeeded but no cookie was issued; reuse the credential
    /// header for the lifetime of this client.
    Basic(String),
}

/// HTTP transport speaking the EZID-style metadata API.
///
/// One session per transport instance, established by [`login`] and never
/// renewed; an expired session surfaces as [`RegistryError::Unavailable`]
/// on the next privileged call.
///
/// [`login`]: RegistryTransport::login
pub struct HttpRegistryTransport {
    agent: ureq::Agent,
    base_url: Url,
    session: Option<SessionAuth>,
}

impl HttpRegistryTransport {
    /// Construct an unauthenticated transport from configuration.
    pub fn new(config: &RegistryConfig) -> RegistryResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            RegistryError::Unavailable(format!("invalid registry URL: {}", err))
        })?;

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();

        Ok(Self {
            agent,
            base_url,
            session: None,
        })
    }

    fn login_url(&self) -> RegistryResult<Url> {
        self.base_url.join("login").map_err(|err| {
            RegistryError::Unavailable(format!("failed to build login URL: {}", err))
        })
    }

    fn id_url(&self, identifier: &str) -> RegistryResult<Url> {
        self.base_url.join(&format!("id/{}", identifier)).map_err(|err| {
            RegistryError::Unavailable(format!(
                "failed to build metadata URL for {}: {}",
                identifier, err
            ))
        })
    }

    fn authenticated(&self, request: ureq::Request) -> RegistryResult<ureq::Request> {
        match &self.session {
            Some(SessionAuth::Cookie(cookie)) => Ok(request.set("Cookie", cookie)),
            Some(SessionAuth::Basic(header)) => Ok(request.set("Authorization", header)),
            None => Err(RegistryError::Unavailable(
                "no authenticated registry session".to_string(),
            )),
        }
    }
}

impl RegistryTransport for HttpRegistryTransport {
    fn login(&mut self, username: &str, password: &str) -> RegistryResult<()> {
        let url = self.login_url()?;
        let header = format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", username, password))
        );

        let response = self
            .agent
            .get(url.as_str())
            .set("Authorization", &header)
            .call()
            .map_err(classify_auth_error)?;

        let cookie = response
            .header("set-cookie")
            .and_then(|c| c.split(';').next())
            .map(str::to_string);

        let body = read_body(response)?;
        expect_success_line(&body)?;

        self.session = Some(match cookie {
            Some(cookie) => SessionAuth::Cookie(cookie),
            None => SessionAuth::Basic(header),
        });
        Ok(())
    }

    fn fetch(&self, identifier: &str) -> FetchOutcome {
        let url = match self.id_url(identifier) {
            Ok(url) => url,
            Err(err) => return FetchOutcome::Transient(err.to_string()),
        };

        match self.agent.get(url.as_str()).call() {
            Ok(response) => match read_body(response) {
                Ok(body) => classify_fetch_body(&body),
                Err(err) => FetchOutcome::Transient(err.to_string()),
            },
            Err(ureq::Error::Status(404, _)) => FetchOutcome::NotFound,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                if body.contains("no such identifier") {
                    FetchOutcome::NotFound
                } else {
                    FetchOutcome::Transient(format!("status {}: {}", code, first_line(&body)))
                }
            }
            Err(ureq::Error::Transport(transport)) => {
                FetchOutcome::Transient(transport.to_string())
            }
        }
    }

    fn create(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<String> {
        let url = self.id_url(identifier)?;
        let request = self
            .authenticated(self.agent.put(url.as_str()))?
            .set("Content-Type", "text/plain; charset=UTF-8");

        match request.send_string(&anvl::encode(metadata)) {
            Ok(response) => {
                let body = read_body(response)?;
                expect_success_line(&body)
            }
            Err(err) => Err(classify_write_error(identifier, err)),
        }
    }

    fn update(&self, identifier: &str, metadata: &MetadataMap) -> RegistryResult<()> {
        let url = self.id_url(identifier)?;
        let request = self
            .authenticated(self.agent.post(url.as_str()))?
            .set("Content-Type", "text/plain; charset=UTF-8");

        match request.send_string(&anvl::encode(metadata)) {
            Ok(response) => {
                let body = read_body(response)?;
                expect_success_line(&body).map(|_| ())
            }
            Err(err) => Err(classify_write_error(identifier, err)),
        }
    }

    fn delete(&self, identifier: &str) -> RegistryResult<()> {
        let url = self.id_url(identifier)?;
        let request = self.authenticated(self.agent.delete(url.as_str()))?;

        match request.call() {
            Ok(response) => {
                let body = read_body(response)?;
                expect_success_line(&body).map(|_| ())
            }
            Err(err) => Err(classify_write_error(identifier, err)),
        }
    }
}

fn read_body(response: ureq::Response) -> RegistryResult<String> {
    response
        .into_string()
        .map_err(|err| RegistryError::Unavailable(format!("failed reading response: {}", err)))
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or("").trim()
}

/// Response grammar: the first line is `success: <receipt>` or
/// `error: <reason>`; for reads the remaining lines are the ANVL payload.
fn expect_success_line(body: &str) -> RegistryResult<String> {
    let line = first_line(body);
    if let Some(receipt) = line.strip_prefix("success:") {
        return Ok(receipt.trim().to_string());
    }
    if let Some(reason) = line.strip_prefix("error:") {
        return Err(classify_error_reason(reason.trim()));
    }
    Err(RegistryError::Unavailable(format!(
        "unrecognized registry response: {}",
        line
    )))
}

fn classify_fetch_body(body: &str) -> FetchOutcome {
    let line = first_line(body);
    if line.strip_prefix("success:").is_some() {
        let payload = body.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        return FetchOutcome::Found(anvl::decode(payload));
    }
    if let Some(reason) = line.strip_prefix("error:") {
        if reason.contains("no such identifier") {
            return FetchOutcome::NotFound;
        }
        return FetchOutcome::Transient(reason.trim().to_string());
    }
    FetchOutcome::Transient(format!("unrecognized registry response: {}", line))
}

fn classify_error_reason(reason: &str) -> RegistryError {
    if reason.contains("already exists") {
        RegistryError::Conflict(reason.to_string())
    } else if reason.contains("no such identifier") {
        RegistryError::NotFoundOrRegistryError(reason.to_string())
    } else if reason.contains("not reserved") || reason.contains("support deletion") {
        RegistryError::PreconditionFailed(reason.to_string())
    } else {
        RegistryError::Unavailable(reason.to_string())
    }
}

fn classify_auth_error(err: ureq::Error) -> RegistryError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            RegistryError::Unavailable(format!(
                "login rejected with status {}: {}",
                code,
                first_line(&body)
            ))
        }
        ureq::Error::Transport(transport) => RegistryError::Unavailable(transport.to_string()),
    }
}

fn classify_write_error(identifier: &str, err: ureq::Error) -> RegistryError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let line = first_line(&body);
            if let Some(reason) = line.strip_prefix("error:") {
                return classify_error_reason(reason.trim());
            }
            match code {
                401 | 403 => RegistryError::Unavailable(format!(
                    "registry rejected credentials (status {})",
                    code
                )),
                404 => RegistryError::NotFoundOrRegistryError(identifier.to_string()),
                _ => RegistryError::Unavailable(format!("status {}: {}", code, line)),
            }
        }
        ureq::Error::Transport(transport) => RegistryError::Unavailable(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_success_line_extracts_receipt() {
        let receipt =
            expect_success_line("success: doi:10.5072/FK2/ABCD12\ndatacite.title: T\n").unwrap();
        assert_eq!(receipt, "doi:10.5072/FK2/ABCD12");
    }

    #[test]
    fn test_error_line_classification() {
        assert!(matches!(
            expect_success_line("error: bad request - identifier already exists"),
            Err(RegistryError::Conflict(_))
        ));
        assert!(matches!(
            expect_success_line("error: bad request - no such identifier"),
            Err(RegistryError::NotFoundOrRegistryError(_))
        ));
        assert!(matches!(
            expect_success_line("error: bad request - identifier is not reserved"),
            Err(RegistryError::PreconditionFailed(_))
        ));
        assert!(matches!(
            expect_success_line("error: internal server error"),
            Err(RegistryError::Unavailable(_))
        ));
    }

    #[test]
    fn test_fetch_body_classification() {
        let found = classify_fetch_body("success: doi:10.5072/FK2/X\n_status: reserved\n");
        match found {
            FetchOutcome::Found(map) => assert_eq!(map.get("_status").unwrap(), "reserved"),
            other => panic!("expected Found, got {:?}", other),
        }

        assert!(matches!(
            classify_fetch_body("error: bad request - no such identifier"),
            FetchOutcome::NotFound
        ));
        assert!(matches!(
            classify_fetch_body("error: internal server error"),
            FetchOutcome::Transient(_)
        ));
    }

    #[test]
    fn test_unrecognized_body_is_not_success() {
        assert!(expect_success_line("<html>proxy error</html>").is_err());
        assert!(matches!(
            classify_fetch_body("<html>proxy error</html>"),
            FetchOutcome::Transient(_)
        ));
    }
}
