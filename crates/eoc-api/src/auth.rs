use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::Error;

/// Login credentials for one EoC controller.
///
/// The password stays wrapped in a [`SecretString`]; it is only exposed
/// while serializing a login request body.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Result<Self, Error> {
        let username = username.into();
        if username.is_empty() {
            return Err(Error::MissingCredentials);
        }
        Ok(Self { username, password })
    }

    /// The `{username, password}` body every firmware generation expects
    /// on its login endpoint.
    pub(crate) fn login_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            username: &self.username,
            password: self.password.expose_secret(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// A session cookie as handed out by a controller login, split into name
/// and value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    value: String,
}

impl SessionCookie {
    /// Parse a `name=value` pair. Anything after the first `;` (cookie
    /// attributes from a `Set-Cookie` header) is dropped.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let pair = raw.split(';').next().unwrap_or_default().trim();
        match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Ok(Self {
                name: name.trim().to_owned(),
                value: value.trim().to_owned(),
            }),
            _ => Err(Error::Protocol {
                message: "cannot split session cookie into name and value".into(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
