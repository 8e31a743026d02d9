//! Sessions from environment credentials.
//!
//! `ECLIPSE_USER`/`ECLIPSE_PWD` log in to Eclipse directly. Without them an
//! Orion session is used instead: `ORION_TOKEN` if set, otherwise
//! `ORION_USER`/`ORION_PWD`. The binary loads `.env` before calling in here.

use std::fmt;

use log::info;
use modelsync_client::{Credentials, EclipseClient, OrionClient};

use crate::config::Config;
use crate::error::{Error, Result};

/// Where the Eclipse session should come from.
pub enum EclipseLogin {
    Direct(Credentials),
    OrionToken(String),
    ViaOrion { user: String, password: String },
}

impl fmt::Debug for EclipseLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EclipseLogin::Direct(credentials) => write!(f, "Direct({credentials:?})"),
            EclipseLogin::OrionToken(_) => write!(f, "OrionToken(***)"),
            EclipseLogin::ViaOrion { user, .. } => write!(f, "ViaOrion({user})"),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Pick a login method from the given variable source.
pub fn eclipse_login_from(lookup: impl Fn(&str) -> Option<String>) -> Result<EclipseLogin> {
    if let (Some(user), Some(password)) = (
        non_empty(&lookup, "ECLIPSE_USER"),
        non_empty(&lookup, "ECLIPSE_PWD"),
    ) {
        return Ok(EclipseLogin::Direct(Credentials::Password { user, password }));
    }
    if let Some(token) = non_empty(&lookup, "ORION_TOKEN") {
        return Ok(EclipseLogin::OrionToken(token));
    }
    if let (Some(user), Some(password)) = (
        non_empty(&lookup, "ORION_USER"),
        non_empty(&lookup, "ORION_PWD"),
    ) {
        return Ok(EclipseLogin::ViaOrion { user, password });
    }
    Err(Error::Validation(
        "no Eclipse credentials: set ECLIPSE_USER/ECLIPSE_PWD, ORION_TOKEN or ORION_USER/ORION_PWD"
            .into(),
    ))
}

pub fn orion_credentials_from(lookup: impl Fn(&str) -> Option<String>) -> Result<(String, String)> {
    match (
        non_empty(&lookup, "ORION_USER"),
        non_empty(&lookup, "ORION_PWD"),
    ) {
        (Some(user), Some(password)) => Ok((user, password)),
        _ => Err(Error::Validation(
            "no Orion credentials: set ORION_USER and ORION_PWD".into(),
        )),
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn connect_eclipse(config: &Config) -> Result<EclipseClient> {
    let settings = config.eclipse_settings();
    info!("Connecting to Eclipse at {}", settings.base_url);
    let client = match eclipse_login_from(env)? {
        EclipseLogin::Direct(credentials) => EclipseClient::login(&settings, credentials)?,
        EclipseLogin::OrionToken(token) => {
            EclipseClient::login(&settings, Credentials::OrionToken(token))?
        }
        EclipseLogin::ViaOrion { user, password } => {
            let orion = OrionClient::login(&config.orion_settings(), &user, &password)?;
            EclipseClient::login(
                &settings,
                Credentials::OrionToken(orion.session_token().to_string()),
            )?
        }
    };
    Ok(client)
}

pub fn connect_orion(config: &Config) -> Result<OrionClient> {
    let settings = config.orion_settings();
    info!("Connecting to Orion at {}", settings.base_url);
    let (user, password) = orion_credentials_from(env)?;
    Ok(OrionClient::login(&settings, &user, &password)?)
}
