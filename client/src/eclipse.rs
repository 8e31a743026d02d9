//! Eclipse trading API client.

use std::fmt;

use log::info;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::EclipseGateway;
use crate::error::{ApiError, Result};
use crate::http::{HttpSettings, Transport, token_field};
use crate::search;
use crate::types::*;

pub const ECLIPSE_BASE_URL: &str = "https://api.orioneclipse.com/v1";

/// How to obtain an Eclipse session. Consumed by [`EclipseClient::login`].
pub enum Credentials {
    Password { user: String, password: String },
    /// Session token from an Orion login, exchanged for an Eclipse token.
    OrionToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            Credentials::OrionToken(_) => f.debug_tuple("OrionToken").field(&"***").finish(),
        }
    }
}

#[derive(Serialize)]
struct ModelDetailEnvelope<'a> {
    #[serde(rename = "modelDetail")]
    model_detail: &'a ModelDetail,
}

/// Authenticated Eclipse session.
pub struct EclipseClient {
    transport: Transport,
}

impl EclipseClient {
    /// Exchange credentials for a session token (GET /admin/token).
    pub fn login(settings: &HttpSettings, credentials: Credentials) -> Result<Self> {
        let mut transport = Transport::new(settings)?;
        let req = transport.bare(Method::GET, "/admin/token");
        let req = match credentials {
            Credentials::Password { user, password } => req.basic_auth(user, Some(password)),
            Credentials::OrionToken(token) => {
                req.header("Authorization", format!("Session {token}"))
            }
        };
        let body = transport.execute(req, "GET /admin/token")?;
        transport.set_token(token_field(&body, "eclipse_access_token")?);
        info!("Eclipse session established");
        Ok(Self { transport })
    }

    /// Reuse a token obtained elsewhere.
    pub fn with_token(settings: &HttpSettings, token: &str) -> Result<Self> {
        let mut transport = Transport::new(settings)?;
        transport.set_token(token.to_string());
        Ok(Self { transport })
    }

    /// Login id of the session's user.
    pub fn check_username(&self) -> Result<String> {
        let json: Value = self.transport.get("/admin/authorization/user")?;
        match json.get("userLoginId") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(ApiError::Decode("response has no userLoginId".into())),
        }
    }

    pub fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        self.transport.get("/account/accounts/simple")
    }

    /// Server-side search across id, name, account number and portfolio.
    pub fn search_accounts(&self, term: &str) -> Result<Vec<AccountSummary>> {
        self.transport
            .get_query("/account/accounts/simple", &[("search", term)])
    }

    pub fn account_details(&self, id: i64) -> Result<Value> {
        self.transport.get(&format!("/account/accounts/{id}"))
    }

    /// Resolve an account from trailing digits of its number and a rough name.
    pub fn find_account(&self, number_fragment: &str, name_fragment: &str) -> Result<AccountSummary> {
        let accounts = self.search_accounts(&search::digits(number_fragment))?;
        search::best_account(&accounts, number_fragment, name_fragment).cloned()
    }
}

impl EclipseGateway for EclipseClient {
    fn search_securities(&self, ticker: &str) -> Result<Vec<Security>> {
        self.transport
            .get_query("/security/securities/simple", &[("search", ticker)])
    }

    fn list_security_sets(&self) -> Result<Vec<SecuritySetSummary>> {
        self.transport.get("/security/securityset")
    }

    fn get_security_set(&self, id: i64) -> Result<SecuritySet> {
        self.transport
            .get(&format!("/security/securityset/details/{id}"))
    }

    fn create_security_set(&self, payload: &SecuritySetPayload) -> Result<SecuritySet> {
        self.transport.post("/security/securityset", payload)
    }

    fn update_security_set(&self, id: i64, payload: &SecuritySetPayload) -> Result<Value> {
        self.transport
            .put(&format!("/security/securityset/{id}"), payload)
    }

    fn list_models(&self) -> Result<Vec<ModelSummary>> {
        self.transport.get("/modeling/models")
    }

    fn get_model(&self, id: i64) -> Result<Model> {
        self.transport.get(&format!("/modeling/models/{id}"))
    }

    fn create_model(&self, payload: &NewModel) -> Result<Model> {
        self.transport.post("/modeling/models", payload)
    }

    fn update_model_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value> {
        self.transport.put(
            &format!("/modeling/models/{model_id}/modelDetail"),
            &ModelDetailEnvelope {
                model_detail: detail,
            },
        )
    }

    fn add_model_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value> {
        self.transport.post(
            &format!("/modeling/models/{model_id}/modelDetail"),
            &ModelDetailEnvelope {
                model_detail: detail,
            },
        )
    }
}
