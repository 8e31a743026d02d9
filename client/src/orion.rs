//! Orion advisor API client.

use log::info;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{ApiError, Result};
use crate::http::{HttpSettings, Transport, token_field};
use crate::types::Extra;

pub const ORION_BASE_URL: &str = "https://api.orionadvisor.com/api/v1";

/// One parameter of a custom report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPrompt {
    pub code: String,
    #[serde(default)]
    pub default_value: Value,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Deserialize)]
struct QueryDefinition {
    #[serde(default)]
    prompts: Vec<QueryPrompt>,
}

/// Authenticated Orion session.
pub struct OrionClient {
    transport: Transport,
    token: String,
}

impl OrionClient {
    /// Basic-auth login (GET /security/token).
    pub fn login(settings: &HttpSettings, user: &str, password: &str) -> Result<Self> {
        let mut transport = Transport::new(settings)?;
        let req = transport
            .bare(Method::GET, "/security/token")
            .basic_auth(user, Some(password));
        let body = transport.execute(req, "GET /security/token")?;
        let token = token_field(&body, "access_token")?;
        transport.set_token(token.clone());
        info!("Orion session established");
        Ok(Self { transport, token })
    }

    /// Session token, e.g. to open an Eclipse session without a password.
    pub fn session_token(&self) -> &str {
        &self.token
    }

    pub fn check_username(&self) -> Result<String> {
        let json: Value = self.transport.get("/authorization/user")?;
        match json.get("loginUserId") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(ApiError::Decode("response has no loginUserId".into())),
        }
    }

    /// Parameters a custom report accepts, with their defaults.
    pub fn query_params(&self, id: i64) -> Result<Vec<QueryPrompt>> {
        let def: QueryDefinition = self.transport.get(&format!("/Reporting/Custom/{id}"))?;
        Ok(def.prompts)
    }

    /// Run a custom report. `params` override prompt defaults by code;
    /// unknown codes are ignored.
    pub fn query(&self, id: i64, params: &Map<String, Value>) -> Result<Value> {
        let prompts = self.query_params(id)?;
        let payload = query_payload(prompts, params);
        self.transport
            .post(&format!("/Reporting/Custom/{id}/Generate/Table"), &payload)
    }
}

fn query_payload(prompts: Vec<QueryPrompt>, params: &Map<String, Value>) -> Value {
    let prompts: Vec<QueryPrompt> = prompts
        .into_iter()
        .map(|mut p| {
            if let Some(v) = params.get(&p.code) {
                p.default_value = v.clone();
            }
            p
        })
        .collect();
    // The report endpoint wants the literal string "null" here.
    json!({
        "runTo": "null",
        "databaseIdList": "null",
        "prompts": prompts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(code: &str, default: Value) -> QueryPrompt {
        QueryPrompt {
            code: code.into(),
            default_value: default,
            ..Default::default()
        }
    }

    #[test]
    fn params_override_defaults() {
        let prompts = vec![prompt("@asof", json!("2024-01-01")), prompt("@rep", json!(1))];
        let mut params = Map::new();
        params.insert("@asof".into(), json!("2025-06-30"));
        params.insert("@unknown".into(), json!(9));

        let payload = query_payload(prompts, &params);
        assert_eq!(payload["prompts"][0]["defaultValue"], "2025-06-30");
        assert_eq!(payload["prompts"][1]["defaultValue"], 1);
        assert_eq!(payload["prompts"].as_array().unwrap().len(), 2);
        assert_eq!(payload["runTo"], "null");
    }

    #[test]
    fn prompt_extra_fields_survive() {
        let p: QueryPrompt =
            serde_json::from_str(r#"{"code":"@x","defaultValue":null,"prompt":"As of"}"#).unwrap();
        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["prompt"], "As of");
    }
}
