//! Google Sheets record store (values:append over REST, service-account auth)

use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::{PersistError, PersistedRow, RecordStore};

pub const SHEET_ID_VAR: &str = "TAGMATCH_SHEET_ID";
pub const PROJECT_ID_VAR: &str = "GCP_PROJECT_ID";
pub const PRIVATE_KEY_ID_VAR: &str = "GCP_PRIVATE_KEY_ID";
pub const PRIVATE_KEY_VAR: &str = "GCP_PRIVATE_KEY";
pub const CLIENT_EMAIL_VAR: &str = "GCP_CLIENT_EMAIL";
pub const CLIENT_ID_VAR: &str = "GCP_CLIENT_ID";
pub const CLIENT_CERT_URL_VAR: &str = "GCP_CLIENT_X509_CERT_URL";

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime requested for each signed assertion
const ASSERTION_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

/// Service-account fields as read from the environment
#[derive(Debug, Clone, Default)]
pub struct ServiceAccountEnv {
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
    pub client_x509_cert_url: Option<String>,
}

impl ServiceAccountEnv {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            project_id: lookup(PROJECT_ID_VAR),
            private_key_id: lookup(PRIVATE_KEY_ID_VAR),
            private_key: lookup(PRIVATE_KEY_VAR),
            client_email: lookup(CLIENT_EMAIL_VAR),
            client_id: lookup(CLIENT_ID_VAR),
            client_x509_cert_url: lookup(CLIENT_CERT_URL_VAR),
        }
    }

    /// All six variables must be present, even the ones the token exchange
    /// does not use
    fn key(&self) -> Result<ServiceAccountKey<'_>, PersistError> {
        let project_id = require(&self.project_id, PROJECT_ID_VAR)?;
        let private_key_id = require(&self.private_key_id, PRIVATE_KEY_ID_VAR)?;
        let private_key = require(&self.private_key, PRIVATE_KEY_VAR)?;
        let client_email = require(&self.client_email, CLIENT_EMAIL_VAR)?;
        require(&self.client_id, CLIENT_ID_VAR)?;
        require(&self.client_x509_cert_url, CLIENT_CERT_URL_VAR)?;
        Ok(ServiceAccountKey {
            project_id,
            private_key_id,
            private_key,
            client_email,
        })
    }
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, PersistError> {
    value
        .as_deref()
        .ok_or(PersistError::ConfigurationMissing(name))
}

struct ServiceAccountKey<'a> {
    project_id: &'a str,
    private_key_id: &'a str,
    private_key: &'a str,
    client_email: &'a str,
}

/// Connection settings; ids and credentials come from the environment
#[derive(Debug, Clone)]
pub struct GoogleSheetConfig {
    pub spreadsheet_id: Option<String>,
    pub service_account: ServiceAccountEnv,
    /// A1 range whose table rows are appended after, e.g. `Sheet1!A1`
    pub range: String,
    pub base_url: String,
    pub token_url: String,
    pub timeout_secs: u64,
}

impl GoogleSheetConfig {
    pub fn from_env(range: impl Into<String>) -> Self {
        Self::from_lookup(range, |name: &str| {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        })
    }

    pub fn from_lookup(range: impl Into<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            spreadsheet_id: lookup(SHEET_ID_VAR),
            service_account: ServiceAccountEnv::from_lookup(&lookup),
            range: range.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// JWT claims for the OAuth 2.0 service-account flow
#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Request body for values:append
#[derive(Serialize)]
struct AppendRequest<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'a str,
    values: Vec<Vec<String>>,
}

/// Subset of the values:append response we log
#[derive(Deserialize)]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: Option<String>,
}

struct AccessToken {
    value: String,
    expires_at: i64,
}

pub struct GoogleSheet {
    config: GoogleSheetConfig,
    client: Option<reqwest::blocking::Client>,
    token: Option<AccessToken>,
}

impl GoogleSheet {
    pub fn new(config: GoogleSheetConfig) -> Self {
        Self {
            config,
            client: None,
            token: None,
        }
    }

    fn client(&mut self) -> Result<reqwest::blocking::Client, PersistError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| PersistError::Http(e.to_string()))?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn append_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.config.base_url.trim_end_matches('/'),
            spreadsheet_id,
            self.config.range
        )
    }

    fn http_error(&self, e: reqwest::Error) -> PersistError {
        if e.is_timeout() {
            PersistError::Http(format!(
                "Request timed out after {}s",
                self.config.timeout_secs
            ))
        } else {
            PersistError::Http(e.to_string())
        }
    }

    /// A cached access token, or a fresh one from the token endpoint
    fn access_token(&mut self, now: i64) -> Result<String, PersistError> {
        if let Some(token) = &self.token {
            if now < token.expires_at - REFRESH_MARGIN_SECS {
                return Ok(token.value.clone());
            }
        }

        let key = self.config.service_account.key()?;
        let assertion = sign_assertion(&key, &self.config.token_url, now)?;
        log::debug!(
            "Requesting access token for {} (project {})",
            key.client_email,
            key.project_id
        );

        let client = self.client()?;
        let response = client
            .post(&self.config.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PersistError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let token: TokenResponse = response
            .json()
            .map_err(|e| PersistError::Credentials(format!("Bad token response: {}", e)))?;

        self.token = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });
        Ok(token.access_token)
    }
}

/// RS256-signed assertion for the service-account token exchange
fn sign_assertion(
    key: &ServiceAccountKey<'_>,
    audience: &str,
    now: i64,
) -> Result<String, PersistError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.private_key_id.to_string());

    // Keys pasted into .env files usually carry escaped newlines
    let pem = key.private_key.replace("\\n", "\n");
    let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| PersistError::Credentials(format!("{}: {}", PRIVATE_KEY_VAR, e)))?;

    let claims = Claims {
        iss: key.client_email,
        scope: SHEETS_SCOPE,
        aud: audience,
        iat: now,
        exp: now + ASSERTION_SECS,
    };
    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| PersistError::Credentials(e.to_string()))
}

impl RecordStore for GoogleSheet {
    fn append(&mut self, row: &PersistedRow) -> Result<(), PersistError> {
        let id = self
            .config
            .spreadsheet_id
            .clone()
            .ok_or(PersistError::ConfigurationMissing(SHEET_ID_VAR))?;
        let token = self.access_token(chrono::Utc::now().timestamp())?;
        let url = self.append_url(&id);
        let client = self.client()?;

        let body = AppendRequest {
            range: &self.config.range,
            major_dimension: "ROWS",
            values: vec![row.cells()],
        };

        let response = client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.token = None;
            }
            let body = response.text().unwrap_or_default();
            return Err(PersistError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<AppendResponse>() {
            Ok(AppendResponse {
                updates:
                    Some(AppendUpdates {
                        updated_range: Some(range),
                    }),
            }) => log::info!("Appended result row to {}", range),
            _ => log::info!("Appended result row to spreadsheet {}", id),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ALL_VARS: [&str; 7] = [
        SHEET_ID_VAR,
        PROJECT_ID_VAR,
        PRIVATE_KEY_ID_VAR,
        PRIVATE_KEY_VAR,
        CLIENT_EMAIL_VAR,
        CLIENT_ID_VAR,
        CLIENT_CERT_URL_VAR,
    ];

    fn config_without(missing: &[&str]) -> GoogleSheetConfig {
        let env: HashMap<&str, String> = ALL_VARS
            .iter()
            .filter(|name| !missing.contains(name))
            .map(|name| (*name, format!("value-of-{}", name)))
            .collect();
        let mut config =
            GoogleSheetConfig::from_lookup("Sheet1!A1", |name: &str| env.get(name).cloned());
        config.timeout_secs = 5;
        config
    }

    fn row() -> PersistedRow {
        PersistedRow {
            values: vec!["1".into(), "1".into()],
            status: "Match".into(),
            timestamp: "2024-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn test_missing_id_is_configuration_error() {
        let mut sheet = GoogleSheet::new(config_without(&[SHEET_ID_VAR]));
        assert!(matches!(
            sheet.append(&row()),
            Err(PersistError::ConfigurationMissing(SHEET_ID_VAR))
        ));
    }

    #[test]
    fn test_each_missing_service_account_variable_is_named() {
        for var in &ALL_VARS[1..] {
            let mut sheet = GoogleSheet::new(config_without(&[*var]));
            match sheet.append(&row()) {
                Err(PersistError::ConfigurationMissing(name)) => assert_eq!(name, *var),
                other => panic!("expected {} to be reported missing, got {:?}", var, other),
            }
        }
    }

    #[test]
    fn test_first_missing_variable_wins() {
        let mut sheet = GoogleSheet::new(config_without(&[CLIENT_ID_VAR, PRIVATE_KEY_VAR]));
        assert!(matches!(
            sheet.append(&row()),
            Err(PersistError::ConfigurationMissing(PRIVATE_KEY_VAR))
        ));
    }

    #[test]
    fn test_unparseable_private_key_is_credentials_error() {
        let mut sheet = GoogleSheet::new(config_without(&[]));
        assert!(matches!(
            sheet.append(&row()),
            Err(PersistError::Credentials(_))
        ));
    }

    #[test]
    fn test_cached_token_is_reused_before_expiry() {
        let mut sheet = GoogleSheet::new(config_without(&[PRIVATE_KEY_VAR]));
        sheet.token = Some(AccessToken {
            value: "cached".to_string(),
            expires_at: 10_000,
        });
        assert_eq!(sheet.access_token(5_000).unwrap(), "cached");
        // Near expiry the credentials are needed again
        assert!(matches!(
            sheet.access_token(10_000 - REFRESH_MARGIN_SECS),
            Err(PersistError::ConfigurationMissing(PRIVATE_KEY_VAR))
        ));
    }

    #[test]
    fn test_claims_shape() {
        let claims = Claims {
            iss: "svc@project.iam.gserviceaccount.com",
            scope: SHEETS_SCOPE,
            aud: DEFAULT_TOKEN_URL,
            iat: 100,
            exp: 100 + ASSERTION_SECS,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["iss"], "svc@project.iam.gserviceaccount.com");
        assert_eq!(json["aud"], "https://oauth2.googleapis.com/token");
        assert_eq!(json["scope"], "https://www.googleapis.com/auth/spreadsheets");
        assert_eq!(json["exp"], 3700);
    }

    #[test]
    fn test_append_url() {
        let sheet = GoogleSheet::new(config_without(&[]));
        assert_eq!(
            sheet.append_url("abc"),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A1:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = AppendRequest {
            range: "Sheet1!A1",
            major_dimension: "ROWS",
            values: vec![row().cells()],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["majorDimension"], "ROWS");
        assert_eq!(json["values"][0][2], "Match");
    }
}
