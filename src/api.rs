use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Json},
};
use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SESSION_COOKIE: &str = "admin_session";

#[derive(Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    authorized: bool,
}

pub fn create_signed_cookie(secret: &str, value: &str) -> Result<String, String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Invalid secret key")?;
    mac.update(value.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);
    Ok(format!("{}:{}", value, signature_b64))
}

pub fn verify_signed_cookie(secret: &str, signed_value: &str) -> Option<String> {
    if let Some((value, signature_b64)) = signed_value.rsplit_once(':')
        && let Ok(signature) = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64)
        && let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes())
    {
        mac.update(value.as_bytes());
        if mac.verify_slice(&signature).is_ok() {
            return Some(value.to_string());
        }
    }
    None
}

/// The authorization gate for every mutating operation. A caller is
/// authorized when they present a validly signed session cookie whose
/// embedded email is still on the whitelist.
pub fn is_caller_authorized(headers: &HeaderMap, config: &crate::AppConfig) -> bool {
    get_cookie_value(headers, SESSION_COOKIE)
        .and_then(|signed_value| verify_signed_cookie(&config.session_secret, &signed_value))
        .is_some_and(|email| is_whitelisted(&email, config))
}

fn is_whitelisted(email: &str, config: &crate::AppConfig) -> bool {
    let email = email.trim().to_lowercase();
    config
        .admin_emails
        .iter()
        .any(|allowed| allowed.trim().to_lowercase() == email)
}

pub async fn authenticate_handler(
    State(app_state): State<crate::AppState>,
    Json(payload): Json<AuthRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    tracing::info!("Authentication attempt received");
    let config = &app_state.config;

    let email = payload.email.trim().to_lowercase();
    if payload.password == config.app.admin_password && is_whitelisted(&email, &config.app) {
        tracing::info!(email = %email, "Authentication successful");
        match create_signed_cookie(&config.app.session_secret, &email) {
            Ok(signed_value) => {
                let cookie = format!(
                    "{}={}; Path=/; Max-Age=86400; HttpOnly; SameSite=Lax",
                    SESSION_COOKIE, signed_value
                );

                let mut headers = HeaderMap::new();
                headers.insert(SET_COOKIE, cookie.parse().unwrap());

                let response = AuthResponse {
                    success: true,
                    message: "Authentication successful".to_string(),
                };

                Ok((headers, Json(response)))
            }
            Err(_) => {
                let response = AuthResponse {
                    success: false,
                    message: "Server error".to_string(),
                };
                Ok((HeaderMap::new(), Json(response)))
            }
        }
    } else {
        tracing::warn!("Authentication failed - invalid credentials");
        let response = AuthResponse {
            success: false,
            message: "Invalid credentials".to_string(),
        };
        Ok((HeaderMap::new(), Json(response)))
    }
}

pub async fn verify_handler(
    State(app_state): State<crate::AppState>,
    headers: HeaderMap,
) -> Json<VerifyResponse> {
    let authorized = is_caller_authorized(&headers, &app_state.config.app);
    Json(VerifyResponse { authorized })
}

pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get("cookie")?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let cookie = cookie.trim();
            if let Some((key, value)) = cookie.split_once('=') {
                if key.trim() == name {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            } else {
                None
            }
        })
}
