use base64ct::{Base64UrlUnpadded, Encoding};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    repo::AuthRepo,
    repo_types::User,
};
use crate::{
    config::MagicLinkConfig,
    error::{AppError, Result},
    mail::Mailer,
};

const TOKEN_BYTES: usize = 32;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// URL-safe random token from the OS CSPRNG.
pub(crate) fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    Base64UrlUnpadded::encode_string(&buf)
}

pub(crate) fn magic_link_url(base_url: &str, token: &str) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{sep}token={token}")
}

/// Issue a token for `email` and mail the link. Succeeds for unknown emails too.
pub async fn request_magic_link(
    repo: &dyn AuthRepo,
    mailer: &dyn Mailer,
    cfg: &MagicLinkConfig,
    email: &str,
) -> Result<()> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!("magic link requested for malformed email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + TimeDuration::minutes(cfg.ttl_minutes);
    repo.issue_magic_link(&email, &token, expires_at).await?;

    let link = magic_link_url(&cfg.base_url, &token);
    let body = format!(
        "Sign in to scalelog by opening this link:\n\n{link}\n\n\
         The link expires in {} minutes and works once. \
         If you did not ask for it, ignore this email.\n",
        cfg.ttl_minutes
    );
    mailer.send(&email, "Your scalelog sign-in link", &body).await?;

    info!(%email, "magic link issued");
    Ok(())
}

/// Redeem a magic-link token and open a session for its user.
pub async fn verify_magic_link(
    repo: &dyn AuthRepo,
    keys: &JwtKeys,
    token: &str,
) -> Result<AuthResponse> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidToken);
    }

    let user = repo
        .redeem_magic_link(token, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| {
            warn!("magic link rejected: unknown, consumed or expired");
            AppError::InvalidToken
        })?;

    info!(user_id = %user.id, email = %user.email, "magic link verified");
    issue_session(keys, user)
}

/// Exchange a refresh token for a new token pair.
pub async fn refresh_session(
    repo: &dyn AuthRepo,
    keys: &JwtKeys,
    refresh_token: &str,
) -> Result<AuthResponse> {
    let claims = keys
        .verify_refresh(refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = repo
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    issue_session(keys, user)
}

fn issue_session(keys: &JwtKeys, user: User) -> Result<AuthResponse> {
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        user: PublicUser::from(user),
        access_token,
        refresh_token,
    })
}
