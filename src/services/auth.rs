use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use deadpool_postgres::Pool;
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{AppError, Result};
use crate::models::profile::{Account, Profile, Role};
use crate::repositories::profile as profile_repo;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the hashed password.
fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a hash.
///
/// # Arguments
///
/// * `password` - The password to verify.
/// * `hash` - The hash to verify against.
///
/// # Returns
///
/// A `Result` containing `true` if the password is valid, `false` otherwise.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2.verify_password(&password_bytes, &parsed_hash).is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Authenticates an account by email and password.
///
/// Invalid credentials re-throw as an authentication error so the caller
/// can keep its sign-in form in an error state.
pub async fn authenticate(pool: &Pool, email: &str, password: &str) -> Result<Account> {
    tracing::debug!("🔐 Authenticating account: {}", email);

    let account = profile_repo::find_account_by_email(pool, email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !verify_password(password, &account.password)? {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!("✅ Account authenticated: {}", account.id);
    Ok(account)
}

/// Creates a new account and sets up its profile.
///
/// The profile row itself is inserted by a database trigger; this applies
/// the requested display name and role afterwards.
pub async fn create_account(
    pool: &Pool,
    email: &str,
    password: &str,
    full_name: Option<&str>,
    role: Role,
) -> Result<Profile> {
    tracing::debug!("🔐 Creating account: {}", email);

    let password_hash = hash_password(password)?;
    let user_id = profile_repo::create_account(pool, email, &password_hash).await?;
    let profile = profile_repo::update_profile(pool, &user_id, full_name, role, None).await?;

    tracing::info!("✅ Account created with ID: {}", user_id);
    Ok(profile)
}

/// Changes an account's password after verifying the current one.
pub async fn change_password(
    pool: &Pool,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<()> {
    tracing::info!("🔑 Changing password for account: {}", user_id);

    let account = profile_repo::find_account_by_id(pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(old_password, &account.password)? {
        return Err(AppError::Authentication(
            "Invalid current password".to_string(),
        ));
    }

    let new_hash = hash_password(new_password)?;
    profile_repo::update_password(pool, &user_id, &new_hash).await?;

    tracing::info!("✅ Password changed for account: {}", user_id);
    Ok(())
}
