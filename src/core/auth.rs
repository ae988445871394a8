use crate::core::{AccountRole, Identity, RecordApi};
use crate::utils::error::{MigrateError, Result};

/// 以 handle + App Password 登入指定帳號
pub async fn authenticate<A: RecordApi + ?Sized>(
    api: &A,
    role: AccountRole,
    handle: &str,
    app_password: &str,
) -> Result<Identity> {
    tracing::info!("🔐 Attempting login for {} ({})...", handle, role);

    let identity = api
        .login(handle, app_password)
        .await
        .map_err(|e| MigrateError::authentication(role, e))?;

    tracing::info!("✅ Logged in as {} ({})", identity.handle, identity.did);
    Ok(identity)
}
