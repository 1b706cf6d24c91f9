use std::path::{Path, PathBuf};

use {
    anyhow::{Result, bail},
    clap::Args,
    hubkey_config::HubkeyConfig,
    hubkey_unlock::{UnlockError, UserKey},
    p384::pkcs8::{EncodePublicKey, LineEnding},
    secrecy::Secret,
    tracing::warn,
};

use crate::context;

#[derive(Args)]
pub struct UserKeyArgs {
    /// Where to write the setup-code-wrapped user key.
    #[arg(long)]
    pub out: PathBuf,
    /// Where to write the user public key (PEM).
    #[arg(long)]
    pub public_key_out: Option<PathBuf>,
    #[arg(long, env = "HUBKEY_SETUP_CODE", hide_env_values = true)]
    pub setup_code: String,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Setup-code-wrapped user key as issued by the hub.
    #[arg(long)]
    pub user_key: PathBuf,
    /// Where to write the user key wrapped for this device. Printed if omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long, env = "HUBKEY_SETUP_CODE", hide_env_values = true)]
    pub setup_code: String,
}

#[derive(Args)]
pub struct UnlockArgs {
    /// Vault master key wrapped for the user.
    #[arg(long)]
    pub vault_key: PathBuf,
    /// User key wrapped for this device.
    #[arg(long, conflicts_with = "user_key")]
    pub device_user_key: Option<PathBuf>,
    /// Setup-code-wrapped user key; requires the setup code.
    #[arg(long, requires = "setup_code")]
    pub user_key: Option<PathBuf>,
    #[arg(long, env = "HUBKEY_SETUP_CODE", hide_env_values = true)]
    pub setup_code: Option<String>,
    /// Write the raw 64-byte master key here (mode 0600). Only its key check
    /// is printed otherwise.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Generate a fresh user key and wrap it under a setup code.
pub fn handle_new_user_key(args: UserKeyArgs, config: &HubkeyConfig) -> Result<()> {
    let unlock = context::vault_unlock(config)?;
    let user_key = UserKey::generate();
    let token = unlock.protect_user_key(&user_key, &Secret::new(args.setup_code))?;
    context::write_private(&args.out, token.as_bytes())?;
    eprintln!("Wrote wrapped user key to {}", args.out.display());

    if let Some(path) = args.public_key_out {
        let pem = user_key
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| anyhow::anyhow!("encode public key: {e}"))?;
        std::fs::write(&path, pem)?;
        eprintln!("Wrote user public key to {}", path.display());
    }
    Ok(())
}

/// Re-wrap the user key for this device.
pub fn handle_register(args: RegisterArgs, config: &HubkeyConfig) -> Result<()> {
    let unlock = context::vault_unlock(config)?;
    let user_token = context::read_token(&args.user_key)?;
    let device_token = unlock
        .re_encrypt_user_key(&user_token, &Secret::new(args.setup_code))
        .map_err(explain)?;

    match args.out {
        Some(path) => {
            context::write_private(&path, device_token.as_bytes())?;
            eprintln!(
                "Registered device {}, wrapped user key written to {}",
                unlock.device_fingerprint()?,
                path.display()
            );
        },
        None => println!("{device_token}"),
    }
    Ok(())
}

pub fn handle_unlock(args: UnlockArgs, config: &HubkeyConfig) -> Result<()> {
    let unlock = context::vault_unlock(config)?;
    let vault_token = context::read_token(&args.vault_key)?;

    let master_key = match (args.device_user_key, args.user_key, args.setup_code) {
        (Some(device_path), _, _) => {
            let device_token = context::read_token(&device_path)?;
            unlock.unlock_with_device(&device_token, &vault_token)
        },
        (None, Some(user_path), Some(code)) => {
            let user_token = context::read_token(&user_path)?;
            unlock.unlock_with_setup_code(&user_token, &vault_token, &Secret::new(code))
        },
        _ => bail!("pass --device-user-key, or --user-key with a setup code"),
    }
    .map_err(explain)?;

    match args.out {
        Some(path) => {
            write_key(&path, master_key.as_bytes())?;
            eprintln!("Master key written to {}", path.display());
        },
        None => println!("{}", master_key.key_check()),
    }
    master_key.lock();
    Ok(())
}

fn write_key(path: &Path, key: &[u8]) -> Result<()> {
    if path.exists() {
        warn!(path = %path.display(), "overwriting existing key file");
    }
    context::write_private(path, key)
}

fn explain(err: UnlockError) -> anyhow::Error {
    match err {
        UnlockError::WrongSetupCode => anyhow::anyhow!("{err}; check the setup code and try again"),
        UnlockError::WrongKey => {
            anyhow::anyhow!("{err}; this device or user may not have been granted access")
        },
        other => other.into(),
    }
}
