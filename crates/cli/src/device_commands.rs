use {
    anyhow::Result,
    clap::Subcommand,
    hubkey_config::HubkeyConfig,
    p384::pkcs8::{EncodePublicKey, LineEnding},
};

use crate::context;

#[derive(Subcommand)]
pub enum DeviceAction {
    /// Create the device key if it does not exist yet.
    Init,
    /// Print the device fingerprint.
    Fingerprint,
    /// Print the device public key as PEM, for registration with the hub.
    PublicKey,
}

pub fn handle_device(action: DeviceAction, config: &HubkeyConfig) -> Result<()> {
    let unlock = context::vault_unlock(config)?;

    match action {
        DeviceAction::Init => {
            unlock.device().ensure_device_key_exists()?;
            println!("Device key ready: {}", unlock.device_fingerprint()?);
        },
        DeviceAction::Fingerprint => println!("{}", unlock.device_fingerprint()?),
        DeviceAction::PublicKey => {
            let pem = unlock
                .device_public_key()?
                .to_public_key_pem(LineEnding::LF)
                .map_err(|e| anyhow::anyhow!("encode public key: {e}"))?;
            print!("{pem}");
        },
    }

    Ok(())
}
