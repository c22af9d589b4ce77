use anchor_lang::prelude::*;
use mpl_core::instructions::CreateV2CpiBuilder;

pub mod batch;
pub mod initialize;
pub mod prove;
pub mod redeem;
pub mod reveal;
pub mod seed;

pub use batch::*;
pub use initialize::*;
pub use prove::*;
pub use redeem::*;
pub use reveal::*;
pub use seed::*;

/// Create the Core asset that carries ownership of a freshly minted token.
///
/// The asset address is a PDA over (drop config, token id), so a second mint
/// attempt for the same id fails at account creation.
pub(crate) fn mint_core_asset<'info>(
    mpl_core_program: &AccountInfo<'info>,
    asset: &AccountInfo<'info>,
    payer: &AccountInfo<'info>,
    owner: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    name: String,
    uri: String,
    asset_seeds: &[&[u8]],
) -> Result<()> {
    CreateV2CpiBuilder::new(mpl_core_program)
        .asset(asset)
        .payer(payer)
        .owner(Some(owner))
        .system_program(system_program)
        .name(name)
        .uri(uri)
        .invoke_signed(&[asset_seeds])?;
    Ok(())
}
