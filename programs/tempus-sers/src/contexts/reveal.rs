use anchor_lang::prelude::*;

use crate::errors::DropError;
use crate::events::BaseUriRevealed;
use crate::state::{DropConfig, DROP_CONFIG_SEED};

#[derive(Accounts)]
pub struct RevealBaseUri<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    pub authority: Signer<'info>,
}

impl<'info> RevealBaseUri<'info> {
    pub fn handler(ctx: Context<RevealBaseUri>, base_uri: String) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;
        // Once, only after the seed is fixed, and only the committed value.
        config.reveal(base_uri)?;

        emit!(BaseUriRevealed {
            drop_config: config.key(),
            base_uri: config.base_uri.clone(),
            timestamp: Clock::get()?.unix_timestamp,
        });

        msg!("Base URI revealed: {}", config.base_uri);
        Ok(())
    }
}
