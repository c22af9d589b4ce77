use anchor_lang::prelude::*;

use crate::errors::DropError;
use crate::events::AuthorityTransferred;
use crate::state::{ClaimMode, DropConfig, DROP_CONFIG_SEED, MAX_BASE_URI_LEN};
use crate::utils::{hash_base_uri, normalize_base_uri};

#[derive(Accounts)]
#[instruction(base_uri_commitment: [u8; 32])]
pub struct InitializeDrop<'info> {
    #[account(
        init,
        payer = authority,
        space = 8 + DropConfig::INIT_SPACE,
        seeds = [DROP_CONFIG_SEED, base_uri_commitment.as_ref()],
        bump
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> InitializeDrop<'info> {
    #[allow(clippy::too_many_arguments)]
    pub fn handler(
        ctx: Context<InitializeDrop>,
        base_uri_commitment: [u8; 32],
        max_supply: u32,
        claim_mode: ClaimMode,
        attestation_signer: Pubkey,
        allowlist_root: [u8; 32],
        base_uri: String,
        name_service: Pubkey,
    ) -> Result<()> {
        require!(max_supply > 0, DropError::SupplyExceedsMaximum);
        require!(
            base_uri_commitment != [0u8; 32],
            DropError::UriCannotBeEmpty
        );
        require!(base_uri.len() <= MAX_BASE_URI_LEN, DropError::UriCannotBeEmpty);

        let stored_base_uri = match claim_mode {
            ClaimMode::Attestation => {
                // Attestation drops publish the base URI up front; the
                // commitment still pins it so the PDA address is stable.
                require!(!base_uri.is_empty(), DropError::UriCannotBeEmpty);
                require!(
                    hash_base_uri(&base_uri) == base_uri_commitment,
                    DropError::CommitmentMismatch
                );
                require!(
                    attestation_signer != Pubkey::default(),
                    DropError::InvalidSignature
                );
                normalize_base_uri(base_uri)
            }
            ClaimMode::Allowlist => {
                // Commit-reveal drops keep the URI hidden until the seed is
                // fixed; only the commitment is stored now.
                require!(base_uri.is_empty(), DropError::UriCannotBeEmpty);
                require!(allowlist_root != [0u8; 32], DropError::InvalidProof);
                String::new()
            }
        };

        let config = &mut ctx.accounts.drop_config;
        config.authority = ctx.accounts.authority.key();
        config.claim_mode = claim_mode;
        config.attestation_signer = attestation_signer;
        config.allowlist_root = allowlist_root;
        config.name_service = name_service;
        config.max_supply = max_supply;
        config.seed = 0;
        config.base_uri = stored_base_uri;
        config.base_uri_commitment = base_uri_commitment;
        config.pending_randomness = Pubkey::default();
        config.commit_slot = 0;
        config.seed_request_pending = false;
        config.total_claimed = 0;
        config.batch_count = 0;
        config.batch_supply_total = 0;
        config.created_at = Clock::get()?.unix_timestamp;
        config.bump = ctx.bumps.drop_config;

        msg!(
            "Drop initialized: max_supply={}, mode={}",
            max_supply,
            match claim_mode {
                ClaimMode::Attestation => "attestation",
                ClaimMode::Allowlist => "allowlist",
            }
        );

        Ok(())
    }
}

#[derive(Accounts)]
pub struct TransferAuthority<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    pub authority: Signer<'info>,
}

impl<'info> TransferAuthority<'info> {
    pub fn handler(ctx: Context<TransferAuthority>, new_authority: Pubkey) -> Result<()> {
        require!(new_authority != Pubkey::default(), DropError::Unauthorized);

        let config = &mut ctx.accounts.drop_config;
        let previous = config.authority;
        config.authority = new_authority;

        emit!(AuthorityTransferred {
            drop_config: config.key(),
            previous_authority: previous,
            new_authority,
        });

        Ok(())
    }
}
