use anchor_lang::prelude::*;
use ephemeral_vrf_sdk::anchor::vrf;
use ephemeral_vrf_sdk::instructions::{create_request_randomness_ix, RequestRandomnessParams};
use ephemeral_vrf_sdk::types::SerializableAccountMeta;
use switchboard_on_demand::accounts::RandomnessAccountData;

use crate::errors::DropError;
use crate::events::{SeedCommitted, SeedRequested, SeedSet};
use crate::instruction;
use crate::state::{DropConfig, DROP_CONFIG_SEED};

// ============================================================================
// COMMIT / SET - Switchboard two-phase seed draw
// ============================================================================

#[derive(Accounts)]
pub struct CommitSeed<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    pub authority: Signer<'info>,

    /// CHECK: Switchboard randomness account, validated by parsing its data.
    pub randomness_account: AccountInfo<'info>,
}

impl<'info> CommitSeed<'info> {
    pub fn handler(ctx: Context<CommitSeed>) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;

        let clock = Clock::get()?;
        let randomness_data =
            RandomnessAccountData::parse(ctx.accounts.randomness_account.data.borrow())
                .map_err(|_| DropError::InvalidRandomnessAccount)?;

        // Only accept randomness committed to the previous slot, so the value
        // cannot already be known when we bind to it.
        if randomness_data.seed_slot != clock.slot - 1 {
            return Err(DropError::RandomnessAlreadyRevealed.into());
        }

        // Rejects a re-commit while a draw is outstanding; abandoning is a
        // separate, visible step.
        config.begin_seed_commit(
            ctx.accounts.randomness_account.key(),
            randomness_data.seed_slot,
        )?;

        emit!(SeedCommitted {
            drop_config: config.key(),
            randomness_account: config.pending_randomness,
            commit_slot: config.commit_slot,
        });

        msg!("Seed committed at slot {}", config.commit_slot);
        Ok(())
    }
}

#[derive(Accounts)]
pub struct SetSeed<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    pub authority: Signer<'info>,

    /// CHECK: Must be the randomness account committed earlier.
    #[account(
        constraint = randomness_account.key() == drop_config.pending_randomness
            @ DropError::InvalidRandomnessAccount
    )]
    pub randomness_account: AccountInfo<'info>,
}

impl<'info> SetSeed<'info> {
    pub fn handler(ctx: Context<SetSeed>) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;
        require!(!config.is_seeded(), DropError::SeedAlreadySet);
        require!(
            config.pending_randomness != Pubkey::default(),
            DropError::InvalidRandomnessAccount
        );

        let clock = Clock::get()?;
        let randomness_data =
            RandomnessAccountData::parse(ctx.accounts.randomness_account.data.borrow())
                .map_err(|_| DropError::InvalidRandomnessAccount)?;

        let random_value = randomness_data
            .get_value(clock.slot)
            .map_err(|_| DropError::RandomnessNotResolved)?;

        let seed = u32::from_le_bytes([
            random_value[0],
            random_value[1],
            random_value[2],
            random_value[3],
        ]);

        config.clear_seed_commit();

        // Zero doubles as the unset sentinel; a zero draw leaves the drop
        // unseeded and a fresh commit/set round picks a new value.
        if seed == 0 {
            msg!("Randomness drew the sentinel value; commit again");
            return Ok(());
        }

        config.set_seed_value(seed)?;

        emit!(SeedSet {
            drop_config: config.key(),
            seed,
            timestamp: clock.unix_timestamp,
        });

        msg!("Seed set: {}", seed);
        Ok(())
    }
}

#[derive(Accounts)]
pub struct AbandonSeedCommit<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    pub authority: Signer<'info>,
}

impl<'info> AbandonSeedCommit<'info> {
    pub fn handler(ctx: Context<AbandonSeedCommit>) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;
        require!(
            config.pending_randomness != Pubkey::default(),
            DropError::InvalidRandomnessAccount
        );

        msg!("Abandoning seed commit to {}", config.pending_randomness);
        config.clear_seed_commit();
        Ok(())
    }
}

// ============================================================================
// REQUEST / FULFILL - VRF callback seed draw
// ============================================================================

#[vrf]
#[derive(Accounts)]
pub struct RequestSeed<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: VRF oracle queue
    #[account(mut)]
    pub oracle_queue: AccountInfo<'info>,

    // system_program, vrf_program, slot_hashes, program_identity are added by
    // the #[vrf] macro.
}

impl<'info> RequestSeed<'info> {
    pub fn handler(ctx: Context<RequestSeed>) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;
        require!(!config.is_seeded(), DropError::SeedAlreadySet);
        require!(!config.seed_request_pending, DropError::SeedRequestPending);
        // A Switchboard commit in flight blocks the VRF path too.
        require!(
            config.pending_randomness == Pubkey::default(),
            DropError::SeedRequestPending
        );

        let clock = Clock::get()?;
        let config_key = config.key();
        let authority_key = ctx.accounts.authority.key();
        let oracle_queue_key = ctx.accounts.oracle_queue.key();

        config.seed_request_pending = true;

        let caller_seed = solana_sha256_hasher::hashv(&[
            b"sers_seed",
            config_key.as_ref(),
            &clock.unix_timestamp.to_le_bytes(),
        ])
        .to_bytes();

        let vrf_ix = create_request_randomness_ix(RequestRandomnessParams {
            payer: authority_key,
            oracle_queue: oracle_queue_key,
            callback_program_id: crate::ID,
            callback_discriminator: instruction::FulfillSeed::DISCRIMINATOR.to_vec(),
            caller_seed,
            accounts_metas: Some(vec![SerializableAccountMeta {
                pubkey: config_key,
                is_signer: false,
                is_writable: true,
            }]),
            ..Default::default()
        });

        ctx.accounts
            .invoke_signed_vrf(&ctx.accounts.authority.to_account_info(), &vrf_ix)?;

        emit!(SeedRequested {
            drop_config: config_key,
            oracle_queue: oracle_queue_key,
        });

        msg!("Seed requested from VRF queue {}", oracle_queue_key);
        Ok(())
    }
}

#[derive(Accounts)]
pub struct FulfillSeed<'info> {
    /// CHECK: VRF program identity, proves the callback comes from the oracle.
    #[account(address = ephemeral_vrf_sdk::consts::VRF_PROGRAM_IDENTITY)]
    pub vrf_program_identity: Signer<'info>,

    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump
    )]
    pub drop_config: Account<'info, DropConfig>,
}

impl<'info> FulfillSeed<'info> {
    pub fn handler(ctx: Context<FulfillSeed>, randomness: [u8; 32]) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;
        require!(config.seed_request_pending, DropError::RandomnessNotResolved);
        require!(!config.is_seeded(), DropError::SeedAlreadySet);

        config.seed_request_pending = false;

        let seed = u32::from_le_bytes([
            randomness[0],
            randomness[1],
            randomness[2],
            randomness[3],
        ]);

        // Zero is the unset sentinel; the authority re-requests on a zero draw.
        if seed == 0 {
            msg!("VRF drew the sentinel value; request again");
            return Ok(());
        }

        config.set_seed_value(seed)?;

        emit!(SeedSet {
            drop_config: config.key(),
            seed,
            timestamp: Clock::get()?.unix_timestamp,
        });

        msg!("Seed fulfilled: {}", seed);
        Ok(())
    }
}
