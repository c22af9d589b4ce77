use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar;

use crate::contexts::mint_core_asset;
use crate::errors::DropError;
use crate::events::{PermanentUri, TicketRedeemed};
use crate::state::{
    ClaimMode, DropConfig, TicketStub, TokenRecord, DROP_CONFIG_SEED, MAX_RARITY, SERS_ASSET_SEED,
    TICKET_STUB_SEED, TOKEN_RECORD_SEED,
};
use crate::utils::{
    redeem_digest, resolve_name_owner, verify_ed25519_instruction, REDEEM_TAG, REDEEM_TO_NAME_TAG,
};
use crate::MPL_CORE_ID;

#[derive(Accounts)]
#[instruction(ticket_id: u32, token_id: u32)]
pub struct RedeemTicket<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump
    )]
    pub drop_config: Account<'info, DropConfig>,

    /// CHECK: Wallet the token is issued to; bound into the signed digest.
    pub recipient: AccountInfo<'info>,

    /// Replay guard; created on first touch, the claimed flag flips once.
    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + TicketStub::INIT_SPACE,
        seeds = [TICKET_STUB_SEED, drop_config.key().as_ref(), &ticket_id.to_le_bytes()],
        bump
    )]
    pub ticket_stub: Account<'info, TicketStub>,

    /// Provenance record; `init` makes a second mint of the same token id
    /// fail at account creation.
    #[account(
        init,
        payer = payer,
        space = 8 + TokenRecord::INIT_SPACE,
        seeds = [TOKEN_RECORD_SEED, drop_config.key().as_ref(), &token_id.to_le_bytes()],
        bump
    )]
    pub token_record: Account<'info, TokenRecord>,

    /// CHECK: Core asset to create, PDA over (drop config, token id).
    #[account(
        mut,
        seeds = [SERS_ASSET_SEED, drop_config.key().as_ref(), &token_id.to_le_bytes()],
        bump
    )]
    pub asset: AccountInfo<'info>,

    #[account(mut)]
    pub payer: Signer<'info>,

    /// CHECK: Instructions sysvar for ed25519 introspection.
    #[account(address = sysvar::instructions::ID)]
    pub instructions_sysvar: AccountInfo<'info>,

    /// CHECK: MPL Core program
    #[account(address = MPL_CORE_ID)]
    pub mpl_core_program: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> RedeemTicket<'info> {
    pub fn handler(
        ctx: Context<RedeemTicket>,
        ticket_id: u32,
        token_id: u32,
        rarity: u8,
        signature: [u8; 64],
    ) -> Result<()> {
        let recipient_key = ctx.accounts.recipient.key();
        let digest = {
            let config = &ctx.accounts.drop_config;
            validate_direct_claim(config, &ctx.accounts.ticket_stub, ticket_id, rarity)?;
            require!(recipient_key != Pubkey::default(), DropError::InvalidRecipient);
            redeem_digest(
                &config.key(),
                REDEEM_TAG,
                &recipient_key,
                ticket_id,
                token_id,
                rarity,
            )
        };

        verify_ed25519_instruction(
            &ctx.accounts.instructions_sysvar,
            &ctx.accounts.drop_config.attestation_signer,
            &digest,
            &signature,
        )?;
        check_attested_pair(&ctx.accounts.drop_config, ticket_id, token_id)?;

        finish_direct_claim(ctx, ticket_id, token_id, rarity, recipient_key)
    }
}

#[derive(Accounts)]
#[instruction(ticket_id: u32, token_id: u32)]
pub struct RedeemTicketToName<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump
    )]
    pub drop_config: Account<'info, DropConfig>,

    /// CHECK: Name record whose current owner receives the token. The signed
    /// digest binds this record, not the resolved wallet.
    pub name_record: AccountInfo<'info>,

    /// CHECK: Must be the wallet the name record currently resolves to.
    pub recipient: AccountInfo<'info>,

    #[account(
        init_if_needed,
        payer = payer,
        space = 8 + TicketStub::INIT_SPACE,
        seeds = [TICKET_STUB_SEED, drop_config.key().as_ref(), &ticket_id.to_le_bytes()],
        bump
    )]
    pub ticket_stub: Account<'info, TicketStub>,

    #[account(
        init,
        payer = payer,
        space = 8 + TokenRecord::INIT_SPACE,
        seeds = [TOKEN_RECORD_SEED, drop_config.key().as_ref(), &token_id.to_le_bytes()],
        bump
    )]
    pub token_record: Account<'info, TokenRecord>,

    /// CHECK: Core asset to create, PDA over (drop config, token id).
    #[account(
        mut,
        seeds = [SERS_ASSET_SEED, drop_config.key().as_ref(), &token_id.to_le_bytes()],
        bump
    )]
    pub asset: AccountInfo<'info>,

    #[account(mut)]
    pub payer: Signer<'info>,

    /// CHECK: Instructions sysvar for ed25519 introspection.
    #[account(address = sysvar::instructions::ID)]
    pub instructions_sysvar: AccountInfo<'info>,

    /// CHECK: MPL Core program
    #[account(address = MPL_CORE_ID)]
    pub mpl_core_program: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> RedeemTicketToName<'info> {
    pub fn handler(
        ctx: Context<RedeemTicketToName>,
        ticket_id: u32,
        token_id: u32,
        rarity: u8,
        signature: [u8; 64],
    ) -> Result<()> {
        let (owner, digest) = {
            let config = &ctx.accounts.drop_config;
            validate_direct_claim(config, &ctx.accounts.ticket_stub, ticket_id, rarity)?;

            // Resolution happens at claim time; the attestation stays valid
            // across ownership changes of the record.
            let owner = resolve_name_owner(&ctx.accounts.name_record, &config.name_service)?;
            let digest = redeem_digest(
                &config.key(),
                REDEEM_TO_NAME_TAG,
                &ctx.accounts.name_record.key(),
                ticket_id,
                token_id,
                rarity,
            );
            (owner, digest)
        };
        require!(
            ctx.accounts.recipient.key() == owner,
            DropError::InvalidRecipient
        );

        verify_ed25519_instruction(
            &ctx.accounts.instructions_sysvar,
            &ctx.accounts.drop_config.attestation_signer,
            &digest,
            &signature,
        )?;
        check_attested_pair(&ctx.accounts.drop_config, ticket_id, token_id)?;

        finish_name_claim(ctx, ticket_id, token_id, rarity, owner)
    }
}

/// Shared pre-signature checks for both attestation claim variants.
fn validate_direct_claim(
    config: &DropConfig,
    stub: &TicketStub,
    ticket_id: u32,
    rarity: u8,
) -> Result<()> {
    require!(
        config.claim_mode == ClaimMode::Attestation,
        DropError::InvalidClaimMode
    );
    // Direct claims and batches are mutually exclusive per drop.
    require!(config.batch_count == 0, DropError::InvalidBatch);
    require!(!stub.is_claimed, DropError::TicketAlreadyClaimed);
    require!(ticket_id < config.max_supply, DropError::InvalidTicketId);
    require!(rarity < MAX_RARITY, DropError::InvalidRarityScore);
    require!(config.is_seeded(), DropError::SeedNotSet);
    Ok(())
}

/// Post-signature checks: the attested token id must match the on-chain
/// derivation, and the supply invariant must still hold.
fn check_attested_pair(config: &DropConfig, ticket_id: u32, token_id: u32) -> Result<()> {
    let expected = config.ticket_to_token_id(ticket_id)?;
    require!(expected == token_id, DropError::InvalidTicketTokenPair);
    require!(
        config.total_claimed < config.max_supply,
        DropError::SupplyExceedsMaximum
    );
    Ok(())
}

fn finish_direct_claim(
    ctx: Context<RedeemTicket>,
    ticket_id: u32,
    token_id: u32,
    rarity: u8,
    recipient: Pubkey,
) -> Result<()> {
    let clock = Clock::get()?;
    let config_key = ctx.accounts.drop_config.key();
    let uri = ctx
        .accounts
        .drop_config
        .token_uri_with_rarity(token_id, rarity)?;

    record_claim(
        &mut ctx.accounts.ticket_stub,
        &mut ctx.accounts.token_record,
        &mut ctx.accounts.drop_config,
        config_key,
        ticket_id,
        token_id,
        rarity,
        recipient,
        ctx.accounts.asset.key(),
        ctx.bumps.ticket_stub,
        ctx.bumps.token_record,
        clock.unix_timestamp,
    );

    let token_le = token_id.to_le_bytes();
    let asset_seeds: &[&[u8]] = &[
        SERS_ASSET_SEED,
        config_key.as_ref(),
        &token_le,
        &[ctx.bumps.asset],
    ];
    mint_core_asset(
        &ctx.accounts.mpl_core_program,
        &ctx.accounts.asset,
        &ctx.accounts.payer.to_account_info(),
        &ctx.accounts.recipient,
        &ctx.accounts.system_program.to_account_info(),
        format!("Sers #{}", token_id),
        uri.clone(),
        asset_seeds,
    )?;

    emit!(TicketRedeemed {
        drop_config: config_key,
        recipient,
        ticket_id,
        token_id,
        rarity,
        timestamp: clock.unix_timestamp,
    });
    emit!(PermanentUri { uri, token_id });

    msg!("Ticket {} redeemed as token {}", ticket_id, token_id);
    Ok(())
}

fn finish_name_claim(
    ctx: Context<RedeemTicketToName>,
    ticket_id: u32,
    token_id: u32,
    rarity: u8,
    recipient: Pubkey,
) -> Result<()> {
    let clock = Clock::get()?;
    let config_key = ctx.accounts.drop_config.key();
    let uri = ctx
        .accounts
        .drop_config
        .token_uri_with_rarity(token_id, rarity)?;

    record_claim(
        &mut ctx.accounts.ticket_stub,
        &mut ctx.accounts.token_record,
        &mut ctx.accounts.drop_config,
        config_key,
        ticket_id,
        token_id,
        rarity,
        recipient,
        ctx.accounts.asset.key(),
        ctx.bumps.ticket_stub,
        ctx.bumps.token_record,
        clock.unix_timestamp,
    );

    let token_le = token_id.to_le_bytes();
    let asset_seeds: &[&[u8]] = &[
        SERS_ASSET_SEED,
        config_key.as_ref(),
        &token_le,
        &[ctx.bumps.asset],
    ];
    mint_core_asset(
        &ctx.accounts.mpl_core_program,
        &ctx.accounts.asset,
        &ctx.accounts.payer.to_account_info(),
        &ctx.accounts.recipient,
        &ctx.accounts.system_program.to_account_info(),
        format!("Sers #{}", token_id),
        uri.clone(),
        asset_seeds,
    )?;

    emit!(TicketRedeemed {
        drop_config: config_key,
        recipient,
        ticket_id,
        token_id,
        rarity,
        timestamp: clock.unix_timestamp,
    });
    emit!(PermanentUri { uri, token_id });

    msg!(
        "Ticket {} redeemed as token {} to name owner {}",
        ticket_id,
        token_id,
        recipient
    );
    Ok(())
}

/// Persist the claim before the mint CPI so the replay guard holds even if a
/// later step aborts the transaction.
#[allow(clippy::too_many_arguments)]
fn record_claim(
    stub: &mut TicketStub,
    record: &mut TokenRecord,
    config: &mut DropConfig,
    config_key: Pubkey,
    ticket_id: u32,
    token_id: u32,
    rarity: u8,
    recipient: Pubkey,
    asset: Pubkey,
    stub_bump: u8,
    record_bump: u8,
    now: i64,
) {
    stub.scope = config_key;
    stub.ticket_id = ticket_id;
    stub.is_claimed = true;
    stub.recipient = recipient;
    stub.token_id = token_id;
    stub.claimed_at = now;
    stub.bump = stub_bump;

    record.drop_config = config_key;
    record.token_id = token_id;
    record.ticket_id = ticket_id;
    record.original_minter = recipient;
    record.rarity = rarity;
    record.asset = asset;
    record.minted_at = now;
    record.bump = record_bump;

    config.total_claimed += 1;
}
