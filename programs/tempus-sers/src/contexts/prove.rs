use anchor_lang::prelude::*;

use crate::contexts::mint_core_asset;
use crate::errors::DropError;
use crate::events::{PermanentUri, TicketRedeemed};
use crate::state::{
    ClaimMode, DropConfig, TicketStub, TokenRecord, DROP_CONFIG_SEED, SERS_ASSET_SEED,
    TICKET_STUB_SEED, TOKEN_RECORD_SEED,
};
use crate::utils::{allowlist_leaf, verify_merkle_proof};
use crate::MPL_CORE_ID;

#[derive(Accounts)]
#[instruction(ticket_id: u32)]
pub struct ProveTicket<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump
    )]
    pub drop_config: Account<'info, DropConfig>,

    /// The allowlisted wallet; the Merkle leaf binds it, so it must sign.
    #[account(mut)]
    pub recipient: Signer<'info>,

    #[account(
        init_if_needed,
        payer = recipient,
        space = 8 + TicketStub::INIT_SPACE,
        seeds = [TICKET_STUB_SEED, drop_config.key().as_ref(), &ticket_id.to_le_bytes()],
        bump
    )]
    pub ticket_stub: Account<'info, TicketStub>,

    // The token id is derived, not an argument; the lossy form used in seeds
    // maps invalid inputs to an id no seeded drop produces, and the handler
    // re-derives with proper errors before anything is persisted.
    #[account(
        init,
        payer = recipient,
        space = 8 + TokenRecord::INIT_SPACE,
        seeds = [
            TOKEN_RECORD_SEED,
            drop_config.key().as_ref(),
            &drop_config.token_id_for(ticket_id).to_le_bytes(),
        ],
        bump
    )]
    pub token_record: Account<'info, TokenRecord>,

    /// CHECK: Core asset to create, PDA over (drop config, token id).
    #[account(
        mut,
        seeds = [
            SERS_ASSET_SEED,
            drop_config.key().as_ref(),
            &drop_config.token_id_for(ticket_id).to_le_bytes(),
        ],
        bump
    )]
    pub asset: AccountInfo<'info>,

    /// CHECK: MPL Core program
    #[account(address = MPL_CORE_ID)]
    pub mpl_core_program: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> ProveTicket<'info> {
    pub fn handler(
        ctx: Context<ProveTicket>,
        ticket_id: u32,
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let recipient_key = ctx.accounts.recipient.key();
        let config_key = ctx.accounts.drop_config.key();

        let (token_id, uri) = {
            let config = &ctx.accounts.drop_config;
            require!(
                config.claim_mode == ClaimMode::Allowlist,
                DropError::InvalidClaimMode
            );
            // Direct claims and batches are mutually exclusive per drop.
            require!(config.batch_count == 0, DropError::InvalidBatch);
            require!(
                !ctx.accounts.ticket_stub.is_claimed,
                DropError::TicketAlreadyClaimed
            );

            let token_id = config.ticket_to_token_id(ticket_id)?;
            // Claims only open once the metadata is resolvable.
            let uri = config.token_uri(token_id)?;

            let leaf = allowlist_leaf(&recipient_key, ticket_id);
            require!(
                verify_merkle_proof(&proof, &config.allowlist_root, leaf),
                DropError::InvalidProof
            );
            require!(
                config.total_claimed < config.max_supply,
                DropError::SupplyExceedsMaximum
            );
            (token_id, uri)
        };

        let stub = &mut ctx.accounts.ticket_stub;
        stub.scope = config_key;
        stub.ticket_id = ticket_id;
        stub.is_claimed = true;
        stub.recipient = recipient_key;
        stub.token_id = token_id;
        stub.claimed_at = clock.unix_timestamp;
        stub.bump = ctx.bumps.ticket_stub;

        let record = &mut ctx.accounts.token_record;
        record.drop_config = config_key;
        record.token_id = token_id;
        record.ticket_id = ticket_id;
        record.original_minter = recipient_key;
        record.rarity = 0;
        record.asset = ctx.accounts.asset.key();
        record.minted_at = clock.unix_timestamp;
        record.bump = ctx.bumps.token_record;

        ctx.accounts.drop_config.total_claimed += 1;

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
            &ctx.accounts.recipient.to_account_info(),
            &ctx.accounts.recipient.to_account_info(),
            &ctx.accounts.system_program.to_account_info(),
            format!("Sers #{}", token_id),
            uri.clone(),
            asset_seeds,
        )?;

        emit!(TicketRedeemed {
            drop_config: config_key,
            recipient: recipient_key,
            ticket_id,
            token_id,
            rarity: 0,
            timestamp: clock.unix_timestamp,
        });
        emit!(PermanentUri { uri, token_id });

        msg!("Ticket {} proven and redeemed as token {}", ticket_id, token_id);
        Ok(())
    }
}
