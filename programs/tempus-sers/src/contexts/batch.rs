use anchor_lang::prelude::*;
use switchboard_on_demand::accounts::RandomnessAccountData;

use crate::contexts::mint_core_asset;
use crate::errors::DropError;
use crate::events::{BaseUriRevealed, BatchAdded, PermanentUri, SeedCommitted, SeedSet, TicketRedeemed};
use crate::state::{
    BatchDrop, DropConfig, TicketStub, TokenRecord, BATCH_DROP_SEED, BATCH_ID_SPAN,
    DROP_CONFIG_SEED, SERS_ASSET_SEED, TICKET_STUB_SEED, TOKEN_RECORD_SEED,
};
use crate::utils::{allowlist_leaf, verify_merkle_proof};
use crate::MPL_CORE_ID;

#[derive(Accounts)]
pub struct AddBatch<'info> {
    #[account(
        mut,
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    /// Batches are appended at the current count, so indices are sequential.
    #[account(
        init,
        payer = authority,
        space = 8 + BatchDrop::INIT_SPACE,
        seeds = [
            BATCH_DROP_SEED,
            drop_config.key().as_ref(),
            &drop_config.batch_count.to_le_bytes(),
        ],
        bump
    )]
    pub batch_drop: Account<'info, BatchDrop>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> AddBatch<'info> {
    pub fn handler(
        ctx: Context<AddBatch>,
        batch_index: u16,
        supply: u32,
        base_uri_commitment: [u8; 32],
        allowlist_root: [u8; 32],
    ) -> Result<()> {
        let config = &mut ctx.accounts.drop_config;

        // Append-only: the caller must name the next sequential index.
        require!(batch_index == config.batch_count, DropError::InvalidBatch);
        // Direct claims and batches are mutually exclusive per drop.
        require!(config.total_claimed == 0, DropError::InvalidBatch);
        require!(
            supply > 0 && supply <= BATCH_ID_SPAN,
            DropError::SupplyExceedsMaximum
        );
        require!(
            config
                .batch_supply_total
                .checked_add(supply)
                .is_some_and(|total| total <= config.max_supply),
            DropError::SupplyExceedsMaximum
        );
        require!(
            base_uri_commitment != [0u8; 32],
            DropError::UriCannotBeEmpty
        );
        require!(allowlist_root != [0u8; 32], DropError::InvalidProof);

        let clock = Clock::get()?;
        let batch = &mut ctx.accounts.batch_drop;
        batch.drop_config = config.key();
        batch.batch_index = config.batch_count;
        batch.supply = supply;
        batch.seed = 0;
        batch.base_uri = String::new();
        batch.base_uri_commitment = base_uri_commitment;
        batch.allowlist_root = allowlist_root;
        batch.pending_randomness = Pubkey::default();
        batch.commit_slot = 0;
        batch.total_claimed = 0;
        batch.created_at = clock.unix_timestamp;
        batch.bump = ctx.bumps.batch_drop;

        config.batch_count += 1;
        config.batch_supply_total += supply;

        emit!(BatchAdded {
            drop_config: config.key(),
            batch_index: batch.batch_index,
            supply,
            timestamp: clock.unix_timestamp,
        });

        msg!("Batch {} added with supply {}", batch.batch_index, supply);
        Ok(())
    }
}

#[derive(Accounts)]
pub struct CommitBatchSeed<'info> {
    #[account(
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(
        mut,
        seeds = [
            BATCH_DROP_SEED,
            drop_config.key().as_ref(),
            &batch_drop.batch_index.to_le_bytes(),
        ],
        bump = batch_drop.bump,
        constraint = batch_drop.drop_config == drop_config.key() @ DropError::InvalidBatch
    )]
    pub batch_drop: Account<'info, BatchDrop>,

    pub authority: Signer<'info>,

    /// CHECK: Switchboard randomness account, validated by parsing its data.
    pub randomness_account: AccountInfo<'info>,
}

impl<'info> CommitBatchSeed<'info> {
    pub fn handler(ctx: Context<CommitBatchSeed>) -> Result<()> {
        let batch = &mut ctx.accounts.batch_drop;

        let clock = Clock::get()?;
        let randomness_data =
            RandomnessAccountData::parse(ctx.accounts.randomness_account.data.borrow())
                .map_err(|_| DropError::InvalidRandomnessAccount)?;

        if randomness_data.seed_slot != clock.slot - 1 {
            return Err(DropError::RandomnessAlreadyRevealed.into());
        }

        // Rejects a re-commit while a draw is outstanding; abandoning is a
        // separate, visible step.
        batch.begin_seed_commit(
            ctx.accounts.randomness_account.key(),
            randomness_data.seed_slot,
        )?;

        emit!(SeedCommitted {
            drop_config: batch.key(),
            randomness_account: batch.pending_randomness,
            commit_slot: batch.commit_slot,
        });

        msg!(
            "Batch {} seed committed at slot {}",
            batch.batch_index,
            batch.commit_slot
        );
        Ok(())
    }
}

#[derive(Accounts)]
pub struct SetBatchSeed<'info> {
    #[account(
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(
        mut,
        seeds = [
            BATCH_DROP_SEED,
            drop_config.key().as_ref(),
            &batch_drop.batch_index.to_le_bytes(),
        ],
        bump = batch_drop.bump,
        constraint = batch_drop.drop_config == drop_config.key() @ DropError::InvalidBatch
    )]
    pub batch_drop: Account<'info, BatchDrop>,

    pub authority: Signer<'info>,

    /// CHECK: Must be the randomness account committed earlier.
    #[account(
        constraint = randomness_account.key() == batch_drop.pending_randomness
            @ DropError::InvalidRandomnessAccount
    )]
    pub randomness_account: AccountInfo<'info>,
}

impl<'info> SetBatchSeed<'info> {
    pub fn handler(ctx: Context<SetBatchSeed>) -> Result<()> {
        let batch = &mut ctx.accounts.batch_drop;
        require!(!batch.is_seeded(), DropError::SeedAlreadySet);
        require!(
            batch.pending_randomness != Pubkey::default(),
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

        batch.clear_seed_commit();

        // Zero doubles as the unset sentinel; a zero draw leaves the batch
        // unseeded and a fresh commit/set round picks a new value.
        if seed == 0 {
            msg!("Randomness drew the sentinel value; commit again");
            return Ok(());
        }

        batch.set_seed_value(seed)?;

        emit!(SeedSet {
            drop_config: batch.key(),
            seed,
            timestamp: clock.unix_timestamp,
        });

        msg!("Batch {} seed set: {}", batch.batch_index, seed);
        Ok(())
    }
}

#[derive(Accounts)]
pub struct AbandonBatchSeedCommit<'info> {
    #[account(
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(
        mut,
        seeds = [
            BATCH_DROP_SEED,
            drop_config.key().as_ref(),
            &batch_drop.batch_index.to_le_bytes(),
        ],
        bump = batch_drop.bump,
        constraint = batch_drop.drop_config == drop_config.key() @ DropError::InvalidBatch
    )]
    pub batch_drop: Account<'info, BatchDrop>,

    pub authority: Signer<'info>,
}

impl<'info> AbandonBatchSeedCommit<'info> {
    pub fn handler(ctx: Context<AbandonBatchSeedCommit>) -> Result<()> {
        let batch = &mut ctx.accounts.batch_drop;
        require!(
            batch.pending_randomness != Pubkey::default(),
            DropError::InvalidRandomnessAccount
        );

        msg!(
            "Abandoning batch {} seed commit to {}",
            batch.batch_index,
            batch.pending_randomness
        );
        batch.clear_seed_commit();
        Ok(())
    }
}

#[derive(Accounts)]
pub struct RevealBatchUri<'info> {
    #[account(
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump,
        has_one = authority @ DropError::Unauthorized
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(
        mut,
        seeds = [
            BATCH_DROP_SEED,
            drop_config.key().as_ref(),
            &batch_drop.batch_index.to_le_bytes(),
        ],
        bump = batch_drop.bump,
        constraint = batch_drop.drop_config == drop_config.key() @ DropError::InvalidBatch
    )]
    pub batch_drop: Account<'info, BatchDrop>,

    pub authority: Signer<'info>,
}

impl<'info> RevealBatchUri<'info> {
    pub fn handler(ctx: Context<RevealBatchUri>, base_uri: String) -> Result<()> {
        let batch = &mut ctx.accounts.batch_drop;
        batch.reveal(base_uri)?;

        emit!(BaseUriRevealed {
            drop_config: batch.key(),
            base_uri: batch.base_uri.clone(),
            timestamp: Clock::get()?.unix_timestamp,
        });

        msg!("Batch {} base URI revealed", batch.batch_index);
        Ok(())
    }
}

#[derive(Accounts)]
#[instruction(ticket_id: u32)]
pub struct ProveBatchTicket<'info> {
    #[account(
        seeds = [DROP_CONFIG_SEED, drop_config.base_uri_commitment.as_ref()],
        bump = drop_config.bump
    )]
    pub drop_config: Account<'info, DropConfig>,

    #[account(
        mut,
        seeds = [
            BATCH_DROP_SEED,
            drop_config.key().as_ref(),
            &batch_drop.batch_index.to_le_bytes(),
        ],
        bump = batch_drop.bump,
        constraint = batch_drop.drop_config == drop_config.key() @ DropError::InvalidBatch
    )]
    pub batch_drop: Account<'info, BatchDrop>,

    /// The allowlisted wallet; the Merkle leaf binds it, so it must sign.
    #[account(mut)]
    pub recipient: Signer<'info>,

    /// Scoped to the batch, so ticket ids are local to it.
    #[account(
        init_if_needed,
        payer = recipient,
        space = 8 + TicketStub::INIT_SPACE,
        seeds = [TICKET_STUB_SEED, batch_drop.key().as_ref(), &ticket_id.to_le_bytes()],
        bump
    )]
    pub ticket_stub: Account<'info, TicketStub>,

    // Token ids are globally namespaced by the batch index, so token-level
    // PDAs stay scoped to the parent drop.
    #[account(
        init,
        payer = recipient,
        space = 8 + TokenRecord::INIT_SPACE,
        seeds = [
            TOKEN_RECORD_SEED,
            drop_config.key().as_ref(),
            &batch_drop.token_id_for(ticket_id).to_le_bytes(),
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
            &batch_drop.token_id_for(ticket_id).to_le_bytes(),
        ],
        bump
    )]
    pub asset: AccountInfo<'info>,

    /// CHECK: MPL Core program
    #[account(address = MPL_CORE_ID)]
    pub mpl_core_program: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> ProveBatchTicket<'info> {
    pub fn handler(
        ctx: Context<ProveBatchTicket>,
        ticket_id: u32,
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let recipient_key = ctx.accounts.recipient.key();
        let config_key = ctx.accounts.drop_config.key();
        let batch_key = ctx.accounts.batch_drop.key();

        let (token_id, uri) = {
            let batch = &ctx.accounts.batch_drop;
            require!(
                !ctx.accounts.ticket_stub.is_claimed,
                DropError::TicketAlreadyClaimed
            );

            let token_id = batch.ticket_to_token_id(ticket_id)?;
            // Claims only open once the batch metadata is resolvable.
            let uri = batch.token_uri(token_id)?;

            let leaf = allowlist_leaf(&recipient_key, ticket_id);
            require!(
                verify_merkle_proof(&proof, &batch.allowlist_root, leaf),
                DropError::InvalidProof
            );
            require!(
                batch.total_claimed < batch.supply,
                DropError::SupplyExceedsMaximum
            );
            (token_id, uri)
        };

        let stub = &mut ctx.accounts.ticket_stub;
        stub.scope = batch_key;
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

        ctx.accounts.batch_drop.total_claimed += 1;

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

        msg!(
            "Batch ticket {} redeemed as token {}",
            ticket_id,
            token_id
        );
        Ok(())
    }
}
