use anchor_lang::prelude::*;

pub mod contexts;
pub mod errors;
pub mod events;
pub mod shuffle;
pub mod state;
pub mod utils;

use contexts::*;
use state::ClaimMode;

pub use mpl_core::ID as MPL_CORE_ID;

declare_id!("6VgTfXgGLzb1kkKYm33cvqVGmRVwNxhzzQpwstG2KFmH");

#[program]
pub mod tempus_sers {
    use super::*;

    // ============================================
    // DROP LIFECYCLE
    // ============================================

    /// Create a drop. The base URI commitment is fixed forever; attestation
    /// drops publish the URI immediately, allowlist drops reveal it later.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_drop(
        ctx: Context<InitializeDrop>,
        base_uri_commitment: [u8; 32],
        max_supply: u32,
        claim_mode: ClaimMode,
        attestation_signer: Pubkey,
        allowlist_root: [u8; 32],
        base_uri: String,
        name_service: Pubkey,
    ) -> Result<()> {
        InitializeDrop::handler(
            ctx,
            base_uri_commitment,
            max_supply,
            claim_mode,
            attestation_signer,
            allowlist_root,
            base_uri,
            name_service,
        )
    }

    /// Hand the drop to a new operator.
    pub fn transfer_authority(
        ctx: Context<TransferAuthority>,
        new_authority: Pubkey,
    ) -> Result<()> {
        TransferAuthority::handler(ctx, new_authority)
    }

    // ============================================
    // SEED
    // ============================================

    /// Bind the drop to a Switchboard randomness account before its value is
    /// known.
    pub fn commit_seed(ctx: Context<CommitSeed>) -> Result<()> {
        CommitSeed::handler(ctx)
    }

    /// Read the revealed randomness and fix the shuffle seed.
    pub fn set_seed(ctx: Context<SetSeed>) -> Result<()> {
        SetSeed::handler(ctx)
    }

    /// Walk away from an outstanding randomness commit without setting the
    /// seed. Explicit so a discarded draw leaves a visible trace.
    pub fn abandon_seed_commit(ctx: Context<AbandonSeedCommit>) -> Result<()> {
        AbandonSeedCommit::handler(ctx)
    }

    /// Request a seed from the VRF oracle; the callback fixes it.
    pub fn request_seed(ctx: Context<RequestSeed>) -> Result<()> {
        RequestSeed::handler(ctx)
    }

    /// VRF oracle callback. Only the oracle identity can invoke this.
    pub fn fulfill_seed(ctx: Context<FulfillSeed>, randomness: [u8; 32]) -> Result<()> {
        FulfillSeed::handler(ctx, randomness)
    }

    // ============================================
    // REVEAL
    // ============================================

    /// Publish the base URI committed at initialization.
    pub fn reveal_base_uri(ctx: Context<RevealBaseUri>, base_uri: String) -> Result<()> {
        RevealBaseUri::handler(ctx, base_uri)
    }

    // ============================================
    // CLAIMS
    // ============================================

    /// Redeem a ticket with a signed attestation; mints directly to the
    /// attested wallet.
    pub fn redeem_ticket(
        ctx: Context<RedeemTicket>,
        ticket_id: u32,
        token_id: u32,
        rarity: u8,
        signature: [u8; 64],
    ) -> Result<()> {
        RedeemTicket::handler(ctx, ticket_id, token_id, rarity, signature)
    }

    /// Redeem a ticket attested to a name record; mints to whoever owns the
    /// record at claim time.
    pub fn redeem_ticket_to_name(
        ctx: Context<RedeemTicketToName>,
        ticket_id: u32,
        token_id: u32,
        rarity: u8,
        signature: [u8; 64],
    ) -> Result<()> {
        RedeemTicketToName::handler(ctx, ticket_id, token_id, rarity, signature)
    }

    /// Redeem a ticket with a Merkle allowlist proof.
    pub fn prove_ticket(
        ctx: Context<ProveTicket>,
        ticket_id: u32,
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        ProveTicket::handler(ctx, ticket_id, proof)
    }

    // ============================================
    // BATCHES
    // ============================================

    /// Append a batch with its own supply, commitment, and allowlist.
    pub fn add_batch(
        ctx: Context<AddBatch>,
        batch_index: u16,
        supply: u32,
        base_uri_commitment: [u8; 32],
        allowlist_root: [u8; 32],
    ) -> Result<()> {
        AddBatch::handler(ctx, batch_index, supply, base_uri_commitment, allowlist_root)
    }

    pub fn commit_batch_seed(ctx: Context<CommitBatchSeed>) -> Result<()> {
        CommitBatchSeed::handler(ctx)
    }

    pub fn set_batch_seed(ctx: Context<SetBatchSeed>) -> Result<()> {
        SetBatchSeed::handler(ctx)
    }

    pub fn abandon_batch_seed_commit(ctx: Context<AbandonBatchSeedCommit>) -> Result<()> {
        AbandonBatchSeedCommit::handler(ctx)
    }

    pub fn reveal_batch_uri(ctx: Context<RevealBatchUri>, base_uri: String) -> Result<()> {
        RevealBatchUri::handler(ctx, base_uri)
    }

    pub fn prove_batch_ticket(
        ctx: Context<ProveBatchTicket>,
        ticket_id: u32,
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        ProveBatchTicket::handler(ctx, ticket_id, proof)
    }
}
