use anchor_lang::prelude::*;

pub const TICKET_STUB_SEED: &[u8] = b"ticket_stub";
pub const TOKEN_RECORD_SEED: &[u8] = b"token_record";
pub const SERS_ASSET_SEED: &[u8] = b"sers_asset";

/// Replay guard for one ticket. The claimed flag flips exactly once; the
/// account is created on first touch and never closed.
/// PDA seeds: ["ticket_stub", drop_config_or_batch, ticket_id_le]
#[account]
#[derive(InitSpace)]
pub struct TicketStub {
    /// Drop config (direct claims) or batch drop (batch claims) this ticket
    /// belongs to.
    pub scope: Pubkey,
    pub ticket_id: u32,
    pub is_claimed: bool,
    /// Wallet the token was issued to.
    pub recipient: Pubkey,
    /// Token id the ticket resolved to.
    pub token_id: u32,
    pub claimed_at: i64,
    pub bump: u8,
}

/// Provenance record for one minted token. Created exactly once per token id;
/// absence of the account is the defined "unminted" sentinel.
/// PDA seeds: ["token_record", drop_config, token_id_le]
#[account]
#[derive(InitSpace)]
pub struct TokenRecord {
    pub drop_config: Pubkey,
    pub token_id: u32,
    /// Ticket that resolved to this token.
    pub ticket_id: u32,
    /// First owner; never overwritten, survives transfers as provenance.
    pub original_minter: Pubkey,
    /// Rarity score recorded at mint (attestation mode), 0 otherwise.
    pub rarity: u8,
    /// The Core asset carrying ownership.
    pub asset: Pubkey,
    pub minted_at: i64,
    pub bump: u8,
}
