use anchor_lang::prelude::*;

#[event]
pub struct SeedCommitted {
    pub drop_config: Pubkey,
    pub randomness_account: Pubkey,
    pub commit_slot: u64,
}

#[event]
pub struct SeedRequested {
    pub drop_config: Pubkey,
    pub oracle_queue: Pubkey,
}

#[event]
pub struct SeedSet {
    pub drop_config: Pubkey,
    pub seed: u32,
    pub timestamp: i64,
}

#[event]
pub struct BaseUriRevealed {
    pub drop_config: Pubkey,
    pub base_uri: String,
    pub timestamp: i64,
}

#[event]
pub struct TicketRedeemed {
    pub drop_config: Pubkey,
    pub recipient: Pubkey,
    pub ticket_id: u32,
    pub token_id: u32,
    pub rarity: u8,
    pub timestamp: i64,
}

/// Emitted once per successful mint. The URI is final: the base URI is
/// immutable after reveal and the token id mapping is fixed by the seed.
#[event]
pub struct PermanentUri {
    pub uri: String,
    pub token_id: u32,
}

#[event]
pub struct BatchAdded {
    pub drop_config: Pubkey,
    pub batch_index: u16,
    pub supply: u32,
    pub timestamp: i64,
}

#[event]
pub struct AuthorityTransferred {
    pub drop_config: Pubkey,
    pub previous_authority: Pubkey,
    pub new_authority: Pubkey,
}
