use anchor_lang::prelude::*;

#[error_code]
pub enum DropError {
    #[msg("Unauthorized")]
    Unauthorized,

    // Sequencing errors
    #[msg("Seed has already been set")]
    SeedAlreadySet,
    #[msg("Seed is not set yet")]
    SeedNotSet,
    #[msg("Base URI has already been revealed")]
    AlreadyRevealed,
    #[msg("Revealed URI does not match the stored commitment")]
    CommitmentMismatch,
    #[msg("Base URI is not revealed yet")]
    NotRevealedYet,
    #[msg("Batch index must be the next sequential index")]
    InvalidBatch,

    // Validation errors
    #[msg("Ticket id outside the valid range")]
    InvalidTicketId,
    #[msg("Rarity score outside the valid range")]
    InvalidRarityScore,
    #[msg("Recipient cannot be the default address")]
    InvalidRecipient,
    #[msg("Supplied token id does not match the derived token id")]
    InvalidTicketTokenPair,
    #[msg("Supply would exceed the maximum")]
    SupplyExceedsMaximum,
    #[msg("URI or commitment cannot be empty")]
    UriCannotBeEmpty,
    #[msg("Instruction not available in this claim mode")]
    InvalidClaimMode,

    // Authorization errors
    #[msg("Invalid signature")]
    InvalidSignature,
    #[msg("Invalid proof")]
    InvalidProof,

    // Replay guard
    #[msg("Ticket has already been claimed")]
    TicketAlreadyClaimed,

    // Randomness sourcing errors
    #[msg("Invalid randomness account")]
    InvalidRandomnessAccount,
    #[msg("Randomness has already been revealed")]
    RandomnessAlreadyRevealed,
    #[msg("Randomness not yet resolved")]
    RandomnessNotResolved,
    #[msg("A seed request is already pending")]
    SeedRequestPending,

    // Name resolution errors
    #[msg("Invalid name record account")]
    InvalidNameRecord,
}
