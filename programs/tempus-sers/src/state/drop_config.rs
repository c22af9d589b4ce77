use anchor_lang::prelude::*;

use crate::errors::DropError;
use crate::shuffle::permute;
use crate::utils::{hash_base_uri, normalize_base_uri};

pub const DROP_CONFIG_SEED: &[u8] = b"drop_config";

/// Maximum stored length of a base URI, excluding the appended separator.
pub const MAX_BASE_URI_LEN: usize = 128;

/// Exclusive upper bound for rarity scores; 255 is reserved as a sentinel.
pub const MAX_RARITY: u8 = 255;

/// How claims against this drop are authorized.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace)]
pub enum ClaimMode {
    /// Each claim carries a signature by the configured attestation signer.
    Attestation,
    /// Each claim carries a Merkle membership proof against the stored root.
    Allowlist,
}

/// Top-level drop aggregate. One per deployment, addressed by the base URI
/// commitment so two drops can never share a metadata namespace.
/// PDA seeds: ["drop_config", base_uri_commitment]
#[account]
#[derive(InitSpace)]
pub struct DropConfig {
    /// Operator allowed to set the seed, reveal, and add batches. Transferable.
    pub authority: Pubkey,
    /// Claim authorization mode, fixed at initialization.
    pub claim_mode: ClaimMode,
    /// Signer whose attestations authorize claims (attestation mode).
    pub attestation_signer: Pubkey,
    /// Merkle root of hash(recipient, ticket_id) leaves (allowlist mode).
    pub allowlist_root: [u8; 32],
    /// External name service program for name-reference redemption, or the
    /// default pubkey when disabled.
    pub name_service: Pubkey,
    /// Upper bound on issuable tokens. Immutable.
    pub max_supply: u32,
    /// Shuffle seed; 0 doubles as the unset sentinel.
    pub seed: u32,
    /// Metadata base URI; empty until revealed.
    #[max_len(MAX_BASE_URI_LEN + 1)]
    pub base_uri: String,
    /// sha256 of the base URI, fixed at initialization.
    pub base_uri_commitment: [u8; 32],
    /// Randomness account committed for the pending seed draw.
    pub pending_randomness: Pubkey,
    /// Slot at which the pending randomness was committed.
    pub commit_slot: u64,
    /// Whether an asynchronous VRF seed request is in flight.
    pub seed_request_pending: bool,
    /// Tickets redeemed so far across direct (non-batch) claims.
    pub total_claimed: u32,
    /// Number of batches appended so far.
    pub batch_count: u16,
    /// Sum of batch supplies, bounded by max_supply.
    pub batch_supply_total: u32,
    pub created_at: i64,
    pub bump: u8,
}

impl DropConfig {
    pub fn is_seeded(&self) -> bool {
        self.seed != 0
    }

    pub fn is_revealed(&self) -> bool {
        !self.base_uri.is_empty()
    }

    /// Bind a pending randomness account for the two-phase seed draw. A
    /// re-commit while one is outstanding is rejected; the operator must
    /// abandon the pending commit explicitly, so a revealed draw cannot be
    /// silently discarded and re-rolled.
    pub fn begin_seed_commit(&mut self, randomness_account: Pubkey, slot: u64) -> Result<()> {
        require!(!self.is_seeded(), DropError::SeedAlreadySet);
        require!(!self.seed_request_pending, DropError::SeedRequestPending);
        require!(
            self.pending_randomness == Pubkey::default(),
            DropError::SeedRequestPending
        );
        self.pending_randomness = randomness_account;
        self.commit_slot = slot;
        Ok(())
    }

    pub fn clear_seed_commit(&mut self) {
        self.pending_randomness = Pubkey::default();
        self.commit_slot = 0;
    }

    /// Fix the shuffle seed. Exactly one non-zero write per drop.
    pub fn set_seed_value(&mut self, seed: u32) -> Result<()> {
        require!(!self.is_seeded(), DropError::SeedAlreadySet);
        self.seed = seed;
        Ok(())
    }

    /// Publish the base URI committed at initialization. Once, only after
    /// the seed is fixed, and only for the committed value.
    pub fn reveal(&mut self, base_uri: String) -> Result<()> {
        require!(!self.is_revealed(), DropError::AlreadyRevealed);
        require!(self.is_seeded(), DropError::SeedNotSet);
        require!(!base_uri.is_empty(), DropError::UriCannotBeEmpty);
        require!(base_uri.len() <= MAX_BASE_URI_LEN, DropError::UriCannotBeEmpty);
        require!(
            hash_base_uri(&base_uri) == self.base_uri_commitment,
            DropError::CommitmentMismatch
        );
        self.base_uri = normalize_base_uri(base_uri);
        Ok(())
    }

    /// Derive the canonical token id for a ticket. The mapping is a bijection
    /// over [0, max_supply) for the stored seed.
    pub fn ticket_to_token_id(&self, ticket_id: u32) -> Result<u32> {
        require!(self.is_seeded(), DropError::SeedNotSet);
        require!(ticket_id < self.max_supply, DropError::InvalidTicketId);
        Ok(permute(ticket_id, self.max_supply, self.seed))
    }

    /// Infallible variant of [`Self::ticket_to_token_id`] for use in PDA seed
    /// expressions, where no error path exists. Out-of-domain inputs map to
    /// `u32::MAX`, an id no seeded drop can produce; the handler re-derives
    /// with proper errors before anything is persisted.
    pub fn token_id_for(&self, ticket_id: u32) -> u32 {
        if !self.is_seeded() || ticket_id >= self.max_supply {
            return u32::MAX;
        }
        permute(ticket_id, self.max_supply, self.seed)
    }

    /// Final metadata locator for a plain token.
    pub fn token_uri(&self, token_id: u32) -> Result<String> {
        require!(self.is_revealed(), DropError::NotRevealedYet);
        Ok(format!("{}{}.json", self.base_uri, token_id))
    }

    /// Final metadata locator for a token with a rarity score.
    pub fn token_uri_with_rarity(&self, token_id: u32, rarity: u8) -> Result<String> {
        require!(self.is_revealed(), DropError::NotRevealedYet);
        Ok(format!("{}{}_r{}.json", self.base_uri, token_id, rarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u32, base_uri: &str) -> DropConfig {
        DropConfig {
            authority: Pubkey::new_unique(),
            claim_mode: ClaimMode::Attestation,
            attestation_signer: Pubkey::new_unique(),
            allowlist_root: [0; 32],
            name_service: Pubkey::default(),
            max_supply: 11111,
            seed,
            base_uri: base_uri.to_string(),
            base_uri_commitment: [1; 32],
            pending_randomness: Pubkey::default(),
            commit_slot: 0,
            seed_request_pending: false,
            total_claimed: 0,
            batch_count: 0,
            batch_supply_total: 0,
            created_at: 0,
            bump: 255,
        }
    }

    #[test]
    fn ticket_mapping_requires_seed() {
        let unseeded = config(0, "");
        assert!(unseeded.ticket_to_token_id(1).is_err());

        let seeded = config(0x2a, "");
        assert_eq!(seeded.ticket_to_token_id(1).unwrap(), 2599);
        // Recomputation is idempotent.
        assert_eq!(
            seeded.ticket_to_token_id(1).unwrap(),
            seeded.ticket_to_token_id(1).unwrap()
        );
    }

    #[test]
    fn ticket_range_is_zero_indexed_exclusive() {
        let seeded = config(7, "");
        assert!(seeded.ticket_to_token_id(0).is_ok());
        assert!(seeded.ticket_to_token_id(11110).is_ok());
        assert!(seeded.ticket_to_token_id(11111).is_err());
    }

    #[test]
    fn seed_writes_exactly_once() {
        let mut c = config(0, "");
        c.set_seed_value(7).unwrap();
        assert_eq!(
            c.set_seed_value(9).unwrap_err(),
            DropError::SeedAlreadySet.into()
        );
        assert_eq!(c.seed, 7);
    }

    #[test]
    fn commit_rejects_recommit_until_abandoned() {
        let mut c = config(0, "");
        let first = Pubkey::new_unique();
        c.begin_seed_commit(first, 100).unwrap();
        assert_eq!(c.pending_randomness, first);
        assert_eq!(c.commit_slot, 100);

        // The operator cannot swap randomness accounts mid-draw.
        assert_eq!(
            c.begin_seed_commit(Pubkey::new_unique(), 101).unwrap_err(),
            DropError::SeedRequestPending.into()
        );

        c.clear_seed_commit();
        c.begin_seed_commit(Pubkey::new_unique(), 102).unwrap();

        // And not at all once the seed is fixed.
        c.clear_seed_commit();
        c.set_seed_value(7).unwrap();
        assert_eq!(
            c.begin_seed_commit(Pubkey::new_unique(), 103).unwrap_err(),
            DropError::SeedAlreadySet.into()
        );
    }

    #[test]
    fn reveal_checks_commitment_and_runs_once() {
        let uri = "ipfs://QmSersBase";
        let mut c = config(7, "");
        c.base_uri_commitment = hash_base_uri(uri);

        assert_eq!(
            c.reveal("ipfs://QmWrong".to_string()).unwrap_err(),
            DropError::CommitmentMismatch.into()
        );
        assert!(!c.is_revealed());

        c.reveal(uri.to_string()).unwrap();
        assert_eq!(c.base_uri, "ipfs://QmSersBase/");

        assert_eq!(
            c.reveal(uri.to_string()).unwrap_err(),
            DropError::AlreadyRevealed.into()
        );
    }

    #[test]
    fn reveal_requires_seed() {
        let uri = "ipfs://QmSersBase/";
        let mut c = config(0, "");
        c.base_uri_commitment = hash_base_uri(uri);
        assert_eq!(
            c.reveal(uri.to_string()).unwrap_err(),
            DropError::SeedNotSet.into()
        );
    }

    #[test]
    fn lossy_derivation_matches_fallible_in_domain() {
        let seeded = config(0x2a, "");
        assert_eq!(
            seeded.token_id_for(1),
            seeded.ticket_to_token_id(1).unwrap()
        );
        // Out-of-domain inputs map to the impossible id.
        assert_eq!(seeded.token_id_for(11111), u32::MAX);
        assert_eq!(config(0, "").token_id_for(1), u32::MAX);
    }

    #[test]
    fn uri_formats() {
        let hidden = config(1, "");
        assert!(hidden.token_uri(3).is_err());
        assert!(hidden.token_uri_with_rarity(3, 50).is_err());

        let revealed = config(1, "ipfs://QmSers/");
        assert_eq!(revealed.token_uri(3).unwrap(), "ipfs://QmSers/3.json");
        assert_eq!(
            revealed.token_uri_with_rarity(3, 50).unwrap(),
            "ipfs://QmSers/3_r50.json"
        );
    }
}
