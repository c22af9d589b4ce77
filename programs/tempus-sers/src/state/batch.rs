use anchor_lang::prelude::*;

use crate::errors::DropError;
use crate::shuffle::permute;
use crate::state::drop_config::MAX_BASE_URI_LEN;
use crate::utils::{hash_base_uri, normalize_base_uri};

pub const BATCH_DROP_SEED: &[u8] = b"batch_drop";

/// Width of the per-batch id space. Token ids namespace the batch index into
/// the high bits: id = (batch << 16) | local_id.
pub const BATCH_ID_BITS: u32 = 16;
pub const BATCH_ID_SPAN: u32 = 1 << BATCH_ID_BITS;

/// One sub-collection of a multi-batch drop, with its own supply cap, seed,
/// reveal state, and claimed set.
/// PDA seeds: ["batch_drop", drop_config, batch_index_le]
#[account]
#[derive(InitSpace)]
pub struct BatchDrop {
    /// Parent drop config.
    pub drop_config: Pubkey,
    /// Sequential index of this batch, assigned append-only.
    pub batch_index: u16,
    /// Supply cap of this batch; at most BATCH_ID_SPAN.
    pub supply: u32,
    /// Shuffle seed for this batch; 0 doubles as the unset sentinel.
    pub seed: u32,
    /// Metadata base URI for this batch; empty until revealed.
    #[max_len(MAX_BASE_URI_LEN + 1)]
    pub base_uri: String,
    /// sha256 of the batch base URI, fixed when the batch is added.
    pub base_uri_commitment: [u8; 32],
    /// Merkle root authorizing this batch's claims.
    pub allowlist_root: [u8; 32],
    /// Randomness account committed for the pending seed draw.
    pub pending_randomness: Pubkey,
    /// Slot at which the pending randomness was committed.
    pub commit_slot: u64,
    /// Tickets redeemed from this batch so far.
    pub total_claimed: u32,
    pub created_at: i64,
    pub bump: u8,
}

impl BatchDrop {
    pub fn is_seeded(&self) -> bool {
        self.seed != 0
    }

    pub fn is_revealed(&self) -> bool {
        !self.base_uri.is_empty()
    }

    /// Bind a pending randomness account. Re-commits while one is
    /// outstanding are rejected; the operator abandons explicitly.
    pub fn begin_seed_commit(&mut self, randomness_account: Pubkey, slot: u64) -> Result<()> {
        require!(!self.is_seeded(), DropError::SeedAlreadySet);
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

    /// Fix the batch seed. Exactly one non-zero write per batch.
    pub fn set_seed_value(&mut self, seed: u32) -> Result<()> {
        require!(!self.is_seeded(), DropError::SeedAlreadySet);
        self.seed = seed;
        Ok(())
    }

    /// Publish the batch base URI committed when the batch was added.
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

    /// Derive the global token id for a ticket local to this batch.
    pub fn ticket_to_token_id(&self, ticket_id: u32) -> Result<u32> {
        require!(self.is_seeded(), DropError::SeedNotSet);
        require!(ticket_id < self.supply, DropError::InvalidTicketId);
        let local = permute(ticket_id, self.supply, self.seed);
        Ok(encode_token_id(self.batch_index, local))
    }

    /// Infallible variant of [`Self::ticket_to_token_id`] for PDA seed
    /// expressions. Out-of-domain inputs map to `u32::MAX`; the handler
    /// re-derives with proper errors before anything is persisted.
    pub fn token_id_for(&self, ticket_id: u32) -> u32 {
        if !self.is_seeded() || ticket_id >= self.supply {
            return u32::MAX;
        }
        encode_token_id(self.batch_index, permute(ticket_id, self.supply, self.seed))
    }

    pub fn token_uri(&self, token_id: u32) -> Result<String> {
        require!(self.is_revealed(), DropError::NotRevealedYet);
        Ok(format!("{}{}.json", self.base_uri, token_id))
    }
}

/// Namespace a batch-local id into the flat token id space.
pub fn encode_token_id(batch_index: u16, local_id: u32) -> u32 {
    debug_assert!(local_id < BATCH_ID_SPAN);
    ((batch_index as u32) << BATCH_ID_BITS) | local_id
}

/// Recover the owning batch and local id from a flat token id.
pub fn decode_token_id(token_id: u32) -> (u16, u32) {
    (
        (token_id >> BATCH_ID_BITS) as u16,
        token_id & (BATCH_ID_SPAN - 1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_namespacing_round_trips() {
        for &(batch, local) in &[(0u16, 0u32), (0, 65535), (1, 0), (7, 4242), (u16::MAX, 1)] {
            let id = encode_token_id(batch, local);
            assert_eq!(decode_token_id(id), (batch, local));
        }
    }

    #[test]
    fn batches_never_overlap() {
        // Any two distinct (batch, local) pairs produce distinct ids.
        assert_ne!(encode_token_id(0, 1), encode_token_id(1, 1));
        assert_ne!(encode_token_id(1, 0), encode_token_id(0, BATCH_ID_SPAN - 1));
    }

    fn batch(seed: u32) -> BatchDrop {
        BatchDrop {
            drop_config: Pubkey::new_unique(),
            batch_index: 2,
            supply: 3333,
            seed,
            base_uri: String::new(),
            base_uri_commitment: [9; 32],
            allowlist_root: [3; 32],
            pending_randomness: Pubkey::default(),
            commit_slot: 0,
            total_claimed: 0,
            created_at: 0,
            bump: 254,
        }
    }

    #[test]
    fn batch_mapping_lands_in_own_namespace() {
        let b = batch(7);
        let id = b.ticket_to_token_id(42).unwrap();
        let (owner, local) = decode_token_id(id);
        assert_eq!(owner, 2);
        assert_eq!(local, 755);
        assert!(b.ticket_to_token_id(3333).is_err());
        assert!(batch(0).ticket_to_token_id(42).is_err());
    }

    #[test]
    fn lossy_derivation_matches_fallible_in_domain() {
        let b = batch(7);
        assert_eq!(b.token_id_for(42), b.ticket_to_token_id(42).unwrap());
        assert_eq!(b.token_id_for(3333), u32::MAX);
        assert_eq!(batch(0).token_id_for(42), u32::MAX);
    }

    #[test]
    fn batch_seed_and_reveal_follow_the_drop_state_machine() {
        let uri = "ipfs://QmBatchTwo";
        let mut b = batch(0);
        b.base_uri_commitment = hash_base_uri(uri);

        b.begin_seed_commit(Pubkey::new_unique(), 50).unwrap();
        assert_eq!(
            b.begin_seed_commit(Pubkey::new_unique(), 51).unwrap_err(),
            DropError::SeedRequestPending.into()
        );
        b.clear_seed_commit();

        assert_eq!(
            b.reveal(uri.to_string()).unwrap_err(),
            DropError::SeedNotSet.into()
        );

        b.set_seed_value(7).unwrap();
        assert_eq!(
            b.set_seed_value(9).unwrap_err(),
            DropError::SeedAlreadySet.into()
        );

        assert_eq!(
            b.reveal("ipfs://QmWrong".to_string()).unwrap_err(),
            DropError::CommitmentMismatch.into()
        );
        b.reveal(uri.to_string()).unwrap();
        assert_eq!(b.base_uri, "ipfs://QmBatchTwo/");
        assert_eq!(
            b.reveal(uri.to_string()).unwrap_err(),
            DropError::AlreadyRevealed.into()
        );
    }
}
