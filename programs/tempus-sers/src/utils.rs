use anchor_lang::prelude::*;
use solana_sdk_ids::ed25519_program;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};
use solana_sha256_hasher::{hash, hashv};

use crate::errors::DropError;

/// Structured signing domain shared by all attestations for this program.
pub const SIGNING_DOMAIN_NAME: &[u8] = b"Tempus Sers";
pub const SIGNING_DOMAIN_VERSION: &[u8] = b"1";

/// Message-type tags. The digest binds the tag so a signature for one message
/// type can never be replayed as another.
pub const REDEEM_TAG: &[u8] = b"redeem";
pub const REDEEM_TO_NAME_TAG: &[u8] = b"redeem_to_name";

/// Hash a base URI to its 32-byte commitment.
pub fn hash_base_uri(uri: &str) -> [u8; 32] {
    hash(uri.as_bytes()).to_bytes()
}

/// Append a trailing separator to a revealed base URI if it is missing.
pub fn normalize_base_uri(mut uri: String) -> String {
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri
}

/// Compute the canonical digest an attestation must sign.
///
/// `recipient_ref` is either the recipient wallet or, for the name-reference
/// message type, the name record key. Binding the reference rather than the
/// resolved address keeps signatures valid across ownership changes of the
/// name record.
pub fn redeem_digest(
    drop_config: &Pubkey,
    tag: &[u8],
    recipient_ref: &Pubkey,
    ticket_id: u32,
    token_id: u32,
    rarity: u8,
) -> [u8; 32] {
    hashv(&[
        SIGNING_DOMAIN_NAME,
        SIGNING_DOMAIN_VERSION,
        crate::ID.as_ref(),
        drop_config.as_ref(),
        tag,
        recipient_ref.as_ref(),
        &ticket_id.to_le_bytes(),
        &token_id.to_le_bytes(),
        &[rarity],
    ])
    .to_bytes()
}

/// Merkle leaf for an allowlist entry.
pub fn allowlist_leaf(recipient: &Pubkey, ticket_id: u32) -> [u8; 32] {
    hashv(&[recipient.as_ref(), &ticket_id.to_le_bytes()]).to_bytes()
}

/// Verify a Merkle inclusion proof with sorted-pair hashing.
pub fn verify_merkle_proof(proof: &[[u8; 32]], root: &[u8; 32], leaf: [u8; 32]) -> bool {
    let mut computed = leaf;
    for node in proof {
        computed = if computed <= *node {
            hashv(&[&computed, node]).to_bytes()
        } else {
            hashv(&[node, &computed]).to_bytes()
        };
    }
    computed == *root
}

const ED25519_HEADER_LEN: usize = 2;
const ED25519_OFFSETS_LEN: usize = 14;
/// "This instruction" marker in the ed25519 offsets table.
const ED25519_SELF_INDEX: u16 = u16::MAX;

fn le_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

/// Verify that the instruction immediately preceding the current one is an
/// ed25519 precompile verification of `expected_signature` by
/// `expected_signer` over `expected_message`.
///
/// The precompile has already checked the signature cryptographically by the
/// time this program runs; introspection only needs to confirm that the
/// verified triple is the one this claim requires.
pub fn verify_ed25519_instruction(
    instructions_sysvar: &AccountInfo,
    expected_signer: &Pubkey,
    expected_message: &[u8],
    expected_signature: &[u8; 64],
) -> Result<()> {
    let current_index = load_current_index_checked(instructions_sysvar)? as usize;
    require!(current_index > 0, DropError::InvalidSignature);

    let ix = load_instruction_at_checked(current_index - 1, instructions_sysvar)?;
    require!(
        ix.program_id == ed25519_program::ID,
        DropError::InvalidSignature
    );
    require!(ix.accounts.is_empty(), DropError::InvalidSignature);

    let data = &ix.data;
    require!(
        data.len() >= ED25519_HEADER_LEN + ED25519_OFFSETS_LEN,
        DropError::InvalidSignature
    );
    // Exactly one signature, no padding tricks.
    require!(data[0] == 1 && data[1] == 0, DropError::InvalidSignature);

    let sig_offset = le_u16(data, 2) as usize;
    let sig_ix_index = le_u16(data, 4);
    let pubkey_offset = le_u16(data, 6) as usize;
    let pubkey_ix_index = le_u16(data, 8);
    let msg_offset = le_u16(data, 10) as usize;
    let msg_size = le_u16(data, 12) as usize;
    let msg_ix_index = le_u16(data, 14);

    // All components must live in the ed25519 instruction itself.
    require!(
        sig_ix_index == ED25519_SELF_INDEX
            && pubkey_ix_index == ED25519_SELF_INDEX
            && msg_ix_index == ED25519_SELF_INDEX,
        DropError::InvalidSignature
    );
    require!(
        sig_offset.checked_add(64).is_some_and(|end| end <= data.len())
            && pubkey_offset.checked_add(32).is_some_and(|end| end <= data.len())
            && msg_offset.checked_add(msg_size).is_some_and(|end| end <= data.len()),
        DropError::InvalidSignature
    );

    require!(
        &data[pubkey_offset..pubkey_offset + 32] == expected_signer.as_ref(),
        DropError::InvalidSignature
    );
    require!(
        &data[sig_offset..sig_offset + 64] == expected_signature.as_ref(),
        DropError::InvalidSignature
    );
    require!(
        &data[msg_offset..msg_offset + msg_size] == expected_message,
        DropError::InvalidSignature
    );

    Ok(())
}

/// Byte range of the owner field in an external name record account
/// (parent 32 bytes, owner 32 bytes, class 32 bytes).
const NAME_RECORD_OWNER_RANGE: std::ops::Range<usize> = 32..64;
const NAME_RECORD_HEADER_LEN: usize = 96;

/// Resolve a name record to the wallet that currently owns it.
///
/// The record must be owned by the name service program configured on the
/// drop; the header layout follows the SPL name service convention.
pub fn resolve_name_owner(
    name_record: &AccountInfo,
    name_service_program: &Pubkey,
) -> Result<Pubkey> {
    require!(
        *name_service_program != Pubkey::default(),
        DropError::InvalidNameRecord
    );
    require!(
        name_record.owner == name_service_program,
        DropError::InvalidNameRecord
    );
    let data = name_record.try_borrow_data()?;
    require!(
        data.len() >= NAME_RECORD_HEADER_LEN,
        DropError::InvalidNameRecord
    );
    let owner = Pubkey::try_from(&data[NAME_RECORD_OWNER_RANGE])
        .map_err(|_| DropError::InvalidNameRecord)?;
    require!(owner != Pubkey::default(), DropError::InvalidRecipient);
    Ok(owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_uri_hash_matches_reveal_input() {
        let uri = "ipfs://QmSersBase/";
        assert_eq!(hash_base_uri(uri), hash(uri.as_bytes()).to_bytes());
        assert_ne!(hash_base_uri(uri), hash_base_uri("ipfs://QmOther/"));
    }

    #[test]
    fn normalize_appends_separator_once() {
        assert_eq!(normalize_base_uri("a/b".to_string()), "a/b/");
        assert_eq!(normalize_base_uri("a/b/".to_string()), "a/b/");
    }

    #[test]
    fn digest_binds_every_field() {
        let config = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let base = redeem_digest(&config, REDEEM_TAG, &recipient, 1, 42, 50);
        assert_eq!(base, redeem_digest(&config, REDEEM_TAG, &recipient, 1, 42, 50));
        assert_ne!(base, redeem_digest(&config, REDEEM_TAG, &recipient, 2, 42, 50));
        assert_ne!(base, redeem_digest(&config, REDEEM_TAG, &recipient, 1, 43, 50));
        assert_ne!(base, redeem_digest(&config, REDEEM_TAG, &recipient, 1, 42, 51));
        assert_ne!(
            base,
            redeem_digest(&config, REDEEM_TO_NAME_TAG, &recipient, 1, 42, 50)
        );
        assert_ne!(
            base,
            redeem_digest(&Pubkey::new_unique(), REDEEM_TAG, &recipient, 1, 42, 50)
        );
    }

    fn pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        if a <= b {
            hashv(&[a, b]).to_bytes()
        } else {
            hashv(&[b, a]).to_bytes()
        }
    }

    #[test]
    fn merkle_proof_accepts_members_and_rejects_others() {
        let wallets: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let leaves: Vec<[u8; 32]> = wallets
            .iter()
            .enumerate()
            .map(|(i, w)| allowlist_leaf(w, i as u32))
            .collect();
        let n01 = pair(&leaves[0], &leaves[1]);
        let n23 = pair(&leaves[2], &leaves[3]);
        let root = pair(&n01, &n23);

        assert!(verify_merkle_proof(&[leaves[1], n23], &root, leaves[0]));
        assert!(verify_merkle_proof(&[leaves[0], n23], &root, leaves[1]));
        assert!(verify_merkle_proof(&[leaves[3], n01], &root, leaves[2]));

        // Wrong ticket id for the same wallet.
        let bad = allowlist_leaf(&wallets[0], 3);
        assert!(!verify_merkle_proof(&[leaves[1], n23], &root, bad));
        // Truncated proof.
        assert!(!verify_merkle_proof(&[leaves[1]], &root, leaves[0]));
        // Empty proof only accepts the root itself.
        assert!(!verify_merkle_proof(&[], &root, leaves[0]));
        assert!(verify_merkle_proof(&[], &root, root));
    }
}
