pub mod batch;
pub mod drop_config;
pub mod token;

pub use batch::{
    decode_token_id, encode_token_id, BatchDrop, BATCH_DROP_SEED, BATCH_ID_BITS, BATCH_ID_SPAN,
};
pub use drop_config::{
    ClaimMode, DropConfig, DROP_CONFIG_SEED, MAX_BASE_URI_LEN, MAX_RARITY,
};
pub use token::{
    TicketStub, TokenRecord, SERS_ASSET_SEED, TICKET_STUB_SEED, TOKEN_RECORD_SEED,
};
