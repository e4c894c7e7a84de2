use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::IntegerCodec;

use super::{FieldTable, Model};

/// Progress object returned by `eth_syncing` while the node is syncing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub starting_block: Option<u64>,
    pub current_block: Option<u64>,
    pub highest_block: Option<u64>,
    pub known_states: Option<u64>,
    pub pulled_states: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncStatus {
    /// Blocks left until `highestBlock`.
    pub fn remaining(&self) -> Option<u64> {
        Some(self.highest_block?.saturating_sub(self.current_block?))
    }
}

impl Model for SyncStatus {
    const NAME: &'static str = "sync status";

    fn build_field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .codec("startingBlock", IntegerCodec, |s| &mut s.starting_block)
            .codec("currentBlock", IntegerCodec, |s| &mut s.current_block)
            .codec("highestBlock", IntegerCodec, |s| &mut s.highest_block)
            .codec("knownStates", IntegerCodec, |s| &mut s.known_states)
            .codec("pulledStates", IntegerCodec, |s| &mut s.pulled_states)
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<SyncStatus>> = OnceLock::new();
        TABLE.get_or_init(Self::build_field_table)
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}
