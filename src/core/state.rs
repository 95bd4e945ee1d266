//! The shared game state mutated by event handlers.
//!
//! There is exactly one `GameState` per game. Event handlers mutate it in
//! place; safety against mid-batch invalidation comes from the window
//! pipeline's strict phase ordering and repeated condition re-checks, not
//! from isolation or transactions.
//!
//! The engine keeps the state deliberately generic: per-player and global
//! counters are string-keyed `i64` values (booleans as 0/1, entity
//! references as raw IDs), card locations are a hand/deck/in-play split, and
//! everything else belongs to the embedding game.
//!
//! Uses `im` persistent structures where history grows unboundedly, so
//! cloning a state for a speculative rollback stays cheap.

use im::{HashSet as ImHashSet, Vector};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;

/// Record of an executed event, appended to the state history at the
/// execute phase. Useful for logging, UI replay, and "this turn" triggers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name as registered on the event.
    pub name: String,
    /// Turn the event executed on.
    pub turn: u32,
    /// Player associated with the event, if any.
    pub player: Option<PlayerId>,
}

/// Complete game state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    player_count: usize,

    /// Turn number (starts at 1).
    pub turn_number: u32,

    /// Per-player counters (honor, fate, life...) - games define keys.
    player_state: PlayerMap<FxHashMap<String, i64>>,

    /// Global counters shared by all players.
    global_state: FxHashMap<String, i64>,

    /// Entities currently in play.
    in_play: ImHashSet<EntityId>,

    /// Private hands per player.
    hands: PlayerMap<Vec<EntityId>>,

    /// Private decks per player (top = end of vec).
    decks: PlayerMap<Vec<EntityId>>,

    /// Executed-event history.
    history: Vector<EventRecord>,

    /// Deterministic RNG.
    pub rng: GameRng,

    /// Next entity ID to allocate.
    next_entity_id: u32,
}

impl GameState {
    /// Create a new game state.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");

        Self {
            player_count,
            turn_number: 1,
            player_state: PlayerMap::with_default(player_count),
            global_state: FxHashMap::default(),
            in_play: ImHashSet::new(),
            hands: PlayerMap::with_default(player_count),
            decks: PlayerMap::with_default(player_count),
            history: Vector::new(),
            rng: GameRng::new(seed),
            next_entity_id: 0,
        }
    }

    /// Get player count.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Iterate over all player IDs.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// Allocate a new entity ID.
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    // === Player State ===

    /// Get a player state value with default.
    #[must_use]
    pub fn get_player_state(&self, player: PlayerId, key: &str, default: i64) -> i64 {
        self.player_state[player].get(key).copied().unwrap_or(default)
    }

    /// Set a player state value.
    pub fn set_player_state(&mut self, player: PlayerId, key: impl Into<String>, value: i64) {
        self.player_state[player].insert(key.into(), value);
    }

    /// Modify a player state value by delta.
    pub fn modify_player_state(&mut self, player: PlayerId, key: &str, delta: i64) {
        let current = self.get_player_state(player, key, 0);
        self.player_state[player].insert(key.to_string(), current + delta);
    }

    // === Global State ===

    /// Get a global state value with default.
    #[must_use]
    pub fn get_global(&self, key: &str, default: i64) -> i64 {
        self.global_state.get(key).copied().unwrap_or(default)
    }

    /// Set a global state value.
    pub fn set_global(&mut self, key: impl Into<String>, value: i64) {
        self.global_state.insert(key.into(), value);
    }

    /// Modify a global state value by delta.
    pub fn modify_global(&mut self, key: &str, delta: i64) {
        let current = self.get_global(key, 0);
        self.global_state.insert(key.to_string(), current + delta);
    }

    // === Play Area ===

    /// Put an entity into play.
    pub fn put_into_play(&mut self, entity: EntityId) {
        self.in_play.insert(entity);
    }

    /// Remove an entity from play.
    ///
    /// Returns true if the entity was in play.
    pub fn leave_play(&mut self, entity: EntityId) -> bool {
        self.in_play.remove(&entity).is_some()
    }

    /// Check whether an entity is in play.
    #[must_use]
    pub fn is_in_play(&self, entity: EntityId) -> bool {
        self.in_play.contains(&entity)
    }

    /// Number of entities in play.
    #[must_use]
    pub fn in_play_count(&self) -> usize {
        self.in_play.len()
    }

    // === Hands & Decks ===

    /// Get a player's hand.
    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &[EntityId] {
        &self.hands[player]
    }

    /// Add a card to a player's hand.
    pub fn add_to_hand(&mut self, player: PlayerId, card: EntityId) {
        self.hands[player].push(card);
    }

    /// Remove a card from a player's hand.
    ///
    /// Returns true if the card was found and removed.
    pub fn remove_from_hand(&mut self, player: PlayerId, card: EntityId) -> bool {
        if let Some(pos) = self.hands[player].iter().position(|&c| c == card) {
            self.hands[player].remove(pos);
            true
        } else {
            false
        }
    }

    /// Set a player's deck.
    pub fn set_deck(&mut self, player: PlayerId, deck: Vec<EntityId>) {
        self.decks[player] = deck;
    }

    /// Get deck size.
    #[must_use]
    pub fn deck_size(&self, player: PlayerId) -> usize {
        self.decks[player].len()
    }

    /// Draw a card from a player's deck to hand.
    ///
    /// Returns the drawn card, or None if the deck is empty.
    pub fn draw_card(&mut self, player: PlayerId) -> Option<EntityId> {
        let card = self.decks[player].pop()?;
        self.add_to_hand(player, card);
        Some(card)
    }

    /// Shuffle a player's deck.
    pub fn shuffle_deck(&mut self, player: PlayerId) {
        let deck = std::mem::take(&mut self.decks[player]);
        let mut deck = deck;
        self.rng.shuffle(&mut deck);
        self.decks[player] = deck;
    }

    // === History ===

    /// Append an executed event to the history.
    pub fn record_event(&mut self, record: EventRecord) {
        self.history.push_back(record);
    }

    /// Executed-event history, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<EventRecord> {
        &self.history
    }

    /// Advance to the next turn.
    pub fn advance_turn(&mut self) {
        self.turn_number += 1;
    }

    // === Checkpointing ===

    /// Serialize the full state to bytes.
    pub fn snapshot(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    /// Restore a state from a snapshot.
    pub fn restore(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}
