//! Adaptive order-N context model.
//!
//! The model predicts each byte from the bytes before it. Contexts are kept
//! for every window length from `max_order` down to 0; below those sit two
//! fixed contexts, AllSymbols (order −1, every byte once) and Control
//! (order −2, the control symbols). A symbol missing from the active
//! context is coded as an *escape*, after which the model falls back one
//! order and the caller codes the symbol again. This repeats until the
//! symbol is found, at the latest in AllSymbols (bytes) or Control.
//!
//! # One coding step
//!
//! ```text
//! loop {
//!     (symbol, escaped) = model.symbol_for_token(token)
//!     encoder.encode(symbol)
//!     if !escaped { break }
//! }
//! model.update(token)      // bump the traversed contexts
//! model.add_symbol(token)  // slide the window
//! ```
//!
//! Decoding mirrors this with [`Model::symbol_scale`] and
//! [`Model::token_for_count`].
//!
//! # Exclusion
//!
//! Symbols counted by a higher-order context during a step are marked in a
//! scoreboard and contribute nothing at lower orders, and only the contexts
//! actually traversed during a step adapt (update exclusion).
//!
//! # Speculation
//!
//! [`Model::set_checkpoint`] opens a checkpoint; every table mutation made
//! afterwards is journaled, and [`Model::rollback`] reverses all of them,
//! including allocations of new contexts.

pub mod context;
pub mod key;
pub mod persist;

use std::collections::{HashMap, HashSet};

use crate::codec::Symbol;
use crate::rollback::Ledger;
use crate::{Error, Result};

pub use context::{Context, MAX_COUNT, OrderLevel, Scoreboard, Stat, StatUpdate, Totals};
pub use key::{ContextKey, Djb2Build, Djb2Hasher};

/// Largest supported context window.
pub const MAX_ORDER: u32 = 16;

const DONE_CODE: u8 = 1;
const FLUSH_CODE: u8 = 2;
const END_OF_PACKET_CODE: u8 = 3;

/// Map from context key to context, hashed with DJB2.
pub type ContextMap = HashMap<ContextKey, Context, Djb2Build>;

/// A unit of coded data: a literal byte or a control symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// A literal byte.
    Byte(u8),
    /// Rescale the whole model.
    Flush,
    /// End of the stream.
    Done,
    /// End of the current part; the stream continues in the next one.
    EndOfPacket,
}

impl Token {
    /// Code of a control token inside the control context.
    pub fn control_code(self) -> Option<u8> {
        match self {
            Token::Byte(_) => None,
            Token::Flush => Some(FLUSH_CODE),
            Token::Done => Some(DONE_CODE),
            Token::EndOfPacket => Some(END_OF_PACKET_CODE),
        }
    }

    /// Control token for a control-context code.
    pub fn from_control_code(code: u8) -> Option<Token> {
        match code {
            FLUSH_CODE => Some(Token::Flush),
            DONE_CODE => Some(Token::Done),
            END_OF_PACKET_CODE => Some(Token::EndOfPacket),
            _ => None,
        }
    }

    /// Returns `true` for control symbols.
    pub fn is_control(self) -> bool {
        !matches!(self, Token::Byte(_))
    }
}

/// Per-step position of the model.
#[derive(Debug, Clone)]
struct Cursor {
    key: ContextKey,
    level: OrderLevel,
    escaped: Vec<ContextKey>,
    scoreboard: Scoreboard,
    last_context: ContextKey,
}

/// Journal entry reversing one model mutation.
#[derive(Debug, Clone)]
enum ModelUndo {
    /// Position saved when the checkpoint was opened.
    Cursor(Box<Cursor>),
    /// A context was added to the table.
    ContextAllocated(ContextKey),
    /// A stat was inserted or bumped.
    StatUpdated { key: ContextKey, update: StatUpdate },
    /// A table context was rescaled outside of a stat update.
    ContextRescaled { key: ContextKey, stats: Vec<Stat> },
}

/// Hash table occupancy report, see [`Model::hash_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HashStats {
    /// Contexts in the table.
    pub contexts: usize,
    /// Distinct DJB2 values among the keys.
    pub distinct_hashes: usize,
    /// Keys sharing their DJB2 value with at least one other key.
    pub colliding_keys: usize,
    /// Most keys sharing a single DJB2 value.
    pub largest_bucket: usize,
}

/// The order-N context model.
#[derive(Debug, Clone)]
pub struct Model {
    contexts: ContextMap,
    all_symbols: Context,
    control: Context,
    current_key: ContextKey,
    last_context: ContextKey,
    level: OrderLevel,
    scoreboard: Scoreboard,
    escaped: Vec<ContextKey>,
    decode_totals: Vec<u32>,
    max_order: u32,
    compatibility: bool,
    adaptive: bool,
    ledger: Ledger<ModelUndo>,
}

impl Model {
    /// Creates a fresh adaptive model.
    ///
    /// In compatibility mode the table is laid out like the legacy encoder's:
    /// the chain of all-zero keys up to `max_order` is allocated, every
    /// context below the top one holds a zero-count placeholder for byte 0,
    /// and coding starts in the top context.
    pub fn new(max_order: u32, compatibility: bool) -> Self {
        let empty = ContextKey::empty(max_order);
        let mut contexts = ContextMap::default();
        let mut current_key = empty.clone();

        if compatibility {
            contexts.insert(empty.clone(), Context::seeded(0));
            while !current_key.is_max_order() {
                current_key = current_key.extended(0);
                let context = if current_key.is_max_order() {
                    Context::new(OrderLevel::Model)
                } else {
                    Context::seeded(0)
                };
                contexts.insert(current_key.clone(), context);
            }
        } else {
            contexts.insert(empty, Context::new(OrderLevel::Model));
        }

        Self::from_table(max_order, compatibility, contexts, current_key)
    }

    pub(crate) fn from_table(
        max_order: u32,
        compatibility: bool,
        mut contexts: ContextMap,
        current_key: ContextKey,
    ) -> Self {
        contexts
            .entry(ContextKey::empty(max_order))
            .or_insert_with(|| Context::new(OrderLevel::Model));
        contexts
            .entry(current_key.clone())
            .or_insert_with(|| Context::new(OrderLevel::Model));

        Self {
            contexts,
            all_symbols: Context::all_symbols(),
            control: Context::control(&[FLUSH_CODE, DONE_CODE, END_OF_PACKET_CODE]),
            last_context: current_key.clone(),
            current_key,
            level: OrderLevel::Model,
            scoreboard: Scoreboard::default(),
            escaped: Vec::new(),
            decode_totals: Vec::new(),
            max_order,
            compatibility,
            adaptive: true,
            ledger: Ledger::new(),
        }
    }

    /// Turns adaptation on or off.
    ///
    /// A static model never changes its counts or allocates contexts. When
    /// the window slides to a key that is not in the table it falls back to
    /// the longest existing suffix instead.
    pub fn set_adaptive(&mut self, adaptive: bool) {
        self.adaptive = adaptive;
    }

    /// Returns `true` unless the model is static.
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Context window length.
    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    /// Returns `true` if the model follows the legacy table layout.
    pub fn is_compatible(&self) -> bool {
        self.compatibility
    }

    /// Number of table contexts.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns `true` if the table is empty (never the case for a built model).
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Looks up a table context.
    pub fn context(&self, key: &ContextKey) -> Option<&Context> {
        self.contexts.get(key)
    }

    /// Iterates over the table in unspecified order.
    pub fn contexts(&self) -> impl Iterator<Item = (&ContextKey, &Context)> {
        self.contexts.iter()
    }

    /// The order −1 context.
    pub fn all_symbols(&self) -> &Context {
        &self.all_symbols
    }

    /// The order −2 context.
    pub fn control(&self) -> &Context {
        &self.control
    }

    /// Key of the active table context.
    pub fn current_key(&self) -> &ContextKey {
        &self.current_key
    }

    /// Context active when DONE was last coded.
    pub fn last_context(&self) -> &ContextKey {
        &self.last_context
    }

    /// Active level of the fallback chain.
    pub fn level(&self) -> OrderLevel {
        self.level
    }

    /// Exclusions of the current step.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Records the active context as the one in effect at end of stream.
    pub fn mark_last_context(&mut self) {
        self.last_context = self.current_key.clone();
    }

    /// Converts a token into the symbol range to encode in the active context.
    ///
    /// Returns `(symbol, true)` when the token is not available here: the
    /// symbol is then the escape range, the model has already fallen back one
    /// order, and the caller must call again with the same token.
    pub fn symbol_for_token(&mut self, token: Token) -> Result<(Symbol, bool)> {
        let code = match (self.level, token) {
            (OrderLevel::Control, t) => match t.control_code() {
                Some(code) => Some(code),
                None => {
                    return Err(Error::InvalidModel(format!(
                        "{:?} fell through to the control context",
                        token
                    )));
                }
            },
            (_, Token::Byte(byte)) => Some(byte),
            _ => None,
        };

        let totals = self.totalize_active();
        let scale = totals.scale();
        if let Some(index) = code.and_then(|c| self.active_stats().iter().position(|s| s.symbol == c)) {
            let (low, high) = totals.range_of(index);
            if high > low {
                return Ok((Symbol::new(low, high, scale), false));
            }
        }

        let (low, high) = totals.escape_range();
        self.decrement_order();
        Ok((Symbol::new(low, high, scale), true))
    }

    /// Totalizes the active context for decoding and returns its scale.
    ///
    /// Must be followed by [`token_for_count`](Self::token_for_count).
    pub fn symbol_scale(&mut self) -> u32 {
        let totals = self.totalize_active();
        self.decode_totals = totals.cumulative;
        self.decode_totals[0]
    }

    /// Finds the symbol a decoded count falls into.
    ///
    /// Returns `None` for an escape (the model has then fallen back one
    /// order), and in both cases the range to remove from the decoder.
    pub fn token_for_count(&mut self, count: u32) -> Result<(Option<Token>, Symbol)> {
        let totals = std::mem::take(&mut self.decode_totals);
        let scale = match totals.first() {
            Some(&scale) if count < scale => scale,
            Some(&scale) => {
                return Err(Error::corrupt_stream(format!(
                    "count {} outside scale {}",
                    count, scale
                )));
            }
            None => return Err(Error::corrupt_stream("no totals for decoded count")),
        };

        // The trailing zero guarantees a match
        let slot = totals.iter().position(|&t| count >= t).unwrap_or(totals.len() - 1);
        let symbol = Symbol::new(totals[slot], totals[slot - 1], scale);
        if slot == 1 {
            self.decrement_order();
            return Ok((None, symbol));
        }

        let stat = self
            .active_stats()
            .get(slot - 2)
            .copied()
            .ok_or_else(|| Error::corrupt_stream("decoded count maps past the context"))?;
        let token = match self.level {
            OrderLevel::Control => Token::from_control_code(stat.symbol).ok_or_else(|| {
                Error::corrupt_stream(format!("unknown control code {}", stat.symbol))
            })?,
            _ => Token::Byte(stat.symbol),
        };
        Ok((Some(token), symbol))
    }

    fn totalize_active(&mut self) -> Totals {
        let recording = self.ledger.is_recording();
        // The fixed contexts never adapt, so they stay far below the
        // rescale limit and have no key to journal
        let (context, key) = match self.level {
            OrderLevel::Model => {
                let key = &self.current_key;
                if !self.contexts.contains_key(key) {
                    self.ledger
                        .record_with(|| ModelUndo::ContextAllocated(key.clone()));
                }
                let context = self
                    .contexts
                    .entry(key.clone())
                    .or_insert_with(|| Context::new(OrderLevel::Model));
                (context, Some(key.clone()))
            }
            OrderLevel::AllSymbols => (&mut self.all_symbols, None),
            OrderLevel::Control => (&mut self.control, None),
        };

        let mut totals = context.totalize(&mut self.scoreboard, self.compatibility, recording);
        if let (Some(key), Some(stats)) = (key, totals.before_rescale.take()) {
            log::trace!("context {} rescaled during totalization", key);
            self.ledger.record(ModelUndo::ContextRescaled { key, stats });
        }
        totals
    }

    fn active_stats(&self) -> &[Stat] {
        match self.level {
            OrderLevel::Model => self
                .contexts
                .get(&self.current_key)
                .map_or(&[][..], |c| c.stats()),
            OrderLevel::AllSymbols => self.all_symbols.stats(),
            OrderLevel::Control => self.control.stats(),
        }
    }

    /// Falls back one order after an escape.
    fn decrement_order(&mut self) {
        match self.level {
            OrderLevel::Model => {
                self.escaped.push(self.current_key.clone());
                let lesser = self.current_key.lesser();
                let next = if self.adaptive {
                    lesser
                } else {
                    self.existing_suffix(lesser)
                };
                match next {
                    Some(key) => {
                        self.ensure_context(&key);
                        self.current_key = key;
                    }
                    None => self.level = OrderLevel::AllSymbols,
                }
            }
            OrderLevel::AllSymbols | OrderLevel::Control => self.level = OrderLevel::Control,
        }
    }

    fn ensure_context(&mut self, key: &ContextKey) {
        if !self.contexts.contains_key(key) {
            self.contexts
                .insert(key.clone(), Context::new(OrderLevel::Model));
            self.ledger
                .record_with(|| ModelUndo::ContextAllocated(key.clone()));
        }
    }

    fn existing_suffix(&self, start: Option<ContextKey>) -> Option<ContextKey> {
        let mut candidate = start;
        while let Some(key) = candidate {
            if self.contexts.contains_key(&key) {
                return Some(key);
            }
            candidate = key.lesser();
        }
        None
    }

    /// Adapts the model after a coded token and ends the step.
    ///
    /// For a byte, every context that escaped during the step and, if the
    /// byte was found at a table context, that context too, count one more
    /// observation. The window then returns to the longest context of the
    /// step.
    pub fn update(&mut self, token: Token) {
        if let (true, Token::Byte(byte)) = (self.adaptive, token) {
            let mut targets = self.escaped.clone();
            if self.level == OrderLevel::Model {
                targets.push(self.current_key.clone());
            }
            for key in &targets {
                self.bump(key, byte);
            }
        }

        if let Some(first) = self.escaped.first() {
            self.current_key = first.clone();
        }
        self.escaped.clear();
        self.level = OrderLevel::Model;
        self.scoreboard.clear();
    }

    fn bump(&mut self, key: &ContextKey, byte: u8) {
        let recording = self.ledger.is_recording();
        if let Some(context) = self.contexts.get_mut(key) {
            let update = context.update(byte, true, recording);
            self.ledger.record_with(|| ModelUndo::StatUpdated {
                key: key.clone(),
                update,
            });
        }
    }

    /// Slides the window over a coded byte. Control tokens leave it alone.
    pub fn add_symbol(&mut self, token: Token) {
        let Token::Byte(byte) = token else {
            return;
        };
        if self.level != OrderLevel::Model {
            return;
        }

        let next = self.current_key.extended(byte);
        if self.adaptive {
            self.ensure_context(&next);
            if self.compatibility {
                let mut suffix = next.lesser();
                while let Some(key) = suffix {
                    self.ensure_context(&key);
                    suffix = key.lesser();
                }
            }
            self.current_key = next;
        } else {
            self.current_key = self
                .existing_suffix(Some(next))
                .unwrap_or_else(|| ContextKey::empty(self.max_order));
        }
    }

    /// Rescales every table context. Static models are left unchanged.
    pub fn flush(&mut self) {
        if !self.adaptive {
            return;
        }
        let recording = self.ledger.is_recording();
        for (key, context) in self.contexts.iter_mut() {
            if recording {
                self.ledger.record(ModelUndo::ContextRescaled {
                    key: key.clone(),
                    stats: context.stats().to_vec(),
                });
            }
            context.rescale();
        }
        log::debug!("model flushed, {} contexts rescaled", self.contexts.len());
    }

    /// Rescales `key` and every context reachable from it by extending the
    /// key with one of its symbols.
    pub fn flush_from(&mut self, key: &ContextKey) {
        if !self.adaptive {
            return;
        }
        let mut pending = vec![key.clone()];
        let mut visited = HashSet::new();
        while let Some(key) = pending.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let Some(context) = self.contexts.get(&key) else {
                continue;
            };
            if !key.is_max_order() {
                pending.extend(context.stats().iter().map(|s| key.extended(s.symbol)));
            }
            self.rescale_table(&key);
        }
    }

    fn rescale_table(&mut self, key: &ContextKey) {
        let recording = self.ledger.is_recording();
        if let Some(context) = self.contexts.get_mut(key) {
            if recording {
                self.ledger.record(ModelUndo::ContextRescaled {
                    key: key.clone(),
                    stats: context.stats().to_vec(),
                });
            }
            context.rescale();
        }
    }

    /// Opens a checkpoint.
    pub fn set_checkpoint(&mut self) {
        self.ledger.checkpoint();
        self.ledger.record(ModelUndo::Cursor(Box::new(Cursor {
            key: self.current_key.clone(),
            level: self.level,
            escaped: self.escaped.clone(),
            scoreboard: self.scoreboard,
            last_context: self.last_context.clone(),
        })));
    }

    /// Reverses everything done since the innermost checkpoint.
    pub fn rollback(&mut self) {
        for record in self.ledger.rewind() {
            match record {
                ModelUndo::StatUpdated { key, update } => {
                    if let Some(context) = self.contexts.get_mut(&key) {
                        context.undo(update);
                    }
                }
                ModelUndo::ContextAllocated(key) => {
                    self.contexts.remove(&key);
                }
                ModelUndo::ContextRescaled { key, stats } => {
                    if let Some(context) = self.contexts.get_mut(&key) {
                        context.restore(stats);
                    }
                }
                ModelUndo::Cursor(cursor) => {
                    let Cursor {
                        key,
                        level,
                        escaped,
                        scoreboard,
                        last_context,
                    } = *cursor;
                    self.current_key = key;
                    self.level = level;
                    self.escaped = escaped;
                    self.scoreboard = scoreboard;
                    self.last_context = last_context;
                }
            }
        }
    }

    /// Keeps everything done since the innermost checkpoint.
    pub fn commit(&mut self) {
        self.ledger.commit();
    }

    /// Number of open checkpoints.
    pub fn checkpoint_depth(&self) -> usize {
        self.ledger.depth()
    }

    /// Reports how well DJB2 spreads the current keys.
    pub fn hash_stats(&self) -> HashStats {
        let mut buckets: HashMap<u32, usize> = HashMap::new();
        for key in self.contexts.keys() {
            *buckets.entry(key.djb2()).or_default() += 1;
        }
        HashStats {
            contexts: self.contexts.len(),
            distinct_hashes: buckets.len(),
            colliding_keys: buckets.values().filter(|&&n| n > 1).sum(),
            largest_bucket: buckets.values().copied().max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Snapshot = (Vec<(Vec<u8>, Vec<(u8, u32)>)>, Vec<u8>, OrderLevel, Scoreboard);

    fn snapshot(model: &Model) -> Snapshot {
        let mut table: Vec<_> = model
            .contexts()
            .map(|(k, c)| {
                let stats = c.stats().iter().map(|s| (s.symbol, s.count)).collect();
                (k.as_bytes().to_vec(), stats)
            })
            .collect();
        table.sort();
        (
            table,
            model.current_key().as_bytes().to_vec(),
            model.level(),
            *model.scoreboard(),
        )
    }

    /// Runs one full coding step, returning how many symbols were coded.
    fn step(model: &mut Model, token: Token) -> usize {
        let mut coded = 1;
        while model.symbol_for_token(token).unwrap().1 {
            coded += 1;
        }
        if token == Token::Flush {
            model.flush();
        }
        model.update(token);
        model.add_symbol(token);
        coded
    }

    #[test]
    fn test_new_model_has_order_zero() {
        let model = Model::new(3, false);
        assert_eq!(model.len(), 1);
        assert!(model.context(&ContextKey::empty(3)).is_some());
        assert!(model.current_key().is_empty());
    }

    #[test]
    fn test_compatibility_layout() {
        let model = Model::new(3, true);
        assert_eq!(model.len(), 4);
        assert_eq!(model.current_key().as_bytes(), &[0, 0, 0]);
        let seeded = model.context(&ContextKey::from_bytes(3, &[0, 0])).unwrap();
        assert_eq!(seeded.stats()[0].count, 0);
        let top = model.context(&ContextKey::from_bytes(3, &[0, 0, 0])).unwrap();
        assert!(top.is_empty());
    }

    #[test]
    fn test_first_byte_escapes_to_all_symbols() {
        let mut model = Model::new(2, false);
        assert_eq!(step(&mut model, Token::Byte(b'x')), 2);
        assert_eq!(model.context(&ContextKey::empty(2)).unwrap().count_of(b'x'), 1);
        assert_eq!(model.current_key().as_bytes(), b"x");
    }

    #[test]
    fn test_control_tokens_reach_control_context() {
        let mut model = Model::new(1, false);
        step(&mut model, Token::Byte(b'a'));
        // order 1, order 0, all symbols, control
        assert_eq!(step(&mut model, Token::Done), 4);
    }

    #[test]
    fn test_escape_termination_for_every_byte() {
        let mut model = Model::new(4, false);
        for i in 0..2000u32 {
            let byte = (i.wrapping_mul(2_654_435_761) >> 13) as u8;
            let coded = step(&mut model, Token::Byte(byte));
            assert!(coded <= 4 + 2);
        }
    }

    #[test]
    fn test_update_exclusion_skips_untraversed_orders() {
        let mut model = Model::new(2, false);
        for &b in b"ababa" {
            step(&mut model, Token::Byte(b));
        }
        // The last 'a' was found at "ab" directly, so order 0 did not adapt
        let order0 = model.context(&ContextKey::empty(2)).unwrap();
        assert_eq!(order0.count_of(b'a'), 2);
        assert_eq!(order0.count_of(b'b'), 1);
        let ab = model.context(&ContextKey::from_bytes(2, b"ab")).unwrap();
        assert_eq!(ab.count_of(b'a'), 2);
    }

    #[test]
    fn test_abab_scenario_counts() {
        let mut model = Model::new(3, false);
        for &b in b"ABABABAB" {
            step(&mut model, Token::Byte(b));
        }
        let aba = model.context(&ContextKey::from_bytes(3, b"ABA")).unwrap();
        let b_count = aba.count_of(b'B');
        assert!(b_count >= 1);
        assert!(aba.stats().iter().all(|s| s.symbol == b'B' || s.count < b_count));
    }

    #[test]
    fn test_rollback_restores_everything() {
        let mut model = Model::new(3, false);
        for &b in b"hello world" {
            step(&mut model, Token::Byte(b));
        }
        let before = snapshot(&model);
        let tables = model.len();

        model.set_checkpoint();
        for &b in b"zzz new bytes!" {
            step(&mut model, Token::Byte(b));
        }
        step(&mut model, Token::Flush);
        assert!(model.len() > tables);
        model.rollback();

        assert_eq!(snapshot(&model), before);
        assert_eq!(model.checkpoint_depth(), 0);
    }

    #[test]
    fn test_rollback_mid_step() {
        let mut model = Model::new(2, false);
        for &b in b"abc" {
            step(&mut model, Token::Byte(b));
        }
        model.symbol_for_token(Token::Byte(b'q')).unwrap();
        let before = snapshot(&model);
        model.set_checkpoint();
        while model.symbol_for_token(Token::Byte(b'q')).unwrap().1 {}
        model.update(Token::Byte(b'q'));
        model.add_symbol(Token::Byte(b'q'));
        model.rollback();
        assert_eq!(snapshot(&model), before);
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut model = Model::new(2, false);
        model.set_checkpoint();
        step(&mut model, Token::Byte(b'k'));
        model.commit();
        assert_eq!(model.context(&ContextKey::empty(2)).unwrap().count_of(b'k'), 1);
    }

    #[test]
    fn test_static_model_does_not_adapt() {
        let mut model = Model::new(2, false);
        for &b in b"abcabc" {
            step(&mut model, Token::Byte(b));
        }
        model.set_adaptive(false);
        let before = snapshot(&model).0;
        for &b in b"abxyzab" {
            step(&mut model, Token::Byte(b));
        }
        step(&mut model, Token::Flush);
        assert_eq!(snapshot(&model).0, before);
        assert!(model.context(model.current_key()).is_some());
    }

    #[test]
    fn test_flush_halves_table() {
        let mut model = Model::new(1, false);
        for _ in 0..6 {
            step(&mut model, Token::Byte(b'a'));
        }
        let key = ContextKey::from_bytes(1, b"a");
        let count = model.context(&key).unwrap().count_of(b'a');
        model.flush();
        assert_eq!(model.context(&key).unwrap().count_of(b'a'), count / 2);
    }

    #[test]
    fn test_flush_from_reaches_children() {
        let mut model = Model::new(2, false);
        for &b in b"abacabad" {
            step(&mut model, Token::Byte(b));
        }
        let child = ContextKey::from_bytes(2, b"a");
        let before = model.context(&child).unwrap().stats().to_vec();
        model.flush_from(&ContextKey::empty(2));
        let after = model.context(&child).unwrap();
        for stat in &before {
            assert_eq!(after.count_of(stat.symbol), stat.count / 2);
        }
    }

    #[test]
    fn test_token_control_codes() {
        for token in [Token::Flush, Token::Done, Token::EndOfPacket] {
            let code = token.control_code().unwrap();
            assert_eq!(Token::from_control_code(code), Some(token));
        }
        assert_eq!(Token::Byte(1).control_code(), None);
        assert_eq!(Token::from_control_code(0), None);
    }

    #[test]
    fn test_hash_stats() {
        let mut model = Model::new(2, false);
        for &b in b"the quick brown fox" {
            step(&mut model, Token::Byte(b));
        }
        let stats = model.hash_stats();
        assert_eq!(stats.contexts, model.len());
        assert!(stats.distinct_hashes <= stats.contexts);
        assert!(stats.largest_bucket >= 1);
    }
}
