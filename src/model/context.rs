//! Frequency tables for a single context.

use serde::{Deserialize, Serialize};

use crate::codec::MAXIMUM_SCALE;

/// A count this large triggers a rescale after an update.
pub const MAX_COUNT: u32 = 0xff;

/// Number of distinct byte symbols.
const ALPHABET: u32 = 256;

/// One symbol and how often it was seen.
///
/// Equality and hashing consider the symbol only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stat {
    /// Byte value, or control code inside the control context.
    pub symbol: u8,
    /// Observation count.
    pub count: u32,
}

impl Stat {
    /// Creates a stat.
    pub fn new(symbol: u8, count: u32) -> Self {
        Self { symbol, count }
    }
}

impl PartialEq for Stat {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Stat {}

impl std::hash::Hash for Stat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

/// Position of a context in the order fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderLevel {
    /// A table context keyed by the preceding bytes (orders `max..=0`).
    Model,
    /// Order −1: every byte once.
    AllSymbols,
    /// Order −2: the control symbols.
    Control,
}

/// 256-bit set of symbols already counted at a higher order this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoreboard([u64; 4]);

impl Scoreboard {
    /// Marks a symbol as excluded.
    pub fn mark(&mut self, symbol: u8) {
        self.0[usize::from(symbol >> 6)] |= 1 << (symbol & 63);
    }

    /// Returns `true` if the symbol is excluded.
    pub fn contains(&self, symbol: u8) -> bool {
        self.0[usize::from(symbol >> 6)] & (1 << (symbol & 63)) != 0
    }

    /// Clears every mark.
    pub fn clear(&mut self) {
        self.0 = [0; 4];
    }

    /// Number of excluded symbols.
    pub fn len(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    /// Returns `true` if nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }
}

/// How to reverse one [`Context::update`].
#[derive(Debug, Clone)]
pub struct StatUpdate {
    from: usize,
    to: usize,
    created: bool,
    incremented: bool,
    /// Table as it was just before a rescale the update triggered.
    before_rescale: Option<Vec<Stat>>,
}

/// Cumulative totals produced by [`Context::totalize`].
///
/// `cumulative[0]` is the scale, `[cumulative[1], cumulative[0])` is the
/// escape range and stat `i` owns `[cumulative[i + 2], cumulative[i + 1])`.
#[derive(Debug, Clone)]
pub struct Totals {
    /// Cumulative counts, highest first.
    pub cumulative: Vec<u32>,
    /// Table as it was before totalization had to rescale, if requested.
    pub before_rescale: Option<Vec<Stat>>,
}

impl Totals {
    /// The total of all ranges including the escape.
    pub fn scale(&self) -> u32 {
        self.cumulative[0]
    }

    /// Range of stat `index` as `(low, high)`.
    pub fn range_of(&self, index: usize) -> (u32, u32) {
        (self.cumulative[index + 2], self.cumulative[index + 1])
    }

    /// Range of the escape symbol as `(low, high)`.
    pub fn escape_range(&self) -> (u32, u32) {
        (self.cumulative[1], self.cumulative[0])
    }
}

/// Stats of one context, kept sorted by descending count.
#[derive(Debug, Clone)]
pub struct Context {
    stats: Vec<Stat>,
    kind: OrderLevel,
}

impl Context {
    /// Creates an empty context of the given kind.
    pub fn new(kind: OrderLevel) -> Self {
        Self {
            stats: Vec::new(),
            kind,
        }
    }

    /// Creates a table context holding a zero-count placeholder for `symbol`.
    pub fn seeded(symbol: u8) -> Self {
        Self {
            stats: vec![Stat::new(symbol, 0)],
            kind: OrderLevel::Model,
        }
    }

    /// The order −1 context: every byte with count 1.
    pub fn all_symbols() -> Self {
        let stats = (0..=u8::MAX).map(|b| Stat::new(b, 1)).collect();
        Self {
            stats,
            kind: OrderLevel::AllSymbols,
        }
    }

    /// The order −2 context holding the given control codes with count 1.
    pub fn control(codes: &[u8]) -> Self {
        let mut context = Self::new(OrderLevel::Control);
        for &code in codes {
            context.update(code, true, false);
        }
        context
    }

    /// Rebuilds a table context from persisted stats.
    pub fn from_stats(stats: Vec<Stat>) -> Self {
        Self {
            stats,
            kind: OrderLevel::Model,
        }
    }

    /// The stats, highest count first.
    pub fn stats(&self) -> &[Stat] {
        &self.stats
    }

    /// Which level of the fallback chain this context serves.
    pub fn kind(&self) -> OrderLevel {
        self.kind
    }

    /// Number of stats.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Returns `true` if the context has no stats.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Index of `symbol`, if present.
    pub fn position(&self, symbol: u8) -> Option<usize> {
        self.stats.iter().position(|s| s.symbol == symbol)
    }

    /// Count of `symbol`, zero if absent.
    pub fn count_of(&self, symbol: u8) -> u32 {
        self.position(symbol).map_or(0, |i| self.stats[i].count)
    }

    /// Records one observation of `symbol`.
    ///
    /// The stat is inserted if missing, swapped in front of every stat with
    /// the same count, and incremented when `increment` is set. Reaching
    /// [`MAX_COUNT`] rescales the table. The returned record reverses the
    /// whole operation; its pre-rescale copy is only kept with `keep_undo`.
    pub fn update(&mut self, symbol: u8, increment: bool, keep_undo: bool) -> StatUpdate {
        let (from, created) = match self.position(symbol) {
            Some(index) => (index, false),
            None => {
                self.stats.push(Stat::new(symbol, 0));
                (self.stats.len() - 1, true)
            }
        };

        let count = self.stats[from].count;
        let mut to = from;
        while to > 0 && self.stats[to - 1].count == count {
            to -= 1;
        }
        self.stats.swap(to, from);
        if increment {
            self.stats[to].count += 1;
        }

        let mut before_rescale = None;
        if self.stats[to].count >= MAX_COUNT {
            if keep_undo {
                before_rescale = Some(self.stats.clone());
            }
            self.rescale();
        }

        StatUpdate {
            from,
            to,
            created,
            incremented: increment,
            before_rescale,
        }
    }

    /// Reverses an [`update`](Self::update).
    pub fn undo(&mut self, update: StatUpdate) {
        if let Some(stats) = update.before_rescale {
            self.stats = stats;
        }
        self.stats.swap(update.from, update.to);
        if update.created {
            self.stats.remove(update.from);
        } else if update.incremented {
            self.stats[update.from].count -= 1;
        }
    }

    /// Computes cumulative totals and the escape range.
    ///
    /// Symbols marked in `scoreboard` contribute nothing, except in the
    /// control context. If the scale reaches [`MAXIMUM_SCALE`] the table is
    /// rescaled and totalized again; a copy of the table from before the
    /// first rescale is returned when `keep_undo` is set. Afterwards every
    /// counted symbol is marked in the scoreboard.
    ///
    /// `compatibility` reproduces the legacy escape estimate (stat count
    /// minus one) and its marking loop, which skips the last stat.
    pub fn totalize(
        &mut self,
        scoreboard: &mut Scoreboard,
        compatibility: bool,
        keep_undo: bool,
    ) -> Totals {
        let mut before_rescale = None;
        let cumulative = loop {
            let cumulative = self.cumulative(scoreboard, compatibility);
            if cumulative[0] < MAXIMUM_SCALE {
                break cumulative;
            }
            if keep_undo && before_rescale.is_none() {
                before_rescale = Some(self.stats.clone());
            }
            self.rescale();
        };

        if self.kind != OrderLevel::Control {
            let limit = if compatibility {
                self.stats.len().saturating_sub(1)
            } else {
                self.stats.len()
            };
            for stat in &self.stats[..limit] {
                if stat.count != 0 {
                    scoreboard.mark(stat.symbol);
                }
            }
        }

        Totals {
            cumulative,
            before_rescale,
        }
    }

    fn cumulative(&self, scoreboard: &Scoreboard, compatibility: bool) -> Vec<u32> {
        let n = self.stats.len();
        let mut totals = vec![0u32; n + 2];
        let mut max = 0;
        let mut live = 0;
        for i in (0..n).rev() {
            let stat = self.stats[i];
            totals[i + 1] = totals[i + 2];
            if stat.count == 0 {
                continue;
            }
            if self.kind == OrderLevel::Control || !scoreboard.contains(stat.symbol) {
                totals[i + 1] += stat.count;
            }
            max = max.max(stat.count);
            live += 1;
        }

        totals[0] = if max == 0 {
            1
        } else {
            let population = if compatibility { n as u32 - 1 } else { live };
            (ALPHABET - population) * population / ALPHABET / max + 1 + totals[1]
        };
        totals
    }

    /// Halves every count and drops stats that reach zero.
    pub fn rescale(&mut self) {
        for stat in &mut self.stats {
            stat.count /= 2;
        }
        self.stats.retain(|s| s.count != 0);
    }

    /// Replaces the table, used when reversing a rescale.
    pub(crate) fn restore(&mut self, stats: Vec<Stat>) {
        self.stats = stats;
    }
}
