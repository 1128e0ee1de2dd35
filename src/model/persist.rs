//! Model persistence as JSON lines.
//!
//! The first line is a header naming the window length, the context active
//! at the end of the training stream and the compatibility flag. Every
//! table context follows as two lines, its key and then its stats:
//!
//! ```text
//! {"MaxOrder":2,"LastContext":{"MaxLength":2,"Key":[104,105]},"CompatabilityMode":false}
//! {"MaxLength":2,"Key":[]}
//! {"Stats":[{"Symbol":104,"Count":1},{"Symbol":105,"Count":1}]}
//! ...
//! ```
//!
//! The fixed order −1 and order −2 contexts are not written.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use super::{Context, ContextKey, ContextMap, MAX_COUNT, MAX_ORDER, Model, Scoreboard, Stat};
use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Header {
    max_order: u32,
    last_context: ContextKey,
    #[serde(rename = "CompatabilityMode", default)]
    compatibility_mode: bool,
}

#[derive(Debug, Serialize)]
struct StatsOut<'a> {
    #[serde(rename = "Stats")]
    stats: &'a [Stat],
}

#[derive(Debug, Deserialize)]
struct StatsIn {
    #[serde(rename = "Stats")]
    stats: Vec<Stat>,
}

impl Model {
    /// Writes the model as JSON lines.
    ///
    /// Contexts are written shortest key first, then in byte order, so equal
    /// models produce identical files.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<()> {
        let header = Header {
            max_order: self.max_order,
            last_context: self.last_context.clone(),
            compatibility_mode: self.compatibility,
        };
        serde_json::to_writer(&mut writer, &header)?;
        writeln!(writer)?;

        let mut keys: Vec<&ContextKey> = self.contexts.keys().collect();
        keys.sort_by(|a, b| (a.len(), a.as_bytes()).cmp(&(b.len(), b.as_bytes())));
        for key in keys {
            serde_json::to_writer(&mut writer, key)?;
            writeln!(writer)?;
            let stats = self.contexts.get(key).map_or(&[][..], |c| c.stats());
            serde_json::to_writer(&mut writer, &StatsOut { stats })?;
            writeln!(writer)?;
        }
        writer.flush()?;
        log::debug!("exported model with {} contexts", self.contexts.len());
        Ok(())
    }

    /// Reads a model written by [`export`](Self::export).
    ///
    /// The returned model is adaptive and positioned at the persisted last
    /// context. Blank lines are ignored.
    pub fn import<R: BufRead>(reader: R) -> Result<Model> {
        let mut lines = reader
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()));

        let header: Header = match lines.next() {
            Some((_, line)) => serde_json::from_str(&line?)?,
            None => return Err(Error::InvalidModel("missing header line".into())),
        };
        if header.max_order > MAX_ORDER {
            return Err(Error::InvalidModel(format!(
                "max order {} exceeds {}",
                header.max_order, MAX_ORDER
            )));
        }
        let last_context = rebuild_key(&header.last_context, header.max_order, 1)?;

        let mut contexts = ContextMap::default();
        while let Some((number, line)) = lines.next() {
            let key: ContextKey = serde_json::from_str(&line?)?;
            let key = rebuild_key(&key, header.max_order, number + 1)?;
            let stats: StatsIn = match lines.next() {
                Some((_, line)) => serde_json::from_str(&line?)?,
                None => {
                    return Err(Error::InvalidModel(format!(
                        "key on line {} has no context record",
                        number + 1
                    )));
                }
            };
            check_stats(&stats.stats, number + 2)?;
            contexts.insert(key, Context::from_stats(stats.stats));
        }

        log::debug!(
            "imported model: order {}, {} contexts",
            header.max_order,
            contexts.len()
        );
        Ok(Model::from_table(
            header.max_order,
            header.compatibility_mode,
            contexts,
            last_context,
        ))
    }
}

fn check_stats(stats: &[Stat], line: usize) -> Result<()> {
    let mut seen = Scoreboard::default();
    for stat in stats {
        if stat.count > MAX_COUNT {
            return Err(Error::InvalidModel(format!(
                "count {} on line {} exceeds {}",
                stat.count, line, MAX_COUNT
            )));
        }
        if seen.contains(stat.symbol) {
            return Err(Error::InvalidModel(format!(
                "symbol {} listed twice on line {}",
                stat.symbol, line
            )));
        }
        seen.mark(stat.symbol);
    }
    if stats.windows(2).any(|pair| pair[0].count < pair[1].count) {
        return Err(Error::InvalidModel(format!(
            "stats on line {} are not sorted by descending count",
            line
        )));
    }
    Ok(())
}

fn rebuild_key(key: &ContextKey, max_order: u32, line: usize) -> Result<ContextKey> {
    if !key.is_well_formed() || key.len() > max_order as usize {
        return Err(Error::InvalidModel(format!(
            "key {} on line {} is longer than the model order {}",
            key, line, max_order
        )));
    }
    Ok(ContextKey::from_bytes(max_order, key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Token;
    use std::io::Cursor;

    fn trained(text: &[u8], order: u32) -> Model {
        let mut model = Model::new(order, false);
        for &b in text {
            let token = Token::Byte(b);
            while model.symbol_for_token(token).unwrap().1 {}
            model.update(token);
            model.add_symbol(token);
        }
        model.mark_last_context();
        model
    }

    fn exported(model: &Model) -> String {
        let mut out = Vec::new();
        model.export(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_export_layout() {
        let model = trained(b"hi", 2);
        let text = exported(&model);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            r#"{"MaxOrder":2,"LastContext":{"MaxLength":2,"Key":[104,105]},"CompatabilityMode":false}"#
        );
        assert_eq!(lines[1], r#"{"MaxLength":2,"Key":[]}"#);
        assert_eq!(
            lines[2],
            r#"{"Stats":[{"Symbol":104,"Count":1},{"Symbol":105,"Count":1}]}"#
        );
        assert_eq!(lines.len(), 1 + 2 * model.len());
    }

    #[test]
    fn test_export_import_is_stable() {
        let model = trained(b"abracadabra, abracadabra", 3);
        let text = exported(&model);
        let imported = Model::import(Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(imported.len(), model.len());
        assert_eq!(imported.last_context(), model.last_context());
        assert_eq!(imported.current_key(), model.last_context());
        assert_eq!(exported(&imported), text);
    }

    #[test]
    fn test_import_ignores_unknown_fields() {
        let text = concat!(
            r#"{"MaxOrder":1,"LastContext":{"MaxLength":1,"Key":[]},"CompatabilityMode":true}"#,
            "\n",
            r#"{"MaxLength":1,"Key":[],"BestKey":null}"#,
            "\n",
            r#"{"Stats":[{"Symbol":0,"Count":0}]}"#,
            "\n\n"
        );
        let model = Model::import(Cursor::new(text)).unwrap();
        assert!(model.is_compatible());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_import_rejects_long_key() {
        let text = concat!(
            r#"{"MaxOrder":1,"LastContext":{"MaxLength":1,"Key":[]}}"#,
            "\n",
            r#"{"MaxLength":1,"Key":[1,2]}"#,
            "\n",
            r#"{"Stats":[]}"#,
        );
        assert!(matches!(
            Model::import(Cursor::new(text)),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_import_rejects_dangling_key() {
        let text = concat!(
            r#"{"MaxOrder":1,"LastContext":{"MaxLength":1,"Key":[]}}"#,
            "\n",
            r#"{"MaxLength":1,"Key":[1]}"#,
        );
        assert!(matches!(
            Model::import(Cursor::new(text)),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_import_rejects_bad_stats() {
        let header = r#"{"MaxOrder":1,"LastContext":{"MaxLength":1,"Key":[]}}"#;
        for stats in [
            r#"{"Stats":[{"Symbol":7,"Count":4000000000}]}"#,
            r#"{"Stats":[{"Symbol":7,"Count":2},{"Symbol":7,"Count":1}]}"#,
            r#"{"Stats":[{"Symbol":97,"Count":1},{"Symbol":98,"Count":9}]}"#,
        ] {
            let text = format!("{}\n{}\n{}\n", header, r#"{"MaxLength":1,"Key":[]}"#, stats);
            assert!(matches!(
                Model::import(Cursor::new(text)),
                Err(Error::InvalidModel(_))
            ));
        }
    }

    #[test]
    fn test_imported_stats_stay_sorted() {
        let text = concat!(
            r#"{"MaxOrder":0,"LastContext":{"MaxLength":0,"Key":[]}}"#,
            "\n",
            r#"{"MaxLength":0,"Key":[]}"#,
            "\n",
            r#"{"Stats":[{"Symbol":98,"Count":9},{"Symbol":97,"Count":1},{"Symbol":99,"Count":1}]}"#,
            "\n",
        );
        let mut model = Model::import(Cursor::new(text)).unwrap();
        for &b in b"cacc" {
            let token = Token::Byte(b);
            while model.symbol_for_token(token).unwrap().1 {}
            model.update(token);
            model.add_symbol(token);
        }
        let stats = model.context(&ContextKey::empty(0)).unwrap().stats();
        assert!(stats.windows(2).all(|pair| pair[0].count >= pair[1].count));
        assert_eq!(stats[0].symbol, b'b');
    }

    #[test]
    fn test_import_rejects_empty_input() {
        assert!(matches!(
            Model::import(Cursor::new("")),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn test_import_reports_bad_json() {
        assert!(matches!(
            Model::import(Cursor::new("{not json")),
            Err(Error::Json(_))
        ));
    }
}
