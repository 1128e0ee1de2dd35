//! Output formatting for CLI operations.

use serde_json::json;

use ppmrc::Model;
use ppmrc::read::ExpandSummary;
use ppmrc::write::CompressSummary;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats compression statistics
    fn format_compress(&self, summary: &CompressSummary) -> String;

    /// Formats expansion statistics
    fn format_expand(&self, summary: &ExpandSummary) -> String;

    /// Formats a model description
    fn format_model(&self, model: &Model) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_compress(&self, summary: &CompressSummary) -> String {
        let mut output = format!(
            "{} -> {} ({:.1}% saved)\n",
            humanize_bytes(summary.input_bytes),
            humanize_bytes(summary.output_bytes),
            summary.space_savings() * 100.0
        );
        if summary.part_sizes.len() > 1 {
            output.push_str(&format!("Parts: {}\n", summary.part_sizes.len()));
            for (index, size) in summary.part_sizes.iter().enumerate() {
                output.push_str(&format!("  part{:<6} {:>12}\n", index, humanize_bytes(*size)));
            }
        }
        if summary.flushes > 0 {
            output.push_str(&format!("Model flushes: {}\n", summary.flushes));
        }
        output
    }

    fn format_expand(&self, summary: &ExpandSummary) -> String {
        let mut output = format!(
            "{} -> {}\n",
            humanize_bytes(summary.input_bytes),
            humanize_bytes(summary.output_bytes)
        );
        if summary.parts > 1 {
            output.push_str(&format!("Parts: {}\n", summary.parts));
        }
        output
    }

    fn format_model(&self, model: &Model) -> String {
        let hash = model.hash_stats();
        let mut output = String::new();
        output.push_str(&format!("Max order:      {}\n", model.max_order()));
        output.push_str(&format!("Compatibility:  {}\n", model.is_compatible()));
        output.push_str(&format!("Contexts:       {}\n", model.len()));
        output.push_str(&format!("Last context:   {}\n", model.last_context()));
        output.push_str(&format!(
            "Hash buckets:   {} ({} colliding keys, largest {})\n",
            hash.distinct_hashes, hash.colliding_keys, hash.largest_bucket
        ));

        let mut by_order = vec![0usize; model.max_order() as usize + 1];
        for (key, _) in model.contexts() {
            by_order[key.len()] += 1;
        }
        output.push_str("Contexts per order:\n");
        for (order, count) in by_order.iter().enumerate() {
            output.push_str(&format!("  {:>2}: {}\n", order, count));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_compress(&self, summary: &CompressSummary) -> String {
        let obj = json!({
            "input_bytes": summary.input_bytes,
            "output_bytes": summary.output_bytes,
            "compression_ratio": summary.compression_ratio(),
            "flushes": summary.flushes,
            "part_sizes": summary.part_sizes,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_expand(&self, summary: &ExpandSummary) -> String {
        let obj = json!({
            "input_bytes": summary.input_bytes,
            "output_bytes": summary.output_bytes,
            "parts": summary.parts,
            "flushes": summary.flushes,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_model(&self, model: &Model) -> String {
        let hash = model.hash_stats();
        let obj = json!({
            "max_order": model.max_order(),
            "compatibility_mode": model.is_compatible(),
            "contexts": model.len(),
            "last_context": model.last_context(),
            "distinct_hashes": hash.distinct_hashes,
            "colliding_keys": hash.colliding_keys,
            "largest_bucket": hash.largest_bucket,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates a formatter for the requested output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
