use std::collections::HashMap;

use crate::data::Dataset;

/// Words never offered as the "topic" of an unmatched question.
/// Heuristic list; extend freely.
const STOP_WORDS: &[&str] = &[
    "what", "which", "that", "this", "with", "from", "have", "been", "genes", "gene", "cancer",
    "involved", "main", "median", "value", "expression", "values", "help", "your", "about",
    "tell",
];

const FALLBACK_HINT: &str = "the requested topic";

/// Scan a question for cancer types and gene symbols present in the dataset and
/// render the matching rows as a plain-text block. Never returns an empty string.
pub fn retrieve_context(dataset: &Dataset, query: &str) -> String {
    let q_lower = query.to_lowercase();
    let cancers = dataset.available_cancers();

    let mentioned_cancers: Vec<&String> = cancers
        .iter()
        .filter(|c| q_lower.contains(&c.to_lowercase()))
        .collect();

    let tokens = tokenize(&q_lower);
    let mentioned_genes: Vec<String> = dataset
        .all_genes()
        .into_iter()
        .filter(|g| tokens.contains(&g.to_lowercase().as_str()))
        .collect();

    let mut parts: Vec<String> = Vec::new();

    for cancer in &mentioned_cancers {
        let targets = dataset.targets(cancer);
        if targets.is_empty() {
            continue;
        }
        let exprs = dataset.expressions_for_cancer(cancer, &targets);
        let values: HashMap<&str, f64> = exprs.iter().map(|(g, v)| (g.as_str(), *v)).collect();

        let mut lines = vec![
            format!("Cancer type: {}", cancer),
            format!("Gene targets ({}): {}", targets.len(), targets.join(", ")),
        ];
        if !exprs.is_empty() {
            lines.push("Median expression values:".to_string());
            for gene in &targets {
                if let Some(val) = values.get(gene.as_str()) {
                    lines.push(format!("  - {}: {}", gene, format_value(*val)));
                }
            }
        }
        parts.push(lines.join("\n"));
    }

    if !mentioned_genes.is_empty() && mentioned_cancers.is_empty() {
        let exprs = dataset.expressions(&mentioned_genes);
        if !exprs.is_empty() {
            let mut lines = vec!["Requested gene expression values:".to_string()];
            for (gene, val) in &exprs {
                lines.push(format!("  - {}: {}", gene, format_value(*val)));
            }
            parts.push(lines.join("\n"));
        }
    }

    if !parts.is_empty() {
        return parts.join("\n\n");
    }

    format!(
        "No data found for \"{}\" in the dataset.\nAvailable cancer types: {}.",
        topic_hint(&q_lower),
        cancers.join(", ")
    )
}

/// Whitespace tokens after blanking `, ; ? .`.
fn tokenize(q_lower: &str) -> Vec<&str> {
    q_lower
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '?' | '.'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// First word longer than three characters that is not a stop word.
fn topic_hint(q_lower: &str) -> &str {
    q_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(|w| w.trim_matches(|c| matches!(c, '?' | '.' | ',' | '!')))
        .find(|w| !STOP_WORDS.contains(w))
        .unwrap_or(FALLBACK_HINT)
}

/// Whole numbers keep one decimal (`5.0`), everything else prints shortest form.
fn format_value(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e16 {
        format!("{:.1}", val)
    } else {
        val.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    fn fixture() -> Dataset {
        Dataset::from_records(vec![
            Record::new("lung", "TP53", 12.3),
            Record::new("lung", "EGFR", 8.0),
            Record::new("breast", "BRCA1", 4.5),
            Record::new("breast", "ERBB2", 7.25),
            Record::new("colon", "KRAS", 3.1),
        ])
    }

    #[test]
    fn test_single_row_lung_question() {
        let ds = Dataset::from_records(vec![Record::new("lung", "TP53", 12.3)]);
        let ctx = retrieve_context(&ds, "What genes target lung cancer?");
        assert!(ctx.contains("TP53"));
        assert!(ctx.contains("12.3"));
    }

    #[test]
    fn test_cancer_block_layout() {
        let ctx = retrieve_context(&fixture(), "Which genes are targets in LUNG?");
        assert_eq!(
            ctx,
            "Cancer type: lung\n\
             Gene targets (2): TP53, EGFR\n\
             Median expression values:\n  - TP53: 12.3\n  - EGFR: 8.0"
        );
    }

    #[test]
    fn test_every_known_cancer_gets_its_gene_list() {
        let ds = fixture();
        for cancer in ds.available_cancers() {
            let ctx = retrieve_context(&ds, &format!("tell me about {} please", cancer));
            for gene in ds.targets(&cancer) {
                assert!(ctx.contains(&gene), "{} missing from {}", gene, ctx);
            }
        }
    }

    #[test]
    fn test_multiple_cancers_separated_by_blank_line() {
        let ctx = retrieve_context(&fixture(), "compare breast and colon");
        let blocks: Vec<&str> = ctx.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Cancer type: breast"));
        assert!(blocks[1].starts_with("Cancer type: colon"));
    }

    #[test]
    fn test_gene_only_question_lists_values() {
        let ctx = retrieve_context(&fixture(), "What is the median value of kras, and erbb2?");
        assert_eq!(
            ctx,
            "Requested gene expression values:\n  - ERBB2: 7.25\n  - KRAS: 3.1"
        );
    }

    #[test]
    fn test_gene_tokens_must_match_exactly() {
        let ctx = retrieve_context(&fixture(), "anything on TP53X or xkras");
        assert!(ctx.starts_with("No data found"));
    }

    #[test]
    fn test_gene_and_cancer_emits_only_cancer_block() {
        let ctx = retrieve_context(&fixture(), "is KRAS in lung?");
        assert!(ctx.starts_with("Cancer type: lung"));
        assert!(!ctx.contains("Requested gene expression values"));
    }

    #[test]
    fn test_no_match_names_hint_and_all_cancers() {
        let ctx = retrieve_context(&fixture(), "What about melanoma genes?");
        assert_eq!(
            ctx,
            "No data found for \"melanoma\" in the dataset.\n\
             Available cancer types: breast, colon, lung."
        );
    }

    #[test]
    fn test_no_match_without_topic_word() {
        let ctx = retrieve_context(&fixture(), "help me with this?");
        assert!(ctx.contains("\"the requested topic\""));
        assert!(ctx.contains("No data found"));
    }

    #[test]
    fn test_empty_dataset_still_answers() {
        let ctx = retrieve_context(&Dataset::default(), "lung");
        assert_eq!(
            ctx,
            "No data found for \"lung\" in the dataset.\nAvailable cancer types: ."
        );
    }

    #[test]
    fn test_values_follow_target_order_with_duplicates_and_gaps() {
        let mut blank = Record::new("lung", "ALK", 0.0);
        blank.median_value = None;
        let ds = Dataset::from_records(vec![
            Record::new("lung", "EGFR", 2.0),
            blank,
            Record::new("lung", "TP53", 12.3),
            Record::new("lung", "EGFR", 8.0),
        ]);

        let ctx = retrieve_context(&ds, "lung");
        assert_eq!(
            ctx,
            "Cancer type: lung\n\
             Gene targets (4): EGFR, ALK, TP53, EGFR\n\
             Median expression values:\n  - EGFR: 8.0\n  - TP53: 12.3\n  - EGFR: 8.0"
        );
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.3), "12.3");
        assert_eq!(format_value(5.0), "5.0");
        assert_eq!(format_value(-0.25), "-0.25");
    }
}
