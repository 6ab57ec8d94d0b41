// src/process/aggregate.rs
use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{info, warn};

use crate::process::utils::{
    cmp_volume_desc, f64_col, f64_value, format_position, str_col, str_value,
};
use crate::schema::{
    COMPETITOR_URL, DOMAIN, DOMAIN_POSITION, KEYWORD, KEYWORD_DIFFICULTY, SEARCH_VOLUME,
};

pub const TOPIC: &str = "Topic";
pub const KEYWORDS: &str = "Keywords";
pub const DOMAINS_INFO: &str = "Domain's Info";
pub const CREATION_OR_OPTIMIZATION: &str = "Creation or Optimization";

/// Collapse the filtered table into one content-opportunity record per
/// competitor URL.
///
/// Groups are iterated in first-seen order so reruns over the same input
/// produce byte-identical output. Rows with a null competitor URL belong to
/// no group and are dropped.
pub fn aggregate_by_competitor(batch: &RecordBatch) -> Result<RecordBatch> {
    let urls = str_col(batch, COMPETITOR_URL)?;
    let keywords = str_col(batch, KEYWORD)?;
    let domains = str_col(batch, DOMAIN)?;
    let volumes = f64_col(batch, SEARCH_VOLUME)?;
    let difficulties = f64_col(batch, KEYWORD_DIFFICULTY)?;
    let domain_positions = f64_col(batch, DOMAIN_POSITION)?;

    // Group row indices by competitor URL, first-seen order.
    let mut group_keys: Vec<&str> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut key_index: HashMap<&str, usize> = HashMap::new();
    let mut dropped_null_urls = 0usize;
    for i in 0..batch.num_rows() {
        match str_value(urls, i) {
            Some(url) => {
                let slot = *key_index.entry(url).or_insert_with(|| {
                    group_keys.push(url);
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(i);
            }
            None => dropped_null_urls += 1,
        }
    }
    if dropped_null_urls > 0 {
        warn!(
            rows = dropped_null_urls,
            "rows without a competitor URL were left out of the report"
        );
    }

    let mut url_builder = StringBuilder::new();
    let mut topic_builder = StringBuilder::new();
    let mut keywords_builder = StringBuilder::new();
    let mut volume_builder = Float64Builder::new();
    let mut difficulty_builder = Float64Builder::new();
    let mut info_builder = StringBuilder::new();
    let mut action_builder = StringBuilder::new();

    // Grouping already guarantees distinct URLs; this mirrors the final
    // explicit dedup of the report and keeps the invariant checked.
    let mut emitted: HashSet<&str> = HashSet::with_capacity(group_keys.len());

    for (&url, rows) in group_keys.iter().zip(&groups) {
        if !emitted.insert(url) {
            continue;
        }

        // Topic: keyword of the highest-volume row, first wins on ties.
        let top = rows
            .iter()
            .copied()
            .reduce(|best, i| {
                if cmp_volume_desc(f64_value(volumes, i), f64_value(volumes, best))
                    == std::cmp::Ordering::Less
                {
                    i
                } else {
                    best
                }
            })
            .expect("groups are never empty");
        let topic = str_value(keywords, top);

        // Keywords: the group's keywords, highest volume first.
        let mut by_volume = rows.clone();
        by_volume.sort_by(|&a, &b| {
            cmp_volume_desc(f64_value(volumes, a), f64_value(volumes, b))
        });
        let keyword_list = by_volume
            .iter()
            .filter_map(|&i| str_value(keywords, i))
            .collect::<Vec<_>>()
            .join(", ");

        // Search volume: sum, nulls count as zero.
        let volume_sum: f64 = rows.iter().filter_map(|&i| f64_value(volumes, i)).sum();

        // Keyword difficulty: mean over non-null values, two decimals.
        let known: Vec<f64> = rows
            .iter()
            .filter_map(|&i| f64_value(difficulties, i))
            .collect();
        let difficulty = if known.is_empty() {
            None
        } else {
            let mean = known.iter().sum::<f64>() / known.len() as f64;
            Some((mean * 100.0).round() / 100.0)
        };

        // Domain's Info: where the analyzed domain itself already ranks for
        // the topic keyword. The scan covers the whole filtered table, not
        // just this group.
        let domains_info = domain_info(
            topic,
            str_value(domains, top),
            batch.num_rows(),
            keywords,
            domains,
            domain_positions,
        );
        let action = if domains_info.is_empty() {
            "Creation"
        } else {
            "Optimization"
        };

        url_builder.append_value(url);
        topic_builder.append_option(topic);
        keywords_builder.append_value(keyword_list);
        volume_builder.append_value(volume_sum);
        difficulty_builder.append_option(difficulty);
        info_builder.append_value(&domains_info);
        action_builder.append_value(action);
    }

    let schema = Schema::new(vec![
        Field::new(COMPETITOR_URL, DataType::Utf8, false),
        Field::new(TOPIC, DataType::Utf8, true),
        Field::new(KEYWORDS, DataType::Utf8, false),
        Field::new(SEARCH_VOLUME, DataType::Float64, false),
        Field::new(KEYWORD_DIFFICULTY, DataType::Float64, true),
        Field::new(DOMAINS_INFO, DataType::Utf8, false),
        Field::new(CREATION_OR_OPTIMIZATION, DataType::Utf8, false),
    ]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(url_builder.finish()),
        Arc::new(topic_builder.finish()),
        Arc::new(keywords_builder.finish()),
        Arc::new(volume_builder.finish()),
        Arc::new(difficulty_builder.finish()),
        Arc::new(info_builder.finish()),
        Arc::new(action_builder.finish()),
    ];

    let out = RecordBatch::try_new(Arc::new(schema), columns)?;
    info!(
        rows_in = batch.num_rows(),
        competitor_urls = out.num_rows(),
        "built content-opportunity report"
    );
    Ok(out)
}

/// Format every row of the filtered table where the domain of the topic row
/// ranks (position > 0) for the topic keyword.
fn domain_info(
    topic: Option<&str>,
    topic_domain: Option<&str>,
    num_rows: usize,
    keywords: &arrow::array::StringArray,
    domains: &arrow::array::StringArray,
    domain_positions: &arrow::array::Float64Array,
) -> String {
    let (Some(topic), Some(topic_domain)) = (topic, topic_domain) else {
        return String::new();
    };

    let mut parts = Vec::new();
    for i in 0..num_rows {
        let ranks = matches!(f64_value(domain_positions, i), Some(p) if p > 0.0);
        if ranks
            && str_value(keywords, i) == Some(topic)
            && str_value(domains, i) == Some(topic_domain)
        {
            parts.push(format!(
                "{} ({} - {})",
                topic,
                topic_domain,
                format_position(domain_positions.value(i))
            ));
        }
    }
    parts.join(", ")
}
