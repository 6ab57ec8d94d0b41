// src/process/rank.rs
use anyhow::Result;
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float64Builder, StringArray},
    compute::filter_record_batch,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::process::utils::{cmp_volume_desc, f64_col, f64_value, take_batch};
use crate::schema::{
    self, COMPETITOR_POSITION, DOMAIN_POSITION, KEYWORD_DIFFICULTY, SEARCH_VOLUME,
};

/// Columns rebuilt as nullable f64 before any comparison runs. Keyword
/// difficulty is included so the aggregation stage can average it without
/// re-inspecting cell contents.
const NUMERIC_COLUMNS: [&str; 4] = [
    SEARCH_VOLUME,
    KEYWORD_DIFFICULTY,
    DOMAIN_POSITION,
    COMPETITOR_POSITION,
];

/// Normalize numerics, order by search volume, and drop rows where the
/// domain already outranks the competitor.
///
/// The competitive rule excludes a row when
/// `Domain Position > Competitor Position && Domain Position != 0`; a null on
/// either side makes the comparison false, so rows with unknown positions are
/// kept. Position 0 means "not ranking", never "top rank", and is likewise
/// kept.
pub fn rank_and_filter(batch: &RecordBatch) -> Result<RecordBatch> {
    // Step A: string columns become nullable f64, bad cells become null.
    let coerced = coerce_numeric_columns(batch)?;

    // Step B: stable sort, highest search volume first, nulls last.
    let volumes = f64_col(&coerced, SEARCH_VOLUME)?;
    let mut order: Vec<u32> = (0..coerced.num_rows() as u32).collect();
    order.sort_by(|&a, &b| {
        cmp_volume_desc(
            f64_value(volumes, a as usize),
            f64_value(volumes, b as usize),
        )
    });
    let sorted = take_batch(&coerced, &order)?;

    // Step C: the narrow gate. The merged data may legitimately lack this
    // column (it is not part of the primary contract), so it is re-checked
    // here with its own error.
    schema::check_competitor_position(&sorted)?;

    // Step D: apply the competitive-position rule.
    let domain_pos = f64_col(&sorted, DOMAIN_POSITION)?;
    let competitor_pos = f64_col(&sorted, COMPETITOR_POSITION)?;
    let keep: BooleanArray = (0..sorted.num_rows())
        .map(|i| {
            let excluded = match (
                f64_value(domain_pos, i),
                f64_value(competitor_pos, i),
            ) {
                (Some(dp), Some(cp)) => dp > cp && dp != 0.0,
                _ => false,
            };
            Some(!excluded)
        })
        .collect();

    let filtered = filter_record_batch(&sorted, &keep)?;
    info!(
        rows_in = sorted.num_rows(),
        rows_out = filtered.num_rows(),
        "applied competitive position filter"
    );
    Ok(filtered)
}

/// Rebuild each known numeric column as `Float64`, turning every value that
/// does not parse into a null. Unparseable non-empty values are logged; a
/// null cell coerces silently.
fn coerce_numeric_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut fields: Vec<Arc<Field>> = batch.schema().fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    for name in NUMERIC_COLUMNS {
        let Some((idx, _)) = batch.schema().column_with_name(name) else {
            continue;
        };
        let Some(strings) = columns[idx].as_any().downcast_ref::<StringArray>() else {
            // Already numeric; nothing to do.
            continue;
        };

        let mut builder = Float64Builder::with_capacity(strings.len());
        let mut coerced_nulls = 0usize;
        for i in 0..strings.len() {
            if strings.is_null(i) {
                builder.append_null();
                continue;
            }
            let raw = strings.value(i).trim();
            match raw.parse::<f64>() {
                Ok(v) => builder.append_value(v),
                Err(_) => {
                    warn!(column = name, value = raw, "value is not numeric; treating as null");
                    coerced_nulls += 1;
                    builder.append_null();
                }
            }
        }
        if coerced_nulls > 0 {
            debug!(column = name, coerced_nulls, "numeric coercion produced nulls");
        }

        columns[idx] = Arc::new(builder.finish()) as ArrayRef;
        fields[idx] = Arc::new(Field::new(name, DataType::Float64, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::process::utils::{str_col, str_value};
    use crate::schema::{COMPETITOR_URL, DOMAIN, KEYWORD};

    struct Row<'a> {
        keyword: &'a str,
        volume: Option<&'a str>,
        domain_pos: Option<&'a str>,
        competitor_pos: Option<&'a str>,
    }

    fn batch(rows: &[Row<'_>], with_competitor_pos: bool) -> RecordBatch {
        let mut names = vec![KEYWORD, SEARCH_VOLUME, DOMAIN_POSITION];
        if with_competitor_pos {
            names.push(COMPETITOR_POSITION);
        }
        let fields: Vec<Field> = names
            .iter()
            .map(|n| Field::new(*n, DataType::Utf8, true))
            .collect();

        let keywords: StringArray = rows.iter().map(|r| Some(r.keyword)).collect();
        let volumes: StringArray = rows.iter().map(|r| r.volume).collect();
        let domain_pos: StringArray = rows.iter().map(|r| r.domain_pos).collect();
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(keywords),
            Arc::new(volumes),
            Arc::new(domain_pos),
        ];
        if with_competitor_pos {
            let competitor_pos: StringArray =
                rows.iter().map(|r| r.competitor_pos).collect();
            columns.push(Arc::new(competitor_pos));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
    }

    fn keywords_of(batch: &RecordBatch) -> Vec<String> {
        let col = str_col(batch, KEYWORD).unwrap();
        (0..batch.num_rows())
            .map(|i| str_value(col, i).unwrap().to_string())
            .collect()
    }

    #[test]
    fn unparseable_values_become_null_not_errors() -> Result<()> {
        let input = batch(
            &[Row {
                keyword: "seo tips",
                volume: Some("lots"),
                domain_pos: Some("n/a"),
                competitor_pos: Some("1"),
            }],
            true,
        );
        let out = rank_and_filter(&input)?;
        // Null domain position: the exclusion comparison is false, row kept.
        assert_eq!(out.num_rows(), 1);
        let volumes = f64_col(&out, SEARCH_VOLUME)?;
        assert_eq!(f64_value(volumes, 0), None);
        Ok(())
    }

    #[test]
    fn sorts_by_volume_descending_nulls_last() -> Result<()> {
        let input = batch(
            &[
                Row {
                    keyword: "mid",
                    volume: Some("300"),
                    domain_pos: Some("0"),
                    competitor_pos: Some("1"),
                },
                Row {
                    keyword: "unknown",
                    volume: None,
                    domain_pos: Some("0"),
                    competitor_pos: Some("1"),
                },
                Row {
                    keyword: "top",
                    volume: Some("500"),
                    domain_pos: Some("0"),
                    competitor_pos: Some("1"),
                },
            ],
            true,
        );
        let out = rank_and_filter(&input)?;
        assert_eq!(keywords_of(&out), vec!["top", "mid", "unknown"]);
        Ok(())
    }

    #[test]
    fn missing_competitor_position_gate_fires() {
        let input = batch(
            &[Row {
                keyword: "seo tips",
                volume: Some("100"),
                domain_pos: Some("3"),
                competitor_pos: None,
            }],
            false,
        );
        let err = rank_and_filter(&input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingCompetitorPosition)
        ));
    }

    #[test]
    fn outranked_domain_rows_are_dropped() -> Result<()> {
        let input = batch(
            &[
                // Domain ranks worse (3 > 1) and is ranking: dropped.
                Row {
                    keyword: "dropped",
                    volume: Some("100"),
                    domain_pos: Some("3"),
                    competitor_pos: Some("1"),
                },
                // Domain not ranking at all (position 0): kept.
                Row {
                    keyword: "kept zero",
                    volume: Some("90"),
                    domain_pos: Some("0"),
                    competitor_pos: Some("1"),
                },
                // Domain ranks better (2 < 5): kept.
                Row {
                    keyword: "kept better",
                    volume: Some("80"),
                    domain_pos: Some("2"),
                    competitor_pos: Some("5"),
                },
            ],
            true,
        );
        let out = rank_and_filter(&input)?;
        assert_eq!(keywords_of(&out), vec!["kept zero", "kept better"]);
        Ok(())
    }

    #[test]
    fn null_operands_never_trigger_exclusion() -> Result<()> {
        let input = batch(
            &[
                Row {
                    keyword: "null domain pos",
                    volume: Some("100"),
                    domain_pos: None,
                    competitor_pos: Some("1"),
                },
                Row {
                    keyword: "null competitor pos",
                    volume: Some("90"),
                    domain_pos: Some("7"),
                    competitor_pos: None,
                },
            ],
            true,
        );
        let out = rank_and_filter(&input)?;
        assert_eq!(out.num_rows(), 2);
        Ok(())
    }

    #[test]
    fn survivors_satisfy_the_soundness_property() -> Result<()> {
        let input = batch(
            &[
                Row {
                    keyword: "a",
                    volume: Some("5"),
                    domain_pos: Some("9"),
                    competitor_pos: Some("2"),
                },
                Row {
                    keyword: "b",
                    volume: Some("4"),
                    domain_pos: Some("1"),
                    competitor_pos: Some("2"),
                },
                Row {
                    keyword: "c",
                    volume: Some("3"),
                    domain_pos: Some("0"),
                    competitor_pos: Some("2"),
                },
                Row {
                    keyword: "d",
                    volume: Some("2"),
                    domain_pos: None,
                    competitor_pos: Some("2"),
                },
            ],
            true,
        );
        let out = rank_and_filter(&input)?;
        let dp = f64_col(&out, DOMAIN_POSITION)?;
        let cp = f64_col(&out, COMPETITOR_POSITION)?;
        for i in 0..out.num_rows() {
            let sound = match (f64_value(dp, i), f64_value(cp, i)) {
                (Some(d), Some(c)) => d <= c || d == 0.0,
                _ => true,
            };
            assert!(sound, "row {} violates the filter rule", i);
        }
        Ok(())
    }

    #[test]
    fn unrelated_columns_pass_through_coercion_untouched() -> Result<()> {
        let schema = Schema::new(vec![
            Field::new(KEYWORD, DataType::Utf8, true),
            Field::new(SEARCH_VOLUME, DataType::Utf8, true),
            Field::new(DOMAIN_POSITION, DataType::Utf8, true),
            Field::new(COMPETITOR_POSITION, DataType::Utf8, true),
            Field::new(DOMAIN, DataType::Utf8, true),
            Field::new(COMPETITOR_URL, DataType::Utf8, true),
        ]);
        let input = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![Some("seo tips")])),
                Arc::new(StringArray::from(vec![Some("100")])),
                Arc::new(StringArray::from(vec![Some("0")])),
                Arc::new(StringArray::from(vec![Some("1")])),
                Arc::new(StringArray::from(vec![Some("a.com")])),
                Arc::new(StringArray::from(vec![Some("x.com/blog")])),
            ],
        )?;
        let out = rank_and_filter(&input)?;
        let domains = str_col(&out, DOMAIN)?;
        assert_eq!(str_value(domains, 0), Some("a.com"));
        Ok(())
    }
}
