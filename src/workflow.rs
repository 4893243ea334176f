use std::time::Instant;

use cluster::{assemble_clusters, assemble_gazetteer, assemble_links, Canonicalize};
use engine::{Labeler, MatchingEngine, SimilarityEngine, TrainingInput};
use fields::{compile, FieldSpec, RawFieldSpec};
use matcher::{MatchError, MatchMode, MatchOutput, ThresholdPolicy};
use model::{ModelLifecycle, TrainedModel};
use normalize::{normalize_table, NormalizeConfig};
use reconcile::{best_single_match, join_assignments, stack_linked, Dataset};
use table::Table;
use tracing::{info, Level};

use crate::options::{DedupeOptions, GazetteerOptions, LinkOptions};
use crate::{MetricsSpan, PipelineError};

fn normalize_stage(
    table: &Table,
    specs: &[FieldSpec],
    cfg: &NormalizeConfig,
) -> Result<Table, PipelineError> {
    let metrics = MetricsSpan::start();
    let result = normalize_table(table, specs, cfg);
    if let Some(span) = metrics {
        span.record_normalize(result.as_ref().map(|_| ()));
    }
    Ok(result?)
}

fn train_stage<E, L>(
    lifecycle: &ModelLifecycle,
    specs: &[FieldSpec],
    input: TrainingInput<'_>,
    labeler: &mut L,
) -> Result<TrainedModel<E>, PipelineError>
where
    E: MatchingEngine,
    L: Labeler + ?Sized,
{
    let metrics = MetricsSpan::start();
    let result = lifecycle.resolve::<E, L>(specs, input, labeler);
    if let Some(span) = metrics {
        span.record_training(result.as_ref().map(|model| model.origin));
    }
    Ok(result?)
}

fn match_stage<T, F>(mode: MatchMode, run: F) -> Result<MatchOutput<T>, PipelineError>
where
    F: FnOnce() -> Result<MatchOutput<T>, MatchError>,
{
    let metrics = MetricsSpan::start();
    let result = run();
    if let Some(span) = metrics {
        span.record_matching(mode, result.as_ref().map(|_| ()));
    }
    Ok(result?)
}

/// Output column names for `canonicalize` given the columns the matched
/// records carry. Subsets must name existing columns.
fn canonical_columns(
    canonicalize: &Canonicalize,
    columns: &[String],
) -> Result<Vec<String>, PipelineError> {
    match canonicalize {
        Canonicalize::Off => Ok(Vec::new()),
        Canonicalize::All => Ok(columns.to_vec()),
        Canonicalize::Fields(names) => {
            if let Some(unknown) = names.iter().find(|n| !columns.contains(n)) {
                return Err(PipelineError::UnknownCanonicalField(unknown.clone()));
            }
            Ok(names.clone())
        }
    }
}

/// Cluster duplicate rows of `table` with the built-in engine.
///
/// See [`dedupe_table_with`].
pub fn dedupe_table<L>(
    table: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &DedupeOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    L: Labeler + ?Sized,
{
    dedupe_table_with::<SimilarityEngine, L>(
        table,
        fields,
        config_name,
        canonicalize,
        options,
        labeler,
    )
}

/// Cluster duplicate rows of `table`.
///
/// Returns `table` unchanged plus `cluster_id`, `confidence` and the
/// requested `canonical_<field>` columns. Every input row is kept in order;
/// rows in no cluster carry nulls. `labeler` is only consulted when no
/// settings exist for `config_name` or `options.update` is set.
pub fn dedupe_table_with<E, L>(
    table: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &DedupeOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    E: MatchingEngine,
    L: Labeler + ?Sized,
{
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "recordlink.dedupe",
        config = %config_name,
        records = table.len()
    );
    let _guard = span.enter();

    let specs = compile(fields)?;
    let policy = options.policy();
    policy.validate()?;
    let canonical = canonical_columns(canonicalize, table.columns())?;
    let normalized = normalize_stage(table, &specs, &options.normalize)?;
    let records = normalized.to_records()?;

    let model = train_stage::<E, L>(
        &options.lifecycle(config_name),
        &specs,
        TrainingInput::Dedupe(&records),
        labeler,
    )?;
    let output = match_stage(MatchMode::SelfMatch, || {
        matcher::self_match(&model.engine, &records, policy)
    })?;

    let rows = assemble_clusters(&model.engine, &output.results, &records, canonicalize);
    let result = join_assignments(table, &rows, &canonical)?;

    info!(
        rows = result.len(),
        clusters = output.results.len(),
        threshold = output.threshold,
        elapsed_micros = start.elapsed().as_micros(),
        "dedupe_complete"
    );
    Ok(result)
}

/// Link rows of two tables with the built-in engine.
///
/// See [`link_tables_with`].
pub fn link_tables<L>(
    left: &Table,
    right: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &LinkOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    L: Labeler + ?Sized,
{
    link_tables_with::<SimilarityEngine, L>(
        left,
        right,
        fields,
        config_name,
        canonicalize,
        options,
        labeler,
    )
}

/// Pair rows of `left` with rows of `right`, one-to-one.
///
/// Row ids are tagged `dfa<id>` and `dfb<id>`. The result holds every row
/// of both tables, `left` rows first, stably sorted by `cluster_id` with
/// unpaired rows last. Columns are the union of both tables plus the
/// result columns.
pub fn link_tables_with<E, L>(
    left: &Table,
    right: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &LinkOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    E: MatchingEngine,
    L: Labeler + ?Sized,
{
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "recordlink.link",
        config = %config_name,
        left = left.len(),
        right = right.len()
    );
    let _guard = span.enter();

    let specs = compile(fields)?;
    let policy = ThresholdPolicy::Fixed(options.threshold);
    policy.validate()?;
    let mut columns = left.columns().to_vec();
    columns.extend(
        right
            .columns()
            .iter()
            .filter(|c| !left.has_column(c))
            .cloned(),
    );
    let canonical = canonical_columns(canonicalize, &columns)?;

    let left_records = Dataset::A
        .tag_table(&normalize_stage(left, &specs, &options.normalize)?)?
        .to_records()?;
    let right_records = Dataset::B
        .tag_table(&normalize_stage(right, &specs, &options.normalize)?)?
        .to_records()?;

    let model = train_stage::<E, L>(
        &options.lifecycle(config_name),
        &specs,
        TrainingInput::Link {
            left: &left_records,
            right: &right_records,
        },
        labeler,
    )?;
    let output = match_stage(MatchMode::Link, || {
        matcher::link(
            &model.engine,
            &left_records,
            &right_records,
            policy,
        )
    })?;

    let links = assemble_links(
        &model.engine,
        &output.results,
        &left_records,
        &right_records,
        canonicalize,
    );
    let result = stack_linked(left, right, &links, &canonical)?;

    info!(
        rows = result.len(),
        pairs = links.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "link_complete"
    );
    Ok(result)
}

/// Best-single-match left join with the built-in engine.
///
/// See [`left_join_tables_with`].
pub fn left_join_tables<L>(
    primary: &Table,
    secondary: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &DedupeOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    L: Labeler + ?Sized,
{
    left_join_tables_with::<SimilarityEngine, L>(
        primary,
        secondary,
        fields,
        config_name,
        canonicalize,
        options,
        labeler,
    )
}

/// Enrich `primary` with the columns of `secondary` it lacks.
///
/// Both tables are tagged, stacked (`secondary` first) and deduplicated as
/// one table. Each primary row keeps its id, its columns and its cluster
/// result columns, and takes the extra columns from the secondary row of
/// the same cluster with the fewest nulls. One row per primary record.
pub fn left_join_tables_with<E, L>(
    primary: &Table,
    secondary: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &DedupeOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    E: MatchingEngine,
    L: Labeler + ?Sized,
{
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "recordlink.left_join",
        config = %config_name,
        primary = primary.len(),
        secondary = secondary.len()
    );
    let _guard = span.enter();

    let stacked = Dataset::B
        .tag_table(secondary)?
        .concat(&Dataset::A.tag_table(primary)?)?;
    let deduped = dedupe_table_with::<E, L>(
        &stacked,
        fields,
        config_name,
        canonicalize,
        options,
        labeler,
    )?;
    let result = best_single_match(primary, secondary, &deduped)?;

    info!(
        rows = result.len(),
        columns = result.width(),
        elapsed_micros = start.elapsed().as_micros(),
        "left_join_complete"
    );
    Ok(result)
}

/// Gazetteer matching with the built-in engine.
///
/// See [`gazetteer_match_with`].
pub fn gazetteer_match<L>(
    gazette: &Table,
    messy: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &GazetteerOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    L: Labeler + ?Sized,
{
    gazetteer_match_with::<SimilarityEngine, L>(
        gazette,
        messy,
        fields,
        config_name,
        canonicalize,
        options,
        labeler,
    )
}

/// Resolve each row of `messy` to at most one row of `gazette`.
///
/// `gazette` must have exactly one column and `fields` must be a single
/// bare column name of `messy`; that column is matched against the
/// gazette's column. The result is `messy` plus `cluster_id` (the id of
/// the best gazette row), `confidence` and, when canonicalization is on,
/// `canonical_<field>` holding the gazette value.
pub fn gazetteer_match_with<E, L>(
    gazette: &Table,
    messy: &Table,
    fields: &[RawFieldSpec],
    config_name: &str,
    canonicalize: &Canonicalize,
    options: &GazetteerOptions,
    labeler: &mut L,
) -> Result<Table, PipelineError>
where
    E: MatchingEngine,
    L: Labeler + ?Sized,
{
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "recordlink.gazetteer",
        config = %config_name,
        gazette = gazette.len(),
        messy = messy.len()
    );
    let _guard = span.enter();

    let common = match gazette.columns() {
        [only] => only.clone(),
        other => return Err(PipelineError::GazetteShape { columns: other.len() }),
    };
    let field = match fields {
        [spec] if spec.is_bare() => spec.name().unwrap_or_default().to_string(),
        _ => return Err(PipelineError::GazetteerFieldSpec(fields.to_vec())),
    };
    if !messy.has_column(&field) {
        return Err(PipelineError::UnknownField(field));
    }
    let selection = match canonicalize {
        Canonicalize::Fields(names) => {
            if let Some(unknown) = names.iter().find(|n| **n != field) {
                return Err(PipelineError::UnknownCanonicalField(unknown.clone()));
            }
            Canonicalize::from(!names.is_empty())
        }
        other => other.clone(),
    };

    let policy = ThresholdPolicy::Fixed(options.threshold);
    policy.validate()?;

    let specs = compile(&[RawFieldSpec::Name(common.clone())])?;
    let mut renamed = messy.clone();
    if field != common {
        renamed.rename_column(&field, &common)?;
    }
    let canonical_records = normalize_stage(gazette, &specs, &options.normalize)?.to_records()?;
    let messy_records = normalize_stage(&renamed, &specs, &options.normalize)?.to_records()?;

    let model = train_stage::<E, L>(
        &options.lifecycle(config_name),
        &specs,
        TrainingInput::Gazetteer {
            messy: &messy_records,
            canonical: &canonical_records,
        },
        labeler,
    )?;
    let mut engine = model.engine;
    let output = match_stage(MatchMode::Gazetteer, || {
        matcher::gazetteer_search(
            &mut engine,
            &canonical_records,
            &messy_records,
            policy,
        )
    })?;

    let mut rows = assemble_gazetteer(&output.results, &canonical_records, &selection);
    for row in &mut rows {
        for (name, _) in &mut row.canonical {
            if *name == common {
                name.clone_from(&field);
            }
        }
    }
    let canonical = if selection.is_enabled() {
        vec![field]
    } else {
        Vec::new()
    };
    let result = join_assignments(messy, &rows, &canonical)?;

    info!(
        rows = result.len(),
        matched = rows.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "gazetteer_complete"
    );
    Ok(result)
}
