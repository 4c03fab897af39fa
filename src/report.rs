use crate::error::SfResult;
use crate::graph::CandidateGraph;
use crate::model::Problem;
use crate::scorer::Evaluation;
use itertools::Itertools;
use std::io::Write;

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(false)
        .from_writer(writer)
}

fn fmt_value(v: f64) -> String {
    format!("{:.4}", v)
}

/// One row per candidate edge of a real entity: `entity  peak  raw  context`.
pub fn write_candidate_table<W: Write>(writer: W, graph: &CandidateGraph) -> SfResult<()> {
    let mut wtr = tsv_writer(writer);
    wtr.write_record(["entity", "peak", "raw", "context"])?;

    for e in 0..graph.real_entities {
        let entity = &graph.entities[e];
        for edge in graph
            .candidates(e)
            .filter(|edge| !graph.peaks[edge.peak].padding)
            .sorted_by(|a, b| b.context.total_cmp(&a.context))
        {
            wtr.write_record([
                entity.id.clone(),
                graph.peaks[edge.peak].id.clone(),
                format!("{:.6}", edge.raw),
                format!("{:.6}", edge.context),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// One row per real entity with its assigned peak, the observed value in every dimension,
/// the mean prediction/consistency quality of its atoms, its own score and the overall
/// fitness. Unassigned entities show `-` for the peak and the observed values.
pub fn write_assignment_table<W: Write>(
    writer: W,
    graph: &CandidateGraph,
    problem: &Problem,
    matching: &[usize],
    evaluation: &Evaluation,
) -> SfResult<()> {
    let mut wtr = tsv_writer(writer);

    let mut header = vec!["entity".to_string(), "peak".to_string()];
    header.extend(problem.dimensions.iter().cloned());
    header.extend(
        ["quality_pred", "quality_multi", "score", "fitness"]
            .iter()
            .map(|s| s.to_string()),
    );
    wtr.write_record(&header)?;

    let fitness = fmt_value(evaluation.fitness);
    for e in 0..graph.real_entities {
        let entity = &graph.entities[e];
        let assigned = graph.assigned_peak(matching, e);

        let mut row = vec![
            entity.id.clone(),
            assigned
                .map(|p| graph.peaks[p].id.clone())
                .unwrap_or_else(|| "-".to_string()),
        ];

        for dim in 0..problem.dim_count() {
            let observed = assigned
                .filter(|_| entity.atoms.get(dim).copied().flatten().is_some())
                .and_then(|p| graph.peaks[p].dims.get(dim))
                .map(|pd| fmt_value(pd.value));
            row.push(observed.unwrap_or_else(|| "-".to_string()));
        }

        let atoms: Vec<usize> = entity.atoms.iter().flatten().copied().unique().collect();
        // no observed atom means no quality to report
        let qualities = atoms
            .iter()
            .any(|&a| evaluation.atoms[a].count > 0)
            .then(|| {
                let n = atoms.len() as f64;
                atoms.iter().map(|&a| evaluation.atoms[a]).fold((0.0, 0.0), |(p, m), s| {
                    (p + s.quality_pred / n, m + s.quality_multi / n)
                })
            });
        match qualities {
            Some((qp, qm)) => {
                row.push(fmt_value(qp));
                row.push(fmt_value(qm));
            }
            None => row.extend(["-".to_string(), "-".to_string()]),
        }
        row.push(fmt_value(evaluation.per_entity[e]));
        row.push(fitness.clone());

        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}
