use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use itertools::Itertools;
use shiftforge::api::AssignmentResult;
use shiftforge::graph::CandidateGraph;

fn score_color(score: f64) -> Color {
    if score >= 0.5 {
        Color::Green
    } else if score >= 0.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn print_assignment_report(graph: &CandidateGraph, result: &AssignmentResult) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Entity").add_attribute(Attribute::Bold),
        Cell::new("Peak").add_attribute(Attribute::Bold),
        Cell::new("Observed"),
        Cell::new("Score").fg(Color::Cyan),
    ]);

    for e in 0..graph.real_entities {
        let assigned = graph.assigned_peak(&result.matching, e);
        let peak = assigned.map(|p| graph.peaks[p].id.as_str()).unwrap_or("-");
        let observed = assigned
            .map(|p| {
                graph.peaks[p]
                    .dims
                    .iter()
                    .map(|d| format!("{:.3}", d.value))
                    .join(" / ")
            })
            .unwrap_or_default();
        let score = result.per_entity()[e];

        table.add_row(vec![
            Cell::new(&graph.entities[e].id),
            Cell::new(peak).set_alignment(CellAlignment::Center),
            Cell::new(observed),
            Cell::new(format!("{:.4}", score)).fg(score_color(score)),
        ]);
    }

    println!("\n{}", table);
}

pub fn print_summary(result: &AssignmentResult) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![
        Cell::new("Baseline fitness"),
        Cell::new(format!("{:.6}", result.baseline_fitness)),
    ]);
    table.add_row(vec![
        Cell::new("Final fitness").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.6}", result.fitness)).fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Generations"),
        Cell::new(result.generations.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Stopped by"),
        Cell::new(result.stop_reason.to_string()),
    ]);
    println!("{}", table);
}

pub fn print_candidate_summary(graph: &CandidateGraph) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Entity").add_attribute(Attribute::Bold),
        Cell::new("Candidates"),
        Cell::new("Best peak"),
        Cell::new("Context"),
    ]);

    for e in 0..graph.real_entities {
        let best = graph
            .candidates(e)
            .max_by(|a, b| a.context.total_cmp(&b.context));
        let count = graph.candidate_count(e);
        table.add_row(vec![
            Cell::new(&graph.entities[e].id),
            Cell::new(count.to_string()).fg(if count == 0 { Color::Red } else { Color::Reset }),
            Cell::new(best.map(|b| graph.peaks[b.peak].id.as_str()).unwrap_or("-")),
            Cell::new(best.map(|b| format!("{:.4}", b.context)).unwrap_or_default()),
        ]);
    }

    println!("\n{}", table);
    println!(
        "{} entities x {} peaks (padded to {}), {} candidate edges, {} mutable",
        graph.real_entities,
        graph.real_peaks,
        graph.size(),
        graph.edges.len(),
        graph.mutable_positions().len()
    );
}
