// Human-readable gameweek summaries.

use std::cmp::Ordering;
use std::fmt::Write;

use crate::squad::chips::Chip;
use crate::squad::context::GameweekContext;
use crate::squad::scoring::PlayerScore;
use crate::squad::state::Squad;

/// Performers listed at each end of the summary.
const SHOWN: usize = 3;

fn ranked(scores: &[PlayerScore], best_first: bool) -> Vec<&PlayerScore> {
    let mut sorted: Vec<&PlayerScore> = scores.iter().collect();
    sorted.sort_by(|a, b| {
        let ord = a.points.partial_cmp(&b.points).unwrap_or(Ordering::Equal);
        if best_first {
            ord.reverse()
        } else {
            ord
        }
    });
    sorted.truncate(SHOWN);
    sorted
}

fn join(scores: &[&PlayerScore]) -> String {
    scores
        .iter()
        .map(|s| format!("{} {:.1}", s.label(), s.points))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summary of a finalized gameweek: total, captaincy, top and worst three.
/// Projected points stand in for results that do not exist yet.
pub fn result_summary(squad: &Squad, ctx: &GameweekContext) -> String {
    let mut out = String::new();
    let actual = ctx.results_available();

    let (total, scores) = if actual {
        (squad.actual_total(ctx), squad.actual_breakdown(ctx))
    } else {
        let _ = writeln!(
            out,
            "IMPORTANT: No actual points available, displaying xP instead"
        );
        (squad.projected_total(ctx), squad.projected_breakdown(ctx))
    };

    let _ = writeln!(
        out,
        "GW{} - {} | {}: {:.1} | C: {} | VC: {}",
        ctx.gameweek(),
        ctx.season(),
        if actual { "P" } else { "xP" },
        total,
        squad.captain().unwrap_or("-"),
        squad.vice_captain().unwrap_or("-"),
    );

    let active: Vec<&str> = Chip::ALL
        .iter()
        .filter(|c| squad.chips().is_active(**c))
        .map(|c| c.label())
        .collect();
    if !active.is_empty() {
        let _ = writeln!(out, "Chips: {}", active.join(", "));
    }

    let _ = writeln!(out, "Top 3: {}", join(&ranked(&scores, true)));
    let _ = writeln!(out, "Worst 3: {}", join(&ranked(&scores, false)));
    let _ = writeln!(
        out,
        "Budget: {:.1} | Transfers left: {}",
        squad.budget(),
        squad.transfers_left()
    );
    out
}
