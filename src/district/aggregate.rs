use polars::prelude::{Column, DataFrame, PolarsResult};
use serde::Serialize;

use crate::grid::{Cell, TrafficLevel};
use super::{assign_cells, District, DistrictAssignment};

/// One row of the district table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSummary {
    pub district_id: usize,
    pub district_name: Option<String>,
    pub total_estimated_vehicles: f64,
    pub avg_score: f64,
    pub n_cells: usize,
    pub pct_low: f64,
    pub pct_medium: f64,
    pub pct_high: f64,
}

#[derive(Default)]
struct Tally {
    total: f64,
    score_sum: f64,
    levels: [usize; 3],
}

impl Tally {
    fn n_cells(&self) -> usize { self.levels.iter().sum() }
}

/// Roll classified cells up into `districts`, in layer order.
///
/// Districts without any attributed cell are omitted. Cells not yet
/// classified or attributed to no district are left out of every row.
pub fn aggregate(cells: &[Cell], districts: &[District], policy: DistrictAssignment) -> Vec<DistrictSummary> {
    let assigned = assign_cells(cells, districts, policy);
    let mut tallies = districts.iter().map(|_| Tally::default()).collect::<Vec<_>>();

    let mut unassigned = 0usize;
    for (cell, district) in cells.iter().zip(assigned) {
        let (Some(d), Some(class)) = (district, cell.classification) else {
            unassigned += 1;
            continue;
        };
        let tally = &mut tallies[d];
        tally.total += class.approx_count;
        tally.score_sum += class.score;
        tally.levels[class.traffic_level as usize] += 1;
    }
    if unassigned > 0 {
        tracing::debug!(unassigned, "cells left out of the district rollup");
    }

    let rows = districts.iter()
        .zip(tallies)
        .filter(|(_, tally)| tally.n_cells() > 0)
        .map(|(district, tally)| {
            let n = tally.n_cells();
            let pct = |level: TrafficLevel| tally.levels[level as usize] as f64 / n as f64;
            DistrictSummary {
                district_id: district.id,
                district_name: district.name.clone(),
                total_estimated_vehicles: tally.total,
                avg_score: tally.score_sum / n as f64,
                n_cells: n,
                pct_low: pct(TrafficLevel::Low),
                pct_medium: pct(TrafficLevel::Medium),
                pct_high: pct(TrafficLevel::High),
            }
        })
        .collect::<Vec<_>>();

    tracing::info!(districts = rows.len(), "aggregated districts");
    rows
}

/// District table with columns `district_id[, district_name],
/// total_estimated_vehicles, avg_score, n_cells, pct_low, pct_medium, pct_high`.
/// The name column is present only when some district carries a name.
pub fn to_dataframe(rows: &[DistrictSummary]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new("district_id".into(), rows.iter().map(|r| r.district_id as u64).collect::<Vec<_>>()),
    ];
    if rows.iter().any(|r| r.district_name.is_some()) {
        columns.push(Column::new("district_name".into(), rows.iter().map(|r| r.district_name.clone()).collect::<Vec<_>>()));
    }
    columns.extend([
        Column::new("total_estimated_vehicles".into(), rows.iter().map(|r| r.total_estimated_vehicles).collect::<Vec<_>>()),
        Column::new("avg_score".into(), rows.iter().map(|r| r.avg_score).collect::<Vec<_>>()),
        Column::new("n_cells".into(), rows.iter().map(|r| r.n_cells as u64).collect::<Vec<_>>()),
        Column::new("pct_low".into(), rows.iter().map(|r| r.pct_low).collect::<Vec<_>>()),
        Column::new("pct_medium".into(), rows.iter().map(|r| r.pct_medium).collect::<Vec<_>>()),
        Column::new("pct_high".into(), rows.iter().map(|r| r.pct_high).collect::<Vec<_>>()),
    ]);
    DataFrame::new(columns)
}
