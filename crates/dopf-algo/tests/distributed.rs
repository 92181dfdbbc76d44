use dopf_algo::test_utils::{branched_declaration, branched_feeder, chain_feeder, two_area_declaration};
use dopf_algo::{
    solve_centralized, AdmmConfig, AdmmCoordinator, ClarabelBackend, EnappCoordinator,
    ObjectiveKind, TerminationStatus,
};
use dopf_core::Line;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn relative_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs().max(1e-12)
}

#[test]
fn test_centralized_substation_power_equals_total_load() {
    let net = chain_feeder(&[10.0, 12.0]);
    let result =
        solve_centralized(&net, ObjectiveKind::CostMinimizeWithDischargeCost, &ClarabelBackend::new())
            .unwrap();
    for (t, p) in &result.substation_power {
        assert!((p - net.total_load(*t)).abs() < 1e-5, "period {t}: {p}");
    }
}

#[test]
fn test_admm_matches_centralized_substation_power() {
    let net = chain_feeder(&[10.0, 12.0]);
    let centralized =
        solve_centralized(&net, ObjectiveKind::CostMinimizeWithDischargeCost, &ClarabelBackend::new())
            .unwrap();

    let outcome = AdmmCoordinator::new(AdmmConfig::default().with_rho(1.0))
        .solve(&net, &two_area_declaration())
        .unwrap();

    assert_eq!(outcome.status, TerminationStatus::Converged);
    assert!(outcome.iterations < 500);
    for (admm, central) in outcome
        .solution
        .substation_series()
        .iter()
        .zip(centralized.substation_series())
    {
        assert!(relative_error(*admm, central) < 1e-3, "{admm} vs {central}");
    }
}

#[test]
fn test_admm_stops_on_first_round_below_threshold() {
    let net = chain_feeder(&[10.0, 12.0]);
    let cfg = AdmmConfig::default().with_rho(1.0);
    let outcome = AdmmCoordinator::new(cfg.clone())
        .solve(&net, &two_area_declaration())
        .unwrap();

    let (last, earlier) = outcome.trace.split_last().unwrap();
    assert!(last.tolerance < cfg.tolerance);
    assert!(earlier.iter().all(|r| r.tolerance >= cfg.tolerance));
    assert_eq!(last.iteration, outcome.iterations);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_admm_boundary_mismatch_is_twice_last_consensus_step() {
    let net = chain_feeder(&[10.0, 12.0]);
    let cfg = AdmmConfig::default().with_rho(1.0);
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let outcome = tracing::subscriber::with_default(subscriber, || {
        AdmmCoordinator::new(cfg.clone())
            .solve(&net, &two_area_declaration())
            .unwrap()
    });
    assert_eq!(outcome.status, TerminationStatus::Converged);

    // The run one round shorter ends on the previous consensus value.
    let previous = AdmmCoordinator::new(cfg.clone().with_max_iter(outcome.iterations - 1))
        .solve(&net, &two_area_declaration())
        .unwrap();

    let tie = Line::new(2, 3);
    let step = net
        .periods()
        .map(|t| {
            let z = outcome.solution.line_flow_at(t, &tie).unwrap();
            let z_prev = previous.solution.line_flow_at(t, &tie).unwrap();
            (z - z_prev).abs()
        })
        .fold(0.0, f64::max);
    let mismatch = outcome.solution.tie_line_mismatch[&tie];
    assert!(
        (mismatch - 2.0 * step).abs() <= 1e-3 * mismatch,
        "mismatch {mismatch} vs step {step}"
    );

    // The stop rule bounds rho·|Δz|², not the view spread, so the spread stays
    // above the threshold and is reported.
    assert!(mismatch > cfg.tolerance);
    let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(logged.contains("WARN"), "{logged}");
    assert!(logged.contains("area views of tie-line disagree"), "{logged}");
    assert!(logged.contains("2->3"), "{logged}");
}

#[test]
fn test_admm_default_rho_stops_before_substation_power_settles() {
    let net = chain_feeder(&[10.0, 12.0]);
    let outcome = AdmmCoordinator::with_defaults()
        .solve(&net, &two_area_declaration())
        .unwrap();

    // With rho = 5e-5 the dual term vanishes and the consensus halves the
    // gap to the load each round: z_k = L·(1 − 2^−k).
    assert_eq!(outcome.status, TerminationStatus::Converged);
    assert_eq!(outcome.iterations, 6);
    let subs = outcome.solution.substation_series();
    assert!((subs[0] - 9.6875).abs() < 1e-3, "{subs:?}");
    assert!((subs[1] - 11.625).abs() < 1e-3, "{subs:?}");
    assert!(relative_error(subs[0], 10.0) > 1e-3);
}

#[test]
fn test_merged_tie_line_is_single_valued_and_matches_centralized() {
    let net = chain_feeder(&[10.0, 12.0]);
    let centralized =
        solve_centralized(&net, ObjectiveKind::SubstationPower, &ClarabelBackend::new()).unwrap();
    let outcome = AdmmCoordinator::new(
        AdmmConfig::default()
            .with_rho(1.0)
            .with_objective(ObjectiveKind::SubstationPower),
    )
    .solve(&net, &two_area_declaration())
    .unwrap();

    let tie = Line::new(2, 3);
    for t in net.periods() {
        let flows = &outcome.solution.line_flow[&t];
        assert!(flows.contains_key(&tie));
        assert!(flows.keys().all(|l| !l.from.as_str().starts_with('U')));
        assert!(flows.keys().all(|l| !l.to.as_str().starts_with('D')));

        let merged = outcome.solution.line_flow_at(t, &tie).unwrap();
        let reference = centralized.line_flow_at(t, &tie).unwrap();
        assert!(relative_error(merged, reference) < 1e-3, "{merged} vs {reference}");
    }
}

#[test]
fn test_admm_iteration_cap_is_not_an_error() {
    let net = chain_feeder(&[10.0, 12.0]);
    let outcome = AdmmCoordinator::new(AdmmConfig::default().with_max_iter(3))
        .solve(&net, &two_area_declaration())
        .unwrap();
    assert_eq!(outcome.status, TerminationStatus::MaxIterReached);
    assert!(!outcome.converged());
    assert_eq!(outcome.iterations, 3);
}

#[test]
fn test_enapp_system_objective_matches_centralized_on_branched_feeder() {
    let net = branched_feeder();
    let centralized =
        solve_centralized(&net, ObjectiveKind::CostMinimizeWithDischargeCost, &ClarabelBackend::new())
            .unwrap();
    let outcome = EnappCoordinator::with_defaults()
        .solve(&net, &branched_declaration())
        .unwrap();

    assert!(outcome.converged());
    assert!(outcome.iterations <= 4);
    assert_eq!(outcome.area_objectives.len(), 4);
    assert!(
        relative_error(outcome.solution.objective, centralized.objective) < 1e-4,
        "{} vs {}",
        outcome.solution.objective,
        centralized.objective
    );
}

#[test]
fn test_enapp_merged_result_covers_every_resource() {
    let net = branched_feeder();
    let outcome = EnappCoordinator::with_defaults()
        .solve(&net, &branched_declaration())
        .unwrap();

    let solution = &outcome.solution;
    for t in net.periods() {
        assert_eq!(solution.line_flow[&t].len(), net.lines.len());
        assert_eq!(solution.state_of_charge[&t].len(), net.storage_nodes.len());
        assert_eq!(solution.flex_charge[&t].len(), net.flex_nodes.len());
    }
}
