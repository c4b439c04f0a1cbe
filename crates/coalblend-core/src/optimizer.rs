use std::collections::{BTreeMap, HashSet};

use coalblend_solver::{ConstraintOp, LpProblem, ObjectiveSense, SolutionStatus, Solver};

use crate::error::ScenarioError;
use crate::types::{
    AllocatedMaterial, Blend, BlendQuality, Material, Scenario, SolveResult, SolveStatus,
    Specification,
};

/// How a selected material enters the formulation: a pinned component is a
/// literal constant wherever it appears, an optimized one is an LP column.
#[derive(Debug, Clone, Copy)]
enum Component {
    Fixed(f64),
    Optimized(usize),
}

struct SelectedMaterial<'a> {
    id: &'a str,
    material: &'a Material,
    component: Component,
}

/// Blend the selected materials to maximize total calorific value.
///
/// Operator-pinned quantities are constants injected into every constraint;
/// the remaining materials become decision variables that together consume
/// exactly the residual quantity. All quality bounds are evaluated over the
/// combined blend, scaled by the full total quantity.
///
/// A fresh model and solver are built per call, so concurrent calls never
/// share state. Solver outcomes (Infeasible, Unbounded, Undefined) are
/// returned in the result status; only a malformed scenario is an `Err`.
pub fn solve(
    materials: &BTreeMap<String, Material>,
    scenario: &Scenario,
    spec: &Specification,
) -> Result<SolveResult, ScenarioError> {
    validate(materials, scenario)?;

    let mut components = Vec::with_capacity(scenario.selected.len());
    let mut var_names = Vec::new();
    for id in &scenario.selected {
        let component = match scenario.fixed.get(id) {
            Some(&quantity) => Component::Fixed(quantity),
            None => {
                var_names.push(id.clone());
                Component::Optimized(var_names.len() - 1)
            }
        };
        components.push(SelectedMaterial {
            id: id.as_str(),
            material: &materials[id],
            component,
        });
    }

    let total = scenario.total_quantity;
    let n_vars = var_names.len();
    let mut lp = LpProblem::new(var_names);

    let (cv_coeffs, fixed_cv) = attribute_row(&components, n_vars, |m| m.cv);
    lp.set_objective(cv_coeffs.clone(), ObjectiveSense::Maximize);

    // The optimized components must consume exactly what the pins left over.
    // With every material pinned this is the trivial row 0 = 0 and the solve
    // degenerates to a feasibility check on the quality rows.
    lp.add_constraint("residual", vec![1.0; n_vars], ConstraintOp::Eq, scenario.residual());

    lp.add_constraint("cv_min", cv_coeffs.clone(), ConstraintOp::Ge, spec.min_cv * total - fixed_cv);
    lp.add_constraint("cv_max", cv_coeffs, ConstraintOp::Le, spec.max_cv * total - fixed_cv);

    let (ash_coeffs, fixed_ash) = attribute_row(&components, n_vars, |m| m.ash);
    lp.add_constraint("ash_max", ash_coeffs, ConstraintOp::Le, spec.max_ash * total - fixed_ash);

    let (ts_coeffs, fixed_ts) = attribute_row(&components, n_vars, |m| m.ts);
    lp.add_constraint("ts_max", ts_coeffs, ConstraintOp::Le, spec.max_ts * total - fixed_ts);

    let (tm_coeffs, fixed_tm) = attribute_row(&components, n_vars, |m| m.tm);
    lp.add_constraint("tm_max", tm_coeffs, ConstraintOp::Le, spec.max_tm * total - fixed_tm);

    let solution = Solver::new().solve(&lp);
    let status = match solution.status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::Infeasible => SolveStatus::Infeasible,
        SolutionStatus::Unbounded => SolveStatus::Unbounded,
        SolutionStatus::Undefined => SolveStatus::Undefined,
    };
    if status != SolveStatus::Optimal {
        return Ok(SolveResult { status, blend: None });
    }

    let allocation: Vec<AllocatedMaterial> = components
        .iter()
        .map(|c| {
            let (quantity, pinned) = match c.component {
                Component::Fixed(q) => (q, true),
                Component::Optimized(j) => (solution.values[j], false),
            };
            AllocatedMaterial {
                id: c.id.to_string(),
                quantity,
                pinned,
            }
        })
        .collect();

    let quality = blended_quality(&components, &allocation, total);

    Ok(SolveResult {
        status,
        blend: Some(Blend { allocation, quality }),
    })
}

/// One coefficient vector plus the constant contribution of the pinned
/// components, so objective and constraints share a single formula.
fn attribute_row(
    components: &[SelectedMaterial<'_>],
    n_vars: usize,
    attr: impl Fn(&Material) -> f64,
) -> (Vec<f64>, f64) {
    let mut coeffs = vec![0.0; n_vars];
    let mut fixed_part = 0.0;
    for c in components {
        match c.component {
            Component::Fixed(quantity) => fixed_part += attr(c.material) * quantity,
            Component::Optimized(j) => coeffs[j] = attr(c.material),
        }
    }
    (coeffs, fixed_part)
}

/// Weighted averages over the full allocation. Dividing by the total is safe:
/// validation guarantees it positive, and the residual equality pins the
/// allocated mass to exactly that total.
fn blended_quality(
    components: &[SelectedMaterial<'_>],
    allocation: &[AllocatedMaterial],
    total: f64,
) -> BlendQuality {
    let mut cv = 0.0;
    let mut tm = 0.0;
    let mut ash = 0.0;
    let mut ts = 0.0;
    for (c, a) in components.iter().zip(allocation) {
        cv += c.material.cv * a.quantity;
        tm += c.material.tm * a.quantity;
        ash += c.material.ash * a.quantity;
        ts += c.material.ts * a.quantity;
    }
    BlendQuality {
        cv: cv / total,
        tm: tm / total,
        ash: ash / total,
        ts: ts / total,
    }
}

/// The InvalidScenario checks, applied before any solver invocation. Exposed
/// so callers can vet a scenario without paying for a solve.
pub fn validate(
    materials: &BTreeMap<String, Material>,
    scenario: &Scenario,
) -> Result<(), ScenarioError> {
    if scenario.selected.is_empty() {
        return Err(ScenarioError::EmptySelection);
    }
    if !scenario.total_quantity.is_finite() || scenario.total_quantity <= 0.0 {
        return Err(ScenarioError::NonPositiveTotal(scenario.total_quantity));
    }

    let mut seen = HashSet::new();
    for id in &scenario.selected {
        if !materials.contains_key(id) {
            return Err(ScenarioError::UnknownMaterial(id.clone()));
        }
        if !seen.insert(id.as_str()) {
            return Err(ScenarioError::DuplicateSelection(id.clone()));
        }
    }

    for (id, &quantity) in &scenario.fixed {
        if !seen.contains(id.as_str()) {
            return Err(ScenarioError::FixedNotSelected(id.clone()));
        }
        if !quantity.is_finite() || quantity < 0.0 || quantity > scenario.total_quantity {
            return Err(ScenarioError::InvalidFixedQuantity {
                id: id.clone(),
                quantity,
            });
        }
    }

    let fixed_total = scenario.fixed_total();
    if fixed_total > scenario.total_quantity {
        return Err(ScenarioError::FixedExceedsTotal {
            fixed_total,
            total_quantity: scenario.total_quantity,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn material(cv: f64, tm: f64, ash: f64, ts: f64) -> Material {
        Material { cv, tm, ash, ts }
    }

    fn coals() -> BTreeMap<String, Material> {
        BTreeMap::from([
            ("ANUGERAH".to_string(), material(5500.0, 17.0, 6.0, 0.4)),
            ("LJB".to_string(), material(4900.0, 26.0, 5.0, 0.4)),
            ("LJC".to_string(), material(4350.0, 31.0, 5.0, 0.3)),
            ("LJE".to_string(), material(4000.0, 37.0, 5.0, 0.25)),
        ])
    }

    fn buyer_spec() -> Specification {
        Specification {
            min_cv: 5000.0,
            max_cv: 5050.0,
            max_ash: 8.0,
            max_ts: 0.7,
            max_tm: 28.0,
        }
    }

    fn scenario(selected: &[&str], total: f64, fixed: &[(&str, f64)]) -> Scenario {
        Scenario {
            selected: selected.iter().map(|s| s.to_string()).collect(),
            total_quantity: total,
            fixed: fixed
                .iter()
                .map(|(id, q)| (id.to_string(), *q))
                .collect(),
        }
    }

    fn assert_within_spec(quality: &BlendQuality, spec: &Specification) {
        assert!(quality.cv >= spec.min_cv - TOL, "cv {} below min", quality.cv);
        assert!(quality.cv <= spec.max_cv + TOL, "cv {} above max", quality.cv);
        assert!(quality.ash <= spec.max_ash + TOL, "ash {}", quality.ash);
        assert!(quality.ts <= spec.max_ts + TOL, "ts {}", quality.ts);
        assert!(quality.tm <= spec.max_tm + TOL, "tm {}", quality.tm);
    }

    #[test]
    fn two_coal_blend_hits_cv_ceiling() {
        let scenario = scenario(&["ANUGERAH", "LJB"], 7.5, &[]);
        let result = solve(&coals(), &scenario, &buyer_spec()).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let blend = result.blend.unwrap();
        assert!((blend.total_quantity() - 7.5).abs() < TOL);
        assert_within_spec(&blend.quality, &buyer_spec());

        // Maximizing cv drives the blend to the 5050 ceiling, which pins the
        // split at 1.875 / 5.625
        assert!((blend.quality.cv - 5050.0).abs() < TOL);
        assert!((blend.quantity_of("ANUGERAH").unwrap() - 1.875).abs() < TOL);
        assert!((blend.quantity_of("LJB").unwrap() - 5.625).abs() < TOL);
    }

    #[test]
    fn three_coal_blend_stays_within_bounds() {
        let spec = Specification {
            min_cv: 4600.0,
            max_cv: 5200.0,
            max_ash: 8.0,
            max_ts: 0.7,
            max_tm: 30.0,
        };
        let scenario = scenario(&["ANUGERAH", "LJB", "LJC"], 10.0, &[]);
        let result = solve(&coals(), &scenario, &spec).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let blend = result.blend.unwrap();
        assert!((blend.total_quantity() - 10.0).abs() < TOL);
        assert_within_spec(&blend.quality, &spec);
        assert!((blend.quality.cv - 5200.0).abs() < TOL);
    }

    #[test]
    fn pinned_component_leaves_residual_to_solver() {
        let spec = Specification {
            min_cv: 4900.0,
            max_cv: 5500.0,
            max_ash: 8.0,
            max_ts: 0.7,
            max_tm: 28.0,
        };
        let scenario = scenario(&["ANUGERAH", "LJB"], 7.5, &[("ANUGERAH", 2.0)]);
        let result = solve(&coals(), &scenario, &spec).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let blend = result.blend.unwrap();

        let anugerah = blend.allocation.iter().find(|a| a.id == "ANUGERAH").unwrap();
        assert!(anugerah.pinned);
        assert!((anugerah.quantity - 2.0).abs() < TOL);

        // Residual conservation: the non-pinned quantities sum to what the
        // pins left over
        let solved: f64 = blend
            .allocation
            .iter()
            .filter(|a| !a.pinned)
            .map(|a| a.quantity)
            .sum();
        assert!((solved - 5.5).abs() < TOL);
        assert_within_spec(&blend.quality, &spec);
    }

    #[test]
    fn zero_residual_forces_free_component_to_zero() {
        let spec = Specification {
            min_cv: 5000.0,
            max_cv: 5600.0,
            max_ash: 8.0,
            max_ts: 0.7,
            max_tm: 28.0,
        };
        let scenario = scenario(&["ANUGERAH", "LJB"], 7.5, &[("ANUGERAH", 7.5)]);
        let result = solve(&coals(), &scenario, &spec).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let blend = result.blend.unwrap();
        assert!(blend.quantity_of("LJB").unwrap().abs() < TOL);
        assert!((blend.quality.cv - 5500.0).abs() < TOL);
    }

    #[test]
    fn all_pinned_feasible_is_optimal_without_variables() {
        let scenario = scenario(
            &["ANUGERAH", "LJB"],
            7.5,
            &[("ANUGERAH", 1.875), ("LJB", 5.625)],
        );
        let result = solve(&coals(), &scenario, &buyer_spec()).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let blend = result.blend.unwrap();
        assert!(blend.allocation.iter().all(|a| a.pinned));
        assert!((blend.quality.cv - 5050.0).abs() < TOL);
        assert_within_spec(&blend.quality, &buyer_spec());
    }

    #[test]
    fn all_pinned_infeasible_when_quality_misses() {
        // 2.0 / 5.5 averages cv 5060, above the 5050 ceiling
        let scenario = scenario(
            &["ANUGERAH", "LJB"],
            7.5,
            &[("ANUGERAH", 2.0), ("LJB", 5.5)],
        );
        let result = solve(&coals(), &scenario, &buyer_spec()).unwrap();

        assert_eq!(result.status, SolveStatus::Infeasible);
        assert!(result.blend.is_none());
    }

    #[test]
    fn infeasible_when_no_split_satisfies_spec() {
        // max_ash 5.0 forces ANUGERAH (ash 6) out entirely, but LJB alone
        // cannot reach min_cv 5000
        let mut spec = buyer_spec();
        spec.max_ash = 5.0;
        let scenario = scenario(&["ANUGERAH", "LJB"], 7.5, &[]);
        let result = solve(&coals(), &scenario, &spec).unwrap();

        assert_eq!(result.status, SolveStatus::Infeasible);
        assert!(result.blend.is_none());
    }

    #[test]
    fn tightening_a_bound_never_recovers_feasibility() {
        let mut spec = buyer_spec();
        spec.max_ash = 5.0;
        let scenario = scenario(&["ANUGERAH", "LJB"], 7.5, &[]);
        assert_eq!(
            solve(&coals(), &scenario, &spec).unwrap().status,
            SolveStatus::Infeasible
        );

        spec.max_tm = 20.0;
        assert_eq!(
            solve(&coals(), &scenario, &spec).unwrap().status,
            SolveStatus::Infeasible
        );
    }

    #[test]
    fn relaxing_bounds_preserves_optimality() {
        let scenario = scenario(&["ANUGERAH", "LJB"], 7.5, &[]);
        assert_eq!(
            solve(&coals(), &scenario, &buyer_spec()).unwrap().status,
            SolveStatus::Optimal
        );

        let relaxed = Specification {
            min_cv: 5000.0,
            max_cv: 6000.0,
            max_ash: 100.0,
            max_ts: 100.0,
            max_tm: 100.0,
        };
        let result = solve(&coals(), &scenario, &relaxed).unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);
        // With the ceiling out of the way the whole blend goes to the
        // highest-cv coal
        let blend = result.blend.unwrap();
        assert!((blend.quantity_of("ANUGERAH").unwrap() - 7.5).abs() < TOL);
    }

    #[test]
    fn overcommitted_pins_are_rejected_before_solving() {
        let scenario = scenario(
            &["ANUGERAH", "LJB"],
            7.5,
            &[("ANUGERAH", 4.0), ("LJB", 4.0)],
        );
        let err = solve(&coals(), &scenario, &buyer_spec()).unwrap_err();
        assert_eq!(
            err,
            ScenarioError::FixedExceedsTotal {
                fixed_total: 8.0,
                total_quantity: 7.5
            }
        );
    }

    #[test]
    fn malformed_scenarios_are_rejected() {
        let spec = buyer_spec();
        let materials = coals();

        let err = solve(&materials, &scenario(&[], 7.5, &[]), &spec).unwrap_err();
        assert_eq!(err, ScenarioError::EmptySelection);

        let err = solve(&materials, &scenario(&["ANUGERAH"], 0.0, &[]), &spec).unwrap_err();
        assert_eq!(err, ScenarioError::NonPositiveTotal(0.0));

        let err = solve(&materials, &scenario(&["KPC"], 7.5, &[]), &spec).unwrap_err();
        assert_eq!(err, ScenarioError::UnknownMaterial("KPC".to_string()));

        let err = solve(
            &materials,
            &scenario(&["ANUGERAH", "ANUGERAH"], 7.5, &[]),
            &spec,
        )
        .unwrap_err();
        assert_eq!(err, ScenarioError::DuplicateSelection("ANUGERAH".to_string()));

        let err = solve(
            &materials,
            &scenario(&["ANUGERAH"], 7.5, &[("LJB", 1.0)]),
            &spec,
        )
        .unwrap_err();
        assert_eq!(err, ScenarioError::FixedNotSelected("LJB".to_string()));

        let err = solve(
            &materials,
            &scenario(&["ANUGERAH"], 7.5, &[("ANUGERAH", -1.0)]),
            &spec,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScenarioError::InvalidFixedQuantity {
                id: "ANUGERAH".to_string(),
                quantity: -1.0
            }
        );

        let err = solve(
            &materials,
            &scenario(&["ANUGERAH", "LJB"], 7.5, &[("ANUGERAH", 9.0)]),
            &spec,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScenarioError::InvalidFixedQuantity {
                id: "ANUGERAH".to_string(),
                quantity: 9.0
            }
        );
    }
}
