use cdcl_sat::sat::clause_management::ClauseManagementType;
use cdcl_sat::sat::cnf::Cnf;
use cdcl_sat::sat::restarter::RestarterType;
use cdcl_sat::sat::solver::{Solver, SolverConfig, SolverType};
use cdcl_sat::sat::variable_selection::HeuristicType;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

/// Random 3-SAT near the satisfiability threshold.
fn random_3sat(rng: &mut fastrand::Rng, num_vars: i32) -> Cnf {
    let num_clauses = num_vars * 426 / 100;
    let clauses: Vec<Vec<i32>> = (0..num_clauses)
        .map(|_| {
            let mut clause: Vec<i32> = Vec::with_capacity(3);
            while clause.len() < 3 {
                let v = rng.i32(1..=num_vars);
                if !clause.iter().any(|l: &i32| l.abs() == v) {
                    clause.push(if rng.bool() { v } else { -v });
                }
            }
            clause
        })
        .collect();
    Cnf::new(clauses).expect("non-empty formula")
}

/// `holes + 1` pigeons in `holes` holes. Always unsatisfiable.
fn pigeonhole(holes: i32) -> Cnf {
    let var = |p: i32, h: i32| p * holes + h + 1;
    let mut clauses: Vec<Vec<i32>> = (0..=holes)
        .map(|p| (0..holes).map(|h| var(p, h)).collect())
        .collect();
    for h in 0..holes {
        for p in 0..=holes {
            for q in p + 1..=holes {
                clauses.push(vec![-var(p, h), -var(q, h)]);
            }
        }
    }
    Cnf::new(clauses).expect("non-empty formula")
}

fn bench_random_3sat(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(42);
    let cnfs: Vec<Cnf> = (0..20).map(|_| random_3sat(&mut rng, 50)).collect();

    let mut group = c.benchmark_group("random 3-SAT (n=50)");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    let configs = [
        ("CDCL", SolverType::Cdcl, SolverConfig::default()),
        (
            "CDCL Luby",
            SolverType::Cdcl,
            SolverConfig::default().with_restarts(RestarterType::Luby),
        ),
        (
            "CDCL activity cleaning",
            SolverType::Cdcl,
            SolverConfig::default()
                .with_clause_management(ClauseManagementType::Activity)
                .with_max_learned(200),
        ),
        (
            "CDCL MOM",
            SolverType::Cdcl,
            SolverConfig::default().with_heuristic(HeuristicType::Mom),
        ),
        ("DPLL", SolverType::Dpll, SolverConfig::default()),
    ];

    for (name, kind, config) in configs {
        group.bench_function(name, |b| {
            b.iter(|| {
                for cnf in &cnfs {
                    let mut solver = kind.to_impl(cnf, config.clone());
                    black_box(solver.solve());
                }
            });
        });
    }

    group.finish();
}

fn bench_pigeonhole(c: &mut Criterion) {
    let mut group = c.benchmark_group("pigeonhole");
    group.sample_size(10);

    for holes in [5, 6] {
        let cnf = pigeonhole(holes);
        for kind in [SolverType::Cdcl, SolverType::Dpll] {
            group.bench_function(format!("{kind} {holes} holes"), |b| {
                b.iter(|| {
                    let mut solver = kind.to_impl(&cnf, SolverConfig::default());
                    black_box(solver.solve());
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_random_3sat, bench_pigeonhole);
criterion_main!(benches);
