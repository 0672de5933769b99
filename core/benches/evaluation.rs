use std::error::Error;

use atomic_core::{
    basis::{basis_function_expression, GaussianBasisSet, Representation},
    config::ConfigBasisSet,
    expr::Program,
    field::FieldParams,
    testing::TestInstance,
    universe::Universe,
    xyz::parse_xyz,
};

use criterion::{criterion_group, criterion_main, Criterion};

const STO3G: &str = r#"{
    "name": "STO-3G",
    "elements": {
        "H": {"electron_shells": [
            {"angular_momentum": [0], "exponents": ["3.42525091", "0.62391373", "0.16885540"],
             "coefficients": [["0.15432897", "0.53532814", "0.44463454"]]}
        ]},
        "O": {"electron_shells": [
            {"angular_momentum": [0], "exponents": ["130.7093200", "23.8088610", "6.4436083"],
             "coefficients": [["0.15432897", "0.53532814", "0.44463454"]]},
            {"angular_momentum": [0, 1], "exponents": ["5.0331513", "1.1695961", "0.3803890"],
             "coefficients": [["-0.09996723", "0.39951283", "0.70011547"], ["0.15591627", "0.60768372", "0.39195739"]]}
        ]}
    }
}"#;

const WATER: &str = "3 A
water
O 0.0 0.0 0.1173
H 0.0 0.7572 -0.4692
H 0.0 -0.7572 -0.4692
";

fn water() -> Result<TestInstance, Box<dyn Error>> {
    let config: ConfigBasisSet = serde_json::from_str(STO3G)?;
    let basis_set = GaussianBasisSet::try_from(config)?;
    let universe = Universe::from(parse_xyz(WATER.as_bytes(), "au")?).with_basis_set(basis_set);

    Ok(TestInstance::new(
        "water STO-3G".to_owned(),
        &universe,
        0,
        Representation::Spherical,
    )?)
}

fn bench_evaluation(c: &mut Criterion) {
    let instance = water().unwrap();
    let points = FieldParams::cube(-4.0, 4.0, 20).geometry().unwrap().points();

    let exprs = instance
        .basis_functions()
        .iter()
        .map(|function| basis_function_expression(function, Some(8)))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let programs = exprs.iter().map(Program::compile).collect::<Vec<_>>();

    c.bench_function(&format!("Expression tree {}", instance.name), |b| {
        b.iter(|| {
            exprs
                .iter()
                .map(|expr| points.iter().map(|r| expr.eval(r.x, r.y, r.z)).sum::<f64>())
                .sum::<f64>()
        })
    });

    c.bench_function(&format!("Compiled {}", instance.name), |b| {
        b.iter(|| {
            programs
                .iter()
                .map(|program| program.eval_many(&points).into_iter().sum::<f64>())
                .sum::<f64>()
        })
    });
}

criterion_group!(benches, bench_evaluation);
criterion_main!(benches);
