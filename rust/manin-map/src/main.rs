//! Demo: evaluate a weight-two modular symbol of level one and apply a few
//! Hecke operators, printing the results as JSON.

use manin_map::{
    unimod_matrices_to_infty, HeckeAlgorithm, HeckeOptions, LevelOneRelations, ManinError,
    ManinMap, Mat2Z, Symk,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Summary {
    weight: usize,
    path_lengths: Vec<(i64, i64, usize)>,
    hecke: Vec<HeckeReport>,
}

#[derive(Serialize)]
struct HeckeReport {
    ell: u64,
    prep: Vec<String>,
    naive: Vec<String>,
}

fn rat(n: i64) -> BigRational {
    BigRational::from(BigInt::from(n))
}

fn run() -> Result<(), ManinError> {
    let k = 2;
    let rels = Arc::new(LevelOneRelations::new());
    let f = ManinMap::new(Symk::new(k), rels, vec![vec![rat(1), rat(-2), rat(3)]])?;

    println!("=== Unimodular paths ===");
    let mut path_lengths = Vec::new();
    for (r, s) in [(19i64, 23i64), (11, 25), (-3, 7)] {
        let v = unimod_matrices_to_infty(&BigInt::from(r), &BigInt::from(s));
        println!("path 0 -> {}/{} splits into {} pieces", r, s, v.len());
        path_lengths.push((r, s, v.len()));
    }

    println!("\n=== Evaluation ===");
    let a = Mat2Z::from_ints([1, 19, 0, 23]);
    println!("f({}) = {:?}", a, f.evaluate(&a)?);

    println!("\n=== Hecke operators ===");
    let mut hecke = Vec::new();
    for ell in [2u64, 3, 5] {
        let prep = f.hecke(ell, &HeckeOptions::default())?;
        let naive = f.hecke(
            ell,
            &HeckeOptions {
                algorithm: HeckeAlgorithm::Naive,
                ..Default::default()
            },
        )?;
        let pv = prep.gen_value(0)?;
        let nv = naive.gen_value(0)?;
        println!("T_{}: prep {:?}, naive {:?}, agree: {}", ell, pv, nv, pv == nv);
        hecke.push(HeckeReport {
            ell,
            prep: pv.iter().map(|c| c.to_string()).collect(),
            naive: nv.iter().map(|c| c.to_string()).collect(),
        });
    }

    let summary = Summary {
        weight: k,
        path_lengths,
        hecke,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("\n{}", json),
        Err(e) => eprintln!("serialization failed: {}", e),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
