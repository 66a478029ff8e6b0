//! Demo: build the p-arithmetic amalgam for SL2 at p = 3, reduce a few
//! elements to normal form, and report the presentation data as JSON.

use arithgroup::{
    ArithGroupPresentation, BigArithGroup, Sl2zOracle, StaticOracle, TreeConfig,
};
use num_bigint::BigInt;
use num_traits::One;
use quatalg_core::{ArithError, Element, Order};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Summary {
    p: u64,
    generators: usize,
    relators: usize,
    free_rank: usize,
    bt_reps: Vec<String>,
    reductions: Vec<ReductionReport>,
}

#[derive(Serialize)]
struct ReductionReport {
    input: String,
    head: String,
    word: Vec<(usize, u8)>,
}

fn run() -> Result<(), ArithError> {
    let p: u64 = 3;

    let gn = ArithGroupPresentation::from_oracle(
        Order::eichler_matrix_order(&BigInt::one())?,
        BigInt::one(),
        Arc::new(Sl2zOracle),
    )?;
    let gpn = ArithGroupPresentation::from_oracle(
        Order::eichler_matrix_order(&BigInt::from(p))?,
        BigInt::from(p),
        Arc::new(StaticOracle {
            generators: vec![
                Element::from_ints([1, 1, 0, 1]),
                Element::from_ints([1, 0, p as i64, 1]),
            ],
            relators: vec![],
        }),
    )?;

    println!("=== Arithmetic group presentation ===");
    println!("generators: {}", gn.gens.len());
    println!("relators:   {}", gn.relation_words.len());
    let ab = gn.abelianization();
    println!("abelianization free rank: {}", ab.free_rank());

    let group = BigArithGroup::new(gn, gpn, p, 20, TreeConfig::default())?;

    println!("\n=== Coset tree at p = {} ===", p);
    println!("wp = {}", group.wp());
    let reps = group.bt_reps()?.to_vec();
    for (i, r) in reps.iter().enumerate() {
        println!("  rep[{}] = {}", i, r);
    }

    println!("\n=== Amalgam reduction ===");
    let samples = [
        Element::from_ints([0, -1, 1, 0]),
        Element::from_ints([7, 3, 30, 13]),
        Element::from_ints([13, 4, 42, 13]),
    ];
    let mut reductions = Vec::new();
    for x in &samples {
        let (head, word) = group.reduce_in_amalgam(x)?;
        println!("  {} = {} * word {:?}", x, head, word);
        reductions.push(ReductionReport {
            input: x.to_string(),
            head: head.to_string(),
            word,
        });
    }

    let summary = Summary {
        p,
        generators: group.gn.gens.len(),
        relators: group.gn.relation_words.len(),
        free_rank: group.gn.abelianization().free_rank(),
        bt_reps: reps.iter().map(|r| r.to_string()).collect(),
        reductions,
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
