extern crate acm;
extern crate clap;
extern crate netlib_src;

use std::path::Path;
use std::process;
use acm::cg::CgStore;
use acm::hamiltonian::{acm_hamiltonian, ham_rwc, rwc_alam, HamCoefs};
use acm::{acm_adapt, acm_scale, AcmContext, OpSum, Xparams};

const COEF_NAMES: [&str; 14] = [
    "c11", "c20", "c21", "c22", "c23", "c30", "c31", "c32", "c33",
    "c40", "c41", "c42", "c43", "c50",
];

fn coef_mut<'a>(c: &'a mut HamCoefs, name: &str) -> &'a mut f64 {
    match name {
        "c11" => &mut c.c11,
        "c20" => &mut c.c20,
        "c21" => &mut c.c21,
        "c22" => &mut c.c22,
        "c23" => &mut c.c23,
        "c30" => &mut c.c30,
        "c31" => &mut c.c31,
        "c32" => &mut c.c32,
        "c33" => &mut c.c33,
        "c40" => &mut c.c40,
        "c41" => &mut c.c41,
        "c42" => &mut c.c42,
        "c43" => &mut c.c43,
        "c50" => &mut c.c50,
        _ => unreachable!("{} is not in COEF_NAMES", name),
    }
}

fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).map(|s| s.parse().unwrap_or_else(|_| {
        eprintln!("error: invalid value for --{}: {}", name, s);
        process::exit(2);
    }))
}

fn format_list(xs: &[f64]) -> String {
    let xs: Vec<_> = xs.iter().map(|x| format!("{}", x)).collect();
    format!("[{}]", xs.join(", "))
}

fn run(matches: &clap::ArgMatches) -> acm::Result<()> {
    let mut ctx = match matches.value_of("config") {
        Some(path) => AcmContext::load(Path::new(path))?,
        None => AcmContext::default(),
    };
    if let Some(dir) = matches.value_of("cg-dir") {
        ctx = ctx.with_cg_dir(dir);
    }
    if let Some(nu_lap) = parse_arg(matches, "nu-lap") {
        ctx = ctx.with_nu_lap(nu_lap);
    }
    if let Some(tr) = matches.value_of("transition") {
        ctx = ctx.with_transition(Some(OpSum::parse(tr)?));
    }
    ctx.check()?;

    let mut x = Xparams::default();
    let (h, alam) = if let Some(ham) = matches.value_of("ham") {
        (OpSum::parse(ham)?, None)
    } else if let Some(rwc) = matches.value_of("rwc") {
        let p: Vec<f64> = rwc.split(',')
            .map(|s| s.trim().parse().unwrap_or(std::f64::NAN))
            .collect();
        if p.len() != 5 || p.iter().any(|x| !x.is_finite()) {
            return Err(acm::Error::Range(format!(
                "--rwc expects B,c1,c2,chi,kappa, got {}", rwc)));
        }
        (ham_rwc(p[0], p[1], p[2], p[3], p[4]), Some(rwc_alam(p[0], p[1], p[2])?))
    } else {
        let mut coefs = HamCoefs::default();
        for name in COEF_NAMES.iter() {
            if let Some(c) = parse_arg(matches, name) {
                *coef_mut(&mut coefs, name) = c;
            }
        }
        (acm_hamiltonian(&coefs), None)
    };
    if let Some((anorm, lambda0)) = alam {
        x.anorm = anorm;
        x.lambda0 = lambda0;
    }
    if let Some(anorm) = parse_arg(matches, "anorm") {
        x.anorm = anorm;
    }
    if let Some(lambda0) = parse_arg(matches, "lambda0") {
        x.lambda0 = lambda0;
    }
    x.nu_min = parse_arg(matches, "nu-min").unwrap_or(0);
    x.nu_max = parse_arg(matches, "nu-max").unwrap_or(0);
    x.v_min = parse_arg(matches, "v-min").unwrap_or(0);
    x.v_max = parse_arg(matches, "v-max").unwrap_or(0);
    x.l_min = parse_arg(matches, "l-min").unwrap_or(0);
    x.l_max = parse_arg(matches, "l-max").unwrap_or(x.l_min);
    println!("hamiltonian: '{}'", h);
    println!("anorm: {}", x.anorm);
    println!("lambda0: {}", x.lambda0);
    println!("nu: [{}, {}]", x.nu_min, x.nu_max);
    println!("v: [{}, {}]", x.v_min, x.v_max);
    println!("l: [{}, {}]", x.l_min, x.l_max);
    println!("dim: {}", x.dim());

    let cg = CgStore::new(ctx.cg_dir.clone());
    println!("# diagonalising...");
    let results = if matches.is_present("adapt") {
        let (adapted, results) = acm_adapt(&cg, &ctx, &h, &x)?;
        ctx = adapted;
        results
    } else {
        acm_scale(&cg, &ctx, &h, &x)?
    };
    println!("eig_sft: {}", ctx.eig_sft);
    println!("rat_sft: {}", ctx.rat_sft);

    println!("eigenvalues:");
    for (l, vals) in results.lvals.iter().zip(&results.eigen_vals) {
        println!("  {}: {}", l, format_list(vals));
    }
    println!("relative_energies:");
    let rel = results.relative_energies(&ctx);
    for (l, vals) in results.lvals.iter().zip(&rel) {
        println!("  {}: {}", l, format_list(vals));
    }

    if let Some(ref melements) = results.melements {
        let max_states: usize = parse_arg(matches, "max-states").unwrap_or(3);
        println!("transition_rates:");
        for (j, &li) in results.lvals.iter().enumerate() {
            for (i, &lf) in results.lvals.iter().enumerate() {
                let block = &melements[i][j];
                for ni in 1 ..= block.num_cols().min(max_states) {
                    for nf in 1 ..= block.num_rows().min(max_states) {
                        let rate = results.relative_rate(&ctx, li, ni, lf, nf)?;
                        if rate != 0.0 {
                            println!("  - {{ li: {}, ni: {}, lf: {}, nf: {}, rate: {} }}",
                                     li, ni, lf, nf, rate);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() {
    let mut app = clap::App::new(env!("CARGO_PKG_NAME"))
        .args_from_usage("[--config=<config>] 'YAML file holding the calculation context'")
        .args_from_usage("[--cg-dir=<cg-dir>] 'Directory of the SO(5)>SO(3) CG tables'")
        .args_from_usage("[--nu-lap=<nu-lap>] 'Radial overshoot for operator products'")
        .args_from_usage("[--transition=<transition>] 'Transition operator'")
        .args_from_usage("[--ham=<ham>] 'Hamiltonian written as an operator sum'")
        .args_from_usage("[--rwc=<rwc>] 'RWC Hamiltonian parameters B,c1,c2,chi,kappa'")
        .args_from_usage("[--anorm=<anorm>] 'Radial scale a'")
        .args_from_usage("[--lambda0=<lambda0>] 'Radial lambda base'")
        .args_from_usage("[--nu-min=<nu-min>] 'Lowest radial quantum number'")
        .args_from_usage("--nu-max=<nu-max> 'Highest radial quantum number'")
        .args_from_usage("[--v-min=<v-min>] 'Lowest seniority'")
        .args_from_usage("--v-max=<v-max> 'Highest seniority'")
        .args_from_usage("[--l-min=<l-min>] 'Lowest angular momentum'")
        .args_from_usage("[--l-max=<l-max>] 'Highest angular momentum'")
        .args_from_usage("[--max-states=<max-states>] 'States per L listed in rates'")
        .args_from_usage("[--adapt] 'Calibrate the scales against the references'");
    for name in COEF_NAMES.iter() {
        app = app.arg(clap::Arg::with_name(name)
                      .long(name)
                      .takes_value(true)
                      .help("Hamiltonian coefficient"));
    }
    let matches = app.get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
