use model::catalog::Catalog;
use model::cli::parse_args;
use model::{export, initialization, observation, run, store_state, Parameters};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut p = Parameters::default();
    let mut o = observation::Settings::default();
    let mut seed: Option<u64> = None;
    let mut first_names = "data/first_names.csv".to_string();
    let mut last_names = "data/last_names.csv".to_string();
    let mut imports = "imports".to_string();

    {
        let mut parser = parse_args(&mut p, &mut o);
        parser.refer(&mut seed).add_option(
            &["--seed"],
            argparse::StoreOption,
            "seed of the random source. Without it, a fresh seed is drawn and logged",
        );
        parser.refer(&mut first_names).add_option(
            &["--first-names"],
            argparse::Store,
            "table of first names, one `name,SEX` per row",
        );
        parser.refer(&mut last_names).add_option(
            &["--last-names"],
            argparse::Store,
            "table of surnames, one per row",
        );
        parser.refer(&mut imports).add_option(
            &["--imports"],
            argparse::Store,
            "directory to write the import tables to",
        );
        parser.parse_args_or_exit();
    }

    let catalog =
        Catalog::load(Path::new(&first_names), Path::new(&last_names)).map_err(|e| e.to_string())?;

    let seed = seed.unwrap_or_else(rand::random::<u64>);
    log::info!("Starting with seed {}…", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let s = initialization(p, &catalog, &mut rng).map_err(|e| e.to_string())?;
    observation::log_generation(&s);
    let s = run(s, &catalog, &mut rng, &o).map_err(|e| e.to_string())?;

    if !o.statefile.is_empty() {
        store_state(&s, Path::new(&o.statefile)).map_err(|e| e.to_string())?;
    }
    export::write_imports(Path::new(&imports), &s).map_err(|e| e.to_string())
}
