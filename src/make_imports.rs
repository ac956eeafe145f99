use model::{export, load_state};
use std::path::Path;

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut statefile = "state.json".to_string();
    let mut imports = "imports".to_string();
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Write the import tables of a stored genealogy");
        parser.refer(&mut statefile).add_option(
            &["--statefile"],
            argparse::Store,
            "File to read the state from",
        );
        parser.refer(&mut imports).add_option(
            &["--imports"],
            argparse::Store,
            "directory to write the import tables to",
        );
        parser.parse_args_or_exit();
    }

    let state = load_state(Path::new(&statefile)).map_err(|e| e.to_string())?;
    log::info!(
        "Read {} persons in {} generations ({:?})",
        state.roster.len(),
        state.history.len(),
        state.status
    );
    export::write_imports(Path::new(&imports), &state).map_err(|e| e.to_string())
}
