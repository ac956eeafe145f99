use crate::observation::Settings;
use crate::Parameters;

pub fn parse_args<'a>(p: &'a mut Parameters, observation: &'a mut Settings) -> argparse::ArgumentParser<'a> {
    let mut parser = argparse::ArgumentParser::new();
    parser.set_description("Simulate a genealogy and write it as graph import tables");
    parser.refer(&mut p.generations).add_option(
        &["--generations"],
        argparse::Store,
        "number of generations to simulate after the founders",
    );
    parser.refer(&mut p.seed_competition).add_option(
        &["--seed-competition"],
        argparse::Store,
        "competition factor of the founders' generation",
    );
    parser.refer(&mut p.competition_delta).add_option(
        &["--competition-delta"],
        argparse::Store,
        "exponent of the competition damping. 1: no damping, larger values: faster oscillation",
    );
    parser.refer(&mut p.decline_threshold).add_option(
        &["--decline-threshold"],
        argparse::Store,
        "competition factor above which a generation declines",
    );
    parser.refer(&mut p.growth_threshold).add_option(
        &["--growth-threshold"],
        argparse::Store,
        "competition factor below which a generation grows",
    );
    parser.refer(&mut p.decline_fecundity).add_option(
        &["--decline-fecundity"],
        argparse::Store,
        "expected number of children per couple in a declining generation",
    );
    parser.refer(&mut p.stable_fecundity).add_option(
        &["--stable-fecundity"],
        argparse::Store,
        "expected number of children per couple in a stable generation",
    );
    parser.refer(&mut p.growth_fecundity).add_option(
        &["--growth-fecundity"],
        argparse::Store,
        "expected number of children per couple in a growing generation",
    );
    parser.refer(&mut observation.log_every).add_option(
        &["--log-every"],
        argparse::Store,
        "period of logging, in generations",
    );
    parser.refer(&mut observation.store_every).add_option(
        &["--store-every"],
        argparse::Store,
        "period of state saving, in generations",
    );
    parser.refer(&mut observation.statefile).add_option(
        &["--statefile"],
        argparse::Store,
        "File to store the state to",
    );
    parser
}
