use crate::catalog::Catalog;
use crate::submodels::{competition, offspring, pairing};
use crate::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn mini_catalog() -> Catalog {
    Catalog::parse(
        "Abel,MALE\nCain,MALE\nSeth,MALE\nAda,FEMALE\nZillah,FEMALE\nNaamah,FEMALE\n",
        "Miller\nSmith\nTanner\nWeaver\n",
    )
    .unwrap()
}

fn mini_run(seed: u64, generations: GenerationId) -> State {
    let catalog = mini_catalog();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let p = Parameters {
        generations,
        ..Parameters::default()
    };
    let s = initialization(p, &catalog, &mut rng).unwrap();
    let o = observation::Settings {
        log_every: 0,
        ..observation::Settings::default()
    };
    run(s, &catalog, &mut rng, &o).unwrap()
}

fn mini_population(rng: &mut ChaCha8Rng, males: usize, females: usize) -> (Roster, Vec<PersonId>, Vec<PersonId>) {
    let catalog = mini_catalog();
    let mut roster = Roster::default();
    let make = |sex, rng: &mut ChaCha8Rng| Person {
        id: PersonId::random(rng),
        name: catalog.first_name(sex, rng).to_string(),
        sex,
        family: catalog.family(0, rng),
        generation: 0,
        mother: None,
        father: None,
    };
    let m: Vec<PersonId> = (0..males)
        .map(|_| roster.push(make(Sex::Male, rng)).unwrap())
        .collect();
    let f: Vec<PersonId> = (0..females)
        .map(|_| roster.push(make(Sex::Female, rng)).unwrap())
        .collect();
    (roster, m, f)
}

#[test]
pub fn test_arrivals_mean_is_fecundity() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let n = 40_000;
    for lambda in [1, 2, 4, 7].iter() {
        let fecundity = Fecundity::new(*lambda);
        let draws: Vec<f64> = (0..n)
            .map(|_| offspring::arrivals(fecundity, &mut rng) as f64)
            .collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let variance = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let lambda = *lambda as f64;
        assert!((mean - lambda).abs() < 0.05 * lambda, "mean {} for λ={}", mean, lambda);
        assert!((variance - lambda).abs() < 0.1 * lambda, "variance {} for λ={}", variance, lambda);
    }
}

#[test]
pub fn test_zero_fecundity_is_clamped() {
    assert_eq!(Fecundity::new(0).rate(), 1);
    assert_eq!(Fecundity::from(0).rate(), 1);
    let parsed: Parameters = serde_json::from_str(
        &serde_json::to_string(&Parameters::default())
            .unwrap()
            .replace("\"decline_fecundity\":1", "\"decline_fecundity\":0"),
    )
    .unwrap();
    assert_eq!(parsed.decline_fecundity.rate(), 1);

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let total: u32 = (0..1000)
        .map(|_| offspring::arrivals(Fecundity::new(0), &mut rng))
        .sum();
    assert!(total > 800 && total < 1200);
}

#[test]
pub fn test_pairing_is_monogamous() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for males in 0..6 {
        for females in 0..6 {
            let (roster, mut m, mut f) = mini_population(&mut rng, males, females);
            let couples = pairing::pair(&mut m, &mut f, &roster, Fecundity::new(2), &mut rng).unwrap();
            assert_eq!(couples.len(), std::cmp::min(males, females));

            let fathers: HashSet<_> = couples.iter().map(|c| c.father).collect();
            let mothers: HashSet<_> = couples.iter().map(|c| c.mother).collect();
            assert_eq!(fathers.len(), couples.len());
            assert_eq!(mothers.len(), couples.len());
            for c in couples.iter() {
                let father = roster.get(c.father).unwrap();
                let mother = roster.get(c.mother).unwrap();
                assert_eq!(father.sex, Sex::Male);
                assert_eq!(mother.sex, Sex::Female);
                assert_eq!(c.family, father.family);
                assert_eq!(c.fecundity, Fecundity::new(2));
            }
        }
    }
}

#[test]
pub fn test_pairing_is_uniform() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let (roster, m, f) = mini_population(&mut rng, 3, 1);
    let mut c = [0, 0, 0];
    for _ in 0..3000 {
        let mut m = m.clone();
        let mut f = f.clone();
        let couples = pairing::pair(&mut m, &mut f, &roster, Fecundity::new(1), &mut rng).unwrap();
        assert_eq!(couples.len(), 1);
        c[roster.iter().position(|p| p.id == couples[0].father).unwrap()] += 1;
    }
    for count in c.iter() {
        assert!((*count as i32 - 1000).abs() < 150, "{:?}", c);
    }
}

#[test]
pub fn test_pairing_rejects_unknown_father() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let (roster, _, mut f) = mini_population(&mut rng, 0, 1);
    let mut m = vec![PersonId::random(&mut rng)];
    match pairing::pair(&mut m, &mut f, &roster, Fecundity::new(1), &mut rng) {
        Err(Error::UnknownPerson(id)) => assert_eq!(id, m[0]),
        other => panic!("expected an unknown person, got {:?}", other),
    }
}

#[test]
pub fn test_children_inherit_from_couple() {
    let catalog = mini_catalog();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let (roster, mut m, mut f) = mini_population(&mut rng, 1, 1);
    let couples = pairing::pair(&mut m, &mut f, &roster, Fecundity::new(4), &mut rng).unwrap();
    let mut seen = HashSet::new();
    for _ in 0..50 {
        for child in offspring::children(&couples[0], 1, &catalog, &mut rng) {
            assert_eq!(child.father, Some(m[0]));
            assert_eq!(child.mother, Some(f[0]));
            assert_eq!(child.family, roster.get(m[0]).unwrap().family);
            assert_eq!(child.generation, 1);
            assert!(!child.is_founder());
            assert!(seen.insert(child.id));
        }
    }
    assert!(seen.len() > 100);
}

#[test]
pub fn test_competition_trajectory() {
    let p = Parameters::default();
    let g0 = Generation {
        id: 0,
        competition: 0.2,
        kind: GenerationType::Growth,
        direction: Direction::Growth,
    };

    let g1 = competition::advance(&g0, &p);
    assert!((g1.competition - 0.089_442_719).abs() < 1e-8);
    assert_eq!((g1.kind, g1.direction), (GenerationType::Growth, Direction::Decline));
    assert_eq!(p.fecundity(g1.kind).rate(), 4);

    // Undoing the damping lands back on the growth threshold, which is still
    // inside the stable band.
    let g2 = competition::advance(&g1, &p);
    assert!((g2.competition - 0.2).abs() < 1e-12);
    assert_eq!((g2.kind, g2.direction), (GenerationType::Stable, Direction::Decline));
    assert_eq!(p.fecundity(g2.kind).rate(), 2);

    let g3 = competition::advance(&g2, &p);
    let g4 = competition::advance(&g3, &p);
    let g5 = competition::advance(&g4, &p);
    let g6 = competition::advance(&g5, &p);
    let g7 = competition::advance(&g6, &p);
    assert!((g3.competition - 0.341_995).abs() < 1e-5);
    assert!((g4.competition - 0.489_043).abs() < 1e-5);
    assert!((g5.competition - 0.620_723).abs() < 1e-5);
    assert_eq!((g3.kind, g3.direction), (GenerationType::Stable, Direction::Decline));
    assert_eq!((g4.kind, g4.direction), (GenerationType::Stable, Direction::Decline));
    assert_eq!((g5.kind, g5.direction), (GenerationType::Decline, Direction::Growth));
    assert_eq!(p.fecundity(g5.kind).rate(), 1);
    assert_eq!((g6.kind, g6.direction), (GenerationType::Stable, Direction::Growth));
    assert_eq!((g7.kind, g7.direction), (GenerationType::Stable, Direction::Growth));
    assert!((g6.competition - g4.competition).abs() < 1e-9);
    assert_eq!(g7.id, 7);
}

#[test]
pub fn test_classify_keeps_direction_in_band() {
    let p = Parameters::default();
    assert_eq!(
        competition::classify(0.4, Direction::Growth, &p),
        (GenerationType::Stable, Direction::Growth)
    );
    assert_eq!(
        competition::classify(0.6, Direction::Decline, &p),
        (GenerationType::Stable, Direction::Decline)
    );
    assert_eq!(
        competition::classify(0.61, Direction::Decline, &p),
        (GenerationType::Decline, Direction::Growth)
    );
    assert_eq!(
        competition::classify(0.19, Direction::Growth, &p),
        (GenerationType::Growth, Direction::Decline)
    );
}

#[test]
pub fn test_history_is_contiguous() {
    for seed in 0..30 {
        let s = mini_run(seed, 6);
        assert!(s.history.len() <= 7);
        for (i, g) in s.history.iter().enumerate() {
            assert_eq!(g.id as usize, i);
        }
        match s.status {
            Status::Complete => assert_eq!(s.history.len(), 7),
            Status::Extinct => assert_eq!(s.active(), 0),
            Status::Running => panic!("run returned while running"),
        }
    }
}

#[test]
pub fn test_genealogy_invariants() {
    for seed in 0..30 {
        let s = mini_run(seed, 6);
        assert_eq!(s.roster.founders().count(), 2);
        let mut ids = HashSet::new();
        for person in s.roster.iter() {
            assert!(ids.insert(person.id));
            assert!(person.generation as usize <= s.history.len() - 1);
            if person.is_founder() {
                assert_eq!(person.generation, 0);
                assert_eq!(person.family.generation, 0);
                continue;
            }
            let father = s.roster.father(person).unwrap();
            let mother = s.roster.mother(person).unwrap();
            assert_eq!(father.sex, Sex::Male);
            assert_eq!(mother.sex, Sex::Female);
            assert_eq!(person.family, father.family);
            assert_eq!(father.generation + 1, person.generation);
            assert_eq!(mother.generation + 1, person.generation);
        }
        for id in s.males.iter().chain(s.females.iter()) {
            assert_eq!(
                s.roster.get(*id).unwrap().generation,
                s.history.current().id
            );
        }
    }
}

#[test]
pub fn test_one_sided_generation_dies_out() {
    let catalog = mini_catalog();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut s = initialization(Parameters::default(), &catalog, &mut rng).unwrap();
    s.females.clear();
    let o = observation::Settings {
        log_every: 0,
        ..observation::Settings::default()
    };
    let s = run(s, &catalog, &mut rng, &o).unwrap();
    assert_eq!(s.status, Status::Extinct);
    assert_eq!(s.history.len(), 2);
    assert!(s.history.len() < s.p.generations as usize + 1);
    assert_eq!(s.roster.len(), 2);
    assert_eq!(s.active(), 0);
}

#[test]
pub fn test_some_runs_die_out_early() {
    let extinct = (0..200)
        .map(|seed| mini_run(seed, 10))
        .find(|s| s.status == Status::Extinct)
        .unwrap();
    assert!(extinct.history.len() < 11);
    assert!(extinct.males.is_empty() && extinct.females.is_empty());
}

#[test]
pub fn test_no_generations_is_complete() {
    let s = mini_run(0, 0);
    assert_eq!(s.status, Status::Complete);
    assert_eq!(s.history.len(), 1);
    assert_eq!(s.roster.len(), 2);
}

#[test]
pub fn test_export_row_counts() {
    let s = (0..50)
        .map(|seed| mini_run(seed, 5))
        .find(|s| s.status == Status::Complete)
        .unwrap();
    let non_founders = s.roster.non_founders().count();
    assert_eq!(non_founders + 2, s.roster.len());

    let mut buffer = vec![];
    export::write_edges(&mut buffer, &s.roster).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(export::EDGES_HEADER));
    let relations: Vec<&str> = lines.map(|l| l.rsplit(',').next().unwrap()).collect();
    let count = |r: &str| relations.iter().filter(|x| **x == r).count();
    assert_eq!(count("IN_GENERATION"), s.roster.len());
    assert_eq!(count("FATHER"), non_founders);
    assert_eq!(count("MOTHER"), non_founders);
    assert_eq!(count("PARENT"), 2 * non_founders);
    assert_eq!(count("CHILD"), 2 * non_founders);
    assert_eq!(relations.len(), s.roster.len() + 6 * non_founders);
}

#[test]
pub fn test_export_rows() {
    let s = mini_run(11, 3);
    let mut buffer = vec![];
    export::write_people(&mut buffer, &s.roster).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows[0], export::PEOPLE_HEADER);
    assert_eq!(rows.len(), s.roster.len() + 1);
    for (row, person) in rows[1..].iter().zip(s.roster.iter()) {
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0], person.id.to_string());
        assert_eq!(fields[2], person.sex.to_string());
        assert_eq!(fields[3].is_empty(), person.is_founder());
        assert_eq!(fields[4].is_empty(), person.is_founder());
        assert_eq!(fields[5], person.family.id.to_string());
        assert_eq!(fields[6], "Person");
    }

    let g = Generation {
        id: 1,
        competition: 0.2_f64.powf(1.5),
        kind: GenerationType::Growth,
        direction: Direction::Decline,
    };
    assert_eq!(export::generation_row(&g), "1,GROWTH,DECLINE,0.089443,Generation");

    let founder = s.roster.founders().next().unwrap();
    let edges = export::edges(founder);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].end, "0");
    assert_eq!(edges[0].relation, export::Relation::InGeneration);
}

#[test]
pub fn test_catalog_parsing() {
    let catalog = Catalog::parse("Ada,FEMALE\r\nAbel,MALE\r\nEve\nMara,female\n\nCain,MALE\n", "Miller\n\nSmith\n").unwrap();
    assert_eq!(catalog.pool_sizes(), (1, 3, 1));

    let mut rng = ChaCha8Rng::seed_from_u64(6);
    for _ in 0..20 {
        assert_eq!(catalog.first_name(Sex::Male, &mut rng), "Abel");
        let family = catalog.family(3, &mut rng);
        assert_eq!(family.surname, "Miller");
        assert_eq!(family.generation, 3);
    }
    assert_ne!(catalog.family(0, &mut rng).id, catalog.family(0, &mut rng).id);
}

#[test]
pub fn test_catalog_needs_every_pool() {
    assert!(matches!(
        Catalog::parse("Ada,FEMALE\n", "Miller\n"),
        Err(Error::EmptyPool("male first names"))
    ));
    assert!(matches!(
        Catalog::parse("Abel,MALE\n", "Miller\n"),
        Err(Error::EmptyPool("female first names"))
    ));
    assert!(matches!(
        Catalog::parse("Abel,MALE\nAda,FEMALE\n", "\nMiller\n"),
        Err(Error::EmptyPool("surnames"))
    ));
}

#[test]
pub fn test_invalid_parameters_are_rejected() {
    let catalog = mini_catalog();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let p = Parameters {
        competition_delta: 0.,
        ..Parameters::default()
    };
    assert!(matches!(
        initialization(p, &catalog, &mut rng),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
pub fn test_state_round_trip() {
    let s = mini_run(12, 4);
    let stored = serde_json::to_string(&s).unwrap();
    let restored: State = serde_json::from_str(&stored).unwrap();
    assert_eq!(restored.roster.len(), s.roster.len());
    assert_eq!(restored.history, s.history);
    assert_eq!(restored.status, s.status);
    assert_eq!(restored.p, s.p);
    for person in s.roster.iter() {
        assert_eq!(restored.roster.get(person.id), Some(person));
    }
}

#[test]
pub fn test_gapped_history_is_rejected() {
    let s = mini_run(13, 3);
    let mut generations: Vec<Generation> = s.history.clone().into();
    generations.remove(0);
    let stored = serde_json::to_string(&generations).unwrap();
    assert!(serde_json::from_str::<History>(&stored).is_err());
    assert!(serde_json::from_str::<History>("[]").is_err());
}

#[test]
pub fn test_seeded_runs_repeat() {
    let a = mini_run(21, 5);
    let b = mini_run(21, 5);
    assert_eq!(a.roster.len(), b.roster.len());
    assert_eq!(a.history, b.history);
    assert!(a.roster.iter().zip(b.roster.iter()).all(|(x, y)| x == y));
}
